//! Backend capabilities.
//!
//! Capabilities are computed once when a backend is constructed and handed
//! out by reference afterwards; they never require I/O.

use serde::{Deserialize, Serialize};

/// Static description of what a backend can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags, e.g. `"ion_trap"`, `"all_to_all"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for an IonQ target (trapped-ion, all-to-all).
    pub fn ionq(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::ionq(),
            max_shots: 10_000,
            is_simulator: false,
            features: vec!["ion_trap".into(), "all_to_all".into()],
        }
    }

    /// Mark as simulator or hardware.
    #[must_use]
    pub fn with_simulator(mut self, is_simulator: bool) -> Self {
        self.is_simulator = is_simulator;
        self
    }

    /// Override the shot limit.
    #[must_use]
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Check for a capability flag.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Set of gate names a backend accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates.
    pub three_qubit: Vec<String>,
    /// Hardware-native gates (subset of the above).
    pub native: Vec<String>,
}

impl GateSet {
    /// IonQ gate set.
    ///
    /// The "qis" gates are compiled server-side; `gpi`, `gpi2` and `ms` run
    /// natively and cannot be mixed with the others in one circuit.
    pub fn ionq() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        Self {
            single_qubit: names(&[
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz",
                "gpi", "gpi2",
            ]),
            two_qubit: names(&[
                "cx", "cy", "cz", "ch", "swap", "crx", "cry", "crz", "rxx", "ryy", "rzz", "ms",
            ]),
            three_qubit: names(&["ccx", "cswap"]),
            native: names(&["gpi", "gpi2", "ms"]),
        }
    }

    /// Check whether a gate name is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit
            .iter()
            .chain(&self.two_qubit)
            .chain(&self.three_qubit)
            .any(|g| g == gate)
    }

    /// Check whether a gate is hardware-native.
    pub fn is_native(&self, gate: &str) -> bool {
        self.native.iter().any(|g| g == gate)
    }
}
