//! Quantum gate types.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::parameter::ParameterExpression;

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),

    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around X.
    CRx(ParameterExpression),
    /// Controlled rotation around Y.
    CRy(ParameterExpression),
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// XX rotation gate.
    RXX(ParameterExpression),
    /// YY rotation gate.
    RYY(ParameterExpression),
    /// ZZ rotation gate.
    RZZ(ParameterExpression),

    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,

    // IonQ native gates. Phases are in radians.
    /// GPI(φ): a π rotation about the axis at angle φ in the XY plane.
    GPI(ParameterExpression),
    /// GPI2(φ): a π/2 rotation about the axis at angle φ in the XY plane.
    GPI2(ParameterExpression),
    /// Mølmer-Sørensen entangling gate MS(φ0, φ1).
    MS(ParameterExpression, ParameterExpression),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
            StandardGate::GPI(_) => "gpi",
            StandardGate::GPI2(_) => "gpi2",
            StandardGate::MS(_, _) => "ms",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::GPI(_)
            | StandardGate::GPI2(_) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_)
            | StandardGate::MS(_, _) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Whether this is one of IonQ's hardware-native gates.
    pub fn is_ionq_native(&self) -> bool {
        matches!(
            self,
            StandardGate::GPI(_) | StandardGate::GPI2(_) | StandardGate::MS(_, _)
        )
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p)
            | StandardGate::GPI(p)
            | StandardGate::GPI2(p) => vec![p],

            StandardGate::MS(phi0, phi1) => vec![phi0, phi1],

            _ => vec![],
        }
    }

    /// Check if any parameter is still symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Inverse of an IonQ native gate.
    ///
    /// GPI is self-inverse; GPI2 and MS invert by shifting the (first) phase by π.
    /// Returns `None` for non-native gates.
    pub fn native_inverse(&self) -> Option<StandardGate> {
        let shifted =
            |p: &ParameterExpression| p.as_f64().map(|v| ParameterExpression::constant(v + PI));
        match self {
            StandardGate::GPI(p) => Some(StandardGate::GPI(p.clone())),
            StandardGate::GPI2(p) => Some(StandardGate::GPI2(shifted(p)?)),
            StandardGate::MS(p0, p1) => Some(StandardGate::MS(shifted(p0)?, p1.clone())),
            _ => None,
        }
    }

    /// Unitary matrix (row-major, 2^n × 2^n) of an IonQ native gate.
    ///
    /// Returns `None` for non-native gates and for unbound parameters.
    pub fn matrix(&self) -> Option<Vec<Complex64>> {
        let i = Complex64::i();
        let phase = |angle: f64| Complex64::from_polar(1.0, angle);
        match self {
            StandardGate::GPI(p) => {
                let phi = p.as_f64()?;
                let zero = Complex64::new(0.0, 0.0);
                Some(vec![zero, phase(-phi), phase(phi), zero])
            }
            StandardGate::GPI2(p) => {
                let phi = p.as_f64()?;
                let one = Complex64::new(1.0, 0.0);
                Some(
                    vec![one, -i * phase(-phi), -i * phase(phi), one]
                        .into_iter()
                        .map(|z| z * FRAC_1_SQRT_2)
                        .collect(),
                )
            }
            StandardGate::MS(p0, p1) => {
                let (phi0, phi1) = (p0.as_f64()?, p1.as_f64()?);
                let zero = Complex64::new(0.0, 0.0);
                let one = Complex64::new(1.0, 0.0);
                let sum = phi0 + phi1;
                let diff = phi0 - phi1;
                #[rustfmt::skip]
                let m = vec![
                    one, zero, zero, -i * phase(-sum),
                    zero, one, -i * phase(-diff), zero,
                    zero, -i * phase(diff), one, zero,
                    -i * phase(sum), zero, zero, one,
                ];
                Some(m.into_iter().map(|z| z * FRAC_1_SQRT_2).collect())
            }
            _ => None,
        }
    }
}

/// A quantum gate, either standard or custom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// An opaque user-defined gate.
    Custom {
        /// The name of the gate.
        name: String,
        /// The number of qubits it operates on.
        num_qubits: u32,
    },
}

impl GateKind {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::Standard(g) => g.name(),
            GateKind::Custom { name, .. } => name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Custom { num_qubits, .. } => *num_qubits,
        }
    }
}

/// A gate with associated metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// The kind of gate.
    pub kind: GateKind,
    /// Optional label for the gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Gate {
    /// Create a new gate from a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            kind: GateKind::Standard(gate),
            label: None,
        }
    }

    /// Create an opaque custom gate.
    pub fn custom(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            kind: GateKind::Custom {
                name: name.into(),
                num_qubits,
            },
            label: None,
        }
    }

    /// Add a label to the gate.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}
