//! Circuit serialization to IonQ's JSON circuit format.
//!
//! IonQ accepts two dialects. The default "qis" dialect takes the usual gate
//! zoo and compiles it server-side:
//!
//! | Arvak gate          | IonQ gate     | Notes                        |
//! |---------------------|---------------|------------------------------|
//! | `x y z h`           | same          |                              |
//! | `s sdg t tdg`       | `s si t ti`   |                              |
//! | `sx sxdg`           | `v vi`        |                              |
//! | `rx ry rz`          | same          | `rotation` in radians        |
//! | `cx cy cz ch`       | `x y z h`     | with `controls`              |
//! | `crx cry crz`       | `rx ry rz`    | with `controls`, `rotation`  |
//! | `ccx`               | `x`           | two `controls`               |
//! | `swap`, `cswap`     | `swap`        | `cswap` adds one control     |
//! | `rxx ryy rzz`       | `xx yy zz`    | `rotation` in radians        |
//!
//! The "native" dialect (`body.gateset = "native"`) takes only `gpi`, `gpi2`
//! and `ms`, with phases in turns. A circuit must use one dialect.
//!
//! Measurements are not sent as gates; IonQ measures every qubit at the end.
//! Which qubit lands in which classical bit travels in `metadata.output_map`.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use serde_json::json;

use arvak_ir::{Circuit, GateKind, InstructionKind, ParameterExpression, StandardGate};

use crate::error::{IonQError, IonQResult};

/// Body of `POST jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Always `"json"`.
    pub lang: String,
    /// `"simulator"` or `"qpu"`.
    pub target: String,
    pub shots: u32,
    /// Job name shown in the IonQ console.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub body: CircuitBody,
    pub metadata: SubmitMetadata,
}

/// The circuit itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBody {
    pub qubits: u32,
    /// `Some("native")` for native-gate circuits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateset: Option<String>,
    pub circuit: Vec<IonQGate>,
}

/// One gate in IonQ's JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonQGate {
    pub gate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<u32>>,
    pub targets: Vec<u32>,
    /// Rotation angle in radians (qis dialect).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Phase in turns (`gpi`, `gpi2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<f64>,
    /// Phases in turns (`ms`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<f64>>,
}

impl IonQGate {
    fn new(gate: &str, targets: Vec<u32>) -> Self {
        Self {
            gate: gate.to_string(),
            controls: None,
            targets,
            rotation: None,
            phase: None,
            phases: None,
        }
    }

    fn controlled(gate: &str, controls: Vec<u32>, targets: Vec<u32>) -> Self {
        Self {
            controls: Some(controls),
            ..Self::new(gate, targets)
        }
    }

    fn with_rotation(mut self, radians: f64) -> Self {
        self.rotation = Some(radians);
        self
    }
}

/// Opaque metadata echoed back by IonQ with the results.
///
/// Every value is a string: the API rejects nested metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitMetadata {
    pub shots: String,
    /// JSON list indexed by classical bit; each entry is the measured qubit or `null`.
    pub output_map: String,
    /// JSON object with `memory_slots`, `n_qubits` and `name`.
    pub header: String,
}

/// Serialize `circuit` for `target`.
pub fn circuit_to_ionq(circuit: &Circuit, target: &str, shots: u32) -> IonQResult<SubmitRequest> {
    let mut gates = Vec::new();
    let mut output_map: Vec<Option<u32>> = vec![None; circuit.num_clbits()];
    let mut native_gate: Option<String> = None;
    let mut qis_gate: Option<String> = None;

    for inst in circuit.instructions() {
        let qubits: Vec<u32> = inst.qubits.iter().map(|q| q.0).collect();
        match &inst.kind {
            InstructionKind::Measure => {
                for (qubit, clbit) in inst.qubits.iter().zip(&inst.clbits) {
                    output_map[clbit.0 as usize] = Some(qubit.0);
                }
            }
            InstructionKind::Barrier => {}
            InstructionKind::Reset => {
                return Err(IonQError::UnsupportedGate(
                    "reset (IonQ only resets at the start of a circuit)".into(),
                ));
            }
            InstructionKind::Gate(gate) => {
                let GateKind::Standard(standard) = &gate.kind else {
                    return Err(IonQError::UnsupportedGate(gate.name().to_string()));
                };
                let Some(converted) = convert_gate(standard, &qubits)? else {
                    continue;
                };
                if standard.is_ionq_native() {
                    native_gate.get_or_insert_with(|| standard.name().to_string());
                } else {
                    qis_gate.get_or_insert_with(|| standard.name().to_string());
                }
                gates.push(converted);
            }
        }
    }

    if let (Some(native), Some(qis)) = (&native_gate, &qis_gate) {
        return Err(IonQError::UnsupportedGate(format!(
            "cannot mix native gate '{native}' with non-native gate '{qis}' in one circuit"
        )));
    }

    let header = json!({
        "memory_slots": circuit.num_clbits(),
        "n_qubits": circuit.num_qubits(),
        "name": circuit.name(),
    });

    Ok(SubmitRequest {
        lang: "json".into(),
        target: target.to_string(),
        shots,
        name: (!circuit.name().is_empty()).then(|| circuit.name().to_string()),
        body: CircuitBody {
            qubits: circuit.num_qubits() as u32,
            gateset: native_gate.map(|_| "native".to_string()),
            circuit: gates,
        },
        metadata: SubmitMetadata {
            shots: shots.to_string(),
            output_map: serde_json::to_string(&output_map)?,
            header: header.to_string(),
        },
    })
}

/// Convert one gate; `Ok(None)` for gates that compile to nothing.
fn convert_gate(gate: &StandardGate, q: &[u32]) -> IonQResult<Option<IonQGate>> {
    let angle = |p: &ParameterExpression| {
        p.as_f64()
            .ok_or_else(|| IonQError::SymbolicParameter(format!("{} ({p})", gate.name())))
    };
    let turns = |p: &ParameterExpression| angle(p).map(|radians| radians / TAU);

    let converted = match gate {
        StandardGate::I => return Ok(None),
        StandardGate::X => IonQGate::new("x", q.to_vec()),
        StandardGate::Y => IonQGate::new("y", q.to_vec()),
        StandardGate::Z => IonQGate::new("z", q.to_vec()),
        StandardGate::H => IonQGate::new("h", q.to_vec()),
        StandardGate::S => IonQGate::new("s", q.to_vec()),
        StandardGate::Sdg => IonQGate::new("si", q.to_vec()),
        StandardGate::T => IonQGate::new("t", q.to_vec()),
        StandardGate::Tdg => IonQGate::new("ti", q.to_vec()),
        StandardGate::SX => IonQGate::new("v", q.to_vec()),
        StandardGate::SXdg => IonQGate::new("vi", q.to_vec()),
        StandardGate::Rx(t) => IonQGate::new("rx", q.to_vec()).with_rotation(angle(t)?),
        StandardGate::Ry(t) => IonQGate::new("ry", q.to_vec()).with_rotation(angle(t)?),
        StandardGate::Rz(t) => IonQGate::new("rz", q.to_vec()).with_rotation(angle(t)?),
        StandardGate::CX => IonQGate::controlled("x", vec![q[0]], vec![q[1]]),
        StandardGate::CY => IonQGate::controlled("y", vec![q[0]], vec![q[1]]),
        StandardGate::CZ => IonQGate::controlled("z", vec![q[0]], vec![q[1]]),
        StandardGate::CH => IonQGate::controlled("h", vec![q[0]], vec![q[1]]),
        StandardGate::CRx(t) => {
            IonQGate::controlled("rx", vec![q[0]], vec![q[1]]).with_rotation(angle(t)?)
        }
        StandardGate::CRy(t) => {
            IonQGate::controlled("ry", vec![q[0]], vec![q[1]]).with_rotation(angle(t)?)
        }
        StandardGate::CRz(t) => {
            IonQGate::controlled("rz", vec![q[0]], vec![q[1]]).with_rotation(angle(t)?)
        }
        StandardGate::Swap => IonQGate::new("swap", q.to_vec()),
        StandardGate::RXX(t) => IonQGate::new("xx", q.to_vec()).with_rotation(angle(t)?),
        StandardGate::RYY(t) => IonQGate::new("yy", q.to_vec()).with_rotation(angle(t)?),
        StandardGate::RZZ(t) => IonQGate::new("zz", q.to_vec()).with_rotation(angle(t)?),
        StandardGate::CCX => IonQGate::controlled("x", vec![q[0], q[1]], vec![q[2]]),
        StandardGate::CSwap => IonQGate::controlled("swap", vec![q[0]], vec![q[1], q[2]]),
        StandardGate::GPI(phi) => IonQGate {
            phase: Some(turns(phi)?),
            ..IonQGate::new("gpi", q.to_vec())
        },
        StandardGate::GPI2(phi) => IonQGate {
            phase: Some(turns(phi)?),
            ..IonQGate::new("gpi2", q.to_vec())
        },
        StandardGate::MS(phi0, phi1) => IonQGate {
            phases: Some(vec![turns(phi0)?, turns(phi1)?]),
            ..IonQGate::new("ms", q.to_vec())
        },
    };
    Ok(Some(converted))
}
