//! Arvak Circuit Intermediate Representation
//!
//! The circuit types that backends consume. A [`Circuit`] is an ordered list
//! of [`Instruction`]s over numbered qubits and classical bits; adapters walk
//! that list and translate it into their vendor's wire format.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use arvak_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.instructions().len(), 4);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `GPI`, `GPI2` | 1 | IonQ native single-qubit gates |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled Paulis / Hadamard |
//! | `CRx`, `CRy`, `CRz` | 2 | Controlled rotations |
//! | `RXX`, `RYY`, `RZZ` | 2 | Ising interactions |
//! | `Swap` | 2 | SWAP gate |
//! | `MS` | 2 | IonQ native Mølmer-Sørensen gate |
//! | `CCX`, `CSwap` | 3 | Toffoli and Fredkin gates |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{ClbitId, QubitId};
