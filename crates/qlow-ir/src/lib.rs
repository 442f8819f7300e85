//! Circuit representation emitted by the qlow lowering core.
//!
//! A [`Circuit`] is an ordered, append-only list of [`Instruction`]s over a
//! flat index space of physical qubits. It is what the interpreter in
//! `qlow-interp` produces and what an execution engine consumes.
//!
//! # Core Components
//!
//! - **Indices**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`BuiltinGate`] for the standard library, [`GateOperation`] for a
//!   lowered application with control states and exponent
//! - **Parameters**: [`GateParameter`] and [`ParameterExpression`] for values
//!   that are still symbolic when lowering starts
//! - **Results**: [`ResultType`] and [`Observable`]
//!
//! # Example
//!
//! ```rust
//! use qlow_ir::{Circuit, ControlState, GateOperation, QubitId};
//!
//! let mut circuit = Circuit::with_qubits("bell", 2);
//! circuit.add_gate(GateOperation::new("h", vec![]), vec![QubitId(0)]).unwrap();
//! circuit
//!     .add_gate(
//!         GateOperation::new("x", vec![]).with_controls(vec![ControlState::One]),
//!         vec![QubitId(0), QubitId(1)],
//!     )
//!     .unwrap();
//!
//! assert_eq!(circuit.len(), 2);
//! assert_eq!(circuit.instructions()[1].controls(), &[QubitId(0)]);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;
pub mod result;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{BuiltinGate, ControlState, GateOperation};
pub use instruction::{Instruction, InstructionKind};
pub use num_complex::Complex64;
pub use parameter::{GateParameter, ParameterExpression, ParameterFunction};
pub use qubit::{ClbitId, QubitId, qubit_range};
pub use result::{Observable, PauliFactor, ResultType};
