//! Program context and reference interpreter for lowering OpenQASM 3 into
//! qlow circuits.
//!
//! The crate takes a parsed [`ast::Program`] and produces a
//! [`qlow_ir::Circuit`]. All interpretation state lives in a
//! [`ProgramContext`]: scoped symbol and value tables, user-defined gates
//! and subroutines, the qubit allocation table and the circuit being built.
//! [`Interpreter`] is a tree walker over that context.
//!
//! # Core Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`context`] | Scopes, declarations, qubit resolution, instruction lowering |
//! | [`interpreter`] | AST walker: statements, expressions, gate inlining |
//! | [`modifier`] | `inv`, `pow`, `ctrl`, `negctrl` folding |
//! | [`pragma`] | Pluggable pragma parsing with a default result/unitary grammar |
//! | [`types`] | Classical types, bit strings, arrays and value coercion |
//! | [`config`] | Serde-backed interpreter settings |
//!
//! # Example
//!
//! ```rust
//! use qlow_interp::ast::{Expression, GateCall, GateModifier, Operand, Program, Statement};
//! use qlow_interp::Interpreter;
//!
//! // qubit[2] q; ctrl @ h q[0], q[1];
//! let program = Program::new(vec![
//!     Statement::QubitDecl { name: "q".into(), size: Some(Expression::Int(2)) },
//!     Statement::Gate(
//!         GateCall::new("h", vec![Operand::indexed("q", 0), Operand::indexed("q", 1)])
//!             .with_modifiers(vec![GateModifier::Ctrl(None)]),
//!     ),
//! ]);
//!
//! let circuit = Interpreter::default().run(&program).unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! let gate = circuit.instructions()[0].as_gate().unwrap();
//! assert_eq!(gate.name, "h");
//! assert_eq!(gate.num_controls(), 1);
//! ```

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod identifier;
pub mod interpreter;
pub mod modifier;
pub mod pragma;
pub mod qubit_table;
pub mod table;
pub mod types;

pub use config::InterpreterConfig;
pub use context::{GateResolution, ProgramContext};
pub use error::{InterpError, InterpResult};
pub use evaluator::{InputEvaluator, ParameterEvaluator};
pub use identifier::{Identifier, IndexLevel, SliceRange};
pub use interpreter::Interpreter;
pub use modifier::{Modifier, ModifierSummary};
pub use pragma::{DefaultPragmaParser, PragmaDirective, PragmaError, PragmaParser};
pub use qubit_table::QubitTable;
pub use types::{ArrayValue, BitString, ClassicalType, Value};
