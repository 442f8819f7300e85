//! Error types for the interpreter core.

use qlow_ir::{IrError, QubitId};
use thiserror::Error;

use crate::pragma::PragmaError;

/// Errors that abort interpretation of a program.
///
/// None of these are recovered locally; the caller attaches the source
/// location of the node that triggered them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterpError {
    /// Name is not bound in any active scope.
    #[error("Undefined identifier: {0}")]
    UndefinedName(String),

    /// Name is already bound in the current scope.
    #[error("Identifier '{0}' already declared in this scope")]
    Redeclaration(String),

    /// Qubit index outside the register.
    #[error("Qubit index {index} out of range for register '{register}' of size {size}")]
    QubitIndexOutOfRange {
        register: String,
        index: i64,
        size: usize,
    },

    /// More than two index levels on a qubit identifier.
    #[error("Cannot index multiple dimensions for qubits: '{name}' has {levels} index levels")]
    QubitDimensionality { name: String, levels: usize },

    /// Gate is neither user-defined nor built in.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    /// User-defined gate handed to instruction lowering without being expanded.
    #[error("Gate '{0}' is user-defined and must be expanded before lowering")]
    UserDefinedGate(String),

    /// Subroutine is neither user-defined nor built in.
    #[error("Unknown subroutine: {0}")]
    UnknownSubroutine(String),

    /// A control qubit is repeated or overlaps a target.
    #[error("Qubit {qubit} used more than once across gate modifiers and targets")]
    ModifierConflict { qubit: QubitId },

    /// Scope exit without a matching enter.
    #[error("Cannot exit the global scope")]
    ScopeUnderflow,

    /// Value does not fit the declared or expected type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Assignment to a const declaration.
    #[error("Cannot update const variable '{0}'")]
    ConstAssignment(String),

    /// Read of a declared but never assigned variable.
    #[error("Variable '{0}' is not initialized")]
    Uninitialized(String),

    /// Gate applied to the wrong number of qubits.
    #[error("Gate '{gate}' expects {expected} qubits, got {got}")]
    WrongQubitCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Gate or subroutine called with the wrong number of arguments.
    #[error("'{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Classical array or bit-string index out of bounds.
    #[error("Index {index} out of range for '{name}' of size {size}")]
    IndexOutOfRange { name: String, index: i64, size: usize },

    /// Malformed gate modifier.
    #[error("Invalid gate modifier: {0}")]
    InvalidModifier(String),

    /// Program mixes allocated and hardware qubits.
    #[error("Cannot mix hardware and declared qubits: '{0}'")]
    MixedQubitAddressing(String),

    /// Hardware qubit used while the configuration forbids it.
    #[error("Hardware qubit '{0}' is not allowed by the interpreter configuration")]
    HardwareQubitsDisabled(String),

    /// Allocation would exceed the configured qubit ceiling.
    #[error("Allocating {requested} qubits exceeds the limit of {limit}")]
    QubitLimitExceeded { requested: u64, limit: u32 },

    /// While loop ran past the configured iteration guard.
    #[error("Loop exceeded {0} iterations")]
    LoopLimitExceeded(usize),

    /// Classical expression cannot be evaluated.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Circuit rejected an instruction.
    #[error("Circuit error: {0}")]
    Circuit(#[from] IrError),

    /// Pragma delegate failure, passed through unchanged.
    #[error(transparent)]
    Pragma(#[from] PragmaError),
}

impl InterpError {
    pub(crate) fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        InterpError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result type for interpreter operations.
pub type InterpResult<T> = Result<T, InterpError>;
