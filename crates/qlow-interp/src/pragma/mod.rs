//! Pragma delegation.
//!
//! The program context never interprets pragma bodies itself. It hands the
//! body text and the current [`QubitTable`] to a [`PragmaParser`] and acts on
//! the [`PragmaDirective`] that comes back. [`DefaultPragmaParser`] handles the
//! Braket result, unitary and verbatim pragmas.

pub mod lexer;
mod parser;

pub use parser::DefaultPragmaParser;

use qlow_ir::{Complex64, QubitId, ResultType};
use thiserror::Error;

use crate::qubit_table::QubitTable;

/// Errors raised while parsing a pragma body.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PragmaError {
    /// Lexer error (invalid token).
    #[error("Pragma lexer error at position {position}: {message}")]
    Lexer { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token in pragma: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// Unexpected end of input.
    #[error("Unexpected end of pragma: {0}")]
    UnexpectedEof(String),

    /// Pragma kind this parser does not handle.
    #[error("Unsupported pragma: {0}")]
    Unsupported(String),

    /// Observable factor that is not a known Pauli or Hadamard.
    #[error("Unknown observable: {0}")]
    UnknownObservable(String),

    /// A target that does not resolve against the qubit table.
    #[error("Invalid pragma target '{target}': {reason}")]
    Target { target: String, reason: String },

    /// Malformed unitary matrix.
    #[error("Invalid matrix: {0}")]
    Matrix(String),
}

/// Result type for pragma parsing.
pub type PragmaResult<T> = Result<T, PragmaError>;

/// What a pragma asks the context to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PragmaDirective {
    /// Declare a result over `targets` (all qubits when empty).
    Result {
        result: ResultType,
        targets: Vec<QubitId>,
    },
    /// Apply a custom unitary.
    Unitary {
        matrix: Vec<Vec<Complex64>>,
        targets: Vec<QubitId>,
    },
    /// Mark the following block as verbatim; no instruction is emitted.
    Verbatim,
}

/// Parses pragma bodies for the program context.
pub trait PragmaParser: Send {
    /// Parse `body`, resolving any qubit names against `qubits`.
    fn parse(&self, body: &str, qubits: &QubitTable) -> PragmaResult<PragmaDirective>;
}
