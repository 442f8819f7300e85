//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors raised while appending to or evaluating parts of a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index is not below the circuit's qubit count.
    #[error("Qubit {qubit} not allocated in circuit of {num_qubits} qubits{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The offending qubit.
        qubit: QubitId,
        /// Qubit count at the time of the append.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// The same qubit appears twice in a gate's target list.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate received the wrong number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: usize,
        /// Actual number of qubits provided.
        got: usize,
    },

    /// Custom unitary matrix does not match its target count.
    #[error("Unitary on {num_qubits} qubits needs a {expected}x{expected} matrix, got {rows}x{cols}")]
    MatrixDimension {
        /// Number of target qubits.
        num_qubits: usize,
        /// Expected side length (`2^num_qubits`).
        expected: usize,
        /// Rows supplied.
        rows: usize,
        /// Columns of the first row supplied.
        cols: usize,
    },

    /// Parameter references a symbol with no value.
    #[error("Parameter '{0}' is unbound")]
    UnboundParameter(String),

    /// Parameter expression cannot be reduced to a finite number.
    #[error("Cannot evaluate parameter expression: {0}")]
    Evaluation(String),

    /// Circuit could not be serialized for handoff.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
