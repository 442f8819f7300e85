//! Circuit instructions combining an operation with its qubit operands.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::gate::GateOperation;
use crate::qubit::{ClbitId, QubitId};
use crate::result::ResultType;

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A gate application; the first `num_controls` qubits are controls.
    Gate(GateOperation),
    /// Global phase shift restricted to the listed qubits.
    Phase {
        /// Phase angle in radians.
        phase: f64,
    },
    /// Measurement of each qubit, optionally into the listed classical bits.
    Measure,
    /// User-supplied unitary matrix, row-major.
    Unitary {
        /// Square matrix of side `2^qubits.len()`.
        matrix: Vec<Vec<Complex64>>,
    },
    /// Result declaration over the listed qubits (all qubits when empty).
    Result(ResultType),
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on, in order.
    pub qubits: Vec<QubitId>,
    /// Classical bits receiving measurement outcomes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(op: GateOperation, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(op),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a phase instruction.
    pub fn phase(phase: f64, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Phase { phase },
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a measurement of one qubit.
    pub fn measure(qubit: QubitId, clbit: Option<ClbitId>) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: clbit.into_iter().collect(),
        }
    }

    /// Create a custom unitary instruction.
    pub fn unitary(matrix: Vec<Vec<Complex64>>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Unitary { matrix },
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Create a result declaration.
    pub fn result(result: ResultType, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Result(result),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
        }
    }

    /// Get the gate operation if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&GateOperation> {
        match &self.kind {
            InstructionKind::Gate(op) => Some(op),
            _ => None,
        }
    }

    /// Get the result type if this is a result declaration.
    pub fn as_result(&self) -> Option<&ResultType> {
        match &self.kind {
            InstructionKind::Result(r) => Some(r),
            _ => None,
        }
    }

    /// Control qubits of a gate instruction; empty for everything else.
    pub fn controls(&self) -> &[QubitId] {
        match &self.kind {
            InstructionKind::Gate(op) => &self.qubits[..op.num_controls()],
            _ => &[],
        }
    }

    /// Targets of a gate instruction after its controls; all qubits otherwise.
    pub fn targets(&self) -> &[QubitId] {
        match &self.kind {
            InstructionKind::Gate(op) => &self.qubits[op.num_controls()..],
            _ => &self.qubits,
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a result declaration.
    pub fn is_result(&self) -> bool {
        matches!(self.kind, InstructionKind::Result(_))
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(op) => &op.name,
            InstructionKind::Phase { .. } => "gphase",
            InstructionKind::Measure => "measure",
            InstructionKind::Unitary { .. } => "unitary",
            InstructionKind::Result(r) => r.name(),
        }
    }
}
