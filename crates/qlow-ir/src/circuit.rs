//! Append-only circuit: the artifact handed to the execution engine.

use num_complex::Complex64;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::GateOperation;
use crate::instruction::Instruction;
use crate::qubit::{ClbitId, QubitId};
use crate::result::ResultType;

/// An ordered instruction stream over a flat qubit index space.
///
/// Every qubit referenced by an appended instruction must be below
/// [`Circuit::num_qubits`] at the time of the append.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
    /// Size of the qubit index space.
    num_qubits: u32,
    /// Measured qubits, in first-measurement order.
    measured_qubits: Vec<QubitId>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a circuit with an index space of `num_qubits` qubits.
    pub fn with_qubits(name: impl Into<String>, num_qubits: u32) -> Self {
        let mut circuit = Self::new(name);
        circuit.num_qubits = num_qubits;
        circuit
    }

    /// Grow the qubit index space to at least `num_qubits`. Never shrinks.
    pub fn extend_qubits_to(&mut self, num_qubits: u32) {
        self.num_qubits = self.num_qubits.max(num_qubits);
    }

    fn check_qubits(&self, qubits: &[QubitId], gate_name: Option<&str>) -> IrResult<()> {
        match qubits.iter().find(|q| q.0 >= self.num_qubits) {
            Some(&qubit) => Err(IrError::QubitNotFound {
                qubit,
                num_qubits: self.num_qubits,
                gate_name: gate_name.map(str::to_string),
            }),
            None => Ok(()),
        }
    }

    /// Append a gate application.
    ///
    /// `qubits` lists the controls first, then the gate's own targets.
    pub fn add_gate(&mut self, op: GateOperation, qubits: Vec<QubitId>) -> IrResult<&mut Self> {
        self.check_qubits(&qubits, Some(&op.name))?;
        let mut seen = FxHashSet::default();
        if let Some(&qubit) = qubits.iter().find(|q| !seen.insert(**q)) {
            return Err(IrError::DuplicateQubit {
                qubit,
                gate_name: Some(op.name),
            });
        }
        self.instructions.push(Instruction::gate(op, qubits));
        Ok(self)
    }

    /// Append a phase operation.
    ///
    /// Repeated qubits are dropped, keeping first occurrences in order. An
    /// empty target list applies the phase to every qubit.
    pub fn add_phase(&mut self, phase: f64, qubits: &[QubitId]) -> IrResult<&mut Self> {
        self.check_qubits(qubits, Some("gphase"))?;
        let targets: Vec<QubitId> = if qubits.is_empty() {
            (0..self.num_qubits).map(QubitId).collect()
        } else {
            let mut seen = FxHashSet::default();
            qubits.iter().copied().filter(|q| seen.insert(*q)).collect()
        };
        self.instructions.push(Instruction::phase(phase, targets));
        Ok(self)
    }

    /// Append a measurement of one qubit.
    pub fn add_measure(&mut self, qubit: QubitId, clbit: Option<ClbitId>) -> IrResult<&mut Self> {
        self.check_qubits(&[qubit], Some("measure"))?;
        if !self.measured_qubits.contains(&qubit) {
            self.measured_qubits.push(qubit);
        }
        self.instructions.push(Instruction::measure(qubit, clbit));
        Ok(self)
    }

    /// Append a custom unitary.
    pub fn add_unitary(
        &mut self,
        matrix: Vec<Vec<Complex64>>,
        qubits: Vec<QubitId>,
    ) -> IrResult<&mut Self> {
        self.check_qubits(&qubits, Some("unitary"))?;
        let expected = 1usize << qubits.len();
        let cols = matrix.first().map_or(0, Vec::len);
        if matrix.len() != expected || matrix.iter().any(|row| row.len() != expected) {
            return Err(IrError::MatrixDimension {
                num_qubits: qubits.len(),
                expected,
                rows: matrix.len(),
                cols,
            });
        }
        self.instructions.push(Instruction::unitary(matrix, qubits));
        Ok(self)
    }

    /// Append a result declaration. Empty `qubits` means all qubits.
    pub fn add_result(&mut self, result: ResultType, qubits: Vec<QubitId>) -> IrResult<&mut Self> {
        self.check_qubits(&qubits, None)?;
        if let Some(observable) = result.observable() {
            if !qubits.is_empty() && observable.num_qubits() != qubits.len() {
                return Err(IrError::QubitCountMismatch {
                    gate_name: observable.to_string(),
                    expected: observable.num_qubits(),
                    got: qubits.len(),
                });
            }
        }
        self.instructions.push(Instruction::result(result, qubits));
        Ok(self)
    }

    /// Get the name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the qubit index space.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// All instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether no instruction has been appended.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Gate instructions only.
    pub fn gates(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is_gate())
    }

    /// Result declarations with their targets.
    pub fn results(&self) -> impl Iterator<Item = (&ResultType, &[QubitId])> {
        self.instructions
            .iter()
            .filter_map(|i| i.as_result().map(|r| (r, i.qubits.as_slice())))
    }

    /// Measured qubits in first-measurement order.
    pub fn measured_qubits(&self) -> &[QubitId] {
        &self.measured_qubits
    }

    /// Serialize for handoff.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a serialized circuit.
    pub fn from_json(json: &str) -> IrResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::ControlState;
    use crate::instruction::InstructionKind;
    use crate::result::{Observable, PauliFactor};

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_extend_never_shrinks() {
        let mut circuit = Circuit::with_qubits("test", 4);
        circuit.extend_qubits_to(2);
        assert_eq!(circuit.num_qubits(), 4);
        circuit.extend_qubits_to(6);
        assert_eq!(circuit.num_qubits(), 6);
    }

    #[test]
    fn test_gate_rejects_unallocated_qubit() {
        let mut circuit = Circuit::with_qubits("test", 2);
        let err = circuit
            .add_gate(GateOperation::new("h", vec![]), vec![QubitId(2)])
            .unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { qubit: QubitId(2), .. }));
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_gate_rejects_duplicate_targets() {
        let mut circuit = Circuit::with_qubits("test", 2);
        let err = circuit
            .add_gate(GateOperation::new("cnot", vec![]), vec![QubitId(1), QubitId(1)])
            .unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { qubit: QubitId(1), .. }));
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::with_qubits("test", 2);
        circuit
            .add_gate(GateOperation::new("h", vec![]), vec![QubitId(0)])
            .unwrap()
            .add_gate(
                GateOperation::new("x", vec![]).with_controls(vec![ControlState::One]),
                vec![QubitId(0), QubitId(1)],
            )
            .unwrap()
            .add_measure(QubitId(1), Some(ClbitId(0)))
            .unwrap();

        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.gates().count(), 2);
        assert_eq!(circuit.measured_qubits(), &[QubitId(1)]);
    }

    #[test]
    fn test_phase_dedups_targets() {
        let mut circuit = Circuit::with_qubits("test", 3);
        circuit
            .add_phase(0.5, &[QubitId(2), QubitId(0), QubitId(2)])
            .unwrap();
        assert_eq!(circuit.instructions()[0].qubits, vec![QubitId(2), QubitId(0)]);

        circuit.add_phase(0.1, &[]).unwrap();
        assert_eq!(circuit.instructions()[1].qubits.len(), 3);
        assert!(matches!(
            circuit.instructions()[1].kind,
            InstructionKind::Phase { phase } if (phase - 0.1).abs() < 1e-12
        ));
    }

    #[test]
    fn test_unitary_dimension_checked() {
        let mut circuit = Circuit::with_qubits("test", 1);
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        circuit
            .add_unitary(vec![vec![zero, one], vec![one, zero]], vec![QubitId(0)])
            .unwrap();
        let err = circuit
            .add_unitary(vec![vec![one]], vec![QubitId(0)])
            .unwrap_err();
        assert!(matches!(err, IrError::MatrixDimension { expected: 2, .. }));
    }

    #[test]
    fn test_result_observable_width() {
        let mut circuit = Circuit::with_qubits("test", 2);
        let obs = Observable(vec![PauliFactor::Z, PauliFactor::Z]);
        circuit
            .add_result(ResultType::Expectation(obs.clone()), vec![QubitId(0), QubitId(1)])
            .unwrap();
        assert!(circuit
            .add_result(ResultType::Variance(obs), vec![QubitId(0)])
            .is_err());
        assert_eq!(circuit.results().count(), 1);
    }

    #[test]
    fn test_json_handoff() {
        let mut circuit = Circuit::with_qubits("bell", 2);
        circuit
            .add_gate(GateOperation::new("h", vec![]), vec![QubitId(0)])
            .unwrap();
        let restored = Circuit::from_json(&circuit.to_json().unwrap()).unwrap();
        assert_eq!(restored.num_qubits(), 2);
        assert_eq!(restored.instructions(), circuit.instructions());
    }
}
