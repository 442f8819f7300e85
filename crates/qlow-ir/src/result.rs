//! Result declarations requested by a program.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-qubit Pauli-like factor of an observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliFactor {
    I,
    X,
    Y,
    Z,
    H,
}

impl PauliFactor {
    /// Parse a lowercase factor name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "i" => Some(PauliFactor::I),
            "x" => Some(PauliFactor::X),
            "y" => Some(PauliFactor::Y),
            "z" => Some(PauliFactor::Z),
            "h" => Some(PauliFactor::H),
            _ => None,
        }
    }
}

impl fmt::Display for PauliFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PauliFactor::I => "i",
            PauliFactor::X => "x",
            PauliFactor::Y => "y",
            PauliFactor::Z => "z",
            PauliFactor::H => "h",
        };
        f.write_str(s)
    }
}

/// Tensor product of single-qubit factors, one per target qubit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observable(pub Vec<PauliFactor>);

impl Observable {
    /// Number of qubits the observable acts on.
    pub fn num_qubits(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" @ "))
    }
}

/// A result the program asks the execution engine to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultType {
    /// Full state vector.
    StateVector,
    /// Amplitudes of the given computational basis states.
    Amplitude {
        /// Bit strings, one character per qubit.
        states: Vec<String>,
    },
    /// Outcome probabilities of the targets (all qubits when empty).
    Probability,
    /// Reduced density matrix of the targets (all qubits when empty).
    DensityMatrix,
    /// Expectation value of an observable.
    Expectation(Observable),
    /// Variance of an observable.
    Variance(Observable),
    /// Sampled eigenvalues of an observable.
    Sample(Observable),
}

impl ResultType {
    /// Name used in logs and serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            ResultType::StateVector => "state_vector",
            ResultType::Amplitude { .. } => "amplitude",
            ResultType::Probability => "probability",
            ResultType::DensityMatrix => "density_matrix",
            ResultType::Expectation(_) => "expectation",
            ResultType::Variance(_) => "variance",
            ResultType::Sample(_) => "sample",
        }
    }

    /// The observable, for observable-based results.
    pub fn observable(&self) -> Option<&Observable> {
        match self {
            ResultType::Expectation(o) | ResultType::Variance(o) | ResultType::Sample(o) => Some(o),
            _ => None,
        }
    }
}
