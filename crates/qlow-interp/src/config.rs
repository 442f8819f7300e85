//! Interpreter configuration.
//!
//! Every field has a serde default, so a partial JSON document (or `{}`)
//! is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::InterpResult;

/// Qubit ceiling used when [`InterpreterConfig::max_qubits`] is unset.
pub const DEFAULT_MAX_QUBITS: u32 = 1 << 20;

/// Settings for one interpretation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Name given to the emitted circuit.
    #[serde(default = "default_circuit_name")]
    pub circuit_name: String,

    /// Ceiling on the total number of allocated qubits; [`DEFAULT_MAX_QUBITS`]
    /// when unset.
    #[serde(default)]
    pub max_qubits: Option<u32>,

    /// Iterations a single `while` loop may run before the program is rejected.
    #[serde(default = "default_max_loop_iterations")]
    pub max_loop_iterations: usize,

    /// Whether `$n` hardware qubits may be addressed.
    #[serde(default = "default_true")]
    pub allow_hardware_qubits: bool,
}

fn default_circuit_name() -> String {
    "main".to_string()
}

fn default_max_loop_iterations() -> usize {
    100_000
}

fn default_true() -> bool {
    true
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            circuit_name: default_circuit_name(),
            max_qubits: None,
            max_loop_iterations: default_max_loop_iterations(),
            allow_hardware_qubits: true,
        }
    }
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> InterpResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The effective qubit ceiling.
    pub fn qubit_limit(&self) -> u32 {
        self.max_qubits.unwrap_or(DEFAULT_MAX_QUBITS)
    }

    #[must_use]
    pub fn with_circuit_name(mut self, name: impl Into<String>) -> Self {
        self.circuit_name = name.into();
        self
    }

    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = Some(max_qubits);
        self
    }

    #[must_use]
    pub fn with_max_loop_iterations(mut self, iterations: usize) -> Self {
        self.max_loop_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_hardware_qubits(mut self, allow: bool) -> Self {
        self.allow_hardware_qubits = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterpError;

    #[test]
    fn test_defaults() {
        let config = InterpreterConfig::default();
        assert_eq!(config.circuit_name, "main");
        assert_eq!(config.max_qubits, None);
        assert_eq!(config.qubit_limit(), DEFAULT_MAX_QUBITS);
        assert_eq!(config.max_loop_iterations, 100_000);
        assert!(config.allow_hardware_qubits);
    }

    #[test]
    fn test_partial_json() {
        let config = InterpreterConfig::from_json(r#"{"max_qubits": 8}"#).unwrap();
        assert_eq!(config.max_qubits, Some(8));
        assert_eq!(config.circuit_name, "main");
        assert_eq!(InterpreterConfig::from_json("{}").unwrap(), InterpreterConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let err = InterpreterConfig::from_json(r#"{"max_qubits": "many"}"#).unwrap_err();
        assert!(matches!(err, InterpError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = InterpreterConfig::new()
            .with_circuit_name("bell")
            .with_max_qubits(2)
            .with_max_loop_iterations(10)
            .with_hardware_qubits(false);
        assert_eq!(config.circuit_name, "bell");
        assert_eq!(config.max_qubits, Some(2));
        assert_eq!(config.qubit_limit(), 2);
        assert_eq!(config.max_loop_iterations, 10);
        assert!(!config.allow_hardware_qubits);
    }
}
