//! User-defined gate and subroutine bodies, keyed by name.

use std::sync::Arc;

use super::ScopedTable;
use crate::ast::{GateDefinition, SubroutineDefinition};
use crate::error::{InterpError, InterpResult};

/// Scoped table of shared definition bodies.
///
/// Bodies are handed out as `Arc`s so a caller can walk a body while the
/// context that owns the table is borrowed mutably.
#[derive(Debug, Clone)]
pub struct DefinitionTable<D> {
    table: ScopedTable<String, Arc<D>>,
    missing: fn(String) -> InterpError,
}

/// User-defined gates.
pub type GateTable = DefinitionTable<GateDefinition>;

/// User-defined subroutines.
pub type SubroutineTable = DefinitionTable<SubroutineDefinition>;

impl GateTable {
    pub fn new() -> Self {
        Self {
            table: ScopedTable::new(),
            missing: InterpError::UnknownGate,
        }
    }
}

impl Default for GateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SubroutineTable {
    pub fn new() -> Self {
        Self {
            table: ScopedTable::new(),
            missing: InterpError::UnknownSubroutine,
        }
    }
}

impl Default for SubroutineTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> DefinitionTable<D> {
    /// Register a definition in the current scope.
    pub fn add(&mut self, name: &str, definition: D) -> InterpResult<()> {
        if self.table.contains_in_current_scope(name) {
            return Err(InterpError::Redeclaration(name.to_string()));
        }
        self.table.insert_local(name.to_string(), Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, name: &str) -> InterpResult<Arc<D>> {
        self.table
            .lookup(name)
            .cloned()
            .ok_or_else(|| (self.missing)(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    pub fn push_scope(&mut self) {
        self.table.push_scope();
    }

    pub fn pop_scope(&mut self) -> InterpResult<()> {
        self.table.pop_scope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(name: &str) -> GateDefinition {
        GateDefinition {
            name: name.into(),
            params: vec![],
            qubits: vec!["a".into()],
            body: vec![],
        }
    }

    #[test]
    fn test_missing_gate() {
        let gates = GateTable::new();
        assert!(matches!(gates.get("g"), Err(InterpError::UnknownGate(n)) if n == "g"));
    }

    #[test]
    fn test_missing_subroutine() {
        let subs = SubroutineTable::new();
        assert!(matches!(subs.get("f"), Err(InterpError::UnknownSubroutine(_))));
    }

    #[test]
    fn test_gate_redefinition() {
        let mut gates = GateTable::new();
        gates.add("g", gate("g")).unwrap();
        assert!(matches!(
            gates.add("g", gate("g")),
            Err(InterpError::Redeclaration(_))
        ));
        assert_eq!(gates.get("g").unwrap().qubits, vec!["a".to_string()]);
    }

    #[test]
    fn test_scoped_definition() {
        let mut gates = GateTable::new();
        gates.push_scope();
        gates.add("local", gate("local")).unwrap();
        assert!(gates.contains("local"));
        gates.pop_scope().unwrap();
        assert!(!gates.contains("local"));
    }
}
