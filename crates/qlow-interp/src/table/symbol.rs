//! Symbol table: declared names with their type and constness.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ScopedTable;
use crate::error::{InterpError, InterpResult};
use crate::types::ClassicalType;

/// Declared type of a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolType {
    Classical(ClassicalType),
    /// A qubit register or an alias for part of one.
    Qubit,
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolType::Classical(ty) => write!(f, "{ty}"),
            SymbolType::Qubit => write!(f, "qubit"),
        }
    }
}

/// A declared name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub symbol_type: SymbolType,
    pub is_const: bool,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.symbol_type)
    }
}

/// Names declared in each active scope.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    table: ScopedTable<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` in the current scope.
    ///
    /// Shadowing an outer declaration is allowed; redeclaring within the
    /// same scope is not.
    pub fn add_symbol(
        &mut self,
        name: &str,
        symbol_type: SymbolType,
        is_const: bool,
    ) -> InterpResult<()> {
        if self.table.contains_in_current_scope(name) {
            return Err(InterpError::Redeclaration(name.to_string()));
        }
        self.table.insert_local(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                symbol_type,
                is_const,
            },
        );
        Ok(())
    }

    pub fn get_symbol(&self, name: &str) -> InterpResult<&Symbol> {
        self.table.get(name)
    }

    pub fn get_type(&self, name: &str) -> InterpResult<&SymbolType> {
        Ok(&self.get_symbol(name)?.symbol_type)
    }

    pub fn get_const(&self, name: &str) -> InterpResult<bool> {
        Ok(self.get_symbol(name)?.is_const)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    /// Whether `name` is already declared in the innermost scope.
    pub fn contains_local(&self, name: &str) -> bool {
        self.table.contains_in_current_scope(name)
    }

    pub fn depth(&self) -> usize {
        self.table.depth()
    }

    /// Scope level of the visible declaration of `name`, 0 being global.
    pub fn scope_of(&self, name: &str) -> Option<usize> {
        self.table.scope_of(name)
    }

    pub fn push_scope(&mut self) {
        self.table.push_scope();
    }

    pub fn pop_scope(&mut self) -> InterpResult<()> {
        self.table.pop_scope()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut symbols = SymbolTable::new();
        symbols
            .add_symbol("x", SymbolType::Classical(ClassicalType::Int(None)), false)
            .unwrap();
        let err = symbols
            .add_symbol("x", SymbolType::Classical(ClassicalType::Bool), false)
            .unwrap_err();
        assert!(matches!(err, InterpError::Redeclaration(n) if n == "x"));
    }

    #[test]
    fn test_shadowing_in_inner_scope() {
        let mut symbols = SymbolTable::new();
        symbols
            .add_symbol("x", SymbolType::Classical(ClassicalType::Int(None)), true)
            .unwrap();
        symbols.push_scope();
        symbols
            .add_symbol("x", SymbolType::Classical(ClassicalType::Float(None)), false)
            .unwrap();
        assert!(!symbols.get_const("x").unwrap());
        symbols.pop_scope().unwrap();
        assert!(symbols.get_const("x").unwrap());
        assert_eq!(
            symbols.get_type("x").unwrap(),
            &SymbolType::Classical(ClassicalType::Int(None))
        );
    }

    #[test]
    fn test_symbol_display() {
        let mut symbols = SymbolTable::new();
        symbols
            .add_symbol("n", SymbolType::Classical(ClassicalType::Uint(Some(4))), true)
            .unwrap();
        symbols.add_symbol("q", SymbolType::Qubit, false).unwrap();
        let text = symbols.to_string();
        assert!(text.contains("n: const uint[4]"));
        assert!(text.contains("q: qubit"));
    }
}
