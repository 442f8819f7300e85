//! Variable table: current values of declared names.

use std::fmt;

use super::ScopedTable;
use crate::error::{InterpError, InterpResult};
use crate::identifier::{Identifier, IndexLevel};
use crate::types::{ClassicalType, Value};

/// Values bound in each active scope.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    table: ScopedTable<String, Value>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a freshly declared variable in the current scope.
    pub fn add_variable(&mut self, name: &str, value: Value) {
        self.table.insert_local(name.to_string(), value);
    }

    pub fn get_value(&self, name: &str) -> InterpResult<&Value> {
        self.table.get(name)
    }

    /// Value of a possibly indexed identifier.
    pub fn get_value_by_identifier(&self, identifier: &Identifier) -> InterpResult<Value> {
        let value = self.get_value(identifier.name())?;
        if !value.is_initialized() {
            return Err(InterpError::Uninitialized(identifier.name().to_string()));
        }
        value.get_indexed(identifier.name(), identifier.levels())
    }

    /// Assign to `name`, or to the part of it selected by `levels`.
    ///
    /// Whole-value writes are coerced to `ty`; partial writes are coerced to
    /// the element type held by the stored value. The binding updated is the
    /// innermost one, wherever it lives.
    pub fn update_value(
        &mut self,
        name: &str,
        value: Value,
        ty: &ClassicalType,
        levels: &[IndexLevel],
    ) -> InterpResult<()> {
        if levels.is_empty() {
            let coerced = value.coerce(ty)?;
            *self.table.get_mut(name)? = coerced;
            return Ok(());
        }
        self.table.get_mut(name)?.set_indexed(name, levels, value)
    }

    pub fn is_initialized(&self, name: &str) -> InterpResult<bool> {
        Ok(self.get_value(name)?.is_initialized())
    }

    pub fn push_scope(&mut self) {
        self.table.push_scope();
    }

    pub fn pop_scope(&mut self) -> InterpResult<()> {
        self.table.pop_scope()
    }
}

impl fmt::Display for VariableTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)
    }
}
