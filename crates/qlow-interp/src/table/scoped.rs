//! Lexically scoped key/value storage.

use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use crate::error::{InterpError, InterpResult};

/// A stack of maps, innermost scope last.
///
/// Lookups walk from the innermost scope outward. The bottom (global) scope
/// always exists and can never be popped.
///
/// [`set`](Self::set), [`delete`](Self::delete) and [`items`](Self::items)
/// are table-level API for embedders; [`ProgramContext`](crate::ProgramContext)
/// itself only declares with `insert_local` and updates in place with
/// `get_mut`.
#[derive(Debug, Clone)]
pub struct ScopedTable<K, V> {
    scopes: Vec<FxHashMap<K, V>>,
}

impl<K: Eq + Hash, V> Default for ScopedTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> ScopedTable<K, V> {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Number of active scopes, the global one included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Push a new innermost scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the innermost scope, discarding its bindings.
    pub fn pop_scope(&mut self) -> InterpResult<()> {
        if self.scopes.len() <= 1 {
            return Err(InterpError::ScopeUnderflow);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Index of the innermost scope binding `key`, 0 being global.
    pub fn scope_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scopes.iter().rposition(|scope| scope.contains_key(key))
    }

    /// Value bound to `key` in the innermost scope that defines it.
    pub fn get<Q>(&self, key: &Q) -> InterpResult<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.lookup(key)
            .ok_or_else(|| InterpError::UndefinedName(key.to_string()))
    }

    /// Like [`ScopedTable::get`], without the error.
    pub fn lookup<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scopes.iter().rev().find_map(|scope| scope.get(key))
    }

    /// Mutable access to the innermost binding of `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> InterpResult<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        match self.scope_of(key) {
            Some(depth) => self
                .scopes
                .get_mut(depth)
                .and_then(|scope| scope.get_mut(key))
                .ok_or_else(|| InterpError::UndefinedName(key.to_string())),
            None => Err(InterpError::UndefinedName(key.to_string())),
        }
    }

    /// Bind `key`, overwriting the innermost existing binding if there is
    /// one and creating it in the innermost scope otherwise.
    ///
    /// Assignment therefore reaches the variable it shadows rather than
    /// creating a new local.
    pub fn set(&mut self, key: K, value: V) {
        let depth = self
            .scope_of(&key)
            .unwrap_or(self.scopes.len() - 1);
        self.scopes[depth].insert(key, value);
    }

    /// Bind `key` in the innermost scope, shadowing any outer binding.
    pub fn insert_local(&mut self, key: K, value: V) -> Option<V> {
        let last = self.scopes.len() - 1;
        self.scopes[last].insert(key, value)
    }

    /// Whether `key` is bound in the innermost scope.
    pub fn contains_in_current_scope<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(key))
    }

    /// Whether `key` is bound in any active scope.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.scope_of(key).is_some()
    }

    /// Remove the innermost binding of `key`.
    pub fn delete<Q>(&mut self, key: &Q) -> InterpResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.scope_of(key)
            .and_then(|depth| self.scopes[depth].remove(key))
            .ok_or_else(|| InterpError::UndefinedName(key.to_string()))
    }

    /// Visible bindings, innermost scope first; shadowed bindings are
    /// skipped.
    pub fn items(&self) -> Vec<(&K, &V)> {
        let mut seen: Vec<&K> = Vec::new();
        let mut items = Vec::new();
        for scope in self.scopes.iter().rev() {
            for (key, value) in scope {
                if !seen.contains(&key) {
                    seen.push(key);
                    items.push((key, value));
                }
            }
        }
        items
    }
}

impl<K, V> fmt::Display for ScopedTable<K, V>
where
    K: Eq + Hash + Ord + fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, scope) in self.scopes.iter().enumerate() {
            let mut keys: Vec<&K> = scope.keys().collect();
            keys.sort();
            writeln!(f, "scope {depth}:")?;
            for key in keys {
                writeln!(f, "  {key}: {}", scope[key])?;
            }
        }
        Ok(())
    }
}
