//! Scoped name tables.
//!
//! [`ScopedTable`] is the shared stack-of-maps primitive; the other tables
//! wrap it with the operations the program context needs for symbols,
//! values, and user definitions.

pub mod definition;
pub mod scoped;
pub mod symbol;
pub mod variable;

pub use definition::{DefinitionTable, GateTable, SubroutineTable};
pub use scoped::ScopedTable;
pub use symbol::{Symbol, SymbolTable, SymbolType};
pub use variable::VariableTable;
