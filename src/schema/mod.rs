//! Schema registry: which tables exist, how they join, and which columns a
//! request may reference in each slot.

pub mod reference;
mod registry;

pub use reference::{sales_registry, sales_schema};
pub use registry::{
    AllowLists, ColumnOwner, ColumnRef, JoinCondition, JoinTable, MainTable, SchemaDef,
    SchemaError, SchemaRegistry, TableDef,
};
