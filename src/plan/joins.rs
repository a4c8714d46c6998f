//! Join resolution: which join tables a request needs, and in what order.

use crate::error::QueryResult;
use crate::schema::{ColumnOwner, JoinTable, SchemaRegistry};

pub struct JoinResolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> JoinResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// The minimal ordered set of joins covering `columns`.
    ///
    /// A table is required when it owns one of the columns. Each required table
    /// is preceded by its dependency chain, and no table appears twice.
    /// Independent tables keep registration order.
    pub fn resolve<S: AsRef<str>>(&self, columns: &[S]) -> QueryResult<Vec<&'a JoinTable>> {
        let joins = self.registry.joins();
        let mut required = vec![false; joins.len()];
        for column in columns {
            let column = column.as_ref();
            // Unmapped columns fail here even if validation was skipped.
            self.registry.resolve_alias(column)?;
            if let Some(ColumnOwner::Join(idx)) = self.registry.owner_of(column) {
                required[idx] = true;
            }
        }

        let mut emitted = vec![false; joins.len()];
        let mut ordered = Vec::new();
        for idx in (0..joins.len()).filter(|&i| required[i]) {
            self.visit(idx, &mut emitted, &mut ordered);
        }
        Ok(ordered)
    }

    /// Depth-first: dependency before dependent. The registry rejects cycles
    /// at construction, so recursion is bounded by the number of tables.
    fn visit(&self, idx: usize, emitted: &mut [bool], ordered: &mut Vec<&'a JoinTable>) {
        if emitted[idx] {
            return;
        }
        let table = &self.registry.joins()[idx];
        if let Some(dep) = table
            .depends_on
            .as_deref()
            .and_then(|name| self.registry.join_index(name))
        {
            self.visit(dep, emitted, ordered);
        }
        emitted[idx] = true;
        ordered.push(table);
    }
}

/// Shorthand for [`JoinResolver::resolve`].
pub fn resolve_joins<'a, S: AsRef<str>>(
    registry: &'a SchemaRegistry,
    columns: &[S],
) -> QueryResult<Vec<&'a JoinTable>> {
    JoinResolver::new(registry).resolve(columns)
}
