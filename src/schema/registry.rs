//! The immutable schema registry.
//!
//! A registry describes one main table that every query reads from and any
//! number of joinable tables. Each table carries three allow-lists (metric,
//! group-by, filter); a joinable table also carries its join condition and an
//! optional dependency that has to be joined before it.
//!
//! Registries are validated once, at construction, and never mutated
//! afterwards. Share them behind an `Arc`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::{ColumnRole, QueryError, QueryResult};
use crate::sql::expr::{table_col, Expr, ExprExt};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    ReadError(String),

    #[error("Failed to parse schema file: {0}")]
    ParseError(String),

    #[error("Main table '{0}' cannot declare a join condition or dependency")]
    MainTableJoin(String),

    #[error("Joinable table '{0}' has no join condition")]
    MissingJoinCondition(String),

    #[error("Invalid join condition for '{table}': {condition}")]
    InvalidJoinCondition { table: String, condition: String },

    #[error("Join condition for '{table}' references '{alias}', which is not joined before it")]
    UnjoinedAlias { table: String, alias: String },

    #[error("Duplicate table name: {0}")]
    DuplicateTable(String),

    #[error("Duplicate table alias: {0}")]
    DuplicateAlias(String),

    #[error("Table '{table}' depends on unknown table '{dependency}'")]
    UnknownDependency { table: String, dependency: String },

    #[error("Join dependency cycle involving '{0}'")]
    DependencyCycle(String),

    #[error("Column '{column}' is allow-listed in both '{first}' and '{second}'")]
    AmbiguousColumn {
        column: String,
        first: String,
        second: String,
    },

    #[error("Temporal column '{0}' is not allow-listed in any table")]
    UnknownTemporalColumn(String),
}

// ============================================================================
// Allow-lists
// ============================================================================

/// The three per-table column allow-lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowLists {
    pub metric: BTreeSet<String>,
    pub group_by: BTreeSet<String>,
    pub filter: BTreeSet<String>,
}

impl AllowLists {
    /// The allow-list consulted for a request slot.
    pub fn for_role(&self, role: ColumnRole) -> &BTreeSet<String> {
        match role {
            ColumnRole::Metric => &self.metric,
            ColumnRole::Grouping => &self.group_by,
            ColumnRole::Filter => &self.filter,
        }
    }

    /// Whether any of the three lists names `column`.
    pub fn contains_any(&self, column: &str) -> bool {
        self.metric.contains(column)
            || self.group_by.contains(column)
            || self.filter.contains(column)
    }

    /// Every column named by any list, deduplicated and sorted.
    pub fn all_columns(&self) -> BTreeSet<&str> {
        self.metric
            .iter()
            .chain(&self.group_by)
            .chain(&self.filter)
            .map(String::as_str)
            .collect()
    }
}

// ============================================================================
// Tables
// ============================================================================

/// `alias.column` on one side of a join condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    pub column: String,
}

/// An equality join condition, `left = right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left: ColumnRef,
    pub right: ColumnRef,
}

impl JoinCondition {
    /// Parse `"<alias>.<column> = <alias>.<column>"`.
    pub fn parse(condition: &str) -> Option<Self> {
        let (left, right) = condition.split_once('=')?;
        Some(Self {
            left: parse_column_ref(left)?,
            right: parse_column_ref(right)?,
        })
    }

    /// The condition as an expression with quoted identifiers.
    pub fn to_expr(&self) -> Expr {
        table_col(&self.left.alias, &self.left.column)
            .eq(table_col(&self.right.alias, &self.right.column))
    }

    fn aliases(&self) -> [&str; 2] {
        [&self.left.alias, &self.right.alias]
    }
}

impl std::fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} = {}.{}",
            self.left.alias, self.left.column, self.right.alias, self.right.column
        )
    }
}

fn parse_column_ref(side: &str) -> Option<ColumnRef> {
    let (alias, column) = side.trim().split_once('.')?;
    if is_plain_identifier(alias) && is_plain_identifier(column) {
        Some(ColumnRef {
            alias: alias.to_string(),
            column: column.to_string(),
        })
    } else {
        None
    }
}

fn is_plain_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The table every query selects from.
#[derive(Debug, Clone, PartialEq)]
pub struct MainTable {
    pub name: String,
    pub alias: String,
    pub columns: AllowLists,
}

/// A table that is joined only when a request references one of its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTable {
    pub name: String,
    pub alias: String,
    pub on: JoinCondition,
    pub depends_on: Option<String>,
    pub columns: AllowLists,
}

/// Where a column resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOwner {
    Main,
    /// Index into [`SchemaRegistry::joins`].
    Join(usize),
}

// ============================================================================
// Definitions (builder + file format)
// ============================================================================

/// Declarative description of one table, as written in a schema file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub metric_columns: Vec<String>,
    #[serde(default)]
    pub group_by_columns: Vec<String>,
    #[serde(default)]
    pub filter_columns: Vec<String>,
}

impl TableDef {
    /// Describe the main table.
    pub fn main(name: &str, alias: &str) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            ..Default::default()
        }
    }

    /// Describe a joinable table.
    pub fn join(name: &str, alias: &str, on: &str) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            on: Some(on.into()),
            ..Default::default()
        }
    }

    pub fn depends_on(mut self, table: &str) -> Self {
        self.depends_on = Some(table.into());
        self
    }

    pub fn metric_columns<'a>(mut self, cols: impl IntoIterator<Item = &'a str>) -> Self {
        self.metric_columns = cols.into_iter().map(String::from).collect();
        self
    }

    pub fn group_by_columns<'a>(mut self, cols: impl IntoIterator<Item = &'a str>) -> Self {
        self.group_by_columns = cols.into_iter().map(String::from).collect();
        self
    }

    pub fn filter_columns<'a>(mut self, cols: impl IntoIterator<Item = &'a str>) -> Self {
        self.filter_columns = cols.into_iter().map(String::from).collect();
        self
    }

    fn allow_lists(&self) -> AllowLists {
        AllowLists {
            metric: self.metric_columns.iter().cloned().collect(),
            group_by: self.group_by_columns.iter().cloned().collect(),
            filter: self.filter_columns.iter().cloned().collect(),
        }
    }
}

/// Declarative description of a whole registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub main: TableDef,
    #[serde(default = "default_temporal_column")]
    pub temporal_column: String,
    #[serde(default)]
    pub joins: Vec<TableDef>,
}

fn default_temporal_column() -> String {
    "created_at".to_string()
}

impl SchemaDef {
    pub fn new(main: TableDef) -> Self {
        Self {
            main,
            temporal_column: default_temporal_column(),
            joins: Vec::new(),
        }
    }

    /// Register a joinable table. Registration order is resolution order.
    pub fn join(mut self, table: TableDef) -> Self {
        self.joins.push(table);
        self
    }

    /// The column that accepts a granularity and `PERIODO_DIA`.
    pub fn temporal_column(mut self, column: &str) -> Self {
        self.temporal_column = column.into();
        self
    }

    /// Validate and freeze into a registry.
    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        SchemaRegistry::from_def(self)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable description of the queryable schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    main: MainTable,
    joins: Vec<JoinTable>,
    temporal_column: String,
}

impl SchemaRegistry {
    /// Start describing a registry around its main table.
    pub fn builder(main: TableDef) -> SchemaDef {
        SchemaDef::new(main)
    }

    /// Parse and validate a TOML schema description.
    pub fn from_toml_str(source: &str) -> Result<Self, SchemaError> {
        let def: SchemaDef =
            toml::from_str(source).map_err(|e| SchemaError::ParseError(e.to_string()))?;
        Self::from_def(def)
    }

    /// Load a TOML schema file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    fn from_def(def: SchemaDef) -> Result<Self, SchemaError> {
        if def.main.on.is_some() || def.main.depends_on.is_some() {
            return Err(SchemaError::MainTableJoin(def.main.name));
        }

        let mut names = HashSet::new();
        let mut aliases = HashSet::new();
        names.insert(def.main.name.clone());
        aliases.insert(def.main.alias.clone());

        let mut joins = Vec::with_capacity(def.joins.len());
        for table in &def.joins {
            if !names.insert(table.name.clone()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
            if !aliases.insert(table.alias.clone()) {
                return Err(SchemaError::DuplicateAlias(table.alias.clone()));
            }

            let raw_on = table
                .on
                .as_deref()
                .ok_or_else(|| SchemaError::MissingJoinCondition(table.name.clone()))?;
            let on = JoinCondition::parse(raw_on).ok_or_else(|| {
                SchemaError::InvalidJoinCondition {
                    table: table.name.clone(),
                    condition: raw_on.to_string(),
                }
            })?;

            joins.push(JoinTable {
                name: table.name.clone(),
                alias: table.alias.clone(),
                on,
                depends_on: table.depends_on.clone(),
                columns: table.allow_lists(),
            });
        }

        let registry = Self {
            main: MainTable {
                name: def.main.name.clone(),
                alias: def.main.alias.clone(),
                columns: def.main.allow_lists(),
            },
            joins,
            temporal_column: def.temporal_column,
        };

        registry.check_dependencies()?;
        registry.check_join_conditions()?;
        registry.check_unambiguous_columns()?;

        if registry.owner_of(&registry.temporal_column).is_none() {
            return Err(SchemaError::UnknownTemporalColumn(
                registry.temporal_column.clone(),
            ));
        }

        Ok(registry)
    }

    /// Dependencies must name registered join tables and form no cycle.
    fn check_dependencies(&self) -> Result<(), SchemaError> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let nodes: HashMap<&str, NodeIndex> = self
            .joins
            .iter()
            .map(|t| (t.name.as_str(), graph.add_node(t.name.as_str())))
            .collect();

        for table in &self.joins {
            if let Some(dep) = &table.depends_on {
                let dep_idx = nodes
                    .get(dep.as_str())
                    .ok_or_else(|| SchemaError::UnknownDependency {
                        table: table.name.clone(),
                        dependency: dep.clone(),
                    })?;
                graph.add_edge(*dep_idx, nodes[table.name.as_str()], ());
            }
        }

        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| SchemaError::DependencyCycle(graph[cycle.node_id()].to_string()))
    }

    /// A join condition may only mention the table itself, the main table,
    /// and tables on its dependency chain.
    fn check_join_conditions(&self) -> Result<(), SchemaError> {
        for table in &self.joins {
            let mut visible: HashSet<&str> = HashSet::new();
            visible.insert(&self.main.alias);
            visible.insert(&table.alias);
            for dep in self.dependency_chain(table) {
                visible.insert(&dep.alias);
            }

            let aliases = table.on.aliases();
            if !aliases.contains(&table.alias.as_str()) {
                return Err(SchemaError::InvalidJoinCondition {
                    table: table.name.clone(),
                    condition: table.on.to_string(),
                });
            }
            for alias in aliases {
                if !visible.contains(alias) {
                    return Err(SchemaError::UnjoinedAlias {
                        table: table.name.clone(),
                        alias: alias.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// A column not owned by the main table may be allow-listed by at most
    /// one joinable table. Main-table columns always win resolution, so join
    /// tables may repeat them.
    fn check_unambiguous_columns(&self) -> Result<(), SchemaError> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for table in &self.joins {
            for column in table.columns.all_columns() {
                if self.main.columns.contains_any(column) {
                    continue;
                }
                if let Some(first) = owners.insert(column, &table.name) {
                    return Err(SchemaError::AmbiguousColumn {
                        column: column.to_string(),
                        first: first.to_string(),
                        second: table.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Ancestors of `table`, nearest first. Terminates because cycles are
    /// rejected before this is called.
    fn dependency_chain<'a>(&'a self, table: &'a JoinTable) -> Vec<&'a JoinTable> {
        let mut chain = Vec::new();
        let mut current = table;
        while let Some(dep) = current.depends_on.as_deref().and_then(|d| self.join(d)) {
            chain.push(dep);
            current = dep;
        }
        chain
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn main(&self) -> &MainTable {
        &self.main
    }

    /// Joinable tables in registration order.
    pub fn joins(&self) -> &[JoinTable] {
        &self.joins
    }

    /// Look up a joinable table by name.
    pub fn join(&self, name: &str) -> Option<&JoinTable> {
        self.joins.iter().find(|t| t.name == name)
    }

    pub fn join_index(&self, name: &str) -> Option<usize> {
        self.joins.iter().position(|t| t.name == name)
    }

    /// The column that accepts a granularity and `PERIODO_DIA`.
    pub fn temporal_column(&self) -> &str {
        &self.temporal_column
    }

    /// Which table a column belongs to: the main table first, then joinable
    /// tables in registration order.
    pub fn owner_of(&self, column: &str) -> Option<ColumnOwner> {
        if self.main.columns.contains_any(column) {
            return Some(ColumnOwner::Main);
        }
        self.joins
            .iter()
            .position(|t| t.columns.contains_any(column))
            .map(ColumnOwner::Join)
    }

    /// The alias that qualifies `column` in generated SQL.
    pub fn resolve_alias(&self, column: &str) -> QueryResult<&str> {
        match self.owner_of(column) {
            Some(ColumnOwner::Main) => Ok(&self.main.alias),
            Some(ColumnOwner::Join(idx)) => Ok(&self.joins[idx].alias),
            None => Err(QueryError::UnmappedColumn(column.to_string())),
        }
    }

    /// Whether any table allow-lists `column` for the given request slot.
    pub fn is_allowed(&self, role: ColumnRole, column: &str) -> bool {
        self.main.columns.for_role(role).contains(column)
            || self
                .joins
                .iter()
                .any(|t| t.columns.for_role(role).contains(column))
    }

    /// Union of one allow-list across all tables, sorted.
    pub fn allowed_columns(&self, role: ColumnRole) -> BTreeSet<&str> {
        std::iter::once(&self.main.columns)
            .chain(self.joins.iter().map(|t| &t.columns))
            .flat_map(|lists| lists.for_role(role).iter().map(String::as_str))
            .collect()
    }
}
