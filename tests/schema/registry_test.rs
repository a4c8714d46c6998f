//! Registry construction and validation, from builders and from TOML.

use salesql::error::{ColumnRole, QueryError};
use salesql::schema::{sales_registry, ColumnOwner, SchemaError, SchemaRegistry, TableDef};

/// Helper: a three-table schema with a dependency chain.
fn chain_schema_toml() -> &'static str {
    r#"
temporal_column = "placed_at"

[main]
name = "orders"
alias = "o"
metric_columns = ["amount"]
group_by_columns = ["placed_at", "region"]
filter_columns = ["placed_at", "region", "amount"]

[[joins]]
name = "order_lines"
alias = "ol"
on = "o.id = ol.order_id"
metric_columns = ["qty"]
group_by_columns = ["sku"]
filter_columns = ["sku"]

[[joins]]
name = "skus"
alias = "k"
on = "ol.sku = k.code"
depends_on = "order_lines"
group_by_columns = ["brand"]
filter_columns = ["brand"]
"#
}

#[test]
fn test_from_toml() {
    let registry = SchemaRegistry::from_toml_str(chain_schema_toml()).unwrap();

    assert_eq!(registry.main().name, "orders");
    assert_eq!(registry.temporal_column(), "placed_at");
    assert_eq!(registry.joins().len(), 2);

    let skus = registry.join("skus").unwrap();
    assert_eq!(skus.depends_on.as_deref(), Some("order_lines"));
    assert_eq!(skus.on.left.alias, "ol");
    assert_eq!(skus.on.right.column, "code");

    assert_eq!(registry.resolve_alias("brand").unwrap(), "k");
    assert_eq!(registry.owner_of("qty"), Some(ColumnOwner::Join(0)));
}

#[test]
fn test_toml_syntax_error() {
    let err = SchemaRegistry::from_toml_str("[main\nname = ").unwrap_err();
    assert!(matches!(err, SchemaError::ParseError(_)));
}

#[test]
fn test_missing_file() {
    let err = SchemaRegistry::from_file("/no/such/schema.toml").unwrap_err();
    assert!(matches!(err, SchemaError::ReadError(_)));
}

#[test]
fn test_dependency_cycle_rejected() {
    let err = SchemaRegistry::builder(TableDef::main("a", "a").group_by_columns(["created_at"]))
        .join(TableDef::join("b", "b", "c.x = b.x").depends_on("c"))
        .join(TableDef::join("c", "c", "b.y = c.y").depends_on("b"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::DependencyCycle(_)));
}

#[test]
fn test_unknown_dependency_rejected() {
    let err = SchemaRegistry::builder(TableDef::main("a", "a").group_by_columns(["created_at"]))
        .join(TableDef::join("b", "b", "a.id = b.a_id").depends_on("nowhere"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnknownDependency {
            table: "b".into(),
            dependency: "nowhere".into()
        }
    );
}

#[test]
fn test_join_condition_must_use_visible_aliases() {
    // `k` joins on `ol`, but does not declare a dependency on it.
    let err = SchemaRegistry::builder(TableDef::main("o", "o").group_by_columns(["created_at"]))
        .join(TableDef::join("order_lines", "ol", "o.id = ol.order_id"))
        .join(TableDef::join("skus", "k", "ol.sku = k.code"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::UnjoinedAlias {
            table: "skus".into(),
            alias: "ol".into()
        }
    );
}

#[test]
fn test_join_condition_rejects_raw_sql() {
    let err = SchemaRegistry::builder(TableDef::main("o", "o").group_by_columns(["created_at"]))
        .join(TableDef::join("x", "x", "o.id = x.o_id; DROP TABLE o"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidJoinCondition { .. }));
}

#[test]
fn test_duplicate_alias_rejected() {
    let err = SchemaRegistry::builder(TableDef::main("o", "o").group_by_columns(["created_at"]))
        .join(TableDef::join("other", "o", "o.id = o.x"))
        .build()
        .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateAlias("o".into()));
}

#[test]
fn test_ambiguous_join_columns_rejected() {
    let err = SchemaRegistry::builder(TableDef::main("o", "o").group_by_columns(["created_at"]))
        .join(TableDef::join("a", "a", "o.id = a.o_id").group_by_columns(["label"]))
        .join(TableDef::join("b", "b", "o.id = b.o_id").filter_columns(["label"]))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::AmbiguousColumn {
            column: "label".into(),
            first: "a".into(),
            second: "b".into()
        }
    );
}

#[test]
fn test_main_table_shadows_join_columns() {
    let registry = sales_registry().unwrap();
    // `id` is listed on sales, products and customers; sales owns it.
    assert_eq!(registry.owner_of("id"), Some(ColumnOwner::Main));
    assert!(registry.is_allowed(ColumnRole::Filter, "id"));
}

#[test]
fn test_unknown_temporal_column_rejected() {
    let err = SchemaRegistry::builder(TableDef::main("o", "o").group_by_columns(["region"]))
        .build()
        .unwrap_err();
    assert_eq!(err, SchemaError::UnknownTemporalColumn("created_at".into()));
}

#[test]
fn test_resolve_unmapped() {
    let registry = sales_registry().unwrap();
    assert_eq!(
        registry.resolve_alias("password"),
        Err(QueryError::UnmappedColumn("password".into()))
    );
}

#[test]
fn test_every_allow_listed_column_resolves() {
    let registry = sales_registry().unwrap();
    for role in [ColumnRole::Metric, ColumnRole::Grouping, ColumnRole::Filter] {
        for column in registry.allowed_columns(role) {
            assert!(
                registry.resolve_alias(column).is_ok(),
                "{} column {} should resolve",
                role,
                column
            );
        }
    }
}

#[test]
fn test_demo_schema_file_loads() {
    let registry =
        SchemaRegistry::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/schema.toml"))
            .unwrap();
    assert_eq!(registry.joins().len(), 2);
    assert_eq!(registry.resolve_alias("name").unwrap(), "p");
}
