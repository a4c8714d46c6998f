//! Join resolution over the reference schema and over deeper dependency chains.

use salesql::error::QueryError;
use salesql::plan::{resolve_joins, JoinResolver};
use salesql::schema::{sales_registry, JoinTable, SchemaRegistry, TableDef};

fn names(joins: &[&JoinTable]) -> Vec<String> {
    joins.iter().map(|t| t.name.clone()).collect()
}

/// Helper: a four-level chain `d -> c -> b -> a(main)` plus an independent `x`.
fn deep_registry() -> SchemaRegistry {
    SchemaRegistry::builder(
        TableDef::main("a", "a")
            .metric_columns(["amount"])
            .group_by_columns(["created_at"]),
    )
    .join(TableDef::join("x", "x", "a.id = x.a_id").group_by_columns(["x_label"]))
    .join(
        TableDef::join("d", "d", "c.id = d.c_id")
            .depends_on("c")
            .group_by_columns(["d_label"]),
    )
    .join(TableDef::join("b", "b", "a.id = b.a_id").group_by_columns(["b_label"]))
    .join(
        TableDef::join("c", "c", "b.id = c.b_id")
            .depends_on("b")
            .group_by_columns(["c_label"]),
    )
    .build()
    .unwrap()
}

#[test]
fn test_scenario_b_joins_only_product_sales() {
    let registry = sales_registry().unwrap();
    let joins = resolve_joins(&registry, &["id", "product_id"]).unwrap();
    assert_eq!(names(&joins), vec!["product_sales"]);
}

#[test]
fn test_scenario_c_dependency_first() {
    let registry = sales_registry().unwrap();
    let joins = resolve_joins(&registry, &["total_amount", "name"]).unwrap();
    assert_eq!(names(&joins), vec!["product_sales", "products"]);
}

#[test]
fn test_deep_chain_resolved_transitively() {
    let registry = deep_registry();
    let joins = JoinResolver::new(&registry).resolve(&["d_label"]).unwrap();
    assert_eq!(names(&joins), vec!["b", "c", "d"]);
}

#[test]
fn test_deep_chain_with_shared_ancestor() {
    let registry = deep_registry();
    let joins = resolve_joins(&registry, &["c_label", "x_label", "d_label", "b_label"]).unwrap();
    assert_eq!(names(&joins), vec!["x", "b", "c", "d"]);
}

#[test]
fn test_dependency_never_after_dependent() {
    let registry = deep_registry();
    let joins = resolve_joins(&registry, &["d_label", "c_label"]).unwrap();
    let position = |name: &str| joins.iter().position(|t| t.name == name).unwrap();
    assert!(position("b") < position("c"));
    assert!(position("c") < position("d"));
}

#[test]
fn test_every_join_table_reachable() {
    let registry = sales_registry().unwrap();
    for (column, expected) in [
        ("quantity", vec!["product_sales"]),
        ("category_id", vec!["product_sales", "products"]),
        ("neighborhood", vec!["delivery_addresses"]),
        ("customer_name", vec!["customers"]),
    ] {
        let joins = resolve_joins(&registry, &[column]).unwrap();
        assert_eq!(names(&joins), expected, "joins for {}", column);
    }
}

#[test]
fn test_unmapped_column_is_error() {
    let registry = sales_registry().unwrap();
    let err = resolve_joins(&registry, &["store_id", "ssn"]).unwrap_err();
    assert_eq!(err, QueryError::UnmappedColumn("ssn".into()));
}
