//! The built-in restaurant sales schema.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::registry::{SchemaDef, SchemaError, SchemaRegistry, TableDef};

static SALES: Lazy<Result<Arc<SchemaRegistry>, SchemaError>> =
    Lazy::new(|| sales_schema().build().map(Arc::new));

/// Shared handle to the built-in sales registry, built on first use.
pub fn sales_registry() -> Result<Arc<SchemaRegistry>, SchemaError> {
    (*SALES).clone()
}

/// The sales schema definition, for callers that want to extend it.
pub fn sales_schema() -> SchemaDef {
    SchemaRegistry::builder(
        TableDef::main("sales", "s")
            .metric_columns([
                "total_amount",
                "people_quantity",
                "id",
                "delivery_seconds",
                "total_discount",
                "service_tax_fee",
            ])
            .group_by_columns([
                "channel_id",
                "store_id",
                "customer_id",
                "sale_status_desc",
                "created_at",
            ])
            .filter_columns([
                "channel_id",
                "store_id",
                "customer_id",
                "sale_status_desc",
                "created_at",
                "total_amount",
                "people_quantity",
                "id",
                "delivery_seconds",
            ]),
    )
    .join(
        TableDef::join("product_sales", "ps", "s.id = ps.sale_id")
            .metric_columns(["quantity", "total_price"])
            .group_by_columns(["product_id"])
            .filter_columns(["product_id"]),
    )
    .join(
        TableDef::join("products", "p", "ps.product_id = p.id")
            .depends_on("product_sales")
            .group_by_columns(["name", "category_id"])
            .filter_columns(["name", "category_id", "id"]),
    )
    .join(
        TableDef::join("delivery_addresses", "da", "s.id = da.sale_id")
            .group_by_columns(["neighborhood", "city", "state"])
            .filter_columns(["neighborhood", "city", "state"]),
    )
    .join(
        TableDef::join("customers", "c", "s.customer_id = c.id")
            .group_by_columns(["customer_name", "email"])
            .filter_columns(["customer_name", "email", "id"]),
    )
    .temporal_column("created_at")
}
