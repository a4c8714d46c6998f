//! SELECT / WHERE / ORDER BY builders, rendered through the token layer.

use salesql::error::QueryError;
use salesql::plan::{
    build_order_by, build_select, build_where, FilterOperator, Granularity, DATE_GROUP_ALIAS,
};
use salesql::request::{FilterSpec, GroupBySpec, MetricSpec};
use salesql::schema::sales_registry;
use salesql::sql::{Dialect, ParamValue, RenderedSql};
use salesql::validate::AggregateFunction;

fn render_where(filters: &[FilterSpec]) -> RenderedSql {
    let registry = sales_registry().unwrap();
    build_where(&registry, filters)
        .unwrap()
        .to_tokens()
        .render(Dialect::Postgres)
}

fn select_sql(group_by: &[GroupBySpec], metric: MetricSpec) -> Vec<String> {
    let registry = sales_registry().unwrap();
    let function = AggregateFunction::parse(&metric.func).unwrap();
    build_select(&registry, group_by, &metric, function)
        .unwrap()
        .items
        .iter()
        .map(|item| {
            item.to_tokens_for_dialect(Dialect::Postgres)
                .serialize(Dialect::Postgres)
        })
        .collect()
}

// ============================================================================
// SELECT / GROUP BY
// ============================================================================

#[test]
fn test_metric_is_last_select_item() {
    let items = select_sql(
        &[GroupBySpec::column("neighborhood")],
        MetricSpec::new("avg", "delivery_seconds"),
    );
    assert_eq!(
        items,
        vec![
            r#""da"."neighborhood""#.to_string(),
            r#"AVG("s"."delivery_seconds") AS "metric_result""#.to_string(),
        ]
    );
}

#[test]
fn test_count_distinct_metric() {
    let items = select_sql(&[], MetricSpec::new("COUNT DISTINCT", "customer_id"));
    assert_eq!(
        items,
        vec![r#"COUNT(DISTINCT "s"."customer_id") AS "metric_result""#.to_string()]
    );
}

#[test]
fn test_day_of_week_grouping() {
    let items = select_sql(
        &[GroupBySpec::truncated("created_at", "day_of_week")],
        MetricSpec::new("SUM", "total_amount"),
    );
    assert_eq!(
        items[0],
        r#"EXTRACT(DOW FROM "s"."created_at") AS "date_group_field""#
    );
}

#[test]
fn test_every_granularity_accepted_on_temporal_column() {
    let registry = sales_registry().unwrap();
    for granularity in Granularity::ALL {
        let clause = build_select(
            &registry,
            &[GroupBySpec::truncated("created_at", granularity.as_str())],
            &MetricSpec::new("SUM", "total_amount"),
            AggregateFunction::Sum,
        )
        .unwrap();
        assert_eq!(clause.order_fields, vec![DATE_GROUP_ALIAS]);
    }
}

#[test]
fn test_granularity_rejected_on_every_other_grouping_column() {
    let registry = sales_registry().unwrap();
    for column in ["store_id", "product_id", "name", "city", "email"] {
        let err = build_select(
            &registry,
            &[GroupBySpec::truncated(column, "day")],
            &MetricSpec::new("SUM", "total_amount"),
            AggregateFunction::Sum,
        )
        .unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidGranularityColumn { .. }),
            "{} accepted a granularity",
            column
        );
    }
}

// ============================================================================
// WHERE
// ============================================================================

#[test]
fn test_where_and_order_preserved() {
    let rendered = render_where(&[
        FilterSpec::new("created_at", "BETWEEN", vec!["2024-01-01", "2024-02-01"]),
        FilterSpec::new("city", "ILIKE", ParamValue::from("%rio%")),
        FilterSpec::new("store_id", "<>", ParamValue::Int(4)),
    ]);

    assert_eq!(
        rendered.sql,
        r#""s"."created_at" BETWEEN $1 AND $2 AND "da"."city" ILIKE $3 AND "s"."store_id" <> $4"#
    );
    assert_eq!(
        rendered.params,
        vec![
            ParamValue::from("2024-01-01"),
            ParamValue::from("2024-02-01"),
            ParamValue::from("%rio%"),
            ParamValue::Int(4),
        ]
    );
}

#[test]
fn test_in_list_any_length() {
    for n in 0..6i64 {
        let values: Vec<i64> = (0..n).collect();
        let rendered = render_where(&[FilterSpec::new("product_id", "NOT IN", values.clone())]);
        assert_eq!(rendered.params.len(), n as usize);
        assert_eq!(rendered.sql.matches('$').count(), n as usize);
        if n == 0 {
            assert_eq!(rendered.sql.to_lowercase(), "true");
        }
    }
}

#[test]
fn test_value_is_never_in_sql_text() {
    let hostile = "x'; DROP TABLE sales; --";
    let rendered = render_where(&[FilterSpec::new("customer_name", "=", ParamValue::from(hostile))]);
    assert!(!rendered.sql.contains("DROP"));
    assert_eq!(rendered.params, vec![ParamValue::from(hostile)]);
}

#[test]
fn test_periodo_dia_arity() {
    let registry = sales_registry().unwrap();
    for value in [vec![8], vec![8, 12, 18]] {
        let err = build_where(
            &registry,
            &[FilterSpec::new("created_at", "PERIODO_DIA", value)],
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperatorArity { .. }));
    }
}

#[test]
fn test_all_operators_parse() {
    for op in FilterOperator::ALL {
        assert_eq!(FilterOperator::parse(op.as_str()), Some(op));
        assert_eq!(FilterOperator::parse(&op.as_str().to_lowercase()), Some(op));
    }
}

// ============================================================================
// ORDER BY
// ============================================================================

#[test]
fn test_order_by_plain_grouping_column() {
    let registry = sales_registry().unwrap();
    let select = build_select(
        &registry,
        &[GroupBySpec::column("city")],
        &MetricSpec::new("COUNT", "id"),
        AggregateFunction::Count,
    )
    .unwrap();

    let order = build_order_by(Some("city DESC"), &select).unwrap();
    assert_eq!(
        order
            .to_tokens_for_dialect(Dialect::Postgres)
            .serialize(Dialect::Postgres),
        r#""city" DESC"#
    );

    let order = build_order_by(Some(DATE_GROUP_ALIAS), &select).unwrap();
    assert_eq!(
        order
            .to_tokens_for_dialect(Dialect::Postgres)
            .serialize(Dialect::Postgres),
        r#""date_group_field" DESC"#
    );

    let err = build_order_by(Some("created_at"), &select).unwrap_err();
    assert!(matches!(err, QueryError::InvalidOrderByColumn { .. }));
}
