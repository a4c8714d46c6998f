//! Normalization of wire-format requests into canonical specs.

use salesql::error::QueryError;
use salesql::request::{
    normalize_filter, normalize_group_by, normalize_metric, FilterInput, FilterSpec, FilterValue,
    GroupByInput, GroupBySpec, MetricInput, MetricSpec, RawRequest,
};
use salesql::sql::ParamValue;
use serde_json::json;

#[test]
fn test_full_request() {
    let raw = RawRequest::from_json_str(
        r#"{
            "metric": {"func": "count distinct", "column": "customer_id"},
            "group_by": ["store_id", {"column": "created_at", "granularity": "week"}],
            "filters": [
                {"column": "channel_id", "op": "IN", "value": [1, 2]},
                {"column": "total_amount", "op": ">=", "value": 19.5},
                {"column": "customer_id", "op": "IS NOT NULL"}
            ],
            "order_by": "date_group_field DESC",
            "limit": 20
        }"#,
    )
    .unwrap();

    let request = raw.normalize().unwrap();

    assert_eq!(request.metric, MetricSpec::new("count distinct", "customer_id"));
    assert_eq!(
        request.group_by,
        vec![
            GroupBySpec::column("store_id"),
            GroupBySpec::truncated("created_at", "week"),
        ]
    );
    assert_eq!(request.filters.len(), 3);
    assert_eq!(
        request.filters[0].value,
        FilterValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)])
    );
    assert_eq!(
        request.filters[1].value,
        FilterValue::Scalar(ParamValue::Float(19.5))
    );
    assert_eq!(request.filters[2], FilterSpec::unary("customer_id", "IS NOT NULL"));
    assert_eq!(request.order_by.as_deref(), Some("date_group_field DESC"));
    assert_eq!(request.limit, Some(20));
}

#[test]
fn test_optional_sections_default() {
    let raw =
        RawRequest::from_json_str(r#"{"metric": {"func": "SUM", "column": "total_amount"}}"#)
            .unwrap();
    let request = raw.normalize().unwrap();

    assert!(request.group_by.is_empty());
    assert!(request.filters.is_empty());
    assert_eq!(request.order_by, None);
    assert_eq!(request.limit, None);
}

#[test]
fn test_typed_specs_pass_through() {
    let metric = MetricSpec::new("AVG", "delivery_seconds");
    assert_eq!(
        normalize_metric(MetricInput::Spec(metric.clone())).unwrap(),
        metric
    );

    let group = GroupBySpec::truncated("created_at", "hour");
    assert_eq!(
        normalize_group_by(GroupByInput::Spec(group.clone())).unwrap(),
        group
    );

    let filter = FilterSpec::new("city", "ILIKE", ParamValue::from("%paulo%"));
    assert_eq!(
        normalize_filter(FilterInput::Spec(filter.clone())).unwrap(),
        filter
    );
}

#[test]
fn test_metric_as_string_rejected() {
    let err = normalize_metric(MetricInput::Json(json!("SUM(total_amount)"))).unwrap_err();
    assert_eq!(
        err,
        QueryError::InvalidInputShape {
            kind: "metric",
            entry: "\"SUM(total_amount)\"".into()
        }
    );
}

#[test]
fn test_group_by_number_rejected() {
    let err = normalize_group_by(GroupByInput::Json(json!(42))).unwrap_err();
    assert!(matches!(
        err,
        QueryError::InvalidInputShape {
            kind: "group_by",
            ..
        }
    ));
}

#[test]
fn test_group_by_non_string_granularity_rejected() {
    let err = normalize_group_by(json!({"column": "created_at", "granularity": 7}).into())
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidInputShape { .. }));
}

#[test]
fn test_filter_object_value_rejected() {
    let err = normalize_filter(
        json!({"column": "store_id", "op": "=", "value": {"$gt": 1}}).into(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        QueryError::InvalidInputShape { kind: "filter", .. }
    ));
}

#[test]
fn test_filter_missing_op_rejected() {
    let err = normalize_filter(json!({"column": "store_id", "value": 1}).into()).unwrap_err();
    assert!(matches!(err, QueryError::InvalidInputShape { .. }));
}

#[test]
fn test_first_bad_entry_fails_whole_request() {
    let raw = RawRequest::from_json_str(
        r#"{
            "metric": {"func": "SUM", "column": "total_amount"},
            "filters": [
                {"column": "store_id", "op": "=", "value": 1},
                ["store_id", "=", 1]
            ]
        }"#,
    )
    .unwrap();

    let err = raw.normalize().unwrap_err();
    assert_eq!(
        err,
        QueryError::InvalidInputShape {
            kind: "filter",
            entry: r#"["store_id","=",1]"#.into()
        }
    );
}

#[test]
fn test_missing_metric_is_a_decode_error() {
    assert!(RawRequest::from_json_str(r#"{"group_by": ["store_id"]}"#).is_err());
}
