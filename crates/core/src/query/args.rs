use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::QueryError;
use crate::query::{AgeFilter, Comparator, Query, QueryDimension, SortOrder};

/// Wire shape of the `search_dataset` arguments. Per-dimension fields stay raw until the
/// dimension is known to be enabled, so values for disabled dimensions are never inspected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArguments {
    query_type: Vec<String>,
    #[serde(default)]
    name_query: Value,
    #[serde(default)]
    age_query: Value,
    #[serde(default)]
    options: Value,
}

#[derive(Debug, Deserialize)]
struct RawAgeQuery {
    #[serde(alias = "type")]
    comparator: String,
    value: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawOptions {
    #[serde(default)]
    num_results: Option<f64>,
    #[serde(default)]
    sort_by: Option<String>,
}

impl Query {
    /// Validates repaired tool arguments into a [`Query`].
    pub fn from_arguments(arguments: &Value) -> Result<Self, QueryError> {
        let raw = RawArguments::deserialize(arguments)
            .map_err(|error| QueryError::invalid(error.to_string()))?;

        let dimensions = raw
            .query_type
            .iter()
            .map(|entry| QueryDimension::parse(entry))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let name = if dimensions.contains(&QueryDimension::Name) {
            Some(parse_name_query(&raw.name_query)?)
        } else {
            None
        };

        let age = if dimensions.contains(&QueryDimension::Age) {
            Some(parse_age_query(&raw.age_query)?)
        } else {
            None
        };

        let options = match &raw.options {
            Value::Null => RawOptions::default(),
            value => RawOptions::deserialize(value)
                .map_err(|error| QueryError::invalid(format!("options: {error}")))?,
        };

        let limit = options.num_results.map(parse_limit).transpose()?;
        let sort = options.sort_by.as_deref().map(SortOrder::parse).transpose()?;

        Ok(Self { name, age, limit, sort })
    }
}

fn parse_name_query(value: &Value) -> Result<String, QueryError> {
    match value {
        Value::String(needle) => Ok(needle.clone()),
        Value::Null => {
            Err(QueryError::invalid("nameQuery is required when queryType includes name"))
        }
        other => Err(QueryError::invalid(format!("nameQuery must be a string, got {other}"))),
    }
}

fn parse_age_query(value: &Value) -> Result<AgeFilter, QueryError> {
    if value.is_null() {
        return Err(QueryError::invalid("ageQuery is required when queryType includes age"));
    }

    let raw = RawAgeQuery::deserialize(value)
        .map_err(|error| QueryError::invalid(format!("ageQuery: {error}")))?;
    let comparator = Comparator::parse(&raw.comparator)?;
    if !raw.value.is_finite() {
        return Err(QueryError::invalid("ageQuery.value must be a finite number"));
    }

    Ok(AgeFilter { comparator, value: raw.value })
}

fn parse_limit(value: f64) -> Result<usize, QueryError> {
    if value.fract() != 0.0 || value < 1.0 || value > usize::MAX as f64 {
        return Err(QueryError::invalid(format!(
            "options.num_results must be a positive integer, got {value}"
        )));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::errors::QueryError;
    use crate::query::{AgeFilter, Comparator, Query, SortOrder};

    #[test]
    fn parses_full_argument_set() {
        let query = Query::from_arguments(&json!({
            "queryType": ["name", "age"],
            "nameQuery": "an",
            "ageQuery": { "comparator": "at_least", "value": 21 },
            "options": { "num_results": 3, "sort_by": "reverse_alphabetical" }
        }))
        .expect("arguments should validate");

        assert_eq!(query.name.as_deref(), Some("an"));
        assert_eq!(query.age, Some(AgeFilter { comparator: Comparator::AtLeast, value: 21.0 }));
        assert_eq!(query.limit, Some(3));
        assert_eq!(query.sort, Some(SortOrder::ReverseAlphabetical));
    }

    #[test]
    fn accepts_legacy_age_query_shape() {
        let query = Query::from_arguments(&json!({
            "queryType": ["age"],
            "nameQuery": null,
            "ageQuery": { "type": "less_than_or_equal", "value": 30 },
            "options": { "num_results": null, "sort_by": "reverse-alphabetical" }
        }))
        .expect("legacy shape should validate");

        assert_eq!(query.age, Some(AgeFilter::at_most(30.0)));
        assert_eq!(query.sort, Some(SortOrder::ReverseAlphabetical));
    }

    #[test]
    fn disabled_dimensions_are_not_inspected() {
        let query = Query::from_arguments(&json!({
            "queryType": [],
            "nameQuery": 42,
            "ageQuery": { "comparator": "sideways" },
        }))
        .expect("fields for disabled dimensions are ignored");

        assert_eq!(query, Query::default());
    }

    #[test]
    fn enabled_dimension_requires_its_field() {
        let error = Query::from_arguments(&json!({
            "queryType": ["name"],
            "nameQuery": null,
            "ageQuery": null,
            "options": { "num_results": null, "sort_by": null }
        }))
        .expect_err("missing nameQuery should be rejected");

        assert!(matches!(error, QueryError::InvalidArguments(ref message) if message.contains("nameQuery")));
    }

    #[test]
    fn unknown_comparator_is_reported_distinctly() {
        let error = Query::from_arguments(&json!({
            "queryType": ["age"],
            "ageQuery": { "comparator": "around", "value": 40 }
        }))
        .expect_err("unknown comparator should fail");

        assert_eq!(error, QueryError::UnknownComparator("around".to_string()));
    }

    #[test]
    fn rejects_unknown_query_type_and_bad_limits() {
        let unknown_dimension = Query::from_arguments(&json!({ "queryType": ["email"] }));
        assert!(matches!(unknown_dimension, Err(QueryError::InvalidArguments(_))));

        for limit in [json!(0), json!(-2), json!(2.5)] {
            let result = Query::from_arguments(&json!({
                "queryType": [],
                "options": { "num_results": limit, "sort_by": null }
            }));
            assert!(matches!(result, Err(QueryError::InvalidArguments(_))), "limit {limit}");
        }
    }

    #[test]
    fn missing_query_type_is_rejected() {
        let result = Query::from_arguments(&json!({ "nameQuery": "al" }));
        assert!(matches!(result, Err(QueryError::InvalidArguments(ref message)) if message.contains("queryType")));
    }
}
