//! Deterministic filter, truncate and sort over the people dataset.
//!
//! The pipeline order is fixed: age filter, name filter, truncation, then sort. Truncating
//! before sorting means a limit selects the first N matches in dataset order and only then
//! orders them by name; it does not select the N alphabetically smallest names.

mod args;

use std::cmp::Ordering;

use crate::domain::person::Person;
use crate::errors::QueryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryDimension {
    Name,
    Age,
}

impl QueryDimension {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "age" => Ok(Self::Age),
            other => Err(QueryError::invalid(format!(
                "unsupported queryType entry `{other}` (expected name|age)"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparator {
    AtMost,
    AtLeast,
}

impl Comparator {
    /// Accepts the declared values and the long-form names older prompts produced.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "at_most" | "less_than_or_equal" => Ok(Self::AtMost),
            "at_least" | "greater_than_or_equal" => Ok(Self::AtLeast),
            _ => Err(QueryError::UnknownComparator(raw.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AtMost => "at_most",
            Self::AtLeast => "at_least",
        }
    }

    pub fn admits(self, age: u32, bound: f64) -> bool {
        let age = f64::from(age);
        match self {
            Self::AtMost => age <= bound,
            Self::AtLeast => age >= bound,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgeFilter {
    pub comparator: Comparator,
    pub value: f64,
}

impl AgeFilter {
    pub fn at_most(value: f64) -> Self {
        Self { comparator: Comparator::AtMost, value }
    }

    pub fn at_least(value: f64) -> Self {
        Self { comparator: Comparator::AtLeast, value }
    }

    fn admits(&self, person: &Person) -> bool {
        self.comparator.admits(person.age, self.value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Alphabetical,
    ReverseAlphabetical,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "alphabetical" => Ok(Self::Alphabetical),
            "reverse_alphabetical" | "reverse-alphabetical" => Ok(Self::ReverseAlphabetical),
            other => Err(QueryError::invalid(format!(
                "unsupported options.sort_by `{other}` (expected alphabetical|reverse_alphabetical)"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alphabetical => "alphabetical",
            Self::ReverseAlphabetical => "reverse_alphabetical",
        }
    }
}

/// A validated search. A filter is present exactly when its dimension is enabled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub name: Option<String>,
    pub age: Option<AgeFilter>,
    pub limit: Option<usize>,
    pub sort: Option<SortOrder>,
}

impl Query {
    pub fn with_name(mut self, needle: impl Into<String>) -> Self {
        self.name = Some(needle.into());
        self
    }

    pub fn with_age(mut self, filter: AgeFilter) -> Self {
        self.age = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    pub fn dimensions(&self) -> Vec<QueryDimension> {
        let mut dimensions = Vec::with_capacity(2);
        if self.name.is_some() {
            dimensions.push(QueryDimension::Name);
        }
        if self.age.is_some() {
            dimensions.push(QueryDimension::Age);
        }
        dimensions
    }
}

/// Runs `query` against `dataset`. An empty result is a successful answer.
pub fn search(dataset: &[Person], query: &Query) -> Vec<Person> {
    let name_needle = query.name.as_deref().map(str::to_lowercase);

    let mut results = dataset
        .iter()
        .filter(|person| query.age.as_ref().map_or(true, |filter| filter.admits(person)))
        .filter(|person| {
            name_needle
                .as_deref()
                .map_or(true, |needle| person.name.to_lowercase().contains(needle))
        })
        .cloned()
        .collect::<Vec<_>>();

    if let Some(limit) = query.limit {
        results.truncate(limit);
    }

    match query.sort {
        Some(SortOrder::Alphabetical) => {
            results.sort_by(|left, right| compare_names(&left.name, &right.name));
        }
        Some(SortOrder::ReverseAlphabetical) => {
            results.sort_by(|left, right| compare_names(&right.name, &left.name));
        }
        None => {}
    }

    results
}

/// Case-insensitive name order with a raw-string tie-break so the order is total.
fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase()).then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::{search, AgeFilter, Comparator, Query, QueryDimension, SortOrder};
    use crate::domain::person::Person;
    use crate::errors::QueryError;

    fn names(people: &[Person]) -> Vec<&str> {
        people.iter().map(|person| person.name.as_str()).collect()
    }

    fn people_fixture() -> Vec<Person> {
        vec![
            Person::new("Bob", 1, "bob@example.com"),
            Person::new("Alice", 2, "alice@example.com"),
            Person::new("Carl", 3, "carl@example.com"),
        ]
    }

    #[test]
    fn truncates_before_sorting() {
        let query = Query::default().with_limit(2).with_sort(SortOrder::Alphabetical);
        let results = search(&people_fixture(), &query);
        assert_eq!(names(&results), vec!["Alice", "Bob"]);
    }

    #[test]
    fn reverse_sort_orders_descending() {
        let query = Query::default().with_sort(SortOrder::ReverseAlphabetical);
        let results = search(&people_fixture(), &query);
        assert_eq!(names(&results), vec!["Carl", "Bob", "Alice"]);
    }

    #[test]
    fn unsorted_query_preserves_dataset_order() {
        let results = search(&people_fixture(), &Query::default());
        assert_eq!(names(&results), vec!["Bob", "Alice", "Carl"]);
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let dataset = vec![
            Person::new("Young", 29, "y@example.com"),
            Person::new("Edge", 30, "e@example.com"),
            Person::new("Older", 31, "o@example.com"),
        ];

        let at_most = search(&dataset, &Query::default().with_age(AgeFilter::at_most(30.0)));
        assert_eq!(names(&at_most), vec!["Young", "Edge"]);

        let at_least = search(&dataset, &Query::default().with_age(AgeFilter::at_least(30.0)));
        assert_eq!(names(&at_least), vec!["Edge", "Older"]);
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let dataset = vec![
            Person::new("Alice", 30, "a@example.com"),
            Person::new("ALICE ", 40, "b@example.com"),
            Person::new("Bob", 50, "c@example.com"),
        ];
        let results = search(&dataset, &Query::default().with_name("ali"));
        assert_eq!(names(&results), vec!["Alice", "ALICE "]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let results = search(&people_fixture(), &Query::default().with_name("zed"));
        assert!(results.is_empty());
    }

    #[test]
    fn sort_ignores_case_and_breaks_ties_on_raw_name() {
        let dataset = vec![
            Person::new("bea", 1, "1@example.com"),
            Person::new("Amy", 2, "2@example.com"),
            Person::new("Bea", 3, "3@example.com"),
        ];
        let results = search(&dataset, &Query::default().with_sort(SortOrder::Alphabetical));
        assert_eq!(names(&results), vec!["Amy", "Bea", "bea"]);
    }

    #[test]
    fn comparator_parse_rejects_unknown_values() {
        assert_eq!(Comparator::parse("at_most"), Ok(Comparator::AtMost));
        assert_eq!(Comparator::parse("greater_than_or_equal"), Ok(Comparator::AtLeast));
        assert_eq!(
            Comparator::parse("between"),
            Err(QueryError::UnknownComparator("between".to_string()))
        );
    }

    #[test]
    fn labels_match_the_values_parse_accepts() {
        for dimension in [QueryDimension::Name, QueryDimension::Age] {
            assert_eq!(QueryDimension::parse(dimension.as_str()), Ok(dimension));
        }
        assert_eq!(Comparator::AtMost.as_str(), "at_most");
        assert_eq!(Comparator::parse(Comparator::AtLeast.as_str()), Ok(Comparator::AtLeast));
        assert_eq!(SortOrder::ReverseAlphabetical.as_str(), "reverse_alphabetical");
        assert_eq!(SortOrder::parse(SortOrder::Alphabetical.as_str()), Ok(SortOrder::Alphabetical));
    }

    #[test]
    fn dimensions_follow_enabled_filters() {
        let query = Query::default().with_name("a").with_age(AgeFilter::at_least(18.0));
        assert_eq!(query.dimensions(), vec![QueryDimension::Name, QueryDimension::Age]);
        assert!(Query::default().dimensions().is_empty());
    }
}
