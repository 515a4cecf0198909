use roster_core::{repair, search, AgeFilter, Dataset, Person, Query, QueryError, SortOrder};
use serde_json::json;

fn roster() -> Dataset {
    Dataset::from_json(
        r#"{"data": [
            {"name": "Marta Ruiz", "age": 34, "email": "marta@example.com"},
            {"name": "ALICE ", "age": 30, "email": "alice.upper@example.com"},
            {"name": "Owen Park", "age": 19, "email": "owen@example.com"},
            {"name": "alice b", "age": 52, "email": "alice.b@example.com"},
            {"name": "Zed", "age": 30, "email": "zed@example.com"}
        ]}"#,
    )
    .expect("fixture should parse")
}

fn queries() -> Vec<Query> {
    vec![
        Query::default(),
        Query::default().with_name("ali"),
        Query::default().with_age(AgeFilter::at_most(30.0)).with_sort(SortOrder::Alphabetical),
        Query::default().with_age(AgeFilter::at_least(30.0)).with_limit(2),
        Query::default()
            .with_name("a")
            .with_age(AgeFilter::at_least(20.0))
            .with_limit(3)
            .with_sort(SortOrder::ReverseAlphabetical),
    ]
}

#[test]
fn searching_twice_changes_nothing() {
    let dataset = roster();
    for query in queries() {
        let once = search(&dataset, &query);
        let twice = search(&once, &query);
        assert_eq!(once, twice, "query {query:?}");
    }
}

#[test]
fn results_are_a_subset_of_the_dataset() {
    let dataset = roster();
    for query in queries() {
        for person in search(&dataset, &query) {
            assert!(dataset.contains(&person), "{person:?} was invented by {query:?}");
        }
    }
}

#[test]
fn age_query_is_ignored_when_age_is_not_requested() {
    let dataset = roster();
    let with_age_payload = Query::from_arguments(&json!({
        "queryType": ["name"],
        "nameQuery": "alice",
        "ageQuery": { "comparator": "at_least", "value": 99 },
        "options": { "num_results": null, "sort_by": null }
    }))
    .expect("arguments should validate");
    let without = Query::default().with_name("alice");

    assert_eq!(search(&dataset, &with_age_payload), search(&dataset, &without));
}

#[test]
fn model_output_flows_from_repair_to_records() {
    let raw = "Sure! Here you go:\n```json\n{'queryType': ['age'], 'nameQuery': None, \
               'ageQuery': {'comparator': 'at_most', 'value': 30}, \
               'options': {'num_results': None, 'sort_by': 'alphabetical'},}\n```";

    let arguments = repair(raw).expect("fenced output should repair");
    let query = Query::from_arguments(&arguments).expect("repaired arguments should validate");
    let names = search(&roster(), &query).into_iter().map(|person| person.name).collect::<Vec<_>>();

    assert_eq!(names, vec!["ALICE ", "Owen Park", "Zed"]);
}

#[test]
fn truncation_happens_before_sorting() {
    let dataset = Dataset::new(vec![
        Person::new("Bob", 1, "bob@example.com"),
        Person::new("Alice", 2, "alice@example.com"),
        Person::new("Carl", 3, "carl@example.com"),
    ]);
    let query = Query::from_arguments(&json!({
        "queryType": [],
        "nameQuery": null,
        "ageQuery": null,
        "options": { "num_results": 2, "sort_by": "alphabetical" }
    }))
    .expect("arguments should validate");

    let names = search(&dataset, &query).into_iter().map(|person| person.name).collect::<Vec<_>>();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

#[test]
fn unknown_comparator_never_reaches_the_engine() {
    let result = Query::from_arguments(&json!({
        "queryType": ["age"],
        "ageQuery": { "comparator": "between", "value": 30 }
    }));
    assert_eq!(result, Err(QueryError::UnknownComparator("between".to_string())));
}
