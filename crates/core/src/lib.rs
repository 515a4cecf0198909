//! Deterministic core of roster: the people dataset, the query engine that filters,
//! truncates and sorts it, the repair step that turns model-emitted text into JSON, and
//! layered application configuration.

pub mod config;
pub mod domain;
pub mod errors;
pub mod query;
pub mod repair;

pub use domain::dataset::{Dataset, DatasetError};
pub use domain::person::Person;
pub use errors::{QueryError, RepairError};
pub use query::{search, AgeFilter, Comparator, Query, QueryDimension, SortOrder};
pub use repair::repair;
