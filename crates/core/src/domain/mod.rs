pub mod dataset;
pub mod person;
