use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub email: String,
}

impl Person {
    pub fn new(name: impl Into<String>, age: u32, email: impl Into<String>) -> Self {
        Self { name: name.into(), age, email: email.into() }
    }
}
