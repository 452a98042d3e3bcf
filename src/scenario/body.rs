//! Response body shapes
//!
//! Bodies are parsed once into a [`ResponseBody`]; deep equality is only
//! evaluated on a successfully parsed variant, so malformed text can never
//! match an expectation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a successful login, `{"status": "authorized"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginBody {
    pub status: String,
}

impl LoginBody {
    pub fn authorized() -> Self {
        Self {
            status: "authorized".to_string(),
        }
    }
}

/// Body of the cars listing, an ordered array of names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarsBody(pub Vec<String>);

/// The golden cars listing, order included
pub const EXPECTED_CARS: [&str; 4] = ["Ford Fiesta", "BMW X5", "Porsche 911", "Lamborghini"];

impl CarsBody {
    pub fn expected() -> Self {
        Self(EXPECTED_CARS.iter().map(|car| car.to_string()).collect())
    }
}

/// What a validated response must contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedBody {
    Login(LoginBody),
    Cars(CarsBody),
}

/// A response body after the fallible parse step
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Login(LoginBody),
    Cars(CarsBody),
    /// Valid JSON of some other shape
    Other(Value),
    /// Not JSON at all, with the parser's message
    Malformed(String),
}

impl ResponseBody {
    pub fn parse(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => return Self::Malformed(e.to_string()),
        };

        // Derived structs also accept a JSON array of their fields
        if value.is_object() {
            if let Ok(login) = serde_json::from_value::<LoginBody>(value.clone()) {
                return Self::Login(login);
            }
        }
        if value.is_array() {
            if let Ok(cars) = serde_json::from_value::<CarsBody>(value.clone()) {
                return Self::Cars(cars);
            }
        }
        Self::Other(value)
    }

    /// Structural equality with an expected body
    pub fn matches(&self, expected: &ExpectedBody) -> bool {
        match (self, expected) {
            (Self::Login(actual), ExpectedBody::Login(expected)) => actual == expected,
            (Self::Cars(actual), ExpectedBody::Cars(expected)) => actual == expected,
            _ => false,
        }
    }
}
