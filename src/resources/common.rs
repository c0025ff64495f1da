//! Filter types shared across operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paging window of an `All`-style operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Limitation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cursor: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: u32,
}

impl Limitation {
    pub fn new(count: u32) -> Self {
        Self {
            cursor: String::new(),
            count,
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_empty() && self.count == 0
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Interval in UTC. Unset bounds are left out of the body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    #[serde(rename = "StartUtc", default, skip_serializing_if = "Option::is_none")]
    pub start_utc: Option<DateTime<Utc>>,
    #[serde(rename = "EndUtc", default, skip_serializing_if = "Option::is_none")]
    pub end_utc: Option<DateTime<Utc>>,
}

impl TimeInterval {
    pub fn new(start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> Self {
        Self {
            start_utc: Some(start_utc),
            end_utc: Some(end_utc),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_utc.is_none() && self.end_utc.is_none()
    }
}
