// Store data types
// Records held in memory and mirrored to the data file

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored timestamps always carry exactly six fractional digits
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Registered student, keyed by `reg`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Student {
    pub reg: String,
    /// Date of birth, used as the student's login credential
    pub dob: String,
    #[serde(with = "micros")]
    pub added_at: NaiveDateTime,
}

/// A student's activity choice, at most one per `reg`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Selection {
    pub reg: String,
    pub nme: String,
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "micros_opt")]
    pub timestamp: Option<NaiveDateTime>,
}

/// Persisted document - serialized to the data file
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Database {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

/// Outcome of a selection upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Replaced,
}

/// Aggregate counts over the current selections
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_students: usize,
    pub total_submitted: usize,
    pub nme_breakdown: BTreeMap<String, usize>,
    pub activity_breakdown: BTreeMap<String, usize>,
}

/// Fixed-width timestamp fields; any ISO fraction is accepted on read
mod micros {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

mod micros_opt {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        time: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => super::micros::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| raw.parse().map_err(serde::de::Error::custom))
            .transpose()
    }
}
