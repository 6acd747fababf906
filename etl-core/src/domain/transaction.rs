//! Retail transaction domain types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column order used when loading into the destination table
pub const RETAIL_TRANSACTION_COLUMNS: [&str; 8] = [
    "id",
    "customer_id",
    "last_status",
    "pos_origin",
    "pos_destination",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// A retail transaction row
///
/// Read from the source database and loaded as-is into the destination,
/// where the latest `updated_at` wins on merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailTransaction {
    pub id: i64,
    pub customer_id: i64,
    pub last_status: String,
    pub pos_origin: String,
    pub pos_destination: String,
    #[serde(with = "datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "datetime")]
    pub updated_at: NaiveDateTime,
    #[serde(with = "optional_datetime")]
    pub deleted_at: Option<NaiveDateTime>,
}

/// `DateTime` text format accepted by ClickHouse without extra settings
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

mod datetime {
    use super::DATETIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(DATETIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod optional_datetime {
    use super::DATETIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.format(DATETIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
