//! Column encoding shared by the repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(table: &'static str, s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(table, format!("bad timestamp {}: {}", s, e)))
}

pub(crate) fn parse_uuid(table: &'static str, s: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| StoreError::corrupt(table, format!("bad id {}: {}", s, e)))
}
