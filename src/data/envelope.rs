//! Response-unwrapping adapter.
//!
//! The statistics API is inconsistent about where the payload lives: a bare
//! array, `{ data: [...] }`, `{ data: { dailyStatistics: [...] } }` or
//! `{ dailyStatistics: [...] }`. Everything is collapsed here so callers only
//! ever see a flat record list.

use serde::Deserialize;

use crate::data::fetcher::FetchError;
use crate::domain::{DatedRecord, Group};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeriesBody {
    Bare(Vec<DatedRecord>),
    Daily {
        #[serde(rename = "dailyStatistics")]
        daily_statistics: Vec<DatedRecord>,
    },
    Wrapped {
        data: Option<Box<SeriesBody>>,
    },
}

impl SeriesBody {
    fn into_records(self) -> Vec<DatedRecord> {
        match self {
            SeriesBody::Bare(records) => records,
            SeriesBody::Daily { daily_statistics } => daily_statistics,
            SeriesBody::Wrapped { data } => data.map(|b| b.into_records()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupsBody {
    Bare(Vec<Group>),
    Wrapped { data: Option<Box<GroupsBody>> },
}

impl GroupsBody {
    fn into_groups(self) -> Vec<Group> {
        match self {
            GroupsBody::Bare(groups) => groups,
            GroupsBody::Wrapped { data } => data.map(|b| b.into_groups()).unwrap_or_default(),
        }
    }
}

/// Decode a series response body, whatever envelope it came in.
pub fn unwrap_series(body: &[u8]) -> Result<Vec<DatedRecord>, FetchError> {
    let parsed: SeriesBody = serde_json::from_slice(body)?;
    Ok(parsed.into_records())
}

/// Decode a group-listing response body.
pub fn unwrap_groups(body: &[u8]) -> Result<Vec<Group>, FetchError> {
    let parsed: GroupsBody = serde_json::from_slice(body)?;
    Ok(parsed.into_groups())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_observed_envelope() {
        let bodies = [
            r#"[{"date":"2024-01-01","value":1}]"#,
            r#"{"data":[{"date":"2024-01-01","value":1}]}"#,
            r#"{"data":{"dailyStatistics":[{"date":"2024-01-01","value":1}]}}"#,
            r#"{"dailyStatistics":[{"date":"2024-01-01","value":1}]}"#,
            r#"{"data":{"data":[{"date":"2024-01-01","value":1}]}}"#,
        ];
        for body in bodies {
            let records = unwrap_series(body.as_bytes()).unwrap();
            assert_eq!(records.len(), 1, "body: {body}");
            assert_eq!(records[0].value("value"), Some(1.0));
        }
    }

    #[test]
    fn null_or_missing_payload_is_empty() {
        assert!(unwrap_series(br#"{"data":null}"#).unwrap().is_empty());
        assert!(unwrap_series(br#"{"message":"no data"}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = unwrap_series(b"<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn groups_accept_both_field_spellings() {
        let body = r#"{"data":[
            {"id":1,"name":"Lote 1","productionType":"estanque"},
            {"id":2,"name":"Lote 2","production_type":"descarte"}
        ]}"#;
        let groups = unwrap_groups(body.as_bytes()).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].production_type, "estanque");
        assert_eq!(groups[1].production_type, "descarte");
    }
}
