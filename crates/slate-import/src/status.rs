use crate::error::ImportError;
use serde::{Serialize, Serializer};
use slate_core::Clip;
use std::collections::VecDeque;
use time::OffsetDateTime;

/// Progress of an import. While `active` it is a live view of the copy
/// loop; afterwards it is the frozen outcome of the last batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatus {
    pub active: bool,
    pub bytes_copied: u64,
    pub bytes_total: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub eta: OffsetDateTime,
    /// Clips not yet attempted, in import order.
    pub pending: VecDeque<Clip>,
    /// One entry per attempted clip, in import order.
    pub results: Vec<ImportResult>,
}

impl Default for ImportStatus {
    fn default() -> Self {
        Self {
            active: false,
            bytes_copied: 0,
            bytes_total: 0,
            start: OffsetDateTime::UNIX_EPOCH,
            eta: OffsetDateTime::UNIX_EPOCH,
            pending: VecDeque::new(),
            results: Vec::new(),
        }
    }
}

impl ImportStatus {
    pub fn succeeded(&self) -> impl Iterator<Item = &ImportResult> {
        self.results.iter().filter(|r| r.error.is_none())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ImportResult> {
        self.results.iter().filter(|r| r.error.is_some())
    }
}

/// Outcome of one clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResult {
    pub clip: Clip,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "error_string"
    )]
    pub error: Option<ImportError>,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

fn error_string<S: Serializer>(err: &Option<ImportError>, s: S) -> Result<S::Ok, S::Error> {
    match err {
        Some(e) => s.collect_str(e),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> Clip {
        Clip {
            name: "a.mov".into(),
            paths: vec!["a.mov".into()],
            total_size: 3,
        }
    }

    #[test]
    fn status_wire_shape() {
        let st = ImportStatus {
            active: true,
            bytes_copied: 1,
            bytes_total: 3,
            pending: VecDeque::from(vec![clip()]),
            ..Default::default()
        };
        let json = serde_json::to_value(&st).unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["bytesCopied"], 1);
        assert_eq!(json["bytesTotal"], 3);
        assert_eq!(json["start"], "1970-01-01T00:00:00Z");
        assert_eq!(json["eta"], "1970-01-01T00:00:00Z");
        assert_eq!(json["pending"][0]["totalSize"], 3);
        assert_eq!(json["results"], serde_json::json!([]));
    }

    #[test]
    fn result_error_is_omitted_when_absent() {
        let ok = ImportResult {
            clip: clip(),
            error: None,
            start: OffsetDateTime::UNIX_EPOCH,
            end: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["clip"]["name"], "a.mov");

        let failed = ImportResult {
            error: Some(ImportError::BadSubdir),
            ..ok
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "invalid import subdirectory");
    }
}
