//! Shots publication use case.
//!
//! `publish` validates the request, serializes the payload canonically,
//! uploads it with bounded retry and upserts the index row, in that order.
//!
//! Upload and index are not atomic. If the index upsert fails after a
//! successful upload the object stays in the bucket without an index row and
//! the error is returned to the caller; nothing is rolled back. A later
//! publish of the same match overwrites both.

use crate::config::PublisherConfig;
use crate::model::{MatchIndexRecord, PublicationRequest, PublishResult, ShotsPayload};
use crate::ports::{Clock, IndexError, MatchesIndexRepository, ShotsStorage, StorageError, SystemClock};
use crate::canonical::to_canonical_vec;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

pub const DEFAULT_BUCKET: &str = "shots";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Client-caused rejections; never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El identificador del partido está vacío")]
    EmptyMatchId,

    #[error("El identificador del partido no coincide con el payload de disparos")]
    MatchIdMismatch,

    #[error("La ruta de almacenamiento no es válida")]
    InsecureStoragePath,

    #[error("La fecha del partido es inválida")]
    InvalidMatchDate,

    #[error("El payload de disparos es inválido: {0}")]
    InvalidPayload(String),
}

/// Errors returned by [`ShotsPublisher::publish`]
#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to serialize shots payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Canonical encoding of a payload with its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPayload {
    pub bytes: Vec<u8>,
    pub checksum: String,
}

impl SerializedPayload {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Application service publishing shots files and their index rows
pub struct ShotsPublisher {
    storage: Arc<dyn ShotsStorage>,
    index: Arc<dyn MatchesIndexRepository>,
    clock: Arc<dyn Clock>,
    bucket: String,
    max_attempts: u32,
}

impl ShotsPublisher {
    pub fn new(storage: Arc<dyn ShotsStorage>, index: Arc<dyn MatchesIndexRepository>) -> Self {
        Self {
            storage,
            index,
            clock: Arc::new(SystemClock),
            bucket: DEFAULT_BUCKET.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn from_config(
        config: &PublisherConfig,
        storage: Arc<dyn ShotsStorage>,
        index: Arc<dyn MatchesIndexRepository>,
    ) -> Self {
        Self::new(storage, index)
            .with_bucket(config.bucket.clone())
            .with_max_attempts(config.max_attempts)
    }

    /// Empty names fall back to the default bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        self.bucket = if bucket.is_empty() {
            DEFAULT_BUCKET.to_string()
        } else {
            bucket
        };
        self
    }

    /// Total upload attempts, at least 1
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[instrument(skip(self, request), fields(match_id = %request.match_id, storage_path = %request.storage_path))]
    pub async fn publish(&self, request: &PublicationRequest) -> Result<PublishResult, PublishError> {
        let match_date = validate_request(request)?;

        let serialized = serialize_payload(&request.shots)?;
        let size_bytes = serialized.size_bytes();

        self.upload_with_retry(&request.storage_path, &serialized.bytes)
            .await?;
        let uploaded_at = self.clock.now();

        let record = MatchIndexRecord {
            id: request.match_id.clone(),
            date: match_date,
            home: request.shots.match_info.home.clone(),
            away: request.shots.match_info.away.clone(),
            storage_path: request.storage_path.clone(),
            size_bytes,
            checksum: serialized.checksum.clone(),
        };
        self.index.upsert_match_index(&record).await?;

        debug!(size_bytes, checksum = %serialized.checksum, "Shots published");

        Ok(PublishResult {
            match_id: request.match_id.clone(),
            storage_path: request.storage_path.clone(),
            checksum: serialized.checksum,
            size_bytes,
            uploaded_at,
        })
    }

    async fn upload_with_retry(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .storage
                .upload(&self.bucket, path, content, CONTENT_TYPE_JSON)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    debug!(attempt, max_attempts = self.max_attempts, "Retrying upload");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Run every local check and return the parsed kickoff.
///
/// The kickoff is parsed here rather than when the index record is built so
/// that an unparseable date never leaves an uploaded object behind.
pub fn validate_request(request: &PublicationRequest) -> Result<DateTime<Utc>, ValidationError> {
    if request.match_id.trim().is_empty() {
        return Err(ValidationError::EmptyMatchId);
    }

    if request.match_id != request.shots.match_info.match_id {
        return Err(ValidationError::MatchIdMismatch);
    }

    if !is_storage_path_secure(&request.storage_path) {
        return Err(ValidationError::InsecureStoragePath);
    }

    for (position, shot) in request.shots.shots.iter().enumerate() {
        if !shot.xg.is_finite() {
            return Err(ValidationError::InvalidPayload(format!(
                "xG no finito en el disparo {position}"
            )));
        }
        if shot.xgot.is_some_and(|v| !v.is_finite()) {
            return Err(ValidationError::InvalidPayload(format!(
                "xGOT no finito en el disparo {position}"
            )));
        }
    }

    parse_match_date(&request.shots.match_info.kickoff)
}

/// Relative, slash-separated, no traversal, `.json` suffix
pub fn is_storage_path_secure(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return false;
    }
    if path.split('/').any(|segment| segment == "..") {
        return false;
    }
    path.ends_with(".json")
}

/// Parse an ISO-8601 date-time; values without an offset are taken as UTC.
///
/// Besides RFC 3339 this accepts a `T` or space separator, times of `HH`,
/// `HH:MM` or `HH:MM:SS[.fff]` (basic `HHMM[SS]` too), offsets `Z`, `±HH`,
/// `±HHMM` or `±HH:MM`, and bare dates (midnight).
pub fn parse_match_date(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    parse_extended_iso8601(raw).ok_or(ValidationError::InvalidMatchDate)
}

fn parse_extended_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let date_len = if raw.as_bytes().get(4) == Some(&b'-') { 10 } else { 8 };
    let date = parse_date(raw.get(..date_len)?)?;
    let rest = raw.get(date_len..)?;
    if rest.is_empty() {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    let rest = rest.strip_prefix(['T', ' '])?;
    let (time, offset) = if let Some(time) = rest.strip_suffix('Z') {
        (time, Some(FixedOffset::east_opt(0)?))
    } else if let Some(position) = rest.rfind(['+', '-']) {
        (&rest[..position], Some(parse_offset(&rest[position..])?))
    } else {
        (rest, None)
    };

    let naive = date.and_time(parse_time(time)?);
    match offset {
        Some(offset) => Some(offset.from_local_datetime(&naive).single()?.with_timezone(&Utc)),
        None => Some(naive.and_utc()),
    }
}

/// `YYYY-MM-DD` or `YYYYMMDD`
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() == 10 {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
    }
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(
        raw[..4].parse().ok()?,
        raw[4..6].parse().ok()?,
        raw[6..].parse().ok()?,
    )
}

/// `HH`, `HH:MM`, `HH:MM:SS` or their basic forms, seconds optionally followed
/// by a `.`/`,` fraction
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let (clock, fraction) = match raw.split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (raw, None),
    };

    let fields: Vec<&str> = if clock.contains(':') {
        clock.split(':').collect()
    } else {
        (0..clock.len())
            .step_by(2)
            .map(|start| clock.get(start..start + 2))
            .collect::<Option<_>>()?
    };
    if fields.is_empty()
        || fields.len() > 3
        || fields
            .iter()
            .any(|field| field.len() != 2 || !field.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let number = |index: usize| fields.get(index).map_or(Some(0), |field| field.parse().ok());
    let nanos = match fraction {
        None => 0,
        Some(digits)
            if fields.len() == 3
                && (1..=9).contains(&digits.len())
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{digits:0<9}").parse().ok()?
        }
        Some(_) => return None,
    };

    NaiveTime::from_hms_nano_opt(number(0)?, number(1)?, number(2)?, nanos)
}

/// `±HH`, `±HHMM` or `±HH:MM`
fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, digits) = match raw.split_at(1) {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    let digits = match digits.split_once(':') {
        Some((hours, minutes)) if hours.len() == 2 && minutes.len() == 2 => {
            format!("{hours}{minutes}")
        }
        Some(_) => return None,
        None => digits.to_string(),
    };
    if !matches!(digits.len(), 2 | 4) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits.get(2..).filter(|m| !m.is_empty()).map_or(Some(0), |m| m.parse().ok())?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Canonical JSON (see [`crate::canonical`]) with absent optionals omitted,
/// plus its SHA-256.
pub fn serialize_payload(payload: &ShotsPayload) -> Result<SerializedPayload, serde_json::Error> {
    let bytes = to_canonical_vec(payload)?;
    let checksum = hex::encode(Sha256::digest(&bytes));
    Ok(SerializedPayload { bytes, checksum })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryIndex, InMemoryStorage};
    use crate::model::{FinalScore, MatchInfo, Shot};
    use crate::ports::{MockMatchesIndexRepository, MockShotsStorage};
    use chrono::TimeZone;

    fn sample_payload(match_id: &str) -> ShotsPayload {
        ShotsPayload {
            match_info: MatchInfo {
                match_id: match_id.to_string(),
                kickoff: "2024-09-28T20:00:00+00:00".to_string(),
                home: "Atletico Madrid".to_string(),
                away: "Real Madrid".to_string(),
                final_score: FinalScore { home: 2, away: 1 },
            },
            shots: vec![Shot {
                minute: 12,
                team: "Atletico Madrid".to_string(),
                player: "Alvaro Morata".to_string(),
                xg: 0.32,
                xgot: Some(0.18),
                situation: Some("Juego abierto".to_string()),
                outcome: "Gol".to_string(),
                body_part: Some("Pie derecho".to_string()),
            }],
        }
    }

    fn sample_request(match_id: &str) -> PublicationRequest {
        PublicationRequest {
            match_id: match_id.to_string(),
            storage_path: format!("matches/{match_id}.json"),
            shots: sample_payload(match_id),
        }
    }

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 28, 21, 0, 0).unwrap()
    }

    fn publisher_with(storage: Arc<InMemoryStorage>, index: Arc<InMemoryIndex>) -> ShotsPublisher {
        ShotsPublisher::new(storage, index).with_clock(Arc::new(fixed_instant))
    }

    #[tokio::test]
    async fn test_publish_uploads_file_and_upserts_index() {
        let storage = Arc::new(InMemoryStorage::new());
        let index = Arc::new(InMemoryIndex::new());
        let publisher = publisher_with(storage.clone(), index.clone());
        let request = sample_request("atl-mad-20240928");

        let result = publisher.publish(&request).await.unwrap();

        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 1);
        let upload = &uploads[0];
        assert_eq!(upload.bucket, "shots");
        assert_eq!(upload.path, request.storage_path);
        assert_eq!(upload.content_type, "application/json");

        let expected = serialize_payload(&request.shots).unwrap();
        assert_eq!(upload.content, expected.bytes);
        assert_eq!(result.checksum, hex::encode(Sha256::digest(&upload.content)));
        assert_eq!(result.size_bytes, upload.content.len() as u64);
        assert_eq!(result.uploaded_at, fixed_instant());

        let records = index.upserts();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            MatchIndexRecord {
                id: request.match_id.clone(),
                date: Utc.with_ymd_and_hms(2024, 9, 28, 20, 0, 0).unwrap(),
                home: "Atletico Madrid".to_string(),
                away: "Real Madrid".to_string(),
                storage_path: request.storage_path.clone(),
                size_bytes: result.size_bytes,
                checksum: result.checksum.clone(),
            }
        );
    }

    #[tokio::test]
    async fn test_end_to_end_minimal_match() {
        let raw = serde_json::json!({
            "match_id": "m1",
            "storage_path": "matches/m1.json",
            "shots": {
                "partido": {
                    "idPartido": "m1",
                    "fechaISO": "2024-01-01T00:00:00+00:00",
                    "local": "A",
                    "visitante": "B",
                    "marcadorFinal": {"local": 1, "visitante": 0}
                },
                "disparos": []
            }
        });
        let request: PublicationRequest = serde_json::from_value(raw).unwrap();
        let publisher = publisher_with(Arc::new(InMemoryStorage::new()), Arc::new(InMemoryIndex::new()));

        let result = publisher.publish(&request).await.unwrap();

        assert_eq!(result.match_id, "m1");
        assert_eq!(result.storage_path, "matches/m1.json");
        assert_eq!(result.checksum.len(), 64);
        assert!(result
            .checksum
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(result.size_bytes > 0);
        assert_eq!(result.uploaded_at, fixed_instant());
    }

    #[tokio::test]
    async fn test_mismatched_ids_touch_no_port() {
        let mut storage = MockShotsStorage::new();
        storage.expect_upload().never();
        let mut index = MockMatchesIndexRepository::new();
        index.expect_upsert_match_index().never();
        let publisher = ShotsPublisher::new(Arc::new(storage), Arc::new(index));

        let mut request = sample_request("m1");
        request.shots = sample_payload("m2");

        let err = publisher.publish(&request).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::Validation(ValidationError::MatchIdMismatch)
        ));
    }

    #[tokio::test]
    async fn test_empty_match_id_touches_no_port() {
        for match_id in ["", "   "] {
            let mut storage = MockShotsStorage::new();
            storage.expect_upload().never();
            let mut index = MockMatchesIndexRepository::new();
            index.expect_upsert_match_index().never();
            let publisher = ShotsPublisher::new(Arc::new(storage), Arc::new(index));

            let mut request = sample_request(match_id);
            request.storage_path = "matches/x.json".to_string();

            let err = publisher.publish(&request).await.unwrap_err();
            assert!(matches!(
                err,
                PublishError::Validation(ValidationError::EmptyMatchId)
            ));
        }
    }

    #[tokio::test]
    async fn test_insecure_paths_are_rejected_before_io() {
        for path in [
            "",
            "/matches/m1.json",
            "matches\\m1.json",
            "matches/../m1.json",
            "../../secret.txt",
            "matches/m1.txt",
            "matches/m1",
        ] {
            let storage = Arc::new(InMemoryStorage::new());
            let index = Arc::new(InMemoryIndex::new());
            let publisher = publisher_with(storage.clone(), index.clone());
            let mut request = sample_request("m1");
            request.storage_path = path.to_string();

            let err = publisher.publish(&request).await.unwrap_err();
            assert!(
                matches!(err, PublishError::Validation(ValidationError::InsecureStoragePath)),
                "path {path:?} should be rejected"
            );
            assert_eq!(storage.attempts(), 0);
            assert!(index.upserts().is_empty());
        }
    }

    #[test]
    fn test_secure_paths() {
        assert!(is_storage_path_secure("m1.json"));
        assert!(is_storage_path_secure("matches/2024/m1.json"));
        assert!(is_storage_path_secure("matches/..m1.json"));
        assert!(!is_storage_path_secure("matches/./../m1.json"));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let storage = Arc::new(InMemoryStorage::new().fail_transient(2));
        let index = Arc::new(InMemoryIndex::new());
        let publisher = publisher_with(storage.clone(), index.clone()).with_max_attempts(3);

        let result = publisher.publish(&sample_request("m1")).await;

        tokio_test::assert_ok!(result);
        assert_eq!(storage.attempts(), 3);
        assert_eq!(index.upserts().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let storage = Arc::new(InMemoryStorage::new().fail_transient(3));
        let index = Arc::new(InMemoryIndex::new());
        let publisher = publisher_with(storage.clone(), index.clone()).with_max_attempts(3);

        let err = publisher.publish(&sample_request("m1")).await.unwrap_err();

        assert!(matches!(err, PublishError::Storage(StorageError::Transient(_))));
        assert_eq!(storage.attempts(), 3);
        assert!(index.upserts().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let storage = Arc::new(InMemoryStorage::new().fail_permanent(1));
        let index = Arc::new(InMemoryIndex::new());
        let publisher = publisher_with(storage.clone(), index.clone());

        let err = publisher.publish(&sample_request("m1")).await.unwrap_err();

        assert!(matches!(err, PublishError::Storage(StorageError::Permanent(_))));
        assert_eq!(storage.attempts(), 1);
        assert!(index.upserts().is_empty());
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_uploads_once() {
        let storage = Arc::new(InMemoryStorage::new().fail_transient(5));
        let publisher = publisher_with(storage.clone(), Arc::new(InMemoryIndex::new()))
            .with_max_attempts(0);

        assert_eq!(publisher.max_attempts(), 1);
        assert!(publisher.publish(&sample_request("m1")).await.is_err());
        assert_eq!(storage.attempts(), 1);
    }

    #[tokio::test]
    async fn test_index_failure_leaves_upload_in_place() {
        let storage = Arc::new(InMemoryStorage::new());
        let index = Arc::new(InMemoryIndex::new().fail_transient(1));
        let publisher = publisher_with(storage.clone(), index.clone());

        let err = publisher.publish(&sample_request("m1")).await.unwrap_err();

        assert!(matches!(err, PublishError::Index(IndexError::Transient(_))));
        assert_eq!(index.attempts(), 1);
        assert!(storage.object("shots", "matches/m1.json").is_some());
    }

    #[tokio::test]
    async fn test_unparseable_date_is_rejected_before_upload() {
        let storage = Arc::new(InMemoryStorage::new());
        let publisher = publisher_with(storage.clone(), Arc::new(InMemoryIndex::new()));
        let mut request = sample_request("m1");
        request.shots.match_info.kickoff = "ayer por la tarde".to_string();

        let err = publisher.publish(&request).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::Validation(ValidationError::InvalidMatchDate)
        ));
        assert_eq!(storage.attempts(), 0);
    }

    #[tokio::test]
    async fn test_non_finite_xg_is_rejected() {
        let storage = Arc::new(InMemoryStorage::new());
        let publisher = publisher_with(storage.clone(), Arc::new(InMemoryIndex::new()));
        let mut request = sample_request("m1");
        request.shots.shots[0].xg = f64::NAN;

        let err = publisher.publish(&request).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::Validation(ValidationError::InvalidPayload(_))
        ));
        assert_eq!(storage.attempts(), 0);
    }

    #[tokio::test]
    async fn test_upload_uses_configured_bucket() {
        let mut storage = MockShotsStorage::new();
        storage
            .expect_upload()
            .withf(|bucket, path, _, content_type| {
                bucket == "match-shots" && path == "matches/m1.json" && content_type == "application/json"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let mut index = MockMatchesIndexRepository::new();
        index
            .expect_upsert_match_index()
            .times(1)
            .returning(|_| Ok(()));

        let publisher = ShotsPublisher::new(Arc::new(storage), Arc::new(index))
            .with_bucket("match-shots");

        assert!(publisher.publish(&sample_request("m1")).await.is_ok());
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let payload = sample_payload("m1");
        let first = serialize_payload(&payload).unwrap();
        let second = serialize_payload(&payload.clone()).unwrap();
        assert_eq!(first, second);

        let reordered: ShotsPayload = serde_json::from_str(
            r#"{"disparos":[{"tipo_disparo":"Pie derecho","resultado":"Gol","situacion":"Juego abierto",
                "xGOT":0.18,"xG":0.32,"jugador":"Alvaro Morata","equipo":"Atletico Madrid","minuto":12}],
               "partido":{"marcadorFinal":{"visitante":1,"local":2},"visitante":"Real Madrid",
                "local":"Atletico Madrid","fechaISO":"2024-09-28T20:00:00+00:00","idPartido":"m1"}}"#,
        )
        .unwrap();
        assert_eq!(serialize_payload(&reordered).unwrap(), first);
    }

    #[test]
    fn test_serialization_sorts_keys_and_drops_absent_fields() {
        let mut payload = sample_payload("m1");
        payload.shots[0].xgot = None;
        payload.shots[0].situation = None;
        payload.shots[0].body_part = None;

        let serialized = serialize_payload(&payload).unwrap();
        let text = String::from_utf8(serialized.bytes).unwrap();

        assert_eq!(
            text,
            concat!(
                r#"{"disparos": [{"equipo": "Atletico Madrid", "jugador": "Alvaro Morata", "minuto": 12, "#,
                r#""resultado": "Gol", "xG": 0.32}], "partido": {"fechaISO": "2024-09-28T20:00:00+00:00", "#,
                r#""idPartido": "m1", "local": "Atletico Madrid", "marcadorFinal": {"local": 2, "visitante": 1}, "#,
                r#""visitante": "Real Madrid"}}"#
            )
        );
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_checksum_matches_existing_files() {
        let payload: ShotsPayload = serde_json::from_str(
            r#"{"partido": {"idPartido": "m1", "fechaISO": "2024-01-01T00:00:00+00:00", "local": "A",
                "visitante": "B", "marcadorFinal": {"local": 1, "visitante": 0}},
               "disparos": [{"minuto": 9, "equipo": "A", "jugador": "Martin Ødegaard", "xG": 0.1,
                "xGOT": 0.00001, "situacion": "Córner", "tipo_disparo": "Cabeza", "resultado": "Parada 🧤"}]}"#,
        )
        .unwrap();

        let serialized = serialize_payload(&payload).unwrap();

        assert_eq!(
            String::from_utf8(serialized.bytes.clone()).unwrap(),
            concat!(
                r#"{"disparos": [{"equipo": "A", "jugador": "Martin \u00d8degaard", "minuto": 9, "#,
                r#""resultado": "Parada \ud83e\udde4", "situacion": "C\u00f3rner", "tipo_disparo": "Cabeza", "#,
                r#""xG": 0.1, "xGOT": 1e-05}], "partido": {"fechaISO": "2024-01-01T00:00:00+00:00", "#,
                r#""idPartido": "m1", "local": "A", "marcadorFinal": {"local": 1, "visitante": 0}, "#,
                r#""visitante": "B"}}"#
            )
        );
        assert_eq!(serialized.size_bytes(), 347);
        assert_eq!(
            serialized.checksum,
            "2d11e766d9de033b1ce38f3f75afbca2b1a41fce4e77ac6cb562d7d285630f0d"
        );
    }

    #[test]
    fn test_parse_match_date_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_match_date("2024-01-01T00:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_match_date("2024-01-01T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_match_date("2024-01-01T00:00:00").unwrap(), expected);
        assert_eq!(parse_match_date("2024-01-01").unwrap(), expected);
        assert_eq!(
            parse_match_date("2024-01-01T02:00:00+02:00").unwrap(),
            expected
        );
        assert_eq!(parse_match_date("2024-01-01T00:00:00+0000").unwrap(), expected);
        assert_eq!(parse_match_date("2024-01-01T00:00:00.000").unwrap(), expected);
        assert_eq!(parse_match_date("20240101").unwrap(), expected);

        let eight_pm = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(parse_match_date("2024-01-01T20:00").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01 20:00").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01 20:00:00").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01T20").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01T2000").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01T22:00+02:00").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01T22:00:00+02").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01T17:00:00-0300").unwrap(), eight_pm);
        assert_eq!(parse_match_date("2024-01-01T20:00:00Z").unwrap(), eight_pm);

        assert_eq!(
            parse_match_date("2024-01-01T20:00:00.5").unwrap(),
            eight_pm + chrono::Duration::milliseconds(500)
        );

        for invalid in [
            "not a date",
            "2024-13-01",
            "2024-01-01T",
            "2024-01-01T25:00",
            "2024-01-01T20:0",
            "2024-01-01T20.5",
            "2024-01-01T20:00+2",
            "2024-01-01X20:00",
        ] {
            assert_eq!(
                parse_match_date(invalid),
                Err(ValidationError::InvalidMatchDate),
                "{invalid:?} should be rejected"
            );
        }
    }
}
