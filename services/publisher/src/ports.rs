//! Capabilities the publisher depends on.
//!
//! Adapters are responsible for classifying their failures as transient or
//! permanent; the publisher only reacts to that binary signal.

use crate::model::MatchIndexRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors reported by a storage backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Likely to succeed on immediate retry (timeout, remote 5xx)
    #[error("Transient storage failure: {0}")]
    Transient(String),

    /// Bad bucket, rejected credentials and other non-recoverable failures
    #[error("Storage failure: {0}")]
    Permanent(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Errors reported by the matches index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Transient index failure: {0}")]
    Transient(String),

    #[error("Index failure: {0}")]
    Permanent(String),
}

impl IndexError {
    pub fn is_transient(&self) -> bool {
        matches!(self, IndexError::Transient(_))
    }
}

/// Binary object storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShotsStorage: Send + Sync {
    /// Upload `content` to `path` inside `bucket`, overwriting any existing object
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;
}

/// Metadata index of published matches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchesIndexRepository: Send + Sync {
    /// Insert or update the record keyed by `record.id`
    async fn upsert_match_index(&self, record: &MatchIndexRecord) -> Result<(), IndexError>;

    /// Connectivity probe used by the readiness endpoint
    async fn ping(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_closure_is_a_clock() {
        let fixed = Utc.with_ymd_and_hms(2024, 9, 28, 21, 0, 0).unwrap();
        let clock = move || fixed;
        assert_eq!(Clock::now(&clock), fixed);
    }

    #[test]
    fn test_error_classification() {
        assert!(StorageError::Transient("timeout".into()).is_transient());
        assert!(!StorageError::Permanent("bad bucket".into()).is_transient());
        assert!(IndexError::Transient("io".into()).is_transient());
        assert!(!IndexError::Permanent("constraint".into()).is_transient());
    }
}
