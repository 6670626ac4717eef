//! In-memory storage and index backends.
//!
//! Both honour the same contracts as the network adapters and can be scripted
//! to fail a number of times before succeeding. They back the `memory`
//! backend (dry runs) and the test suites.

use crate::model::MatchIndexRecord;
use crate::ports::{IndexError, MatchesIndexRepository, ShotsStorage, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Failure injected for the next calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Transient,
    Permanent,
}

#[derive(Debug, Default)]
struct FailureScript {
    kind: Option<FailureKind>,
    remaining: u32,
}

impl FailureScript {
    fn arm(kind: FailureKind, times: u32) -> Self {
        Self {
            kind: Some(kind),
            remaining: times,
        }
    }

    /// Consume one scripted failure, if any is left
    fn next(&mut self) -> Option<FailureKind> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.kind
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A recorded successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub bucket: String,
    pub path: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Object store kept in process memory; uploads overwrite by (bucket, path)
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    uploads: Mutex<Vec<UploadRecord>>,
    script: Mutex<FailureScript>,
    attempts: AtomicU32,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` uploads with a transient error
    pub fn fail_transient(self, times: u32) -> Self {
        *lock(&self.script) = FailureScript::arm(FailureKind::Transient, times);
        self
    }

    /// Fail the next `times` uploads with a permanent error
    pub fn fail_permanent(self, times: u32) -> Self {
        *lock(&self.script) = FailureScript::arm(FailureKind::Permanent, times);
        self
    }

    /// Upload calls received, failed ones included
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successful uploads in call order
    pub fn uploads(&self) -> Vec<UploadRecord> {
        lock(&self.uploads).clone()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        lock(&self.objects)
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ShotsStorage for InMemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        match lock(&self.script).next() {
            Some(FailureKind::Transient) => {
                return Err(StorageError::Transient(format!(
                    "simulated timeout on attempt {attempt}"
                )))
            }
            Some(FailureKind::Permanent) => {
                return Err(StorageError::Permanent(format!(
                    "simulated rejection of bucket {bucket}"
                )))
            }
            None => {}
        }

        lock(&self.objects).insert((bucket.to_string(), path.to_string()), content.to_vec());
        lock(&self.uploads).push(UploadRecord {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content: content.to_vec(),
            content_type: content_type.to_string(),
        });

        debug!(bucket, path, size_bytes = content.len(), "Stored object in memory");
        Ok(())
    }
}

/// Matches index kept in process memory, keyed by match id
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    rows: Mutex<HashMap<String, MatchIndexRecord>>,
    upserts: Mutex<Vec<MatchIndexRecord>>,
    script: Mutex<FailureScript>,
    attempts: AtomicU32,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` upserts with a transient error
    pub fn fail_transient(self, times: u32) -> Self {
        *lock(&self.script) = FailureScript::arm(FailureKind::Transient, times);
        self
    }

    /// Fail the next `times` upserts with a permanent error
    pub fn fail_permanent(self, times: u32) -> Self {
        *lock(&self.script) = FailureScript::arm(FailureKind::Permanent, times);
        self
    }

    /// Upsert calls received, failed ones included
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successful upserts in call order
    pub fn upserts(&self) -> Vec<MatchIndexRecord> {
        lock(&self.upserts).clone()
    }

    pub fn get(&self, id: &str) -> Option<MatchIndexRecord> {
        lock(&self.rows).get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MatchesIndexRepository for InMemoryIndex {
    async fn upsert_match_index(&self, record: &MatchIndexRecord) -> Result<(), IndexError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match lock(&self.script).next() {
            Some(FailureKind::Transient) => {
                return Err(IndexError::Transient("simulated connection reset".to_string()))
            }
            Some(FailureKind::Permanent) => {
                return Err(IndexError::Permanent("simulated constraint violation".to_string()))
            }
            None => {}
        }

        lock(&self.rows).insert(record.id.clone(), record.clone());
        lock(&self.upserts).push(record.clone());
        Ok(())
    }
}
