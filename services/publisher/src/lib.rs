//! Shots Publisher Service
//!
//! Publishes normalized match shots documents. Each publication validates the
//! request, serializes the payload canonically (sorted keys, ASCII-escaped),
//! computes its SHA-256, uploads it to an S3-compatible bucket with bounded
//! retry and upserts a row in the `matches_index` table.
//!
//! ## Architecture
//!
//! ```text
//!  HTTP                     Publisher                   Backends
//! ┌──────────────┐        ┌──────────────┐         ┌──────────────┐
//! │ POST         │        │ validate     │         │ Supabase     │
//! │ /v1/shots/   │───────▶│ serialize    │────────▶│ Storage (S3) │
//! │ publish      │        │ checksum     │ retry   └──────────────┘
//! └──────────────┘        │ upload       │
//!        ▲                │ index        │         ┌──────────────┐
//!        │                └──────────────┘────────▶│ PostgreSQL   │
//! ┌──────────────┐                                 │ matches_index│
//! │ Normalizer   │ raw upstream events             └──────────────┘
//! └──────────────┘
//! ```
//!
//! Upload and index are eventually consistent: a failed upsert after a
//! successful upload leaves the object in place and surfaces the error.

pub mod api;
pub mod canonical;
pub mod config;
pub mod memory;
pub mod metadata_store;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod publisher;
pub mod s3_uploader;

pub use config::{Backend, Config, ConfigError};
pub use memory::{InMemoryIndex, InMemoryStorage};
pub use metadata_store::PgMatchesIndex;
pub use model::{FinalScore, MatchIndexRecord, MatchInfo, PublicationRequest, PublishResult, Shot, ShotsPayload};
pub use normalize::normalize_event;
pub use ports::{Clock, IndexError, MatchesIndexRepository, ShotsStorage, StorageError, SystemClock};
pub use publisher::{PublishError, ShotsPublisher, ValidationError};
pub use s3_uploader::S3ShotsStorage;
