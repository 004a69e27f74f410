//! Error type for `manidx-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("manpage is missing required field `{0}`")]
  InvalidManpage(&'static str),

  #[error("symlink is missing required field `{0}`")]
  InvalidSymlink(&'static str),

  /// The legacy layout stores sections as integers.
  #[error("section {0:?} cannot be stored in a catalog with integer sections")]
  InvalidSection(String),

  /// The catalog layout predates the feature.
  #[error("{0} is not available in the legacy catalog layout")]
  Unsupported(&'static str),

  /// A dimension id was seen bound to two different names. Fatal for the
  /// ingestion run; the write is rolled back.
  #[error("{table} id {id} is bound to {existing:?} but the catalog returned {incoming:?}")]
  DimensionConflict {
    table:    &'static str,
    id:       i64,
    existing: String,
    incoming: String,
  },
}

impl Error {
  /// The record itself cannot be stored; the catalog is unaffected and
  /// later records may still succeed.
  pub fn is_rejection(&self) -> bool {
    matches!(
      self,
      Self::InvalidManpage(_)
        | Self::InvalidSymlink(_)
        | Self::InvalidSection(_)
        | Self::Unsupported(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
