//! Error types for `manidx-core`.

use thiserror::Error;

use crate::catalog::Coordinate;

#[derive(Debug, Error)]
pub enum Error {
  /// No candidate at any fallback step produced a concrete manpage.
  #[error("no manual entry for {0}")]
  NotFound(String),

  /// The symlink graph loops back on itself.
  #[error("symlink cycle while resolving {start}: {at} was already visited")]
  CycleDetected { start: Coordinate, at: Coordinate },

  /// The symlink chain is longer than the configured hop bound.
  #[error("symlink chain from {start} exceeds {limit} hops")]
  ChainTooLong { start: Coordinate, limit: usize },

  /// The backing store failed. Retry policy belongs to the caller.
  #[error("catalog store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid query: {0}")]
  InvalidQuery(String),
}

impl Error {
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(err))
  }

  /// Corrupt symlink data: a cycle or an over-long chain.
  pub fn is_integrity_fault(&self) -> bool {
    matches!(self, Self::CycleDetected { .. } | Self::ChainTooLong { .. })
  }

  /// Whether the same call may succeed later.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::StoreUnavailable(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
