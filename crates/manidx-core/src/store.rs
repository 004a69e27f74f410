//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `manidx-store-sqlite`,
//! or [`MemoryStore`](crate::memory::MemoryStore) in tests). The resolvers
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::catalog::{
  AproposHit, AproposQuery, Coordinate, Manpage, Page, Section, Symlink,
};

/// Abstraction over a manpage catalog backend.
///
/// Reads are point lookups or range scans over the (release, section, name)
/// and (release, name) indexes; no method requires a full scan of the
/// manpage table.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The concrete manpage at `at`. When several packages ship a page at the
  /// same coordinate, the one whose package name sorts first is returned.
  fn get_manpage<'a>(
    &'a self,
    at: &'a Coordinate,
  ) -> impl Future<Output = Result<Option<Manpage>, Self::Error>> + Send + 'a;

  /// The symlink whose source is `at`.
  fn get_symlink<'a>(
    &'a self,
    at: &'a Coordinate,
  ) -> impl Future<Output = Result<Option<Symlink>, Self::Error>> + Send + 'a;

  /// Distinct sections holding a manpage or symlink named `name` in
  /// `release`, across all locales. Order is unspecified.
  fn sections_for<'a>(
    &'a self,
    release: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<Vec<Section>, Self::Error>> + Send + 'a;

  /// Full-text search over descriptions.
  ///
  /// With non-empty text, hits are ordered by relevance, then by
  /// [`stable_key`](crate::catalog::stable_key). With empty text, every row
  /// accepted by the filters is returned in stable-key order with a zero
  /// score.
  fn search_apropos<'a>(
    &'a self,
    query: &'a AproposQuery,
    page: Page,
  ) -> impl Future<Output = Result<Vec<AproposHit>, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert or replace a manpage together with its apropos entry, in one
  /// atomic step. Last write wins on the full key.
  fn upsert_manpage(
    &self,
    entry: Manpage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or replace the symlink at `entry.source`.
  fn upsert_symlink(
    &self,
    entry: Symlink,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove every manpage and symlink owned by `package` in `release`.
  /// Returns the number of rows removed.
  fn remove_package<'a>(
    &'a self,
    release: &'a str,
    package: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
