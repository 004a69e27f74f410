//! Apropos: free-text search over manpage descriptions.
//!
//! Ranking belongs to the store's text index. This module validates and
//! normalises queries, caps page sizes and hands out restartable cursors.

use crate::{
  Error, Result,
  catalog::{AproposHit, AproposQuery, Page},
  config::ResolverConfig,
  store::CatalogStore,
};

/// Split `text` into lowercase word tokens.
///
/// Word boundaries are runs of Unicode alphanumerics; everything else
/// separates words. No stemming or stop-word removal is applied.
pub fn tokenize(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|word| !word.is_empty())
    .map(str::to_lowercase)
    .collect()
}

/// Apropos search over a [`CatalogStore`].
pub struct AproposSearch<'s, S> {
  store:     &'s S,
  max_limit: usize,
}

impl<S> Clone for AproposSearch<'_, S> {
  fn clone(&self) -> Self { *self }
}

impl<S> Copy for AproposSearch<'_, S> {}

impl<'s, S: CatalogStore> AproposSearch<'s, S> {
  pub fn new(store: &'s S, config: &ResolverConfig) -> Self {
    Self { store, max_limit: config.apropos_max_limit }
  }

  /// Run one page of `query`.
  ///
  /// An empty query is only accepted when at least one filter narrows the
  /// result set.
  pub async fn search(
    &self,
    query: &AproposQuery,
    page: Page,
  ) -> Result<Vec<AproposHit>> {
    let tokens = tokenize(&query.text);
    if tokens.is_empty() && !query.has_filters() {
      return Err(Error::InvalidQuery(
        "apropos needs search words or at least one filter".into(),
      ));
    }

    let page = Page { limit: page.limit.min(self.max_limit), ..page };
    if page.limit == 0 {
      return Ok(Vec::new());
    }

    let normalised = AproposQuery { text: tokens.join(" "), ..query.clone() };
    tracing::debug!(
      text = %normalised.text,
      limit = page.limit,
      offset = page.offset,
      "apropos search"
    );

    self
      .store
      .search_apropos(&normalised, page)
      .await
      .map_err(Error::store)
  }

  /// A lazy cursor over all pages of `query`, `page_size` hits at a time.
  pub fn cursor(
    &self,
    query: AproposQuery,
    page_size: usize,
  ) -> AproposCursor<'s, S> {
    AproposCursor {
      search: *self,
      query,
      page_size: page_size.clamp(1, self.max_limit.max(1)),
      offset: 0,
      exhausted: false,
    }
  }
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Offset-paginated walk over apropos results. Nothing is fetched until
/// [`next_page`](Self::next_page) is called; [`rewind`](Self::rewind) starts
/// over from the first page.
pub struct AproposCursor<'s, S> {
  search:    AproposSearch<'s, S>,
  query:     AproposQuery,
  page_size: usize,
  offset:    usize,
  exhausted: bool,
}

impl<S: CatalogStore> AproposCursor<'_, S> {
  /// Fetch the next page, or `None` once the results are used up.
  pub async fn next_page(&mut self) -> Result<Option<Vec<AproposHit>>> {
    if self.exhausted {
      return Ok(None);
    }

    let page = Page { limit: self.page_size, offset: self.offset };
    let hits = self.search.search(&self.query, page).await?;

    if hits.len() < self.page_size {
      self.exhausted = true;
    }
    if hits.is_empty() {
      return Ok(None);
    }

    self.offset += hits.len();
    Ok(Some(hits))
  }

  pub fn rewind(&mut self) {
    self.offset = 0;
    self.exhausted = false;
  }

  /// Offset of the next page to be fetched.
  pub fn offset(&self) -> usize { self.offset }
}
