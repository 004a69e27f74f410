//! Alias resolution: following symlink chains to a concrete manpage.
//!
//! A coordinate with a concrete row always resolves to that row, even if a
//! symlink with the same source exists. Otherwise the symlink's target is
//! looked up in turn until a concrete row is reached, the chain dangles, a
//! coordinate repeats, or the hop bound is hit.

use std::collections::HashSet;

use crate::{
  Error, Result,
  catalog::{Coordinate, Manpage},
  store::CatalogStore,
};

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
  pub manpage: Manpage,
  /// Symlink sources traversed, in order. Empty for a direct hit.
  pub via:     Vec<Coordinate>,
}

impl Resolved {
  pub fn hops(&self) -> usize { self.via.len() }
}

/// Follows symlink chains in a [`CatalogStore`].
pub struct AliasResolver<'s, S> {
  store:    &'s S,
  max_hops: usize,
}

impl<'s, S: CatalogStore> AliasResolver<'s, S> {
  pub fn new(store: &'s S, max_hops: usize) -> Self { Self { store, max_hops } }

  /// Resolve `start` to exactly one concrete manpage.
  ///
  /// Fails with [`Error::NotFound`] when the chain dangles,
  /// [`Error::CycleDetected`] when a coordinate repeats and
  /// [`Error::ChainTooLong`] when more than `max_hops` links would be
  /// followed.
  pub async fn resolve(&self, start: &Coordinate) -> Result<Resolved> {
    let mut current = start.clone();
    let mut visited = HashSet::new();
    let mut via = Vec::new();

    loop {
      if !visited.insert(current.clone()) {
        tracing::error!(
          %start,
          at = %current,
          "symlink cycle in catalog; the symlink table is corrupt"
        );
        return Err(Error::CycleDetected { start: start.clone(), at: current });
      }

      if let Some(manpage) =
        self.store.get_manpage(&current).await.map_err(Error::store)?
      {
        return Ok(Resolved { manpage, via });
      }

      let Some(link) =
        self.store.get_symlink(&current).await.map_err(Error::store)?
      else {
        return Err(Error::NotFound(current.to_string()));
      };

      if via.len() == self.max_hops {
        tracing::error!(
          %start,
          limit = self.max_hops,
          "symlink chain exceeds hop limit"
        );
        return Err(Error::ChainTooLong {
          start: start.clone(),
          limit: self.max_hops,
        });
      }

      tracing::debug!(from = %current, to = %link.target, "following symlink");
      via.push(current);
      current = link.target;
    }
  }
}
