//! [`MemoryStore`]: an in-memory [`CatalogStore`] built on ordered maps.
//!
//! Intended for tests and small fixtures. Apropos relevance is the number of
//! distinct query tokens found in a description; there is no index engine.

use std::{
  collections::{BTreeMap, BTreeSet, HashSet},
  sync::{
    RwLock,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;

use crate::{
  apropos::tokenize,
  catalog::{
    AproposHit, AproposQuery, Coordinate, Manpage, Page, Section, Symlink,
    stable_key,
  },
  store::CatalogStore,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("manpage is missing required field `{0}`")]
  InvalidManpage(&'static str),

  #[error("symlink is missing required field `{0}`")]
  InvalidSymlink(&'static str),

  #[error("store marked unavailable")]
  Unavailable,

  #[error("store lock poisoned")]
  Poisoned,
}

type Result<T, E = MemoryError> = std::result::Result<T, E>;

#[derive(Default)]
struct Tables {
  /// Keyed by coordinate, then package, so one coordinate is a contiguous
  /// range.
  manpages: BTreeMap<(Coordinate, String), Manpage>,
  symlinks: BTreeMap<Coordinate, Symlink>,
}

/// An in-memory catalog.
#[derive(Default)]
pub struct MemoryStore {
  tables:      RwLock<Tables>,
  unavailable: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent call fail with [`MemoryError::Unavailable`].
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  fn check(&self) -> Result<()> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(MemoryError::Unavailable);
    }
    Ok(())
  }

  fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T> {
    self.check()?;
    let tables = self.tables.read().map_err(|_| MemoryError::Poisoned)?;
    Ok(f(&tables))
  }

  fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
    self.check()?;
    let mut tables = self.tables.write().map_err(|_| MemoryError::Poisoned)?;
    Ok(f(&mut tables))
  }
}

fn relevance(query_tokens: &HashSet<String>, description: &str) -> usize {
  let words: HashSet<String> = tokenize(description).into_iter().collect();
  query_tokens.intersection(&words).count()
}

impl CatalogStore for MemoryStore {
  type Error = MemoryError;

  async fn get_manpage(&self, at: &Coordinate) -> Result<Option<Manpage>> {
    self.read(|t| {
      t.manpages
        .range((at.clone(), String::new())..)
        .take_while(|((coordinate, _), _)| coordinate == at)
        .map(|(_, page)| page.clone())
        .next()
    })
  }

  async fn get_symlink(&self, at: &Coordinate) -> Result<Option<Symlink>> {
    self.read(|t| t.symlinks.get(at).cloned())
  }

  async fn sections_for(&self, release: &str, name: &str) -> Result<Vec<Section>> {
    self.read(|t| {
      let sections: BTreeSet<Section> = t
        .manpages
        .keys()
        .map(|(c, _)| c)
        .chain(t.symlinks.keys())
        .filter(|c| c.release == release && c.name == name)
        .map(|c| c.section.clone())
        .collect();
      sections.into_iter().collect()
    })
  }

  async fn search_apropos(
    &self,
    query: &AproposQuery,
    page: Page,
  ) -> Result<Vec<AproposHit>> {
    let query_tokens: HashSet<String> = tokenize(&query.text).into_iter().collect();

    self.read(|t| {
      let mut hits: Vec<(usize, &Manpage)> = t
        .manpages
        .values()
        .filter(|m| query.accepts(m))
        .filter_map(|m| {
          if query_tokens.is_empty() {
            return Some((0, m));
          }
          let score = relevance(&query_tokens, m.description.as_deref()?);
          (score > 0).then_some((score, m))
        })
        .collect();

      hits.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa).then_with(|| stable_key(a).cmp(&stable_key(b)))
      });

      hits
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .map(|(score, m)| AproposHit { manpage: m.clone(), score: score as f64 })
        .collect()
    })
  }

  async fn upsert_manpage(&self, entry: Manpage) -> Result<()> {
    if let Some(field) = entry.missing_field() {
      return Err(MemoryError::InvalidManpage(field));
    }
    self.write(|t| {
      let key = (entry.coordinate(), entry.package.clone());
      if t.symlinks.contains_key(&key.0) {
        tracing::warn!(at = %key.0, "manpage shadows an existing symlink");
      }
      t.manpages.insert(key, entry);
    })
  }

  async fn upsert_symlink(&self, entry: Symlink) -> Result<()> {
    if let Some(field) = entry.missing_field() {
      return Err(MemoryError::InvalidSymlink(field));
    }
    self.write(|t| {
      let shadowed = t
        .manpages
        .range((entry.source.clone(), String::new())..)
        .next()
        .is_some_and(|((c, _), _)| *c == entry.source);
      if shadowed {
        tracing::warn!(
          at = %entry.source,
          "symlink source already has a concrete manpage; the manpage wins"
        );
      }
      t.symlinks.insert(entry.source.clone(), entry);
    })
  }

  async fn remove_package(&self, release: &str, package: &str) -> Result<usize> {
    self.write(|t| {
      let before = t.manpages.len() + t.symlinks.len();
      t.manpages
        .retain(|(c, p), _| !(c.release == release && p == package));
      t.symlinks
        .retain(|c, link| !(c.release == release && link.package == package));
      before - (t.manpages.len() + t.symlinks.len())
    })
  }
}
