//! Dimension interning for packages, releases, locales and sections.
//!
//! Dimension rows are created on first reference and never change. The store
//! keeps a process-local cache of name ↔ id bindings so an ingestion run does
//! not re-select the same package or release for every page. New bindings are
//! only cached once their transaction commits.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension as _};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Dimension {
  Package,
  Release,
  Locale,
  Section,
}

impl Dimension {
  pub(crate) fn table(self) -> &'static str {
    match self {
      Self::Package => "packages",
      Self::Release => "releases",
      Self::Locale => "locales",
      Self::Section => "sections",
    }
  }

  fn column(self) -> &'static str {
    match self {
      Self::Section => "section",
      _ => "name",
    }
  }
}

/// The stored id of `name` in `dim`, without creating it.
pub(crate) fn find(
  conn: &Connection,
  dim: Dimension,
  name: &str,
) -> rusqlite::Result<Option<i64>> {
  let (table, column) = (dim.table(), dim.column());
  conn
    .query_row(
      &format!("SELECT id FROM {table} WHERE {column} = ?1"),
      [name],
      |row| row.get(0),
    )
    .optional()
}

/// Committed name ↔ id bindings.
#[derive(Debug, Default)]
pub(crate) struct DimensionCache {
  by_name: HashMap<(Dimension, String), i64>,
  by_id:   HashMap<(Dimension, i64), String>,
}

impl DimensionCache {
  fn get(&self, dim: Dimension, name: &str) -> Option<i64> {
    self.by_name.get(&(dim, name.to_owned())).copied()
  }

  /// Reject `id` if the cache already knows it under another name.
  fn check(&self, dim: Dimension, id: i64, name: &str) -> Result<()> {
    match self.by_id.get(&(dim, id)) {
      Some(existing) if existing != name => Err(Error::DimensionConflict {
        table:    dim.table(),
        id,
        existing: existing.clone(),
        incoming: name.to_owned(),
      }),
      _ => Ok(()),
    }
  }

  fn remember(&mut self, dim: Dimension, name: String, id: i64) {
    self.by_id.insert((dim, id), name.clone());
    self.by_name.insert((dim, name), id);
  }
}

/// Interns dimension values inside one write transaction.
pub(crate) struct Interner<'c> {
  cache:   &'c mut DimensionCache,
  pending: Vec<(Dimension, String, i64)>,
}

impl<'c> Interner<'c> {
  pub(crate) fn new(cache: &'c mut DimensionCache) -> Self {
    Self { cache, pending: Vec::new() }
  }

  /// The id of `name` in `dim`, inserting a row if there is none yet.
  pub(crate) fn intern(
    &mut self,
    conn: &Connection,
    dim: Dimension,
    name: &str,
  ) -> Result<i64> {
    if let Some(id) = self.cache.get(dim, name) {
      return Ok(id);
    }
    if let Some((_, _, id)) =
      self.pending.iter().find(|(d, n, _)| *d == dim && n == name)
    {
      return Ok(*id);
    }

    let id = match find(conn, dim, name)? {
      Some(id) => id,
      None => {
        let (table, column) = (dim.table(), dim.column());
        conn.execute(&format!("INSERT INTO {table} ({column}) VALUES (?1)"), [name])?;
        conn.last_insert_rowid()
      }
    };

    self.cache.check(dim, id, name)?;
    self.pending.push((dim, name.to_owned(), id));
    Ok(id)
  }

  /// Cache the bindings made by this interner. Call after commit.
  pub(crate) fn commit(self) {
    for (dim, name, id) in self.pending {
      self.cache.remember(dim, name, id);
    }
  }
}
