//! Section keys across schema layouts.
//!
//! Queries never touch the `section` column directly; they go through a
//! [`SectionMap`], which maps a [`Section`] to the canonical value stored in
//! `manpages.section` and back.

use manidx_core::catalog::Section;
use rusqlite::{Connection, OptionalExtension as _, types::Value};

use crate::{
  Error, Result,
  dimension::{Dimension, Interner},
};

pub(crate) trait SectionMap: Send + Sync {
  /// Join clause that brings the section label into scope as `{alias}_sec`,
  /// or an empty string when the label lives on `alias` itself.
  fn join(&self, alias: &str, column: &str) -> String;

  /// Select expression for the section label.
  fn label(&self, alias: &str, column: &str) -> String;

  /// Canonical key for a read, or `None` when no row can have this section.
  fn find(&self, conn: &Connection, section: &Section) -> rusqlite::Result<Option<Value>>;

  /// Canonical key for a write, creating the dimension row if needed.
  fn intern(
    &self,
    conn: &Connection,
    interner: &mut Interner<'_>,
    section: &Section,
  ) -> Result<i64>;
}

/// Legacy layout: the section is its own integer key.
pub(crate) struct RawSections;

impl SectionMap for RawSections {
  fn join(&self, _alias: &str, _column: &str) -> String { String::new() }

  fn label(&self, alias: &str, column: &str) -> String {
    format!("CAST({alias}.{column} AS TEXT)")
  }

  fn find(&self, _conn: &Connection, section: &Section) -> rusqlite::Result<Option<Value>> {
    Ok(section.as_number().map(Value::Integer))
  }

  fn intern(
    &self,
    _conn: &Connection,
    _interner: &mut Interner<'_>,
    section: &Section,
  ) -> Result<i64> {
    section
      .as_number()
      .ok_or_else(|| Error::InvalidSection(section.to_string()))
  }
}

/// Normalized layout: sections are rows of the `sections` table.
pub(crate) struct SectionTable;

impl SectionMap for SectionTable {
  fn join(&self, alias: &str, column: &str) -> String {
    format!("JOIN sections {alias}_sec ON {alias}_sec.id = {alias}.{column}")
  }

  fn label(&self, alias: &str, _column: &str) -> String {
    format!("{alias}_sec.section")
  }

  fn find(&self, conn: &Connection, section: &Section) -> rusqlite::Result<Option<Value>> {
    conn
      .query_row(
        "SELECT id FROM sections WHERE section = ?1",
        [section.as_str()],
        |row| row.get::<_, i64>(0),
      )
      .optional()
      .map(|id| id.map(Value::Integer))
  }

  fn intern(
    &self,
    conn: &Connection,
    interner: &mut Interner<'_>,
    section: &Section,
  ) -> Result<i64> {
    interner.intern(conn, Dimension::Section, section.as_str())
  }
}
