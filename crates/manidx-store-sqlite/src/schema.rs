//! SQL schema for the manidx SQLite store.
//!
//! Two layouts exist in the wild. The current one normalizes sections into
//! their own table and adds symlinks and the apropos index. The legacy one
//! keeps the section as a raw integer on `manpages` and has neither. An
//! existing legacy file is opened as-is; new files always get the current
//! layout.

use crate::section::{RawSections, SectionMap, SectionTable};

/// Current schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS packages (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS releases (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

-- The unlocalized variant is the row named 'DEFAULT_LOCALE'.
CREATE TABLE IF NOT EXISTS locales (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sections (
    id       INTEGER PRIMARY KEY,
    section  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS manpages (
    id       INTEGER PRIMARY KEY,
    release  INTEGER NOT NULL REFERENCES releases(id),
    section  INTEGER NOT NULL REFERENCES sections(id),
    package  INTEGER NOT NULL REFERENCES packages(id),
    name     TEXT    NOT NULL,
    locale   INTEGER NOT NULL REFERENCES locales(id),
    path     TEXT    NOT NULL,   -- archive member or formatted file
    version  TEXT    NOT NULL,   -- source package version
    UNIQUE (release, section, package, name, locale)
);

-- Pure indirection: (release, section, name, locale) -> target coordinate.
CREATE TABLE IF NOT EXISTS symlinks (
    id              INTEGER PRIMARY KEY,
    release         INTEGER NOT NULL REFERENCES releases(id),
    section         INTEGER NOT NULL REFERENCES sections(id),
    name            TEXT    NOT NULL,
    locale          INTEGER NOT NULL REFERENCES locales(id),
    target_release  INTEGER NOT NULL REFERENCES releases(id),
    target_section  INTEGER NOT NULL REFERENCES sections(id),
    target_name     TEXT    NOT NULL,
    target_locale   INTEGER NOT NULL REFERENCES locales(id),
    package         INTEGER NOT NULL REFERENCES packages(id),
    UNIQUE (release, section, name, locale)
);

-- One row per described manpage; rowid = manpages.id.
CREATE VIRTUAL TABLE IF NOT EXISTS apropos USING fts5(
    description,
    tokenize = 'unicode61'
);

CREATE INDEX IF NOT EXISTS manpages_lookup_idx  ON manpages(release, section, name);
CREATE INDEX IF NOT EXISTS manpages_name_idx    ON manpages(release, name);
CREATE INDEX IF NOT EXISTS manpages_package_idx ON manpages(release, package);
CREATE INDEX IF NOT EXISTS manpages_section_idx ON manpages(section, name);
CREATE INDEX IF NOT EXISTS manpages_locale_idx  ON manpages(locale);
CREATE INDEX IF NOT EXISTS symlinks_name_idx    ON symlinks(release, name);
CREATE INDEX IF NOT EXISTS symlinks_package_idx ON symlinks(release, package);

PRAGMA user_version = 2;
";

/// The earlier layout, as written by older ingestion runs.
#[cfg(test)]
pub const LEGACY_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS packages (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS releases (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS locales (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS manpages (
    id       INTEGER PRIMARY KEY,
    release  INTEGER NOT NULL REFERENCES releases(id),
    section  INTEGER NOT NULL,
    package  INTEGER NOT NULL REFERENCES packages(id),
    name     TEXT    NOT NULL,
    locale   INTEGER NOT NULL REFERENCES locales(id),
    path     TEXT    NOT NULL,
    version  TEXT    NOT NULL,
    UNIQUE (release, section, package, name, locale)
);

CREATE INDEX IF NOT EXISTS manpages_lookup_idx ON manpages(release, section, name);

PRAGMA user_version = 1;
";

/// Executed when opening a legacy file; its tables are left untouched.
pub const LEGACY_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Which schema revision a catalog file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// Integer sections on `manpages`; no symlinks, no apropos index.
  Legacy,
  /// Section dimension table, symlinks and the FTS5 apropos index.
  Normalized,
}

impl Layout {
  /// Decide the layout from the tables already present in a file.
  pub(crate) fn detect(has_manpages: bool, has_sections: bool) -> Self {
    if has_manpages && !has_sections {
      Self::Legacy
    } else {
      Self::Normalized
    }
  }

  pub(crate) fn sections(self) -> &'static dyn SectionMap {
    match self {
      Self::Legacy => &RawSections,
      Self::Normalized => &SectionTable,
    }
  }

  pub fn has_symlinks(self) -> bool { matches!(self, Self::Normalized) }

  pub fn has_apropos(self) -> bool { matches!(self, Self::Normalized) }

  /// Select expression for a manpage's description (`m` = manpages).
  pub(crate) fn description_sql(self) -> &'static str {
    match self {
      Self::Legacy => "NULL",
      Self::Normalized => "(SELECT a.description FROM apropos a WHERE a.rowid = m.id)",
    }
  }
}
