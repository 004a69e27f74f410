//! Catalog types: manpages, symlinks and the coordinates that address them.
//!
//! A [`Coordinate`] is what a reader asks for: release, section, name and
//! locale. A concrete [`Manpage`] additionally belongs to a package, so two
//! packages may ship a page at the same coordinate; a [`Symlink`] points one
//! coordinate at another and carries no document of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Section ─────────────────────────────────────────────────────────────────

/// A manual section classifier, e.g. `1`, `3pm` or `n`.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Section(String);

impl Section {
  pub fn new(section: impl Into<String>) -> Self { Self(section.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The numeric form used by catalogs that store sections as raw integers.
  /// `None` for sections such as `n` or `3pm`.
  pub fn as_number(&self) -> Option<i64> {
    if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    self.0.parse().ok()
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for Section {
  fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for Section {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Coordinate ──────────────────────────────────────────────────────────────

/// The address of a manual entry as seen by readers.
///
/// `locale: None` is the unlocalized (default) variant.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Coordinate {
  pub release: String,
  pub section: Section,
  pub name:    String,
  #[serde(default)]
  pub locale:  Option<String>,
}

impl Coordinate {
  pub fn new(
    release: impl Into<String>,
    section: impl Into<Section>,
    name: impl Into<String>,
    locale: Option<&str>,
  ) -> Self {
    Self {
      release: release.into(),
      section: section.into(),
      name:    name.into(),
      locale:  locale.map(str::to_owned),
    }
  }

  /// The same coordinate with a different locale.
  pub fn with_locale(&self, locale: Option<String>) -> Self {
    Self { locale, ..self.clone() }
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({}) in {}", self.name, self.section, self.release)?;
    match &self.locale {
      Some(locale) => write!(f, " [{locale}]"),
      None => Ok(()),
    }
  }
}

// ─── Manpage ─────────────────────────────────────────────────────────────────

/// A concrete manual page. Unique on
/// (release, section, package, name, locale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manpage {
  pub release:     String,
  pub section:     Section,
  pub package:     String,
  pub name:        String,
  #[serde(default)]
  pub locale:      Option<String>,
  /// Archive member or formatted file holding the page.
  pub path:        String,
  /// Version of the source package.
  pub version:     String,
  /// One-line summary indexed for apropos.
  #[serde(default)]
  pub description: Option<String>,
}

impl Manpage {
  pub fn coordinate(&self) -> Coordinate {
    Coordinate {
      release: self.release.clone(),
      section: self.section.clone(),
      name:    self.name.clone(),
      locale:  self.locale.clone(),
    }
  }

  /// Name of the first mandatory field that is empty, if any.
  pub fn missing_field(&self) -> Option<&'static str> {
    [
      ("release", &self.release),
      ("section", &self.section.0),
      ("package", &self.package),
      ("name", &self.name),
      ("path", &self.path),
      ("version", &self.version),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
  }
}

// ─── Symlink ─────────────────────────────────────────────────────────────────

/// An alias installed by a package in place of a real page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symlink {
  pub source:  Coordinate,
  pub target:  Coordinate,
  /// The package that installed the alias; removing it removes the link.
  pub package: String,
}

impl Symlink {
  /// Name of the first mandatory field that is empty, if any.
  pub fn missing_field(&self) -> Option<&'static str> {
    [
      ("source.release", &self.source.release),
      ("source.section", &self.source.section.0),
      ("source.name", &self.source.name),
      ("target.release", &self.target.release),
      ("target.section", &self.target.section.0),
      ("target.name", &self.target.name),
      ("package", &self.package),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
  }
}

// ─── Apropos ─────────────────────────────────────────────────────────────────

/// Locale restriction for apropos results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LocaleFilter {
  #[default]
  Any,
  /// Only the unlocalized variant.
  Default,
  Named(String),
}

impl LocaleFilter {
  pub fn is_any(&self) -> bool { matches!(self, Self::Any) }

  pub fn accepts(&self, locale: Option<&str>) -> bool {
    match self {
      Self::Any => true,
      Self::Default => locale.is_none(),
      Self::Named(want) => locale == Some(want.as_str()),
    }
  }
}

/// Parameters for [`CatalogStore::search_apropos`](crate::store::CatalogStore::search_apropos).
///
/// All filters are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AproposQuery {
  /// Free text; tokens are ORed against description tokens.
  pub text:    String,
  pub release: Option<String>,
  pub section: Option<Section>,
  pub locale:  LocaleFilter,
}

impl AproposQuery {
  pub fn has_filters(&self) -> bool {
    self.release.is_some() || self.section.is_some() || !self.locale.is_any()
  }

  pub fn accepts(&self, page: &Manpage) -> bool {
    self.release.as_ref().is_none_or(|r| *r == page.release)
      && self.section.as_ref().is_none_or(|s| *s == page.section)
      && self.locale.accepts(page.locale.as_deref())
  }
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub limit:  usize,
  pub offset: usize,
}

impl Default for Page {
  fn default() -> Self { Self { limit: 20, offset: 0 } }
}

/// One apropos result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AproposHit {
  pub manpage: Manpage,
  /// Engine relevance; higher is better. Zero for unranked listings.
  pub score:   f64,
}

/// Stable ordering key: name, section, release, then locale and package so
/// that no two rows compare equal.
pub fn stable_key(page: &Manpage) -> (&str, &Section, &str, Option<&str>, &str) {
  (
    &page.name,
    &page.section,
    &page.release,
    page.locale.as_deref(),
    &page.package,
  )
}
