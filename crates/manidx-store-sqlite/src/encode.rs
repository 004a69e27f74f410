//! Encoding and decoding helpers between domain types and the values stored
//! in SQLite columns.
//!
//! The default (unlocalized) locale is stored as the sentinel locale row
//! [`DEFAULT_LOCALE`] rather than NULL, so the UNIQUE constraints on
//! `manpages` and `symlinks` hold for it too.

use manidx_core::catalog::{AproposHit, Coordinate, LocaleFilter, Manpage, Section};

// ─── Locale ──────────────────────────────────────────────────────────────────

pub const DEFAULT_LOCALE: &str = "DEFAULT_LOCALE";

pub fn encode_locale(locale: Option<&str>) -> String {
  locale.unwrap_or(DEFAULT_LOCALE).to_owned()
}

pub fn decode_locale(name: String) -> Option<String> {
  (name != DEFAULT_LOCALE).then_some(name)
}

/// The locale name an apropos filter pins, if any.
pub fn encode_locale_filter(filter: &LocaleFilter) -> Option<String> {
  match filter {
    LocaleFilter::Any => None,
    LocaleFilter::Default => Some(DEFAULT_LOCALE.to_owned()),
    LocaleFilter::Named(name) => Some(name.clone()),
  }
}

// ─── Full-text query ─────────────────────────────────────────────────────────

/// Turn normalised query words into an FTS5 expression matching any of them.
///
/// Each word is a quoted string so FTS5 operators and column filters in user
/// input are treated as plain text.
pub fn fts_query(text: &str) -> Option<String> {
  let terms: Vec<String> = text
    .split_whitespace()
    .map(|word| format!("\"{}\"", word.replace('"', "\"\"")))
    .collect();
  (!terms.is_empty()).then(|| terms.join(" OR "))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawManpage::from_row`]. Expects `m` = manpages,
/// `r` = releases, `p` = packages, `l` = locales.
pub fn manpage_columns(section_label: &str, description: &str) -> String {
  format!(
    "r.name, {section_label}, p.name, m.name, l.name, m.path, m.version, {description}"
  )
}

/// Raw values read from a `manpages` row joined with its dimensions.
pub struct RawManpage {
  pub release:     String,
  pub section:     String,
  pub package:     String,
  pub name:        String,
  pub locale:      String,
  pub path:        String,
  pub version:     String,
  pub description: Option<String>,
}

impl RawManpage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      release:     row.get(0)?,
      section:     row.get(1)?,
      package:     row.get(2)?,
      name:        row.get(3)?,
      locale:      row.get(4)?,
      path:        row.get(5)?,
      version:     row.get(6)?,
      description: row.get(7)?,
    })
  }

  pub fn into_manpage(self) -> Manpage {
    Manpage {
      release:     self.release,
      section:     Section::from(self.section),
      package:     self.package,
      name:        self.name,
      locale:      decode_locale(self.locale),
      path:        self.path,
      version:     self.version,
      description: self.description,
    }
  }

  pub fn into_hit(self, score: f64) -> AproposHit {
    AproposHit { manpage: self.into_manpage(), score }
  }
}

/// Raw values of a symlink's target coordinate and owning package.
pub struct RawLinkTarget {
  pub release: String,
  pub section: String,
  pub name:    String,
  pub locale:  String,
  pub package: String,
}

impl RawLinkTarget {
  pub fn into_coordinate(self) -> (Coordinate, String) {
    let target = Coordinate {
      release: self.release,
      section: Section::from(self.section),
      name:    self.name,
      locale:  decode_locale(self.locale),
    };
    (target, self.package)
  }
}
