//! Lookup: "the manpage for NAME in SECTION of RELEASE in LOCALE", with
//! fallback when the exact coordinate is absent.
//!
//! Candidates are tried most-specific first:
//!
//! 1. the exact coordinate;
//! 2. less specific forms of the locale, ending with the default locale;
//! 3. with no section given, every section holding `name`, in configured
//!    precedence order, each with the locale chain of steps 1–2;
//! 4. with no release given, each configured fallback release in order.
//!
//! Every candidate goes through the [`AliasResolver`]. A missing candidate
//! moves on to the next one; any other error ends the lookup.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  alias::{AliasResolver, Resolved},
  catalog::{Coordinate, Section},
  config::ResolverConfig,
  store::CatalogStore,
};

// ─── Query ───────────────────────────────────────────────────────────────────

/// A lookup request. `None` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
  pub name:    String,
  pub section: Option<Section>,
  pub release: Option<String>,
  /// `None` asks for the default (unlocalized) page directly.
  pub locale:  Option<String>,
}

impl LookupQuery {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn section(mut self, section: impl Into<Section>) -> Self {
    self.section = Some(section.into());
    self
  }

  pub fn release(mut self, release: impl Into<String>) -> Self {
    self.release = Some(release.into());
    self
  }

  pub fn locale(mut self, locale: impl Into<String>) -> Self {
    self.locale = Some(locale.into());
    self
  }

  fn describe(&self) -> String {
    let mut out = self.name.clone();
    if let Some(section) = &self.section {
      out.push_str(&format!("({section})"));
    }
    if let Some(release) = &self.release {
      out.push_str(&format!(" in {release}"));
    }
    if let Some(locale) = &self.locale {
      out.push_str(&format!(" [{locale}]"));
    }
    out
  }
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
  /// The candidate coordinate that matched.
  pub matched:  Coordinate,
  pub resolved: Resolved,
}

// ─── Locale fallback ─────────────────────────────────────────────────────────

/// Progressively less specific forms of `locale`, ending with the default
/// locale (`None`).
///
/// Follows the `language[_territory][.codeset][@modifier]` shape:
/// `pt_BR.UTF-8@euro` yields `pt_BR.UTF-8@euro`, `pt_BR.UTF-8`, `pt_BR`,
/// `pt`, then the default.
pub fn locale_chain(locale: Option<&str>) -> Vec<Option<String>> {
  let mut chain: Vec<Option<String>> = Vec::new();
  let mut push = |candidate: &str| {
    if !candidate.is_empty()
      && !chain.iter().any(|c| c.as_deref() == Some(candidate))
    {
      chain.push(Some(candidate.to_owned()));
    }
  };

  if let Some(full) = locale {
    push(full);
    let without_modifier = full.split('@').next().unwrap_or(full);
    push(without_modifier);
    let without_codeset =
      without_modifier.split('.').next().unwrap_or(without_modifier);
    push(without_codeset);
    let language = without_codeset.split('_').next().unwrap_or(without_codeset);
    push(language);
  }

  chain.push(None);
  chain
}

// ─── Section precedence ──────────────────────────────────────────────────────

/// Orders `sections` by `order`.
///
/// Sections listed in `order` come first, in list order. A section that is
/// not listed ranks right after the listed section matching its first
/// character (`3pm` after `3`), and the rest follow. Ties break
/// lexicographically, so the result is total.
pub fn order_sections(mut sections: Vec<Section>, order: &[Section]) -> Vec<Section> {
  let rank = |section: &Section| -> (usize, bool) {
    if let Some(pos) = order.iter().position(|s| s == section) {
      return (pos, false);
    }
    let lead = section.as_str().chars().next();
    match order
      .iter()
      .position(|s| s.as_str().chars().next() == lead && s.as_str().len() == 1)
    {
      Some(pos) => (pos, true),
      None => (order.len(), true),
    }
  };

  sections.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));
  sections.dedup();
  sections
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// The primary query entry point.
pub struct LookupResolver<'s, S> {
  store:  &'s S,
  config: &'s ResolverConfig,
}

impl<'s, S: CatalogStore> LookupResolver<'s, S> {
  pub fn new(store: &'s S, config: &'s ResolverConfig) -> Self {
    Self { store, config }
  }

  /// Resolve `query` to the best concrete manpage.
  pub async fn lookup(&self, query: &LookupQuery) -> Result<Resolution> {
    if query.name.trim().is_empty() {
      return Err(Error::InvalidQuery("manpage name is empty".into()));
    }

    let releases: Vec<&str> = match &query.release {
      Some(release) => vec![release.as_str()],
      None => self.config.fallback_releases.iter().map(String::as_str).collect(),
    };
    if releases.is_empty() {
      tracing::debug!(
        "lookup without a release and no fallback releases configured"
      );
    }

    let locales = locale_chain(query.locale.as_deref());

    for release in releases {
      let sections = match &query.section {
        Some(section) => vec![section.clone()],
        None => {
          let found = self
            .store
            .sections_for(release, &query.name)
            .await
            .map_err(Error::store)?;
          order_sections(found, &self.config.section_order)
        }
      };

      for section in sections {
        for locale in &locales {
          let candidate = Coordinate {
            release: release.to_owned(),
            section: section.clone(),
            name:    query.name.clone(),
            locale:  locale.clone(),
          };
          if let Some(resolution) = self.try_candidate(candidate).await? {
            return Ok(resolution);
          }
        }
      }
    }

    Err(Error::NotFound(query.describe()))
  }

  async fn try_candidate(&self, candidate: Coordinate) -> Result<Option<Resolution>> {
    let aliases = AliasResolver::new(self.store, self.config.max_hops);
    match aliases.resolve(&candidate).await {
      Ok(resolved) => {
        tracing::debug!(%candidate, hops = resolved.hops(), "lookup hit");
        Ok(Some(Resolution { matched: candidate, resolved }))
      }
      Err(Error::NotFound(_)) => {
        tracing::trace!(%candidate, "lookup miss");
        Ok(None)
      }
      Err(err) => Err(err),
    }
  }
}
