//! Resolver configuration.

use serde::Deserialize;

use crate::catalog::Section;

/// Conventional man(1) search order.
pub const DEFAULT_SECTION_ORDER: &[&str] =
  &["1", "n", "l", "8", "3", "2", "5", "4", "9", "6", "7"];

/// Tunables shared by the resolvers. Every field has a default, so an empty
/// config table is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
  /// Maximum symlink hops followed before giving up with `ChainTooLong`.
  pub max_hops:          usize,
  /// Section precedence for lookups that leave the section unspecified.
  pub section_order:     Vec<Section>,
  /// Releases tried, in order, for lookups that leave the release
  /// unspecified.
  pub fallback_releases: Vec<String>,
  /// Upper bound on the page size of a single apropos request.
  pub apropos_max_limit: usize,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self {
      max_hops:          16,
      section_order:     DEFAULT_SECTION_ORDER
        .iter()
        .copied()
        .map(Section::from)
        .collect(),
      fallback_releases: Vec::new(),
      apropos_max_limit: 200,
    }
  }
}
