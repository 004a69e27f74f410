//! Binary settings: `manidx.toml` layered with `MANIDX_*` environment
//! variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use manidx_core::config::ResolverConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Path to the SQLite catalog. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Deadline for a single lookup or apropos request.
  #[serde(default = "default_lookup_timeout_ms")]
  pub lookup_timeout_ms: u64,
  #[serde(default)]
  pub resolver:          ResolverConfig,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/manidx/catalog.db") }

fn default_lookup_timeout_ms() -> u64 { 5000 }

impl Settings {
  /// Load settings from `file` (which may be absent) and the environment.
  /// Nested keys use `__`, e.g. `MANIDX_RESOLVER__MAX_HOPS=8`.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("MANIDX")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }

  pub fn lookup_timeout(&self) -> Duration { Duration::from_millis(self.lookup_timeout_ms) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use manidx_core::catalog::Section;

  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(settings.lookup_timeout_ms, 5000);
    assert_eq!(settings.resolver.max_hops, 16);
    assert_eq!(settings.resolver.apropos_max_limit, 200);
    assert!(settings.store_path.ends_with("manidx/catalog.db"));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manidx.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
      file,
      r#"
store_path = "/srv/manidx/catalog.db"
lookup_timeout_ms = 250

[resolver]
max_hops = 4
section_order = ["8", "1"]
fallback_releases = ["24.04", "22.04"]
"#
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.store_path, PathBuf::from("/srv/manidx/catalog.db"));
    assert_eq!(settings.lookup_timeout(), Duration::from_millis(250));
    assert_eq!(settings.resolver.max_hops, 4);
    assert_eq!(settings.resolver.section_order, [
      Section::from("8"),
      Section::from("1"),
    ]);
    assert_eq!(settings.resolver.fallback_releases, ["24.04", "22.04"]);
    assert_eq!(settings.resolver.apropos_max_limit, 200);
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      expand_tilde(Path::new("~/catalog.db")),
      PathBuf::from(home).join("catalog.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/catalog.db")), PathBuf::from("/abs/catalog.db"));
  }
}
