//! `manidx import`: load pre-extracted catalog records from JSON Lines.
//!
//! Each non-blank line is one record:
//!
//! ```text
//! {"kind":"manpage","release":"22.04","section":"1","package":"coreutils","name":"ls","locale":null,"path":"…","version":"8.32","description":"list directory contents"}
//! {"kind":"symlink","source":{…},"target":{…},"package":"coreutils"}
//! ```

use std::path::Path;

use anyhow::Context as _;
use manidx_core::{
  catalog::{Manpage, Symlink},
  store::CatalogStore,
};
use manidx_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, BufReader};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
  Manpage(Manpage),
  Symlink(Symlink),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
  pub manpages: usize,
  pub symlinks: usize,
  pub rejected: usize,
}

pub async fn import_file(store: &SqliteStore, path: &Path) -> anyhow::Result<Summary> {
  let file = tokio::fs::File::open(path)
    .await
    .with_context(|| format!("failed to open {}", path.display()))?;
  let summary = import_lines(store, BufReader::new(file)).await?;

  tracing::info!(
    manpages = summary.manpages,
    symlinks = summary.symlinks,
    rejected = summary.rejected,
    "imported {}",
    path.display()
  );
  Ok(summary)
}

/// Apply every record from `reader`. Malformed JSON and store failures abort
/// the run; records the catalog cannot hold are logged and skipped.
pub async fn import_lines<R>(store: &SqliteStore, reader: R) -> anyhow::Result<Summary>
where
  R: AsyncBufRead + Unpin,
{
  let mut summary = Summary::default();
  let mut lines = reader.lines();
  let mut number = 0;

  while let Some(line) = lines.next_line().await.context("failed to read input")? {
    number += 1;
    if line.trim().is_empty() {
      continue;
    }

    let record: Record = serde_json::from_str(&line)
      .with_context(|| format!("line {number}: malformed record"))?;

    let result = match record {
      Record::Manpage(entry) => store
        .upsert_manpage(entry)
        .await
        .map(|()| summary.manpages += 1),
      Record::Symlink(entry) => store
        .upsert_symlink(entry)
        .await
        .map(|()| summary.symlinks += 1),
    };

    match result {
      Ok(()) => {}
      Err(err) if err.is_rejection() => {
        tracing::warn!(line = number, "skipping record: {err}");
        summary.rejected += 1;
      }
      Err(err) => return Err(err).with_context(|| format!("line {number}")),
    }
  }

  Ok(summary)
}

#[cfg(test)]
mod tests {
  use manidx_core::catalog::Coordinate;

  use super::*;

  const INPUT: &str = r#"
{"kind":"manpage","release":"22.04","section":"1","package":"coreutils","name":"ls","locale":"en","path":"en/man1/ls.1.gz","version":"8.32","description":"list directory contents"}
{"kind":"symlink","source":{"release":"22.04","section":"1","name":"dir","locale":"en"},"target":{"release":"22.04","section":"1","name":"ls","locale":"en"},"package":"coreutils"}

{"kind":"manpage","release":"22.04","section":"1","package":"coreutils","name":"broken","path":"","version":"8.32"}
{"kind":"symlink","source":{"release":"22.04","section":"1","name":""},"target":{"release":"22.04","section":"1","name":"ls"},"package":"coreutils"}
{"kind":"manpage","release":"22.04","section":"8","package":"util-linux","name":"lsblk","path":"man8/lsblk.8.gz","version":"2.37"}
"#;

  #[tokio::test]
  async fn imports_records_and_skips_rejections() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let summary = import_lines(&store, INPUT.as_bytes()).await.unwrap();

    assert_eq!(summary, Summary { manpages: 2, symlinks: 1, rejected: 2 });

    let link = store
      .get_symlink(&Coordinate::new("22.04", "1", "dir", Some("en")))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(link.target.name, "ls");

    let lsblk = store
      .get_manpage(&Coordinate::new("22.04", "8", "lsblk", None))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(lsblk.package, "util-linux");
    assert_eq!(lsblk.description, None);
  }

  #[tokio::test]
  async fn malformed_line_aborts_with_its_number() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let input = "\n{\"kind\":\"page\"}\n";

    let err = import_lines(&store, input.as_bytes()).await.unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");
  }
}
