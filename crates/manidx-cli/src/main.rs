//! `manidx`: query and maintain a manpage catalog.
//!
//! # Usage
//!
//! ```
//! manidx lookup dir -s 1 -r 22.04 -l en_US.UTF-8
//! manidx apropos list directory -s 1 --limit 10
//! manidx import records.jsonl
//! manidx remove 22.04 coreutils
//! ```
//!
//! Settings come from `manidx.toml` (or `--config`) and `MANIDX_*`
//! environment variables.

mod import;
mod output;
mod settings;

use std::{future::Future, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use manidx_core::{
  Error,
  apropos::AproposSearch,
  catalog::{AproposQuery, LocaleFilter, Page, Section},
  lookup::{LookupQuery, LookupResolver},
  store::CatalogStore as _,
};
use manidx_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Conventional exit status of man(1) when no page matches.
const EXIT_NOT_FOUND: u8 = 16;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "manidx", author, version, about = "Manpage catalog resolver")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "manidx.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Resolve a name to one concrete manpage, following symlinks.
  Lookup(LookupArgs),
  /// Search manpage descriptions.
  Apropos(AproposArgs),
  /// Load manpage and symlink records from a JSON Lines file.
  Import {
    file: PathBuf,
  },
  /// Remove everything a package installed in a release.
  Remove {
    release: String,
    package: String,
  },
}

#[derive(Args, Debug)]
struct LookupArgs {
  name: String,

  #[arg(short, long)]
  section: Option<String>,

  #[arg(short, long)]
  release: Option<String>,

  /// Preferred locale, e.g. `pt_BR.UTF-8`. Falls back to the unlocalized
  /// page.
  #[arg(short, long)]
  locale: Option<String>,

  #[arg(long)]
  json: bool,
}

#[derive(Args, Debug)]
struct AproposArgs {
  words: Vec<String>,

  #[arg(short, long)]
  section: Option<String>,

  #[arg(short, long)]
  release: Option<String>,

  /// Only pages in this locale.
  #[arg(short, long, conflicts_with = "default_locale")]
  locale: Option<String>,

  /// Only unlocalized pages.
  #[arg(long)]
  default_locale: bool,

  #[arg(long, default_value_t = Page::default().limit)]
  limit: usize,

  #[arg(long, default_value_t = 0)]
  offset: usize,

  #[arg(long)]
  json: bool,
}

impl LookupArgs {
  fn query(&self) -> LookupQuery {
    LookupQuery {
      name:    self.name.clone(),
      section: self.section.as_deref().map(Section::from),
      release: self.release.clone(),
      locale:  self.locale.clone(),
    }
  }
}

impl AproposArgs {
  fn query(&self) -> AproposQuery {
    let locale = match (&self.locale, self.default_locale) {
      (Some(locale), _) => LocaleFilter::Named(locale.clone()),
      (None, true) => LocaleFilter::Default,
      (None, false) => LocaleFilter::Any,
    };
    AproposQuery {
      text: self.words.join(" "),
      release: self.release.clone(),
      section: self.section.as_deref().map(Section::from),
      locale,
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  if let Some(parent) = settings.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open catalog at {:?}", settings.store_path))?;

  match cli.command {
    Command::Lookup(args) => lookup(&store, &settings, &args).await,
    Command::Apropos(args) => apropos(&store, &settings, &args).await,
    Command::Import { file } => {
      let summary = import::import_file(&store, &file).await?;
      println!(
        "{} manpages, {} symlinks imported; {} rejected",
        summary.manpages, summary.symlinks, summary.rejected
      );
      Ok(ExitCode::SUCCESS)
    }
    Command::Remove { release, package } => {
      let removed = store
        .remove_package(&release, &package)
        .await
        .with_context(|| format!("failed to remove {package} from {release}"))?;
      println!("{removed} entries removed");
      Ok(ExitCode::SUCCESS)
    }
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn lookup(
  store: &SqliteStore,
  settings: &Settings,
  args: &LookupArgs,
) -> anyhow::Result<ExitCode> {
  let resolver = LookupResolver::new(store, &settings.resolver);
  let result = within(settings.lookup_timeout(), resolver.lookup(&args.query())).await?;

  match result {
    Ok(found) => {
      if args.json {
        println!("{}", output::lookup_json(&found)?);
      } else {
        println!("{}", output::lookup_text(&found));
      }
      Ok(ExitCode::SUCCESS)
    }
    Err(Error::NotFound(_)) => {
      match &args.section {
        Some(section) => eprintln!("No manual entry for {} in section {section}", args.name),
        None => eprintln!("No manual entry for {}", args.name),
      }
      Ok(ExitCode::from(EXIT_NOT_FOUND))
    }
    Err(err) => Err(err).context("lookup failed"),
  }
}

async fn apropos(
  store: &SqliteStore,
  settings: &Settings,
  args: &AproposArgs,
) -> anyhow::Result<ExitCode> {
  let search = AproposSearch::new(store, &settings.resolver);
  let page = Page { limit: args.limit, offset: args.offset };
  let hits = within(settings.lookup_timeout(), search.search(&args.query(), page))
    .await?
    .context("apropos failed")?;

  if hits.is_empty() && !args.json {
    eprintln!("{}: nothing appropriate.", args.words.join(" "));
    return Ok(ExitCode::from(EXIT_NOT_FOUND));
  }
  if args.json {
    println!("{}", output::apropos_json(&hits)?);
  } else {
    println!("{}", output::apropos_text(&hits));
  }
  Ok(ExitCode::SUCCESS)
}

/// Run `work` under the configured request deadline.
async fn within<F: Future>(deadline: Duration, work: F) -> anyhow::Result<F::Output> {
  tokio::time::timeout(deadline, work)
    .await
    .with_context(|| format!("no answer within {} ms", deadline.as_millis()))
}
