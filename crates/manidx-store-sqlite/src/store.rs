//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::{
  path::Path,
  sync::{Arc, Mutex, PoisonError},
};

use manidx_core::{
  catalog::{AproposHit, AproposQuery, Coordinate, Manpage, Page, Section, Symlink},
  store::CatalogStore,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, types::Value};

use crate::{
  Error, Result,
  dimension::{self, Dimension, DimensionCache, Interner},
  encode::{
    DEFAULT_LOCALE, RawLinkTarget, RawManpage, encode_locale, encode_locale_filter,
    fts_query, manpage_columns,
  },
  schema::{LEGACY_PRAGMAS, Layout, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A manpage catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and dimension cache are
/// reference-counted. All statements run on the connection's background
/// thread, so writes are serialized and every write transaction is
/// `IMMEDIATE`.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  layout:     Layout,
  dimensions: Arc<Mutex<DimensionCache>>,
}

impl SqliteStore {
  /// Open (or create) a catalog at `path`. Existing legacy catalogs keep
  /// their layout; anything else is brought up to the current schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory catalog, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let layout = conn
      .call(|conn| {
        let has_table = |name: &str| -> rusqlite::Result<bool> {
          conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [name],
            |row| row.get(0),
          )
        };
        let layout = Layout::detect(has_table("manpages")?, has_table("sections")?);
        match layout {
          Layout::Legacy => conn.execute_batch(LEGACY_PRAGMAS)?,
          Layout::Normalized => conn.execute_batch(SCHEMA)?,
        }
        Ok(layout)
      })
      .await?;

    if layout == Layout::Legacy {
      tracing::info!("opened legacy catalog: integer sections, no symlinks or apropos index");
    }

    Ok(Self { conn, layout, dimensions: Arc::default() })
  }

  pub fn layout(&self) -> Layout { self.layout }
}

// ─── Write helpers ───────────────────────────────────────────────────────────

/// Dimension ids of a coordinate, interned.
struct CoordinateIds {
  release: i64,
  section: i64,
  locale:  i64,
}

fn intern_coordinate(
  conn: &Connection,
  layout: Layout,
  interner: &mut Interner<'_>,
  at: &Coordinate,
) -> Result<CoordinateIds> {
  Ok(CoordinateIds {
    release: interner.intern(conn, Dimension::Release, &at.release)?,
    section: layout.sections().intern(conn, interner, &at.section)?,
    locale:  interner.intern(
      conn,
      Dimension::Locale,
      &encode_locale(at.locale.as_deref()),
    )?,
  })
}

fn write_manpage(
  conn: &mut Connection,
  layout: Layout,
  cache: &Mutex<DimensionCache>,
  entry: &Manpage,
) -> Result<()> {
  let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
  let mut interner = Interner::new(&mut cache);
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let ids = intern_coordinate(&tx, layout, &mut interner, &entry.coordinate())?;
  let package = interner.intern(&tx, Dimension::Package, &entry.package)?;

  let id: i64 = tx.query_row(
    "INSERT INTO manpages (release, section, package, name, locale, path, version)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (release, section, package, name, locale)
     DO UPDATE SET path = excluded.path, version = excluded.version
     RETURNING id",
    rusqlite::params![
      ids.release,
      ids.section,
      package,
      entry.name,
      ids.locale,
      entry.path,
      entry.version,
    ],
    |row| row.get(0),
  )?;

  if layout.has_apropos() {
    // The index entry is replaced together with its row.
    tx.execute("DELETE FROM apropos WHERE rowid = ?1", [id])?;
    if let Some(description) = entry.description.as_deref().filter(|d| !d.trim().is_empty()) {
      tx.execute(
        "INSERT INTO apropos (rowid, description) VALUES (?1, ?2)",
        rusqlite::params![id, description],
      )?;
    }
  }

  tx.commit()?;
  interner.commit();
  Ok(())
}

/// Writes `entry` and reports whether a concrete manpage already sits at its
/// source coordinate.
fn write_symlink(
  conn: &mut Connection,
  layout: Layout,
  cache: &Mutex<DimensionCache>,
  entry: &Symlink,
) -> Result<bool> {
  let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
  let mut interner = Interner::new(&mut cache);
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let source = intern_coordinate(&tx, layout, &mut interner, &entry.source)?;
  let target = intern_coordinate(&tx, layout, &mut interner, &entry.target)?;
  let package = interner.intern(&tx, Dimension::Package, &entry.package)?;

  tx.execute(
    "INSERT INTO symlinks (
       release, section, name, locale,
       target_release, target_section, target_name, target_locale, package
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT (release, section, name, locale) DO UPDATE SET
       target_release = excluded.target_release,
       target_section = excluded.target_section,
       target_name    = excluded.target_name,
       target_locale  = excluded.target_locale,
       package        = excluded.package",
    rusqlite::params![
      source.release,
      source.section,
      entry.source.name,
      source.locale,
      target.release,
      target.section,
      entry.target.name,
      target.locale,
      package,
    ],
  )?;

  let shadowed: bool = tx.query_row(
    "SELECT EXISTS (
       SELECT 1 FROM manpages
       WHERE release = ?1 AND section = ?2 AND name = ?3 AND locale = ?4
     )",
    rusqlite::params![source.release, source.section, entry.source.name, source.locale],
    |row| row.get(0),
  )?;

  tx.commit()?;
  interner.commit();
  Ok(shadowed)
}

fn delete_package(
  conn: &mut Connection,
  layout: Layout,
  release: &str,
  package: &str,
) -> Result<usize> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let ids: Option<(i64, i64)> = tx
    .query_row(
      "SELECT r.id, p.id FROM releases r, packages p WHERE r.name = ?1 AND p.name = ?2",
      [release, package],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;
  let Some((release_id, package_id)) = ids else {
    return Ok(0);
  };

  if layout.has_apropos() {
    tx.execute(
      "DELETE FROM apropos WHERE rowid IN (
         SELECT id FROM manpages WHERE release = ?1 AND package = ?2
       )",
      [release_id, package_id],
    )?;
  }
  let mut removed = tx.execute(
    "DELETE FROM manpages WHERE release = ?1 AND package = ?2",
    [release_id, package_id],
  )?;
  if layout.has_symlinks() {
    removed += tx.execute(
      "DELETE FROM symlinks WHERE release = ?1 AND package = ?2",
      [release_id, package_id],
    )?;
  }

  tx.commit()?;
  Ok(removed)
}

// ─── Apropos statement ───────────────────────────────────────────────────────

/// Stored keys an apropos request is narrowed to. `None` leaves that
/// dimension unrestricted.
#[derive(Debug, Default)]
pub(crate) struct AproposFilters {
  pub(crate) release: Option<i64>,
  pub(crate) section: Option<Value>,
  pub(crate) locale:  Option<i64>,
}

impl AproposFilters {
  /// Stored keys for the given filters, or `None` when one of them names a
  /// release, section or locale the catalog has never seen.
  fn resolve(
    conn: &Connection,
    layout: Layout,
    release: Option<&str>,
    section: Option<&Section>,
    locale: Option<&str>,
  ) -> rusqlite::Result<Option<Self>> {
    let mut filters = Self::default();
    if let Some(release) = release {
      let Some(id) = dimension::find(conn, Dimension::Release, release)? else {
        return Ok(None);
      };
      filters.release = Some(id);
    }
    if let Some(section) = section {
      let Some(key) = layout.sections().find(conn, section)? else {
        return Ok(None);
      };
      filters.section = Some(key);
    }
    if let Some(locale) = locale {
      let Some(id) = dimension::find(conn, Dimension::Locale, locale)? else {
        return Ok(None);
      };
      filters.locale = Some(id);
    }
    Ok(Some(filters))
  }

  /// Equality conditions on `m` for the filters that are set, so each one
  /// can drive an index search.
  fn conditions(&self) -> (Vec<&'static str>, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();
    if let Some(id) = self.release {
      conditions.push("m.release = ?");
      values.push(Value::Integer(id));
    }
    if let Some(key) = &self.section {
      conditions.push("m.section = ?");
      values.push(key.clone());
    }
    if let Some(id) = self.locale {
      conditions.push("m.locale = ?");
      values.push(Value::Integer(id));
    }
    (conditions, values)
  }
}

/// SQL and positional values for one page of apropos results: ranked by
/// `bm25` when `matcher` is set, otherwise a zero-score listing. Ties fall
/// back to the stable key, with the default locale before named ones.
pub(crate) fn apropos_statement(
  layout: Layout,
  matcher: Option<String>,
  filters: &AproposFilters,
  page: Page,
) -> (String, Vec<Value>) {
  let sections = layout.sections();
  let label = sections.label("m", "section");
  let (filter_conditions, filter_values) = filters.conditions();

  let mut conditions = Vec::new();
  let mut values = Vec::new();
  let (select, from) = match matcher {
    Some(matcher) => {
      conditions.push("apropos MATCH ?");
      values.push(Value::Text(matcher));
      (
        format!(
          "{}, -bm25(apropos) AS score",
          manpage_columns(&label, "apropos.description")
        ),
        "apropos JOIN manpages m ON m.id = apropos.rowid",
      )
    }
    None => (
      format!("{}, 0.0 AS score", manpage_columns(&label, layout.description_sql())),
      "manpages m",
    ),
  };
  conditions.extend(filter_conditions);
  values.extend(filter_values);
  values.push(Value::Integer(i64::try_from(page.limit).unwrap_or(i64::MAX)));
  values.push(Value::Integer(i64::try_from(page.offset).unwrap_or(i64::MAX)));

  let where_clause = if conditions.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conditions.join(" AND "))
  };

  let sql = format!(
    "SELECT {select}
     FROM {from}
     JOIN releases r ON r.id = m.release
     JOIN packages p ON p.id = m.package
     JOIN locales  l ON l.id = m.locale
     {section_join}
     {where_clause}
     ORDER BY score DESC, m.name, {label}, r.name,
              l.name <> '{DEFAULT_LOCALE}', l.name, p.name
     LIMIT ? OFFSET ?",
    section_join = sections.join("m", "section"),
  );
  (sql, values)
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_manpage(&self, at: &Coordinate) -> Result<Option<Manpage>> {
    let layout = self.layout;
    let at = at.clone();
    let sections = layout.sections();
    let sql = format!(
      "SELECT {columns}
       FROM manpages m
       JOIN releases r ON r.id = m.release
       JOIN packages p ON p.id = m.package
       JOIN locales  l ON l.id = m.locale
       {section_join}
       WHERE r.name = ?1 AND m.section = ?2 AND m.name = ?3 AND l.name = ?4
       ORDER BY p.name
       LIMIT 1",
      columns = manpage_columns(&sections.label("m", "section"), layout.description_sql()),
      section_join = sections.join("m", "section"),
    );

    let raw: Option<RawManpage> = self
      .conn
      .call(move |conn| {
        let Some(section) = layout.sections().find(conn, &at.section)? else {
          return Ok(None);
        };
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![
                at.release,
                section,
                at.name,
                encode_locale(at.locale.as_deref()),
              ],
              RawManpage::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawManpage::into_manpage))
  }

  async fn get_symlink(&self, at: &Coordinate) -> Result<Option<Symlink>> {
    if !self.layout.has_symlinks() {
      return Ok(None);
    }
    let source = at.clone();
    let lookup = at.clone();

    let raw: Option<RawLinkTarget> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT tr.name, ts.section, s.target_name, tl.name, p.name
               FROM symlinks s
               JOIN releases r  ON r.id  = s.release
               JOIN sections sc ON sc.id = s.section
               JOIN locales  l  ON l.id  = s.locale
               JOIN releases tr ON tr.id = s.target_release
               JOIN sections ts ON ts.id = s.target_section
               JOIN locales  tl ON tl.id = s.target_locale
               JOIN packages p  ON p.id  = s.package
               WHERE r.name = ?1 AND sc.section = ?2 AND s.name = ?3 AND l.name = ?4",
              rusqlite::params![
                lookup.release,
                lookup.section.as_str(),
                lookup.name,
                encode_locale(lookup.locale.as_deref()),
              ],
              |row| {
                Ok(RawLinkTarget {
                  release: row.get(0)?,
                  section: row.get(1)?,
                  name:    row.get(2)?,
                  locale:  row.get(3)?,
                  package: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(|raw| {
      let (target, package) = raw.into_coordinate();
      Symlink { source, target, package }
    }))
  }

  async fn sections_for(&self, release: &str, name: &str) -> Result<Vec<Section>> {
    let layout = self.layout;
    let sections = layout.sections();
    let mut sql = format!(
      "SELECT {label}
       FROM manpages m
       JOIN releases r ON r.id = m.release
       {section_join}
       WHERE r.name = ?1 AND m.name = ?2",
      label = sections.label("m", "section"),
      section_join = sections.join("m", "section"),
    );
    if layout.has_symlinks() {
      sql.push_str(
        "
       UNION
       SELECT sc.section
       FROM symlinks s
       JOIN releases r  ON r.id  = s.release
       JOIN sections sc ON sc.id = s.section
       WHERE r.name = ?1 AND s.name = ?2",
      );
    }
    let (release, name) = (release.to_owned(), name.to_owned());

    let labels: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![release, name], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(labels.into_iter().map(Section::from).collect())
  }

  async fn search_apropos(
    &self,
    query: &AproposQuery,
    page: Page,
  ) -> Result<Vec<AproposHit>> {
    let layout = self.layout;
    let matcher = fts_query(&query.text);
    if matcher.is_some() && !layout.has_apropos() {
      return Err(Error::Unsupported("full-text apropos search"));
    }

    let release = query.release.clone();
    let section = query.section.clone();
    let locale = encode_locale_filter(&query.locale);

    let rows: Vec<(RawManpage, f64)> = self
      .conn
      .call(move |conn| {
        let Some(filters) = AproposFilters::resolve(
          conn,
          layout,
          release.as_deref(),
          section.as_ref(),
          locale.as_deref(),
        )?
        else {
          return Ok(Vec::new());
        };

        let (sql, values) = apropos_statement(layout, matcher, &filters, page);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), |row| {
            Ok((RawManpage::from_row(row)?, row.get(8)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|(raw, score)| raw.into_hit(score)).collect())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert_manpage(&self, entry: Manpage) -> Result<()> {
    if let Some(field) = entry.missing_field() {
      return Err(Error::InvalidManpage(field));
    }
    if entry.description.is_some() && !self.layout.has_apropos() {
      tracing::warn!(
        manpage = %entry.coordinate(),
        "legacy catalog has no apropos index; description dropped"
      );
    }

    let layout = self.layout;
    let dimensions = Arc::clone(&self.dimensions);
    self
      .conn
      .call(move |conn| Ok(write_manpage(conn, layout, &dimensions, &entry)))
      .await??;
    Ok(())
  }

  async fn upsert_symlink(&self, entry: Symlink) -> Result<()> {
    if !self.layout.has_symlinks() {
      return Err(Error::Unsupported("symlinks"));
    }
    if let Some(field) = entry.missing_field() {
      return Err(Error::InvalidSymlink(field));
    }

    let layout = self.layout;
    let dimensions = Arc::clone(&self.dimensions);
    let source = entry.source.clone();
    let shadowed = self
      .conn
      .call(move |conn| Ok(write_symlink(conn, layout, &dimensions, &entry)))
      .await??;

    if shadowed {
      tracing::warn!(
        at = %source,
        "symlink source already has a concrete manpage; the manpage wins"
      );
    }
    Ok(())
  }

  async fn remove_package(&self, release: &str, package: &str) -> Result<usize> {
    let layout = self.layout;
    let (release, package) = (release.to_owned(), package.to_owned());
    let removed = self
      .conn
      .call(move |conn| Ok(delete_package(conn, layout, &release, &package)))
      .await??;

    tracing::debug!(removed, "package removed from catalog");
    Ok(removed)
  }
}
