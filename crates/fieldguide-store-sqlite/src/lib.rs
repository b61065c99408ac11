use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fieldguide_core::{Chapter, ChapterSection, GlossaryTerm, Interactive, Slug};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const LATEST_SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA_MIGRATIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL
);
";

const MIGRATION_001_SQL: &str = r"
CREATE TABLE IF NOT EXISTS interactives (
  slug TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  template TEXT NOT NULL,
  is_interactive INTEGER NOT NULL CHECK (is_interactive IN (0, 1))
);

CREATE TABLE IF NOT EXISTS glossary_terms (
  slug TEXT PRIMARY KEY,
  term TEXT NOT NULL,
  definition TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
  slug TEXT PRIMARY KEY,
  number INTEGER NOT NULL UNIQUE CHECK (number >= 1),
  name TEXT NOT NULL,
  content TEXT NOT NULL,
  icon TEXT NOT NULL,
  video TEXT
);

CREATE TABLE IF NOT EXISTS chapter_sections (
  chapter_slug TEXT NOT NULL,
  slug TEXT NOT NULL,
  number INTEGER NOT NULL CHECK (number >= 1),
  name TEXT NOT NULL,
  content TEXT NOT NULL,
  PRIMARY KEY (chapter_slug, slug),
  UNIQUE (chapter_slug, number),
  FOREIGN KEY (chapter_slug) REFERENCES chapters(slug) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS chapter_interactives (
  chapter_slug TEXT NOT NULL,
  interactive_slug TEXT NOT NULL,
  PRIMARY KEY (chapter_slug, interactive_slug),
  FOREIGN KEY (chapter_slug) REFERENCES chapters(slug) ON DELETE CASCADE,
  FOREIGN KEY (interactive_slug) REFERENCES interactives(slug)
);

CREATE INDEX IF NOT EXISTS idx_chapter_interactives_interactive
  ON chapter_interactives(interactive_slug);
";

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_001_SQL)];

/// SQLite-backed content database.
pub struct SqliteStore {
    conn: Connection,
}

/// Write handle over one open import transaction.
///
/// Dropping the writer without [`SqliteStore::import`] committing it rolls
/// every write back.
pub struct ContentWriter<'conn> {
    tx: Transaction<'conn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaStatus {
    pub current_version: i64,
    pub target_version: i64,
    pub pending_versions: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: i64,
    pub parent: String,
    pub fk_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrityReport {
    pub quick_check_ok: bool,
    pub quick_check_message: String,
    pub foreign_key_violations: Vec<ForeignKeyViolation>,
    pub schema_status: SchemaStatus,
}

impl SqliteStore {
    /// Open a SQLite content database and configure required runtime pragmas.
    ///
    /// # Errors
    /// Returns an error when the database cannot be opened or pragmas cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to configure sqlite pragmas")?;

        Ok(Self { conn })
    }

    /// Report current and target schema versions plus pending migrations.
    ///
    /// # Errors
    /// Returns an error when schema metadata cannot be read or initialized.
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        self.conn
            .execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)
            .context("failed to apply schema_migrations table")?;
        let current_version = current_schema_version(&self.conn)?;
        let pending_versions = MIGRATIONS
            .iter()
            .map(|(version, _)| *version)
            .filter(|version| *version > current_version)
            .collect();

        Ok(SchemaStatus { current_version, target_version: LATEST_SCHEMA_VERSION, pending_versions })
    }

    /// Apply all forward migrations up to the latest supported schema version.
    ///
    /// # Errors
    /// Returns an error when the database is newer than this build or a migration fails.
    pub fn migrate(&mut self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)
            .context("failed to apply schema_migrations table")?;

        let current = current_schema_version(&self.conn)?;
        if current > LATEST_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported schema version {current}; expected at most {LATEST_SCHEMA_VERSION}"
            ));
        }

        for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            let tx = self
                .conn
                .transaction()
                .with_context(|| format!("failed to start migration v{version} transaction"))?;
            tx.execute_batch(sql).with_context(|| format!("failed to apply migration v{version}"))?;
            record_schema_version(&tx, *version)?;
            tx.commit().with_context(|| format!("failed to commit migration v{version}"))?;
            tracing::info!(version, "applied content schema migration");
        }

        Ok(())
    }

    /// Run `load` inside one transaction, committing only when it succeeds.
    ///
    /// Pending migrations are applied first.
    ///
    /// # Errors
    /// Returns the error of `load` (after rolling back), or a store error when
    /// migration, transaction start or commit fails.
    pub fn import<T, E>(
        &mut self,
        load: impl FnOnce(&ContentWriter<'_>) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        self.migrate()?;
        let tx = self.conn.transaction().context("failed to start import transaction")?;
        let writer = ContentWriter { tx };
        let value = load(&writer)?;
        writer.tx.commit().context("failed to commit import transaction")?;
        Ok(value)
    }

    /// All chapters ordered by number.
    ///
    /// # Errors
    /// Returns an error when rows cannot be read or decoded.
    pub fn list_chapters(&self) -> Result<Vec<Chapter>> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, number, name, content, icon, video
             FROM chapters
             ORDER BY number ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut chapters = Vec::new();
        while let Some(row) = rows.next()? {
            chapters.push(chapter_from_row(row)?);
        }
        Ok(chapters)
    }

    /// # Errors
    /// Returns an error when the lookup fails or the row cannot be decoded.
    pub fn get_chapter(&self, slug: &Slug) -> Result<Option<Chapter>> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, number, name, content, icon, video FROM chapters WHERE slug = ?1",
        )?;
        let mut rows = stmt.query(params![slug.as_str()])?;
        let chapter = match rows.next()? {
            Some(row) => Some(chapter_from_row(row)?),
            None => None,
        };
        Ok(chapter)
    }

    /// Sections of one chapter ordered by section number.
    ///
    /// # Errors
    /// Returns an error when rows cannot be read or decoded.
    pub fn list_sections(&self, chapter: &Slug) -> Result<Vec<ChapterSection>> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, number, name, content
             FROM chapter_sections
             WHERE chapter_slug = ?1
             ORDER BY number ASC",
        )?;
        let mut rows = stmt.query(params![chapter.as_str()])?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next()? {
            sections.push(ChapterSection {
                slug: parse_slug(&row.get::<_, String>(0)?)?,
                number: row.get(1)?,
                name: row.get(2)?,
                content: row.get(3)?,
            });
        }
        Ok(sections)
    }

    /// Interactives associated with one chapter, ordered by slug.
    ///
    /// # Errors
    /// Returns an error when rows cannot be read or decoded.
    pub fn chapter_interactives(&self, chapter: &Slug) -> Result<Vec<Interactive>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.slug, i.name, i.template, i.is_interactive
             FROM chapter_interactives ci
             JOIN interactives i ON i.slug = ci.interactive_slug
             WHERE ci.chapter_slug = ?1
             ORDER BY i.slug ASC",
        )?;
        let mut rows = stmt.query(params![chapter.as_str()])?;
        let mut interactives = Vec::new();
        while let Some(row) = rows.next()? {
            interactives.push(interactive_from_row(row)?);
        }
        Ok(interactives)
    }

    /// # Errors
    /// Returns an error when rows cannot be read or decoded.
    pub fn list_interactives(&self) -> Result<Vec<Interactive>> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, name, template, is_interactive FROM interactives ORDER BY slug ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut interactives = Vec::new();
        while let Some(row) = rows.next()? {
            interactives.push(interactive_from_row(row)?);
        }
        Ok(interactives)
    }

    /// # Errors
    /// Returns an error when the lookup fails or the row cannot be decoded.
    pub fn get_interactive(&self, slug: &Slug) -> Result<Option<Interactive>> {
        find_interactive(&self.conn, slug)
    }

    /// # Errors
    /// Returns an error when rows cannot be read or decoded.
    pub fn list_glossary_terms(&self) -> Result<Vec<GlossaryTerm>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slug, term, definition FROM glossary_terms ORDER BY slug ASC")?;
        let mut rows = stmt.query([])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(GlossaryTerm {
                slug: parse_slug(&row.get::<_, String>(0)?)?,
                term: row.get(1)?,
                definition: row.get(2)?,
            });
        }
        Ok(terms)
    }

    /// Run quick-check, foreign-key-check, and schema status health probes.
    ///
    /// # Errors
    /// Returns an error when any integrity probe query fails.
    pub fn integrity_check(&self) -> Result<IntegrityReport> {
        let quick_check_message: String = self
            .conn
            .query_row("PRAGMA quick_check", [], |row| row.get::<_, String>(0))
            .context("failed to run PRAGMA quick_check")?;

        let mut stmt = self
            .conn
            .prepare("PRAGMA foreign_key_check")
            .context("failed to prepare PRAGMA foreign_key_check")?;
        let rows = stmt.query_map([], |row| {
            Ok(ForeignKeyViolation {
                table: row.get(0)?,
                rowid: row.get(1)?,
                parent: row.get(2)?,
                fk_index: row.get(3)?,
            })
        })?;

        let mut foreign_key_violations = Vec::new();
        for row in rows {
            foreign_key_violations.push(row?);
        }

        let schema_status = self.schema_status()?;
        Ok(IntegrityReport {
            quick_check_ok: quick_check_message == "ok",
            quick_check_message,
            foreign_key_violations,
            schema_status,
        })
    }
}

impl ContentWriter<'_> {
    /// Insert or update an interactive by slug.
    ///
    /// # Errors
    /// Returns an error when the write fails.
    pub fn upsert_interactive(&self, interactive: &Interactive) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO interactives(slug, name, template, is_interactive)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(slug) DO UPDATE SET
                   name = excluded.name,
                   template = excluded.template,
                   is_interactive = excluded.is_interactive",
                params![
                    interactive.slug.as_str(),
                    interactive.name,
                    interactive.template,
                    interactive.is_interactive,
                ],
            )
            .with_context(|| format!("failed to upsert interactive {}", interactive.slug))?;
        Ok(())
    }

    /// Look up an interactive, including ones written earlier in this transaction.
    ///
    /// # Errors
    /// Returns an error when the lookup fails or the row cannot be decoded.
    pub fn find_interactive(&self, slug: &Slug) -> Result<Option<Interactive>> {
        find_interactive(&self.tx, slug)
    }

    /// Insert or update a glossary term by slug.
    ///
    /// # Errors
    /// Returns an error when the write fails.
    pub fn upsert_glossary_term(&self, term: &GlossaryTerm) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO glossary_terms(slug, term, definition)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(slug) DO UPDATE SET
                   term = excluded.term,
                   definition = excluded.definition",
                params![term.slug.as_str(), term.term, term.definition],
            )
            .with_context(|| format!("failed to upsert glossary term {}", term.slug))?;
        Ok(())
    }

    /// Insert or update a chapter by slug. Chapter numbers are unique.
    ///
    /// An existing chapter keeps its import position but loses its sections
    /// and interactive associations, which the caller writes again.
    ///
    /// # Errors
    /// Returns an error when another chapter already has this number or any
    /// write fails.
    pub fn upsert_chapter(&self, chapter: &Chapter) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO chapters(slug, number, name, content, icon, video)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(slug) DO UPDATE SET
                   number = excluded.number,
                   name = excluded.name,
                   content = excluded.content,
                   icon = excluded.icon,
                   video = excluded.video",
                params![
                    chapter.slug.as_str(),
                    chapter.number,
                    chapter.name,
                    chapter.content,
                    chapter.icon,
                    chapter.video,
                ],
            )
            .with_context(|| {
                format!(
                    "failed to upsert chapter {} (chapter number {} must be unused)",
                    chapter.slug, chapter.number
                )
            })?;

        self.tx
            .execute(
                "DELETE FROM chapter_sections WHERE chapter_slug = ?1",
                params![chapter.slug.as_str()],
            )
            .with_context(|| format!("failed to clear sections of chapter {}", chapter.slug))?;
        self.tx
            .execute(
                "DELETE FROM chapter_interactives WHERE chapter_slug = ?1",
                params![chapter.slug.as_str()],
            )
            .with_context(|| {
                format!("failed to clear interactives of chapter {}", chapter.slug)
            })?;
        Ok(())
    }

    /// # Errors
    /// Returns an error when the chapter does not exist, the section slug or
    /// number is already used in the chapter, or the write fails.
    pub fn insert_section(&self, chapter: &Slug, section: &ChapterSection) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO chapter_sections(chapter_slug, slug, number, name, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    chapter.as_str(),
                    section.slug.as_str(),
                    section.number,
                    section.name,
                    section.content,
                ],
            )
            .with_context(|| format!("failed to insert section {chapter}/{}", section.slug))?;
        Ok(())
    }

    /// Associate an existing interactive with a chapter.
    ///
    /// Returns `false` when the association already existed.
    ///
    /// # Errors
    /// Returns an error when either side does not exist or the write fails.
    pub fn associate_interactive(&self, chapter: &Slug, interactive: &Slug) -> Result<bool> {
        let inserted = self
            .tx
            .execute(
                "INSERT OR IGNORE INTO chapter_interactives(chapter_slug, interactive_slug)
                 VALUES (?1, ?2)",
                params![chapter.as_str(), interactive.as_str()],
            )
            .with_context(|| {
                format!("failed to associate interactive {interactive} with chapter {chapter}")
            })?;
        Ok(inserted == 1)
    }
}

fn find_interactive(conn: &Connection, slug: &Slug) -> Result<Option<Interactive>> {
    let mut stmt = conn.prepare(
        "SELECT slug, name, template, is_interactive FROM interactives WHERE slug = ?1",
    )?;
    let row = stmt
        .query_row(params![slug.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })
        .optional()
        .with_context(|| format!("failed to look up interactive {slug}"))?;

    row.map(|(slug, name, template, is_interactive)| -> Result<Interactive> {
        Ok(Interactive { slug: parse_slug(&slug)?, name, template, is_interactive })
    })
    .transpose()
}

fn chapter_from_row(row: &rusqlite::Row<'_>) -> Result<Chapter> {
    Ok(Chapter {
        slug: parse_slug(&row.get::<_, String>(0)?)?,
        number: row.get(1)?,
        name: row.get(2)?,
        content: row.get(3)?,
        icon: row.get(4)?,
        video: row.get(5)?,
    })
}

fn interactive_from_row(row: &rusqlite::Row<'_>) -> Result<Interactive> {
    Ok(Interactive {
        slug: parse_slug(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        template: row.get(2)?,
        is_interactive: row.get(3)?,
    })
}

fn parse_slug(raw: &str) -> Result<Slug> {
    Slug::parse(raw).with_context(|| format!("invalid slug stored in database: {raw}"))
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    let version = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
            row.get::<_, i64>(0)
        })
        .context("failed to read current schema version")?;
    Ok(version)
}

fn record_schema_version(conn: &Connection, version: i64) -> Result<()> {
    let now = now_rfc3339()?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
        params![version, now],
    )
    .with_context(|| format!("failed to record migration version {version}"))?;
    Ok(())
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .context("failed to format RFC3339 timestamp")
}
