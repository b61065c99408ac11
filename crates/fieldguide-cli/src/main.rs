use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldguide_core::Slug;
use fieldguide_loaders::{load_course, run, LoaderFactory};
use fieldguide_store_sqlite::SqliteStore;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

#[derive(Debug, Parser)]
#[command(name = "fieldguide")]
#[command(about = "Field Guide content importer")]
struct Cli {
    #[arg(long, default_value = "./fieldguide.sqlite3")]
    db: PathBuf,

    /// Log filter used when `RUST_LOG` is not set. Logs go to stderr.
    #[arg(long, value_enum, default_value_t = LogLevelArg::Warn)]
    log_level: LogLevelArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    Load {
        #[command(subcommand)]
        command: LoadCommand,
    },
    Content {
        #[command(subcommand)]
        command: ContentCommand,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    SchemaVersion,
    Migrate(DbMigrateArgs),
    IntegrityCheck,
}

#[derive(Debug, Args)]
struct DbMigrateArgs {
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum LoadCommand {
    /// Import `<base-path>/course.yaml` and everything it references.
    Course(LoadCourseArgs),
    /// Import `<base-path>/<slug>/<slug>.yaml` as one chapter.
    Chapter(LoadChapterArgs),
    Interactives(LoadInteractivesArgs),
    Glossary(LoadGlossaryArgs),
}

#[derive(Debug, Args)]
struct LoadCourseArgs {
    #[arg(long)]
    base_path: PathBuf,
}

#[derive(Debug, Args)]
struct LoadChapterArgs {
    #[arg(long)]
    base_path: PathBuf,
    #[arg(long)]
    slug: String,
    #[arg(long)]
    number: u32,
}

#[derive(Debug, Args)]
struct LoadInteractivesArgs {
    #[arg(long)]
    base_path: PathBuf,
    /// Interactives manifest, relative to the base path.
    #[arg(long, default_value = "interactives/interactives.yaml")]
    structure: PathBuf,
}

#[derive(Debug, Args)]
struct LoadGlossaryArgs {
    #[arg(long)]
    base_path: PathBuf,
    /// Glossary directory, relative to the base path.
    #[arg(long, default_value = "glossary")]
    folder: PathBuf,
}

#[derive(Debug, Subcommand)]
enum ContentCommand {
    Chapters,
    Chapter(ContentChapterArgs),
    Interactives,
    Glossary,
}

#[derive(Debug, Args)]
struct ContentChapterArgs {
    #[arg(long)]
    slug: String,
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<Value> {
    serde_json::to_value(value).with_context(|| format!("failed to serialize {what}"))
}

fn init_tracing(level: LogLevelArg) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let mut store = SqliteStore::open(&cli.db)?;
    tracing::debug!(db = %cli.db.display(), "opened content database");
    match cli.command {
        Command::Db { command } => run_db(command, &mut store),
        Command::Load { command } => run_load(command, &mut store),
        Command::Content { command } => run_content(command, &mut store),
    }
}

fn run_db(command: DbCommand, store: &mut SqliteStore) -> Result<()> {
    match command {
        DbCommand::SchemaVersion => run_db_schema_version(store),
        DbCommand::Migrate(args) => run_db_migrate(&args, store),
        DbCommand::IntegrityCheck => run_db_integrity_check(store),
    }
}

fn run_db_schema_version(store: &SqliteStore) -> Result<()> {
    let status = store.schema_status()?;
    emit_json(serde_json::json!({
        "current_version": status.current_version,
        "target_version": status.target_version,
        "pending_versions": status.pending_versions,
        "up_to_date": status.pending_versions.is_empty()
    }))
}

fn run_db_migrate(args: &DbMigrateArgs, store: &mut SqliteStore) -> Result<()> {
    let before = store.schema_status()?;
    if args.dry_run {
        emit_json(serde_json::json!({
            "dry_run": true,
            "current_version": before.current_version,
            "target_version": before.target_version,
            "would_apply_versions": before.pending_versions
        }))?;
        return Ok(());
    }

    store.migrate()?;
    let after = store.schema_status()?;
    emit_json(serde_json::json!({
        "dry_run": false,
        "before_version": before.current_version,
        "applied_versions": before.pending_versions,
        "after_version": after.current_version,
        "up_to_date": after.pending_versions.is_empty()
    }))
}

fn run_db_integrity_check(store: &SqliteStore) -> Result<()> {
    let report = store.integrity_check()?;
    emit_json(to_json(&report, "integrity report")?)
}

fn run_load(command: LoadCommand, store: &mut SqliteStore) -> Result<()> {
    let factory = LoaderFactory::new();
    match command {
        LoadCommand::Course(args) => {
            let summary = load_course(store, &args.base_path)?;
            emit_json(serde_json::json!({
                "loaded": "course",
                "base_path": path_json(&args.base_path),
                "summary": to_json(&summary, "import summary")?
            }))
        }
        LoadCommand::Chapter(args) => {
            let slug = Slug::parse(&args.slug)?;
            let structure_file_path =
                args.base_path.join(slug.as_str()).join(format!("{slug}.yaml"));
            let loader =
                factory.create_chapter_loader(&structure_file_path, slug, args.number, &args.base_path);
            let summary = run(store, &loader)?;
            emit_json(serde_json::json!({
                "loaded": "chapter",
                "base_path": path_json(&args.base_path),
                "chapter": to_json(&summary, "chapter summary")?
            }))
        }
        LoadCommand::Interactives(args) => {
            let loader = factory.create_interactive_loader(&args.structure, &args.base_path);
            let count = run(store, &loader)?;
            emit_json(serde_json::json!({
                "loaded": "interactives",
                "base_path": path_json(&args.base_path),
                "count": count
            }))
        }
        LoadCommand::Glossary(args) => {
            let loader = factory.create_glossary_terms_loader(&args.folder, &args.base_path);
            let count = run(store, &loader)?;
            emit_json(serde_json::json!({
                "loaded": "glossary",
                "base_path": path_json(&args.base_path),
                "count": count
            }))
        }
    }
}

fn run_content(command: ContentCommand, store: &mut SqliteStore) -> Result<()> {
    store.migrate()?;
    match command {
        ContentCommand::Chapters => {
            let chapters = store.list_chapters()?;
            emit_json(serde_json::json!({ "chapters": to_json(&chapters, "chapters")? }))
        }
        ContentCommand::Chapter(args) => {
            let slug = Slug::parse(&args.slug)?;
            let chapter = store
                .get_chapter(&slug)?
                .ok_or_else(|| anyhow!("chapter `{slug}` not found"))?;
            let sections = store.list_sections(&slug)?;
            let interactives = store.chapter_interactives(&slug)?;
            emit_json(serde_json::json!({
                "chapter": to_json(&chapter, "chapter")?,
                "sections": to_json(&sections, "sections")?,
                "interactives": to_json(&interactives, "interactives")?
            }))
        }
        ContentCommand::Interactives => {
            let interactives = store.list_interactives()?;
            emit_json(serde_json::json!({
                "interactives": to_json(&interactives, "interactives")?
            }))
        }
        ContentCommand::Glossary => {
            let terms = store.list_glossary_terms()?;
            emit_json(serde_json::json!({ "glossary_terms": to_json(&terms, "glossary terms")? }))
        }
    }
}

fn path_json(path: &Path) -> Value {
    Value::String(path.display().to_string())
}
