//! Shared helpers for the loader integration tests.
//!
//! Content trees live under `tests/assets/`; every test works on its own
//! in-memory database.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use fieldguide_core::{ContentError, Interactive, Slug};
use fieldguide_loaders::{run, ChapterSummary, LoaderError, LoaderFactory};
use fieldguide_store_sqlite::SqliteStore;

#[allow(dead_code)]
pub fn asset_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/assets").join(relative)
}

/// In-memory store with the schema already applied.
#[allow(dead_code)]
pub fn store() -> anyhow::Result<SqliteStore> {
    let mut store = SqliteStore::open(Path::new(":memory:"))?;
    store.migrate()?;
    Ok(store)
}

#[allow(dead_code)]
pub fn slug(value: &str) -> Slug {
    Slug::parse(value).unwrap_or_else(|err| panic!("test slug `{value}` should parse: {err}"))
}

/// Create `interactive-<number>` named `Interactive <number>`.
#[allow(dead_code)]
pub fn create_interactive(store: &mut SqliteStore, number: u32) -> anyhow::Result<Slug> {
    let slug = slug(&format!("interactive-{number}"));
    let interactive = Interactive::new(slug.clone(), format!("Interactive {number}"), true);
    store.import(|writer| writer.upsert_interactive(&interactive))?;
    Ok(slug)
}

/// Load `tests/assets/chapters/<name>` as chapter `number`.
#[allow(dead_code)]
pub fn load_chapter(
    store: &mut SqliteStore,
    name: &str,
    number: u32,
) -> Result<ChapterSummary, LoaderError> {
    let base_path = asset_path("chapters");
    let structure_file_path = base_path.join(name).join(format!("{name}.yaml"));
    let factory = LoaderFactory::new();
    let loader =
        factory.create_chapter_loader(&structure_file_path, slug(name), number, &base_path);
    run(store, &loader)
}

/// Unwrap the authoring error of a failed load.
#[allow(dead_code)]
pub fn content_error<T: Debug>(result: Result<T, LoaderError>) -> ContentError {
    match result {
        Err(LoaderError::Content(err)) => err,
        other => panic!("expected a content error, got {other:?}"),
    }
}
