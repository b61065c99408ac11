//! Loaders that import a content tree into the content database.
//!
//! A [`LoaderFactory`] builds one loader per manifest; loaders hand child
//! manifests to the factory again, so a course load walks the tree depth
//! first. Every loader writes through a [`ContentWriter`], which is one open
//! transaction: the first error aborts the whole import.

use std::collections::BTreeSet;
use std::path::Path;

use fieldguide_core::{ContentError, Slug};
use fieldguide_store_sqlite::{ContentWriter, SqliteStore};

mod chapters;
mod course;
mod error;
mod factory;
mod glossary;
mod interactives;
mod sections;

pub use chapters::{ChapterSummary, ChaptersLoader};
pub use course::{CourseLoader, ImportSummary, COURSE_STRUCTURE_FILE};
pub use error::LoaderError;
pub use factory::LoaderFactory;
pub use glossary::GlossaryTermsLoader;
pub use interactives::InteractiveLoader;
pub use sections::{ChapterSectionsLoader, SectionsSummary};

/// One manifest/content subtree that can be written to the content database.
pub trait Loader {
    type Output;

    /// # Errors
    /// Returns [`LoaderError::Content`] for authoring mistakes and
    /// [`LoaderError::Store`] when a database write fails.
    fn load(&self, writer: &ContentWriter<'_>) -> Result<Self::Output, LoaderError>;
}

/// Run one loader in its own import transaction.
///
/// # Errors
/// Returns the loader's error; nothing it wrote is kept.
pub fn run<L: Loader>(store: &mut SqliteStore, loader: &L) -> Result<L::Output, LoaderError> {
    store.import(|writer| loader.load(writer))
}

/// Import the course rooted at `base_path` (its `course.yaml` and everything
/// it references) in one transaction.
///
/// # Errors
/// Returns the first authoring or store error; the database is left unchanged.
pub fn load_course(store: &mut SqliteStore, base_path: &Path) -> Result<ImportSummary, LoaderError> {
    let factory = LoaderFactory::new();
    let loader = factory.create_course_loader(&base_path.join(COURSE_STRUCTURE_FILE), base_path);
    run(store, &loader)
}

/// Check that every referenced interactive already exists.
fn resolve_interactives<'a>(
    writer: &ContentWriter<'_>,
    slugs: impl IntoIterator<Item = &'a Slug>,
    referenced_in: &Path,
) -> Result<(), LoaderError> {
    for slug in slugs {
        if writer.find_interactive(slug)?.is_none() {
            return Err(ContentError::KeyNotFound {
                path: referenced_in.to_path_buf(),
                key: slug.to_string(),
                field: "Interactive",
            }
            .into());
        }
    }
    Ok(())
}

fn merge_slugs(into: &mut BTreeSet<Slug>, slugs: &[Slug]) {
    into.extend(slugs.iter().cloned());
}
