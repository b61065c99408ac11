use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fieldguide_core::markdown;
use fieldguide_core::{ContentError, GlossaryTerm, Slug};
use fieldguide_store_sqlite::ContentWriter;

use crate::{Loader, LoaderError};

/// Creates or updates one glossary term per `*.md` file in the glossary
/// directory. The file stem is the slug and the first heading is the term.
#[derive(Debug, Clone)]
pub struct GlossaryTermsLoader {
    glossary_directory: PathBuf,
}

impl GlossaryTermsLoader {
    #[must_use]
    pub fn new(glossary_directory_name: &Path, base_path: &Path) -> Self {
        Self { glossary_directory: base_path.join(glossary_directory_name) }
    }

    fn term_files(&self) -> Result<Vec<PathBuf>, ContentError> {
        let io_error =
            |source| ContentError::Io { path: self.glossary_directory.clone(), source };
        let entries = match fs::read_dir(&self.glossary_directory) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::CouldNotFindGlossaryDirectory {
                    path: self.glossary_directory.clone(),
                });
            }
            Err(source) => return Err(io_error(source)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Loader for GlossaryTermsLoader {
    type Output = usize;

    fn load(&self, writer: &ContentWriter<'_>) -> Result<usize, LoaderError> {
        let files = self.term_files()?;

        for path in &files {
            let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
            let slug = Slug::parse(stem)?;
            let rendered = markdown::render_file(path, "GlossaryTerm")?;
            writer.upsert_glossary_term(&GlossaryTerm {
                slug,
                term: rendered.title,
                definition: rendered.html,
            })?;
        }

        tracing::info!(
            directory = %self.glossary_directory.display(),
            count = files.len(),
            "loaded glossary terms"
        );
        Ok(files.len())
    }
}
