use std::path::{Path, PathBuf};

use fieldguide_core::CourseStructure;
use fieldguide_store_sqlite::ContentWriter;
use serde::Serialize;

use crate::chapters::ChapterSummary;
use crate::factory::LoaderFactory;
use crate::{Loader, LoaderError};

pub const COURSE_STRUCTURE_FILE: &str = "course.yaml";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub interactives: usize,
    pub glossary_terms: usize,
    pub chapters: Vec<ChapterSummary>,
    pub sections: usize,
    pub chapter_interactives: usize,
}

/// Loads a whole course: interactives first so chapters can reference them,
/// then glossary terms, then chapters in manifest order.
#[derive(Debug, Clone)]
pub struct CourseLoader<'f> {
    factory: &'f LoaderFactory,
    structure_file_path: PathBuf,
    base_path: PathBuf,
}

impl<'f> CourseLoader<'f> {
    #[must_use]
    pub fn new(factory: &'f LoaderFactory, structure_file_path: &Path, base_path: &Path) -> Self {
        Self {
            factory,
            structure_file_path: structure_file_path.to_path_buf(),
            base_path: base_path.to_path_buf(),
        }
    }
}

impl Loader for CourseLoader<'_> {
    type Output = ImportSummary;

    fn load(&self, writer: &ContentWriter<'_>) -> Result<ImportSummary, LoaderError> {
        let course = CourseStructure::from_path(&self.structure_file_path)?;
        let mut summary = ImportSummary::default();

        if let Some(manifest) = &course.interactives {
            summary.interactives =
                self.factory.create_interactive_loader(manifest, &self.base_path).load(writer)?;
        }

        if let Some(folder) = &course.glossary_folder {
            summary.glossary_terms =
                self.factory.create_glossary_terms_loader(folder, &self.base_path).load(writer)?;
        }

        for entry in &course.chapters {
            let structure_file_path = self
                .base_path
                .join(entry.slug.as_str())
                .join(format!("{}.yaml", entry.slug));
            let chapter = self
                .factory
                .create_chapter_loader(
                    &structure_file_path,
                    entry.slug.clone(),
                    entry.number,
                    &self.base_path,
                )
                .load(writer)?;
            summary.sections += chapter.sections;
            summary.chapter_interactives += chapter.interactives;
            summary.chapters.push(chapter);
        }

        tracing::info!(
            course = %self.structure_file_path.display(),
            chapters = summary.chapters.len(),
            sections = summary.sections,
            interactives = summary.interactives,
            glossary_terms = summary.glossary_terms,
            "loaded course"
        );
        Ok(summary)
    }
}
