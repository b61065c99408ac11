use std::path::Path;

use fieldguide_core::{Chapter, Slug};

use crate::chapters::ChaptersLoader;
use crate::course::CourseLoader;
use crate::glossary::GlossaryTermsLoader;
use crate::interactives::InteractiveLoader;
use crate::sections::ChapterSectionsLoader;

/// Builds loaders. Loaders that own child manifests keep a reference to the
/// factory and ask it for the child loaders.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoaderFactory;

impl LoaderFactory {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn create_chapter_loader(
        &self,
        chapter_structure_file_path: &Path,
        chapter_slug: Slug,
        chapter_number: u32,
        base_path: &Path,
    ) -> ChaptersLoader<'_> {
        ChaptersLoader::new(self, chapter_structure_file_path, chapter_slug, chapter_number, base_path)
    }

    /// `section_structure_file_path` is relative to `chapter_path`.
    #[must_use]
    pub fn create_chapter_section_loader<'c>(
        &self,
        chapter: &'c Chapter,
        chapter_path: &Path,
        section_structure_file_path: &Path,
    ) -> ChapterSectionsLoader<'c> {
        ChapterSectionsLoader::new(chapter, chapter_path, section_structure_file_path)
    }

    /// `structure_file_path` is relative to `base_path`.
    #[must_use]
    pub fn create_interactive_loader(
        &self,
        structure_file_path: &Path,
        base_path: &Path,
    ) -> InteractiveLoader {
        InteractiveLoader::new(structure_file_path, base_path)
    }

    /// `glossary_directory_name` is relative to `base_path`.
    #[must_use]
    pub fn create_glossary_terms_loader(
        &self,
        glossary_directory_name: &Path,
        base_path: &Path,
    ) -> GlossaryTermsLoader {
        GlossaryTermsLoader::new(glossary_directory_name, base_path)
    }

    #[must_use]
    pub fn create_course_loader(
        &self,
        structure_file_path: &Path,
        base_path: &Path,
    ) -> CourseLoader<'_> {
        CourseLoader::new(self, structure_file_path, base_path)
    }
}
