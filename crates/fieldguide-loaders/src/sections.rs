use std::path::{Path, PathBuf};

use fieldguide_core::markdown;
use fieldguide_core::{Chapter, ChapterSection, SectionsManifest, Slug};
use fieldguide_store_sqlite::ContentWriter;

use crate::{resolve_interactives, Loader, LoaderError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionsSummary {
    pub sections: usize,
    /// Interactives referenced from section bodies, already checked to exist.
    pub interactives: Vec<Slug>,
}

/// Loads the sections of one chapter. Each section's Markdown file sits next
/// to the sections manifest and is named after the section slug.
#[derive(Debug, Clone)]
pub struct ChapterSectionsLoader<'c> {
    chapter: &'c Chapter,
    chapter_path: PathBuf,
    structure_file_path: PathBuf,
}

impl<'c> ChapterSectionsLoader<'c> {
    #[must_use]
    pub fn new(chapter: &'c Chapter, chapter_path: &Path, section_structure_file_path: &Path) -> Self {
        Self {
            chapter,
            chapter_path: chapter_path.to_path_buf(),
            structure_file_path: section_structure_file_path.to_path_buf(),
        }
    }
}

impl Loader for ChapterSectionsLoader<'_> {
    type Output = SectionsSummary;

    fn load(&self, writer: &ContentWriter<'_>) -> Result<SectionsSummary, LoaderError> {
        let manifest_path = self.chapter_path.join(&self.structure_file_path);
        let manifest = SectionsManifest::from_path(&manifest_path)?;
        let content_dir = manifest_path.parent().unwrap_or(self.chapter_path.as_path());

        let mut interactives = Vec::new();
        for entry in &manifest.sections {
            let path = content_dir.join(format!("{}.md", entry.slug));
            let rendered = markdown::render_file(&path, "ChapterSection")?;
            resolve_interactives(writer, &rendered.interactives, &path)?;

            writer.insert_section(
                &self.chapter.slug,
                &ChapterSection {
                    slug: entry.slug.clone(),
                    number: entry.number,
                    name: rendered.title,
                    content: rendered.html,
                },
            )?;
            tracing::debug!(
                chapter = %self.chapter.slug,
                section = %entry.slug,
                number = entry.number,
                "loaded chapter section"
            );
            interactives.extend(rendered.interactives);
        }

        interactives.sort();
        interactives.dedup();
        Ok(SectionsSummary { sections: manifest.sections.len(), interactives })
    }
}
