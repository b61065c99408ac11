use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use fieldguide_core::markdown;
use fieldguide_core::{Chapter, ChapterManifest, Slug};
use fieldguide_store_sqlite::ContentWriter;
use serde::Serialize;

use crate::factory::LoaderFactory;
use crate::{merge_slugs, resolve_interactives, Loader, LoaderError};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChapterSummary {
    pub slug: Slug,
    pub name: String,
    pub sections: usize,
    pub interactives: usize,
}

/// Loads one chapter: `<base>/<slug>/<slug>.md` is its introduction and the
/// manifest's `sections` entry points at its sections manifest.
#[derive(Debug, Clone)]
pub struct ChaptersLoader<'f> {
    factory: &'f LoaderFactory,
    structure_file_path: PathBuf,
    chapter_slug: Slug,
    chapter_number: u32,
    base_path: PathBuf,
}

impl<'f> ChaptersLoader<'f> {
    #[must_use]
    pub fn new(
        factory: &'f LoaderFactory,
        chapter_structure_file_path: &Path,
        chapter_slug: Slug,
        chapter_number: u32,
        base_path: &Path,
    ) -> Self {
        Self {
            factory,
            structure_file_path: chapter_structure_file_path.to_path_buf(),
            chapter_slug,
            chapter_number,
            base_path: base_path.to_path_buf(),
        }
    }
}

impl Loader for ChaptersLoader<'_> {
    type Output = ChapterSummary;

    fn load(&self, writer: &ContentWriter<'_>) -> Result<ChapterSummary, LoaderError> {
        let manifest = ChapterManifest::from_path(&self.structure_file_path)?;

        let chapter_path = self.base_path.join(self.chapter_slug.as_str());
        let introduction_path = chapter_path.join(format!("{}.md", self.chapter_slug));
        let introduction = markdown::render_file(&introduction_path, "Chapter")?;

        resolve_interactives(writer, &manifest.interactives, &self.structure_file_path)?;
        resolve_interactives(writer, &introduction.interactives, &introduction_path)?;
        let mut interactives = BTreeSet::new();
        merge_slugs(&mut interactives, &manifest.interactives);
        merge_slugs(&mut interactives, &introduction.interactives);

        let chapter = Chapter {
            slug: self.chapter_slug.clone(),
            number: self.chapter_number,
            name: introduction.title,
            content: introduction.html,
            icon: manifest.icon,
            video: manifest.video,
        };
        writer.upsert_chapter(&chapter)?;

        let sections = self
            .factory
            .create_chapter_section_loader(&chapter, &chapter_path, &manifest.sections)
            .load(writer)?;
        merge_slugs(&mut interactives, &sections.interactives);

        for interactive in &interactives {
            writer.associate_interactive(&chapter.slug, interactive)?;
            tracing::debug!(chapter = %chapter.slug, %interactive, "associated interactive");
        }

        tracing::info!(
            chapter = %chapter.slug,
            number = chapter.number,
            sections = sections.sections,
            interactives = interactives.len(),
            "loaded chapter"
        );

        Ok(ChapterSummary {
            slug: chapter.slug,
            name: chapter.name,
            sections: sections.sections,
            interactives: interactives.len(),
        })
    }
}
