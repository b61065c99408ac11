//! Content model of the field guide: slugs, content records, manifest parsing
//! and Markdown conversion. Nothing here touches the database.

pub mod error;
pub mod manifest;
pub mod markdown;
pub mod model;

pub use error::ContentError;
pub use manifest::{
    read_yaml, ChapterEntry, ChapterManifest, CourseStructure, InteractiveEntry,
    InteractivesManifest, SectionEntry, SectionsManifest,
};
pub use markdown::RenderedMarkdown;
pub use model::{Chapter, ChapterSection, GlossaryTerm, Interactive, Slug};
