mod common;

use std::path::Path;

use anyhow::Result;
use common::{asset_path, content_error, load_chapter, slug, store};
use fieldguide_core::{Chapter, ContentError};
use fieldguide_loaders::{Loader, LoaderError, LoaderFactory};

#[test]
fn sections_are_stored_in_section_number_order() -> Result<()> {
    let mut store = store()?;

    let summary = load_chapter(&mut store, "section-order", 1)?;
    assert_eq!(summary.sections, 3);

    let sections = store.list_sections(&slug("section-order"))?;
    let listed: Vec<(u32, &str, &str)> = sections
        .iter()
        .map(|section| (section.number, section.slug.as_str(), section.name.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![(1, "basics", "The basics"), (2, "examples", "Examples"), (3, "summary", "Summary")]
    );
    assert!(sections[1].content.contains("<table>"));
    Ok(())
}

#[test]
fn section_numbers_default_to_manifest_position() -> Result<()> {
    let mut store = store()?;

    load_chapter(&mut store, "chapter-2", 2)?;
    let sections = store.list_sections(&slug("chapter-2"))?;
    let listed: Vec<(u32, &str)> =
        sections.iter().map(|section| (section.number, section.slug.as_str())).collect();
    assert_eq!(listed, vec![(1, "welcome"), (2, "in-depth")]);
    Ok(())
}

#[test]
fn section_loader_writes_under_an_existing_chapter() -> Result<()> {
    let mut store = store()?;
    let chapter_path = asset_path("chapters/chapter-1");
    let chapter = Chapter {
        slug: slug("chapter-1"),
        number: 1,
        name: "Chapter 1".to_string(),
        content: "<p>Intro</p>".to_string(),
        icon: "img/chapters/chapter-1.png".to_string(),
        video: None,
    };

    let factory = LoaderFactory::new();
    let summary = store.import(|writer| -> Result<_, LoaderError> {
        writer.upsert_chapter(&chapter)?;
        factory
            .create_chapter_section_loader(
                &chapter,
                &chapter_path,
                Path::new("sections/sections.yaml"),
            )
            .load(writer)
    })?;
    assert_eq!(summary.sections, 2);
    assert!(summary.interactives.is_empty());

    let sections = store.list_sections(&chapter.slug)?;
    assert_eq!(sections[0].name, "Welcome");
    assert_eq!(sections[1].name, "In depth");
    Ok(())
}

#[test]
fn duplicate_section_numbers_are_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "duplicate-section-number", 1));
    match err {
        ContentError::InvalidYamlValue { key, .. } => assert_eq!(key, "section-number"),
        other => panic!("expected InvalidYamlValue, got {other:?}"),
    }
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn section_without_markdown_file_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "section-missing-file", 1));
    match err {
        ContentError::CouldNotFindMarkdownFile { path, model } => {
            assert!(path.ends_with("sections/ghost.md"));
            assert_eq!(model, "ChapterSection");
        }
        other => panic!("expected CouldNotFindMarkdownFile, got {other:?}"),
    }
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn section_without_heading_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "section-missing-heading", 1));
    assert!(matches!(err, ContentError::NoHeadingFound { .. }), "got {err:?}");
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}
