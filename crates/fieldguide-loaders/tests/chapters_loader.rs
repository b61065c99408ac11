mod common;

use anyhow::Result;
use common::{content_error, create_interactive, load_chapter, slug, store};
use fieldguide_core::ContentError;
use fieldguide_loaders::LoaderError;

#[test]
fn single_chapter_is_named_after_its_heading() -> Result<()> {
    let mut store = store()?;

    let summary = load_chapter(&mut store, "chapter-1", 1)?;
    assert_eq!(summary.name, "Chapter 1");
    assert_eq!(summary.sections, 2);
    assert_eq!(summary.interactives, 0);

    let chapters = store.list_chapters()?;
    assert_eq!(chapters.len(), 1);
    let chapter = &chapters[0];
    assert_eq!(chapter.slug, slug("chapter-1"));
    assert_eq!(chapter.number, 1);
    assert_eq!(chapter.name, "Chapter 1");
    assert_eq!(chapter.icon, "img/chapters/chapter-1.png");
    assert_eq!(chapter.video.as_deref(), Some("https://www.youtube.com/embed/chapter-1"));
    assert!(chapter.content.contains("This is the introduction to chapter 1."));
    assert!(!chapter.content.contains("<h1>"), "heading belongs to the name, not the body");
    Ok(())
}

#[test]
fn multiple_chapters_are_listed_by_number() -> Result<()> {
    let mut store = store()?;

    load_chapter(&mut store, "chapter-2", 2)?;
    load_chapter(&mut store, "chapter-1", 1)?;

    let chapters = store.list_chapters()?;
    let names: Vec<&str> = chapters.iter().map(|chapter| chapter.name.as_str()).collect();
    assert_eq!(names, vec!["Chapter 1", "Chapter 2"]);
    assert_eq!(chapters[1].video, None);
    Ok(())
}

#[test]
fn introduction_without_heading_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "missing-heading", 1));
    match err {
        ContentError::NoHeadingFound { path } => {
            assert!(path.ends_with("missing-heading/missing-heading.md"));
        }
        other => panic!("expected NoHeadingFound, got {other:?}"),
    }
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn introduction_with_only_a_heading_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "missing-content", 1));
    assert!(matches!(err, ContentError::EmptyMarkdownFile { .. }), "got {err:?}");
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn manifest_without_sections_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "missing-sections", 1));
    match err {
        ContentError::MissingRequiredField { fields, model, .. } => {
            assert_eq!(fields, vec!["sections".to_string()]);
            assert_eq!(model, "Chapter");
        }
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }
    Ok(())
}

#[test]
fn manifest_without_icon_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "no-icon", 1));
    match err {
        ContentError::MissingRequiredField { fields, .. } => {
            assert_eq!(fields, vec!["icon".to_string()]);
        }
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn missing_chapter_manifest_is_reported() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "not-a-chapter", 1));
    assert!(matches!(err, ContentError::CouldNotFindYamlFile { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn chapter_interactives_come_from_manifest_introduction_and_sections() -> Result<()> {
    let mut store = store()?;
    for number in 1..=3 {
        create_interactive(&mut store, number)?;
    }

    let summary = load_chapter(&mut store, "interactives", 1)?;
    assert_eq!(summary.name, "Interactives");
    assert_eq!(summary.interactives, 3);

    let interactives = store.chapter_interactives(&slug("interactives"))?;
    let names: Vec<&str> =
        interactives.iter().map(|interactive| interactive.name.as_str()).collect();
    assert_eq!(names, vec!["Interactive 1", "Interactive 2", "Interactive 3"]);

    let chapter = store
        .get_chapter(&slug("interactives"))?
        .unwrap_or_else(|| panic!("chapter should exist after load"));
    assert!(chapter.content.contains(r#"data-interactive="interactive-3""#));
    Ok(())
}

#[test]
fn unknown_interactive_in_manifest_is_rejected() -> Result<()> {
    let mut store = store()?;
    create_interactive(&mut store, 1)?;

    let err = content_error(load_chapter(&mut store, "invalid-interactive", 1));
    match err {
        ContentError::KeyNotFound { key, field, .. } => {
            assert_eq!(key, "interactive-that-does-not-exist");
            assert_eq!(field, "Interactive");
        }
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
    assert_eq!(store.get_chapter(&slug("invalid-interactive"))?, None);
    Ok(())
}

#[test]
fn unknown_interactive_in_section_leaves_no_chapter_behind() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "invalid-section-interactive", 1));
    match err {
        ContentError::KeyNotFound { key, path, .. } => {
            assert_eq!(key, "unknown-widget");
            assert!(path.ends_with("sections/welcome.md"));
        }
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn unknown_interactive_is_found_whatever_the_tag_argument_order() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "reversed-interactive-arguments", 1));
    match err {
        ContentError::KeyNotFound { key, field, .. } => {
            assert_eq!(key, "unknown-widget");
            assert_eq!(field, "Interactive");
        }
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
    assert!(store.list_chapters()?.is_empty());
    Ok(())
}

#[test]
fn interactive_tag_without_slug_is_rejected() -> Result<()> {
    let mut store = store()?;

    let err = content_error(load_chapter(&mut store, "interactive-tag-without-slug", 1));
    match err {
        ContentError::MissingRequiredField { fields, path, .. } => {
            assert_eq!(fields, vec!["slug".to_string()]);
            assert!(path.ends_with("interactive-tag-without-slug.md"));
        }
        other => panic!("expected MissingRequiredField, got {other:?}"),
    }
    Ok(())
}

#[test]
fn chapter_numbers_are_unique() -> Result<()> {
    let mut store = store()?;

    load_chapter(&mut store, "chapter-1", 1)?;
    let result = load_chapter(&mut store, "chapter-2", 1);
    assert!(matches!(result, Err(LoaderError::Store(_))), "got {result:?}");

    let chapters = store.list_chapters()?;
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].slug, slug("chapter-1"));
    Ok(())
}

#[test]
fn reloading_a_chapter_replaces_it() -> Result<()> {
    let mut store = store()?;

    load_chapter(&mut store, "chapter-1", 1)?;
    load_chapter(&mut store, "chapter-1", 4)?;

    let chapters = store.list_chapters()?;
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].number, 4);
    assert_eq!(store.list_sections(&slug("chapter-1"))?.len(), 2);
    Ok(())
}
