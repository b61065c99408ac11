//! Markdown conversion for content files.
//!
//! A content file's title is its first heading; the rendered HTML of
//! everything else is its body.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex_lite::Regex;

use crate::error::ContentError;
use crate::model::Slug;

/// `{interactive <arguments>}`; arguments may come in any order.
const INTERACTIVE_TAG_PATTERN: &str = r"\{interactive\b([^}]*)\}";
const SLUG_ARGUMENT_PATTERN: &str = r#"(?:^|\s)slug\s*=\s*"([^"]*)""#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarkdown {
    pub title: String,
    pub html: String,
    /// Interactive slugs referenced by `{interactive slug="..."}` tags, sorted.
    pub interactives: Vec<Slug>,
}

/// Read and convert one content file.
///
/// # Errors
/// Returns [`ContentError::CouldNotFindMarkdownFile`] when `path` does not exist,
/// plus every error of [`render`].
pub fn render_file(path: &Path, model: &'static str) -> Result<RenderedMarkdown, ContentError> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ContentError::CouldNotFindMarkdownFile { path: path.to_path_buf(), model });
        }
        Err(source) => return Err(ContentError::Io { path: path.to_path_buf(), source }),
    };
    render(&source, path)
}

/// Convert Markdown source; `path` is only used for error reporting.
///
/// Interactive tags in code spans and code blocks are left as written.
///
/// # Errors
/// Returns [`ContentError::NoHeadingFound`] when the source has no non-empty
/// heading, [`ContentError::EmptyMarkdownFile`] when nothing but the heading
/// remains, [`ContentError::MissingRequiredField`] for an interactive tag
/// without a `slug` argument and [`ContentError::InvalidSlug`] for a malformed
/// one.
pub fn render(source: &str, path: &Path) -> Result<RenderedMarkdown, ContentError> {
    let mut interactives = BTreeSet::new();
    let parsed = TextMergeStream::new(Parser::new_ext(source, parser_options())).collect();
    let events = expand_interactives(parsed, path, &mut interactives)?;
    let no_heading = || ContentError::NoHeadingFound { path: path.to_path_buf() };

    let start = events
        .iter()
        .position(|event| matches!(event, Event::Start(Tag::Heading { .. })))
        .ok_or_else(no_heading)?;
    let end = events[start..]
        .iter()
        .position(|event| matches!(event, Event::End(TagEnd::Heading(_))))
        .map(|offset| start + offset)
        .ok_or_else(no_heading)?;

    let title = events[start + 1..end]
        .iter()
        .filter_map(|event| match event {
            Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string();
    if title.is_empty() {
        return Err(no_heading());
    }

    let mut body = String::new();
    html::push_html(
        &mut body,
        events[..start].iter().cloned().chain(events[end + 1..].iter().cloned()),
    );
    if body.trim().is_empty() {
        return Err(ContentError::EmptyMarkdownFile { path: path.to_path_buf() });
    }

    Ok(RenderedMarkdown { title, html: body, interactives: interactives.into_iter().collect() })
}

/// Replace interactive tags in prose with their placeholder `<div>`, recording
/// each slug. A paragraph holding nothing but one tag becomes the bare `<div>`.
fn expand_interactives<'a>(
    events: Vec<Event<'a>>,
    path: &Path,
    interactives: &mut BTreeSet<Slug>,
) -> Result<Vec<Event<'a>>, ContentError> {
    let tag_pattern = Regex::new(INTERACTIVE_TAG_PATTERN)?;
    let slug_pattern = Regex::new(SLUG_ARGUMENT_PATTERN)?;

    let mut expanded = Vec::with_capacity(events.len());
    let mut in_code_block = false;
    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                expanded.push(event);
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                expanded.push(event);
            }
            Event::Text(text) if !in_code_block && tag_pattern.is_match(&text) => {
                let mut last = 0;
                for captures in tag_pattern.captures_iter(&text) {
                    let Some(whole) = captures.get(0) else { continue };
                    if whole.start() > last {
                        expanded.push(Event::Text(text[last..whole.start()].to_string().into()));
                    }
                    let slug = tag_slug(&captures[1], &slug_pattern, path)?;
                    expanded.push(Event::Html(placeholder(&slug)));
                    interactives.insert(slug);
                    last = whole.end();
                }
                if last < text.len() {
                    expanded.push(Event::Text(text[last..].to_string().into()));
                }
            }
            other => expanded.push(other),
        }
    }

    Ok(unwrap_lone_placeholders(expanded))
}

fn tag_slug(arguments: &str, slug_pattern: &Regex, path: &Path) -> Result<Slug, ContentError> {
    let captures = slug_pattern
        .captures(arguments)
        .ok_or_else(|| ContentError::missing_fields(path, "Interactive tag", &["slug"]))?;
    Slug::parse(&captures[1])
}

fn placeholder(slug: &Slug) -> CowStr<'static> {
    format!(r#"<div class="interactive" data-interactive="{slug}"></div>"#).into()
}

// Inline HTML inside a paragraph arrives as `InlineHtml`, so a block `Html`
// event between paragraph markers can only be a placeholder.
fn unwrap_lone_placeholders(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut unwrapped = Vec::with_capacity(events.len());
    let mut index = 0;
    while index < events.len() {
        if let [Event::Start(Tag::Paragraph), Event::Html(div), Event::End(TagEnd::Paragraph), ..] =
            &events[index..]
        {
            unwrapped.push(Event::Html(format!("{div}\n").into()));
            index += 3;
        } else {
            unwrapped.push(events[index].clone());
            index += 1;
        }
    }
    unwrapped
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES | Options::ENABLE_STRIKETHROUGH
}
