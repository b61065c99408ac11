use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// URL-safe identifier of a content node.
///
/// Lowercase ASCII letters, digits and single hyphens; never starts or ends
/// with a hyphen.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate and wrap a slug.
    ///
    /// # Errors
    /// Returns [`ContentError::InvalidSlug`] when `value` is empty or contains
    /// anything other than lowercase letters, digits and inner single hyphens.
    pub fn parse(value: &str) -> Result<Self, ContentError> {
        let invalid = |reason| ContentError::InvalidSlug { value: value.to_string(), reason };

        if value.is_empty() {
            return Err(invalid("slug MUST be non-empty"));
        }
        if !value.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
            return Err(invalid("slug MUST contain only lowercase letters, digits and hyphens"));
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(invalid("slug MUST NOT start or end with a hyphen"));
        }
        if value.contains("--") {
            return Err(invalid("slug MUST NOT contain consecutive hyphens"));
        }

        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for Slug {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

/// One chapter of the guide. Title and body come from its introduction file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    pub slug: Slug,
    pub number: u32,
    pub name: String,
    pub content: String,
    pub icon: String,
    #[serde(default)]
    pub video: Option<String>,
}

impl Display for Chapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterSection {
    pub slug: Slug,
    pub number: u32,
    pub name: String,
    pub content: String,
}

impl Display for ChapterSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlossaryTerm {
    pub slug: Slug,
    pub term: String,
    pub definition: String,
}

impl Display for GlossaryTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.term)
    }
}

/// Interactive widget that content can embed. Chapters only reference these;
/// they are created by the interactives manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interactive {
    pub slug: Slug,
    pub name: String,
    pub template: String,
    pub is_interactive: bool,
}

impl Interactive {
    #[must_use]
    pub fn new(slug: Slug, name: String, is_interactive: bool) -> Self {
        let template = format!("interactive/{slug}.html");
        Self { slug, name, template, is_interactive }
    }
}

impl Display for Interactive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
