//! YAML manifests of a content tree.
//!
//! Manifests are parsed into `serde_yaml` values first so that a missing key
//! is reported as a missing required field rather than a generic parse error.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::error::ContentError;
use crate::model::Slug;

/// Read a YAML file and deserialize it.
///
/// # Errors
/// Returns [`ContentError::CouldNotFindYamlFile`] for a missing file,
/// [`ContentError::EmptyYamlFile`] when it holds no document and
/// [`ContentError::InvalidYamlFile`] when it cannot be parsed into `T`.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ContentError::CouldNotFindYamlFile { path: path.to_path_buf() });
        }
        Err(source) => return Err(ContentError::Io { path: path.to_path_buf(), source }),
    };

    let invalid = |source| ContentError::InvalidYamlFile { path: path.to_path_buf(), source };
    let value: Value = serde_yaml::from_str(&raw).map_err(invalid)?;
    if value.is_null() {
        return Err(ContentError::EmptyYamlFile { path: path.to_path_buf() });
    }
    serde_yaml::from_value(value).map_err(invalid)
}

fn read_mapping(path: &Path, what: &str) -> Result<Mapping, ContentError> {
    match read_yaml::<Value>(path)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(ContentError::invalid_value(path, what, "a mapping")),
    }
}

fn optional_string(
    mapping: &Mapping,
    key: &str,
    path: &Path,
) -> Result<Option<String>, ContentError> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ContentError::invalid_value(path, key, "a string")),
    }
}

fn optional_number(mapping: &Mapping, key: &str, path: &Path) -> Result<Option<u32>, ContentError> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|number| u32::try_from(number).ok())
            .filter(|number| *number > 0)
            .map(Some)
            .ok_or_else(|| ContentError::invalid_value(path, key, "a positive integer")),
    }
}

fn slug_key(key: &Value, path: &Path, what: &str) -> Result<Slug, ContentError> {
    key.as_str()
        .ok_or_else(|| ContentError::invalid_value(path, what, "string keys"))
        .and_then(Slug::parse)
}

fn entry_mapping<'a>(
    value: &'a Value,
    path: &Path,
    key: &Slug,
) -> Result<Option<&'a Mapping>, ContentError> {
    match value {
        Value::Null => Ok(None),
        Value::Mapping(mapping) => Ok(Some(mapping)),
        _ => Err(ContentError::invalid_value(path, key.as_str(), "a mapping")),
    }
}

/// `<chapter>/<chapter>.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterManifest {
    pub icon: String,
    /// Sections manifest, relative to the chapter directory.
    pub sections: PathBuf,
    pub video: Option<String>,
    pub interactives: Vec<Slug>,
}

impl ChapterManifest {
    /// # Errors
    /// Returns [`ContentError::MissingRequiredField`] listing `icon` and/or
    /// `sections` when absent, and the errors of [`read_yaml`].
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let mapping = read_mapping(path, "chapter")?;

        let icon = optional_string(&mapping, "icon", path)?;
        let sections = optional_string(&mapping, "sections", path)?;
        let mut missing = Vec::new();
        if icon.is_none() {
            missing.push("icon");
        }
        if sections.is_none() {
            missing.push("sections");
        }
        let (Some(icon), Some(sections)) = (icon, sections) else {
            return Err(ContentError::missing_fields(path, "Chapter", &missing));
        };

        let interactives = match mapping.get("interactives") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(items)) => {
                let mut slugs = BTreeSet::new();
                for item in items {
                    let raw = item.as_str().ok_or_else(|| {
                        ContentError::invalid_value(path, "interactives", "a list of slugs")
                    })?;
                    slugs.insert(Slug::parse(raw)?);
                }
                slugs.into_iter().collect()
            }
            Some(_) => {
                return Err(ContentError::invalid_value(path, "interactives", "a list of slugs"))
            }
        };

        Ok(Self {
            icon,
            sections: PathBuf::from(sections),
            video: optional_string(&mapping, "video", path)?,
            interactives,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub slug: Slug,
    pub number: u32,
}

/// Sections manifest of one chapter, ordered by section number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionsManifest {
    pub sections: Vec<SectionEntry>,
}

impl SectionsManifest {
    /// A section without `section-number` takes its 1-based position in the
    /// manifest.
    ///
    /// # Errors
    /// Returns [`ContentError::InvalidYamlValue`] for non-positive or duplicate
    /// section numbers, and the errors of [`read_yaml`].
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let mapping = read_mapping(path, "sections")?;
        let mut numbers = BTreeSet::new();
        let mut sections = Vec::with_capacity(mapping.len());

        for (position, (key, value)) in mapping.iter().enumerate() {
            let slug = slug_key(key, path, "sections")?;
            let explicit = match entry_mapping(value, path, &slug)? {
                Some(entry) => optional_number(entry, "section-number", path)?,
                None => None,
            };
            let number = match explicit {
                Some(number) => number,
                None => u32::try_from(position + 1).map_err(|_| {
                    ContentError::invalid_value(path, "sections", "fewer sections")
                })?,
            };
            if !numbers.insert(number) {
                return Err(ContentError::invalid_value(
                    path,
                    "section-number",
                    format!("a unique number, but {number} is used twice"),
                ));
            }
            sections.push(SectionEntry { slug, number });
        }

        sections.sort_by_key(|section| section.number);
        Ok(Self { sections })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveEntry {
    pub slug: Slug,
    pub name: String,
    pub is_interactive: bool,
}

/// Interactives manifest, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractivesManifest {
    pub interactives: Vec<InteractiveEntry>,
}

impl InteractivesManifest {
    /// # Errors
    /// Returns [`ContentError::MissingRequiredField`] when an entry lacks `name`
    /// or `is-interactive`, and the errors of [`read_yaml`].
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let mapping = read_mapping(path, "interactives")?;
        let mut interactives = Vec::with_capacity(mapping.len());

        for (key, value) in &mapping {
            let slug = slug_key(key, path, "interactives")?;
            let empty = Mapping::new();
            let entry = entry_mapping(value, path, &slug)?.unwrap_or(&empty);

            let name = optional_string(entry, "name", path)?;
            let is_interactive = match entry.get("is-interactive") {
                None | Some(Value::Null) => None,
                Some(Value::Bool(flag)) => Some(*flag),
                Some(_) => {
                    return Err(ContentError::invalid_value(path, "is-interactive", "a boolean"))
                }
            };

            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("name");
            }
            if is_interactive.is_none() {
                missing.push("is-interactive");
            }
            let (Some(name), Some(is_interactive)) = (name, is_interactive) else {
                return Err(ContentError::missing_fields(path, "Interactive", &missing));
            };

            interactives.push(InteractiveEntry { slug, name, is_interactive });
        }

        Ok(Self { interactives })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub slug: Slug,
    pub number: u32,
}

/// Top-level `course.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseStructure {
    /// Chapters in manifest order.
    pub chapters: Vec<ChapterEntry>,
    pub interactives: Option<PathBuf>,
    pub glossary_folder: Option<PathBuf>,
}

impl CourseStructure {
    /// # Errors
    /// Returns [`ContentError::MissingRequiredField`] when `chapters` or a
    /// chapter's `chapter-number` is absent, [`ContentError::InvalidYamlValue`]
    /// for duplicate chapter numbers, and the errors of [`read_yaml`].
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let mapping = read_mapping(path, "course")?;

        let chapters_value = match mapping.get("chapters") {
            None | Some(Value::Null) => {
                return Err(ContentError::missing_fields(path, "Course", &["chapters"]))
            }
            Some(Value::Mapping(chapters)) => chapters,
            Some(_) => return Err(ContentError::invalid_value(path, "chapters", "a mapping")),
        };

        let mut numbers = BTreeSet::new();
        let mut chapters = Vec::with_capacity(chapters_value.len());
        for (key, value) in chapters_value {
            let slug = slug_key(key, path, "chapters")?;
            let number = match entry_mapping(value, path, &slug)? {
                Some(entry) => optional_number(entry, "chapter-number", path)?,
                None => None,
            }
            .ok_or_else(|| ContentError::missing_fields(path, "Chapter", &["chapter-number"]))?;

            if !numbers.insert(number) {
                return Err(ContentError::invalid_value(
                    path,
                    "chapter-number",
                    format!("a unique number, but {number} is used twice"),
                ));
            }
            chapters.push(ChapterEntry { slug, number });
        }

        Ok(Self {
            chapters,
            interactives: optional_string(&mapping, "interactives", path)?.map(PathBuf::from),
            glossary_folder: optional_string(&mapping, "glossary-folder", path)?
                .map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_fixture(name: &str, body: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("failed to create temp dir: {err}"));
        let path = dir.path().join(name);
        fs::write(&path, body)
            .unwrap_or_else(|err| panic!("failed to write {}: {err}", path.display()));
        (dir, path)
    }

    fn missing_fields(err: &ContentError) -> Vec<String> {
        match err {
            ContentError::MissingRequiredField { fields, .. } => fields.clone(),
            other => panic!("expected MissingRequiredField, got {other:?}"),
        }
    }

    #[test]
    fn chapter_manifest_reads_optional_fields() -> Result<(), ContentError> {
        let (_dir, path) = write_fixture(
            "chapter.yaml",
            "icon: img/icon.png\nsections: sections/sections.yaml\nvideo: https://example.org/v\n\
             interactives:\n  - sorting\n  - binary-cards\n  - sorting\n",
        );
        let manifest = ChapterManifest::from_path(&path)?;

        assert_eq!(manifest.icon, "img/icon.png");
        assert_eq!(manifest.sections, PathBuf::from("sections/sections.yaml"));
        assert_eq!(manifest.video.as_deref(), Some("https://example.org/v"));
        let slugs: Vec<&str> = manifest.interactives.iter().map(Slug::as_str).collect();
        assert_eq!(slugs, vec!["binary-cards", "sorting"]);
        Ok(())
    }

    #[test]
    fn chapter_manifest_lists_every_missing_field() {
        let (_dir, path) = write_fixture("chapter.yaml", "video: https://example.org/v\n");
        let err = match ChapterManifest::from_path(&path) {
            Ok(manifest) => panic!("expected an error, got {manifest:?}"),
            Err(err) => err,
        };
        assert_eq!(missing_fields(&err), vec!["icon".to_string(), "sections".to_string()]);
    }

    #[test]
    fn yaml_file_errors_are_distinct() {
        let missing = read_yaml::<Value>(Path::new("/nonexistent/fieldguide/chapter.yaml"));
        assert!(matches!(missing, Err(ContentError::CouldNotFindYamlFile { .. })));

        let (_empty_dir, empty_path) = write_fixture("empty.yaml", "# only a comment\n");
        let empty = read_yaml::<Value>(&empty_path);
        assert!(matches!(empty, Err(ContentError::EmptyYamlFile { .. })));

        let (_bad_dir, bad_path) = write_fixture("bad.yaml", "icon: [unterminated\n");
        let invalid = read_yaml::<Value>(&bad_path);
        assert!(matches!(invalid, Err(ContentError::InvalidYamlFile { .. })));

        let (_scalar_dir, scalar_path) = write_fixture("scalar.yaml", "just text\n");
        let scalar = ChapterManifest::from_path(&scalar_path);
        assert!(matches!(scalar, Err(ContentError::InvalidYamlValue { .. })));
    }

    #[test]
    fn sections_default_to_manifest_position() -> Result<(), ContentError> {
        let (_dir, path) = write_fixture(
            "sections.yaml",
            "welcome:\nhow-it-works:\n  section-number: 5\nwrap-up: {}\n",
        );
        let manifest = SectionsManifest::from_path(&path)?;

        let order: Vec<(&str, u32)> =
            manifest.sections.iter().map(|s| (s.slug.as_str(), s.number)).collect();
        assert_eq!(order, vec![("welcome", 1), ("wrap-up", 3), ("how-it-works", 5)]);
        Ok(())
    }

    #[test]
    fn sections_reject_duplicate_and_non_positive_numbers() {
        let (_dup_dir, duplicate) = write_fixture(
            "sections.yaml",
            "a:\n  section-number: 1\nb:\n  section-number: 1\n",
        );
        assert!(matches!(
            SectionsManifest::from_path(&duplicate),
            Err(ContentError::InvalidYamlValue { .. })
        ));

        let (_zero_dir, zero) = write_fixture("sections.yaml", "a:\n  section-number: 0\n");
        assert!(matches!(
            SectionsManifest::from_path(&zero),
            Err(ContentError::InvalidYamlValue { .. })
        ));
    }

    #[test]
    fn interactives_require_name_and_flag() {
        let (_dir, path) = write_fixture("interactives.yaml", "sorting:\n  name: Sorting\n");
        let err = match InteractivesManifest::from_path(&path) {
            Ok(manifest) => panic!("expected an error, got {manifest:?}"),
            Err(err) => err,
        };
        assert_eq!(missing_fields(&err), vec!["is-interactive".to_string()]);
    }

    #[test]
    fn course_structure_keeps_manifest_order() -> Result<(), ContentError> {
        let (_dir, path) = write_fixture(
            "course.yaml",
            "chapters:\n  searching:\n    chapter-number: 2\n  introduction:\n    chapter-number: 1\n\
             glossary-folder: glossary\n",
        );
        let course = CourseStructure::from_path(&path)?;

        let slugs: Vec<&str> = course.chapters.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["searching", "introduction"]);
        assert_eq!(course.glossary_folder, Some(PathBuf::from("glossary")));
        assert_eq!(course.interactives, None);
        Ok(())
    }

    #[test]
    fn course_structure_requires_chapter_numbers() {
        let (_dir, path) = write_fixture("course.yaml", "chapters:\n  introduction:\n");
        let err = match CourseStructure::from_path(&path) {
            Ok(course) => panic!("expected an error, got {course:?}"),
            Err(err) => err,
        };
        assert_eq!(missing_fields(&err), vec!["chapter-number".to_string()]);
    }
}
