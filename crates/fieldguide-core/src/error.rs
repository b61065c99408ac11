use std::path::PathBuf;

/// Authoring mistakes found while reading a content tree.
///
/// Every variant maps to one specific missing or malformed piece of a
/// manifest or content file and carries the path of the offending file.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("could not find YAML file {}", .path.display())]
    CouldNotFindYamlFile { path: PathBuf },

    #[error("YAML file {} is empty", .path.display())]
    EmptyYamlFile { path: PathBuf },

    #[error("YAML file {} is not valid: {source}", .path.display())]
    InvalidYamlFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for `{key}` in {}: expected {expected}", .path.display())]
    InvalidYamlValue { path: PathBuf, key: String, expected: String },

    #[error(
        "{model} in {} is missing required field(s): {}",
        .path.display(),
        .fields.join(", ")
    )]
    MissingRequiredField { path: PathBuf, fields: Vec<String>, model: &'static str },

    #[error("could not find Markdown file {} for {model}", .path.display())]
    CouldNotFindMarkdownFile { path: PathBuf, model: &'static str },

    #[error("no heading found in Markdown file {}", .path.display())]
    NoHeadingFound { path: PathBuf },

    #[error("Markdown file {} has no content after its heading", .path.display())]
    EmptyMarkdownFile { path: PathBuf },

    #[error("{field} `{key}` referenced in {} does not exist", .path.display())]
    KeyNotFound { path: PathBuf, key: String, field: &'static str },

    #[error("could not find glossary directory {}", .path.display())]
    CouldNotFindGlossaryDirectory { path: PathBuf },

    #[error("invalid slug `{value}`: {reason}")]
    InvalidSlug { value: String, reason: &'static str },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile content pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

impl ContentError {
    pub(crate) fn missing_fields(
        path: impl Into<PathBuf>,
        model: &'static str,
        fields: &[&str],
    ) -> Self {
        Self::MissingRequiredField {
            path: path.into(),
            fields: fields.iter().map(ToString::to_string).collect(),
            model,
        }
    }

    pub(crate) fn invalid_value(
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidYamlValue { path: path.into(), key: key.into(), expected: expected.into() }
    }
}
