use fieldguide_core::ContentError;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// The content tree is malformed; the message names the file to fix.
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl LoaderError {
    #[must_use]
    pub fn as_content(&self) -> Option<&ContentError> {
        match self {
            Self::Content(err) => Some(err),
            Self::Store(_) => None,
        }
    }
}
