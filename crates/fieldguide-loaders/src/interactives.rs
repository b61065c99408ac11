use std::path::{Path, PathBuf};

use fieldguide_core::{Interactive, InteractivesManifest};
use fieldguide_store_sqlite::ContentWriter;

use crate::{Loader, LoaderError};

/// Creates or updates the interactives listed in an interactives manifest.
/// Returns the number of interactives written.
#[derive(Debug, Clone)]
pub struct InteractiveLoader {
    structure_file_path: PathBuf,
    base_path: PathBuf,
}

impl InteractiveLoader {
    #[must_use]
    pub fn new(structure_file_path: &Path, base_path: &Path) -> Self {
        Self {
            structure_file_path: structure_file_path.to_path_buf(),
            base_path: base_path.to_path_buf(),
        }
    }
}

impl Loader for InteractiveLoader {
    type Output = usize;

    fn load(&self, writer: &ContentWriter<'_>) -> Result<usize, LoaderError> {
        let manifest_path = self.base_path.join(&self.structure_file_path);
        let manifest = InteractivesManifest::from_path(&manifest_path)?;

        for entry in &manifest.interactives {
            writer.upsert_interactive(&Interactive::new(
                entry.slug.clone(),
                entry.name.clone(),
                entry.is_interactive,
            ))?;
        }

        tracing::info!(
            manifest = %manifest_path.display(),
            count = manifest.interactives.len(),
            "loaded interactives"
        );
        Ok(manifest.interactives.len())
    }
}
