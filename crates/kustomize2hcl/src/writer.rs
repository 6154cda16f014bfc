//! writes one terraform file per resource
//!
//! Besides one `<identifier>.tf` per resource the output directory gets two fixed files:
//! [MAIN] with provider requirement and configuration, and an empty [VARIABLES].
//!
//! The output directory must be empty or not exist. Every declaration is rendered before the first
//! file is written, but a failing write leaves the files written so far in place. There is no rollback.
use crate::config::Config;
use crate::render;
use crate::resource::ResourceCollection;
use crate::rewrite::{self, TransformError};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// File stem of the provider declarations
pub const MAIN: &str = "_main";
/// File stem of the (empty) variable declarations
pub const VARIABLES: &str = "_variables";
pub const EXTENSION: &str = "tf";

#[derive(derive_new::new, Debug, Default)]
pub struct HclWriter {
    config: Config,
}

impl HclWriter {
    /// Renders every resource of `collection`, in collection order, keyed by file stem
    ///
    /// Resources are rewritten in place.
    pub fn render_all(
        &self,
        collection: &mut ResourceCollection,
    ) -> Result<IndexMap<String, String>, TransformError> {
        let mut files = IndexMap::new();
        files.insert(MAIN.to_string(), render::main_declarations(&self.config)?);
        files.insert(VARIABLES.to_string(), String::new());

        for index in 0..collection.len() {
            let renderable = rewrite::rewrite(collection, index, &self.config)?;
            let hcl = render::render(&renderable, &self.config)?;

            let identifier = renderable.identifier().to_string();
            tracing::debug!(%identifier, placeholders = renderable.placeholders().len(), "rendered declaration");

            if files.insert(identifier.clone(), hcl).is_some() {
                return Err(TransformError::IdentifierCollision { identifier });
            }
        }

        Ok(files)
    }

    /// Renders `collection` into `path`
    pub fn write(&self, path: &Path, collection: &mut ResourceCollection) -> Result<(), WriteError> {
        prepare_directory(path)?;

        let files = self.render_all(collection)?;
        for (stem, contents) in &files {
            let file_path = path.join(format!("{stem}.{EXTENSION}"));
            std::fs::write(&file_path, contents).map_err(|error| WriteError::Io {
                path: file_path,
                error,
            })?;
        }

        tracing::info!(path=%path.display(), files = files.len(), "wrote declarations");
        Ok(())
    }
}

/// Creates `path` unless it exists, an existing `path` must be an empty directory
fn prepare_directory(path: &Path) -> Result<(), WriteError> {
    let io_error = |error| WriteError::Io {
        path: path.to_owned(),
        error,
    };

    match std::fs::metadata(path) {
        Ok(metadata) if !metadata.is_dir() => Err(WriteError::NotADirectory(path.to_owned())),
        Ok(_) => {
            let mut entries = std::fs::read_dir(path).map_err(io_error)?;
            if entries.next().is_some() {
                return Err(WriteError::NotEmpty(path.to_owned()));
            }
            Ok(())
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            std::fs::create_dir_all(path).map_err(io_error)?;
            tracing::info!(path=%path.display(), "created output directory");
            Ok(())
        }
        Err(error) => Err(io_error(error)),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("'{}', must be a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("'{}', must be empty", .0.display())]
    NotEmpty(PathBuf),
    #[error("IO error for {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error(transparent)]
    Transform(#[from] TransformError),
}
