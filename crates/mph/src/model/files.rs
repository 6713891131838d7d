use log::{error, info};
use mph_node_path::Group;
use std::path::{Path, PathBuf};

use super::{Model, Reference};
use crate::engine::FileFormat;
use crate::error::Error;
use crate::node::Node;

impl Model {
    /// Load external data from `file` into the node at `path`.
    pub fn import(&self, path: &str, file: &Path) -> Result<(), Error> {
        let node = self.node(path);
        if !node.exists()? {
            let message = format!("node \"{node}\" does not exist in model tree");
            error!("{message}");
            return Err(Error::Lookup(message));
        }
        node.import(file)
    }

    /// Run an export node, or all of them.
    ///
    /// A `file` name replaces the one set on the node. It only applies to
    /// export nodes that write to a `filename` property.
    pub fn export(&self, node: Option<Reference<'_, '_>>, file: Option<&Path>) -> Result<(), Error> {
        let Some(reference) = node else {
            for node in Node::new(self, Group::Exports).children()? {
                info!("Running export node \"{}\".", node.name());
                node.run()?;
                info!("Finished running export.");
            }
            return Ok(());
        };
        let node = self.member(Group::Exports, reference, "export")?;
        if let Some(file) = file {
            node.set_property("filename", file.to_path_buf())?;
        }
        info!("Running export node \"{}\".", node.name());
        node.run()?;
        info!("Finished running export.");
        Ok(())
    }

    /// Save the model and return the file written.
    ///
    /// Without a `path`, the file the model was loaded from is used. A path
    /// to a folder saves inside it, named after the model. Without a
    /// `format`, it is deduced from the file ending, which is then replaced
    /// by the correct one for the format.
    pub fn save(&self, path: Option<&Path>, format: Option<FileFormat>) -> Result<PathBuf, Error> {
        let format = match format {
            Some(format) => format,
            None => {
                let ext = path
                    .and_then(Path::extension)
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default();
                FileFormat::from_extension(&ext).ok_or_else(|| {
                    let message = format!("cannot deduce file format from ending \".{ext}\"");
                    error!("{message}");
                    Error::InvalidArgument(message)
                })?
            }
        };
        let target = match path {
            Some(path) => self.file_in(path, format),
            None => match self.file() {
                Some(file) if format == FileFormat::Comsol && file.is_file() => file,
                Some(file) => self.file_in(&file, format),
                None => {
                    let message = "model has no file name, a path must be given".to_string();
                    error!("{message}");
                    return Err(Error::InvalidArgument(message));
                }
            },
        };
        info!("Saving model as \"{}\".", target.display());
        self.document.save(&target, format)?;
        info!("Finished saving model.");
        Ok(target)
    }

    fn file_in(&self, path: &Path, format: FileFormat) -> PathBuf {
        if path.is_dir() {
            path.join(self.name()).with_extension(format.extension())
        } else {
            path.with_extension(format.extension())
        }
    }
}
