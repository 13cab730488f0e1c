//! Writing delivered documents into a local inbox directory

use std::io;
use std::path::{Path, PathBuf};

use filerelay_core::domain::FileDocument;
use tracing::debug;

/// Writes the decoded content of `document` to `inbox/<file name>`.
///
/// The bytes land in a hidden `.partial` file first and are renamed into
/// place, so readers of the inbox never see a half-written document. An
/// existing file of the same name is replaced.
pub async fn deliver(inbox: &Path, document: &FileDocument) -> io::Result<PathBuf> {
    let name = document.descriptor.file_name();
    if !is_plain_name(name) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to write remote name {name:?} into the inbox"),
        ));
    }

    let bytes = document
        .payload
        .to_bytes()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    tokio::fs::create_dir_all(inbox).await?;
    let target = inbox.join(name);
    let partial = inbox.join(format!(".{name}.partial"));
    tokio::fs::write(&partial, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&partial, &target).await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            debug!(path = %partial.display(), error = %cleanup, "Could not remove partial file");
        }
        return Err(e);
    }
    Ok(target)
}

/// True for a single path component other than `.` and `..`.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
