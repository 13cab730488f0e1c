//! File descriptors returned by list, upload, download and poll

use serde::Serialize;

use super::content::PayloadEnvelope;
use super::remote_path;

/// Identifies one file on a remote server
///
/// `file_path` is derived from the folder and name at construction and
/// cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    server_address: String,
    folder_path: String,
    file_name: String,
    file_path: String,
}

impl FileDescriptor {
    pub fn new(
        server_address: impl Into<String>,
        folder_path: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        let folder_path = folder_path.into();
        let file_name = file_name.into();
        let file_path = remote_path::combine(&folder_path, &file_name);
        Self {
            server_address: server_address.into(),
            folder_path,
            file_name,
            file_path,
        }
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn folder_path(&self) -> &str {
        &self.folder_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }
}

/// A downloaded file: where it lives plus its encoded content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDocument {
    #[serde(flatten)]
    pub descriptor: FileDescriptor,
    #[serde(flatten)]
    pub payload: PayloadEnvelope,
}
