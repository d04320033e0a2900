use std::path::Path;

use anyhow::{Context, Result};

/// A file to upload as one part of a multipart form.
#[derive(Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self { file_name, bytes })
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
