use std::fmt;
use std::path::Path;

use super::error::ValidationError;

/// File selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImportFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>) {
        (self.file_name, self.bytes)
    }
}

impl fmt::Debug for ImportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Extensions the backend importer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    accepted_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(["csv"])
    }
}

impl UploadPolicy {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted_extensions: Vec<String> = Vec::new();
        for extension in extensions {
            let normalized = extension
                .as_ref()
                .trim()
                .trim_start_matches('.')
                .to_ascii_lowercase();
            if !normalized.is_empty() && !accepted_extensions.contains(&normalized) {
                accepted_extensions.push(normalized);
            }
        }
        Self {
            accepted_extensions,
        }
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.accepted_extensions
    }

    pub fn validate(&self, file: &ImportFile) -> Result<(), ValidationError> {
        if file.file_name().trim().is_empty() {
            return Err(ValidationError::MissingFileName);
        }

        let accepted = file
            .extension()
            .is_some_and(|ext| self.accepted_extensions.contains(&ext));
        if !accepted {
            return Err(ValidationError::UnsupportedExtension {
                file_name: file.file_name().to_string(),
                accepted: self.accepted_extensions.clone(),
            });
        }

        if file.is_empty() {
            return Err(ValidationError::EmptyFile {
                file_name: file.file_name().to_string(),
            });
        }

        Ok(())
    }
}
