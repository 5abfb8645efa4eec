use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("file is not valid UTF-8 text: {}", .0.display())]
    InvalidEncoding(PathBuf),

    #[error("file looks like binary data: {}", .0.display())]
    Binary(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(path),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::InvalidData => Self::InvalidEncoding(path),
            _ => Self::Io { path, source: err },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read a whole text file.
pub async fn read_text(path: &Path) -> Result<String, DocumentError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| DocumentError::from_io(path, e))?;
    if !metadata.is_file() {
        return Err(DocumentError::NotAFile(path.to_path_buf()));
    }
    if metadata.len() > LARGE_FILE_THRESHOLD {
        log::warn!(
            "Large file detected ({} bytes): {}",
            metadata.len(),
            path.display()
        );
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| DocumentError::from_io(path, e))?;
    if content.contains('\0') {
        return Err(DocumentError::Binary(path.to_path_buf()));
    }

    log::info!("Successfully read file: {}", path.display());
    Ok(content)
}

/// Write `content` verbatim, creating missing parent directories.
pub async fn write_text(path: &Path, content: &str) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !fs::try_exists(parent).await.unwrap_or(false) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DocumentError::from_io(parent, e))?;
            log::info!("Created directory: {}", parent.display());
        }
    }

    fs::write(path, content.as_bytes())
        .await
        .map_err(|e| DocumentError::from_io(path, e))?;
    log::info!("Successfully saved file: {}", path.display());
    Ok(())
}

/// Turn a drag-and-drop payload into a path.
///
/// Drop sources wrap paths containing spaces in `{}`; terminals often quote
/// them instead. Returns `None` for an empty or multi-line payload.
pub fn parse_drop_payload(payload: &str) -> Option<PathBuf> {
    let trimmed = payload.trim();
    if trimmed.is_empty() || trimmed.contains(['\n', '\r']) {
        return None;
    }

    let unbraced: String = trimmed.chars().filter(|c| *c != '{' && *c != '}').collect();
    let unbraced = unbraced.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            unbraced
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(unbraced);

    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}

/// Whether a payload was explicitly wrapped by a drop source.
pub fn is_braced_payload(payload: &str) -> bool {
    let trimmed = payload.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Append `extension` (e.g. `.txt`) when the chosen path has none.
pub fn with_default_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some() || extension.is_empty() {
        return path;
    }
    let mut name = path.into_os_string();
    if !extension.starts_with('.') {
        name.push(".");
    }
    name.push(extension);
    PathBuf::from(name)
}

pub fn display_name(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("Untitled"))
}
