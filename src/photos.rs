//! Environment photo storage.
//!
//! Photos live under the public directory so they can be served as static
//! files. Records only keep the `{filename, folder}` pair; the on-disk path is
//! always `<public_dir><folder><filename>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;
use utoipa::ToSchema;

/// Public folder every environment photo is stored in.
pub const PHOTO_FOLDER: &str = "/img/environments/";

const MAX_EXTENSION_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotoRef {
    pub filename: String,
    pub folder: String,
}

impl PhotoRef {
    #[must_use]
    pub fn new(filename: String) -> Self {
        Self {
            filename,
            folder: PHOTO_FOLDER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photo storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid photo location: {0}")]
    InvalidLocation(String),
}

/// File side of an environment photo's lifecycle.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Persist an uploaded photo and return its reference.
    async fn save(&self, original_name: Option<&str>, bytes: &[u8])
    -> Result<PhotoRef, PhotoError>;

    /// Remove a stored photo. Removing a photo that is already gone succeeds.
    async fn delete(&self, photo: &PhotoRef) -> Result<(), PhotoError>;
}

#[derive(Clone, Debug)]
pub struct LocalPhotoStorage {
    public_dir: PathBuf,
}

impl LocalPhotoStorage {
    #[must_use]
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    #[must_use]
    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Resolve a photo reference to its on-disk path, refusing anything that
    /// would escape the public directory.
    ///
    /// # Errors
    /// Returns `PhotoError::InvalidLocation` for empty names, nested names, or
    /// folders containing parent components.
    pub fn path_for(&self, photo: &PhotoRef) -> Result<PathBuf, PhotoError> {
        let filename = photo.filename.as_str();
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            return Err(PhotoError::InvalidLocation(photo.filename.clone()));
        }

        let folder = Path::new(photo.folder.trim_start_matches('/'));
        if !folder
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(PhotoError::InvalidLocation(photo.folder.clone()));
        }

        Ok(self.public_dir.join(folder).join(filename))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn save(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<PhotoRef, PhotoError> {
        let filename = match original_name.and_then(extension) {
            Some(ext) => format!("{}.{ext}", Ulid::new()),
            None => Ulid::new().to_string(),
        };
        let photo = PhotoRef::new(filename);
        let path = self.path_for(&photo)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "stored environment photo");

        Ok(photo)
    }

    async fn delete(&self, photo: &PhotoRef) -> Result<(), PhotoError> {
        let path = self.path_for(photo)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed environment photo");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "environment photo already missing");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Lowercased extension of an uploaded file name, if it looks like one.
fn extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension("lab.JPG"), Some("jpg".to_string()));
        assert_eq!(extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("weird.p$p"), None);
        assert_eq!(extension("long.abcdefghijk"), None);
    }

    #[test]
    fn path_for_rejects_traversal() {
        let storage = LocalPhotoStorage::new("/srv/public");

        let nested = PhotoRef::new("../etc/passwd".to_string());
        assert!(storage.path_for(&nested).is_err());

        let parent_folder = PhotoRef {
            filename: "a.png".to_string(),
            folder: "/img/../../".to_string(),
        };
        assert!(storage.path_for(&parent_folder).is_err());

        let empty = PhotoRef::new(String::new());
        assert!(storage.path_for(&empty).is_err());
    }

    #[test]
    fn path_for_joins_folder_under_public_dir() {
        let storage = LocalPhotoStorage::new("/srv/public");
        let photo = PhotoRef::new("01H.png".to_string());
        assert_eq!(
            storage.path_for(&photo).unwrap(),
            PathBuf::from("/srv/public/img/environments/01H.png")
        );
    }

    #[tokio::test]
    async fn save_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path());

        let photo = storage.save(Some("room.png"), b"png-bytes").await.unwrap();
        assert_eq!(photo.folder, PHOTO_FOLDER);
        assert!(photo.filename.ends_with(".png"));

        let path = storage.path_for(&photo).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");

        storage.delete(&photo).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn save_generates_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path());

        let first = storage.save(Some("a.jpg"), b"1").await.unwrap();
        let second = storage.save(Some("a.jpg"), b"2").await.unwrap();
        assert_ne!(first.filename, second.filename);
    }

    #[tokio::test]
    async fn delete_missing_photo_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path());
        let photo = PhotoRef::new("gone.png".to_string());
        assert!(storage.delete(&photo).await.is_ok());
    }
}
