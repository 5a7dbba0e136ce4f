use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, Result};

/// The largest image accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// The URL prefix uploaded images are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// The sub-directory an image is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    BlogPosts,
    UserProfiles,
}

impl ImageFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFolder::BlogPosts => "blog-posts",
            ImageFolder::UserProfiles => "user-profiles",
        }
    }
}

/// Stores uploaded images on local disk and hands back their public URL.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory served at [`PUBLIC_PREFIX`].
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates and writes an image, returning the URL it is served at.
    ///
    /// # Arguments
    ///
    /// * `folder` - Where the image is filed.
    /// * `field` - The form field the bytes came from, used in error detail.
    /// * `bytes` - The raw upload.
    ///
    /// # Returns
    ///
    /// A `Result` containing the public URL, e.g. `/uploads/blog-posts/<uuid>.png`.
    pub async fn save(&self, folder: ImageFolder, field: &str, bytes: &[u8]) -> Result<String> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::PayloadTooLarge(
                "File size exceeds the limit".to_string(),
            ));
        }

        if bytes.is_empty() {
            return Err(AppError::field(field, "Image is required"));
        }

        let kind = infer::get(bytes)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .ok_or_else(|| AppError::field(field, "Only image uploads are accepted"))?;

        let dir = self.root.join(folder.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let path = dir.join(&file_name);

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("❌ Failed to write image {}: {}", path.display(), e);
            AppError::Io(e)
        })?;

        tracing::debug!("💾 Stored {} image ({} bytes)", kind.mime_type(), bytes.len());
        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, folder.as_str(), file_name))
    }

    /// Removes a previously stored image. Unknown or foreign URLs are ignored.
    pub async fn discard(&self, public_url: &str) {
        let Some(relative) = public_url.strip_prefix(PUBLIC_PREFIX) else {
            return;
        };
        let relative = Path::new(relative.trim_start_matches('/'));
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            tracing::warn!("Refusing to discard image outside the upload root: {}", public_url);
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!("Could not discard image {}: {}", public_url, e);
        }
    }
}
