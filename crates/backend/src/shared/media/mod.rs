pub mod cloudinary;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;

use crate::shared::config::MediaConfig;
use crate::shared::text::sanitize_for_folder;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media uploads are not configured")]
    NotConfigured,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Empty upload")]
    Empty,

    #[error("Media host error: {0}")]
    HostError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Image hosting used by the admin forms.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Stores the image under `folder` and returns its public HTTPS URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, MediaError>;

    /// Removes a previously uploaded image. Unknown URLs are not an error.
    async fn delete(&self, url: &str) -> Result<(), MediaError>;

    fn host_name(&self) -> &str;
}

/// Used when no credentials are configured.
pub struct DisabledMediaHost;

#[async_trait]
impl MediaHost for DisabledMediaHost {
    async fn upload(&self, _: Vec<u8>, _: &str, _: &str) -> Result<String, MediaError> {
        Err(MediaError::NotConfigured)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        tracing::debug!("Media host disabled, keeping {}", url);
        Ok(())
    }

    fn host_name(&self) -> &str {
        "disabled"
    }
}

static MEDIA_HOST: OnceCell<Arc<dyn MediaHost>> = OnceCell::new();

pub fn initialize(config: &MediaConfig) {
    let host: Arc<dyn MediaHost> = match config.credentials() {
        Some((cloud_name, api_key, api_secret)) => Arc::new(cloudinary::CloudinaryHost::new(
            cloud_name, api_key, api_secret,
        )),
        None => {
            tracing::warn!("Cloudinary credentials missing, image uploads are disabled");
            Arc::new(DisabledMediaHost)
        }
    };
    tracing::info!("Media host: {}", host.host_name());
    if MEDIA_HOST.set(host).is_err() {
        tracing::warn!("Media host already initialized");
    }
}

pub fn host() -> Arc<dyn MediaHost> {
    MEDIA_HOST
        .get_or_init(|| Arc::new(DisabledMediaHost))
        .clone()
}

/// `<root>/productos/<department>/<category>`
pub fn product_folder(root: &str, department: &str, category: &str) -> String {
    format!(
        "{}/productos/{}/{}",
        root,
        sanitize_for_folder(department),
        sanitize_for_folder(category)
    )
}

pub fn banner_folder(root: &str) -> String {
    format!("{}/publicidad", root)
}

pub fn check_image_type(content_type: &str) -> Result<(), MediaError> {
    if content_type.starts_with("image/") {
        Ok(())
    } else {
        Err(MediaError::UnsupportedType(content_type.to_string()))
    }
}
