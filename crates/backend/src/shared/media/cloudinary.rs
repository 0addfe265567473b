use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{MediaError, MediaHost};

/// Cloudinary upload API client using signed requests.
pub struct CloudinaryHost {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.cloud_name, action
        )
    }

    /// Adds `timestamp`, `api_key` and the signature to `params`.
    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", chrono::Utc::now().timestamp().to_string()));
        let signature = sign(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params
    }
}

/// Parameters sorted by name, joined as `a=1&b=2`, followed by the secret.
fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Public id of a delivery URL: the path after `/upload/` without the
/// version segment and the extension.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/upload/")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments
        .first()
        .is_some_and(|s| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit()))
    {
        segments.remove(0);
    }
    let last = segments.pop()?;
    let stem = last.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(last);
    segments.push(stem);
    let id = segments.join("/");
    let id = urlencoding::decode(&id).map(|s| s.into_owned()).unwrap_or(id);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        super::check_image_type(content_type)?;

        let file = format!(
            "data:{};base64,{}",
            content_type,
            general_purpose::STANDARD.encode(&bytes)
        );
        let mut form = self.signed(vec![("folder", folder.to_string())]);
        form.push(("file", file));

        tracing::debug!("Uploading {} bytes to Cloudinary folder {}", bytes.len(), folder);
        let response = self
            .client
            .post(self.endpoint("upload"))
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::HostError(format!("HTTP {}: {}", status, e)))?;

        if let Some(error) = body.error {
            return Err(MediaError::HostError(error.message));
        }
        body.secure_url
            .ok_or_else(|| MediaError::HostError(format!("HTTP {}: no secure_url", status)))
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let Some(public_id) = public_id_from_url(url) else {
            tracing::debug!("Not a Cloudinary URL, skipping delete: {}", url);
            return Ok(());
        };

        let form = self.signed(vec![("public_id", public_id.clone())]);
        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::NetworkError(e.to_string()))?;

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::HostError(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(MediaError::HostError(error.message));
        }
        match body.result.as_deref() {
            Some("ok") => tracing::info!("Deleted image {}", public_id),
            other => tracing::warn!("Image {} not deleted: {:?}", public_id, other),
        }
        Ok(())
    }

    fn host_name(&self) -> &str {
        "cloudinary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_drops_version_and_extension() {
        assert_eq!(
            public_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/v1712345678/bassorilla/productos/agua-dulce/carretes/abc123.jpg"
            )
            .as_deref(),
            Some("bassorilla/productos/agua-dulce/carretes/abc123")
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/sample.png?x=1").as_deref(),
            Some("sample")
        );
        assert_eq!(public_id_from_url("https://example.com/a.png"), None);
    }

    #[test]
    fn signature_sorts_parameters() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("folder", "bassorilla/publicidad".to_string()),
        ];
        let reversed: Vec<(&str, String)> = params.iter().rev().cloned().collect();
        let signature = sign(&params, "secret");
        assert_eq!(signature, sign(&reversed, "secret"));
        assert_eq!(signature.len(), 64);
        assert_ne!(signature, sign(&params, "other"));
    }
}
