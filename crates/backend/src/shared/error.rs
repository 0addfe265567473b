use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::media::MediaError;

/// Failures handlers translate into specific status codes. Anything else
/// wrapped in `anyhow::Error` becomes a 500.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data store unavailable: {0}")]
    DataStoreUnavailable(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::DataStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Status code for a service failure, logging the ones that are our fault.
pub fn status_for(context: &str, err: &anyhow::Error) -> StatusCode {
    if let Some(known) = err.downcast_ref::<ServiceError>() {
        tracing::warn!("{}: {}", context, known);
        return known.status_code();
    }
    if let Some(media) = err.downcast_ref::<MediaError>() {
        tracing::error!("{}: {}", context, media);
        return match media {
            MediaError::UnsupportedType(_) | MediaError::Empty => StatusCode::BAD_REQUEST,
            MediaError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            MediaError::HostError(_) | MediaError::NetworkError(_) => StatusCode::BAD_GATEWAY,
        };
    }
    tracing::error!("{}: {:#}", context, err);
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_keep_their_status() {
        let err: anyhow::Error = ServiceError::Validation("El título es obligatorio".into()).into();
        assert_eq!(status_for("create", &err), StatusCode::BAD_REQUEST);
        let err: anyhow::Error = ServiceError::NotFound("Producto".into()).into();
        assert_eq!(status_for("get", &err), StatusCode::NOT_FOUND);
        let err: anyhow::Error = MediaError::UnsupportedType("text/plain".into()).into();
        assert_eq!(status_for("upload", &err), StatusCode::BAD_REQUEST);
        let err = anyhow::anyhow!("disk I/O error");
        assert_eq!(status_for("get", &err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
