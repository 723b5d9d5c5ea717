use sunshine_core::{AppError, TransportFailure};
use sunshine_sync::TransportError;
use thiserror::Error;

/// Problems decoding something the phone sent.
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("Undecodable weather bundle: {0}")]
    Bundle(#[from] TransportError),

    #[error("Undecodable weather icon: {0}")]
    Icon(#[from] image::ImageError),

    #[error("Icon data item has no '{0}' asset")]
    MissingAsset(String),
}

impl From<FaceError> for AppError {
    fn from(err: FaceError) -> Self {
        match err {
            FaceError::Bundle(e) => e.into(),
            other => AppError::Transport(TransportFailure::Rejected(other.to_string())),
        }
    }
}
