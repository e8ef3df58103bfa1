use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain the vCard text. Parsing itself never fails, so this is
/// the only error a card render can surface before extraction runs.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read vCard file at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch vCard from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// QR code generation errors.
#[derive(Error, Debug)]
pub enum QrError {
    #[error("QR generation failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("QR image would exceed {limit} pixels per side; lower qr.box_size, qr.border or qr.white_pad")]
    TooLarge { limit: u32 },

    #[error("logo not found: {}", .0.display())]
    LogoMissing(PathBuf),

    #[error("failed to load logo {}", .path.display())]
    Logo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
