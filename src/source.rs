//! Obtaining the vCard text, either from disk or over HTTP(S).

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::expand_tilde;
use crate::error::LoadError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the vCard text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_http_url(trimmed) {
            Source::Url(trimmed.to_string())
        } else {
            Source::File(expand_tilde(&PathBuf::from(trimmed)))
        }
    }

    /// Human-readable name used in messages.
    pub fn display_name(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Url(url) => url.clone(),
        }
    }
}

fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Read the complete vCard text from `source`.
pub fn load(source: &Source) -> Result<String, LoadError> {
    let bytes = match source {
        Source::File(path) => {
            debug!(path = %path.display(), "reading vCard file");
            fs::read(path).map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })?
        }
        Source::Url(url) => fetch(url)?,
    };

    Ok(decode(bytes, source))
}

/// UTF-8 text, with invalid sequences replaced by U+FFFD so the remaining
/// fields still render.
fn decode(bytes: Vec<u8>, source: &Source) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                source = %source.display_name(),
                "vCard is not valid UTF-8; undecodable bytes replaced"
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

fn fetch(url: &str) -> Result<Vec<u8>, LoadError> {
    debug!(%url, "fetching vCard");
    let fetch_err = |source| LoadError::Fetch {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    let response = client.get(url).send().map_err(fetch_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().map_err(fetch_err)?;
    Ok(body.to_vec())
}
