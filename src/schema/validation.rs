//! Input validation for ids, hostnames and paths.
//!
//! Every check here runs before any side effect; a failure is reported to the
//! caller only and never produces a notification.

use regex::Regex;
use std::path::{Component, Path};
use std::sync::LazyLock;

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("slug pattern is valid"));

static SEASON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}\.[0-9]{3}\.[0-9]{2}$").expect("season pattern is valid")
});

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,6}$")
        .expect("domain pattern is valid")
});

/// Validation failures for caller-supplied values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid server id: {0:?}")]
    InvalidServerId(String),

    #[error("Invalid modpack id: {0:?}")]
    InvalidModpackId(String),

    #[error("Invalid season id: {0:?}")]
    InvalidSeasonId(String),

    #[error("Invalid proxy hostname: {0:?}")]
    InvalidHostname(String),

    #[error("Invalid startup script path: {0:?}")]
    InvalidStartupScript(String),

    /// The sequence segment of a season id cannot grow past 999.
    #[error("Season sequence exhausted after {0}")]
    SeasonOverflow(String),
}

pub fn validate_server_id(id: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidServerId(id.to_string()))
    }
}

pub fn validate_modpack_id(id: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidModpackId(id.to_string()))
    }
}

/// Check the fixed `SS.NNN.RR` season id format.
pub fn validate_season_id(id: &str) -> Result<(), ValidationError> {
    if SEASON_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSeasonId(id.to_string()))
    }
}

/// An empty hostname is accepted and means "not routed through the proxy".
pub fn validate_hostname(hostname: &str) -> Result<(), ValidationError> {
    if hostname.is_empty() || DOMAIN_REGEX.is_match(hostname) {
        Ok(())
    } else {
        Err(ValidationError::InvalidHostname(hostname.to_string()))
    }
}

/// Startup scripts live inside the data volume, so they must be relative and
/// must not climb out of it.
pub fn validate_startup_script(path: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidStartupScript(path.to_string());

    if path.trim().is_empty() || path.contains('\0') {
        return Err(invalid());
    }

    let path_ref = Path::new(path);
    if path_ref.is_absolute() {
        return Err(invalid());
    }

    for component in path_ref.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid());
            }
        }
    }

    Ok(())
}
