//! Naming and identity derivation.
//!
//! Pure functions mapping entity ids onto container, volume and season
//! names. Everything the runtime sees is named through here.

use crate::env::{copy, naming, server};
use crate::schema::validation::{ValidationError, validate_season_id};
use rand::Rng;
use std::path::Path;

/// Largest value the sequence segment of a season id can hold.
pub const MAX_SEASON_SEQUENCE: u32 = 999;

/// Container name of a server.
pub fn container_name(server_id: &str) -> String {
    format!("{}{}", naming::SERVER_PREFIX, server_id)
}

/// Volume a freshly created server mounts before its first rotation.
pub fn server_volume_name(server_id: &str) -> String {
    format!("{}{}", naming::SERVER_PREFIX, server_id)
}

pub fn season_volume_name(season_id: &str) -> String {
    format!("{}{}", naming::SEASON_VOLUME_PREFIX, season_id)
}

pub fn modpack_volume_name(modpack_id: &str) -> String {
    format!("{}{}", naming::MODPACK_VOLUME_PREFIX, modpack_id)
}

/// Season a newly registered server starts at.
pub fn initial_season_id(server_id: &str) -> String {
    format!("{}.000.00", server_id)
}

/// Derive the next season id: same server segment, sequence segment plus one
/// (zero-padded to 3 digits), same reserved segment.
pub fn next_season_id(current: &str) -> Result<String, ValidationError> {
    validate_season_id(current)?;

    let mut segments = current.split('.');
    let (Some(server_segment), Some(sequence), Some(reserved)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(ValidationError::InvalidSeasonId(current.to_string()));
    };

    let sequence: u32 = sequence
        .parse()
        .map_err(|_| ValidationError::InvalidSeasonId(current.to_string()))?;

    if sequence >= MAX_SEASON_SEQUENCE {
        return Err(ValidationError::SeasonOverflow(current.to_string()));
    }

    Ok(format!(
        "{}.{:03}.{}",
        server_segment,
        sequence + 1,
        reserved
    ))
}

/// Absolute path of a startup script inside the server data directory.
pub fn startup_command(startup_script: &str) -> String {
    Path::new(server::DATA_DIR)
        .join(startup_script)
        .to_string_lossy()
        .into_owned()
}

/// Unique name for a disposable volume copy container.
pub fn copy_container_name() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..naming::COPY_CONTAINER_SUFFIX_LEN)
        .map(|_| {
            let digit: u32 = rng.random_range(0..16);
            char::from_digit(digit, 16).unwrap_or('0')
        })
        .collect();
    format!("{}{}", naming::COPY_CONTAINER_PREFIX, suffix)
}

/// Shell invocation the copy container runs.
pub fn copy_command() -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        copy::COPY_SCRIPT.to_string(),
    ]
}

/// A console broadcast line.
pub fn say_command(message: &str) -> String {
    format!("{} {}", server::SAY_COMMAND, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        assert_eq!(container_name("01"), "epoxi-server-01");
        assert_eq!(server_volume_name("01"), "epoxi-server-01");
        assert_eq!(season_volume_name("01.005.00"), "epoxi-season_01.005.00");
        assert_eq!(modpack_volume_name("vanilla"), "epoxi-modpack_vanilla");
        assert_eq!(initial_season_id("07"), "07.000.00");
    }

    #[test]
    fn test_next_season_id() {
        assert_eq!(next_season_id("01.004.00").unwrap(), "01.005.00");
        assert_eq!(next_season_id("01.009.00").unwrap(), "01.010.00");
        assert_eq!(next_season_id("02.099.07").unwrap(), "02.100.07");
        assert_eq!(next_season_id("02.998.00").unwrap(), "02.999.00");
    }

    #[test]
    fn test_next_season_id_keeps_outer_segments() {
        for current in ["00.000.00", "42.123.99", "99.500.01"] {
            let next = next_season_id(current).unwrap();
            assert_eq!(next[..3], current[..3]);
            assert_eq!(next[6..], current[6..]);
        }
    }

    #[test]
    fn test_next_season_id_overflow() {
        assert_eq!(
            next_season_id("01.999.00"),
            Err(ValidationError::SeasonOverflow("01.999.00".to_string()))
        );
    }

    #[test]
    fn test_next_season_id_rejects_malformed() {
        assert!(matches!(
            next_season_id("1.4.0"),
            Err(ValidationError::InvalidSeasonId(_))
        ));
    }

    #[test]
    fn test_copy_container_name() {
        let name = copy_container_name();
        assert!(name.starts_with("volume_copy_tmp_"));
        let suffix = &name["volume_copy_tmp_".len()..];
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_commands() {
        assert_eq!(startup_command("start.sh"), "/server/start.sh");
        assert_eq!(startup_command("bin/run.sh"), "/server/bin/run.sh");
        assert_eq!(say_command("hello"), "say hello");
        assert_eq!(copy_command()[2], "cp -a /from/. /to/");
    }
}
