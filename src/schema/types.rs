use crate::naming;
use crate::schema::validation::{
    ValidationError, validate_hostname, validate_modpack_id, validate_season_id,
    validate_server_id, validate_startup_script,
};
use serde::{Deserialize, Serialize};

/// Java runtime a server or modpack runs on.
///
/// Stored as its major version number; unknown numbers map to the newest
/// supported runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum JavaRuntime {
    Java8,
    Java11,
    Java17,
    #[default]
    Java21,
}

impl JavaRuntime {
    /// Major Java version number.
    pub fn version(&self) -> u32 {
        match self {
            JavaRuntime::Java8 => 8,
            JavaRuntime::Java11 => 11,
            JavaRuntime::Java17 => 17,
            JavaRuntime::Java21 => 21,
        }
    }

    /// Container image providing this runtime.
    pub fn image(&self) -> String {
        format!("eclipse-temurin:{}-jre-alpine", self.version())
    }
}

impl From<u32> for JavaRuntime {
    fn from(version: u32) -> Self {
        match version {
            8 => JavaRuntime::Java8,
            11 => JavaRuntime::Java11,
            17 => JavaRuntime::Java17,
            _ => JavaRuntime::Java21,
        }
    }
}

impl From<JavaRuntime> for u32 {
    fn from(runtime: JavaRuntime) -> Self {
        runtime.version()
    }
}

impl std::fmt::Display for JavaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "java {}", self.version())
    }
}

/// A managed game server.
///
/// The server owns its container and a pointer to its current season; the
/// season rows themselves form an append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub current_season: String,
    #[serde(default)]
    pub proxy_hostname: String,
    pub startup_script: String,
    #[serde(default)]
    pub java_runtime: JavaRuntime,
}

impl Server {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_server_id(&self.id)?;
        validate_season_id(&self.current_season)?;
        validate_hostname(&self.proxy_hostname)?;
        validate_startup_script(&self.startup_script)?;
        Ok(())
    }

    pub fn container_name(&self) -> String {
        naming::container_name(&self.id)
    }

    pub fn volume_name(&self) -> String {
        naming::server_volume_name(&self.id)
    }

    pub fn image(&self) -> String {
        self.java_runtime.image()
    }

    pub fn startup_command(&self) -> String {
        naming::startup_command(&self.startup_script)
    }

    /// Id of the season that follows the current one.
    pub fn next_season_id(&self) -> Result<String, ValidationError> {
        naming::next_season_id(&self.current_season)
    }
}

/// A template dataset plus the runtime it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modpack {
    pub id: String,
    pub startup_script: String,
    #[serde(default)]
    pub java_runtime: JavaRuntime,
}

impl Modpack {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_modpack_id(&self.id)?;
        validate_startup_script(&self.startup_script)?;
        Ok(())
    }

    /// Template volume the season datasets are cloned from.
    pub fn volume_name(&self) -> String {
        naming::modpack_volume_name(&self.id)
    }

    pub fn image(&self) -> String {
        self.java_runtime.image()
    }

    pub fn startup_command(&self) -> String {
        naming::startup_command(&self.startup_script)
    }
}

/// One immutable generation of a server's dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub modpack_id: String,
}

impl Season {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_season_id(&self.id)?;
        validate_modpack_id(&self.modpack_id)?;
        Ok(())
    }

    /// The season that follows the server's current one, cloned from `modpack`.
    pub fn next_for(server: &Server, modpack: &Modpack) -> Result<Self, ValidationError> {
        Ok(Self {
            id: server.next_season_id()?,
            modpack_id: modpack.id.clone(),
        })
    }

    pub fn volume_name(&self) -> String {
        naming::season_volume_name(&self.id)
    }
}

/// Live status of a server's container, computed per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub server_id: String,
    pub running: bool,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_usage: u64,
}

impl ServerStatus {
    /// Status reported when no sample could be taken.
    pub fn not_running(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            running: false,
            cpu_percent: 0.0,
            memory_percent: 0.0,
            memory_usage: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Server {
        Server {
            id: "01".to_string(),
            name: "Main".to_string(),
            current_season: "01.004.00".to_string(),
            proxy_hostname: "mc.example.org".to_string(),
            startup_script: "start.sh".to_string(),
            java_runtime: JavaRuntime::Java17,
        }
    }

    #[test]
    fn test_java_runtime_images() {
        assert_eq!(JavaRuntime::Java8.image(), "eclipse-temurin:8-jre-alpine");
        assert_eq!(JavaRuntime::from(17), JavaRuntime::Java17);
        assert_eq!(JavaRuntime::from(99), JavaRuntime::Java21);
    }

    #[test]
    fn test_java_runtime_serializes_as_number() {
        let json = serde_json::to_string(&JavaRuntime::Java11).unwrap();
        assert_eq!(json, "11");
        let parsed: JavaRuntime = serde_json::from_str("8").unwrap();
        assert_eq!(parsed, JavaRuntime::Java8);
    }

    #[test]
    fn test_server_derived_names() {
        let server = server();
        assert!(server.validate().is_ok());
        assert_eq!(server.container_name(), "epoxi-server-01");
        assert_eq!(server.volume_name(), "epoxi-server-01");
        assert_eq!(server.startup_command(), "/server/start.sh");
        assert_eq!(server.image(), "eclipse-temurin:17-jre-alpine");
    }

    #[test]
    fn test_server_validation_rejects_bad_fields() {
        let mut bad = server();
        bad.proxy_hostname = "not a host".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidHostname(_))
        ));

        let mut bad = server();
        bad.current_season = "1.2.3".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidSeasonId(_))
        ));
    }

    #[test]
    fn test_next_season() {
        let modpack = Modpack {
            id: "vanilla".to_string(),
            startup_script: "run.sh".to_string(),
            java_runtime: JavaRuntime::Java21,
        };
        let season = Season::next_for(&server(), &modpack).unwrap();

        assert_eq!(season.id, "01.005.00");
        assert_eq!(season.modpack_id, "vanilla");
        assert_eq!(season.volume_name(), "epoxi-season_01.005.00");
        assert_eq!(modpack.volume_name(), "epoxi-modpack_vanilla");
    }

    #[test]
    fn test_not_running_status() {
        let status = ServerStatus::not_running("01");
        assert!(!status.running);
        assert_eq!(status.cpu_percent, 0.0);
        assert_eq!(status.memory_percent, 0.0);
        assert_eq!(status.memory_usage, 0);
    }
}
