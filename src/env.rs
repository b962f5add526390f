//! Environment constants and path utilities for the fleet manager.
//!
//! This module centralizes the fixed names the fleet relies on: resource
//! naming prefixes, in-container paths, the game port, and the locations of
//! configuration files.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const EPOXI_DIR_NAME: &str = ".epoxi";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "epoxi.toml";

/// Default row store file name
pub const STORE_FILE_NAME: &str = "store.json";

/// Container and volume naming
pub mod naming {
    /// Prefix for a server's container and its own volume
    pub const SERVER_PREFIX: &str = "epoxi-server-";

    /// Prefix for a season's dataset volume
    pub const SEASON_VOLUME_PREFIX: &str = "epoxi-season_";

    /// Prefix for a modpack's template volume
    pub const MODPACK_VOLUME_PREFIX: &str = "epoxi-modpack_";

    /// Prefix for the disposable volume copy containers
    pub const COPY_CONTAINER_PREFIX: &str = "volume_copy_tmp_";

    /// Length of the random hex suffix on copy containers
    pub const COPY_CONTAINER_SUFFIX_LEN: usize = 4;
}

/// Fixed layout inside game server containers
pub mod server {
    /// Mount point of the dataset volume and working directory
    pub const DATA_DIR: &str = "/server";

    /// TCP port the game listens on
    pub const GAME_PORT: u16 = 25565;

    /// Console command that asks the game to shut down cleanly
    pub const STOP_COMMAND: &str = "stop";

    /// Console command prefix for chat broadcasts
    pub const SAY_COMMAND: &str = "say";
}

/// Mount points used by the volume copy container
pub mod copy {
    /// Read side (template volume)
    pub const SOURCE_DIR: &str = "/from";

    /// Write side (new season volume)
    pub const TARGET_DIR: &str = "/to";

    /// Shell command performing the recursive copy
    pub const COPY_SCRIPT: &str = "cp -a /from/. /to/";
}

/// Build the main .epoxi directory path from a root
pub fn epoxi_dir_path(root: &Path) -> PathBuf {
    root.join(EPOXI_DIR_NAME)
}

/// Build the default store path from a root
pub fn store_file_path(root: &Path) -> PathBuf {
    epoxi_dir_path(root).join(STORE_FILE_NAME)
}

/// Build config directory path in user's home directory
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    home_dir.join(EPOXI_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    epoxi_dir_path(current_dir).join(CONFIG_FILE_NAME)
}
