//! Runtime configuration for the game server

use shared::{DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;

/// Settings the server library needs at startup.
///
/// The binary builds this from command-line arguments; tests build it
/// directly so they can use short timers and throwaway data directories.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the credential and leaderboard tables
    pub data_dir: PathBuf,
    /// Optional word list, one word per line
    pub words_file: Option<PathBuf>,
    /// Opt-in window between the first start request and the round
    pub countdown: Duration,
    /// Length of an active round
    pub round_duration: Duration,
    /// How long one frame may take to reach a client before it is dropped
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("data"),
            words_file: None,
            countdown: Duration::from_secs(10),
            round_duration: Duration::from_secs(60),
            write_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.data_dir.join("leaderboard.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:65432");
        assert_eq!(config.countdown, Duration::from_secs(10));
        assert!(config.round_duration > config.countdown);
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert!(config.words_file.is_none());
    }

    #[test]
    fn test_table_paths_live_in_data_dir() {
        let config = ServerConfig {
            data_dir: PathBuf::from("/var/lib/anagrams"),
            ..ServerConfig::default()
        };

        assert_eq!(
            config.credentials_path(),
            PathBuf::from("/var/lib/anagrams/credentials.json")
        );
        assert_eq!(
            config.leaderboard_path(),
            PathBuf::from("/var/lib/anagrams/leaderboard.json")
        );
    }
}
