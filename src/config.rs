use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defs::DEFAULT_CHANNEL;

#[derive(Debug, Clone)]
pub struct BingoConfig {
    pub data_dir: PathBuf,
    pub channel: String,
    pub clear_lock_ttl_ms: i64,
    pub event: String,
    pub log_file: String,
    pub verbose: bool,
}

impl Default for BingoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            channel: DEFAULT_CHANNEL.to_string(),
            clear_lock_ttl_ms: 1500,
            event: "alumni".to_string(),
            log_file: "bingo.log".to_string(),
            verbose: false,
        }
    }
}

impl BingoConfig {
    pub const DEFAULT_PATH: &'static str = "conf/bingo.conf";

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config_map = parse_config(&content)?;
        Ok(Self::from_map(&config_map))
    }

    fn from_map(config_map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let data_dir = config_map.get("data_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let channel = config_map.get("channel")
            .filter(|c| !c.is_empty())
            .cloned()
            .unwrap_or(defaults.channel);

        let clear_lock_ttl_ms = config_map.get("clear_lock_ttl_ms")
            .and_then(|t| t.parse::<i64>().ok())
            .filter(|t| *t > 0)
            .unwrap_or(defaults.clear_lock_ttl_ms);

        let event = config_map.get("event")
            .map(|e| e.to_lowercase())
            .unwrap_or(defaults.event);

        let log_file = config_map.get("log_file")
            .cloned()
            .unwrap_or(defaults.log_file);

        let verbose = config_map.get("verbose")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.verbose);

        BingoConfig { data_dir, channel, clear_lock_ttl_ms, event, log_file, verbose }
    }

    pub fn load_or_default() -> Self {
        Self::load_from_or_default(Self::DEFAULT_PATH)
    }

    pub fn load_from_or_default<P: AsRef<Path>>(config_path: P) -> Self {
        let config_path = config_path.as_ref();
        match Self::from_file(config_path) {
            Ok(config) => {
                println!("📄 Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                println!("⚠️  Could not load config from {}: {}. Using defaults.", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Log file location; an empty `log_file` disables file logging.
    pub fn log_path(&self) -> Option<PathBuf> {
        if self.log_file.is_empty() {
            None
        } else {
            Some(self.data_dir.join(&self.log_file))
        }
    }

    /// Point the logger at the configured file and verbosity.
    pub fn init_logging(&self) {
        crate::logging::set_verbose(self.verbose);
        if let Some(path) = self.log_path() {
            if let Err(e) = crate::logging::init_log_file(&path) {
                eprintln!("⚠️  Could not open log file {}: {}. Logging to stderr.", path.display(), e);
            }
        }
    }
}

fn parse_config(content: &str) -> Result<HashMap<String, String>, Box<dyn std::error::Error>> {
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Parse key = value pairs
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_string();
            let value = value.trim().to_string();
            config.insert(key, value);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
            # This is a comment
            data_dir = /var/lib/bingo
            channel = hall_a
            # Another comment
            clear_lock_ttl_ms = 500
        "#;

        let config = parse_config(content).unwrap();
        assert_eq!(config.get("data_dir"), Some(&"/var/lib/bingo".to_string()));
        assert_eq!(config.get("channel"), Some(&"hall_a".to_string()));
        assert_eq!(config.get("clear_lock_ttl_ms"), Some(&"500".to_string()));
    }

    #[test]
    fn test_bingo_config_default() {
        let config = BingoConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.channel, "bingo_channel");
        assert_eq!(config.clear_lock_ttl_ms, 1500);
        assert_eq!(config.event, "alumni");
        assert!(!config.verbose);
        assert_eq!(config.log_path(), Some(PathBuf::from("data/bingo.log")));
    }

    #[test]
    fn test_bingo_config_from_map() {
        let content = "event = BATA\nverbose = yes\nclear_lock_ttl_ms = -4\nlog_file =\n";
        let config = BingoConfig::from_map(&parse_config(content).unwrap());
        assert_eq!(config.event, "bata");
        assert!(config.verbose);
        // Non-positive ttl falls back to the default
        assert_eq!(config.clear_lock_ttl_ms, 1500);
        assert_eq!(config.log_path(), None);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = BingoConfig::load_from_or_default("conf/does_not_exist.conf");
        assert_eq!(config.channel, "bingo_channel");
    }
}
