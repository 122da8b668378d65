/// Configuration management
use crate::error::{FabricError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_FIRST_ADDRESS: u64 = 1;

/// Fabric configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First address handed out by the default allocator
    pub first_address: u64,

    /// Keep dropped messages around for inspection instead of discarding them
    pub capture_dead_letters: bool,

    /// Scenario file to run (the built-in demo runs when absent)
    pub scenario: Option<PathBuf>,

    /// Print step outcomes as JSON instead of text
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            first_address: DEFAULT_FIRST_ADDRESS,
            capture_dead_letters: false,
            scenario: None,
            json_output: false,
        }
    }
}

impl Config {
    /// Create config from command line arguments
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--first-address" => {
                    let n = args.get(i + 1).ok_or_else(|| {
                        FabricError::Config("--first-address requires a number".to_string())
                    })?;
                    config.first_address = parse_first_address(n)?;
                    i += 2;
                }
                "--config" => {
                    let path = args.get(i + 1).ok_or_else(|| {
                        FabricError::Config("--config requires a path argument".to_string())
                    })?;
                    let scenario = config.scenario.take();
                    config = Self::from_file(Path::new(path))?;
                    config.scenario = scenario.or(config.scenario);
                    i += 2;
                }
                "--dead-letters" => {
                    config.capture_dead_letters = true;
                    i += 1;
                }
                "--json" => {
                    config.json_output = true;
                    i += 1;
                }
                other if other.starts_with("--") => {
                    return Err(FabricError::Config(format!(
                        "Unknown flag: {}\nUsage: {} [scenario.json] [--config <path>] [--first-address <n>] [--dead-letters] [--json]",
                        other,
                        args.first().map(String::as_str).unwrap_or("fabric")
                    )));
                }
                other => {
                    config.scenario = Some(PathBuf::from(other));
                    i += 1;
                }
            }
        }

        // Env overrides (nice for scripts)
        if let Ok(n) = std::env::var("FABRIC_FIRST_ADDRESS") {
            config.first_address = parse_first_address(&n)?;
        }
        if let Ok(raw) = std::env::var("FABRIC_DEAD_LETTERS") {
            config.capture_dead_letters = parse_switch("FABRIC_DEAD_LETTERS", &raw)?;
        }

        Ok(config)
    }

    /// Load config from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(FabricError::Io)?;
        let config: Self = serde_json::from_str(&raw).map_err(FabricError::Serialization)?;
        if config.first_address == 0 {
            return Err(FabricError::Config(
                "first_address must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

fn parse_first_address(raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(FabricError::Config(format!(
            "first address must be a positive integer, got {:?}",
            raw
        ))),
        Ok(n) => Ok(n),
    }
}

fn parse_switch(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(FabricError::Config(format!(
            "{} must be a boolean (1/0, true/false), got {:?}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("fabric")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.first_address, 1);
        assert!(!config.capture_dead_letters);
        assert!(config.scenario.is_none());
    }

    #[test]
    fn test_from_args_flags() {
        let config =
            Config::from_args(&args(&["demo.json", "--first-address", "10", "--json"])).unwrap();
        assert_eq!(config.first_address, 10);
        assert!(config.json_output);
        assert_eq!(config.scenario, Some(PathBuf::from("demo.json")));
    }

    #[test]
    fn test_from_args_rejects_zero_address() {
        let err = Config::from_args(&args(&["--first-address", "0"])).unwrap_err();
        assert!(matches!(err, FabricError::Config(_)));
    }

    #[test]
    fn test_from_args_missing_value() {
        assert!(Config::from_args(&args(&["--first-address"])).is_err());
    }

    #[test]
    fn test_from_args_unknown_flag() {
        assert!(Config::from_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_parse_switch_values() {
        assert!(parse_switch("X", "1").unwrap());
        assert!(parse_switch("X", "TRUE").unwrap());
        assert!(!parse_switch("X", "0").unwrap());
        assert!(!parse_switch("X", "false").unwrap());
        assert!(!parse_switch("X", "").unwrap());
        assert!(matches!(parse_switch("X", "maybe"), Err(FabricError::Config(_))));
    }

    #[test]
    fn test_from_args_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"first_address": 5, "json_output": true, "scenario": "from-file.json"}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        // Positional scenario wins over the file's; later flags still apply
        let config = Config::from_args(&args(&[
            "cli.json",
            "--config",
            path.as_str(),
            "--dead-letters",
        ]))
        .unwrap();
        assert_eq!(config.first_address, 5);
        assert!(config.json_output);
        assert!(config.capture_dead_letters);
        assert_eq!(config.scenario, Some(PathBuf::from("cli.json")));

        // Without a positional path the file's scenario is kept
        let config = Config::from_args(&args(&["--config", path.as_str()])).unwrap();
        assert_eq!(config.scenario, Some(PathBuf::from("from-file.json")));
    }

    #[test]
    fn test_from_args_config_missing_path() {
        assert!(matches!(
            Config::from_args(&args(&["--config"])),
            Err(FabricError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"capture_dead_letters": true}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.capture_dead_letters);
        assert_eq!(config.first_address, 1);
    }

    #[test]
    fn test_from_file_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, FabricError::Serialization(_)));
    }
}
