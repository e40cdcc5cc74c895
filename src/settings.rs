use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineSettings {
    pub workers: Option<usize>,    // Worker threads (pool) or units (halo)
    pub base_chunk: Option<usize>, // Rows in the smallest scheduler chunk
    pub timeout_secs: Option<u64>, // Bounded completion wait, in seconds
    pub output: Option<PathBuf>,   // Final world file
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parlife")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_leaves_the_rest_defaulted() {
        let settings: Settings = toml::from_str("[engine]\nworkers = 8\n").unwrap();
        assert_eq!(settings.engine.workers, Some(8));
        assert_eq!(settings.engine.base_chunk, None);
        assert_eq!(settings.engine.timeout_secs, None);
        assert_eq!(settings.engine.output, None);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.engine.workers, None);
    }
}
