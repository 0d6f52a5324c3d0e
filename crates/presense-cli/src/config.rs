//! Client configuration — defaults, optional TOML file, `PRESENSE_*`
//! environment overrides (env wins over file, file over defaults).

use presense_core::TransitionStrategy;
use presense_hw::Facing;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Match (single-shot verify) endpoint.
    pub match_url: String,
    /// Stream (live tick) endpoint.
    pub stream_url: String,
    /// Device path backing the front ("user") facing mode.
    pub front_device: Option<String>,
    /// Device path backing the back ("environment") facing mode.
    pub back_device: Option<String>,
    pub initial_facing: Facing,
    pub jpeg_quality: u8,
    pub fullscreen_strategy: TransitionStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_url: "http://127.0.0.1:8000/verify/match".to_string(),
            stream_url: "http://127.0.0.1:8000/verify/stream".to_string(),
            front_device: Some("/dev/video0".to_string()),
            back_device: None,
            initial_facing: Facing::Front,
            jpeg_quality: 85,
            fullscreen_strategy: TransitionStrategy::Overlay,
        }
    }
}

impl Config {
    /// Load configuration from `PRESENSE_CONFIG` (default
    /// `./presense.toml`) when present, then apply environment
    /// overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PRESENSE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("presense.toml"));

        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&text)?;
            tracing::info!(path = %path.display(), "loaded config file");
            config
        } else {
            Config::default()
        };

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("PRESENSE_MATCH_URL") {
            self.match_url = v;
        }
        if let Ok(v) = std::env::var("PRESENSE_STREAM_URL") {
            self.stream_url = v;
        }
        if let Ok(v) = std::env::var("PRESENSE_FRONT_DEVICE") {
            self.front_device = Some(v);
        }
        if let Ok(v) = std::env::var("PRESENSE_BACK_DEVICE") {
            self.back_device = Some(v);
        }
        if let Ok(v) = std::env::var("PRESENSE_JPEG_QUALITY") {
            match v.parse() {
                Ok(q) => self.jpeg_quality = q,
                Err(_) => tracing::warn!(value = %v, "invalid PRESENSE_JPEG_QUALITY ignored"),
            }
        }
        if let Ok(v) = std::env::var("PRESENSE_FACING") {
            match parse_facing(&v) {
                Some(facing) => self.initial_facing = facing,
                None => tracing::warn!(value = %v, "invalid PRESENSE_FACING ignored"),
            }
        }
        if let Ok(v) = std::env::var("PRESENSE_FULLSCREEN_STRATEGY") {
            match v.as_str() {
                "overlay" => self.fullscreen_strategy = TransitionStrategy::Overlay,
                "platform" => self.fullscreen_strategy = TransitionStrategy::Platform,
                _ => tracing::warn!(value = %v, "invalid PRESENSE_FULLSCREEN_STRATEGY ignored"),
            }
        }
    }
}

pub fn parse_facing(value: &str) -> Option<Facing> {
    match value {
        "front" => Some(Facing::Front),
        "back" => Some(Facing::Back),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.initial_facing, Facing::Front);
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.fullscreen_strategy, TransitionStrategy::Overlay);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            match_url = "https://attendance.example/api/match"
            jpeg_quality = 70
            fullscreen_strategy = "platform"
            initial_facing = "back"
            "#,
        )
        .unwrap();
        assert_eq!(config.match_url, "https://attendance.example/api/match");
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.fullscreen_strategy, TransitionStrategy::Platform);
        assert_eq!(config.initial_facing, Facing::Back);
        // Untouched keys keep their defaults.
        assert_eq!(config.stream_url, "http://127.0.0.1:8000/verify/stream");
    }

    #[test]
    fn test_parse_facing() {
        assert_eq!(parse_facing("front"), Some(Facing::Front));
        assert_eq!(parse_facing("back"), Some(Facing::Back));
        assert_eq!(parse_facing("sideways"), None);
    }
}
