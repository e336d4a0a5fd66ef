//! Game configuration (terrain seed, restart rules, runner limits). Loaded
//! from config.ron at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::session::{RestartPolicy, SessionConfig};

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Terrain seed. Leave out for a different level every run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    /// World units of terrain kept ahead of the ball.
    #[serde(default = "default_look_ahead")]
    pub look_ahead: f32,
    #[serde(default = "default_initial_segments")]
    pub initial_segments: usize,
    /// Distance below the lowest terrain before the ball is lost.
    #[serde(default = "default_fall_margin")]
    pub fall_margin: f32,
    /// Simulation rate in Hz.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f64,
    /// Text to roll over when nothing is piped in.
    #[serde(default)]
    pub text_file: Option<PathBuf>,
    /// Frames the headless runner simulates before giving up.
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,
    /// Runs the headless runner plays, restarting after each game over.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_look_ahead() -> f32 {
    50.0
}
fn default_initial_segments() -> usize {
    5
}
fn default_fall_margin() -> f32 {
    10.0
}
fn default_tick_rate() -> f64 {
    60.0
}
fn default_max_frames() -> u64 {
    60 * 60 * 5
}
fn default_attempts() -> u32 {
    3
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            restart_policy: RestartPolicy::default(),
            look_ahead: default_look_ahead(),
            initial_segments: default_initial_segments(),
            fall_margin: default_fall_margin(),
            tick_rate: default_tick_rate(),
            text_file: None,
            max_frames: default_max_frames(),
            attempts: default_attempts(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(data) => match ron::from_str(&data) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.sanitize();
        config
    }

    /// Write config as pretty ron. Logs on error.
    pub fn save_to(&self, path: &Path) {
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    /// Replace values the simulation cannot run with.
    fn sanitize(&mut self) {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            log::warn!("tick_rate {} is not usable, using {}", self.tick_rate, default_tick_rate());
            self.tick_rate = default_tick_rate();
        }
        if !(self.look_ahead.is_finite() && self.look_ahead > 0.0) {
            log::warn!("look_ahead {} is not usable, using {}", self.look_ahead, default_look_ahead());
            self.look_ahead = default_look_ahead();
        }
        if !self.fall_margin.is_finite() {
            self.fall_margin = default_fall_margin();
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let mut session = SessionConfig {
            initial_segments: self.initial_segments,
            look_ahead: self.look_ahead,
            fall_margin: self.fall_margin,
            restart_policy: self.restart_policy,
            ..Default::default()
        };
        session.generator.seed = self.seed;
        session
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("textroll-{}-{name}.ron", std::process::id()))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = GameConfig::load_from(&temp_path("missing"));
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_path("partial");
        std::fs::write(&path, "(seed: Some(7), restart_policy: Continue)").unwrap();
        let config = GameConfig::load_from(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.restart_policy, RestartPolicy::Continue);
        assert_eq!(config.look_ahead, 50.0);
        assert_eq!(config.initial_segments, 5);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = temp_path("invalid");
        std::fs::write(&path, "(seed: \"not a number\"").unwrap();
        let config = GameConfig::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn unusable_rates_are_replaced() {
        let path = temp_path("rates");
        std::fs::write(&path, "(tick_rate: 0.0, look_ahead: -4.0)").unwrap();
        let config = GameConfig::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.look_ahead, 50.0);
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("saved");
        let config = GameConfig {
            seed: Some(99),
            text_file: Some(PathBuf::from("poem.txt")),
            attempts: 1,
            ..Default::default()
        };
        config.save_to(&path);
        let loaded = GameConfig::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn session_config_carries_seed() {
        let config = GameConfig {
            seed: Some(3),
            fall_margin: 4.0,
            ..Default::default()
        };
        let session = config.session_config();
        assert_eq!(session.generator.seed, Some(3));
        assert_eq!(session.fall_margin, 4.0);
        assert_eq!(session.start_position.x, 5.0);
    }
}
