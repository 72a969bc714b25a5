use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

use crate::round::{Aabb, PlayableVolume, RoundRules, ScoreboardTemplates};
use crate::scoreboard::ScoreboardStyle;

pub const DEFAULT_CONFIG_PATH: &str = "config/game.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            title: "bin-toss".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub color: [f32; 3],
    pub spawn: [f32; 3],
    pub toss_velocity: [f32; 3],
    pub bounce_threshold: f32,
}
impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 0.25,
            density: 0.2,
            friction: 0.5,
            restitution: 0.9,
            color: [0.9, 0.1, 0.1],
            spawn: [1.0, 1.5, -3.0],
            // lands at the bin centre from the default spawn
            toss_velocity: [-1.19, 2.5, 1.79],
            bounce_threshold: 0.27,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FloorConfig {
    pub size: f32,
    pub color: [f32; 3],
}
impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            color: [0.82, 0.71, 0.55],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BoxConfig {
    pub min: [f32; 3],
    pub max: [f32; 3],
}
impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            min: [-0.2, 0.3, -1.7],
            max: [0.2, 0.6, -1.3],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayableConfig {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub floor_y: f32,
}
impl Default for PlayableConfig {
    fn default() -> Self {
        Self {
            min_x: -10.0,
            max_x: 10.0,
            min_z: -10.0,
            max_z: 10.0,
            floor_y: -1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RoundConfig {
    pub scoring_zone: BoxConfig,
    pub playable: PlayableConfig,
    pub bin_color: [f32; 3],
    pub indicator_position: [f32; 3],
    pub indicator_color: [f32; 3],
    pub fault_color: [f32; 3],
}
impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            scoring_zone: BoxConfig::default(),
            playable: PlayableConfig::default(),
            bin_color: [0.35, 0.35, 0.4],
            indicator_position: [0.6, 0.1, -1.5],
            indicator_color: [0.1, 0.8, 0.2],
            fault_color: [0.9, 0.1, 0.1],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScoreboardConfig {
    pub prompt: String,
    pub win: String,
    pub font_size: f32,
    pub prompt_color: [f32; 3],
    pub win_color: [f32; 3],
}
impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            prompt: "Toss the ball into bin!".into(),
            win: "YOU WIN!!!".into(),
            font_size: 36.0,
            prompt_color: [1.0, 1.0, 1.0],
            win_color: [0.2, 1.0, 0.3],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub win_cue: String,
}
impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            win_cue: "audio/chime.wav".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct HeadsetConfig {
    /// Overrides the platform user agent, handy for trying the fallback panel on desktop.
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub ball: BallConfig,
    pub floor: FloorConfig,
    pub round: RoundConfig,
    pub scoreboard: ScoreboardConfig,
    pub audio: AudioConfig,
    pub headset: HeadsetConfig,
}

pub fn rgb(c: [f32; 3]) -> Color {
    Color::srgb(c[0], c[1], c[2])
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(&path)?;
        Ok(ron::from_str(&data)?)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let zone = &self.round.scoring_zone;
        for axis in 0..3 {
            if zone.min[axis] >= zone.max[axis] {
                problems.push(format!("round.scoring_zone axis {axis}: min >= max"));
            }
        }
        let p = &self.round.playable;
        if p.min_x >= p.max_x || p.min_z >= p.max_z {
            problems.push("round.playable: min >= max".to_string());
        }
        if zone.min[1] <= self.ball.radius {
            problems.push(format!(
                "round.scoring_zone floor {} must sit above the resting ball (radius {})",
                zone.min[1], self.ball.radius
            ));
        }
        if self.ball.radius <= 0.0 {
            problems.push(format!("ball.radius must be positive (got {})", self.ball.radius));
        }
        if self.ball.density <= 0.0 {
            problems.push(format!("ball.density must be positive (got {})", self.ball.density));
        }
        if self.round_rules().playable.escaped(self.spawn()) {
            problems.push("ball.spawn lies outside round.playable".to_string());
        }
        problems
    }

    pub fn spawn(&self) -> Vec3 {
        Vec3::from_array(self.ball.spawn)
    }

    pub fn round_rules(&self) -> RoundRules {
        let zone = &self.round.scoring_zone;
        let p = &self.round.playable;
        let sb = &self.scoreboard;
        RoundRules {
            scoring_zone: Aabb::new(Vec3::from_array(zone.min), Vec3::from_array(zone.max)),
            playable: PlayableVolume {
                min_x: p.min_x,
                max_x: p.max_x,
                min_z: p.min_z,
                max_z: p.max_z,
                floor_y: p.floor_y,
            },
            spawn: self.spawn(),
            fault_color: rgb(self.round.fault_color),
            templates: ScoreboardTemplates {
                prompt: sb.prompt.clone(),
                win: sb.win.clone(),
                prompt_style: ScoreboardStyle {
                    color: rgb(sb.prompt_color),
                    font_size: sb.font_size,
                },
                win_style: ScoreboardStyle {
                    color: rgb(sb.win_color),
                    font_size: sb.font_size,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_empty());
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let cfg: GameConfig = ron::from_str("(ball: (radius: 0.3), headset: (user_agent: Some(\"Quest\")))").unwrap();
        assert_eq!(cfg.ball.radius, 0.3);
        assert_eq!(cfg.ball.restitution, 0.9);
        assert_eq!(cfg.headset.user_agent.as_deref(), Some("Quest"));
        assert_eq!(cfg.scoreboard.win, "YOU WIN!!!");
    }

    #[test]
    fn validate_flags_inverted_zone_and_bad_spawn() {
        let mut cfg = GameConfig::default();
        cfg.round.scoring_zone.min[1] = 1.0;
        cfg.ball.spawn = [50.0, 1.0, 0.0];
        let problems = cfg.validate();
        assert!(problems.iter().any(|p| p.contains("scoring_zone axis 1")));
        assert!(problems.iter().any(|p| p.contains("ball.spawn")));
    }

    #[test]
    fn validate_flags_zone_reaching_the_floor() {
        let mut cfg = GameConfig::default();
        cfg.round.scoring_zone.min[1] = 0.0;
        let problems = cfg.validate();
        assert!(problems.iter().any(|p| p.contains("resting ball")));
        assert!(!GameConfig::default().round_rules().scoring_zone.contains(Vec3::new(0.0, 0.25, -1.5)));
    }

    #[test]
    fn shipped_win_cue_exists() {
        let cfg = GameConfig::default();
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets").join(&cfg.audio.win_cue);
        assert!(path.is_file(), "{} missing", path.display());
    }

    #[test]
    fn missing_file_falls_back() {
        let (cfg, err) = GameConfig::load_or_default("does/not/exist.ron");
        assert_eq!(cfg, GameConfig::default());
        assert!(matches!(err, Some(ConfigError::Read(_))));
    }

    #[test]
    fn shipped_config_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/", "config/game.ron");
        let cfg = GameConfig::load_from_file(path).unwrap();
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn rules_carry_templates() {
        let rules = GameConfig::default().round_rules();
        assert_eq!(rules.templates.prompt, "Toss the ball into bin!");
        assert_eq!(rules.spawn, Vec3::new(1.0, 1.5, -3.0));
        assert!(rules.scoring_zone.contains(rules.scoring_zone.center()));
    }
}
