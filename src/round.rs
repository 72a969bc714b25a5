//! Round logic for the bin toss: one-shot scoring and out-of-bounds resets.
//!
//! The controller never touches the ECS directly. Everything it reads or
//! writes goes through [`GameHost`], so the same rules run against the Bevy
//! scene and against the recording host used in tests.

use bevy::color::Color;
use bevy::math::Vec3;
use bevy::prelude::Resource;
use thiserror::Error;

use crate::scoreboard::ScoreboardStyle;

/// Axis-aligned box. `contains` is strict on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x > self.min.x
            && p.x < self.max.x
            && p.y > self.min.y
            && p.y < self.max.y
            && p.z > self.min.z
            && p.z < self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Region the ball may roam in. Open at the top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayableVolume {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub floor_y: f32,
}

impl PlayableVolume {
    pub fn escaped(&self, p: Vec3) -> bool {
        p.x < self.min_x || p.x > self.max_x || p.z < self.min_z || p.z > self.max_z || p.y < self.floor_y
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreboardTemplates {
    pub prompt: String,
    pub win: String,
    pub prompt_style: ScoreboardStyle,
    pub win_style: ScoreboardStyle,
}

impl Default for ScoreboardTemplates {
    fn default() -> Self {
        Self {
            prompt: "Toss the ball into bin!".into(),
            win: "YOU WIN!!!".into(),
            prompt_style: ScoreboardStyle::default(),
            win_style: ScoreboardStyle {
                color: Color::srgb(0.2, 1.0, 0.3),
                ..ScoreboardStyle::default()
            },
        }
    }
}

/// Immutable rules of a round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundRules {
    pub scoring_zone: Aabb,
    pub playable: PlayableVolume,
    pub spawn: Vec3,
    pub fault_color: Color,
    pub templates: ScoreboardTemplates,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub in_play: bool,
    pub score: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            in_play: true,
            score: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCue {
    Win,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("tracked object is no longer available")]
    TrackedObjectMissing,
    #[error("{0} sink is unavailable")]
    SinkUnavailable(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    Audio,
    Scoreboard,
    Tracked,
    Indicator,
}

impl Sink {
    fn unavailable(self) -> HostError {
        match self {
            Sink::Audio => HostError::SinkUnavailable("audio"),
            Sink::Scoreboard => HostError::SinkUnavailable("scoreboard"),
            Sink::Tracked => HostError::TrackedObjectMissing,
            Sink::Indicator => HostError::SinkUnavailable("indicator"),
        }
    }
}

/// What the controller needs from the engine hosting the round.
pub trait GameHost {
    /// Whether `sink` would accept a command right now. Must not have side effects.
    fn sink_ready(&self, sink: Sink) -> bool;
    fn tracked_position(&self) -> Option<Vec3>;
    fn play_one_shot(&mut self, cue: AudioCue) -> Result<(), HostError>;
    /// Implementations must mark the backing surface dirty.
    fn set_scoreboard_text(&mut self, content: &str, style: &ScoreboardStyle) -> Result<(), HostError>;
    fn teleport_tracked(&mut self, to: Vec3) -> Result<(), HostError>;
    fn set_indicator_color(&mut self, color: Color) -> Result<(), HostError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Round is over, nothing evaluated.
    Idle,
    /// No tracked object this frame.
    NoTarget,
    InPlay,
    Scored { score: u32 },
    Reset,
}

pub fn scoreboard_text(state: &RoundState, templates: &ScoreboardTemplates) -> String {
    let headline = if state.score > 0 {
        &templates.win
    } else {
        &templates.prompt
    };
    format!("{headline}\nScore: {}", state.score)
}

fn scoreboard_style<'a>(state: &RoundState, templates: &'a ScoreboardTemplates) -> &'a ScoreboardStyle {
    if state.score > 0 {
        &templates.win_style
    } else {
        &templates.prompt_style
    }
}

fn ensure_ready(host: &impl GameHost, sinks: &[Sink]) -> Result<(), HostError> {
    match sinks.iter().find(|s| !host.sink_ready(**s)) {
        Some(s) => Err(s.unavailable()),
        None => Ok(()),
    }
}

#[derive(Resource, Debug)]
pub struct RoundController {
    state: RoundState,
    rules: RoundRules,
}

impl RoundController {
    pub fn new(rules: RoundRules) -> Self {
        Self {
            state: RoundState::default(),
            rules,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn rules(&self) -> &RoundRules {
        &self.rules
    }

    /// Evaluate one frame. Every sink a branch needs is checked before the
    /// first command goes out, so an unavailable sink turns the frame into a no-op.
    pub fn tick(&mut self, host: &mut impl GameHost) -> Result<FrameOutcome, HostError> {
        if !self.state.in_play {
            return Ok(FrameOutcome::Idle);
        }
        let Some(pos) = host.tracked_position() else {
            return Ok(FrameOutcome::NoTarget);
        };

        if self.rules.scoring_zone.contains(pos) {
            let next = RoundState {
                in_play: false,
                score: self.state.score + 1,
            };
            ensure_ready(&*host, &[Sink::Scoreboard, Sink::Audio])?;
            host.set_scoreboard_text(
                &scoreboard_text(&next, &self.rules.templates),
                scoreboard_style(&next, &self.rules.templates),
            )?;
            // last, so a failure above never replays the cue
            host.play_one_shot(AudioCue::Win)?;
            self.state = next;
            return Ok(FrameOutcome::Scored { score: next.score });
        }

        if self.rules.playable.escaped(pos) {
            ensure_ready(&*host, &[Sink::Tracked, Sink::Indicator])?;
            host.teleport_tracked(self.rules.spawn)?;
            host.set_indicator_color(self.rules.fault_color)?;
            return Ok(FrameOutcome::Reset);
        }

        Ok(FrameOutcome::InPlay)
    }

    pub fn refresh_scoreboard(&self, host: &mut impl GameHost) -> Result<(), HostError> {
        host.set_scoreboard_text(
            &scoreboard_text(&self.state, &self.rules.templates),
            scoreboard_style(&self.state, &self.rules.templates),
        )
    }
}
