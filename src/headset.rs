//! Headset detection used to decide whether the XR-entry fallback panel is shown.
//!
//! First-generation Quest browsers never get a working "Enter VR" button, so
//! they get a panel of their own. Newer Quest models and everything else do not.

use bevy::prelude::*;

use crate::config::GameConfig;

pub const USER_AGENT_ENV: &str = "BIN_TOSS_USER_AGENT";

/// Capability query call sites use instead of matching user agents inline.
pub trait XrEntryCapability: Send + Sync + 'static {
    fn needs_fallback_entry(&self) -> bool;
}

/// True for signatures of the Quest family that are not Quest 2 or 3.
/// Total: absent, empty or odd input yields false.
pub fn is_legacy_quest(signature: Option<&str>) -> bool {
    let Some(sig) = signature else {
        return false;
    };
    let lower = sig.to_lowercase();
    let family = lower.contains("oculus") || lower.contains("quest");
    if !family {
        return false;
    }
    let squashed: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    let newer = squashed.contains("quest2") || squashed.contains("quest3");
    !newer
}

#[derive(Debug, Clone, Default)]
pub struct UserAgentHeuristic {
    user_agent: Option<String>,
}

impl UserAgentHeuristic {
    pub fn new(user_agent: Option<String>) -> Self {
        Self { user_agent }
    }
}

impl XrEntryCapability for UserAgentHeuristic {
    fn needs_fallback_entry(&self) -> bool {
        is_legacy_quest(self.user_agent.as_deref())
    }
}

#[derive(Resource)]
pub struct HeadsetProbe(pub Box<dyn XrEntryCapability>);

impl HeadsetProbe {
    pub fn needs_fallback_entry(&self) -> bool {
        self.0.needs_fallback_entry()
    }
}

/// Whether the fallback panel is up. Decided once at startup.
#[derive(Resource, Default, Debug)]
pub struct FallbackEntryPanel {
    pub visible: bool,
}

#[cfg(target_arch = "wasm32")]
fn platform_user_agent() -> Option<String> {
    web_sys::window().and_then(|w| w.navigator().user_agent().ok())
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_user_agent() -> Option<String> {
    std::env::var(USER_AGENT_ENV).ok()
}

/// Config override first, then the platform.
pub fn resolve_user_agent(cfg: &GameConfig) -> Option<String> {
    cfg.headset.user_agent.clone().or_else(platform_user_agent)
}

pub struct HeadsetPlugin;
impl Plugin for HeadsetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FallbackEntryPanel>()
            .add_systems(PreStartup, insert_probe)
            .add_systems(Startup, decide_fallback_panel);
    }
}

fn insert_probe(mut commands: Commands, cfg: Res<GameConfig>, existing: Option<Res<HeadsetProbe>>) {
    if existing.is_some() {
        return;
    }
    let ua = resolve_user_agent(&cfg);
    debug!("headset probe user agent: {:?}", ua);
    commands.insert_resource(HeadsetProbe(Box::new(UserAgentHeuristic::new(ua))));
}

pub fn decide_fallback_panel(probe: Option<Res<HeadsetProbe>>, mut panel: ResMut<FallbackEntryPanel>) {
    panel.visible = probe.map(|p| p.needs_fallback_entry()).unwrap_or(false);
    if panel.visible {
        info!("legacy Quest detected, showing XR entry panel");
    } else {
        info!("XR entry panel skipped: not a first-generation Quest (heuristic)");
    }
}
