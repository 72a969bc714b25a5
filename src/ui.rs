use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::egui::{self, Align2, Color32, FontId, RichText};
use bevy_egui::{EguiContexts, EguiPlugin};

use crate::headset::FallbackEntryPanel;
use crate::round::RoundController;
use crate::sim::{BounceCounter, RoundWon};

#[derive(Resource)]
pub struct PanelToggles {
    pub show_help: bool,
    pub show_diagnostics: bool,
}

impl Default for PanelToggles {
    fn default() -> Self {
        Self {
            show_help: true,
            show_diagnostics: false,
        }
    }
}

/// Headline of the banner shown after a win, filled from `RoundWon`.
#[derive(Resource, Default, Debug)]
pub struct WinBanner {
    pub headline: Option<String>,
}

/// Raised by the fallback panel's "Enter VR" button. Session setup belongs to the XR host.
#[derive(Event, Default)]
pub struct EnterXrRequested;

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<PanelToggles>()
            .init_resource::<WinBanner>()
            .add_event::<EnterXrRequested>()
            .add_systems(
                Update,
                (
                    help_panel,
                    diagnostics_panel,
                    xr_entry_panel,
                    announce_win,
                    win_banner.after(announce_win),
                    log_xr_requests,
                ),
            );
    }
}

fn help_panel(mut contexts: EguiContexts, toggles: Res<PanelToggles>) {
    if !toggles.show_help {
        return;
    }
    egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
        ui.label("Space / Gamepad A: Toss the ball");
        ui.label("R: Respawn ball");
        ui.label("H: Toggle Help");
        ui.label("F3: Toggle Diagnostics");
    });
}

fn diagnostics_panel(
    mut contexts: EguiContexts,
    toggles: Res<PanelToggles>,
    diagnostics: Res<DiagnosticsStore>,
    controller: Option<Res<RoundController>>,
    bounces: Res<BounceCounter>,
) {
    if !toggles.show_diagnostics {
        return;
    }
    egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT) {
            if let Some(value) = entity_count.value() {
                ui.label(format!("Entities: {}", value));
            }
        }
        ui.separator();
        if let Some(controller) = controller {
            let state = controller.state();
            ui.label(format!("Score: {}  In play: {}", state.score, state.in_play));
        }
        ui.label(format!("Bounces: {}", bounces.count));
    });
}

fn xr_entry_panel(
    mut contexts: EguiContexts,
    panel: Res<FallbackEntryPanel>,
    mut ev_enter: EventWriter<EnterXrRequested>,
) {
    if !panel.visible {
        return;
    }
    egui::Window::new("Welcome")
        .anchor(Align2::LEFT_TOP, egui::vec2(20.0, 20.0))
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Toss the ball into the paper bin.");
            if ui.button("Enter VR").clicked() {
                ev_enter.send(EnterXrRequested);
            }
        });
}

pub fn announce_win(
    mut ev_won: EventReader<RoundWon>,
    controller: Option<Res<RoundController>>,
    mut banner: ResMut<WinBanner>,
) {
    for won in ev_won.read() {
        info!("ball landed in the bin, score {}", won.score);
        let headline = controller
            .as_deref()
            .map(|c| c.rules().templates.win.clone())
            .unwrap_or_default();
        banner.headline = Some(headline);
    }
}

fn win_banner(mut contexts: EguiContexts, banner: Res<WinBanner>) {
    let Some(text) = banner.headline.clone() else {
        return;
    };
    egui::Area::new("win_banner".into())
        .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(contexts.ctx_mut(), |ui| {
            ui.label(
                RichText::new(text)
                    .font(FontId::proportional(48.0))
                    .color(Color32::GREEN),
            );
        });
}

fn log_xr_requests(mut ev_enter: EventReader<EnterXrRequested>) {
    for _ in ev_enter.read() {
        info!("XR session requested from the fallback entry panel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn banner_follows_round_won() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<WinBanner>();
        app.insert_resource(RoundController::new(GameConfig::default().round_rules()));
        app.add_event::<RoundWon>();
        app.add_systems(Update, announce_win);

        app.update();
        assert!(app.world().resource::<WinBanner>().headline.is_none());

        app.world_mut().send_event(RoundWon { score: 1 });
        app.update();
        assert_eq!(
            app.world().resource::<WinBanner>().headline.as_deref(),
            Some("YOU WIN!!!")
        );
    }
}
