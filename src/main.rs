mod config;
mod headset;
mod input;
mod round;
mod scoreboard;
mod sim;
mod ui;

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use config::{GameConfig, DEFAULT_CONFIG_PATH};
use headset::HeadsetPlugin;
use input::InputPlugin;
use scoreboard::ScoreboardPlugin;
use sim::SimPlugin;
use ui::UiPlugin;

fn main() {
    let (cfg, load_error) = GameConfig::load_or_default(DEFAULT_CONFIG_PATH);
    let window = cfg.window.clone();

    let mut app = App::new();
    app.insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)))
        .insert_resource(Msaa::Sample4)
        .insert_resource(cfg)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window.title,
                resolution: (window.width, window.height).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((SimPlugin, ScoreboardPlugin, HeadsetPlugin, UiPlugin, InputPlugin))
        .add_systems(Startup, setup_camera);

    // LogPlugin is up once DefaultPlugins is added
    if let Some(e) = load_error {
        warn!("using default config, {DEFAULT_CONFIG_PATH} not loaded: {e}");
    }
    for problem in app.world().resource::<GameConfig>().validate() {
        warn!("config: {problem}");
    }

    app.run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera3dBundle {
        camera: Camera {
            hdr: true,
            ..default()
        },
        tonemapping: Tonemapping::TonyMcMapface,
        transform: Transform::from_xyz(0.0, 1.6, 1.0).looking_at(Vec3::new(0.0, 0.6, -2.0), Vec3::Y),
        ..default()
    });
}
