use crate::sim::{RespawnBall, TossBall};
use crate::ui::PanelToggles;
use bevy::input::gamepad::{GamepadConnection, GamepadEvent};
use bevy::prelude::*;

#[derive(Resource)]
pub struct Keybinds {
    pub toss: KeyCode,
    pub respawn: KeyCode,
    pub help: KeyCode,
    pub diagnostics: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            toss: KeyCode::Space,
            respawn: KeyCode::KeyR,
            help: KeyCode::KeyH,
            diagnostics: KeyCode::F3,
        }
    }
}

#[derive(Resource)]
struct MyGamepad(Gamepad);

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Keybinds>().add_systems(
            Update,
            (
                gamepad_connections,
                toss_trigger,
                respawn_trigger,
                panel_toggles,
            ),
        );
    }
}

fn toss_trigger(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    my_gamepad: Option<Res<MyGamepad>>,
    buttons: Res<ButtonInput<GamepadButton>>,
    mut ev_toss: EventWriter<TossBall>,
) {
    let mut toss = keys.just_pressed(keybinds.toss);
    if let Some(MyGamepad(gamepad)) = my_gamepad.as_deref() {
        let south = GamepadButton {
            gamepad: *gamepad,
            button_type: GamepadButtonType::South,
        };
        toss |= buttons.just_pressed(south);
    }
    if toss {
        ev_toss.send(TossBall);
    }
}

fn respawn_trigger(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut ev_respawn: EventWriter<RespawnBall>,
) {
    if keys.just_pressed(keybinds.respawn) {
        ev_respawn.send(RespawnBall);
    }
}

fn panel_toggles(
    keys: Res<ButtonInput<KeyCode>>,
    keybinds: Res<Keybinds>,
    mut toggles: ResMut<PanelToggles>,
) {
    if keys.just_pressed(keybinds.help) {
        toggles.show_help = !toggles.show_help;
    }
    if keys.just_pressed(keybinds.diagnostics) {
        toggles.show_diagnostics = !toggles.show_diagnostics;
    }
}

fn gamepad_connections(
    mut commands: Commands,
    my_gamepad: Option<Res<MyGamepad>>,
    mut evr_gamepad: EventReader<GamepadEvent>,
) {
    for ev in evr_gamepad.read() {
        let GamepadEvent::Connection(ev_conn) = ev else {
            continue;
        };
        match &ev_conn.connection {
            GamepadConnection::Connected(info) => {
                debug!("gamepad connected: {:?}, name: {}", ev_conn.gamepad, info.name);
                if my_gamepad.is_none() {
                    commands.insert_resource(MyGamepad(ev_conn.gamepad));
                }
            }
            GamepadConnection::Disconnected => {
                debug!("gamepad disconnected: {:?}", ev_conn.gamepad);
                if let Some(MyGamepad(old_id)) = my_gamepad.as_deref() {
                    if *old_id == ev_conn.gamepad {
                        commands.remove_resource::<MyGamepad>();
                    }
                }
            }
        }
    }
}
