use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::config::{rgb, GameConfig};
use crate::round::{AudioCue, FrameOutcome, GameHost, HostError, RoundController, Sink};
use crate::scoreboard::{Scoreboard, ScoreboardStyle};

#[derive(Component)]
pub struct TrackedBall;

#[derive(Component)]
pub struct FaultIndicator;

#[derive(Resource)]
pub struct AudioCues {
    pub win: Handle<AudioSource>,
}

#[derive(Resource, Debug, Default)]
pub struct BounceCounter {
    pub count: u32,
    below: bool,
}

impl BounceCounter {
    /// Counts the frame the ball dips under `threshold`, not every frame it stays there.
    /// A per-frame count would report a resting ball as bouncing forever.
    pub fn observe(&mut self, height: f32, threshold: f32) -> bool {
        let below = height < threshold;
        let bounced = below && !self.below;
        self.below = below;
        if bounced {
            self.count += 1;
        }
        bounced
    }
}

#[derive(Event, Default)]
pub struct TossBall;

#[derive(Event, Default)]
pub struct RespawnBall;

#[derive(Event)]
pub struct RoundWon {
    pub score: u32,
}

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
            .init_resource::<BounceCounter>()
            .add_event::<TossBall>()
            .add_event::<RespawnBall>()
            .add_event::<RoundWon>()
            .add_systems(Startup, (setup_round, spawn_scene, load_audio))
            .add_systems(Startup, initial_scoreboard.after(setup_round))
            .add_systems(Update, (handle_toss, handle_respawn, count_bounces, evaluate_round).chain());
    }
}

pub fn setup_round(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.insert_resource(RoundController::new(cfg.round_rules()));
}

fn load_audio(mut commands: Commands, assets: Res<AssetServer>, cfg: Res<GameConfig>) {
    commands.insert_resource(AudioCues {
        win: assets.load(cfg.audio.win_cue.clone()),
    });
}

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    cfg: Res<GameConfig>,
) {
    let ball = &cfg.ball;
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Sphere::new(ball.radius).mesh().uv(32, 18)),
            material: materials.add(StandardMaterial {
                base_color: rgb(ball.color),
                ..default()
            }),
            transform: Transform::from_translation(cfg.spawn()),
            ..default()
        },
        RigidBody::Dynamic,
        Collider::ball(ball.radius),
        ColliderMassProperties::Density(ball.density),
        Friction::coefficient(ball.friction),
        Restitution::coefficient(ball.restitution),
        Velocity::zero(),
        Ccd::enabled(),
        TrackedBall,
    ));

    let half = cfg.floor.size * 0.5;
    commands.spawn(PbrBundle {
        mesh: meshes.add(Plane3d::default().mesh().size(cfg.floor.size, cfg.floor.size)),
        material: materials.add(StandardMaterial {
            base_color: rgb(cfg.floor.color),
            perceptual_roughness: 0.9,
            ..default()
        }),
        ..default()
    });
    commands.spawn((
        RigidBody::Fixed,
        Collider::cuboid(half, 0.05, half),
        TransformBundle::from(Transform::from_xyz(0.0, -0.05, 0.0)),
    ));

    // The bin has no collider. Its scoring zone sits above the ball's resting
    // height, so only a ball dropping in from above counts.
    let zone = cfg.round_rules().scoring_zone;
    let size = zone.max - zone.min;
    let mut bin_at = zone.center();
    bin_at.y = zone.max.y * 0.5;
    commands.spawn(PbrBundle {
        mesh: meshes.add(Cylinder::new(size.x.min(size.z) * 0.5, zone.max.y)),
        material: materials.add(StandardMaterial {
            base_color: rgb(cfg.round.bin_color).with_alpha(0.6),
            alpha_mode: AlphaMode::Blend,
            ..default()
        }),
        transform: Transform::from_translation(bin_at),
        ..default()
    });

    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Cuboid::new(0.15, 0.15, 0.15)),
            material: materials.add(StandardMaterial {
                base_color: rgb(cfg.round.indicator_color),
                ..default()
            }),
            transform: Transform::from_translation(Vec3::from_array(cfg.round.indicator_position)),
            ..default()
        },
        FaultIndicator,
    ));

    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 2_000_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(2.0, 5.0, 1.0),
        ..default()
    });
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });
}

/// `GameHost` over the Bevy world.
#[derive(SystemParam)]
pub struct SceneHost<'w, 's> {
    commands: Commands<'w, 's>,
    tracked: Query<'w, 's, (&'static mut Transform, Option<&'static mut Velocity>), With<TrackedBall>>,
    indicator: Query<'w, 's, &'static Handle<StandardMaterial>, With<FaultIndicator>>,
    materials: Option<ResMut<'w, Assets<StandardMaterial>>>,
    scoreboard: Option<ResMut<'w, Scoreboard>>,
    cues: Option<Res<'w, AudioCues>>,
}

impl GameHost for SceneHost<'_, '_> {
    fn sink_ready(&self, sink: Sink) -> bool {
        match sink {
            Sink::Audio => self.cues.is_some(),
            Sink::Scoreboard => self.scoreboard.is_some(),
            Sink::Tracked => self.tracked.get_single().is_ok(),
            Sink::Indicator => match (self.indicator.get_single(), self.materials.as_deref()) {
                (Ok(handle), Some(materials)) => materials.contains(handle),
                _ => false,
            },
        }
    }

    fn tracked_position(&self) -> Option<Vec3> {
        self.tracked.get_single().ok().map(|(t, _)| t.translation)
    }

    fn play_one_shot(&mut self, cue: AudioCue) -> Result<(), HostError> {
        let cues = self.cues.as_deref().ok_or(HostError::SinkUnavailable("audio"))?;
        let source = match cue {
            AudioCue::Win => cues.win.clone(),
        };
        self.commands.spawn(AudioBundle {
            source,
            settings: PlaybackSettings::DESPAWN,
        });
        Ok(())
    }

    fn set_scoreboard_text(&mut self, content: &str, style: &ScoreboardStyle) -> Result<(), HostError> {
        let board = self.scoreboard.as_deref_mut().ok_or(HostError::SinkUnavailable("scoreboard"))?;
        board.set(content, style);
        Ok(())
    }

    fn teleport_tracked(&mut self, to: Vec3) -> Result<(), HostError> {
        let (mut transform, velocity) = self
            .tracked
            .get_single_mut()
            .map_err(|_| HostError::TrackedObjectMissing)?;
        transform.translation = to;
        if let Some(mut v) = velocity {
            *v = Velocity::zero();
        }
        Ok(())
    }

    fn set_indicator_color(&mut self, color: Color) -> Result<(), HostError> {
        let handle = self
            .indicator
            .get_single()
            .map_err(|_| HostError::SinkUnavailable("indicator"))?;
        let material = self
            .materials
            .as_deref_mut()
            .and_then(|m| m.get_mut(handle))
            .ok_or(HostError::SinkUnavailable("indicator material"))?;
        material.base_color = color;
        Ok(())
    }
}

fn initial_scoreboard(controller: Res<RoundController>, mut host: SceneHost) {
    if let Err(e) = controller.refresh_scoreboard(&mut host) {
        warn!("scoreboard not initialised: {e}");
    }
}

pub fn evaluate_round(
    controller: Option<ResMut<RoundController>>,
    mut host: SceneHost,
    mut ev_won: EventWriter<RoundWon>,
) {
    let Some(mut controller) = controller else {
        return;
    };
    match controller.tick(&mut host) {
        Ok(FrameOutcome::Scored { score }) => {
            ev_won.send(RoundWon { score });
        }
        Ok(FrameOutcome::Reset) => debug!("ball left the play area, back to spawn"),
        Ok(_) => {}
        Err(e) => warn!("round evaluation skipped this frame: {e}"),
    }
}

fn count_bounces(
    mut counter: ResMut<BounceCounter>,
    cfg: Res<GameConfig>,
    q: Query<&Transform, With<TrackedBall>>,
) {
    let Ok(t) = q.get_single() else {
        return;
    };
    if counter.observe(t.translation.y, cfg.ball.bounce_threshold) {
        info!("ball has bounced {} times", counter.count);
    }
}

fn handle_toss(
    mut ev_toss: EventReader<TossBall>,
    cfg: Res<GameConfig>,
    mut q: Query<(&mut Transform, &mut Velocity), With<TrackedBall>>,
) {
    if ev_toss.is_empty() {
        return;
    }
    ev_toss.clear();

    let Ok((mut t, mut v)) = q.get_single_mut() else {
        return;
    };
    t.translation = cfg.spawn();
    *v = Velocity::linear(Vec3::from_array(cfg.ball.toss_velocity));
}

fn handle_respawn(
    mut ev_respawn: EventReader<RespawnBall>,
    cfg: Res<GameConfig>,
    mut q: Query<(&mut Transform, Option<&mut Velocity>), With<TrackedBall>>,
) {
    if ev_respawn.is_empty() {
        return;
    }
    ev_respawn.clear();

    let Ok((mut t, v)) = q.get_single_mut() else {
        return;
    };
    t.translation = cfg.spawn();
    if let Some(mut v) = v {
        *v = Velocity::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<Assets<StandardMaterial>>();
        app.init_resource::<Scoreboard>();
        app.insert_resource(GameConfig::default());
        app.insert_resource(RoundController::new(GameConfig::default().round_rules()));
        app.insert_resource(AudioCues { win: Handle::default() });
        app.add_event::<RoundWon>();
        app.add_systems(Update, evaluate_round);
        app
    }

    fn spawn_indicator(app: &mut App) -> Handle<StandardMaterial> {
        let handle = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        app.world_mut().spawn((handle.clone(), FaultIndicator));
        handle
    }

    #[test]
    fn ball_in_bin_scores_once() {
        let mut app = round_app();
        spawn_indicator(&mut app);
        app.world_mut()
            .spawn((Transform::from_xyz(0.0, 0.45, -1.5), TrackedBall));

        app.update();
        app.update();

        let state = app.world().resource::<RoundController>().state();
        assert_eq!(state.score, 1);
        assert!(!state.in_play);
        let board = app.world().resource::<Scoreboard>();
        assert!(board.text().contains("YOU WIN!!!"));
        assert!(board.is_dirty());
        let players = app
            .world_mut()
            .query::<&PlaybackSettings>()
            .iter(app.world())
            .count();
        assert_eq!(players, 1);
    }

    #[test]
    fn lost_ball_is_teleported_and_indicator_faults() {
        let mut app = round_app();
        let handle = spawn_indicator(&mut app);
        let ball = app
            .world_mut()
            .spawn((Transform::from_xyz(0.0, -3.0, 0.0), TrackedBall))
            .id();

        app.update();

        let pos = app.world().get::<Transform>(ball).unwrap().translation;
        assert_eq!(pos, Vec3::new(1.0, 1.5, -3.0));
        let mat = app
            .world()
            .resource::<Assets<StandardMaterial>>()
            .get(&handle)
            .unwrap();
        assert_eq!(mat.base_color, Color::srgb(0.9, 0.1, 0.1));
        assert_eq!(app.world().resource::<RoundController>().state().score, 0);
    }

    #[test]
    fn despawned_ball_does_not_stall_the_loop() {
        let mut app = round_app();
        spawn_indicator(&mut app);
        let ball = app
            .world_mut()
            .spawn((Transform::from_xyz(0.0, 1.0, 0.0), TrackedBall))
            .id();
        app.update();
        app.world_mut().despawn(ball);
        app.update();
        app.update();
        assert!(app.world().resource::<RoundController>().state().in_play);
    }

    #[test]
    fn missing_audio_defers_the_win() {
        let mut app = round_app();
        app.world_mut().remove_resource::<AudioCues>();
        spawn_indicator(&mut app);
        app.world_mut()
            .spawn((Transform::from_xyz(0.0, 0.45, -1.5), TrackedBall));

        app.update();
        assert_eq!(app.world().resource::<RoundController>().state().score, 0);

        app.insert_resource(AudioCues { win: Handle::default() });
        app.update();
        assert_eq!(app.world().resource::<RoundController>().state().score, 1);
    }

    #[test]
    fn bounce_counter_is_edge_triggered() {
        let mut counter = BounceCounter::default();
        let heights = [1.5, 0.8, 0.26, 0.25, 0.26, 0.6, 0.26, 0.9];
        let hits = heights
            .iter()
            .filter(|h| counter.observe(**h, 0.27))
            .count();
        assert_eq!(hits, 2);
        assert_eq!(counter.count, 2);
    }

    #[test]
    fn toss_launches_from_spawn_without_touching_the_round() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.insert_resource(RoundController::new(GameConfig::default().round_rules()));
        app.add_event::<TossBall>();
        app.add_systems(Update, handle_toss);
        let ball = app
            .world_mut()
            .spawn((
                Transform::from_xyz(-4.0, 0.25, 3.0),
                Velocity::zero(),
                TrackedBall,
            ))
            .id();

        app.world_mut().send_event(TossBall);
        app.update();

        let cfg = GameConfig::default();
        assert_eq!(app.world().get::<Transform>(ball).unwrap().translation, cfg.spawn());
        assert_eq!(
            app.world().get::<Velocity>(ball).unwrap().linvel,
            Vec3::from_array(cfg.ball.toss_velocity)
        );
        let state = app.world().resource::<RoundController>().state();
        assert!(state.in_play);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn resting_ball_under_the_bin_does_not_score() {
        let mut app = round_app();
        spawn_indicator(&mut app);
        app.world_mut()
            .spawn((Transform::from_xyz(0.0, 0.25, -1.5), TrackedBall));

        app.update();

        assert!(app.world().resource::<RoundController>().state().in_play);
        assert!(app.world().resource::<Events<RoundWon>>().is_empty());
    }

    #[test]
    fn scoring_sends_round_won() {
        let mut app = round_app();
        spawn_indicator(&mut app);
        app.world_mut()
            .spawn((Transform::from_xyz(0.0, 0.45, -1.5), TrackedBall));

        app.update();

        let events = app.world().resource::<Events<RoundWon>>();
        let mut reader = events.get_reader();
        let scores: Vec<u32> = reader.read(events).map(|e| e.score).collect();
        assert_eq!(scores, vec![1]);
    }

    #[test]
    fn missing_indicator_keeps_lost_ball_in_place() {
        let mut app = round_app();
        let ball = app
            .world_mut()
            .spawn((Transform::from_xyz(0.0, -3.0, 0.0), TrackedBall))
            .id();

        app.update();

        assert_eq!(app.world().get::<Transform>(ball).unwrap().translation, Vec3::new(0.0, -3.0, 0.0));
    }

    #[test]
    fn respawn_zeroes_velocity() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.add_event::<RespawnBall>();
        app.add_systems(Update, handle_respawn);
        let ball = app
            .world_mut()
            .spawn((
                Transform::from_xyz(4.0, 0.3, 2.0),
                Velocity::linear(Vec3::new(3.0, 0.0, 0.0)),
                TrackedBall,
            ))
            .id();

        app.world_mut().send_event(RespawnBall);
        app.update();

        assert_eq!(app.world().get::<Transform>(ball).unwrap().translation, Vec3::new(1.0, 1.5, -3.0));
        assert_eq!(app.world().get::<Velocity>(ball).unwrap().linvel, Vec3::ZERO);
    }
}
