use bevy::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreboardStyle {
    pub color: Color,
    pub font_size: f32,
}

impl Default for ScoreboardStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            font_size: 36.0,
        }
    }
}

/// Backing surface of the scoreboard. Writers go through [`Scoreboard::set`],
/// which flags the surface so `sync_scoreboard` re-renders it next frame.
#[derive(Resource, Debug, Default)]
pub struct Scoreboard {
    text: String,
    style: ScoreboardStyle,
    dirty: bool,
}

impl Scoreboard {
    pub fn set(&mut self, text: &str, style: &ScoreboardStyle) {
        self.text.clear();
        self.text.push_str(text);
        self.style = style.clone();
        self.dirty = true;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[derive(Component)]
pub struct ScoreboardText;

pub struct ScoreboardPlugin;
impl Plugin for ScoreboardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Scoreboard>()
            .add_systems(Startup, spawn_scoreboard)
            .add_systems(PostUpdate, sync_scoreboard);
    }
}

fn spawn_scoreboard(mut commands: Commands) {
    commands.spawn((
        TextBundle::from_section("", TextStyle::default()).with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(16.0),
            right: Val::Px(24.0),
            ..default()
        }),
        ScoreboardText,
    ));
}

pub fn sync_scoreboard(mut board: ResMut<Scoreboard>, mut q: Query<&mut Text, With<ScoreboardText>>) {
    if !board.is_dirty() {
        return;
    }
    let Ok(mut text) = q.get_single_mut() else {
        // surface not spawned yet, keep it dirty
        return;
    };
    *text = Text::from_section(
        board.text().to_string(),
        TextStyle {
            font_size: board.style.font_size,
            color: board.style.color,
            ..default()
        },
    );
    board.dirty = false;
}
