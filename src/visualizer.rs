//! 2D visualization.
//!
//! The world's draw commands are replayed onto Bevy gizmos every frame. The arena uses graphics
//! axes with `y` growing downwards, so positions are mirrored at the `x` axis.

use bevy::{prelude::*, render::camera::ScalingMode};

use arena_sim::{
    domain::{self, Device, Point, Robot, Stroke},
    render::RenderBackend,
};

use crate::{
    resource::{SelectedRobot, WorldRes},
    simulator::Simulation,
};

const LABEL_FONT_SIZE: f32 = 12.0;
const MARGIN: f32 = 20.0;

pub struct Visualizer;

impl Plugin for Visualizer {
    fn build(&self, app: &mut App) {
        app.init_resource::<Overlay>()
            .add_systems(Startup, set_up)
            .add_systems(Update, (draw_world, update_text, handle_keyboard_input));
    }
}

#[derive(Resource)]
struct Overlay {
    show_text: bool,
}

impl Default for Overlay {
    fn default() -> Self {
        Self { show_text: true }
    }
}

#[derive(Component)]
struct NameLabel;

#[derive(Component)]
struct StatusText;

/// Draws outlines with gizmos. Text is collected and shown through label entities.
struct GizmoBackend<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    clear_color: Option<domain::Color>,
    labels: Vec<(Point, String, domain::Color)>,
}

impl<'a, 'w, 's> GizmoBackend<'a, 'w, 's> {
    fn new(gizmos: &'a mut Gizmos<'w, 's>) -> Self {
        Self {
            gizmos,
            clear_color: None,
            labels: vec![],
        }
    }
}

impl RenderBackend for GizmoBackend<'_, '_, '_> {
    fn clear(&mut self, color: domain::Color) {
        self.clear_color = Some(color);
        self.labels.clear();
    }

    fn polygon(&mut self, points: &[Point], fill: domain::Color, stroke: Option<Stroke>) {
        let Some(&first) = points.first() else {
            return;
        };
        let outline = stroke.map_or(fill, |stroke| stroke.color);
        self.gizmos.linestrip_2d(
            points.iter().chain([&first]).map(|&p| to_bevy_position(p)),
            to_bevy_color(outline),
        );
    }

    fn rectangle(&mut self, corner: Point, width: f64, height: f64, fill: domain::Color) {
        let center = corner + Point::new(width / 2.0, height / 2.0);
        self.gizmos.rect_2d(
            to_bevy_position(center),
            0.0,
            Vec2::new(width as f32, height as f32),
            to_bevy_color(fill),
        );
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.gizmos.line_2d(
            to_bevy_position(from),
            to_bevy_position(to),
            to_bevy_color(stroke.color),
        );
    }

    fn ellipse(&mut self, center: Point, radius_x: f64, radius_y: f64, fill: domain::Color) {
        self.gizmos.circle_2d(
            to_bevy_position(center),
            radius_x.max(radius_y) as f32,
            to_bevy_color(fill),
        );
    }

    fn text(&mut self, position: Point, text: &str, color: domain::Color) {
        self.labels.push((position, text.to_string(), color));
    }
}

fn set_up(mut commands: Commands, world: Res<WorldRes>) {
    let (width, height) = (world.width() as f32, world.height() as f32);

    let mut camera = Camera2dBundle::default();
    camera.projection.scaling_mode = ScalingMode::AutoMin {
        min_width: width + 2.0 * MARGIN,
        min_height: height + 2.0 * MARGIN,
    };
    camera.transform.translation.x = width / 2.0;
    camera.transform.translation.y = -height / 2.0;
    commands.spawn(camera);

    commands.spawn(SpriteBundle {
        sprite: Sprite {
            color: to_bevy_color(world.ground_color()),
            custom_size: Some(Vec2::new(width, height)),
            ..default()
        },
        transform: Transform::from_xyz(width / 2.0, -height / 2.0, -1.0),
        ..default()
    });

    create_text(&mut commands);
}

fn create_text(commands: &mut Commands) {
    let text_style = TextStyle {
        font_size: 20.0,
        ..default()
    };
    commands.spawn((
        TextBundle::from_sections(vec![TextSection::new("", text_style)]).with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        }),
        StatusText,
    ));
}

fn draw_world(
    mut commands: Commands,
    mut gizmos: Gizmos,
    mut clear_color: ResMut<ClearColor>,
    mut labels: Query<(&mut Text, &mut Transform, &mut Visibility), With<NameLabel>>,
    world: Res<WorldRes>,
) {
    let mut backend = GizmoBackend::new(&mut gizmos);
    backend.draw_world(&world);
    let GizmoBackend {
        clear_color: clear,
        labels: texts,
        ..
    } = backend;

    if let Some(color) = clear.map(to_bevy_color) {
        if clear_color.0 != color {
            clear_color.0 = color;
        }
    }

    let mut pending = texts.into_iter();
    for (mut text, mut transform, mut visibility) in &mut labels {
        let Some((position, value, color)) = pending.next() else {
            *visibility = Visibility::Hidden;
            continue;
        };
        if text.sections[0].value != value {
            text.sections[0].value = value;
        }
        text.sections[0].style.color = to_bevy_color(color);
        transform.translation = to_bevy_position(position).extend(1.0);
        *visibility = Visibility::Inherited;
    }

    for (position, value, color) in pending {
        commands.spawn((
            Text2dBundle {
                text: Text::from_section(
                    value,
                    TextStyle {
                        font_size: LABEL_FONT_SIZE,
                        color: to_bevy_color(color),
                        ..default()
                    },
                ),
                transform: Transform::from_translation(to_bevy_position(position).extend(1.0)),
                ..default()
            },
            NameLabel,
        ));
    }
}

fn update_text(
    mut text: Query<&mut Text, With<StatusText>>,
    overlay: Res<Overlay>,
    selected: Res<SelectedRobot>,
    simulation: Res<Simulation>,
    world: Res<WorldRes>,
) {
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    let value = match world.robot_at(selected.0) {
        Some(robot) if overlay.show_text => status(robot, world.time(), simulation.paused),
        _ => String::new(),
    };
    if text.sections[0].value != value {
        text.sections[0].value = value;
    }
}

fn status(robot: &Robot, time: f64, paused: bool) -> String {
    let range = robot
        .device("rangesensor")
        .and_then(Device::as_range_sensor)
        .map_or("---".to_string(), |sensor| format!("{:6.2}", sensor.distance()));
    let light = robot
        .device("lightsensor")
        .and_then(Device::as_light_sensor)
        .map_or("---".to_string(), |sensor| format!("{:6.2}", sensor.reading()));
    let velocity = robot.velocity();
    let position = robot.position();

    let state = match (paused, robot.stalled()) {
        (true, _) => "   PAUSED",
        (false, true) => "   STALLED",
        (false, false) => "",
    };

    format!(
        "{time:7.1} s   {}: ({:6.1}, {:6.1}) {:5.1} deg   VEL: {:4.2} {:4.2}   \
         RANGE: {range}   LIGHT: {light}{state}",
        robot.name(),
        position.x(),
        position.y(),
        robot.direction().to_deg(),
        velocity.vx,
        velocity.va,
    )
}

fn handle_keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<Overlay>) {
    if keys.just_pressed(KeyCode::KeyT) {
        overlay.show_text = !overlay.show_text;
    }
}

fn to_bevy_position(position: Point) -> Vec2 {
    Vec2::new(position.x() as f32, -position.y() as f32)
}

fn to_bevy_color(color: domain::Color) -> Color {
    Color::rgba_u8(color.red, color.green, color.blue, color.alpha)
}
