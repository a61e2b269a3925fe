//! Ray-cast camera.
//!
//! The camera casts one ray per image column, spread over its field of view, and composites a
//! synthetic picture from the hits: a sky band, a wall band whose height shrinks with the
//! distance of the nearest wall, a ground band, and strips for other robots in front of that
//! wall. Casting is lazy. Refreshing only marks the cached hits as stale and the rays are cast
//! again on the next picture. A picture taken from another pose, or after the obstacle registry
//! changed, casts again as well.

use std::f64::consts::PI;

use super::{validate_max_range, validate_unit, DeviceError, SensorView};
use crate::domain::{Angle, Color, DrawCommand, Hit, Point, Pose};

const SKY: Color = Color::NAVY;
const GROUND: Color = Color::GREEN;
const LENS: Color = Color::rgb(0, 64, 0);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PictureKind {
    #[default]
    Color,
    /// Brightness grows as obstacles get closer.
    Depth,
    Gray,
}

/// Row-major grid of pixels. Row 0 is the top of the picture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, fill: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, column: usize, row: usize) -> Option<Color> {
        (column < self.width && row < self.height).then(|| self.pixels[row * self.width + column])
    }

    pub fn set(&mut self, column: usize, row: usize, color: Color) {
        if column < self.width && row < self.height {
            self.pixels[row * self.width + column] = color;
        }
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = Color> + '_ {
        (0..self.height).filter_map(move |row| self.get(column, row))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    width: usize,
    height: usize,
    field_of_view: Angle,
    color_fade: f64,
    size_fade: f64,
    reflect_ground: bool,
    reflect_sky: bool,
    max_range: f64,
    hits: Vec<Vec<Hit>>,
    stale: bool,
    /// Pose and registry revision of the last cast.
    cast_from: Option<(Pose, u64)>,
}

impl Camera {
    pub fn new(width: usize, height: usize, field_of_view: Angle) -> Result<Self, DeviceError> {
        validate_resolution(width, height)?;
        let mut camera = Self {
            width,
            height,
            field_of_view,
            ..Self::default()
        };
        camera.invalidate();
        Ok(camera)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn field_of_view(&self) -> Angle {
        self.field_of_view
    }

    pub fn color_fade(&self) -> f64 {
        self.color_fade
    }

    pub fn size_fade(&self) -> f64 {
        self.size_fade
    }

    pub fn reflect_ground(&self) -> bool {
        self.reflect_ground
    }

    pub fn reflect_sky(&self) -> bool {
        self.reflect_sky
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether the next picture from `view` has to cast its rays again.
    pub fn needs_cast(&self, view: &SensorView) -> bool {
        self.stale || self.cast_from != Some((view.pose, view.environment.revision()))
    }

    /// Hits of the last cast, one farthest-first list per column.
    pub fn column_hits(&self) -> &[Vec<Hit>] {
        &self.hits
    }

    pub fn set_field_of_view(&mut self, field_of_view: Angle) {
        self.field_of_view = field_of_view;
        self.invalidate();
    }

    pub fn set_size(&mut self, width: usize, height: usize) -> Result<(), DeviceError> {
        validate_resolution(width, height)?;
        self.width = width;
        self.height = height;
        self.invalidate();
        Ok(())
    }

    /// Fade factors in `[0, 1]`: 0 disables the fade, 1 fades fully at the arena size.
    pub fn set_fade(&mut self, color_fade: f64, size_fade: f64) -> Result<(), DeviceError> {
        self.color_fade = validate_unit("color fade", color_fade)?;
        self.size_fade = validate_unit("size fade", size_fade)?;
        Ok(())
    }

    pub fn set_reflections(&mut self, ground: bool, sky: bool) {
        self.reflect_ground = ground;
        self.reflect_sky = sky;
    }

    pub fn set_max_range(&mut self, max_range: f64) -> Result<(), DeviceError> {
        self.max_range = validate_max_range(max_range)?;
        self.invalidate();
        Ok(())
    }

    pub fn step(&mut self, _dt: f64) {}

    pub fn refresh(&mut self, _view: &SensorView) {
        self.stale = true;
    }

    pub fn take_picture(&mut self, view: &SensorView, kind: PictureKind) -> PixelGrid {
        if self.needs_cast(view) {
            self.cast(view);
        }
        self.compose(view, kind)
    }

    /// Points `(x, y, depth, red, green, blue)` for every pixel that is not at maximum depth.
    /// Both axes are flipped so that `(0, 0)` is the bottom right of the picture.
    pub fn point_cloud(&mut self, view: &SensorView) -> Vec<[u32; 6]> {
        let depth = self.take_picture(view, PictureKind::Depth);
        let color = self.take_picture(view, PictureKind::Color);

        let mut points = vec![];
        for column in 0..self.width {
            for row in 0..self.height {
                let (Some(d), Some(c)) = (depth.get(column, row), color.get(column, row)) else {
                    continue;
                };
                if d.red != u8::MAX {
                    points.push([
                        (self.width - column - 1) as u32,
                        (self.height - row - 1) as u32,
                        d.red.into(),
                        c.red.into(),
                        c.green.into(),
                        c.blue.into(),
                    ]);
                }
            }
        }
        points
    }

    pub fn draw(&self, pose: Pose, commands: &mut Vec<DrawCommand>) {
        let (x, y, w, h) = (5.0, -3.33, 1.33, 6.33);
        commands.push(DrawCommand::Polygon {
            points: [
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ]
            .into_iter()
            .map(|p| pose.transform(p))
            .collect(),
            fill: LENS,
            stroke: None,
        });
    }

    fn invalidate(&mut self) {
        self.hits = vec![vec![]; self.width];
        self.stale = true;
    }

    fn cast(&mut self, view: &SensorView) {
        let fov = self.field_of_view.radians();
        self.hits = (0..self.width)
            .map(|i| {
                let offset = Angle::new(i as f64 / self.width as f64 * fov - fov / 2.0);
                view.cast_ray(view.pose.position, view.pose.ray_angle(offset), self.max_range)
            })
            .collect();
        self.stale = false;
        self.cast_from = Some((view.pose, view.environment.revision()));
    }

    fn compose(&self, view: &SensorView, kind: PictureKind) -> PixelGrid {
        let rows = self.height as f64;
        let horizon = rows / 2.0;
        let size = view.environment.width().max(view.environment.height());
        let mut picture = PixelGrid::new(self.width, self.height, Color::TRANSPARENT);

        for (column, hits) in self.hits.iter().enumerate() {
            let closest_wall = hits.iter().rev().find(|h| h.is_wall());

            let (high, wall_color) = match closest_wall {
                Some(hit) => {
                    let fade = self.fade(hit.distance(), size);
                    (
                        (1.0 - fade.size) * rows,
                        Some(self.shade(hit.color(), fade, kind)),
                    )
                }
                None => (rows, None),
            };

            for row in 0..self.height {
                let j = row as f64;
                let gradient = ((j - horizon).abs() / horizon).clamp(0.0, 1.0);
                let color = if j < high / 2.0 {
                    self.backdrop(SKY, self.reflect_sky, gradient, kind)
                } else if j < rows - high / 2.0 {
                    match wall_color {
                        Some(color) => color,
                        None => continue,
                    }
                } else {
                    self.backdrop(GROUND, self.reflect_ground, gradient, kind)
                };
                picture.set(column, row, color);
            }

            let cutoff = closest_wall.map_or(f64::INFINITY, Hit::distance);
            for hit in hits.iter().filter(|h| !h.is_wall()) {
                if hit.distance() > cutoff {
                    continue;
                }
                let fade = self.fade(hit.distance(), size);
                let offset = (horizon * (1.0 - fade.color)).round() as i64;
                let strip = (hit.height() * horizon * fade.size).round() as i64;
                let color = self.shade(hit.color(), fade, kind);
                for j in 0..strip {
                    let row = self.height as i64 - j - 1 - offset;
                    if row >= 0 {
                        picture.set(column, row as usize, color);
                    }
                }
            }
        }

        picture
    }

    fn fade(&self, distance: f64, size: f64) -> Fade {
        let ratio = if size > 0.0 { distance / size } else { 0.0 };
        Fade {
            depth: (1.0 - ratio).clamp(0.0, 1.0),
            size: (1.0 - ratio * self.size_fade).clamp(0.0, 1.0),
            color: (1.0 - ratio * self.color_fade).clamp(0.0, 1.0),
        }
    }

    fn shade(&self, color: Color, fade: Fade, kind: PictureKind) -> Color {
        match kind {
            PictureKind::Color => color.faded(fade.color),
            PictureKind::Depth => Color::gray((255.0 * fade.depth) as u8),
            PictureKind::Gray => color.grayscale(fade.color),
        }
    }

    fn backdrop(&self, color: Color, reflect: bool, gradient: f64, kind: PictureKind) -> Color {
        match kind {
            PictureKind::Color => color,
            PictureKind::Depth if reflect => Color::gray((255.0 * gradient) as u8),
            PictureKind::Depth => Color::BLACK,
            PictureKind::Gray => Color::gray((128.0 / 3.0) as u8),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        let width = 256;
        Self {
            width,
            height: 128,
            field_of_view: Angle::new(PI / 3.0),
            color_fade: 0.5,
            size_fade: 1.0,
            reflect_ground: true,
            reflect_sky: false,
            max_range: 1000.0,
            hits: vec![vec![]; width],
            stale: true,
            cast_from: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Fade {
    depth: f64,
    size: f64,
    color: f64,
}

fn validate_resolution(width: usize, height: usize) -> Result<(), DeviceError> {
    if width == 0 || height == 0 {
        Err(DeviceError::InvalidResolution { width, height })
    } else {
        Ok(())
    }
}
