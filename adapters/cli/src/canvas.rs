//! Character grid implementation of the debug drawing surface.

use std::fmt;

use glam::{Affine2, Vec2};
use stride_core::{Bounds, DebugColor, ShapeDrawer, Vector};

const CIRCLE_SEGMENTS: usize = 32;

/// Rasterises debug primitives into a grid of characters.
#[derive(Debug)]
pub(crate) struct AsciiCanvas {
    origin: Vec2,
    cell: f32,
    columns: usize,
    rows: usize,
    cells: Vec<char>,
    rotations: Vec<Affine2>,
}

impl AsciiCanvas {
    /// Creates a blank canvas covering `bounds` with square cells of side `cell`.
    pub(crate) fn covering(bounds: Bounds, cell: f32) -> Self {
        let cell = cell.max(1.0);
        let columns = (((bounds.max.x - bounds.min.x) / cell).ceil().max(0.0) as usize) + 1;
        let rows = (((bounds.max.y - bounds.min.y) / cell).ceil().max(0.0) as usize) + 1;
        Self {
            origin: bounds.min.as_glam(),
            cell,
            columns,
            rows,
            cells: vec!['.'; columns * rows],
            rotations: Vec::new(),
        }
    }

    fn transform(&self) -> Affine2 {
        self.rotations.last().copied().unwrap_or(Affine2::IDENTITY)
    }

    fn plot(&mut self, point: Vec2, glyph: char) {
        let local = (self.transform().transform_point2(point) - self.origin) / self.cell;
        if local.x < 0.0 || local.y < 0.0 {
            return;
        }
        let (column, row) = (local.x.round() as usize, local.y.round() as usize);
        if column < self.columns && row < self.rows {
            self.cells[row * self.columns + column] = glyph;
        }
    }

    fn segment(&mut self, from: Vec2, to: Vec2, glyph: char) {
        let steps = ((to - from).length() / (self.cell * 0.5)).ceil().max(1.0) as usize;
        for step in 0..=steps {
            self.plot(from.lerp(to, step as f32 / steps as f32), glyph);
        }
    }
}

fn glyph(color: DebugColor) -> char {
    match color {
        DebugColor::SOLID => '#',
        DebugColor::GHOST => '+',
        DebugColor::PATH => '*',
        DebugColor::WAYPOINT => 'o',
        DebugColor::ADJUSTED => '@',
        _ => '?',
    }
}

impl ShapeDrawer for AsciiCanvas {
    fn draw_circle(&mut self, center: Vector, radius: f32, color: DebugColor) {
        let center = center.as_glam();
        let glyph = glyph(color);
        if radius <= self.cell * 0.5 {
            self.plot(center, glyph);
            return;
        }
        for segment in 0..CIRCLE_SEGMENTS {
            let angle = segment as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            self.plot(center + Vec2::from_angle(angle) * radius, glyph);
        }
    }

    fn draw_line(&mut self, from: Vector, to: Vector, color: DebugColor) {
        self.segment(from.as_glam(), to.as_glam(), glyph(color));
    }

    fn draw_rect(&mut self, origin: Vector, size: Vector, color: DebugColor) {
        let glyph = glyph(color);
        let min = origin.as_glam();
        let max = min + size.as_glam();
        let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
        for (index, corner) in corners.iter().enumerate() {
            self.segment(*corner, corners[(index + 1) % corners.len()], glyph);
        }
    }

    fn push_rotation(&mut self, pivot: Vector, radians: f32) {
        let pivot = pivot.as_glam();
        let local = Affine2::from_translation(pivot)
            * Affine2::from_angle(radians)
            * Affine2::from_translation(-pivot);
        let combined = self.transform() * local;
        self.rotations.push(combined);
    }

    fn pop_rotation(&mut self) {
        let _ = self.rotations.pop();
    }
}

impl fmt::Display for AsciiCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.columns) {
            let line: String = row.iter().collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
