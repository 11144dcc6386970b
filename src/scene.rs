use crate::config::SurfaceConfig;
use crate::grid::Grid;
use crate::oscillator::center_height;
use crate::surface::HeightField;
use glam::{Mat4, Vec3};
use std::ops::Range;

/// A visual element of the scene, as reported after an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    Points,
    /// Connector along grid row `i` (constant y).
    Row(usize),
    /// Connector along grid column `j` (constant x).
    Column(usize),
}

/// CPU-side copy of everything drawn: one point per grid cell and one
/// polyline per row and per column, all in plot coordinates.
pub struct Scene {
    config: SurfaceConfig,
    grid: Grid,
    heights: HeightField,
    center_z: f32,
    points: Vec<[f32; 3]>,
    /// `2 * N` polylines of `N` vertices each, rows first, then columns.
    lines: Vec<[f32; 3]>,
}

impl Scene {
    pub fn new(config: SurfaceConfig) -> Self {
        let grid = Grid::new(config.grid_size);
        let heights = HeightField::new(&grid);
        let n = grid.size();
        let mut scene = Self {
            points: vec![[0.0; 3]; grid.len()],
            lines: vec![[0.0; 3]; 2 * n * n],
            config,
            grid,
            heights,
            center_z: 0.0,
        };
        scene.update(0);
        scene
    }

    /// Recomputes the height field for `frame` and rewrites every point and
    /// connector line. Returns the elements that changed.
    pub fn update(&mut self, frame: u32) -> Vec<Element> {
        self.center_z = center_height(frame, self.config.period_frames, self.config.peak_height);
        self.heights.recompute(&self.grid, self.center_z, self.config.falloff);

        let n = self.grid.size();
        for i in 0..n {
            for j in 0..n {
                let p = [self.grid.x(i, j), self.grid.y(i, j), self.heights.get(i, j)];
                self.points[self.grid.index(i, j)] = p;
                self.lines[i * n + j] = p;
                self.lines[(n + j) * n + i] = p;
            }
        }

        let mut changed = Vec::with_capacity(1 + 2 * n);
        changed.push(Element::Points);
        changed.extend((0..n).map(Element::Row));
        changed.extend((0..n).map(Element::Column));
        changed
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn center_z(&self) -> f32 {
        self.center_z
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    /// All connector vertices, line after line.
    pub fn line_vertices(&self) -> &[[f32; 3]] {
        &self.lines
    }

    /// Where a row or column connector sits in `line_vertices`.
    pub fn line_range(&self, element: Element) -> Option<Range<usize>> {
        let n = self.grid.size();
        let k = match element {
            Element::Points => return None,
            Element::Row(i) if i < n => i,
            Element::Column(j) if j < n => n + j,
            _ => return None,
        };
        Some(k * n..(k + 1) * n)
    }

    /// Segment indices for drawing the connectors as a line list.
    /// Fixed for the lifetime of the scene.
    pub fn line_indices(&self) -> Vec<u32> {
        let n = self.grid.size() as u32;
        let mut indices = Vec::with_capacity((2 * n * n.saturating_sub(1) * 2) as usize);
        for line in 0..2 * n {
            let base = line * n;
            for s in 0..n.saturating_sub(1) {
                indices.push(base + s);
                indices.push(base + s + 1);
            }
        }
        indices
    }

    pub fn bounds(&self) -> PlotBounds {
        let (x_min, x_max) = self.config.xy_limits();
        let (z_min, z_max) = self.config.z_limits;
        PlotBounds {
            min: Vec3::new(x_min, x_min, z_min),
            max: Vec3::new(x_max, x_max, z_max),
        }
    }
}

/// Axis limits of the plot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Proportions of the display box the limits are stretched onto.
pub const BOX_ASPECT: Vec3 = Vec3::new(1.0, 1.0, 0.75);

impl PlotBounds {
    /// Maps the limits box onto a box centered at the origin with half
    /// extents `BOX_ASPECT`, whatever the units of each axis.
    pub fn to_display(&self) -> Mat4 {
        let center = (self.min + self.max) * 0.5;
        let extent = (self.max - self.min).max(Vec3::splat(f32::EPSILON));
        Mat4::from_scale(2.0 * BOX_ASPECT / extent) * Mat4::from_translation(-center)
    }

    /// The 12 edges of the limits box as pairs of corners.
    pub fn edges(&self) -> [[Vec3; 2]; 12] {
        let corner = |bits: usize| {
            Vec3::new(
                if bits & 1 == 0 { self.min.x } else { self.max.x },
                if bits & 2 == 0 { self.min.y } else { self.max.y },
                if bits & 4 == 0 { self.min.z } else { self.max.z },
            )
        };
        let mut edges = [[Vec3::ZERO; 2]; 12];
        let mut k = 0;
        for a in 0..8usize {
            for axis in [1usize, 2, 4] {
                if a & axis == 0 {
                    edges[k] = [corner(a), corner(a | axis)];
                    k += 1;
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(SurfaceConfig::default())
    }

    #[test]
    fn center_height_follows_the_frame() {
        let mut scene = scene();
        assert_eq!(scene.heights.get(16, 16), 1.5);
        scene.update(150);
        assert_eq!(scene.heights.get(16, 16), 0.0);
        scene.update(300);
        assert_eq!(scene.heights.get(16, 16), -1.5);
        assert_eq!(scene.center_z(), -1.5);
    }

    #[test]
    fn update_reports_points_and_every_line() {
        let mut scene = scene();
        let changed = scene.update(42);
        assert_eq!(changed.len(), 1 + 64);
        assert_eq!(changed[0], Element::Points);
        assert_eq!(changed[1], Element::Row(0));
        assert_eq!(changed[32], Element::Row(31));
        assert_eq!(changed[33], Element::Column(0));
        assert_eq!(changed[64], Element::Column(31));
    }

    #[test]
    fn points_carry_grid_coordinates_and_heights() {
        let mut scene = scene();
        scene.update(75);
        let grid = Grid::new(32);
        assert_eq!(scene.points().len(), 1024);
        for (i, j) in [(0, 0), (16, 16), (3, 29), (31, 0)] {
            let p = scene.points()[grid.index(i, j)];
            assert_eq!(p, [j as f32, i as f32, scene.heights.get(i, j)]);
        }
    }

    #[test]
    fn lines_follow_rows_and_columns() {
        let mut scene = scene();
        scene.update(420);
        let row = &scene.line_vertices()[scene.line_range(Element::Row(5)).unwrap()];
        let column = &scene.line_vertices()[scene.line_range(Element::Column(7)).unwrap()];
        assert_eq!(row.len(), 32);
        assert_eq!(column.len(), 32);
        for k in 0..32 {
            assert_eq!(row[k], [k as f32, 5.0, scene.heights.get(5, k)]);
            assert_eq!(column[k], [7.0, k as f32, scene.heights.get(k, 7)]);
        }
        assert_eq!(scene.line_range(Element::Points), None);
        assert_eq!(scene.line_range(Element::Row(32)), None);
        assert_eq!(scene.line_range(Element::Column(31)), Some(63 * 32..64 * 32));
    }

    #[test]
    fn line_indices_never_bridge_two_lines() {
        let scene = scene();
        let indices = scene.line_indices();
        assert_eq!(indices.len(), 64 * 31 * 2);
        for pair in indices.chunks(2) {
            assert_eq!(pair[1], pair[0] + 1);
            assert_eq!(pair[0] / 32, pair[1] / 32);
        }
        assert_eq!(scene.line_vertices().len(), 64 * 32);
    }

    #[test]
    fn same_frame_gives_same_scene() {
        let mut scene = scene();
        scene.update(333);
        let first = scene.points().to_vec();
        scene.update(12);
        scene.update(333);
        assert_eq!(scene.points(), &first[..]);
    }

    #[test]
    fn limits_map_onto_the_display_box() {
        let bounds = scene().bounds();
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(bounds.max, Vec3::new(31.0, 31.0, 2.0));
        let m = bounds.to_display();
        assert!(m.transform_point3(bounds.min).abs_diff_eq(-BOX_ASPECT, 1e-6));
        assert!(m.transform_point3(bounds.max).abs_diff_eq(BOX_ASPECT, 1e-6));
        assert!(m.transform_point3(Vec3::new(15.5, 15.5, 0.0)).abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn box_has_twelve_axis_aligned_edges() {
        let bounds = scene().bounds();
        let edges = bounds.edges();
        for [a, b] in edges {
            let d = b - a;
            let nonzero = [d.x, d.y, d.z].iter().filter(|c| **c != 0.0).count();
            assert_eq!(nonzero, 1);
        }
    }
}
