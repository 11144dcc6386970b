use crate::grid::Grid;

/// Height per grid point, row-major, same shape as the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    size: usize,
    heights: Vec<f32>,
}

impl HeightField {
    pub fn new(grid: &Grid) -> Self {
        Self {
            size: grid.size(),
            heights: vec![0.0; grid.len()],
        }
    }

    /// Overwrites every cell, center included, with
    /// `center_z * exp(-falloff * d²)` where `d` is the index-space distance
    /// to the grid center.
    pub fn recompute(&mut self, grid: &Grid, center_z: f32, falloff: f32) {
        debug_assert_eq!(self.size, grid.size());
        let (cx, cy) = grid.center();
        for i in 0..self.size {
            for j in 0..self.size {
                let di = i as f32 - cx as f32;
                let dj = j as f32 - cy as f32;
                let dist_sq = di * di + dj * dj;
                self.heights[i * self.size + j] = center_z * (-falloff * dist_sq).exp();
            }
        }
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.heights[i * self.size + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FALLOFF;

    const EPS: f32 = 1e-6;

    fn generate(grid: &Grid, center_z: f32) -> HeightField {
        let mut field = HeightField::new(grid);
        field.recompute(grid, center_z, FALLOFF);
        field
    }

    #[test]
    fn center_cell_equals_center_height() {
        let grid = Grid::new(32);
        for center_z in [1.5, 0.0, -1.5, 0.37] {
            let field = generate(&grid, center_z);
            assert_eq!(field.get(16, 16), center_z);
        }
    }

    #[test]
    fn falls_off_with_squared_distance() {
        let grid = Grid::new(32);
        let field = generate(&grid, 1.5);
        for (i, j) in [(16, 17), (13, 20), (0, 0), (31, 31), (16, 0)] {
            let d2 = (i as f32 - 16.0).powi(2) + (j as f32 - 16.0).powi(2);
            let expected = 1.5 * (-0.1 * d2).exp();
            assert!((field.get(i, j) - expected).abs() < EPS, "cell ({i}, {j})");
        }
    }

    #[test]
    fn symmetric_about_the_center() {
        let grid = Grid::new(32);
        let field = generate(&grid, -0.8);
        for k in 1..16 {
            let right = field.get(16 + k, 16);
            assert_eq!(right, field.get(16 - k, 16));
            assert_eq!(right, field.get(16, 16 + k));
            assert_eq!(right, field.get(16, 16 - k));
        }
        assert_eq!(field.get(13, 20), field.get(20, 13));
    }

    #[test]
    fn recompute_replaces_the_whole_field() {
        let grid = Grid::new(8);
        let mut field = generate(&grid, 1.5);
        field.recompute(&grid, -1.0, FALLOFF);
        assert_eq!(field, generate(&grid, -1.0));
        assert!(field.heights.iter().all(|z| *z < 0.0));
    }

    #[test]
    fn identical_inputs_give_bit_identical_output() {
        let grid = Grid::new(32);
        let a = generate(&grid, 0.731);
        let b = generate(&grid, 0.731);
        let bits = |f: &HeightField| f.heights.iter().map(|z| z.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn zero_center_height_flattens_the_field() {
        let grid = Grid::new(32);
        let field = generate(&grid, 0.0);
        assert!(field.heights.iter().all(|z| *z == 0.0));
    }
}
