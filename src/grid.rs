/// Fixed N×N lattice of sample positions, laid out like a mesh grid:
/// row `i` varies along y, column `j` varies along x.
#[derive(Clone, Debug)]
pub struct Grid {
    size: usize,
    axis: Vec<f32>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        let axis = linspace(0.0, size.saturating_sub(1) as f32, size);
        Self { size, axis }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.size * self.size
    }

    /// Midpoint in index space, `(N / 2, N / 2)`.
    pub fn center(&self) -> (usize, usize) {
        (self.size / 2, self.size / 2)
    }

    pub fn x(&self, _i: usize, j: usize) -> f32 {
        self.axis[j]
    }

    pub fn y(&self, i: usize, _j: usize) -> f32 {
        self.axis[i]
    }

    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.size + j
    }
}

fn linspace(start: f32, end: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f32;
            (0..count).map(|k| start + step * k as f32).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_is_unit_spaced() {
        let grid = Grid::new(32);
        assert_eq!(grid.len(), 1024);
        for k in 0..32 {
            assert_eq!(grid.x(0, k), k as f32);
            assert_eq!(grid.y(k, 0), k as f32);
        }
    }

    #[test]
    fn rows_vary_in_y_and_columns_in_x() {
        let grid = Grid::new(4);
        assert_eq!(grid.x(3, 1), 1.0);
        assert_eq!(grid.y(3, 1), 3.0);
        assert_eq!(grid.index(3, 1), 13);
    }

    #[test]
    fn center_uses_integer_division() {
        assert_eq!(Grid::new(32).center(), (16, 16));
        assert_eq!(Grid::new(5).center(), (2, 2));
    }

    #[test]
    fn empty_and_single_grids() {
        assert_eq!(Grid::new(0).len(), 0);
        let one = Grid::new(1);
        assert_eq!(one.x(0, 0), 0.0);
        assert_eq!(one.center(), (0, 0));
    }
}
