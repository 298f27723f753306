/// Shared spatial primitives used by the transform store and the annotation ledger.

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GridPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, delta: [f64; 3]) -> Self {
        Self::new(self.x + delta[0], self.y + delta[1], self.z + delta[2])
    }
}

/// Regular sampling lattice of a grid transform.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridDefinition {
    pub origin: GridPoint,
    pub spacing: [f64; 3],
    pub dimensions: [usize; 3],
}

impl GridDefinition {
    pub const fn new(origin: GridPoint, spacing: [f64; 3], dimensions: [usize; 3]) -> Self {
        Self {
            origin,
            spacing,
            dimensions,
        }
    }

    /// Isotropic lattice with `resolution` mm spacing.
    pub const fn isotropic(origin: GridPoint, resolution: f64, dimensions: [usize; 3]) -> Self {
        Self::new(origin, [resolution; 3], dimensions)
    }

    pub const fn node_count(&self) -> usize {
        self.dimensions[0] * self.dimensions[1] * self.dimensions[2]
    }

    pub const fn resolution(&self) -> f64 {
        self.spacing[0]
    }

    pub const fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.dimensions[1] + j) * self.dimensions[0] + i
    }

    pub fn node_position(&self, i: usize, j: usize, k: usize) -> GridPoint {
        GridPoint::new(
            self.origin.x + i as f64 * self.spacing[0],
            self.origin.y + j as f64 * self.spacing[1],
            self.origin.z + k as f64 * self.spacing[2],
        )
    }

    /// Continuous lattice coordinates of a physical point.
    pub fn continuous_index(&self, point: GridPoint) -> [f64; 3] {
        [
            (point.x - self.origin.x) / self.spacing[0],
            (point.y - self.origin.y) / self.spacing[1],
            (point.z - self.origin.z) / self.spacing[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_x_fastest() {
        let grid = GridDefinition::isotropic(GridPoint::new(0.0, 0.0, 0.0), 1.0, [4, 3, 2]);
        assert_eq!(grid.index(0, 0, 0), 0);
        assert_eq!(grid.index(1, 0, 0), 1);
        assert_eq!(grid.index(0, 1, 0), 4);
        assert_eq!(grid.index(0, 0, 1), 12);
        assert_eq!(grid.node_count(), 24);
    }

    #[test]
    fn continuous_index_inverts_node_position() {
        let grid = GridDefinition::new(GridPoint::new(-10.0, 5.0, 2.0), [2.0, 0.5, 1.0], [8, 8, 8]);
        let point = grid.node_position(3, 4, 5);
        assert_eq!(grid.continuous_index(point), [3.0, 4.0, 5.0]);
    }
}
