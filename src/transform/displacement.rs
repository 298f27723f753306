//! Dense displacement field sampled on a regular grid.

use super::{Deformation, TransformError, TransformResult};
use crate::geometry::{GridDefinition, GridPoint};

/// One displacement vector per grid node, x-fastest ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementGrid {
    grid: GridDefinition,
    vectors: Vec<[f64; 3]>,
}

impl DisplacementGrid {
    pub fn identity(grid: GridDefinition) -> Self {
        Self {
            grid,
            vectors: vec![[0.0; 3]; grid.node_count()],
        }
    }

    pub fn from_vectors(grid: GridDefinition, vectors: Vec<[f64; 3]>) -> TransformResult<Self> {
        if vectors.len() != grid.node_count() {
            return Err(TransformError::FieldSize {
                expected: grid.node_count(),
                actual: vectors.len(),
            });
        }
        Ok(Self { grid, vectors })
    }

    /// Uniform field, mostly useful for translations in tests and previews.
    pub fn uniform(grid: GridDefinition, displacement: [f64; 3]) -> Self {
        Self {
            grid,
            vectors: vec![displacement; grid.node_count()],
        }
    }

    pub const fn grid(&self) -> &GridDefinition {
        &self.grid
    }

    pub fn vectors(&self) -> &[[f64; 3]] {
        &self.vectors
    }

    pub fn node(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        self.vectors[self.grid.index(i, j, k)]
    }

    /// Trilinear sample at a physical point, clamped to the grid edge.
    pub fn sample(&self, point: GridPoint) -> [f64; 3] {
        if self.vectors.is_empty() {
            return [0.0; 3];
        }
        let continuous = self.grid.continuous_index(point);
        let mut lower = [0usize; 3];
        let mut upper = [0usize; 3];
        let mut weight = [0f64; 3];
        for axis in 0..3 {
            let max = self.grid.dimensions[axis].saturating_sub(1) as f64;
            let c = continuous[axis].clamp(0.0, max);
            let floor = c.floor();
            lower[axis] = floor as usize;
            upper[axis] = (lower[axis] + 1).min(self.grid.dimensions[axis].saturating_sub(1));
            weight[axis] = c - floor;
        }

        let mut out = [0.0; 3];
        for corner in 0..8 {
            let pick = |axis: usize| (corner >> axis) & 1 == 1;
            let mut w = 1.0;
            let mut idx = [0usize; 3];
            for axis in 0..3 {
                if pick(axis) {
                    w *= weight[axis];
                    idx[axis] = upper[axis];
                } else {
                    w *= 1.0 - weight[axis];
                    idx[axis] = lower[axis];
                }
            }
            if w == 0.0 {
                continue;
            }
            let v = self.node(idx[0], idx[1], idx[2]);
            for axis in 0..3 {
                out[axis] += w * v[axis];
            }
        }
        out
    }

    pub fn transform_point(&self, point: GridPoint) -> GridPoint {
        point.offset(self.sample(point))
    }
}

impl Deformation for DisplacementGrid {
    fn is_compatible(&self, other: &Self) -> bool {
        self.grid == other.grid
    }

    fn resolution(&self) -> Option<f64> {
        Some(self.grid.resolution())
    }

    // u(x) = u_self(x) + u_next(x + u_self(x)), evaluated at the nodes of `self`.
    fn compose(&mut self, next: &Self) {
        let [nx, ny, nz] = self.grid.dimensions;
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let idx = self.grid.index(i, j, k);
                    let u = self.vectors[idx];
                    let moved = self.grid.node_position(i, j, k).offset(u);
                    let v = next.sample(moved);
                    self.vectors[idx] = [u[0] + v[0], u[1] + v[1], u[2] + v[2]];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridDefinition {
        GridDefinition::isotropic(GridPoint::new(0.0, 0.0, 0.0), 1.0, [5, 5, 5])
    }

    fn approx(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn from_vectors_rejects_wrong_length() {
        let err = DisplacementGrid::from_vectors(grid(), vec![[0.0; 3]; 3]).unwrap_err();
        assert_eq!(
            err,
            TransformError::FieldSize {
                expected: 125,
                actual: 3
            }
        );
    }

    #[test]
    fn sample_interpolates_between_nodes() {
        let g = grid();
        let vectors = (0..g.node_count())
            .map(|n| [(n % 5) as f64, 0.0, 0.0])
            .collect::<Vec<_>>();
        let field = DisplacementGrid::from_vectors(g, vectors).expect("sized field");

        let v = field.sample(GridPoint::new(1.5, 2.0, 2.0));
        assert!(approx(v, [1.5, 0.0, 0.0]));
    }

    #[test]
    fn sample_clamps_outside_the_grid() {
        let field = DisplacementGrid::uniform(grid(), [1.0, 2.0, 3.0]);
        assert!(approx(
            field.sample(GridPoint::new(-40.0, 99.0, 2.0)),
            [1.0, 2.0, 3.0]
        ));
    }

    #[test]
    fn composing_translations_adds_them() {
        let mut base = DisplacementGrid::uniform(grid(), [1.0, 0.0, 0.0]);
        let next = DisplacementGrid::uniform(grid(), [0.0, -2.0, 0.5]);
        base.compose(&next);
        assert!(base.vectors().iter().all(|v| approx(*v, [1.0, -2.0, 0.5])));
    }

    #[test]
    fn composition_samples_next_at_the_displaced_position() {
        let g = grid();
        let mut base = DisplacementGrid::uniform(g, [1.0, 0.0, 0.0]);
        let ramp = (0..g.node_count())
            .map(|n| [0.0, (n % 5) as f64, 0.0])
            .collect::<Vec<_>>();
        let next = DisplacementGrid::from_vectors(g, ramp).expect("sized field");

        base.compose(&next);
        // node x=1 lands on x=2 before the ramp is read
        assert!(approx(base.node(1, 0, 0), [1.0, 2.0, 0.0]));
        // node x=4 lands outside and clamps to the last column
        assert!(approx(base.node(4, 0, 0), [1.0, 4.0, 0.0]));
    }

    #[test]
    fn compatibility_requires_identical_grids() {
        let a = DisplacementGrid::identity(grid());
        let b = DisplacementGrid::identity(GridDefinition::isotropic(
            GridPoint::new(0.0, 0.0, 0.0),
            2.0,
            [5, 5, 5],
        ));
        assert!(a.is_compatible(&a.clone()));
        assert!(!a.is_compatible(&b));
    }

    #[test]
    fn transform_point_applies_the_displacement() {
        let field = DisplacementGrid::uniform(grid(), [0.5, 0.5, 0.5]);
        assert_eq!(
            field.transform_point(GridPoint::new(1.0, 1.0, 1.0)),
            GridPoint::new(1.5, 1.5, 1.5)
        );
    }

    #[test]
    fn empty_grid_samples_as_identity() {
        let flat = GridDefinition::isotropic(GridPoint::new(0.0, 0.0, 0.0), 1.0, [4, 0, 4]);
        let mut field = DisplacementGrid::identity(flat);
        assert!(field.vectors().is_empty());
        assert_eq!(field.sample(GridPoint::new(1.0, 1.0, 1.0)), [0.0; 3]);
        assert_eq!(
            field.transform_point(GridPoint::new(2.0, 0.0, 1.0)),
            GridPoint::new(2.0, 0.0, 1.0)
        );

        field.compose(&DisplacementGrid::uniform(flat, [1.0, 1.0, 1.0]));
        assert!(field.vectors().is_empty());
    }
}
