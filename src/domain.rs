//! The square domain individuals live in, and the uniform cell grid that answers
//! "who is within radius R of point P" without scanning the whole population.
//!
//! The domain is centred on the origin, `[-L/2, L/2]²`. Patient zero sits at the origin and all
//! reported distances are measured from it. Positions never move during a trial.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{invalid, SimulationError};

/// The id patient zero is always given.
pub const PATIENT_ZERO: usize = 0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    #[must_use]
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Euclidean distance from the origin.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

#[derive(Clone, Debug)]
pub struct Domain {
    side_length: f64,
    cell_side: f64,
    cells_per_side: usize,
    positions: Vec<Point>,
    // Ids in each cell, row-major. Ids within a cell are ascending.
    cells: Vec<Vec<usize>>,
}

impl Domain {
    /// Builds the grid over the given positions. `cell_size` is the smallest allowed cell side;
    /// it should be the largest contact radius in use so that a query only touches the 3×3
    /// block around the query point. The grid never has more than about one cell per position.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if there are no positions, the side length
    /// or cell size is not positive, or a position lies outside the domain.
    pub fn new(
        positions: Vec<Point>,
        side_length: f64,
        cell_size: f64,
    ) -> Result<Self, SimulationError> {
        if positions.is_empty() {
            return invalid("population must contain at least one individual");
        }
        if !(side_length.is_finite() && side_length > 0.0) {
            return invalid(format!("side length must be positive, got {side_length}"));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return invalid(format!("cell size must be positive, got {cell_size}"));
        }

        let half = side_length / 2.0;
        if let Some(outside) = positions
            .iter()
            .find(|p| p.x.abs() > half || p.y.abs() > half)
        {
            return invalid(format!(
                "position ({}, {}) lies outside the domain of side {side_length}",
                outside.x, outside.y
            ));
        }

        // Round down so that every cell is at least `cell_size` wide, and keep the grid no
        // larger than about one cell per individual so a sparse, wide domain stays small.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let by_size = (side_length / cell_size).floor() as usize;
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let by_population = (positions.len() as f64).sqrt().ceil() as usize;
        let cells_per_side = by_size.min(by_population).max(1);
        #[allow(clippy::cast_precision_loss)]
        let cell_side = side_length / cells_per_side as f64;

        let mut domain = Domain {
            side_length,
            cell_side,
            cells_per_side,
            positions: Vec::new(),
            cells: vec![Vec::new(); cells_per_side * cells_per_side],
        };
        for (id, position) in positions.iter().enumerate() {
            let (column, row) = domain.cell_of(position);
            domain.cells[row * cells_per_side + column].push(id);
        }
        domain.positions = positions;
        Ok(domain)
    }

    /// Places patient zero at the origin and `n - 1` further individuals independently and
    /// uniformly at random in the square.
    ///
    /// # Errors
    /// Returns `SimulationError::InvalidParameter` if `n < 1` or the side length or cell size is
    /// not positive.
    pub fn place_uniform<R: Rng>(
        n: usize,
        side_length: f64,
        cell_size: f64,
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        if n < 1 {
            return invalid("population must contain at least one individual");
        }
        if !(side_length.is_finite() && side_length > 0.0) {
            return invalid(format!("side length must be positive, got {side_length}"));
        }
        let half = side_length / 2.0;
        let positions = std::iter::once(Point::ORIGIN)
            .chain((1..n).map(|_| {
                Point::new(rng.random_range(-half..half), rng.random_range(-half..half))
            }))
            .collect();
        Domain::new(positions, side_length, cell_size)
    }

    fn cell_coordinate(&self, value: f64) -> usize {
        let offset = (value + self.side_length / 2.0) / self.cell_side;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = offset.max(0.0).floor() as usize;
        // A point on the far edge belongs to the last cell.
        index.min(self.cells_per_side - 1)
    }

    fn cell_of(&self, point: &Point) -> (usize, usize) {
        (self.cell_coordinate(point.x), self.cell_coordinate(point.y))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    #[must_use]
    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    /// Individuals per unit area.
    #[must_use]
    pub fn density(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.positions.len() as f64;
        n / (self.side_length * self.side_length)
    }

    #[must_use]
    pub fn position(&self, id: usize) -> Point {
        self.positions[id]
    }

    #[must_use]
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// Distance of `id` from the origin (patient zero's position).
    #[must_use]
    pub fn distance_from_origin(&self, id: usize) -> f64 {
        self.positions[id].norm()
    }

    /// Calls `f(id, distance)` for every individual within `radius` of `center`, including any
    /// individual at `center` itself. Only the cells that can intersect the disk are inspected:
    /// the 3×3 block around `center` when `radius` does not exceed the cell side.
    pub fn for_each_within(&self, center: Point, radius: f64, mut f: impl FnMut(usize, f64)) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rings = ((radius / self.cell_side).ceil() as usize).max(1);
        let (column, row) = self.cell_of(&center);
        let last = self.cells_per_side - 1;

        for r in row.saturating_sub(rings)..=row.saturating_add(rings).min(last) {
            for c in column.saturating_sub(rings)..=column.saturating_add(rings).min(last) {
                for &id in &self.cells[r * self.cells_per_side + c] {
                    let distance = self.positions[id].distance(&center);
                    if distance <= radius {
                        f(id, distance);
                    }
                }
            }
        }
    }

    /// The `(id, distance)` pairs within `radius` of `center` that satisfy `filter`, ascending
    /// by id.
    pub fn neighbours_within(
        &self,
        center: Point,
        radius: f64,
        mut filter: impl FnMut(usize) -> bool,
    ) -> Vec<(usize, f64)> {
        let mut found = Vec::new();
        self.for_each_within(center, radius, |id, distance| {
            if filter(id) {
                found.push((id, distance));
            }
        });
        found.sort_unstable_by_key(|&(id, _)| id);
        found
    }
}
