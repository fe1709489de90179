//! Integer grid addressing.

use crate::rng::RandomSource;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Uniformly sampled coordinate inside `dim`.
    pub fn random(dim: Dimensions, rng: &mut RandomSource) -> Self {
        Self::random_from(Coordinate::new(0, 0), dim, rng)
    }

    /// Uniformly sampled coordinate inside the `dim`-sized box whose upper-left corner is
    /// `upper_left`.
    pub fn random_from(upper_left: Coordinate, dim: Dimensions, rng: &mut RandomSource) -> Self {
        let x = rng.next_int(dim.width);
        let y = rng.next_int(dim.height);
        Self::new(upper_left.x + x, upper_left.y + y)
    }

    /// Coordinate one cell away along `(dx, dy)`, unresolved.
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// How an out-of-range coordinate is brought back onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Step off one edge and reappear on the opposite edge.
    Wrap,
    /// Saturate to the nearest edge cell.
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: i32,
    pub height: i32,
}

impl Dimensions {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        (0..self.width).contains(&coord.x) && (0..self.height).contains(&coord.y)
    }

    /// Row-major index of an in-range coordinate.
    pub fn index(&self, coord: Coordinate) -> usize {
        debug_assert!(self.contains(coord), "{coord} outside {self}");
        coord.y as usize * self.width as usize + coord.x as usize
    }

    /// Every coordinate of the grid in row-major order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Coordinate::new(x, y)))
    }

    pub fn resolve(&self, coord: Coordinate, policy: BoundaryPolicy) -> Coordinate {
        let x = resolve_axis(coord.x, self.width, policy);
        let y = resolve_axis(coord.y, self.height, policy);
        Coordinate::new(x, y)
    }
}

fn resolve_axis(val: i32, len: i32, policy: BoundaryPolicy) -> i32 {
    let last = len - 1;
    match policy {
        BoundaryPolicy::Wrap if val < 0 => last,
        BoundaryPolicy::Wrap if val > last => 0,
        BoundaryPolicy::Clamp => val.clamp(0, last),
        BoundaryPolicy::Wrap => val,
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimensions[{}, {}]", self.width, self.height)
    }
}
