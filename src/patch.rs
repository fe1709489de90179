//! Per-cell food pools.

use crate::grid::Coordinate;
use crate::rng::RandomSource;
use std::fmt;

/// Inclusive range of patch food capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoodRange {
    pub min: i32,
    pub max: i32,
}

impl FoodRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for FoodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range[{},{}]", self.min, self.max)
    }
}

/// Food resource of a single grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    location: Coordinate,
    food: i32,
    growth_rate: i32,
    food_range: FoodRange,
}

impl Patch {
    /// Create a patch with a random initial stock in `[min, max)` and a growth rate of
    /// 1 to 10 percent of `max`.
    pub fn new(food_range: FoodRange, location: Coordinate, rng: &mut RandomSource) -> Self {
        let FoodRange { min, max } = food_range;
        let food = if max > min {
            rng.next_int(max - min) + min
        } else {
            min
        };
        let growth_rate = (max as f64 * ((rng.next_int(10) + 1) as f64 / 100.0)) as i32;
        Self::with_stock(food_range, location, food, growth_rate)
    }

    /// Create a patch with an explicit stock and growth rate.
    pub fn with_stock(
        food_range: FoodRange,
        location: Coordinate,
        food: i32,
        growth_rate: i32,
    ) -> Self {
        Self {
            location,
            food,
            growth_rate,
            food_range,
        }
    }

    /// Grow by one tick's worth of food, capped at capacity.
    pub fn replant(&mut self) {
        self.food = (self.food + self.growth_rate).min(self.max_food());
    }

    /// Withdraw `n` units.
    ///
    /// An empty patch yields nothing. Otherwise `n` is always reported as picked, even
    /// when less than `n` was left and the stock is merely emptied.
    pub fn pick(&mut self, n: i32) -> i32 {
        if self.food <= 0 {
            return 0;
        }
        self.food = if self.food >= n { self.food - n } else { 0 };
        n
    }

    pub fn percent_remaining_food(&self) -> f64 {
        let percent = self.food as f64 / self.max_food() as f64 * 100.0;
        log::trace!("{self}");
        percent
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn food(&self) -> i32 {
        self.food
    }

    pub fn growth_rate(&self) -> i32 {
        self.growth_rate
    }

    pub fn max_food(&self) -> i32 {
        self.food_range.max
    }

    pub fn min_food(&self) -> i32 {
        self.food_range.min
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patch[location: {}, food: {}, growth rate: {}, food range: {}]",
            self.location, self.food, self.growth_rate, self.food_range
        )
    }
}
