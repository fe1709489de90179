//! Genome-driven agents.
//!
//! An agent's behavior is decoded from its 64-bit genome two bits at a time. The
//! program counter cycles through 19 slots; every time it wraps, the working register
//! is reloaded from the genome, so the low 38 bits form a repeating program.

use crate::direction::Direction;
use crate::grid::Coordinate;
use crate::patch::Patch;
use crate::rng::RandomSource;
use std::fmt;

/// Number of food units an agent can carry between meals.
pub const FOOD_SACK_CAPACITY: i32 = 3;
/// Terminal program counter slot.
pub const PROGRAM_LENGTH: u32 = 19;
/// Ticks of age after which the metabolic requirement grows by one unit.
pub const AGE_PER_EXTRA_FOOD: u32 = 80;
/// Number of genome bits taking part in splicing.
const SPLICE_BITS: u32 = 40;

/// Stable identity issued by the engine in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    fn symbol(self) -> char {
        match self {
            Sex::Male => 'm',
            Sex::Female => 'f',
        }
    }
}

/// Decoded two-bit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    TurnLeft,
    Move,
    Mate,
    Noop,
}

impl Opcode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Opcode::TurnLeft,
            1 => Opcode::Move,
            2 => Opcode::Mate,
            _ => Opcode::Noop,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Opcode::TurnLeft => 0,
            Opcode::Move => 1,
            Opcode::Mate => 2,
            Opcode::Noop => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: AgentId,
    genome: i64,
    program_counter: u32,
    working: i64,
    instruction: Opcode,
    sex: Sex,
    facing: Direction,
    age: u32,
    food_sack: i32,
    coord: Coordinate,
    alive: bool,
    render_hint: Option<(i32, i32)>,
}

impl Agent {
    /// Create an agent with a random genome, sex and facing at `coord`.
    pub fn new(id: AgentId, coord: Coordinate, rng: &mut RandomSource) -> Self {
        let genome = rng.next_long();
        Self::with_genome(id, genome, coord, rng)
    }

    /// Create an agent with the given genome and a random sex and facing.
    pub fn with_genome(
        id: AgentId,
        genome: i64,
        coord: Coordinate,
        rng: &mut RandomSource,
    ) -> Self {
        let sex = if rng.next_bool() { Sex::Male } else { Sex::Female };
        let facing = Direction::ALL[rng.next_int(8) as usize];
        Self::from_parts(id, genome, sex, facing, coord)
    }

    /// Create a newborn carrying `genome`.
    ///
    /// The working register starts from a fresh random draw, so the first program
    /// cycle runs on it and `genome` is only loaded when the counter first wraps.
    fn offspring(id: AgentId, genome: i64, coord: Coordinate, rng: &mut RandomSource) -> Self {
        let mut child = Agent::new(id, coord, rng);
        child.genome = genome;
        child
    }

    /// Create an agent with every inherited trait given explicitly.
    pub fn from_parts(
        id: AgentId,
        genome: i64,
        sex: Sex,
        facing: Direction,
        coord: Coordinate,
    ) -> Self {
        Self {
            id,
            genome,
            program_counter: 0,
            working: genome,
            instruction: Opcode::TurnLeft,
            sex,
            facing,
            age: 0,
            food_sack: 0,
            coord,
            alive: true,
            render_hint: None,
        }
    }

    /// Advance the program counter and decode the next instruction.
    ///
    /// The counter is 0 until the first decode and cycles through `1..=19` afterwards.
    pub fn next(&mut self) -> Opcode {
        if self.program_counter == PROGRAM_LENGTH {
            self.program_counter = 1;
            self.working = self.genome;
        } else {
            self.program_counter += 1;
        }
        self.instruction = Opcode::from_bits((self.working & 3) as u8);
        self.working >>= 2;
        self.instruction
    }

    pub fn turn_left(&mut self) {
        self.facing = self.facing.turned_left();
    }

    pub fn turn_right(&mut self) {
        self.facing = self.facing.turned_right();
    }

    /// Food units needed this tick, growing with age.
    pub fn required_food(&self) -> i32 {
        (self.age / AGE_PER_EXTRA_FOOD) as i32 + 1
    }

    /// Pay this tick's metabolic cost from the food sack, refilling it from `patch`.
    ///
    /// Returns `false` when the agent cannot be fed, which is fatal to it.
    pub fn eat_from(&mut self, patch: &mut Patch) -> bool {
        let required = self.required_food();

        if self.food_sack >= required {
            self.food_sack -= required;
            return true;
        }

        let needed = required - self.food_sack;
        if needed + self.food_sack > FOOD_SACK_CAPACITY || patch.food() < needed {
            return false;
        }

        self.food_sack += patch.pick(needed);
        self.food_sack -= required;

        if patch.food() >= FOOD_SACK_CAPACITY {
            let top_up = FOOD_SACK_CAPACITY - self.food_sack;
            if top_up > 0 {
                self.food_sack += patch.pick(top_up);
            }
        }
        true
    }

    /// Consume `n` units from the food sack if it holds that many.
    pub fn eat(&mut self, n: i32) -> bool {
        if self.food_sack >= n {
            self.food_sack -= n;
            return true;
        }
        false
    }

    /// Mate with `partner` on `patch`, returning the offspring on success.
    ///
    /// The offspring genome takes both splice halves from the partner's genome. Both
    /// participants then pay a feeding cost; whoever cannot pay dies.
    pub fn mate(
        &mut self,
        patch: &mut Patch,
        partner: &mut Agent,
        offspring_id: AgentId,
        rng: &mut RandomSource,
    ) -> Option<Agent> {
        if !(self.alive && partner.alive && self.sex != partner.sex && self.old_enough(partner)) {
            return None;
        }

        let splice_point = rng.next_int(SPLICE_BITS as i32 - 1) as u32 + 1;
        let (low_mask, high_mask) = splice_masks(splice_point);
        let partner_genome = partner.genome;
        let genome = (partner_genome & low_mask) + (partner_genome & high_mask);

        let offspring = Agent::offspring(offspring_id, genome, self.coord, rng);

        if !self.eat_from(patch) {
            self.kill();
        }
        if !partner.eat_from(patch) {
            partner.kill();
        }

        Some(offspring)
    }

    // Age gate is disabled; the intended rule was `self.age > 5 && partner.age > 5`.
    fn old_enough(&self, _partner: &Agent) -> bool {
        true
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn is_at(&self, coord: Coordinate) -> bool {
        self.coord == coord
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn genome(&self) -> i64 {
        self.genome
    }

    pub fn program_counter(&self) -> u32 {
        self.program_counter
    }

    pub fn instruction(&self) -> Opcode {
        self.instruction
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn is_male(&self) -> bool {
        self.sex == Sex::Male
    }

    pub fn is_female(&self) -> bool {
        self.sex == Sex::Female
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn food_sack(&self) -> i32 {
        self.food_sack
    }

    pub fn coord(&self) -> Coordinate {
        self.coord
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Screen position cached by a renderer, if any.
    pub fn render_hint(&self) -> Option<(i32, i32)> {
        self.render_hint
    }

    pub fn set_render_hint(&mut self, hint: Option<(i32, i32)>) {
        self.render_hint = hint;
    }

    pub fn set_coord(&mut self, coord: Coordinate) {
        self.coord = coord;
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    /// # Panics
    /// Panics if `food_sack` is outside `0..=FOOD_SACK_CAPACITY`.
    pub fn set_food_sack(&mut self, food_sack: i32) {
        assert!(
            (0..=FOOD_SACK_CAPACITY).contains(&food_sack),
            "food sack must hold 0 to {FOOD_SACK_CAPACITY} units, but got {food_sack}"
        );
        self.food_sack = food_sack;
    }
}

/// Masks covering bits `[0, splice_point)` and `[splice_point, 40)`.
fn splice_masks(splice_point: u32) -> (i64, i64) {
    let low = (1i64 << splice_point) - 1;
    let all = (1i64 << SPLICE_BITS) - 1;
    (low, all & !low)
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ned {}: {}  sex: {}  coord: {}  facing: {}  age: {}  alive: {}  last instr: {}",
            self.id,
            self.genome,
            self.sex.symbol(),
            self.coord,
            self.facing,
            self.age,
            self.alive,
            self.instruction.bits()
        )
    }
}
