use crate::agent::{Agent, AgentId, Opcode};
use crate::events::{EventBus, Listener, SimEvent};
use crate::grid::{BoundaryPolicy, Coordinate, Dimensions};
use crate::patch::{FoodRange, Patch};
use crate::rng::RandomSource;
use anyhow::{Result, bail};
use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::{
        Mutex, MutexGuard,
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    time::Duration,
};

/// How [`Simulation::reset`] reseeds the random source before rebuilding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reseed {
    /// Replay the current seed.
    Same,
    /// Draw a fresh seed.
    Fresh,
}

/// Consistent snapshot of the engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub tick: u64,
    pub population: usize,
    pub births: u64,
    pub deaths: u64,
    pub oldest_age: Option<u32>,
}

/// Simulation engine.
///
/// Owns the patch grid, the population index and the counters behind one lock. A tick
/// holds the lock for its whole duration and every query takes the same lock, so
/// readers never observe a half-applied tick. The lock is released during the
/// inter-tick delay, which is also where [`Simulation::cancel`] is observed.
pub struct Simulation {
    world: Mutex<World>,
    events: Mutex<EventBus>,
    stop_tx: Sender<()>,
    stop_rx: Mutex<Receiver<()>>,
}

impl Simulation {
    /// Create a simulation of `population` randomly placed agents.
    ///
    /// # Errors
    /// Returns an error if the dimensions or the food range are invalid.
    pub fn new(
        dim: Dimensions,
        population: usize,
        food_range: FoodRange,
        delay_ms: u64,
        rng: RandomSource,
    ) -> Result<Self> {
        validate(dim, food_range)?;

        let world = World::populated(dim, population, food_range, delay_ms, rng);
        log::info!(
            "created {dim} with {population} agents, food {food_range}, seed {}",
            world.rng.current_seed()
        );

        let (stop_tx, stop_rx) = mpsc::channel();
        Ok(Self {
            world: Mutex::new(world),
            events: Mutex::new(EventBus::new()),
            stop_tx,
            stop_rx: Mutex::new(stop_rx),
        })
    }

    /// Tick continuously until the population dies out or the run is cancelled.
    ///
    /// Blocks the calling thread; meant to be run on a dedicated thread.
    pub fn run(&self) {
        let stop_rx = lock(&self.stop_rx);
        while stop_rx.try_recv().is_ok() {}
        self.fire(SimEvent::Running);
        log::info!("running, seed {}", self.seed());

        while self.population() > 0 {
            self.step();
            self.fire(SimEvent::Step);

            let delay = Duration::from_millis(self.delay());
            match stop_rx.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    log::info!("run cancelled");
                    break;
                }
            }
        }

        while stop_rx.try_recv().is_ok() {}
        let stats = self.stats();
        log::info!(
            "stopped at tick {}: population {}, births {}, deaths {}",
            stats.tick,
            stats.population,
            stats.births,
            stats.deaths
        );
        self.fire(SimEvent::Stopped);
    }

    /// Perform exactly one tick.
    pub fn step(&self) {
        let mut world = self.world();
        world.step();
        log::debug!(
            "tick {}: population {}, births {}, deaths {}",
            world.tick,
            world.population,
            world.births,
            world.deaths
        );
    }

    /// Ask a running loop to stop after the current tick.
    ///
    /// Has no effect on a loop started later.
    pub fn cancel(&self) {
        // The receiver lives as long as `self`.
        let _ = self.stop_tx.send(());
    }

    /// Register a listener; listeners are notified in registration order.
    pub fn add_listener<L: Listener + 'static>(&self, listener: L) {
        lock(&self.events).add(listener);
    }

    /// Discard all state and rebuild the world from the construction parameters.
    pub fn reset(&self, reseed: Reseed) {
        let mut world = self.world();
        let seed = match reseed {
            Reseed::Same => Some(world.rng.current_seed()),
            Reseed::Fresh => None,
        };
        world.rebuild(seed);
        log::info!("reset with seed {}", world.rng.current_seed());
    }

    pub fn population(&self) -> usize {
        self.world().population
    }

    pub fn births(&self) -> u64 {
        self.world().births
    }

    pub fn deaths(&self) -> u64 {
        self.world().deaths
    }

    /// Number of ticks performed since construction or the last reset.
    pub fn tick(&self) -> u64 {
        self.world().tick
    }

    pub fn stats(&self) -> Stats {
        let world = self.world();
        Stats {
            tick: world.tick,
            population: world.population,
            births: world.births,
            deaths: world.deaths,
            oldest_age: world.oldest().map(Agent::age),
        }
    }

    /// Oldest agent observed so far.
    ///
    /// The record is only replaced by a strictly older live agent, so it may describe
    /// an agent that has since died.
    pub fn oldest_agent(&self) -> Option<Agent> {
        self.world().oldest().cloned()
    }

    pub fn dimension(&self) -> Dimensions {
        self.world().dim
    }

    /// Snapshot of every patch in row-major order.
    pub fn patches(&self) -> Vec<Patch> {
        self.world().patches.clone()
    }

    pub fn patch_at(&self, coord: Coordinate) -> Option<Patch> {
        let world = self.world();
        world
            .dim
            .contains(coord)
            .then(|| world.patches[world.dim.index(coord)].clone())
    }

    /// Snapshot of the agents in one cell, ordered by id.
    pub fn agents_at(&self, coord: Coordinate) -> Vec<Agent> {
        let world = self.world();
        world.cell(coord).map(|id| world.agent(id).clone()).collect()
    }

    /// Snapshot of the whole population, cell by cell in row-major order.
    pub fn all_agents(&self) -> Vec<Agent> {
        let world = self.world();
        world
            .cells
            .iter()
            .flatten()
            .map(|&id| world.agent(id).clone())
            .collect()
    }

    pub fn count_at(&self, coord: Coordinate) -> usize {
        self.world().cell(coord).count()
    }

    pub fn male_count_at(&self, coord: Coordinate) -> usize {
        let world = self.world();
        world.cell(coord).filter(|&id| world.agent(id).is_male()).count()
    }

    pub fn female_count_at(&self, coord: Coordinate) -> usize {
        let world = self.world();
        world
            .cell(coord)
            .filter(|&id| world.agent(id).is_female())
            .count()
    }

    /// Cache a renderer position on an agent. Returns `false` if it is not indexed.
    pub fn set_render_hint(&self, id: AgentId, hint: Option<(i32, i32)>) -> bool {
        match self.world().agents.get_mut(&id) {
            Some(agent) => {
                agent.set_render_hint(hint);
                true
            }
            None => false,
        }
    }

    pub fn reset_render_hints(&self) {
        for agent in self.world().agents.values_mut() {
            agent.set_render_hint(None);
        }
    }

    pub fn delay(&self) -> u64 {
        self.world().delay_ms
    }

    pub fn set_delay(&self, delay_ms: u64) {
        self.world().delay_ms = delay_ms;
    }

    pub fn seed(&self) -> i64 {
        self.world().rng.current_seed()
    }

    /// Log every entry of the population index at debug level.
    pub fn dump_index(&self) {
        let world = self.world();
        log::debug!("---------- index ----------");
        for coord in world.dim.coordinates() {
            for id in world.cell(coord) {
                log::debug!("\tcoord: {coord}, {}", world.agent(id));
            }
        }
    }

    /// Check the population index against the counters.
    ///
    /// # Panics
    /// Panics if any agent is missing, duplicated or misplaced, or if a patch holds food
    /// outside its capacity.
    pub fn verify(&self) {
        self.world().verify();
    }

    fn fire(&self, event: SimEvent) {
        lock(&self.events).fire(event);
    }

    fn world(&self) -> MutexGuard<'_, World> {
        lock(&self.world)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .expect("simulation lock poisoned by a fatal invariant violation")
}

fn validate(dim: Dimensions, food_range: FoodRange) -> Result<()> {
    if dim.width < 1 || dim.height < 1 {
        bail!("dimensions must be at least 1x1, but are {dim}");
    }
    if food_range.min < 0 || food_range.max < 1 {
        bail!("food range must be non-negative with a positive maximum, but is {food_range}");
    }
    if food_range.min > food_range.max {
        bail!("food range minimum must not exceed its maximum, but is {food_range}");
    }
    Ok(())
}

/// Per-tick deferred mutations, cleared at the start of every tick.
#[derive(Default)]
struct Scratch {
    dead: Vec<AgentId>,
    moved: Vec<(AgentId, Coordinate)>,
    males: VecDeque<AgentId>,
    females: VecDeque<AgentId>,
}

impl Scratch {
    fn clear(&mut self) {
        self.dead.clear();
        self.moved.clear();
        self.males.clear();
        self.females.clear();
    }
}

/// State guarded by the engine lock.
struct World {
    rng: RandomSource,
    dim: Dimensions,
    food_range: FoodRange,
    initial_population: usize,
    delay_ms: u64,

    patches: Vec<Patch>,
    cells: Vec<BTreeSet<AgentId>>,
    agents: HashMap<AgentId, Agent>,
    next_id: u64,

    population: usize,
    births: u64,
    deaths: u64,
    tick: u64,

    oldest: Option<AgentId>,
    // Last state of the oldest agent once it has been removed from the index.
    oldest_remains: Option<Agent>,

    scratch: Scratch,
}

impl World {
    fn empty(dim: Dimensions, food_range: FoodRange, delay_ms: u64, rng: RandomSource) -> Self {
        let mut world = Self {
            rng,
            dim,
            food_range,
            initial_population: 0,
            delay_ms,
            patches: Vec::with_capacity(dim.cell_count()),
            cells: vec![BTreeSet::new(); dim.cell_count()],
            agents: HashMap::new(),
            next_id: 0,
            population: 0,
            births: 0,
            deaths: 0,
            tick: 0,
            oldest: None,
            oldest_remains: None,
            scratch: Scratch::default(),
        };
        for coord in dim.coordinates() {
            let patch = Patch::new(food_range, coord, &mut world.rng);
            world.patches.push(patch);
        }
        world
    }

    fn populated(
        dim: Dimensions,
        population: usize,
        food_range: FoodRange,
        delay_ms: u64,
        rng: RandomSource,
    ) -> Self {
        let mut world = Self::empty(dim, food_range, delay_ms, rng);
        world.initial_population = population;
        for _ in 0..population {
            let coord = Coordinate::random(dim, &mut world.rng);
            let id = world.issue_id();
            let agent = Agent::new(id, coord, &mut world.rng);
            world.add(agent);
        }
        world
    }

    fn rebuild(&mut self, seed: Option<i64>) {
        let mut rng = std::mem::replace(&mut self.rng, RandomSource::from_seed(0));
        rng.reseed(seed);
        *self = Self::populated(
            self.dim,
            self.initial_population,
            self.food_range,
            self.delay_ms,
            rng,
        );
    }

    fn issue_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    fn agent(&self, id: AgentId) -> &Agent {
        self.agents
            .get(&id)
            .unwrap_or_else(|| panic!("agent {id} is indexed but missing"))
    }

    fn cell(&self, coord: Coordinate) -> impl Iterator<Item = AgentId> + '_ {
        self.dim
            .contains(coord)
            .then(|| self.cells[self.dim.index(coord)].iter().copied())
            .into_iter()
            .flatten()
    }

    fn oldest(&self) -> Option<&Agent> {
        let id = self.oldest?;
        self.agents.get(&id).or(self.oldest_remains.as_ref())
    }

    /// Insert a live agent into the index at its own coordinate.
    fn add(&mut self, agent: Agent) {
        if !agent.is_alive() {
            return;
        }
        let id = agent.id();
        let coord = agent.coord();
        let cell = &mut self.cells[self.dim.index(coord)];
        assert!(cell.insert(id), "{agent} already at {coord}");
        assert!(
            self.agents.insert(id, agent).is_none(),
            "agent {id} indexed twice"
        );
        self.population += 1;
    }

    fn step(&mut self) {
        self.tick += 1;
        if self.population == 0 {
            return;
        }
        self.scratch.clear();

        self.decode_and_dispatch();

        let dead = std::mem::take(&mut self.scratch.dead);
        self.remove_dead(&dead);
        self.scratch.dead = dead;

        self.move_marked();
        self.mate_queued();
        self.replant();

        if cfg!(debug_assertions) {
            self.verify();
        }
    }

    fn decode_and_dispatch(&mut self) {
        let Self {
            dim,
            patches,
            cells,
            agents,
            oldest,
            oldest_remains,
            scratch,
            ..
        } = self;

        for &id in cells.iter().flatten() {
            let agent = agents
                .get(&id)
                .unwrap_or_else(|| panic!("agent {id} is indexed but missing"));
            if !agent.is_alive() {
                continue;
            }

            let oldest_age = oldest.and_then(|oldest_id| {
                agents
                    .get(&oldest_id)
                    .or(oldest_remains.as_ref())
                    .map(Agent::age)
            });
            if oldest_age.is_none_or(|age| agent.age() > age) {
                if *oldest != Some(id) {
                    *oldest_remains = None;
                }
                *oldest = Some(id);
            }

            let Some(agent) = agents.get_mut(&id) else {
                continue;
            };
            match agent.next() {
                Opcode::TurnLeft => agent.turn_left(),
                Opcode::Move => {
                    agent.set_render_hint(None);
                    scratch.moved.push((id, agent.coord()));
                }
                Opcode::Mate if agent.is_female() => scratch.females.push_back(id),
                Opcode::Mate => scratch.males.push_back(id),
                Opcode::Noop => {}
            }

            agent.set_age(agent.age() + 1);
            let patch = &mut patches[dim.index(agent.coord())];
            if !agent.eat_from(patch) {
                agent.kill();
                scratch.dead.push(id);
                log::trace!("starved: {agent}");
            }
        }
    }

    fn remove_dead(&mut self, dead: &[AgentId]) {
        for &id in dead {
            let agent = self
                .agents
                .remove(&id)
                .unwrap_or_else(|| panic!("can't delete unknown agent {id}"));
            let coord = agent.coord();
            let cell = &mut self.cells[self.dim.index(coord)];
            assert!(cell.remove(&id), "can't delete {agent} from patch {coord}");
            assert!(!cell.contains(&id), "{agent} not removed from patch {coord}");

            assert!(self.population > 0, "population underflow removing {agent}");
            self.population -= 1;
            self.deaths += 1;

            if self.oldest == Some(id) {
                self.oldest_remains = Some(agent);
            }
        }
    }

    fn move_marked(&mut self) {
        let moved = std::mem::take(&mut self.scratch.moved);
        for &(id, previous) in &moved {
            let Some(agent) = self.agents.get_mut(&id) else {
                continue;
            };
            if !agent.is_alive() {
                continue;
            }

            let target = previous.offset(agent.facing().offset());
            let target = self.dim.resolve(target, BoundaryPolicy::Clamp);
            if target == previous {
                continue;
            }

            let (from, to) = (self.dim.index(previous), self.dim.index(target));
            assert!(self.cells[from].contains(&id), "{agent} not at {previous}");
            assert!(!self.cells[to].contains(&id), "{agent} already at {target}");

            self.cells[from].remove(&id);
            agent.set_coord(target);
            self.cells[to].insert(id);

            assert!(self.cells[to].contains(&id), "{agent} not in new patch");
            assert!(!self.cells[from].contains(&id), "{agent} still in old patch");
            log::trace!("moved {id} from {previous} to {target}");
        }
        self.scratch.moved = moved;
    }

    fn mate_queued(&mut self) {
        if self.scratch.males.is_empty() || self.scratch.females.is_empty() {
            return;
        }

        let males = std::mem::take(&mut self.scratch.males);
        let mut females = std::mem::take(&mut self.scratch.females);
        let mut dead = Vec::new();

        for &male_id in &males {
            if !self.is_alive(male_id) {
                continue;
            }
            let Some(female_id) = self.next_live(&mut females) else {
                break;
            };

            let (offspring, male_alive, female_alive) = self.mate_pair(male_id, female_id);
            if let Some(offspring) = offspring {
                self.births += 1;
                log::trace!("born: {offspring}");
                self.add(offspring);
            }
            if !male_alive {
                dead.push(male_id);
            }
            if !female_alive {
                dead.push(female_id);
            }
        }

        self.scratch.males = males;
        self.scratch.females = females;
        self.remove_dead(&dead);
    }

    /// Dequeue females until a live one is found.
    fn next_live(&self, queue: &mut VecDeque<AgentId>) -> Option<AgentId> {
        while let Some(id) = queue.pop_front() {
            if self.is_alive(id) {
                return Some(id);
            }
        }
        None
    }

    fn is_alive(&self, id: AgentId) -> bool {
        self.agents.get(&id).is_some_and(Agent::is_alive)
    }

    fn mate_pair(&mut self, male_id: AgentId, female_id: AgentId) -> (Option<Agent>, bool, bool) {
        let offspring_id = AgentId(self.next_id);
        let Self {
            dim,
            patches,
            agents,
            rng,
            ..
        } = self;

        let mut female = agents
            .remove(&female_id)
            .unwrap_or_else(|| panic!("agent {female_id} is queued but missing"));
        let male = agents
            .get_mut(&male_id)
            .unwrap_or_else(|| panic!("agent {male_id} is queued but missing"));

        let patch = &mut patches[dim.index(male.coord())];
        let offspring = male.mate(patch, &mut female, offspring_id, rng);
        let male_alive = male.is_alive();
        let female_alive = female.is_alive();
        agents.insert(female_id, female);

        if offspring.is_some() {
            self.next_id += 1;
        }
        (offspring, male_alive, female_alive)
    }

    fn replant(&mut self) {
        for patch in &mut self.patches {
            patch.replant();
        }
    }

    fn verify(&self) {
        let mut indexed = 0;
        for (i_cell, cell) in self.cells.iter().enumerate() {
            for &id in cell {
                let agent = self.agent(id);
                assert_eq!(
                    self.dim.index(agent.coord()),
                    i_cell,
                    "{agent} indexed in the wrong cell"
                );
                assert!(agent.is_alive(), "dead agent left in the index: {agent}");
                indexed += 1;
            }
        }
        assert_eq!(indexed, self.agents.len(), "agent table and index disagree");
        assert_eq!(indexed, self.population, "population counter out of sync");

        for patch in &self.patches {
            assert!(
                (0..=patch.max_food()).contains(&patch.food()),
                "food out of range: {patch}"
            );
        }
    }
}
