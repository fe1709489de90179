use neds::{
    Agent, AgentId, Coordinate, Direction, FoodRange, Opcode, Patch, RandomSource, Sex,
    agent::{AGE_PER_EXTRA_FOOD, FOOD_SACK_CAPACITY, PROGRAM_LENGTH},
};

const SPLICED: i64 = (1 << 40) - 1;

fn agent(genome: i64, sex: Sex) -> Agent {
    Agent::from_parts(AgentId(0), genome, sex, Direction::North, Coordinate::new(0, 0))
}

fn patch(food: i32) -> Patch {
    Patch::with_stock(FoodRange::new(0, 100), Coordinate::new(0, 0), food, 0)
}

/// Genome whose first 19 opcodes are `ops`, padded with no-ops.
fn program(ops: &[u8]) -> i64 {
    let mut genome = 0i64;
    for slot in (0..PROGRAM_LENGTH as usize).rev() {
        let bits = ops.get(slot).copied().unwrap_or(3) as i64;
        genome = (genome << 2) | bits;
    }
    genome
}

/// Opcodes a full program cycle decodes from `register`.
fn decode(register: i64) -> Vec<Opcode> {
    (0..PROGRAM_LENGTH)
        .map(|slot| Opcode::from_bits(((register >> (2 * slot)) & 3) as u8))
        .collect()
}

#[test]
fn program_counter_cycles_through_nineteen_slots() {
    let mut a = agent(program(&[0, 1, 2]), Sex::Male);
    assert_eq!(a.program_counter(), 0);
    let mut seen = Vec::new();
    for _ in 0..(2 * PROGRAM_LENGTH + 1) {
        let op = a.next();
        seen.push(op);
        assert!((1..=PROGRAM_LENGTH).contains(&a.program_counter()));
    }
    assert_eq!(a.program_counter(), 1);
    assert_eq!(&seen[..3], &[Opcode::TurnLeft, Opcode::Move, Opcode::Mate]);
    assert_eq!(seen[3], Opcode::Noop);
    assert_eq!(seen[19..22], seen[..3]);
    assert_eq!(seen[38], seen[0]);
}

#[test]
fn counter_visits_one_after_nineteen() {
    let mut a = agent(-1, Sex::Female);
    let mut prev = a.program_counter();
    for _ in 0..100 {
        a.next();
        let pc = a.program_counter();
        if prev == PROGRAM_LENGTH {
            assert_eq!(pc, 1);
        } else {
            assert_eq!(pc, prev + 1);
        }
        prev = pc;
    }
}

#[test]
fn turning_changes_facing() {
    let mut a = agent(0, Sex::Male);
    a.turn_left();
    assert_eq!(a.facing(), Direction::NorthWest);
    a.turn_right();
    a.turn_right();
    assert_eq!(a.facing(), Direction::NorthEast);
}

#[test]
fn eats_from_sack_first() {
    let mut a = agent(0, Sex::Male);
    a.set_food_sack(2);
    let mut p = patch(10);
    assert!(a.eat_from(&mut p));
    assert_eq!(a.food_sack(), 1);
    assert_eq!(p.food(), 10);
}

#[test]
fn refills_sack_from_rich_patch() {
    let mut a = agent(0, Sex::Male);
    let mut p = patch(10);
    assert!(a.eat_from(&mut p));
    assert_eq!(a.food_sack(), FOOD_SACK_CAPACITY);
    assert_eq!(p.food(), 10 - 1 - FOOD_SACK_CAPACITY);
}

#[test]
fn poor_patch_feeds_without_refill() {
    let mut a = agent(0, Sex::Male);
    let mut p = patch(2);
    assert!(a.eat_from(&mut p));
    assert_eq!(a.food_sack(), 0);
    assert_eq!(p.food(), 1);
}

#[test]
fn starves_on_empty_patch() {
    let mut a = agent(0, Sex::Female);
    let mut p = patch(0);
    assert!(!a.eat_from(&mut p));
}

#[test]
fn requirement_grows_with_age() {
    let mut a = agent(0, Sex::Female);
    a.set_age(79);
    assert_eq!(a.required_food(), 1);
    a.set_age(80);
    assert_eq!(a.required_food(), 2);
    a.set_age(240);
    assert_eq!(a.required_food(), 4);
}

#[test]
fn requirement_above_capacity_never_feeds() {
    let mut a = agent(0, Sex::Male);
    a.set_age(3 * AGE_PER_EXTRA_FOOD);
    a.set_food_sack(FOOD_SACK_CAPACITY);
    let mut p = patch(100);
    assert!(!a.eat_from(&mut p));
    assert_eq!(p.food(), 100);
}

#[test]
#[should_panic(expected = "food sack must hold")]
fn overfilled_sack_is_rejected() {
    let mut a = agent(0, Sex::Male);
    a.set_food_sack(FOOD_SACK_CAPACITY + 1);
}

#[test]
#[should_panic(expected = "food sack must hold")]
fn negative_sack_is_rejected() {
    let mut a = agent(0, Sex::Female);
    a.set_food_sack(-1);
}

#[test]
fn eat_consumes_only_available_food() {
    let mut a = agent(0, Sex::Male);
    a.set_food_sack(2);
    assert!(!a.eat(3));
    assert!(a.eat(2));
    assert_eq!(a.food_sack(), 0);
}

#[test]
fn offspring_copies_partner_genome_bits() {
    let mut rng = RandomSource::from_seed(9);
    let mut male = agent(0x0F0F_0F0F_0F0F, Sex::Male);
    let mut female = agent(0x12_3456_789A, Sex::Female);
    male.set_coord(Coordinate::new(2, 3));
    let mut p = patch(100);
    let child = male
        .mate(&mut p, &mut female, AgentId(7), &mut rng)
        .expect("opposite sexes must mate");
    assert_eq!(child.genome(), 0x12_3456_789A & SPLICED);
    assert_eq!(child.age(), 0);
    assert_eq!(child.coord(), Coordinate::new(2, 3));
    assert_eq!(child.id(), AgentId(7));
    assert!(male.is_alive() && female.is_alive());
}

#[test]
fn offspring_keeps_only_forty_genome_bits() {
    for seed in 0..50 {
        let mut rng = RandomSource::from_seed(seed);
        let mut male = agent(0, Sex::Male);
        let mut female = agent(-1, Sex::Female);
        let child = male
            .mate(&mut patch(100), &mut female, AgentId(2), &mut rng)
            .expect("opposite sexes must mate");
        assert_eq!(child.genome(), SPLICED);
    }
}

#[test]
fn newborn_runs_a_random_register_before_its_genome() {
    let seed = 31;
    let mut rng = RandomSource::from_seed(seed);
    let mut male = agent(program(&[0; 19]), Sex::Male);
    let mut female = agent(program(&[1; 19]), Sex::Female);
    let mut child = male
        .mate(&mut patch(100), &mut female, AgentId(2), &mut rng)
        .expect("opposite sexes must mate");

    // Splice point first, then the newborn's working register.
    let mut replay = RandomSource::from_seed(seed);
    replay.next_int(39);
    let register = replay.next_long();
    assert_ne!(register, child.genome());

    assert_eq!(child.program_counter(), 0);
    let first_cycle: Vec<_> = (0..PROGRAM_LENGTH).map(|_| child.next()).collect();
    assert_eq!(first_cycle, decode(register));
    assert_eq!(child.program_counter(), PROGRAM_LENGTH);

    assert_eq!(child.next(), Opcode::from_bits((child.genome() & 3) as u8));
    assert_eq!(child.program_counter(), 1);
    let second_cycle: Vec<_> = (1..PROGRAM_LENGTH).map(|_| child.next()).collect();
    assert!(second_cycle.iter().all(|&op| op == Opcode::Move));
}

#[test]
fn same_sex_cannot_mate() {
    let mut rng = RandomSource::from_seed(9);
    let mut a = agent(1, Sex::Female);
    let mut b = agent(2, Sex::Female);
    assert!(a.mate(&mut patch(100), &mut b, AgentId(3), &mut rng).is_none());
}

#[test]
fn dead_agents_cannot_mate() {
    let mut rng = RandomSource::from_seed(9);
    let mut a = agent(1, Sex::Male);
    let mut b = agent(2, Sex::Female);
    b.kill();
    b.kill();
    assert!(!b.is_alive());
    assert!(a.mate(&mut patch(100), &mut b, AgentId(3), &mut rng).is_none());
}

#[test]
fn mating_on_empty_patch_kills_parents() {
    let mut rng = RandomSource::from_seed(9);
    let mut a = agent(1, Sex::Male);
    let mut b = agent(2, Sex::Female);
    let child = a.mate(&mut patch(0), &mut b, AgentId(3), &mut rng);
    assert!(child.is_some());
    assert!(!a.is_alive() && !b.is_alive());
}
