use neds::{Coordinate, FoodRange, Patch, RandomSource};

fn patch(food: i32, growth_rate: i32) -> Patch {
    Patch::with_stock(FoodRange::new(10, 100), Coordinate::new(0, 0), food, growth_rate)
}

#[test]
fn replant_caps_at_capacity() {
    let mut p = patch(95, 10);
    p.replant();
    assert_eq!(p.food(), 100);
    p.replant();
    assert_eq!(p.food(), 100);

    let mut p = patch(0, 7);
    p.replant();
    assert_eq!(p.food(), 7);
}

#[test]
fn pick_from_sufficient_stock() {
    let mut p = patch(10, 0);
    assert_eq!(p.pick(4), 4);
    assert_eq!(p.food(), 6);
    assert_eq!(p.pick(6), 6);
    assert_eq!(p.food(), 0);
}

#[test]
fn pick_from_empty_patch_yields_nothing() {
    let mut p = patch(0, 0);
    assert_eq!(p.pick(3), 0);
    assert_eq!(p.food(), 0);
}

#[test]
fn pick_from_partial_stock_overreports() {
    let mut p = patch(2, 0);
    assert_eq!(p.pick(5), 5);
    assert_eq!(p.food(), 0);
}

#[test]
fn percent_remaining() {
    let p = patch(25, 0);
    assert!((p.percent_remaining_food() - 25.0).abs() < 1e-12);
}

#[test]
fn random_init_respects_range() {
    let mut rng = RandomSource::from_seed(5);
    for _ in 0..200 {
        let p = Patch::new(FoodRange::new(20, 80), Coordinate::new(1, 1), &mut rng);
        assert!((20..80).contains(&p.food()));
        assert!((0..=8).contains(&p.growth_rate()));
    }
}

#[test]
fn degenerate_range_uses_min() {
    let mut rng = RandomSource::from_seed(5);
    let p = Patch::new(FoodRange::new(50, 50), Coordinate::new(0, 0), &mut rng);
    assert_eq!(p.food(), 50);
    assert!((0..=5).contains(&p.growth_rate()));
}
