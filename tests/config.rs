use neds::{Config, Dimensions, FoodRange};

const VALID: &str = r#"
[world]
width = 40
height = 30
population = 200
food_min = 20
food_max = 100

[run]
delay_ms = 5
seed = -12345
max_ticks = 1000

[output]
ticks_per_record = 10
"#;

#[test]
fn parses_valid_config() {
    let cfg = Config::from_toml(VALID).expect("valid config");
    assert_eq!(cfg.dimensions(), Dimensions::new(40, 30));
    assert_eq!(cfg.food_range(), FoodRange::new(20, 100));
    assert_eq!(cfg.world.population, 200);
    assert_eq!(cfg.run.seed, Some(-12345));
    assert_eq!(cfg.run.max_ticks, Some(1000));
    assert_eq!(cfg.output.ticks_per_record, 10);
}

#[test]
fn run_section_fields_are_optional() {
    let contents = VALID
        .replace("delay_ms = 5\n", "")
        .replace("seed = -12345\n", "")
        .replace("max_ticks = 1000\n", "");
    let cfg = Config::from_toml(&contents).expect("valid config");
    assert_eq!(cfg.run.delay_ms, 0);
    assert_eq!(cfg.run.seed, None);
    assert_eq!(cfg.run.max_ticks, None);
}

#[test]
fn rejects_inverted_food_range() {
    let contents = VALID.replace("food_min = 20", "food_min = 200");
    let err = Config::from_toml(&contents).unwrap_err();
    assert!(format!("{err:#}").contains("invalid minimum food"));
}

#[test]
fn rejects_empty_grid() {
    let contents = VALID.replace("width = 40", "width = 0");
    assert!(Config::from_toml(&contents).is_err());
}

#[test]
fn rejects_missing_section() {
    let contents = VALID.replace("[output]\nticks_per_record = 10\n", "");
    assert!(Config::from_toml(&contents).is_err());
}
