use crate::grid::Dimensions;
use crate::patch::FoodRange;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

/// Grid and population parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
    /// Initial number of agents.
    pub population: usize,
    /// Lower bound of the initial food stock of a patch.
    pub food_min: i32,
    /// Patch food capacity.
    pub food_max: i32,
}

/// Loop driver parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Delay between ticks in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
    /// Fixed random seed; a fresh seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<i64>,
    /// Stop the continuous loop after this many ticks.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

/// Trajectory output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of ticks between trajectory records.
    pub ticks_per_record: u64,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.world.width, self.world.height)
    }

    pub fn food_range(&self) -> FoodRange {
        FoodRange::new(self.world.food_min, self.world.food_max)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.world.width, 1..10_000).context("invalid grid width")?;
        check_num(self.world.height, 1..10_000).context("invalid grid height")?;
        check_num(self.world.population, 0..1_000_000).context("invalid initial population")?;
        check_num(self.world.food_max, 1..1_000_000).context("invalid maximum food")?;
        check_num(self.world.food_min, 0..=self.world.food_max).context("invalid minimum food")?;

        check_num(self.run.delay_ms, 0..=60_000).context("invalid tick delay")?;
        if let Some(max_ticks) = self.run.max_ticks {
            check_num(max_ticks, 1..).context("invalid maximum number of ticks")?;
        }

        check_num(self.output.ticks_per_record, 1..1_000_000)
            .context("invalid number of ticks per record")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
