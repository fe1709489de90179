//! Trajectory records written while a simulation runs.

use crate::engine::{Simulation, Stats};
use crate::events::{Listener, SimEvent};
use anyhow::{Context, Error, Result};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, Weak},
};

/// Engine counters at a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Number of ticks performed.
    pub tick: u64,
    /// Live agents.
    pub population: usize,
    /// Total births so far.
    pub births: u64,
    /// Total deaths so far.
    pub deaths: u64,
    /// Age of the oldest agent observed so far.
    pub oldest_age: Option<u32>,
}

impl From<Stats> for Record {
    fn from(stats: Stats) -> Self {
        Self {
            tick: stats.tick,
            population: stats.population,
            births: stats.births,
            deaths: stats.deaths,
            oldest_age: stats.oldest_age,
        }
    }
}

/// MessagePack stream of [`Record`] values.
pub struct TrajectoryWriter {
    writer: BufWriter<File>,
}

impl TrajectoryWriter {
    pub fn create<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, record: &Record) -> Result<()> {
        encode::write(&mut self.writer, record).context("failed to serialize record")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush writer stream")
    }
}

/// Read every record of a trajectory file.
pub fn read_records<P: AsRef<Path>>(file: P) -> Result<Vec<Record>> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);

    let mut records = Vec::new();
    while !reader.fill_buf().context("failed to read trajectory")?.is_empty() {
        let record = decode::from_read(&mut reader).context("failed to deserialize record")?;
        records.push(record);
    }
    Ok(records)
}

/// Listener that samples the engine counters into a trajectory file.
///
/// A record is written at start-up, on every tick that is a multiple of the sampling
/// period, and once more when the loop stops. A write failure cancels the run and is
/// reported through [`RecorderStatus`].
pub struct Recorder {
    sim: Weak<Simulation>,
    writer: Option<TrajectoryWriter>,
    ticks_per_record: u64,
    last_tick: Option<u64>,
    error: Arc<Mutex<Option<Error>>>,
}

/// Outcome of a [`Recorder`] after the run is over.
pub struct RecorderStatus {
    error: Arc<Mutex<Option<Error>>>,
}

impl Recorder {
    pub fn new(sim: &Arc<Simulation>, writer: TrajectoryWriter, ticks_per_record: u64) -> Self {
        Self {
            sim: Arc::downgrade(sim),
            writer: Some(writer),
            ticks_per_record: ticks_per_record.max(1),
            last_tick: None,
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn status(&self) -> RecorderStatus {
        RecorderStatus {
            error: Arc::clone(&self.error),
        }
    }

    fn try_handle(&mut self, event: SimEvent) -> Result<()> {
        let (Some(sim), Some(writer)) = (self.sim.upgrade(), self.writer.as_mut()) else {
            return Ok(());
        };
        let stats = sim.stats();

        let due = match event {
            SimEvent::Running | SimEvent::Step => stats.tick % self.ticks_per_record == 0,
            SimEvent::Stopped => true,
        };
        if due && self.last_tick != Some(stats.tick) {
            writer.write(&Record::from(stats))?;
            self.last_tick = Some(stats.tick);
        }

        if event == SimEvent::Stopped {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Listener for Recorder {
    fn handle(&mut self, event: SimEvent) {
        if let Err(error) = self.try_handle(event) {
            log::error!("{error:#?}");
            self.writer = None;
            if let Ok(mut slot) = self.error.lock() {
                slot.get_or_insert(error);
            }
            if let Some(sim) = self.sim.upgrade() {
                sim.cancel();
            }
        }
    }
}

impl RecorderStatus {
    /// Returns the first write error, if any.
    pub fn check(self) -> Result<()> {
        let mut slot = self
            .error
            .lock()
            .map_err(|_| anyhow::anyhow!("recorder status lock poisoned"))?;
        match slot.take() {
            Some(error) => Err(error.context("failed to record trajectory")),
            None => Ok(()),
        }
    }
}
