//! JSON readout input and subevent report output.

use crate::Result;
use hivesplit_algorithms::BatchOutcome;
use hivesplit_core::{Pulse, PulseMap, SensorKey, SplitStatistics};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Intermediate structs for the JSON readout schema
#[derive(Deserialize)]
struct JsonReadout {
    pulses: Vec<JsonPulse>,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
struct JsonPulse {
    string: i32,
    module: u32,
    time: f64,
    charge: f64,
    #[serde(default)]
    width: f64,
}

#[derive(Serialize)]
struct Report {
    statistics: SplitStatistics,
    readouts: Vec<ReadoutReport>,
}

#[derive(Serialize)]
struct ReadoutReport {
    index: usize,
    statistics: SplitStatistics,
    subevents: Vec<SubEventReport>,
}

#[derive(Serialize)]
struct SubEventReport {
    index: usize,
    start_time: f64,
    stop_time: f64,
    pulses: Vec<JsonPulse>,
}

fn to_pulse_map(readout: JsonReadout) -> PulseMap {
    let mut pulses = PulseMap::new();
    for p in readout.pulses {
        pulses
            .entry(SensorKey::new(p.string, p.module))
            .or_insert_with(Vec::new)
            .push(Pulse::new(p.time, p.charge).with_width(p.width));
    }
    for series in pulses.values_mut() {
        series.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
    pulses
}

fn flatten(pulses: &PulseMap) -> Vec<JsonPulse> {
    pulses
        .iter()
        .flat_map(|(key, series)| {
            series.iter().map(move |p| JsonPulse {
                string: key.string,
                module: key.module,
                time: p.time,
                charge: p.charge,
                width: p.width,
            })
        })
        .collect()
}

/// Parses readouts from a JSON string; pulses are sorted by time per sensor.
pub fn readouts_from_json(json: &str) -> Result<Vec<PulseMap>> {
    let readouts: Vec<JsonReadout> = serde_json::from_str(json)?;
    Ok(readouts.into_iter().map(to_pulse_map).collect())
}

/// Loads readouts from a JSON file.
pub fn load_readouts<P: AsRef<Path>>(path: P) -> Result<Vec<PulseMap>> {
    let json = std::fs::read_to_string(path)?;
    readouts_from_json(&json)
}

/// Writes the subevents of a batch as a JSON report.
pub fn write_report<P: AsRef<Path>>(path: P, outcome: &BatchOutcome) -> Result<()> {
    let report = Report {
        statistics: outcome.statistics,
        readouts: outcome
            .readouts
            .iter()
            .enumerate()
            .map(|(index, readout)| ReadoutReport {
                index,
                statistics: readout.statistics,
                subevents: readout
                    .subevents
                    .iter()
                    .map(|subevent| SubEventReport {
                        index: subevent.index,
                        start_time: subevent.start_time,
                        stop_time: subevent.stop_time,
                        pulses: flatten(&subevent.pulses),
                    })
                    .collect(),
            })
            .collect(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;
    Ok(())
}
