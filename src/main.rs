use std::path::Path;

use anyhow::Context;
use clap::Parser;

use ground_cosim::{
    build_layers, ConductionColumn, ConductionParams, Coupling, CouplingParams, DepthRecord,
    SegmentGrid, SessionState, StepInputs, StepOutputs,
};

mod options;

/// Cumulative depth markers of the bundled demonstration column \[m\]. Layer
/// thicknesses grow from one metre near the surface to eight metres at the
/// bottom, reaching past the borefield domain.
const DEMO_DEPTH_MARKERS: [f64; 30] = [
    2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.5, 25.5, 28.5, 31.5,
    35.0, 39.0, 43.0, 47.0, 51.5, 56.5, 61.5, 66.5, 72.0, 78.0, 84.0, 90.5, 98.0,
];

fn demo_records() -> Vec<DepthRecord> {
    DEMO_DEPTH_MARKERS
        .iter()
        .enumerate()
        .map(|(i, &depth)| DepthRecord::new(format!("L{:02}", i + 1), depth))
        .collect()
}

fn read_records(path: &Path) -> anyhow::Result<Vec<DepthRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading layer depths from `{}`", path.display()))?;

    let mut records = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let depth: f64 = line
            .parse()
            .with_context(|| format!("bad depth marker on line {}", line_no + 1))?;
        records.push(DepthRecord::new(format!("L{:02}", records.len() + 1), depth));
    }
    Ok(records)
}

fn step_inputs(options: &options::Options, segments: usize, time: f64) -> StepInputs {
    StepInputs {
        heat_flux: vec![options.heat_flux; segments],
        start_temperature: vec![options.start_temperature; segments],
        ambient_temperature: options.ambient_temperature,
        time,
    }
}

fn report(time: f64, outputs: &StepOutputs) {
    let wall = &outputs.wall_temperature;
    let mean = wall.iter().sum::<f64>() / wall.len() as f64;
    let min = wall.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = wall.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    println!("t = {time:>9.0} s  wall T mean {mean:7.2} K  (min {min:7.2} / max {max:7.2})");
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = options::Options::parse();

    let records = match &options.layer_file {
        Some(path) => read_records(path)?,
        None => demo_records(),
    };
    let layers = build_layers(&records)?;
    log::info!(
        "ground mesh: {} layers down to {:.1} m",
        layers.len(),
        layers.last().map(|l| l.lower_bound).unwrap_or(0.0)
    );

    let grid = SegmentGrid::default();
    let solver = ConductionColumn::new(&layers, ConductionParams::default());
    let mut coupling = Coupling::new(layers, &grid, solver, CouplingParams::default())?;
    let segments = coupling.segment_count();

    let mut state = match &options.state_file {
        Some(path) if path.exists() => {
            let resumed = SessionState::resume(path)?;
            log::info!("resumed session from `{}`", path.display());
            resumed
        }
        _ => SessionState::Uninitialized,
    };

    let start = state.last_time().unwrap_or(0.0);
    if !state.is_ready() {
        let (outputs, next) = coupling.step(state, &step_inputs(&options, segments, start))?;
        report(start, &outputs);
        state = next;
    }

    for k in 1..=options.steps {
        let time = start + k as f64 * options.step_size;
        let (outputs, next) = coupling.step(state, &step_inputs(&options, segments, time))?;
        report(time, &outputs);
        state = next;
    }

    if let Some(path) = &options.state_file {
        state.store(path)?;
        log::info!("stored session state to `{}`", path.display());
    }

    Ok(())
}
