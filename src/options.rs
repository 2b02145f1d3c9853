use std::path::PathBuf;

use clap::Parser;

/// Run a coupled borefield/ground session against the built-in conduction
/// backend.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Options {
    /// Number of communication steps to run.
    #[arg(long, default_value_t = 24)]
    pub steps: u32,

    /// Communication step size [s].
    #[arg(long, default_value_t = 3600.0)]
    pub step_size: f64,

    /// Heat flux injected per borefield segment [W].
    #[arg(long, default_value_t = 50.0)]
    pub heat_flux: f64,

    /// Initial borehole wall temperature [K].
    #[arg(long, default_value_t = 283.15)]
    pub start_temperature: f64,

    /// Outdoor dry-bulb temperature [K].
    #[arg(long, default_value_t = 278.15)]
    pub ambient_temperature: f64,

    /// File of cumulative layer depth markers, one per line [m]. A bundled
    /// demonstration column is used when omitted.
    #[arg(long)]
    pub layer_file: Option<PathBuf>,

    /// Persist the session state to this file, and resume from it when it
    /// already exists.
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}
