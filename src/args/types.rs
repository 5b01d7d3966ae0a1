use clap::Parser;

use super::validators::{check_positive_count, validate};
use crate::timestamp::TimeInput;

#[derive(Parser, Debug, Clone, Default, serde::Serialize)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Timestamps to watch: epoch milliseconds or a date/time string
    #[arg(value_name = "TIMESTAMP", required = true)]
    pub timestamps: Vec<String>,

    /// Print extra stuff (use -v -v or --verbose --verbose for even more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the first emission for each timestamp and exit
    #[arg(long, conflicts_with = "max_emissions")]
    pub once: bool,

    /// Stop each timestamp after this many emissions
    #[arg(
        short = 'n',
        long,
        value_name = "COUNT",
        value_parser = check_positive_count
    )]
    pub max_emissions: Option<u64>,

    /// Print newline-delimited JSON records instead of plain text
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Validate argument combinations clap cannot express.
    ///
    /// # Errors
    /// Returns a message describing the first invalid argument.
    pub fn validate(&self) -> Result<(), String> {
        validate(self)
    }

    /// Emissions allowed per timestamp, `None` meaning until interrupted.
    #[must_use]
    pub fn emission_limit(&self) -> Option<u64> {
        if self.once { Some(1) } else { self.max_emissions }
    }

    #[must_use]
    pub fn inputs(&self) -> Vec<TimeInput> {
        self.timestamps.iter().map(TimeInput::from).collect()
    }
}
