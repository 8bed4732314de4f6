use std::time::Duration;

use clap::Parser;

use crate::{
    hotkey::StopKey,
    injector::InjectorOptions,
    motion::HUMAN_JITTER,
    target::MAX_LOCATIONS,
};

/// Moves the mouse over a list of screen locations and clicks, copies or pastes at each, on a loop.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Options {
    /// Global key that stops a running script.
    #[arg(long, default_value = "q")]
    pub stop_key: StopKey,

    /// Initial seconds to wait between full cycles.
    #[arg(long, default_value_t = 13.0, value_parser = seconds)]
    pub cycle_wait: f64,

    /// Initial seconds to wait after each location.
    #[arg(long, default_value_t = 0.2, value_parser = seconds)]
    pub click_wait: f64,

    /// Initial number of locations in the form.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=MAX_LOCATIONS as i64))]
    pub locations: u8,

    /// Seconds each pointer move takes. 0 jumps straight to the target.
    #[arg(long, value_name = "SECS", default_value = "0.2", value_parser = duration)]
    pub move_duration: Duration,

    /// Glide along a slightly curved, randomized path instead of a straight line.
    #[arg(long)]
    pub human_motion: bool,

    /// Don't abort when the pointer is pushed into a screen corner.
    #[arg(long)]
    pub no_fail_safe: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn duration(s: &str) -> Result<Duration, String> {
    s.parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| format!("expected a non-negative number of seconds, got {s:?}"))
}

fn seconds(s: &str) -> Result<f64, String> {
    duration(s).map(|d| d.as_secs_f64())
}

impl Options {
    pub fn injector_options(&self) -> InjectorOptions {
        InjectorOptions {
            fail_safe: !self.no_fail_safe,
            jitter: if self.human_motion { HUMAN_JITTER } else { 0 },
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Options::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let opts = Options::try_parse_from(["spot-clicker"]).unwrap();
        assert_eq!(opts.stop_key, StopKey::default());
        assert_eq!(opts.cycle_wait, 13.0);
        assert_eq!(opts.click_wait, 0.2);
        assert_eq!(opts.locations, 4);
        assert_eq!(opts.move_duration, Duration::from_millis(200));
        assert!(opts.injector_options().fail_safe);
        assert_eq!(opts.injector_options().jitter, 0);
        assert_eq!(opts.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_flags() {
        let opts = Options::try_parse_from([
            "spot-clicker",
            "--stop-key",
            "x",
            "--human-motion",
            "--no-fail-safe",
            "-vv",
        ])
        .unwrap();
        assert_eq!(opts.stop_key.as_char(), 'x');
        assert_eq!(opts.injector_options().jitter, HUMAN_JITTER);
        assert!(!opts.injector_options().fail_safe);
        assert_eq!(opts.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Options::try_parse_from(["spot-clicker", "--cycle-wait", "-1"]).is_err());
        assert!(Options::try_parse_from(["spot-clicker", "--cycle-wait", "1e30"]).is_err());
        assert!(Options::try_parse_from(["spot-clicker", "--move-duration", "1e30"]).is_err());
        assert!(Options::try_parse_from(["spot-clicker", "--move-duration", "NaN"]).is_err());
        assert!(Options::try_parse_from(["spot-clicker", "--locations", "11"]).is_err());
        assert!(Options::try_parse_from(["spot-clicker", "--stop-key", "esc"]).is_err());
    }
}
