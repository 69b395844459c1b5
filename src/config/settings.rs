//! Runtime settings

use std::{path::PathBuf, time::Duration};

use crate::config::CliArgs;

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub socket_path: PathBuf,
    pub socket_mode: u32,
    pub continuation_ttl: Duration,
    pub event_capacity: usize,
    pub simulate_second_factor: bool,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        Settings {
            socket_path: PathBuf::from(args.socket_path),
            socket_mode: args.socket_mode,
            continuation_ttl: Duration::from_secs(args.continuation_ttl_secs),
            event_capacity: args.event_capacity.max(1),
            simulate_second_factor: args.simulate_second_factor,
        }
    }
}
