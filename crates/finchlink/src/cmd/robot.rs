use std::time::Duration;

use clap::Args;
use finchlink_channel::ChannelConfig;
use finchlink_device::Finch;
use finchlink_transport::{SerialConfig, SimulatedLink, DEFAULT_BAUD_RATE};
use tracing::info;

use crate::exit::{channel_error, CliError, CliResult, USAGE};

/// Port name that selects the built-in simulator.
pub const SIM_PORT: &str = "sim";

#[derive(Args, Debug, Clone)]
pub struct RobotArgs {
    /// Serial port of the robot, or `sim` for the built-in simulator.
    #[arg(long, env = "FINCHLINK_PORT", value_name = "PORT", global = true)]
    pub port: Option<String>,

    /// Serial baud rate.
    #[arg(long, env = "FINCHLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    pub baud: u32,

    /// Per-command read and write timeout (e.g. 500ms, 2s).
    #[arg(long, default_value = "500ms", global = true)]
    pub timeout: String,
}

impl RobotArgs {
    pub fn channel_config(&self) -> CliResult<ChannelConfig> {
        let timeout = parse_duration(&self.timeout)?;
        Ok(ChannelConfig {
            read_timeout: timeout,
            write_timeout: timeout,
            ..ChannelConfig::default()
        })
    }

    /// Connect to the robot named by `--port`.
    pub fn open(&self) -> CliResult<Finch> {
        let port = self.port.as_deref().ok_or_else(|| {
            CliError::new(USAGE, "no robot port given (use --port or FINCHLINK_PORT)")
        })?;
        let config = self.channel_config()?;

        let finch = if port == SIM_PORT {
            Finch::open_link(SimulatedLink::finch(), config)
        } else {
            let mut serial = SerialConfig::new(port);
            serial.baud_rate = self.baud;
            serial.write_timeout = config.write_timeout;
            Finch::open_serial(serial, config)
        }
        .map_err(|err| channel_error("failed to open robot", err))?;

        info!(port, baud = self.baud, "robot connected");
        Ok(finch)
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}
