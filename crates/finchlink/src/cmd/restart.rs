use finchlink_channel::ConnectionState;
use serde::Serialize;

use crate::cmd::robot::{parse_duration, RobotArgs};
use crate::cmd::RestartArgs;
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

#[derive(Serialize)]
struct RestartReport {
    pause_ms: u64,
    state: ConnectionState,
}

impl Report for RestartReport {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pause_ms", self.pause_ms.to_string()),
            ("state", self.state.to_string()),
        ]
    }
}

pub fn run(args: RestartArgs, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    let pause = parse_duration(&args.pause)?;
    let finch = robot.open()?;
    finch
        .stop_and_start(pause)
        .map_err(|err| channel_error("restart failed", err))?;
    finch
        .halt()
        .map_err(|err| channel_error("command after restart failed", err))?;

    let report = RestartReport {
        pause_ms: pause.as_millis() as u64,
        state: finch.state(),
    };
    print_report(&report, format);
    Ok(SUCCESS)
}
