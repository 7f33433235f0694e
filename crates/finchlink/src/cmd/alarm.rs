use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use finchlink_device::Finch;
use finchlink_frame::Color;
use serde::Serialize;
use tracing::{info, warn};

use crate::cmd::robot::{parse_duration, RobotArgs};
use crate::cmd::AlarmArgs;
use crate::exit::{channel_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_report, OutputFormat, Report};

const ALARM_COLOR: Color = Color::rgb(255, 0, 0);
const CLEAR_COLOR: Color = Color::rgb(0, 255, 0);
/// Longest tone the buzzer command can carry.
const MAX_TONE: Duration = Duration::from_millis(u16::MAX as u64);
const STOP_POLL: Duration = Duration::from_millis(50);

#[derive(Serialize)]
struct AlarmSample {
    poll: usize,
    celsius: f64,
    threshold: f64,
    alarm: bool,
}

impl Report for AlarmSample {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("poll", self.poll.to_string()),
            ("celsius", format!("{:.2}", self.celsius)),
            ("threshold", format!("{:.2}", self.threshold)),
            ("alarm", self.alarm.to_string()),
        ]
    }
}

pub fn run(args: AlarmArgs, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let finch = robot.open()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    watch(&finch, &args, interval, &running, format)
}

/// Poll until stopped. A poll that times out is skipped and the loop carries
/// on; the exit code then reports the missed readings.
fn watch(
    finch: &Finch,
    args: &AlarmArgs,
    interval: Duration,
    running: &AtomicBool,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut polls = 0usize;
    let mut missed = 0usize;
    while running.load(Ordering::SeqCst) {
        polls += 1;
        match poll(finch, args, interval, polls) {
            Ok(sample) => print_report(&sample, format),
            Err(err) if err.code == TIMEOUT => {
                warn!(poll = polls, error = %err, "poll missed");
                missed += 1;
            }
            Err(err) => return Err(err),
        }

        if args.count.is_some_and(|count| polls >= count) {
            break;
        }
        wait(interval, running);
    }

    info!(polls, missed, "alarm stopped");
    finch
        .halt()
        .map_err(|err| channel_error("halt failed", err))?;
    Ok(if missed > 0 { FAILURE } else { SUCCESS })
}

fn poll(finch: &Finch, args: &AlarmArgs, interval: Duration, poll: usize) -> CliResult<AlarmSample> {
    let celsius = finch
        .temperature()
        .map_err(|err| channel_error("temperature read failed", err))?
        .celsius();
    let alarm = celsius > args.threshold;

    if alarm {
        warn!(celsius, threshold = args.threshold, "temperature above threshold");
        finch
            .led(ALARM_COLOR)
            .and_then(|()| finch.buzzer(interval.min(MAX_TONE), args.frequency))
            .map_err(|err| channel_error("alarm failed", err))?;
    } else {
        finch
            .led(CLEAR_COLOR)
            .map_err(|err| channel_error("led failed", err))?;
    }

    Ok(AlarmSample {
        poll,
        celsius,
        threshold: args.threshold,
        alarm,
    })
}

/// Sleep for `interval`, waking early once `running` is cleared.
fn wait(interval: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        std::thread::sleep(remaining.min(STOP_POLL));
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use finchlink_channel::ChannelConfig;
    use finchlink_transport::{SimSensors, SimulatedLink};

    use super::*;

    fn args(count: usize) -> AlarmArgs {
        AlarmArgs {
            threshold: 30.0,
            interval: "10ms".to_string(),
            count: Some(count),
            frequency: 880,
        }
    }

    fn config() -> ChannelConfig {
        ChannelConfig {
            read_timeout: Duration::from_millis(30),
            write_timeout: Duration::from_millis(30),
            ..ChannelConfig::default()
        }
    }

    #[test]
    fn missed_polls_exit_with_failure() {
        let finch = Finch::open_link(SimulatedLink::silent(), config())
            .expect("simulated robot should open");
        let running = AtomicBool::new(true);

        let code = watch(
            &finch,
            &args(2),
            Duration::from_millis(10),
            &running,
            OutputFormat::Json,
        )
        .expect("timeouts do not abort the alarm");
        assert_eq!(code, FAILURE);
    }

    #[test]
    fn clean_run_exits_with_success() {
        let link = SimulatedLink::finch();
        link.handle().set_sensors(SimSensors {
            temperature: 100,
            ..SimSensors::default()
        });
        let finch = Finch::open_link(link, config()).expect("simulated robot should open");
        let running = AtomicBool::new(true);

        let code = watch(
            &finch,
            &args(2),
            Duration::from_millis(10),
            &running,
            OutputFormat::Json,
        )
        .expect("alarm should run");
        assert_eq!(code, SUCCESS);
    }

    #[test]
    fn lost_link_aborts_the_alarm() {
        let finch = Finch::open_link(SimulatedLink::finch(), config())
            .expect("simulated robot should open");
        finch.close().expect("close should succeed");
        let running = AtomicBool::new(true);

        let err = watch(
            &finch,
            &args(3),
            Duration::from_millis(10),
            &running,
            OutputFormat::Json,
        )
        .expect_err("a closed robot cannot be polled");
        assert_eq!(err.code, crate::exit::LINK_ERROR);
    }
}
