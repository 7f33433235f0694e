mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::robot::RobotArgs;
use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "finchlink", version, about = "Drive a Finch robot over a serial link")]
struct Cli {
    #[command(flatten)]
    robot: RobotArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "FINCHLINK_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.robot, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_led_name_and_triple() {
        let cli = Cli::try_parse_from(["finchlink", "--port", "sim", "led", "orange"])
            .expect("led name should parse");
        assert!(matches!(cli.command, Command::Led(ref args) if args.color == ["orange"]));

        let cli = Cli::try_parse_from(["finchlink", "led", "0", "255", "139"])
            .expect("led triple should parse");
        assert!(matches!(cli.command, Command::Led(ref args) if args.color.len() == 3));
    }

    #[test]
    fn parses_negative_wheel_throttle() {
        let cli = Cli::try_parse_from(["finchlink", "wheels", "-0.5", "1"])
            .expect("negative throttle should parse");
        match cli.command {
            Command::Wheels(args) => {
                assert_eq!(args.left, -0.5);
                assert_eq!(args.right, 1.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_robot_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "finchlink",
            "sense",
            "temperature",
            "--port",
            "/dev/ttyUSB0",
            "--baud",
            "9600",
            "--timeout",
            "2s",
        ])
        .expect("global flags should parse after subcommand");
        assert_eq!(cli.robot.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.robot.baud, 9600);
        assert_eq!(cli.robot.timeout, "2s");
    }

    #[test]
    fn rejects_unknown_sensor() {
        let err = Cli::try_parse_from(["finchlink", "sense", "humidity"])
            .expect_err("unknown sensor should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn led_requires_a_color() {
        let err = Cli::try_parse_from(["finchlink", "led"]).expect_err("missing color should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
