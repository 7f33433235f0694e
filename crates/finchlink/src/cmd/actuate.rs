use std::time::Duration;

use finchlink_frame::Color;

use crate::cmd::robot::RobotArgs;
use crate::cmd::{BuzzArgs, LedArgs, WheelsArgs};
use crate::exit::{channel_error, frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_report, Ack, OutputFormat};

pub fn led(args: LedArgs, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    let color = parse_color(&args.color)?;
    let finch = robot.open()?;
    finch
        .led(color)
        .map_err(|err| channel_error("led failed", err))?;
    print_report(&Ack::new("led").with_detail(color.to_string()), format);
    Ok(SUCCESS)
}

pub fn buzz(args: BuzzArgs, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = Duration::try_from_secs_f64(args.duration).map_err(|_| {
        CliError::new(
            USAGE,
            format!("invalid buzzer duration: {} seconds", args.duration),
        )
    })?;
    let finch = robot.open()?;

    let result = if args.wait {
        finch.buzzer_with_delay(duration, args.frequency)
    } else {
        finch.buzzer(duration, args.frequency)
    };
    result.map_err(|err| channel_error("buzzer failed", err))?;

    let detail = format!("{} ms at {} Hz", duration.as_millis(), args.frequency);
    print_report(&Ack::new("buzz").with_detail(detail), format);
    Ok(SUCCESS)
}

pub fn wheels(args: WheelsArgs, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    // Reject bad throttles before opening the port.
    finchlink_frame::commands::wheels(args.left, args.right)
        .map_err(|err| frame_error("invalid throttle", err))?;
    let finch = robot.open()?;
    finch
        .wheels(args.left, args.right)
        .map_err(|err| channel_error("wheels failed", err))?;
    let detail = format!("left={} right={}", args.left, args.right);
    print_report(&Ack::new("wheels").with_detail(detail), format);
    Ok(SUCCESS)
}

pub fn halt(robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    let finch = robot.open()?;
    finch
        .halt()
        .map_err(|err| channel_error("halt failed", err))?;
    print_report(&Ack::new("halt"), format);
    Ok(SUCCESS)
}

/// A color name, `#RRGGBB`, or three 0-255 values.
fn parse_color(values: &[String]) -> CliResult<Color> {
    match values {
        [single] => single
            .parse()
            .map_err(|err| frame_error("invalid color", err)),
        [r, g, b] => {
            let channel = |value: &String| {
                value.trim().parse::<u8>().map_err(|_| {
                    CliError::new(USAGE, format!("invalid color channel '{value}' (0-255)"))
                })
            };
            Ok(Color::rgb(channel(r)?, channel(g)?, channel(b)?))
        }
        _ => Err(CliError::new(
            USAGE,
            "expected a color name, #RRGGBB, or three values (R G B)",
        )),
    }
}
