use clap::{Args, Subcommand, ValueEnum};

use crate::cmd::robot::RobotArgs;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod actuate;
pub mod alarm;
pub mod restart;
pub mod robot;
pub mod sense;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set the beak LED.
    Led(LedArgs),
    /// Sound the buzzer.
    Buzz(BuzzArgs),
    /// Drive both wheels.
    Wheels(WheelsArgs),
    /// Stop the motors and turn the LED off.
    Halt,
    /// Read one sensor, or all of them.
    Sense(SenseArgs),
    /// Close the link, pause, and reopen it.
    Restart(RestartArgs),
    /// Watch the temperature and raise an alarm above a threshold.
    Alarm(AlarmArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Led(args) => actuate::led(args, robot, format),
        Command::Buzz(args) => actuate::buzz(args, robot, format),
        Command::Wheels(args) => actuate::wheels(args, robot, format),
        Command::Halt => actuate::halt(robot, format),
        Command::Sense(args) => sense::run(args, robot, format),
        Command::Restart(args) => restart::run(args, robot, format),
        Command::Alarm(args) => alarm::run(args, robot, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct LedArgs {
    /// Color name, #RRGGBB, or three 0-255 values (R G B).
    #[arg(required = true, num_args = 1..=3, value_name = "COLOR")]
    pub color: Vec<String>,
}

#[derive(Args, Debug)]
pub struct BuzzArgs {
    /// How long to sound, in seconds.
    #[arg(long, default_value_t = 1.0)]
    pub duration: f64,
    /// Tone frequency in Hz.
    #[arg(long, default_value_t = 440)]
    pub frequency: u16,
    /// Wait until the buzzer has finished before exiting.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct WheelsArgs {
    /// Left wheel throttle, -1.0 (full reverse) to 1.0 (full forward).
    #[arg(allow_negative_numbers = true)]
    pub left: f64,
    /// Right wheel throttle, -1.0 (full reverse) to 1.0 (full forward).
    #[arg(allow_negative_numbers = true)]
    pub right: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Sensor {
    Light,
    Obstacle,
    Temperature,
    Acceleration,
    All,
}

impl Sensor {
    pub fn includes(self, sensor: Sensor) -> bool {
        self == Sensor::All || self == sensor
    }
}

#[derive(Args, Debug)]
pub struct SenseArgs {
    /// Sensor to read.
    #[arg(value_enum)]
    pub sensor: Sensor,
    /// Temperature unit: celsius, fahrenheit, or kelvin (c, f, k).
    #[arg(long, default_value = "celsius")]
    pub unit: String,
}

#[derive(Args, Debug)]
pub struct RestartArgs {
    /// How long the link stays closed (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub pause: String,
}

#[derive(Args, Debug)]
pub struct AlarmArgs {
    /// Alarm above this temperature, in °C.
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    pub threshold: f64,
    /// Time between polls (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Stop after this many polls. Default: run until Ctrl-C.
    #[arg(long)]
    pub count: Option<usize>,
    /// Alarm tone frequency in Hz.
    #[arg(long, default_value_t = 880)]
    pub frequency: u16,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
