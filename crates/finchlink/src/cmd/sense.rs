use finchlink_channel::ChannelError;
use finchlink_frame::{Acceleration, LightReading, ObstacleReading, Temperature, TemperatureUnit};
use serde::Serialize;

use crate::cmd::robot::RobotArgs;
use crate::cmd::{SenseArgs, Sensor};
use crate::exit::{channel_error, frame_error, CliError, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

#[derive(Serialize)]
struct TemperatureReport {
    value: f64,
    unit: TemperatureUnit,
    celsius: f64,
}

impl TemperatureReport {
    fn new(temperature: Temperature, unit: TemperatureUnit) -> Self {
        Self {
            value: temperature.in_unit(unit),
            unit,
            celsius: temperature.celsius(),
        }
    }
}

#[derive(Serialize, Default)]
struct SenseReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    light: Option<LightReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    obstacle: Option<ObstacleReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<TemperatureReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    acceleration: Option<Acceleration>,
}

impl Report for SenseReport {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        if let Some(light) = &self.light {
            rows.push(("light.left", format!("{:.3}", light.left)));
            rows.push(("light.right", format!("{:.3}", light.right)));
        }
        if let Some(obstacle) = &self.obstacle {
            rows.push(("obstacle.left", obstacle.left.to_string()));
            rows.push(("obstacle.right", obstacle.right.to_string()));
        }
        if let Some(temperature) = &self.temperature {
            rows.push((
                "temperature",
                format!("{:.2} {}", temperature.value, temperature.unit.symbol()),
            ));
        }
        if let Some(accel) = &self.acceleration {
            rows.push(("acceleration.x", format!("{:.2} g", accel.x)));
            rows.push(("acceleration.y", format!("{:.2} g", accel.y)));
            rows.push(("acceleration.z", format!("{:.2} g", accel.z)));
            rows.push(("acceleration.tap", accel.tap.to_string()));
            rows.push(("acceleration.shake", accel.shake.to_string()));
        }
        rows
    }
}

pub fn run(args: SenseArgs, robot: &RobotArgs, format: OutputFormat) -> CliResult<i32> {
    let unit: TemperatureUnit = args
        .unit
        .parse()
        .map_err(|err| frame_error("invalid --unit", err))?;
    let finch = robot.open()?;
    let failed = |err: ChannelError| -> CliError { channel_error("sensor read failed", err) };

    let mut report = SenseReport::default();
    if args.sensor.includes(Sensor::Light) {
        report.light = Some(finch.light().map_err(failed)?);
    }
    if args.sensor.includes(Sensor::Obstacle) {
        report.obstacle = Some(finch.obstacle().map_err(failed)?);
    }
    if args.sensor.includes(Sensor::Temperature) {
        let temperature = finch.temperature().map_err(failed)?;
        report.temperature = Some(TemperatureReport::new(temperature, unit));
    }
    if args.sensor.includes(Sensor::Acceleration) {
        report.acceleration = Some(finch.acceleration().map_err(failed)?);
    }

    print_report(&report, format);
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_only_includes_read_sensors() {
        let report = SenseReport {
            temperature: Some(TemperatureReport::new(
                Temperature::from_raw(127),
                TemperatureUnit::Fahrenheit,
            )),
            ..SenseReport::default()
        };

        let json = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(json["temperature"]["value"], 77.0);
        assert_eq!(json["temperature"]["unit"], "fahrenheit");
        assert!(json.get("light").is_none());

        assert_eq!(
            report.rows(),
            vec![("temperature", "77.00 °F".to_string())]
        );
    }

    #[test]
    fn all_includes_every_sensor() {
        for sensor in [
            Sensor::Light,
            Sensor::Obstacle,
            Sensor::Temperature,
            Sensor::Acceleration,
        ] {
            assert!(Sensor::All.includes(sensor));
            assert!(sensor.includes(sensor));
        }
        assert!(!Sensor::Light.includes(Sensor::Temperature));
    }
}
