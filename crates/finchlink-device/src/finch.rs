use std::time::Duration;

use finchlink_channel::{ChannelConfig, Connection, ConnectionState, Result};
use finchlink_frame::commands::{self, Direction};
use finchlink_frame::{
    Acceleration, Color, Command, FrameError, LightReading, ObstacleReading, Reply, Temperature,
};
use finchlink_transport::{Link, SerialConfig, SerialLink};
use serde::Serialize;
use tracing::debug;

/// `buzzer_with_delay` waits this multiple of the buzz duration.
pub const BUZZER_DELAY_MARGIN: f64 = 1.05;

/// One reading from every sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub light: LightReading,
    pub obstacle: ObstacleReading,
    pub temperature: Temperature,
    pub acceleration: Acceleration,
}

/// A Finch robot.
///
/// Every method encodes one command, submits it, and decodes the reply.
/// Clones share the same connection and may be used from any thread.
#[derive(Debug, Clone)]
pub struct Finch {
    connection: Connection,
}

impl Finch {
    /// Wrap an existing connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Open a robot on a serial port.
    pub fn open_serial(serial: SerialConfig, channel: ChannelConfig) -> Result<Self> {
        Self::open_link(SerialLink::new(serial), channel)
    }

    /// Open a robot on any link.
    pub fn open_link(link: impl Link + 'static, channel: ChannelConfig) -> Result<Self> {
        Ok(Self::new(Connection::open_with(link, channel)?))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn open(&self) -> Result<()> {
        self.connection.open()
    }

    pub fn close(&self) -> Result<()> {
        self.connection.close()
    }

    /// Close the link, wait `pause`, and reopen it.
    pub fn stop_and_start(&self, pause: Duration) -> Result<()> {
        self.connection.stop_and_start(pause)
    }

    /// Set the beak LED.
    pub fn led(&self, color: Color) -> Result<()> {
        debug!(%color, "setting LED");
        self.send(commands::led(color))
    }

    pub fn led_rgb(&self, r: u8, g: u8, b: u8) -> Result<()> {
        self.led(Color::rgb(r, g, b))
    }

    /// Set the LED from a color name or `#RRGGBB`.
    pub fn led_str(&self, color: &str) -> Result<()> {
        self.led(color.parse()?)
    }

    /// Start the buzzer. Returns once the command is written; the buzzer
    /// keeps sounding on its own.
    pub fn buzzer(&self, duration: Duration, frequency_hz: u16) -> Result<()> {
        self.send(commands::buzzer(duration, frequency_hz)?)
    }

    /// Start the buzzer and wait until it has finished.
    ///
    /// The wait happens after the command completes, so other callers can
    /// use the robot meanwhile.
    pub fn buzzer_with_delay(&self, duration: Duration, frequency_hz: u16) -> Result<()> {
        self.buzzer(duration, frequency_hz)?;
        std::thread::sleep(duration.mul_f64(BUZZER_DELAY_MARGIN));
        Ok(())
    }

    /// Drive both wheels from signed throttles in `[-1.0, 1.0]`.
    pub fn wheels(&self, left: f64, right: f64) -> Result<()> {
        self.send(commands::wheels(left, right)?)
    }

    /// Drive both wheels with explicit direction and speed.
    pub fn motor(
        &self,
        left_dir: Direction,
        left_speed: u8,
        right_dir: Direction,
        right_speed: u8,
    ) -> Result<()> {
        self.send(commands::motor(left_dir, left_speed, right_dir, right_speed))
    }

    /// Stop the motors and turn the LED off.
    pub fn halt(&self) -> Result<()> {
        self.send(commands::halt())
    }

    pub fn light(&self) -> Result<LightReading> {
        self.query(commands::light()).map(LightReading::from_raw)
    }

    pub fn obstacle(&self) -> Result<ObstacleReading> {
        self.query(commands::obstacle()).map(ObstacleReading::from_raw)
    }

    pub fn temperature(&self) -> Result<Temperature> {
        self.query::<1>(commands::temperature())
            .map(|[raw]| Temperature::from_raw(raw))
    }

    pub fn acceleration(&self) -> Result<Acceleration> {
        self.query(commands::acceleration()).map(Acceleration::from_raw)
    }

    /// Read every sensor, one query after another.
    pub fn snapshot(&self) -> Result<SensorSnapshot> {
        Ok(SensorSnapshot {
            light: self.light()?,
            obstacle: self.obstacle()?,
            temperature: self.temperature()?,
            acceleration: self.acceleration()?,
        })
    }

    fn send(&self, command: Command) -> Result<()> {
        self.connection.submit(command).map(|_| ())
    }

    fn query<const N: usize>(&self, command: Command) -> Result<[u8; N]> {
        let opcode = command.opcode();
        let reply = self.connection.submit(command)?;
        reply_bytes(opcode, reply)
    }
}

#[cfg(feature = "async")]
impl Finch {
    pub async fn light_async(&self) -> Result<LightReading> {
        self.query_async(commands::light())
            .await
            .map(LightReading::from_raw)
    }

    pub async fn obstacle_async(&self) -> Result<ObstacleReading> {
        self.query_async(commands::obstacle())
            .await
            .map(ObstacleReading::from_raw)
    }

    pub async fn temperature_async(&self) -> Result<Temperature> {
        self.query_async::<1>(commands::temperature())
            .await
            .map(|[raw]| Temperature::from_raw(raw))
    }

    pub async fn acceleration_async(&self) -> Result<Acceleration> {
        self.query_async(commands::acceleration())
            .await
            .map(Acceleration::from_raw)
    }

    /// Async form of [`buzzer_with_delay`](Self::buzzer_with_delay).
    pub async fn buzzer_with_delay_async(&self, duration: Duration, frequency_hz: u16) -> Result<()> {
        self.connection
            .submit_async(commands::buzzer(duration, frequency_hz)?)
            .await?;
        tokio::time::sleep(duration.mul_f64(BUZZER_DELAY_MARGIN)).await;
        Ok(())
    }

    async fn query_async<const N: usize>(&self, command: Command) -> Result<[u8; N]> {
        let opcode = command.opcode();
        let reply = self.connection.submit_async(command).await?;
        reply_bytes(opcode, reply)
    }
}

fn reply_bytes<const N: usize>(opcode: u8, reply: Option<Reply>) -> Result<[u8; N]> {
    let bytes = reply.as_ref().map(Reply::bytes).unwrap_or_default();
    <[u8; N]>::try_from(bytes).map_err(|_| {
        FrameError::MalformedReply {
            opcode,
            expected: N,
            actual: bytes.len(),
        }
        .into()
    })
}
