//! lensbus demo firmware
//!
//! Talks to a vision sensor on I2C0 (GPIO4 SDA, GPIO5 SCL), switches it to
//! face recognition and logs the face closest to the screen center.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::i2c::{self, I2c};
use embassy_time::{Delay, Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use lensbus_driver::{
    Algorithm, Color, Detection, I2cTransport, Rect, Session, SessionConfig, Transport,
};
use lensbus_hal::{Clock, I2cConfig};
use lensbus_hal_rp2040::{gpio_to_i2c, BlockingI2c, EmbassyClock, I2cId, I2cPinRole};

/// Sensor wiring
const SDA_GPIO: u8 = 4;
const SCL_GPIO: u8 = 5;

/// Pause between result polls
const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Pause between failed handshakes
const RECONNECT_PERIOD: Duration = Duration::from_millis(500);

const ALGORITHM: Algorithm = Algorithm::FaceRecognition;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("lensbus demo starting...");

    let p = embassy_rp::init(Default::default());

    if gpio_to_i2c(SDA_GPIO) != Some((I2cId::I2c0, I2cPinRole::Sda))
        || gpio_to_i2c(SCL_GPIO) != Some((I2cId::I2c0, I2cPinRole::Scl))
    {
        error!("GPIO{}/GPIO{} are not an I2C0 pair", SDA_GPIO, SCL_GPIO);
        return;
    }

    let mut bus_config = i2c::Config::default();
    bus_config.frequency = I2cConfig::STANDARD.frequency;
    let bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, bus_config);

    let config = SessionConfig::default();
    if let Err(e) = config.validate() {
        error!("Invalid session config: {:?}", e);
        return;
    }

    let transport = I2cTransport::with_address(BlockingI2c::new(bus), config.address);
    let mut sensor = Session::new(transport, EmbassyClock, Delay, config);

    connect(&mut sensor).await;

    loop {
        let count = sensor.get_result(ALGORITHM);
        if count > 0 {
            let learned = sensor.results().learned_count();
            debug!("{} faces, {} learned ids", count, learned);
            if let Some(face) = sensor.nearest_to_center().cloned() {
                report(&face);
                highlight(&mut sensor, &face);
            }
        } else if let Some(e) = sensor.last_error() {
            warn!("get_result failed: {:?}", e);
            let stats = sensor.link_stats();
            debug!(
                "link: {} frames, {} bad checksums, {} header errors",
                stats.frames, stats.checksum_failures, stats.header_mismatches
            );
        }

        Timer::after(POLL_PERIOD).await;
    }
}

/// Knock until the sensor answers, then select the algorithm
async fn connect<T, C, D>(sensor: &mut Session<T, C, D>)
where
    T: Transport,
    C: Clock,
    D: embedded_hal::delay::DelayNs,
{
    loop {
        if sensor.knock() && sensor.switch_algorithm(ALGORITHM) {
            info!("Sensor ready");
            return;
        }
        warn!("Sensor not answering: {:?}", sensor.last_error());
        Timer::after(RECONNECT_PERIOD).await;
    }
}

fn report(face: &Detection) {
    if face.is_learned() {
        info!(
            "Face id {} '{}' at ({}, {}) {}x{}",
            face.id,
            face.name.as_str(),
            face.x_center,
            face.y_center,
            face.width,
            face.height
        );
    } else {
        info!(
            "Unknown face at ({}, {}) {}x{}",
            face.x_center, face.y_center, face.width, face.height
        );
    }
}

/// Frame the tracked face on the sensor's screen
fn highlight<T, C, D>(sensor: &mut Session<T, C, D>, face: &Detection)
where
    T: Transport,
    C: Clock,
    D: embedded_hal::delay::DelayNs,
{
    let rect = Rect::new(
        face.x_center.saturating_sub(face.width / 2),
        face.y_center.saturating_sub(face.height / 2),
        face.width,
        face.height,
    );
    let color = if face.is_learned() {
        Color::GREEN
    } else {
        Color::RED
    };
    if !sensor.draw_unique_rect(color, 2, rect) {
        trace!("highlight not acknowledged");
    }
}
