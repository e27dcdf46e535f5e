//! Single-pixel status light
//!
//! The indicator is best effort: driver failures are logged and never
//! interrupt the session sequence.

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Indicator palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Off,
    Red,
    Green,
    Blue,
    White,
}

impl Color {
    /// RGB triple written to the pixel; kept dim on purpose.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Off => (0, 0, 0),
            Color::Red => (50, 0, 0),
            Color::Green => (0, 50, 0),
            Color::Blue => (0, 0, 50),
            Color::White => (20, 20, 20),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Off => write!(f, "off"),
            Color::Red => write!(f, "red"),
            Color::Green => write!(f, "green"),
            Color::Blue => write!(f, "blue"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Pixel driver trait
///
/// Implementations latch an RGB value and push it to the hardware.
pub trait PixelDriver: Send {
    fn write(&mut self, rgb: (u8, u8, u8)) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()>;
}

/// Host driver that renders the pixel as log lines
#[derive(Debug, Default)]
pub struct LogPixel {
    latched: (u8, u8, u8),
}

impl PixelDriver for LogPixel {
    fn write(&mut self, rgb: (u8, u8, u8)) -> std::io::Result<()> {
        self.latched = rgb;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let (r, g, b) = self.latched;
        info!("indicator rgb({}, {}, {})", r, g, b);
        Ok(())
    }
}

pub struct Indicator {
    driver: Box<dyn PixelDriver>,
    current: Color,
    settle: Duration,
}

impl Indicator {
    pub fn new(driver: Box<dyn PixelDriver>, settle: Duration) -> Self {
        Self {
            driver,
            current: Color::Off,
            settle,
        }
    }

    pub fn current(&self) -> Color {
        self.current
    }

    /// Write and flush `color`, then wait out the settle delay.
    pub async fn set_color(&mut self, color: Color) {
        debug!(from = %self.current, to = %color, "indicator");

        if let Err(e) = self.driver.write(color.rgb()).and_then(|_| self.driver.flush()) {
            warn!("Indicator write failed: {}", e);
        }
        self.current = color;

        tokio::time::sleep(self.settle).await;
    }

    /// Alternate Red and Off `count` times, holding each for `period`.
    pub async fn blink_failure(&mut self, count: u32, period: Duration) {
        for _ in 0..count {
            self.set_color(Color::Red).await;
            tokio::time::sleep(period).await;
            self.set_color(Color::Off).await;
            tokio::time::sleep(period).await;
        }
    }
}
