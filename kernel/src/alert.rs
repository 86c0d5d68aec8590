// Low-battery warning on the reserved status line
//
// The bottom 25 rows of the panel belong to status text. Colour and
// cursor are set on every report even when nothing gets printed;
// they only matter to the next draw call.
//
// 0.0 V means no sensor (unpopulated or failed) and never warns.

use core::fmt::{self, Write};

use log::info;

use crate::battery::BatteryReading;
use crate::config::BatteryConfig;

/// 3-bit panel scale: 7 = white, 0 = black.
pub const STATUS_FG: u8 = 7;
pub const STATUS_BG: u8 = 0;
/// Status line baseline offset from the bottom edge.
pub const STATUS_LINE_OFFSET: u16 = 25;

/// Text output the status line needs from the display.
pub trait TextDisplay: Write {
    fn set_text_color(&mut self, fg: u8, bg: u8);
    fn set_cursor(&mut self, x: u16, y: u16);
    fn height(&self) -> u16;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatteryAlert {
    /// Informational, `always_show` builds.
    Level(BatteryReading),
    Low(BatteryReading),
}

impl BatteryAlert {
    pub fn evaluate(reading: BatteryReading, cfg: &BatteryConfig) -> Option<Self> {
        if cfg.always_show {
            Some(BatteryAlert::Level(reading))
        } else if reading.is_available() && reading.volts() < cfg.warning_volts {
            Some(BatteryAlert::Low(reading))
        } else {
            None
        }
    }
}

impl fmt::Display for BatteryAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatteryAlert::Level(r) => write!(f, "Battery level: {:.2} V", r.volts()),
            BatteryAlert::Low(r) => write!(f, "Battery level low! ({:.2} V)", r.volts()),
        }
    }
}

pub fn report_battery<T: TextDisplay>(
    display: &mut T,
    reading: BatteryReading,
    cfg: &BatteryConfig,
) -> Option<BatteryAlert> {
    info!(
        "battery level: {:.2} V ({}%)",
        reading.volts(),
        reading.percentage()
    );

    display.set_text_color(STATUS_FG, STATUS_BG);
    let y = display.height().saturating_sub(STATUS_LINE_OFFSET);
    display.set_cursor(0, y);

    let alert = BatteryAlert::evaluate(reading, cfg)?;
    let drawn = match alert {
        BatteryAlert::Level(_) => write!(display, "{}", alert),
        BatteryAlert::Low(_) => writeln!(display, "{}", alert),
    };
    if drawn.is_err() {
        log::warn!("battery: status line draw failed");
    }
    Some(alert)
}
