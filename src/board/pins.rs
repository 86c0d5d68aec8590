//! GPIO |     Function      |      Notes
//! -----+-------------------+----------------------------------
//! 21   | I2C0 SDA          | MCP23017 expander (0x20), panel control
//! 22   | I2C0 SCL          |
//! 35   | ADC1 - Battery    | 2:1 divider, reads 1/2 cell voltage
//!      |                   | gated by expander pin 9 (GPB1) on gated boards
//!
//! esp-hal hands pins out as typed peripherals, so `Board::init` names
//! `p.GPIO21` etc. directly. The numbers below document that mapping
//! and must be kept in step with it.

// ----- I2C (expander) -----
pub const I2C_SDA: u8 = 21;
pub const I2C_SCL: u8 = 22;
pub const I2C_FREQ_KHZ: u32 = 400;

// ----- Battery -----
pub const BATTERY_ADC: u8 = 35; // GPIO35 - voltage divider, 1/2 of battery voltage

// ----- Panel -----
pub const PANEL_WIDTH: u16 = 800;
pub const PANEL_HEIGHT: u16 = 600;
