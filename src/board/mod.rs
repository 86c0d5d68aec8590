//! Inkplate-class ESP32 board support
//!
//! Maps the physical hardware to named subsystems so the boot path
//! never needs GPIO numbers. The MCP23017 expander also carries panel
//! control lines, so it lives in a static behind a critical-section
//! mutex and the battery gate borrows it from there.

pub mod battery;
pub mod panel;
pub mod pins;
pub mod power;

pub use battery::{BatteryAdc, BatterySensor};
pub use panel::DetachedPanel;
pub use pins::{PANEL_HEIGHT, PANEL_WIDTH};
pub use power::RtcSleep;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use esp_hal::{
    Blocking,
    analog::adc::{Adc, AdcConfig, Attenuation},
    delay::Delay,
    i2c::master::{Config as I2cConfig, I2c},
    peripherals::{Peripherals, WIFI},
    rtc_cntl::Rtc,
    time::Rate,
};
use inkframe_kernel::{Expander, SharedExpander};
use static_cell::StaticCell;

pub type ExpanderBus = I2c<'static, Blocking>;
pub type SharedIoExpander = SharedExpander<CriticalSectionRawMutex, ExpanderBus>;

static EXPANDER: StaticCell<SharedIoExpander> = StaticCell::new();

// Hardware Bundles
/// Battery measurement: ADC on the divider tap plus the gate.
pub struct BatteryHw {
    pub adc: BatteryAdc,
    pub expander: &'static SharedIoExpander,
}

/// Radio peripheral, consumed by WiFi bring-up.
pub struct RadioHw {
    pub wifi: WIFI<'static>,
}

/// Complete board hardware, ready for driver initialization.
pub struct Board {
    pub battery: BatteryHw,
    pub radio: RadioHw,
    pub panel: DetachedPanel,
    pub power: RtcSleep,
}

impl Board {
    pub fn init(p: Peripherals) -> Self {
        let i2c = I2c::new(
            p.I2C0,
            I2cConfig::default().with_frequency(Rate::from_khz(pins::I2C_FREQ_KHZ)),
        )
        .unwrap()
        .with_sda(p.GPIO21) // pins::I2C_SDA
        .with_scl(p.GPIO22); // pins::I2C_SCL
        let expander: &'static SharedIoExpander =
            EXPANDER.init(SharedExpander::new(Expander::new(i2c)));

        let mut adc_cfg = AdcConfig::new();
        // 11dB attenuation covers the ~2.1V divider tap of a full cell
        let pin = adc_cfg.enable_pin(p.GPIO35, Attenuation::_11dB); // pins::BATTERY_ADC
        let adc = Adc::new(p.ADC1, adc_cfg);

        let power = RtcSleep::new(Rtc::new(p.LPWR), Delay::new());

        Board {
            battery: BatteryHw {
                adc: BatteryAdc::new(adc, pin),
                expander,
            },
            radio: RadioHw { wifi: p.WIFI },
            panel: DetachedPanel,
            power,
        }
    }
}
