// Battery ADC and the build-selected sensing variant.
//
// esp-hal has no eFuse calibration for the classic ESP32, so raw
// counts are scaled linearly against the 11dB full-scale voltage.

#[cfg(feature = "gated-battery")]
use esp_hal::delay::Delay;
use esp_hal::{
    Blocking,
    analog::adc::{Adc, AdcPin},
    peripherals::{ADC1, GPIO35},
};
use inkframe_kernel::MillivoltReader;

#[cfg(not(feature = "gated-battery"))]
use inkframe_kernel::DirectSense;
#[cfg(feature = "gated-battery")]
use inkframe_kernel::GatedSense;

use super::BatteryHw;
#[cfg(feature = "gated-battery")]
use super::SharedIoExpander;

const ADC_MAX_COUNTS: u32 = 4095;
const ADC_FULL_SCALE_MV: u32 = 3300;

pub struct BatteryAdc {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO35<'static>, ADC1<'static>>,
}

impl BatteryAdc {
    pub fn new(
        adc: Adc<'static, ADC1<'static>, Blocking>,
        pin: AdcPin<GPIO35<'static>, ADC1<'static>>,
    ) -> Self {
        Self { adc, pin }
    }
}

impl MillivoltReader for BatteryAdc {
    type Error = ();

    fn read_millivolts(&mut self) -> Result<u16, Self::Error> {
        let raw: u16 = nb::block!(self.adc.read_oneshot(&mut self.pin))?;
        Ok((raw as u32 * ADC_FULL_SCALE_MV / ADC_MAX_COUNTS) as u16)
    }
}

#[cfg(feature = "gated-battery")]
pub type BatterySensor = GatedSense<&'static SharedIoExpander, BatteryAdc, Delay>;

#[cfg(not(feature = "gated-battery"))]
pub type BatterySensor = DirectSense<BatteryAdc>;

impl BatteryHw {
    #[cfg(feature = "gated-battery")]
    pub fn into_sensor(self) -> BatterySensor {
        // gate on expander pin 9 (GPB1)
        GatedSense::new(self.expander, self.adc, Delay::new())
    }

    #[cfg(not(feature = "gated-battery"))]
    pub fn into_sensor(self) -> BatterySensor {
        DirectSense::new(self.adc)
    }
}
