// Li-ion battery voltage measurement
//
// GPIO35 reads the cell through a 2:1 divider; multiply the ADC
// millivolts by 2 for the cell voltage. On gated boards the divider
// only sees the cell while expander pin 9 switches the MOSFET on, so
// it is driven high just for the sample and always back low after.
// Boards without the gate read the divider directly.
//
// A failed read is reported as 0.0 V (no sensor) rather than as an
// error; `try_measure` keeps the error for callers that care.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::expander::{ExpanderPin, PinMode, RegisterBitWriter};

const DIVIDER_MULT: f32 = 2.0;

/// MOSFET + divider settle time before sampling; shorter reads low.
pub const SETTLE_MS: u32 = 5;

/// Expander pin driving the measurement MOSFET.
pub const GATE_PIN: ExpanderPin = match ExpanderPin::new(9) {
    Some(pin) => pin,
    None => panic!(),
};

// Linear approximation: 4200mV = 100%, 3000mV = 0%.
const VBAT_FULL_MV: u32 = 4200;
const VBAT_EMPTY_MV: u32 = 3000;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct BatteryReading(f32);

impl BatteryReading {
    pub const UNAVAILABLE: Self = Self(0.0);

    pub const fn from_volts(volts: f32) -> Self {
        Self(volts)
    }

    /// Raw millivolts at the divider tap -> cell volts.
    pub fn from_millivolts(adc_mv: u16) -> Self {
        Self(adc_mv as f32 / 1000.0 * DIVIDER_MULT)
    }

    #[inline]
    pub fn volts(self) -> f32 {
        self.0
    }

    #[inline]
    pub fn is_available(self) -> bool {
        self.0 != 0.0
    }

    pub fn percentage(self) -> u8 {
        let mv = (self.0 * 1000.0 + 0.5) as u32;
        if mv >= VBAT_FULL_MV {
            100
        } else if mv <= VBAT_EMPTY_MV {
            0
        } else {
            ((mv - VBAT_EMPTY_MV) * 100 / (VBAT_FULL_MV - VBAT_EMPTY_MV)) as u8
        }
    }
}

/// Calibrated single-shot ADC read in millivolts.
pub trait MillivoltReader {
    type Error: fmt::Debug;

    fn read_millivolts(&mut self) -> Result<u16, Self::Error>;
}

pub trait BatterySense {
    /// One measurement; 0.0 V when it could not be taken.
    fn measure(&mut self) -> BatteryReading;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseError<B, A> {
    Bus(B),
    Adc(A),
}

impl<B: fmt::Debug, A: fmt::Debug> fmt::Display for SenseError<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenseError::Bus(e) => write!(f, "expander bus error: {:?}", e),
            SenseError::Adc(e) => write!(f, "adc read error: {:?}", e),
        }
    }
}

// ── Gated (expander-switched divider) ───────────────────────────────

pub struct GatedSense<W, A, D> {
    gate: W,
    adc: A,
    delay: D,
    pin: ExpanderPin,
}

impl<W, A, D> GatedSense<W, A, D>
where
    W: RegisterBitWriter,
    A: MillivoltReader,
    D: DelayNs,
{
    pub fn new(gate: W, adc: A, delay: D) -> Self {
        Self::with_pin(gate, adc, delay, GATE_PIN)
    }

    pub fn with_pin(gate: W, adc: A, delay: D, pin: ExpanderPin) -> Self {
        Self {
            gate,
            adc,
            delay,
            pin,
        }
    }

    pub fn try_measure(&mut self) -> Result<BatteryReading, SenseError<W::Error, A::Error>> {
        let sampled = self.sample_gated();
        // disable even when sampling failed, the divider drains the cell
        let off = self.gate.write_pin(self.pin, false);
        let mv = sampled?;
        off.map_err(SenseError::Bus)?;
        Ok(BatteryReading::from_millivolts(mv))
    }

    fn sample_gated(&mut self) -> Result<u16, SenseError<W::Error, A::Error>> {
        self.gate
            .set_pin_mode(self.pin, PinMode::Output)
            .map_err(SenseError::Bus)?;
        self.gate
            .write_pin(self.pin, true)
            .map_err(SenseError::Bus)?;
        self.delay.delay_ms(SETTLE_MS);
        self.adc.read_millivolts().map_err(SenseError::Adc)
    }
}

impl<W, A, D> BatterySense for GatedSense<W, A, D>
where
    W: RegisterBitWriter,
    A: MillivoltReader,
    D: DelayNs,
{
    fn measure(&mut self) -> BatteryReading {
        match self.try_measure() {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("battery: {}", e);
                BatteryReading::UNAVAILABLE
            }
        }
    }
}

// ── Direct (divider always connected) ───────────────────────────────

pub struct DirectSense<A> {
    adc: A,
}

impl<A: MillivoltReader> DirectSense<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }

    pub fn try_measure(&mut self) -> Result<BatteryReading, A::Error> {
        self.adc
            .read_millivolts()
            .map(BatteryReading::from_millivolts)
    }
}

impl<A: MillivoltReader> BatterySense for DirectSense<A> {
    fn measure(&mut self) -> BatteryReading {
        match self.try_measure() {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("battery: adc read error: {:?}", e);
                BatteryReading::UNAVAILABLE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::tests::FakeBus;
    use crate::expander::{Expander, RegisterBit, reg};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Bit(RegisterBit),
        Delay(u32),
        Sample,
    }

    type Trace = Rc<RefCell<Vec<Step>>>;

    struct TraceGate {
        trace: Trace,
        fail_on: Option<usize>,
        calls: usize,
    }

    impl RegisterBitWriter for TraceGate {
        type Error = ();

        fn modify_register_bit(&mut self, rb: RegisterBit) -> Result<(), ()> {
            let call = self.calls;
            self.calls += 1;
            self.trace.borrow_mut().push(Step::Bit(rb));
            if self.fail_on == Some(call) { Err(()) } else { Ok(()) }
        }
    }

    struct TraceAdc {
        trace: Trace,
        mv: Result<u16, ()>,
    }

    impl MillivoltReader for TraceAdc {
        type Error = ();

        fn read_millivolts(&mut self) -> Result<u16, ()> {
            self.trace.borrow_mut().push(Step::Sample);
            self.mv
        }
    }

    struct TraceDelay(Trace);

    impl DelayNs for TraceDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().push(Step::Delay(ns / 1_000_000));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.0.borrow_mut().push(Step::Delay(ms));
        }
    }

    fn traced(mv: Result<u16, ()>, fail_on: Option<usize>) -> (Trace, GatedSense<TraceGate, TraceAdc, TraceDelay>) {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let sense = GatedSense::new(
            TraceGate {
                trace: trace.clone(),
                fail_on,
                calls: 0,
            },
            TraceAdc {
                trace: trace.clone(),
                mv,
            },
            TraceDelay(trace.clone()),
        );
        (trace, sense)
    }

    #[test]
    fn conversion_is_half_scale_times_two() {
        for raw in [0u16, 1, 1850, 1900, 2100, u16::MAX] {
            let v = BatteryReading::from_millivolts(raw).volts();
            let expected = raw as f32 / 1000.0 * 2.0;
            assert!((v - expected).abs() < 1e-6, "raw {} -> {}", raw, v);
        }
        assert!((BatteryReading::from_millivolts(1895).volts() - 3.79).abs() < 1e-5);
    }

    #[test]
    fn gate_sequence_order() {
        let (trace, mut sense) = traced(Ok(1900), None);

        let reading = sense.measure();

        assert!((reading.volts() - 3.8).abs() < 1e-5);
        assert_eq!(
            *trace.borrow(),
            vec![
                Step::Bit(RegisterBit::new(reg::IODIRB, 1, false).unwrap()),
                Step::Bit(RegisterBit::new(reg::GPIOB, 1, true).unwrap()),
                Step::Delay(SETTLE_MS),
                Step::Sample,
                Step::Bit(RegisterBit::new(reg::GPIOB, 1, false).unwrap()),
            ]
        );
    }

    #[test]
    fn adc_failure_still_drives_gate_low() {
        let (trace, mut sense) = traced(Err(()), None);

        assert_eq!(sense.try_measure(), Err(SenseError::Adc(())));
        assert_eq!(
            trace.borrow().last(),
            Some(&Step::Bit(RegisterBit::new(reg::GPIOB, 1, false).unwrap()))
        );
        assert_eq!(sense.measure(), BatteryReading::UNAVAILABLE);
    }

    #[test]
    fn enable_failure_skips_sample_and_disables() {
        // second modify (drive high) fails
        let (trace, mut sense) = traced(Ok(1900), Some(1));

        assert_eq!(sense.try_measure(), Err(SenseError::Bus(())));
        let trace = trace.borrow();
        assert!(!trace.contains(&Step::Sample));
        assert_eq!(
            trace.last(),
            Some(&Step::Bit(RegisterBit::new(reg::GPIOB, 1, false).unwrap()))
        );
    }

    #[test]
    fn pin_left_low_on_real_register_model() {
        struct FixedAdc;
        impl MillivoltReader for FixedAdc {
            type Error = ();
            fn read_millivolts(&mut self) -> Result<u16, ()> {
                Ok(2050)
            }
        }
        struct NoDelay;
        impl DelayNs for NoDelay {
            fn delay_ns(&mut self, _ns: u32) {}
        }

        let mut bus = FakeBus::new();
        bus.regs[reg::GPIOB as usize] = 0b1010_0000;
        let mut sense = GatedSense::new(Expander::new(bus), FixedAdc, NoDelay);

        for _ in 0..3 {
            assert!((sense.measure().volts() - 4.1).abs() < 1e-5);
        }

        let bus = sense.gate.release();
        assert_eq!(bus.regs[reg::GPIOB as usize], 0b1010_0000);
        assert_eq!(bus.regs[reg::IODIRB as usize], 0b1111_1101);
    }

    #[test]
    fn absent_expander_reads_as_no_sensor() {
        struct FixedAdc;
        impl MillivoltReader for FixedAdc {
            type Error = ();
            fn read_millivolts(&mut self) -> Result<u16, ()> {
                Ok(2050)
            }
        }
        struct NoDelay;
        impl DelayNs for NoDelay {
            fn delay_ns(&mut self, _ns: u32) {}
        }

        let mut sense = GatedSense::new(Expander::new(FakeBus::absent()), FixedAdc, NoDelay);
        assert_eq!(sense.measure(), BatteryReading::UNAVAILABLE);
    }

    #[test]
    fn direct_sense_skips_gating() {
        struct FixedAdc(Result<u16, ()>);
        impl MillivoltReader for FixedAdc {
            type Error = ();
            fn read_millivolts(&mut self) -> Result<u16, ()> {
                self.0
            }
        }

        assert!((DirectSense::new(FixedAdc(Ok(1800))).measure().volts() - 3.6).abs() < 1e-5);
        assert_eq!(
            DirectSense::new(FixedAdc(Err(()))).measure(),
            BatteryReading::UNAVAILABLE
        );
    }

    #[test]
    fn percentage_is_linear_and_clamped() {
        assert_eq!(BatteryReading::from_volts(4.3).percentage(), 100);
        assert_eq!(BatteryReading::from_volts(2.9).percentage(), 0);
        assert_eq!(BatteryReading::UNAVAILABLE.percentage(), 0);
        assert_eq!(BatteryReading::from_volts(3.6).percentage(), 50);
    }
}
