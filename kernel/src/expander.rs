// MCP23017 I/O expander, single-bit register access
//
// Only what battery gating needs: flip one bit of one 8-bit register
// by read-modify-write. Three separate bus transfers, so the register
// must not be touched by anyone else in between. `Expander` gets that
// from `&mut self`; `SharedExpander` holds a blocking mutex across
// the whole sequence for boards that share the bus between contexts.
//
// Register map assumes IOCON.BANK = 0 (power-on default).

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::i2c::I2c;

/// 7-bit bus address with A2..A0 strapped low.
pub const EXPANDER_ADDR: u8 = 0x20;

pub mod reg {
    pub const IODIRA: u8 = 0x00;
    pub const IODIRB: u8 = 0x01;
    pub const GPIOA: u8 = 0x12;
    pub const GPIOB: u8 = 0x13;
}

/// One bit of one register, and the value it should end up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBit {
    register: u8,
    bit: u8,
    state: bool,
}

impl RegisterBit {
    /// `None` unless `bit` is 0..=7.
    pub const fn new(register: u8, bit: u8, state: bool) -> Option<Self> {
        if bit < 8 {
            Some(Self {
                register,
                bit,
                state,
            })
        } else {
            None
        }
    }

    #[inline]
    pub const fn register(&self) -> u8 {
        self.register
    }

    #[inline]
    pub const fn bit(&self) -> u8 {
        self.bit
    }

    #[inline]
    pub const fn state(&self) -> bool {
        self.state
    }

    /// Replace `self.bit` in `value`, keep every other bit.
    #[inline]
    pub const fn apply(&self, value: u8) -> u8 {
        let mask = 1u8 << self.bit;
        if self.state { value | mask } else { value & !mask }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
}

impl PinMode {
    // IODIR: 0 = output, 1 = input
    #[inline]
    const fn direction_bit(self) -> bool {
        matches!(self, PinMode::Input)
    }
}

/// Expander pin number, 0..=7 on port A, 8..=15 on port B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderPin(u8);

impl ExpanderPin {
    pub const fn new(pin: u8) -> Option<Self> {
        if pin < 16 { Some(Self(pin)) } else { None }
    }

    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    #[inline]
    const fn bit(self) -> u8 {
        self.0 & 0x07
    }

    #[inline]
    const fn port_b(self) -> bool {
        self.0 >= 8
    }

    pub const fn direction(self, mode: PinMode) -> RegisterBit {
        let register = if self.port_b() { reg::IODIRB } else { reg::IODIRA };
        RegisterBit {
            register,
            bit: self.bit(),
            state: mode.direction_bit(),
        }
    }

    pub const fn level(self, high: bool) -> RegisterBit {
        let register = if self.port_b() { reg::GPIOB } else { reg::GPIOA };
        RegisterBit {
            register,
            bit: self.bit(),
            state: high,
        }
    }
}

/// Anything that can apply a `RegisterBit` to the expander.
pub trait RegisterBitWriter {
    type Error: core::fmt::Debug;

    fn modify_register_bit(&mut self, rb: RegisterBit) -> Result<(), Self::Error>;

    fn set_pin_mode(&mut self, pin: ExpanderPin, mode: PinMode) -> Result<(), Self::Error> {
        self.modify_register_bit(pin.direction(mode))
    }

    fn write_pin(&mut self, pin: ExpanderPin, high: bool) -> Result<(), Self::Error> {
        self.modify_register_bit(pin.level(high))
    }
}

pub struct Expander<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Expander<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, EXPANDER_ADDR)
    }

    pub fn with_address(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut value = [0u8; 1];
        self.i2c.write(self.addr, &[register])?;
        self.i2c.read(self.addr, &mut value)?;
        Ok(value[0])
    }
}

impl<I2C: I2c> RegisterBitWriter for Expander<I2C> {
    type Error = I2C::Error;

    fn modify_register_bit(&mut self, rb: RegisterBit) -> Result<(), Self::Error> {
        let old = self.read_register(rb.register)?;
        let new = rb.apply(old);
        log::trace!(
            "expander {:#04x}: reg {:#04x} {:#010b} -> {:#010b}",
            self.addr,
            rb.register,
            old,
            new
        );
        self.i2c.write(self.addr, &[rb.register, new])
    }
}

/// Expander behind a blocking mutex; the lock spans the full
/// read-modify-write, not the individual transfers.
pub struct SharedExpander<M: RawMutex, I2C> {
    inner: Mutex<M, RefCell<Expander<I2C>>>,
}

impl<M: RawMutex, I2C: I2c> SharedExpander<M, I2C> {
    pub const fn new(expander: Expander<I2C>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(expander)),
        }
    }

    pub fn lock<R>(&self, f: impl FnOnce(&mut Expander<I2C>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<M: RawMutex, I2C: I2c> RegisterBitWriter for &SharedExpander<M, I2C> {
    type Error = I2C::Error;

    fn modify_register_bit(&mut self, rb: RegisterBit) -> Result<(), Self::Error> {
        self.lock(|exp| exp.modify_register_bit(rb))
    }
}
