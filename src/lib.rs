// Firmware for an Inkplate-class ESP32 e-ink frame

#![no_std]

extern crate alloc;

pub mod board;
pub mod config;
pub mod net;
