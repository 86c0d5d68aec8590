// Hardware-independent core of inkframe
//
// Everything here talks to the board through embedded-hal traits or
// the small collaborator traits declared next to their users, so the
// same code runs on the ESP32 and under `cargo test` on the host.

#![cfg_attr(not(test), no_std)]

pub mod alert;
pub mod band;
pub mod battery;
pub mod config;
pub mod console;
pub mod expander;
pub mod net;
pub mod power;

pub use alert::{BatteryAlert, TextDisplay, report_battery};
pub use band::{StatusBand, StatusSink};
pub use battery::{BatteryReading, BatterySense, DirectSense, GatedSense, MillivoltReader};
pub use config::{BatteryConfig, FrameConfig, RetryPolicy, WifiCredentials};
pub use expander::{Expander, ExpanderPin, RegisterBit, RegisterBitWriter, SharedExpander};
pub use net::{AccessPoint, ConnectOutcome, StationLink, connect_or_sleep, establish_connection};
pub use power::DeepSleep;
