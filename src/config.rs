// Build-time configuration
//
// ┌────────────────────────────────────────────────────────────┐
// │  SET WIFI_SSID / WIFI_PASSWORD IN THE BUILD ENVIRONMENT    │
// └────────────────────────────────────────────────────────────┘
//
// Everything else is a constant here. Station vs access point and
// gated vs direct battery sensing are cargo features.

use inkframe_kernel::{BatteryConfig, FrameConfig, WifiCredentials};

const SSID: &str = match option_env!("WIFI_SSID") {
    Some(ssid) => ssid,
    None => "<ADD SSID HERE>",
};

const PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(password) => password,
    None => "<ADD AP PASSWORD HERE>",
};

// 3.6 V on boards with the newer cell, 3.8 V otherwise
const BATTERY_WARNING_VOLTS: f32 = 3.8;
const ALWAYS_SHOW_BATTERY: bool = false;

// retry timing, AP name and cycle sleep keep the kernel defaults
pub const CONFIG: FrameConfig<'static> = FrameConfig {
    battery: BatteryConfig {
        warning_volts: BATTERY_WARNING_VOLTS,
        always_show: ALWAYS_SHOW_BATTERY,
    },
    ..FrameConfig::new(WifiCredentials {
        ssid: SSID,
        password: PASSWORD,
    })
};
