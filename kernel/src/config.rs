// Boot-time configuration, passed by reference into the routines
// that need it. The firmware builds one `const` instance from
// compile-time constants; tests build as many as they like.

use crate::power::US_PER_SEC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiCredentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryConfig {
    /// Readings strictly below this (and non-zero) raise the warning.
    pub warning_volts: f32,
    /// Print the level on every boot, not only when low.
    pub always_show: bool,
}

impl BatteryConfig {
    pub const DEFAULT: Self = Self {
        warning_volts: 3.8,
        always_show: false,
    };
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Station connect timing: poll every `poll_delay_ms`, give up once
/// more than `budget_ms` of polling delay has accumulated, then sleep
/// for `sleep_secs`. A zero `poll_delay_ms` never accumulates any
/// delay, so it allows the single initial poll and no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub poll_delay_ms: u32,
    pub budget_ms: u32,
    pub sleep_secs: u32,
}

impl RetryPolicy {
    pub const DEFAULT: Self = Self {
        poll_delay_ms: 250,
        budget_ms: 5000,
        sleep_secs: 300,
    };

    #[inline]
    pub const fn elapsed_ms(&self, attempts: u32) -> u64 {
        attempts as u64 * self.poll_delay_ms as u64
    }

    #[inline]
    pub const fn exhausted(&self, attempts: u32) -> bool {
        self.poll_delay_ms == 0 || self.elapsed_ms(attempts) > self.budget_ms as u64
    }

    #[inline]
    pub const fn sleep_us(&self) -> u64 {
        self.sleep_secs as u64 * US_PER_SEC
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConfig<'a> {
    pub wifi: WifiCredentials<'a>,
    /// SSID announced when built as an access point.
    pub access_point_ssid: &'a str,
    pub battery: BatteryConfig,
    pub retry: RetryPolicy,
    /// Deep-sleep interval between refresh cycles once boot work is done.
    pub cycle_sleep_secs: u32,
}

impl<'a> FrameConfig<'a> {
    pub const fn new(wifi: WifiCredentials<'a>) -> Self {
        Self {
            wifi,
            access_point_ssid: "ESP32-Access-Point",
            battery: BatteryConfig::DEFAULT,
            retry: RetryPolicy::DEFAULT,
            cycle_sleep_secs: 300,
        }
    }

    #[inline]
    pub const fn cycle_sleep_us(&self) -> u64 {
        self.cycle_sleep_secs as u64 * US_PER_SEC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_strictly_exceeded() {
        let p = RetryPolicy::DEFAULT;
        assert!(!p.exhausted(0));
        assert!(!p.exhausted(20)); // 5000 ms, not over
        assert!(p.exhausted(21)); // 5250 ms
    }

    #[test]
    fn zero_poll_delay_is_exhausted_at_once() {
        let p = RetryPolicy {
            poll_delay_ms: 0,
            ..RetryPolicy::DEFAULT
        };
        assert!(p.exhausted(0));
        assert!(p.exhausted(u32::MAX));
    }

    #[test]
    fn sleep_converts_to_microseconds() {
        assert_eq!(RetryPolicy::DEFAULT.sleep_us(), 300_000_000);
        let p = RetryPolicy {
            sleep_secs: 7,
            ..RetryPolicy::DEFAULT
        };
        assert_eq!(p.sleep_us(), 7_000_000);
    }

    #[test]
    fn frame_config_defaults_match_boot_cycle() {
        let cfg = FrameConfig::new(WifiCredentials {
            ssid: "frame-net",
            password: "hunter22",
        });
        assert_eq!(cfg.wifi.ssid, "frame-net");
        assert_eq!(cfg.access_point_ssid, "ESP32-Access-Point");
        assert_eq!(cfg.battery, BatteryConfig::DEFAULT);
        assert_eq!(cfg.retry, RetryPolicy::DEFAULT);
        assert_eq!(cfg.cycle_sleep_us(), 300_000_000);
    }
}
