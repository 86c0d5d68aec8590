// WiFi bring-up on esp-radio + embassy-net
//
// Exactly one of the two paths is compiled: station (default) joins
// the configured network through the kernel's bounded connect and
// sleeps on failure; `softap` starts an open access point instead.
//
// No embassy tasks are spawned. The network runner is multiplexed
// with the bring-up future via `select`, as the upload app did.

use alloc::string::String;
use core::net::Ipv4Addr;

use embassy_futures::select::{Either, select};
use embassy_net::StackResources;
use esp_radio::wifi::{ModeConfig, WifiController, WifiError};
use inkframe_kernel::FrameConfig;
use log::{info, warn};

use crate::board::RadioHw;

fn net_seed() -> u64 {
    let rng = esp_hal::rng::Rng::new();
    (rng.random() as u64) << 32 | rng.random() as u64
}

// ── Station ─────────────────────────────────────────────────────────

#[cfg(not(feature = "softap"))]
mod station {
    use super::*;

    use embassy_net::Stack;
    use embassy_time::{Delay, Duration, with_timeout};
    use esp_radio::wifi::ClientConfig;
    use inkframe_kernel::{DeepSleep, StationLink, WifiCredentials, connect_or_sleep};

    const DHCP_TIMEOUT: Duration = Duration::from_secs(10);
    // the retry budget only starts once begin returns
    const START_TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Debug)]
    pub enum StationError {
        Wifi(WifiError),
        StartTimeout,
    }

    impl core::fmt::Display for StationError {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            match self {
                StationError::Wifi(e) => write!(f, "wifi error: {:?}", e),
                StationError::StartTimeout => {
                    write!(f, "radio did not start within {} s", START_TIMEOUT.as_secs())
                }
            }
        }
    }

    impl From<WifiError> for StationError {
        fn from(e: WifiError) -> Self {
            StationError::Wifi(e)
        }
    }

    pub struct WifiStation<'a> {
        ctrl: WifiController<'a>,
        stack: Stack<'a>,
    }

    impl<'a> WifiStation<'a> {
        pub fn new(ctrl: WifiController<'a>, stack: Stack<'a>) -> Self {
            Self { ctrl, stack }
        }
    }

    impl StationLink for WifiStation<'_> {
        type Error = StationError;

        async fn begin(&mut self, creds: &WifiCredentials<'_>) -> Result<(), StationError> {
            let client_cfg = ClientConfig::default()
                .with_ssid(String::from(creds.ssid))
                .with_password(String::from(creds.password));
            self.ctrl.set_config(&ModeConfig::Client(client_cfg))?;
            with_timeout(START_TIMEOUT, self.ctrl.start_async())
                .await
                .map_err(|_| StationError::StartTimeout)??;
            // returns immediately; association is observed via is_connected
            self.ctrl.connect()?;
            Ok(())
        }

        fn is_connected(&mut self) -> bool {
            matches!(self.ctrl.is_connected(), Ok(true))
        }

        fn local_address(&self) -> Option<Ipv4Addr> {
            self.stack.config_v4().map(|cfg| cfg.address.address())
        }
    }

    /// Join the configured network or deep-sleep. Returns connected.
    pub async fn run_station<S: DeepSleep>(radio: RadioHw, sleeper: &mut S, cfg: &FrameConfig<'_>) {
        let radio_ctrl = match esp_radio::init() {
            Ok(r) => r,
            Err(e) => {
                warn!("wifi: radio init failed: {:?}", e);
                sleeper.sleep_for_us(cfg.retry.sleep_us())
            }
        };

        let (ctrl, interfaces) =
            match esp_radio::wifi::new(&radio_ctrl, radio.wifi, Default::default()) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("wifi: wifi::new failed: {:?}", e);
                    sleeper.sleep_for_us(cfg.retry.sleep_us())
                }
            };

        let net_config = embassy_net::Config::dhcpv4(Default::default());
        let mut resources = StackResources::<3>::new();
        let (stack, mut runner) =
            embassy_net::new(interfaces.sta, net_config, &mut resources, net_seed());

        let mut link = WifiStation::new(ctrl, stack);
        let mut delay = Delay;

        match select(
            runner.run(),
            connect_or_sleep(&mut link, &mut delay, sleeper, &cfg.wifi, &cfg.retry),
        )
        .await
        {
            Either::Second(()) => {}
            // runner.run() returns `!`
            _ => unreachable!(),
        }

        match select(runner.run(), with_timeout(DHCP_TIMEOUT, stack.wait_config_up())).await {
            Either::Second(Ok(())) => match link.local_address() {
                Some(ip) => info!("wifi: connected with ip address {}", ip),
                None => info!("wifi: connected, no ipv4 address"),
            },
            Either::Second(Err(_)) => warn!(
                "wifi: no dhcp lease after {} s",
                DHCP_TIMEOUT.as_secs()
            ),
            _ => unreachable!(),
        }
    }
}

#[cfg(not(feature = "softap"))]
pub use station::{StationError, WifiStation, run_station};

// ── Access point ────────────────────────────────────────────────────

#[cfg(feature = "softap")]
mod access_point {
    use super::*;

    use embassy_net::{Ipv4Cidr, StaticConfigV4};
    use embassy_time::Timer;
    use esp_radio::wifi::AccessPointConfig;
    use inkframe_kernel::AccessPoint;
    use inkframe_kernel::net::start_access_point;

    const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

    pub struct WifiAccessPoint<'a> {
        ctrl: WifiController<'a>,
        address: Ipv4Addr,
    }

    impl<'a> WifiAccessPoint<'a> {
        pub fn new(ctrl: WifiController<'a>, address: Ipv4Addr) -> Self {
            Self { ctrl, address }
        }
    }

    impl AccessPoint for WifiAccessPoint<'_> {
        type Error = WifiError;

        async fn start(&mut self, ssid: &str) -> Result<(), WifiError> {
            let ap_cfg = AccessPointConfig::default().with_ssid(String::from(ssid));
            self.ctrl.set_config(&ModeConfig::AccessPoint(ap_cfg))?;
            self.ctrl.start_async().await
        }

        fn address(&self) -> Option<Ipv4Addr> {
            Some(self.address)
        }
    }

    /// Host the configured access point until power-off.
    pub async fn run_access_point(radio: RadioHw, cfg: &FrameConfig<'_>) -> ! {
        let radio_ctrl = match esp_radio::init() {
            Ok(r) => r,
            Err(e) => {
                warn!("wifi: radio init failed: {:?}", e);
                idle_forever().await
            }
        };

        let (ctrl, interfaces) =
            match esp_radio::wifi::new(&radio_ctrl, radio.wifi, Default::default()) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("wifi: wifi::new failed: {:?}", e);
                    idle_forever().await
                }
            };

        let net_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
            address: Ipv4Cidr::new(AP_ADDRESS, 24),
            gateway: Some(AP_ADDRESS),
            dns_servers: Default::default(),
        });
        let mut resources = StackResources::<3>::new();
        let (_stack, mut runner) =
            embassy_net::new(interfaces.ap, net_config, &mut resources, net_seed());

        let mut ap = WifiAccessPoint::new(ctrl, AP_ADDRESS);
        if let Err(e) = start_access_point(&mut ap, cfg.access_point_ssid).await {
            warn!("wifi: access point start failed: {:?}", e);
            idle_forever().await
        }

        info!("wifi: serving network stack");
        runner.run().await
    }

    async fn idle_forever() -> ! {
        loop {
            Timer::after_secs(60).await;
        }
    }
}

#[cfg(feature = "softap")]
pub use access_point::{WifiAccessPoint, run_access_point};
