// WiFi bring-up with a bounded wait
//
// Station mode: begin, then poll the link every `poll_delay_ms`. Once
// more than `budget_ms` of delay has accumulated without a connection
// the attempt ends in `EnterLowPower`. There is nobody to report a
// failure to on an unattended frame, and spinning the radio against a
// dead network only drains the cell; a fresh boot after the sleep is
// the retry.
//
// The budget is checked before each delay, so it bounds the summed
// delays and not wall time (the polls themselves are not counted).
//
// `ConnectionAttempt` is the pure state machine; `establish_connection`
// drives it against a link and a delay; `connect_or_sleep` is the boot
// path wrapper that performs the sleep and therefore only returns
// connected.

use core::fmt;
use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{RetryPolicy, WifiCredentials};
use crate::power::DeepSleep;

#[allow(async_fn_in_trait)]
pub trait StationLink {
    type Error: fmt::Debug;

    /// Configure credentials and start associating. Must not wait for
    /// the association itself.
    async fn begin(&mut self, creds: &WifiCredentials<'_>) -> Result<(), Self::Error>;

    fn is_connected(&mut self) -> bool;

    fn local_address(&self) -> Option<Ipv4Addr>;
}

#[allow(async_fn_in_trait)]
pub trait AccessPoint {
    type Error: fmt::Debug;

    async fn start(&mut self, ssid: &str) -> Result<(), Self::Error>;

    fn address(&self) -> Option<Ipv4Addr>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    Idle,
    Connecting { attempts: u32 },
    Connected { attempts: u32 },
    SleepFallback { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected { attempts: u32 },
    /// Give up; sleep for `sleep_us` and let the next boot retry.
    EnterLowPower { attempts: u32, sleep_us: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Delay this many milliseconds, then poll again.
    Wait(u32),
    Done(ConnectOutcome),
}

pub struct ConnectionAttempt {
    policy: RetryPolicy,
    state: ConnectState,
}

impl ConnectionAttempt {
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: ConnectState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> ConnectState {
        self.state
    }

    #[inline]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Begin has been issued.
    pub fn start(&mut self) {
        if self.state == ConnectState::Idle {
            self.state = ConnectState::Connecting { attempts: 0 };
        }
    }

    /// Feed one status poll. `Wait` counts as the next attempt, so
    /// the caller must honour it before polling again.
    pub fn on_poll(&mut self, connected: bool) -> Step {
        self.start();
        match self.state {
            ConnectState::Connecting { attempts } => {
                if connected {
                    self.state = ConnectState::Connected { attempts };
                    Step::Done(ConnectOutcome::Connected { attempts })
                } else if self.policy.exhausted(attempts) {
                    self.state = ConnectState::SleepFallback { attempts };
                    Step::Done(ConnectOutcome::EnterLowPower {
                        attempts,
                        sleep_us: self.policy.sleep_us(),
                    })
                } else {
                    self.state = ConnectState::Connecting {
                        attempts: attempts.saturating_add(1),
                    };
                    Step::Wait(self.policy.poll_delay_ms)
                }
            }
            ConnectState::Connected { attempts } => {
                Step::Done(ConnectOutcome::Connected { attempts })
            }
            ConnectState::SleepFallback { attempts } => Step::Done(ConnectOutcome::EnterLowPower {
                attempts,
                sleep_us: self.policy.sleep_us(),
            }),
            ConnectState::Idle => unreachable!(),
        }
    }
}

pub async fn establish_connection<L, D>(
    link: &mut L,
    delay: &mut D,
    creds: &WifiCredentials<'_>,
    policy: &RetryPolicy,
) -> ConnectOutcome
where
    L: StationLink,
    D: DelayNs,
{
    let mut attempt = ConnectionAttempt::new(*policy);

    info!("wifi: connecting to '{}'", creds.ssid);
    // a failed begin just never connects and ends in the sleep fallback
    if let Err(e) = link.begin(creds).await {
        warn!("wifi: begin failed: {:?}", e);
    }
    attempt.start();

    loop {
        match attempt.on_poll(link.is_connected()) {
            Step::Wait(ms) => {
                debug!("wifi: waiting for connection...");
                delay.delay_ms(ms).await;
            }
            Step::Done(outcome) => {
                match outcome {
                    ConnectOutcome::Connected { attempts } => {
                        info!(
                            "wifi: connected after {} ms",
                            attempt.policy().elapsed_ms(attempts)
                        );
                    }
                    ConnectOutcome::EnterLowPower { attempts, sleep_us } => {
                        info!(
                            "wifi: connection failed after {} ms, sleeping {} s",
                            attempt.policy().elapsed_ms(attempts),
                            sleep_us / crate::power::US_PER_SEC
                        );
                    }
                }
                return outcome;
            }
        }
    }
}

/// Boot path: returns only with a live connection.
pub async fn connect_or_sleep<L, D, S>(
    link: &mut L,
    delay: &mut D,
    sleeper: &mut S,
    creds: &WifiCredentials<'_>,
    policy: &RetryPolicy,
) where
    L: StationLink,
    D: DelayNs,
    S: DeepSleep,
{
    match establish_connection(link, delay, creds, policy).await {
        ConnectOutcome::Connected { .. } => {}
        ConnectOutcome::EnterLowPower { sleep_us, .. } => sleeper.sleep_for_us(sleep_us),
    }
}

pub async fn start_access_point<A: AccessPoint>(
    ap: &mut A,
    ssid: &str,
) -> Result<Option<Ipv4Addr>, A::Error> {
    info!("wifi: setting up access point '{}'", ssid);
    ap.start(ssid).await?;
    let addr = ap.address();
    match addr {
        Some(ip) => info!("wifi: access point '{}' up at {}", ssid, ip),
        None => info!("wifi: access point '{}' up, no address yet", ssid),
    }
    Ok(addr)
}
