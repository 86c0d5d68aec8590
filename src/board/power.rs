// RTC timer deep sleep. Wake-up is a full reset.

use core::time::Duration as CoreDuration;

use esp_hal::delay::Delay;
use esp_hal::rtc_cntl::{Rtc, sleep::TimerWakeupSource};
use inkframe_kernel::DeepSleep;
use inkframe_kernel::power::US_PER_SEC;
use log::info;

pub struct RtcSleep {
    rtc: Rtc<'static>,
    delay: Delay,
}

impl RtcSleep {
    pub fn new(rtc: Rtc<'static>, delay: Delay) -> Self {
        Self { rtc, delay }
    }
}

impl DeepSleep for RtcSleep {
    fn sleep_for_us(&mut self, us: u64) -> ! {
        info!("entering deep sleep for {} s", us / US_PER_SEC);
        let timer = TimerWakeupSource::new(CoreDuration::from_micros(us));
        // let serial output drain first
        self.delay.delay_millis(100);
        self.rtc.sleep_deep(&[&timer])
    }
}
