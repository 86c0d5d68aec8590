// inkframe entry point
//
// Boot sequence: logger -> heap -> scheduler -> hardware -> battery
// check -> status band -> WiFi -> deep sleep.
//
// Every boot is one cycle. Nothing survives the sleep; the timer
// wake is a full reset and starts here again. The station path only
// continues past WiFi bring-up when connected, otherwise it has
// already gone to sleep for the fallback interval.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::{info, warn};

use inkframe::board::{Board, PANEL_HEIGHT, PANEL_WIDTH};
use inkframe::config::CONFIG;
use inkframe::net;
#[cfg(not(feature = "softap"))]
use inkframe_kernel::DeepSleep;
use inkframe_kernel::alert::{STATUS_LINE_OFFSET, report_battery};
use inkframe_kernel::band::{StatusBand, band_bytes};
use inkframe_kernel::battery::BatterySense;
use inkframe_kernel::console::StatusConsole;

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

const HEAP_SIZE: usize = 96 * 1024;

// bottom status band only; the panel driver owns the rest of the frame
// and receives the band through `StatusSink`
const STATUS_BAND_BYTES: usize = band_bytes(PANEL_WIDTH, STATUS_LINE_OFFSET);

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    // esp-radio requires an allocator
    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    info!("booting...");

    let timg0 = TimerGroup::new(unsafe { peripherals.TIMG0.clone_unchecked() });
    esp_rtos::start(timg0.timer0);
    info!("scheduler started.");

    let Board {
        battery,
        radio,
        mut panel,
        power,
    } = Board::init(peripherals);
    info!("hardware initialized.");

    let reading = battery.into_sensor().measure();

    let mut band_buf = alloc::vec![0u8; STATUS_BAND_BYTES];
    let mut band = StatusBand::new(&mut band_buf, PANEL_WIDTH, PANEL_HEIGHT, STATUS_LINE_OFFSET);
    if let Some(alert) = report_battery(&mut StatusConsole::new(&mut band), reading, &CONFIG.battery) {
        info!("status line rendered: {}", alert);
        match band.present(&mut panel) {
            Ok(()) => info!("status band pushed at y={}", band.top()),
            Err(e) => warn!("status band not pushed: {:?}", e),
        }
    }

    #[cfg(not(feature = "softap"))]
    {
        let mut power = power;
        net::run_station(radio, &mut power, &CONFIG).await;
        info!("boot cycle done.");
        power.sleep_for_us(CONFIG.cycle_sleep_us())
    }

    #[cfg(feature = "softap")]
    {
        // host mode stays up; no sleep cycle
        drop(power);
        net::run_access_point(radio, &CONFIG).await
    }
}
