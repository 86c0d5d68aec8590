// Deep sleep: the only way this firmware stops running.
// Wake-up is a full reset, so `sleep_for_us` never returns.

pub const US_PER_SEC: u64 = 1_000_000;

pub trait DeepSleep {
    fn sleep_for_us(&mut self, us: u64) -> !;
}
