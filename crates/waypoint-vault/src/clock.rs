use jiff::Timestamp;

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
