use time::OffsetDateTime;

/// Wall-clock source for record timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// UTC system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}
