use std::borrow::Cow;
use std::time::Instant;

/// Logs the elapsed time of a scope when dropped.
pub struct ScopedTimer {
    name: Cow<'static, str>,
    level: log::Level,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            level: log::Level::Info,
            start: Instant::now(),
        }
    }

    /// Per-item timer reported at debug level.
    pub fn debug(name: String) -> Self {
        Self {
            name: Cow::Owned(name),
            level: log::Level::Debug,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::log!(self.level, "{} took {:?}", self.name, self.start.elapsed());
    }
}
