//! Progress sinks for a synchronization run.
//!
//! A [`Watcher`] receives download and application percentages plus a short
//! status line. Two implementations ship with the crate: an interactive
//! terminal display and a plain logging sink. They share the same
//! four-operation contract and nothing else.

pub mod log;
#[cfg(feature = "terminal-ui")]
pub mod terminal;

pub use log::LogWatcher;
#[cfg(feature = "terminal-ui")]
pub use terminal::TerminalWatcher;

/// Progress sink contract.
///
/// Percent setters clamp to 100 and never lower the stored value; calling
/// them repeatedly with the same value is safe. [`end`](Watcher::end) is
/// idempotent.
pub trait Watcher: Send {
    /// Replace the current short status line.
    fn write_status(&mut self, text: &str);

    /// Record a download percentage; returns the stored value.
    fn download_percent(&mut self, pct: u8) -> u8;

    /// The stored download percentage.
    fn current_download(&self) -> u8;

    /// Record an application percentage; returns the stored value.
    fn applied_percent(&mut self, pct: u8) -> u8;

    /// The stored application percentage.
    fn current_applied(&self) -> u8;

    /// Final flush and teardown.
    fn end(&mut self);
}

/// Clamp a raw percentage against the stored one.
///
/// Returns the new stored value: never above 100, never lower than before.
pub(crate) fn advance(stored: u8, pct: u8) -> u8 {
    stored.max(pct.min(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotone() {
        assert_eq!(advance(0, 10), 10);
        assert_eq!(advance(10, 7), 10);
        assert_eq!(advance(10, 10), 10);
        assert_eq!(advance(10, 250), 100);
        assert_eq!(advance(100, 0), 100);
    }
}
