//! Time utilities for pairlink

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in milliseconds.
///
/// A clock set before the Unix epoch reads as 0.
///
/// # Examples
/// ```
/// use pl_core::time::current_time_millis;
///
/// assert!(current_time_millis() > 0);
/// ```
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_current_time_millis_advances() {
        let before = current_time_millis();
        std::thread::sleep(Duration::from_millis(5));
        assert!(current_time_millis() >= before + 5);
    }
}
