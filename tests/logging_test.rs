//! Installs the global subscriber, so it lives in its own test binary.

use creative_insights::logger::{self, LogLevel};

#[test]
fn test_second_init_is_error_not_panic() {
    assert!(logger::init(LogLevel::Warn).is_ok());
    assert!(logger::init(LogLevel::Info).is_err());
}
