//! Logging setup.
//!
//! The crate logs through `tracing`. Applications embedding it can install
//! their own subscriber, or call [`init_tracing`] for a formatted one.

use crate::errors::PipestepError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set. Fails if a
/// global subscriber is already installed.
pub fn init_tracing(default_level: Level) -> Result<(), PipestepError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| PipestepError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // the first call may lose to another test's subscriber; the second never succeeds
        let _ = init_tracing(Level::DEBUG);
        let err = init_tracing(Level::DEBUG).unwrap_err();
        assert!(matches!(err, PipestepError::Logging(_)));
    }
}
