use std::backtrace::Backtrace;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Install the fmt subscriber. `RUST_LOG` wins over the environment default.
pub fn init(config: &AppConfig) {
    let default_level = if config.is_development() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper=info,mongodb=info")));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Route panics through tracing with the location and a captured backtrace
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        tracing::error!(
            panic = %message,
            location = %location,
            backtrace = %Backtrace::force_capture(),
            "panic"
        );
    }));
}
