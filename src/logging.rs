use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directive that silences engine-internal debug events
const QUIET_ENGINE: &str = "bank_ledger::transfer::engine=info,bank_ledger::store=info";

fn filter_directives(config: &AppConfig) -> String {
    if config.enable_tracing {
        config.log_level.clone()
    } else {
        format!("{},{}", config.log_level, QUIET_ENGINE)
    }
}

/// Install the global subscriber; keep the guard alive until shutdown
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enable_tracing: bool) -> AppConfig {
        AppConfig {
            log_level: "debug".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "ledger.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            enable_tracing,
            postgres_url: None,
            database: Default::default(),
        }
    }

    #[test]
    fn test_engine_debug_silenced_unless_tracing() {
        assert_eq!(filter_directives(&config(true)), "debug");

        let quiet = filter_directives(&config(false));
        assert!(quiet.starts_with("debug,"));
        assert!(quiet.contains("bank_ledger::transfer::engine=info"));
        assert!(EnvFilter::try_new(&quiet).is_ok());
    }
}
