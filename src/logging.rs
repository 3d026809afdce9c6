use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;

/// Initialise tracing with a console layer and a daily rolling file layer.
///
/// Keep the returned guard alive for as long as file logging should flush.
/// Calling this twice is harmless; the second registration is ignored.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let file_layer = match std::fs::create_dir_all(&config.directory) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&config.directory, "lifeskills.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            Some((
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_line_number(true)
                    .with_ansi(false),
                guard,
            ))
        }
        Err(e) => {
            eprintln!("log directory {} unavailable: {}", config.directory, e);
            None
        }
    };

    let (file_layer, guard) = match file_layer {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.filter.clone().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .with(file_layer)
        .try_init();

    guard
}
