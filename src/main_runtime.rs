use maverick::adapters::SqliteStore;
use maverick::config::{AppConfig, LoggingConfig};
use maverick::error::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Open the configured store and bring its schema up to date
pub async fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    let store = SqliteStore::connect(&config.database.url, config.database.max_connections).await?;
    store.migrate().await?;
    info!("Store ready at {}", config.database.url);
    Ok(store)
}

pub fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    // Console stays quiet unless RUST_LOG or logging.level asks for more
    let console_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", logging.level)))
    };

    // File logging only when MAVERICK_LOG_DIR is set and writable
    let log_dir = std::env::var("MAVERICK_LOG_DIR").ok();

    // `tracing_appender::rolling::daily` panics if it cannot create the initial
    // log file, so writability is checked first.
    let file_layer = log_dir.as_deref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: Could not create log directory {} ({}), file logging disabled", dir, e);
            return None;
        }
        let test_path = std::path::Path::new(dir).join(".maverick_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(dir, "maverick.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Flushes on drop; the process is short-lived so it lives until exit
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_filter(EnvFilter::new("info,maverick=debug,sqlx=warn")),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    dir, e
                );
                None
            }
        }
    });

    // Logs go to stderr so stdout stays clean for JSON output
    let console_text = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(console_filter())
    });
    let console_json = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(console_filter())
    });

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(console_text)
        .with(console_json)
        .with(file_layer)
        .init();

    if let (true, Some(dir)) = (file_logging_enabled, log_dir) {
        eprintln!("Logging to: {}/maverick.log", dir);
    }
}

pub fn init_logging_simple() {
    // Minimal logging for pure calculations
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
