//! This module provides observability for launches and compaction passes.
//!
//! Two tools live here. The `log_metric!` macro emits a structured key-value
//! metric line in debug builds only, so release builds pay nothing for it.
//! `enable_verbose_logging` installs an `env_logger` backend for the `log`
//! facade used throughout the crate.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

/// Logs a structured key-value metric line at `Debug` level, only in debug builds.
///
/// # Example
/// ```
/// use warpack::log_metric;
/// let blocks = 4;
/// log_metric!("event"="copy_if", "phase"="count", "blocks"=&blocks);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            let output = format!("WARPACK_METRIC: {{ {} }}", parts.join(", "));
            $crate::__log::debug!("{}", output);
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Turns on logging for the whole crate.
///
/// The level defaults to `Debug`, so per-launch records and `log_metric!`
/// lines are shown; `RUST_LOG` overrides it. Only the first call has an
/// effect. When `log_file` is given, records are appended to that file
/// instead of stderr.
pub fn enable_verbose_logging(log_file: Option<&str>) -> std::io::Result<()> {
    let target = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);
        builder.parse_default_env();

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = target {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
