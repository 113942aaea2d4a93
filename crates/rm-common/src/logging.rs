use std::panic;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging knobs read from the environment.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// `RM_LOG_DIR`: write to `<dir>/<service>.log`, rotated daily.
    pub dir: Option<PathBuf>,
    /// `RM_LOG_INCLUDE_BACKTRACE`: also run the default panic hook.
    pub include_backtrace: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            dir: std::env::var_os("RM_LOG_DIR").map(PathBuf::from),
            include_backtrace: std::env::var("RM_LOG_INCLUDE_BACKTRACE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Routes panics through `tracing` so they land in the same sink as the
/// rest of the service logs. Installed once per process.
pub fn install_panic_hook(service: &'static str, settings: &LogSettings) {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    let include_backtrace = settings.include_backtrace;

    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".into());
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            tracing::error!(
                service,
                thread = std::thread::current().name().unwrap_or("unnamed"),
                %location,
                %message,
                "panic"
            );

            if include_backtrace {
                previous(info);
            }
        }));
    });
}

fn file_writer(service: &'static str, dir: &Path) -> Option<BoxMakeWriter> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("cannot create log dir {}: {err}; logging to stdout", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{service}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    Some(BoxMakeWriter::new(writer))
}

/// Installs the global subscriber, filtered by `RUST_LOG` (default `info`).
/// Later calls are no-ops.
pub fn init(service: &'static str, settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let writer = settings
        .dir
        .as_ref()
        .and_then(|dir| file_writer(service, dir));

    match writer {
        Some(writer) => {
            let _ = builder.with_ansi(false).with_writer(writer).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }

    install_panic_hook(service, settings);
}
