use std::path::Path;

use flexi_logger::{
    detailed_format, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger,
    LoggerHandle, Naming, WriteMode,
};

pub const LOG_FILE_BASENAME: &str = "taskpad";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 5;

/// Log files live next to the stored task data.
pub fn log_directory(data_dir: &Path) -> &Path {
    data_dir
}

/// Starts file logging. The returned handle must outlive all logging.
pub fn init_logging(data_dir: &Path, spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    std::fs::create_dir_all(data_dir)?;

    let handle = Logger::try_with_str(spec)?
        .log_to_file(
            FileSpec::default()
                .directory(log_directory(data_dir))
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        // Short-lived process: write through so nothing is lost on exit.
        .write_mode(WriteMode::Direct)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .start()?;

    install_panic_hook();

    log::info!(
        "logger initialized dir={} rotate_size_bytes={} keep_files={}",
        log_directory(data_dir).display(),
        LOG_ROTATE_SIZE_BYTES,
        LOG_ROTATE_KEEP_FILES
    );
    Ok(handle)
}

fn panic_message(info: &std::panic::PanicHookInfo<'_>) -> String {
    let message = info
        .payload()
        .downcast_ref::<&str>()
        .map(|text| text.to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<opaque panic>".to_string());
    match info.location() {
        Some(at) => format!("{message} at {}:{}", at.file(), at.line()),
        None => message,
    }
}

// Pending snapshot writes may be lost when the process panics; the log keeps the reason.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let thread = std::thread::current();
        log::error!(
            "taskpad panicked thread={} args={:?}: {}\n{}",
            thread.name().unwrap_or("unnamed"),
            std::env::args().skip(1).collect::<Vec<_>>(),
            panic_message(info),
            std::backtrace::Backtrace::force_capture()
        );
        previous(info);
    }));
}
