use log::{info, log_enabled, Level};

/// Log to console when the `info` level is enabled.
pub fn log(message: &'static str, data: impl AsRef<str>) {
    if log_enabled!(Level::Info) {
        info!("{message} - {}", data.as_ref());
    }
}
