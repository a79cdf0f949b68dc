use env_logger::Env;

pub const LOG_FILTER_ENV: &str = "FUND_LOG";
pub const LOG_STYLE_ENV: &str = "FUND_LOG_STYLE";

/// Install the process-wide logger. Diagnostics go to stderr so command
/// output on stdout stays machine-readable.
pub fn init() {
    let env = Env::new()
        .filter_or(LOG_FILTER_ENV, "warn")
        .write_style(LOG_STYLE_ENV);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
