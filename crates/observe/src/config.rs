use tracing::Level;

/// How log events are filtered and rendered.
#[derive(Debug, Clone)]
pub struct Config {
    /// Filter directives, see
    /// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
    pub(crate) filter: String,
    /// Events at or above this level go to stderr, everything else to stdout.
    pub(crate) stderr_threshold: Level,
    pub(crate) json: bool,
}

impl Config {
    pub fn new(filter: &str, stderr_threshold: Option<Level>, json: bool) -> Self {
        Self {
            filter: filter.to_owned(),
            stderr_threshold: stderr_threshold.unwrap_or(Level::ERROR),
            json,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("info", None, false)
    }
}
