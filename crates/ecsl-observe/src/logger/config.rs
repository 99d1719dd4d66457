use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat, level::LoggerLevel};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    /// Print the event target (module path) next to each line.
    pub with_targets: bool,
    /// ANSI colors; ignored by the json and journald formats.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Rejects formats this build cannot serve.
    pub fn validate(&self) -> Result<(), LoggerError> {
        if self.format == LoggerFormat::Journald && !cfg!(all(target_os = "linux", feature = "journald")) {
            return Err(LoggerError::JournaldNotSupported);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(LoggerConfig::default().validate().is_ok());
    }

    #[cfg(not(feature = "journald"))]
    #[test]
    fn journald_needs_feature() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Journald,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LoggerError::JournaldNotSupported)));
    }
}
