use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{file}:{line}:{column}: {message}")]
    SyntaxError {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("cannot resolve include \"{include}\" (referenced from {from})")]
    IncludeError { include: String, from: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Syntax,
    Processing,
    Io,
    Serialization,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::IoError(_) | ScanError::IncludeError { .. } => ErrorCategory::Io,
            ScanError::SerializationError(_) | ScanError::TomlError(_) => {
                ErrorCategory::Serialization
            }
            ScanError::SyntaxError { .. } => ErrorCategory::Syntax,
            ScanError::ConfigError { .. }
            | ScanError::MissingConfigError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::ValidationError { .. } => ErrorCategory::Configuration,
            ScanError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ScanError::IoError(_) => ErrorSeverity::Critical,
            ScanError::SerializationError(_) => ErrorSeverity::High,
            ScanError::TomlError(_) => ErrorSeverity::High,
            ScanError::SyntaxError { .. } => ErrorSeverity::High,
            ScanError::IncludeError { .. } => ErrorSeverity::High,
            ScanError::ConfigError { .. }
            | ScanError::MissingConfigError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::ValidationError { .. } => ErrorSeverity::Medium,
            ScanError::ProcessingError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ScanError::IoError(_) => {
                "Check that the scan root, headers and output path exist and are accessible"
                    .to_string()
            }
            ScanError::SerializationError(_) => {
                "The manifest could not be rendered; re-run with --verbose and report the entity that failed".to_string()
            }
            ScanError::TomlError(_) => {
                "Fix the TOML syntax in the configuration file".to_string()
            }
            ScanError::SyntaxError { file, .. } => {
                format!("Fix the declaration syntax in {} or exclude the header from the scan", file)
            }
            ScanError::IncludeError { include, .. } => format!(
                "Add the directory containing \"{}\" to include_paths",
                include
            ),
            ScanError::ConfigError { .. } | ScanError::ValidationError { .. } => {
                "Review the configuration values and correct the reported field".to_string()
            }
            ScanError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            ScanError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            ScanError::ProcessingError { .. } => {
                "Re-run with --verbose to see which entity failed to convert".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::IoError(e) => format!("File access failed: {}", e),
            ScanError::SerializationError(e) => format!("Could not write the manifest: {}", e),
            ScanError::TomlError(e) => format!("Configuration file is not valid TOML: {}", e),
            ScanError::SyntaxError {
                file,
                line,
                column,
                message,
            } => format!("Header parse error at {}:{}:{}: {}", file, line, column, message),
            ScanError::IncludeError { include, from } => {
                format!("Included header \"{}\" (from {}) was not found", include, from)
            }
            ScanError::ConfigError { message } => format!("Configuration problem: {}", message),
            ScanError::MissingConfigError { field } => {
                format!("Configuration is missing '{}'", field)
            }
            ScanError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("'{}' is not a valid value for {}: {}", value, field, reason),
            ScanError::ValidationError { message } => format!("Invalid configuration: {}", message),
            ScanError::ProcessingError { message } => {
                format!("Scan could not be completed: {}", message)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_location() {
        let err = ScanError::SyntaxError {
            file: "src/service/Service.h".to_string(),
            line: 12,
            column: 5,
            message: "expected ';'".to_string(),
        };
        assert_eq!(err.to_string(), "src/service/Service.h:12:5: expected ';'");
        assert_eq!(err.category(), ErrorCategory::Syntax);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn config_errors_are_medium_severity() {
        let err = ScanError::MissingConfigError {
            field: "headers".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("headers"));
    }
}
