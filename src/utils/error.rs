use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("No server configuration specified")]
    MissingServer,

    #[error("{field} is required: {hint}")]
    MissingField { field: String, hint: String },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Invalid value for parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Robot responded with HTTP {status}: {body}")]
    HttpStatus {
        status: u16,
        body: serde_json::Value,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Transport,
    Robot,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 程序退出碼，失敗一律非零
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl FlowError {
    pub fn missing_field(field: impl Into<String>, hint: impl Into<String>) -> Self {
        FlowError::MissingField {
            field: field.into(),
            hint: hint.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FlowError::MissingServer
            | FlowError::UnknownNode(_)
            | FlowError::ConfigError { .. }
            | FlowError::ConfigValidationError { .. }
            | FlowError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            FlowError::MissingField { .. }
            | FlowError::UnknownAction(_)
            | FlowError::InvalidParameter { .. } => ErrorCategory::Validation,
            FlowError::ApiError(_) => ErrorCategory::Transport,
            FlowError::HttpStatus { .. } => ErrorCategory::Robot,
            FlowError::IoError(_) | FlowError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Robot => match self {
                FlowError::HttpStatus { status, .. } if *status >= 500 => ErrorSeverity::Medium,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            FlowError::MissingServer => {
                "The node has no robot server configured".to_string()
            }
            FlowError::MissingField { field, .. } => format!("Missing required value: {}", field),
            FlowError::UnknownAction(action) => format!("'{}' is not a supported action", action),
            FlowError::UnknownNode(id) => format!("No node with id '{}' in this flow", id),
            FlowError::InvalidParameter { param, .. } => {
                format!("Parameter '{}' has an invalid value", param)
            }
            FlowError::ApiError(_) => "Could not reach the robot".to_string(),
            FlowError::HttpStatus { status, .. } => {
                format!("The robot rejected the request (HTTP {})", status)
            }
            FlowError::IoError(_) => "A file could not be read".to_string(),
            FlowError::SerializationError(_) => "Invalid JSON input".to_string(),
            FlowError::ConfigError { .. }
            | FlowError::ConfigValidationError { .. }
            | FlowError::InvalidConfigValueError { .. } => {
                format!("Invalid flow configuration: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            FlowError::MissingServer => {
                "Set `server` on the node to the name of a [[servers]] entry".to_string()
            }
            FlowError::MissingField { hint, .. } => hint.clone(),
            FlowError::UnknownAction(_) => {
                "Use one of create, get, list, delete, current or analyze as the node allows"
                    .to_string()
            }
            FlowError::UnknownNode(_) => "Check the node ids passed with --nodes".to_string(),
            FlowError::InvalidParameter { .. } => {
                "Pass numbers as numbers or numeric strings and JSON text as valid JSON"
                    .to_string()
            }
            FlowError::ApiError(_) => {
                "Check the robot hostname, port and network connectivity".to_string()
            }
            FlowError::HttpStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check the server token".to_string()
            }
            FlowError::HttpStatus { status, .. } if *status == 404 => {
                "The run, protocol or resource no longer exists on the robot".to_string()
            }
            FlowError::HttpStatus { .. } => "Inspect the response body for details".to_string(),
            FlowError::IoError(_) => "Check the file path and permissions".to_string(),
            FlowError::SerializationError(_) => "Check the event JSON syntax".to_string(),
            FlowError::ConfigError { .. }
            | FlowError::ConfigValidationError { .. }
            | FlowError::InvalidConfigValueError { .. } => {
                "Fix the flow TOML file and run again".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(FlowError::MissingServer.category(), ErrorCategory::Configuration);
        assert_eq!(
            FlowError::missing_field("runId", "create a run first").category(),
            ErrorCategory::Validation
        );
        let http = FlowError::HttpStatus {
            status: 409,
            body: serde_json::json!({"errors": []}),
        };
        assert_eq!(http.category(), ErrorCategory::Robot);
        assert_eq!(http.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_missing_field_message_and_hint() {
        let err = FlowError::missing_field("runId", "pass msg.runId");
        assert_eq!(err.to_string(), "runId is required: pass msg.runId");
        assert_eq!(err.recovery_suggestion(), "pass msg.runId");
    }

    #[test]
    fn test_server_errors_are_retryable_severity() {
        let err = FlowError::HttpStatus {
            status: 503,
            body: serde_json::Value::Null,
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_every_severity_exits_non_zero() {
        for severity in [
            ErrorSeverity::Low,
            ErrorSeverity::Medium,
            ErrorSeverity::High,
            ErrorSeverity::Critical,
        ] {
            assert_ne!(severity.exit_code(), 0);
        }
        assert_eq!(FlowError::MissingServer.severity().exit_code(), 1);
    }
}
