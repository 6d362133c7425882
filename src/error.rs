use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobLogError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Sheets error: {0}")]
    Sheets(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for JobLogError {
    fn from(err: std::io::Error) -> Self {
        JobLogError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for JobLogError {
    fn from(err: serde_json::Error) -> Self {
        JobLogError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for JobLogError {
    fn from(err: toml::de::Error) -> Self {
        JobLogError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for JobLogError {
    fn from(err: reqwest::Error) -> Self {
        JobLogError::Sheets(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for JobLogError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        JobLogError::Auth(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_display() {
        let err = JobLogError::Io("disk full".to_string());
        assert_eq!(err.to_string(), "I/O error: disk full");
    }

    #[test]
    fn test_sheets_display() {
        let err = JobLogError::Sheets("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Sheets error: quota exceeded");
    }

    #[test]
    fn test_not_found_display() {
        let err = JobLogError::NotFound("Spreadsheet 'Job log'".to_string());
        assert_eq!(err.to_string(), "Not found: Spreadsheet 'Job log'");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: JobLogError = io_err.into();
        match err {
            JobLogError::Io(msg) => assert!(msg.contains("read-only")),
            other => panic!("Expected Io, got: {:?}", other),
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: JobLogError = json_err.into();
        assert!(matches!(err, JobLogError::Json(_)));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: JobLogError = toml_err.into();
        assert!(matches!(err, JobLogError::Config(_)));
    }
}
