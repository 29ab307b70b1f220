use crate::utils::error::{FlowError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(FlowError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => {
            if url.host_str().map(str::is_empty).unwrap_or(true) {
                return Err(FlowError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: "URL has no host".to_string(),
                });
            }
            match url.scheme() {
                "http" | "https" => Ok(()),
                scheme => Err(FlowError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: format!("Unsupported URL scheme: {}", scheme),
                }),
            }
        }
        Err(e) => Err(FlowError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_port(field_name: &str, port: u16) -> Result<()> {
    if port == 0 {
        return Err(FlowError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: port.to_string(),
            reason: "Port must be between 1 and 65535".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FlowError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 檢查名稱不重複，回傳第一個重複的值
pub fn validate_unique<'a, I>(field_name: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(FlowError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.to_string(),
                reason: "Duplicate value".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("servers.base_url", "http://10.0.0.12:31950").is_ok());
        assert!(validate_url("servers.base_url", "https://robot.local:31950").is_ok());
        assert!(validate_url("servers.base_url", "").is_err());
        assert!(validate_url("servers.base_url", "invalid-url").is_err());
        assert!(validate_url("servers.base_url", "ftp://robot.local").is_err());
    }

    #[test]
    fn test_validate_port() {
        assert!(validate_port("servers.port", 31950).is_ok());
        assert!(validate_port("servers.port", 0).is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("nodes.id", ["a", "b", "c"]).is_ok());
        let err = validate_unique("nodes.id", ["a", "b", "a"]).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("servers.hostname", "ot2.local").is_ok());
        assert!(validate_non_empty_string("servers.hostname", "   ").is_err());
    }
}
