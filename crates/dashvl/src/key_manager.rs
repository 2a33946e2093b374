use std::env;

#[cfg(test)]
use mockall::automock;

use crate::errors::{ClientError, Result};

pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";

#[cfg_attr(test, automock)]
pub trait Environment: Send + Sync {
    fn get_var(&self, key: &str) -> std::result::Result<String, env::VarError>;
}

/// Reads from the process environment.
pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get_var(&self, key: &str) -> std::result::Result<String, env::VarError> {
        env::var(key)
    }
}

/// Resolve the API key, preferring an explicitly supplied value over `env_name`.
///
/// Blank values count as missing.
pub fn get_api_key(
    explicit: Option<&str>,
    env_name: &str,
    environment: &(impl Environment + ?Sized),
) -> Result<String> {
    if let Some(key) = explicit.map(str::trim).filter(|key| !key.is_empty()) {
        return Ok(key.to_string());
    }

    match environment.get_var(env_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ClientError::Configuration(format!(
            "No API key configured: pass one explicitly or set {}",
            env_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_wins() {
        let mut env = MockEnvironment::new();
        env.expect_get_var().never();

        let key = get_api_key(Some("sk-explicit"), API_KEY_ENV, &env).unwrap();
        assert_eq!(key, "sk-explicit");
    }

    #[test]
    fn test_falls_back_to_environment() {
        let mut env = MockEnvironment::new();
        env.expect_get_var()
            .withf(|key| key == API_KEY_ENV)
            .times(1)
            .returning(|_| Ok("sk-from-env\n".to_string()));

        let key = get_api_key(None, API_KEY_ENV, &env).unwrap();
        assert_eq!(key, "sk-from-env");
    }

    #[test]
    fn test_blank_explicit_key_is_ignored() {
        let mut env = MockEnvironment::new();
        env.expect_get_var()
            .times(1)
            .returning(|_| Ok("sk-from-env".to_string()));

        let key = get_api_key(Some("   "), API_KEY_ENV, &env).unwrap();
        assert_eq!(key, "sk-from-env");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let mut env = MockEnvironment::new();
        env.expect_get_var()
            .times(1)
            .returning(|_| Err(env::VarError::NotPresent));

        let err = get_api_key(None, API_KEY_ENV, &env).unwrap_err();
        match err {
            ClientError::Configuration(message) => assert!(message.contains(API_KEY_ENV)),
            other => panic!("Expected configuration error, got {other:?}"),
        }
    }
}
