use std::collections::HashMap;
use std::env;

use secrecy::SecretString;
use service_core::config as core_config;
use service_core::error::AppError;

use crate::models::Service;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    /// Operator-configured service-wide upload tokens, each mapped to
    /// the provider it vouches for. Server-side only.
    pub global_upload_tokens: HashMap<String, Service>,
    pub circleci: CircleCiConfig,
    pub oidc: OidcConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct CircleCiConfig {
    pub token: SecretString,
    pub api_url: String,
    /// Outbound verification timeout; a timed-out call is treated the
    /// same as any other verification failure.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub public_key_path: String,
    pub audience: String,
    pub issuer: String,
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = UploadConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("upload-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            global_upload_tokens: parse_global_tokens(&get_env(
                "GLOBAL_UPLOAD_TOKENS",
                Some(""),
                is_prod,
            )?)?,
            circleci: CircleCiConfig {
                token: SecretString::new(get_env("CIRCLECI_TOKEN", Some(""), is_prod)?),
                api_url: get_env(
                    "CIRCLECI_API_URL",
                    Some("https://circleci.com/api/v1"),
                    is_prod,
                )?,
                timeout_seconds: get_env("CIRCLECI_TIMEOUT_SECONDS", Some("10"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            oidc: OidcConfig {
                public_key_path: get_env("OIDC_PUBLIC_KEY_PATH", None, is_prod)?,
                audience: get_env("OIDC_AUDIENCE", Some("coverage-upload"), is_prod)?,
                issuer: get_env(
                    "OIDC_ISSUER",
                    Some("https://token.actions.githubusercontent.com"),
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.circleci.timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CIRCLECI_TIMEOUT_SECONDS must be positive"
            )));
        }

        Ok(())
    }
}

/// Parse `token:provider,token:provider` into the global-token map.
fn parse_global_tokens(raw: &str) -> Result<HashMap<String, Service>, AppError> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (token, service) = entry.split_once(':').ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "GLOBAL_UPLOAD_TOKENS entries must look like token:provider"
            ))
        })?;
        let service: Service = service
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{e}")))?;
        tokens.insert(token.trim().to_string(), service);
    }
    Ok(tokens)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
