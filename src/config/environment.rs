// ABOUTME: Environment-based server configuration
// ABOUTME: Reads bind address, LLM, calendar, CORS, and logging settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::agent::DEFAULT_MAX_TOOL_ITERATIONS;
use crate::calendar::{CalendarConfig, CALENDAR_SCOPE};
use crate::errors::{AppError, AppResult};
use crate::llm::OpenAiConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::config(format!("Unknown LOG_FORMAT `{other}`"))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directives (from `RUST_LOG`)
    pub filter: String,
    /// Output format (from `LOG_FORMAT`)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub http_port: u16,
    /// LLM provider settings
    pub llm: OpenAiConfig,
    /// Cap on capability rounds per request
    pub max_tool_iterations: usize,
    /// Calendar gateway settings
    pub calendar: CalendarConfig,
    /// Allowed CORS origins (`*` allows any)
    pub cors_allowed_origins: Vec<String>,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            http_port: 5000,
            llm: OpenAiConfig::default(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            calendar: CalendarConfig::default(),
            cors_allowed_origins: vec!["*".to_owned()],
            logging: LoggingConfig::default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn env_parse<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} `{raw}`: {e}"))),
        _ => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if `OPENAI_API_KEY` is missing or a numeric or
    /// enumerated variable cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::config("Missing OPENAI_API_KEY environment variable"))?;

        let llm = OpenAiConfig {
            api_key,
            base_url: env_or("OPENAI_BASE_URL", &defaults.llm.base_url),
            default_model: env_or("PEBBLE_LLM_MODEL", &defaults.llm.default_model),
        };

        let calendar = CalendarConfig {
            token_path: PathBuf::from(env_or("GOOGLE_TOKEN_PATH", "token.json")),
            client_secret_path: PathBuf::from(env_or(
                "GOOGLE_CLIENT_SECRET_PATH",
                "credentials.json",
            )),
            base_url: env_or("GOOGLE_CALENDAR_BASE_URL", &defaults.calendar.base_url),
            scopes: vec![CALENDAR_SCOPE.to_owned()],
        };

        let max_tool_iterations =
            env_parse("PEBBLE_MAX_TOOL_ITERATIONS", defaults.max_tool_iterations)?;
        if max_tool_iterations == 0 {
            return Err(AppError::config(
                "PEBBLE_MAX_TOOL_ITERATIONS must be at least 1",
            ));
        }

        Ok(Self {
            host: env_or("HOST", &defaults.host),
            http_port: env_parse("HTTP_PORT", defaults.http_port)?,
            llm,
            max_tool_iterations,
            calendar,
            cors_allowed_origins: parse_origins(&env_or("CORS_ALLOWED_ORIGINS", "*")),
            logging: LoggingConfig {
                filter: env_or("RUST_LOG", &defaults.logging.filter),
                format: env_parse("LOG_FORMAT", LogFormat::Text)?,
            },
        })
    }
}

/// Split a comma-separated origin list, dropping blanks
#[must_use]
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect()
}
