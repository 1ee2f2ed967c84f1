//! Configuration management for mathbot.
//!
//! Configuration can be set via environment variables:
//! - `GROQ_API_KEY` - Optional. Groq API key. When unset, each session must supply one.
//! - `GROQ_BASE_URL` - Optional. OpenAI-compatible endpoint root. Defaults to `https://api.groq.com/openai/v1`.
//! - `MATHBOT_MODEL` - Optional. Model identifier. Defaults to `gemma2-9b-it`.
//! - `MATHBOT_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.7`.
//! - `AGENT_STRATEGY` - Optional. `react` or `tool_calls`. Defaults to `react`.
//! - `MAX_ITERATIONS` - Optional. Maximum planning rounds per turn. Defaults to `15`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Timeout for every outbound request. Defaults to `120`.
//! - `SEARCH_BASE_URL` - Optional. DuckDuckGo HTML endpoint root. Defaults to `https://html.duckduckgo.com`.
//! - `SEARCH_MAX_RESULTS` - Optional. Search snippets per query. Defaults to `5`.
//! - `WIKIPEDIA_BASE_URL` - Optional. MediaWiki root. Defaults to `https://en.wikipedia.org`.
//! - `WIKIPEDIA_TOP_K` - Optional. Pages per lookup. Defaults to `1`.
//! - `WIKIPEDIA_MAX_CHARS` - Optional. Character budget of a lookup. Defaults to `300`.
//! - `SHOW_AGENT_STEPS` - Optional. Print agent steps in the terminal chat. Defaults to `true`.
//! - `SESSION_IDLE_SECS` - Optional. HTTP sessions unused this long are disposed. Defaults to `1800`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemma2-9b-it";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://html.duckduckgo.com";
pub const DEFAULT_WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org";

/// Notice shown when a session has no usable credential.
pub const MISSING_KEY_NOTICE: &str = "please provide the groq api key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}", MISSING_KEY_NOTICE)]
    MissingApiKey,

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Groq API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Accepts any non-blank key; surrounding whitespace is stripped.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// How the agent decides which tool to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentStrategy {
    /// Zero-shot ReAct text protocol (Thought / Action / Action Input / Final Answer).
    #[default]
    React,
    /// Provider-native function calling.
    ToolCalls,
}

impl FromStr for AgentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "react" | "zero_shot_react" => Ok(Self::React),
            "tool_calls" | "tools" | "function_calling" => Ok(Self::ToolCalls),
            other => Err(format!("expected `react` or `tool_calls`, got: {}", other)),
        }
    }
}

/// Wikipedia lookup configuration.
#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub base_url: String,
    /// Maximum number of pages summarized per lookup
    pub top_k: usize,
    /// Character budget of the whole lookup result
    pub max_chars: usize,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WIKIPEDIA_BASE_URL.to_string(),
            top_k: 1,
            max_chars: 300,
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            max_results: 5,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Process-wide Groq API key, if one was provided in the environment
    pub api_key: Option<ApiKey>,

    /// Root of the OpenAI-compatible API
    pub llm_base_url: String,

    /// Model identifier used for every completion
    pub model: String,

    pub temperature: f32,

    pub strategy: AgentStrategy,

    /// Maximum planning rounds for one turn
    pub max_iterations: usize,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Timeout applied to every outbound HTTP request
    pub request_timeout: Duration,

    pub search: SearchConfig,

    pub wikipedia: WikipediaConfig,

    /// Print agent steps in the terminal chat
    pub show_agent_steps: bool,

    /// HTTP sessions idle longer than this are disposed
    pub session_idle: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A missing `GROQ_API_KEY` is not an error here: the key can still be
    /// supplied when a session starts.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .and_then(|v| ApiKey::parse(&v).ok());

        let llm_base_url = std::env::var("GROQ_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GROQ_BASE_URL.to_string());

        let model = std::env::var("MATHBOT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let temperature = env_parse("MATHBOT_TEMPERATURE", 0.7_f32)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue(
                "MATHBOT_TEMPERATURE".to_string(),
                format!("{} is outside 0.0..=2.0", temperature),
            ));
        }

        let strategy = std::env::var("AGENT_STRATEGY")
            .ok()
            .map(|v| {
                v.parse::<AgentStrategy>()
                    .map_err(|e| ConfigError::InvalidValue("AGENT_STRATEGY".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let max_iterations = env_parse("MAX_ITERATIONS", 15_usize)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_parse("PORT", 3000_u16)?;
        let request_timeout = Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 120_u64)?);

        let search = SearchConfig {
            base_url: std::env::var("SEARCH_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_BASE_URL.to_string()),
            max_results: env_parse("SEARCH_MAX_RESULTS", 5_usize)?,
        };

        let wikipedia = WikipediaConfig {
            base_url: std::env::var("WIKIPEDIA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_WIKIPEDIA_BASE_URL.to_string()),
            top_k: env_parse("WIKIPEDIA_TOP_K", 1_usize)?,
            max_chars: env_parse("WIKIPEDIA_MAX_CHARS", 300_usize)?,
        };

        let show_agent_steps = std::env::var("SHOW_AGENT_STEPS")
            .ok()
            .map(|v| {
                parse_bool(&v).map_err(|e| ConfigError::InvalidValue("SHOW_AGENT_STEPS".to_string(), e))
            })
            .transpose()?
            .unwrap_or(true);

        let session_idle_secs = env_parse("SESSION_IDLE_SECS", 1800_u64)?;
        if session_idle_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_IDLE_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            llm_base_url,
            model,
            temperature,
            strategy,
            max_iterations,
            host,
            port,
            request_timeout,
            search,
            wikipedia,
            show_agent_steps,
            session_idle: Duration::from_secs(session_idle_secs),
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self {
            api_key,
            llm_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            strategy: AgentStrategy::React,
            max_iterations: 15,
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout: Duration::from_secs(120),
            search: SearchConfig::default(),
            wikipedia: WikipediaConfig::default(),
            show_agent_steps: true,
            session_idle: Duration::from_secs(1800),
        }
    }

    /// Return the configured key or fail with the missing-key notice.
    pub fn require_api_key(&self) -> Result<&ApiKey, ConfigError> {
        self.api_key.as_ref().ok_or(ConfigError::MissingApiKey)
    }

    /// Clone of this config carrying a session-supplied key.
    pub fn with_api_key(&self, api_key: ApiKey) -> Self {
        Self {
            api_key: Some(api_key),
            ..self.clone()
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}
