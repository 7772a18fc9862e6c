pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use std::time::Duration;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;
pub const TEMPERATURE_STEP: f32 = 0.1;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SupportedModel {
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl SupportedModel {
    pub const ALL: [SupportedModel; 4] = [
        SupportedModel::Gpt4oMini,
        SupportedModel::Gpt4o,
        SupportedModel::Gpt4Turbo,
        SupportedModel::Gpt35Turbo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedModel::Gpt4oMini => "gpt-4o-mini",
            SupportedModel::Gpt4o => "gpt-4o",
            SupportedModel::Gpt4Turbo => "gpt-4-turbo",
            SupportedModel::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseModelError {
    message: String,
}

impl fmt::Display for ParseModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseModelError {}
impl FromStr for SupportedModel {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gpt-4o-mini" => Ok(SupportedModel::Gpt4oMini),
            "gpt-4o" => Ok(SupportedModel::Gpt4o),
            "gpt-4-turbo" => Ok(SupportedModel::Gpt4Turbo),
            "gpt-3.5-turbo" => Ok(SupportedModel::Gpt35Turbo),
            _ =>
                Err(ParseModelError {
                    message: format!("Unsupported model: '{}'", s),
                }),
        }
    }
}

/// Clamps to the slider range; NaN falls back to the default.
pub fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

/// Per-request knobs read from the settings sidebar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub model: SupportedModel,
    pub temperature: f32,
}

impl CompletionParams {
    pub fn new(model: SupportedModel, temperature: f32) -> Self {
        Self {
            model,
            temperature: clamp_temperature(temperature),
        }
    }
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            model: SupportedModel::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
