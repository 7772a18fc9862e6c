use serde::{ Serialize, Deserialize };

use crate::llm::SupportedModel;

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatRequest {
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "response")] Response {
        content: String,
        timestamp: i64,
    },
    #[serde(rename = "error")] Error {
        kind: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    #[serde(rename = "processing")]
    Processing,
}

#[derive(Serialize, Debug)]
pub struct ModelsResponse {
    pub models: Vec<SupportedModel>,
    pub default_model: SupportedModel,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub temperature_step: f32,
    pub default_temperature: f32,
}
