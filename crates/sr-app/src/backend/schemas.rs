use serde::{Deserialize, Serialize};

/// Inbound render request. Every field is optional at the serde layer so a
/// missing mandatory field surfaces as our own validation error instead of a
/// framework rejection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderRequest {
    pub base64: Option<String>,
    pub environment: Option<String>,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    pub text: Option<String>,
    pub user: Option<String>,
    #[serde(rename = "architecturalStyle")]
    pub architectural_style: Option<String>,
    pub weather: Option<String>,
    #[serde(rename = "additionalOptions")]
    pub additional_options: Option<String>,
    pub hours: Option<String>,
    pub neg: Option<String>,
    pub seed: Option<i64>,
    pub sampler_name: Option<String>,
    pub cfg_scale: Option<f32>,
    pub steps: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
