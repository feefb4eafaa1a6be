use serde::Serialize;

pub const DEFAULT_MODEL: &str = "model_indoor.safetensors";
pub const DEFAULT_SAMPLER: &str = "DPM adaptive";
pub const DEFAULT_SCHEDULE: &str = "Karras";
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

const CLIP_SKIP: u32 = 10;
const REFINER_SWITCH_AT: u32 = 10;

/// Per-request overrides. Any field left unset falls back to an operator
/// default or a built-in constant, so a submission is always fully specified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOverrides {
    pub model: Option<String>,
    pub negative_prompt: Option<String>,
    pub seed: Option<i64>,
    pub sampler_name: Option<String>,
    pub cfg_scale: Option<f32>,
    pub steps: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Operator-configured defaults for job submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDefaults {
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: i64,
    pub steps: u32,
    pub cfg_scale: f32,
    pub denoising_strength: f32,
    pub image_cfg_scale: f32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ControlnetUnit {
    pub enabled: bool,
    pub control_type: String,
    pub control_weight: u32,
    pub start_step: u32,
    pub end_step: u32,
    pub control_mode: String,
}

/// Fully-resolved img2img submission payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobInput {
    pub endpoint: String,
    pub model: String,
    pub init_images: Vec<String>,
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: i64,
    pub sampler_name: String,
    pub schedule_type: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub denoising_strength: f32,
    pub clip_skip: u32,
    pub image_cfg_scale: f32,
    pub controlnet_units: Vec<ControlnetUnit>,
    pub refiner_switch_at: u32,
    pub resize: String,
}

/// Merge caller overrides with configured defaults into a submission payload
/// carrying the cleaned base64 of the before-image.
pub fn resolve(overrides: &RenderOverrides, defaults: &RenderDefaults, init_image: String) -> JobInput {
    JobInput {
        endpoint: "img2img".to_string(),
        model: overrides
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        init_images: vec![init_image],
        prompt: defaults.prompt.clone(),
        negative_prompt: overrides
            .negative_prompt
            .clone()
            .unwrap_or_else(|| defaults.negative_prompt.clone()),
        seed: overrides.seed.unwrap_or(defaults.seed),
        sampler_name: overrides
            .sampler_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SAMPLER.to_string()),
        schedule_type: DEFAULT_SCHEDULE.to_string(),
        steps: overrides.steps.unwrap_or(defaults.steps),
        cfg_scale: overrides.cfg_scale.unwrap_or(defaults.cfg_scale),
        width: overrides.width.unwrap_or(DEFAULT_WIDTH),
        height: overrides.height.unwrap_or(DEFAULT_HEIGHT),
        denoising_strength: defaults.denoising_strength,
        clip_skip: CLIP_SKIP,
        image_cfg_scale: defaults.image_cfg_scale,
        controlnet_units: vec![ControlnetUnit {
            enabled: true,
            control_type: "all".to_string(),
            control_weight: 1,
            start_step: 0,
            end_step: 1,
            control_mode: "balanced".to_string(),
        }],
        refiner_switch_at: REFINER_SWITCH_AT,
        resize: "auto".to_string(),
    }
}
