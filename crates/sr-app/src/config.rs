use std::env;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use sr_core::params::RenderDefaults;

/// Process-wide configuration, loaded once at startup and passed by
/// reference into each client. Business logic never reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub render_api_url: String,
    pub render_api_token: String,
    pub storage_api_url: String,
    pub storage_public_url: String,
    pub storage_bucket: String,
    pub storage_token: String,
    pub db_path: PathBuf,
    pub projects_table: String,
    pub defaults: RenderDefaults,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        // .env is a development convenience; deployments set real env vars
        let _ = dotenvy::dotenv();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("PORT must be a number")?;

        Ok(Self {
            port,
            render_api_url: required("RENDER_API_URL")?,
            render_api_token: required("RENDER_API_TOKEN")?,
            storage_api_url: required("STORAGE_API_URL")?,
            storage_public_url: required("STORAGE_PUBLIC_URL")?,
            storage_bucket: required("STORAGE_BUCKET")?,
            storage_token: required("STORAGE_TOKEN")?,
            db_path: env::var("DB_PATH")
                .unwrap_or_else(|_| "outputs/db".to_string())
                .into(),
            projects_table: env::var("PROJECTS_TABLE").unwrap_or_else(|_| "projects".to_string()),
            defaults: RenderDefaults {
                prompt: required("PROMPT")?,
                negative_prompt: required("NEG_PROMPT")?,
                seed: parse_or("SEED", -1)?,
                steps: parse_or("STEPS", 30)?,
                cfg_scale: parse_or("CFG_SCALE", 7.0)?,
                denoising_strength: parse_or("DENOISING_STRENGTH", 0.75)?,
                image_cfg_scale: parse_or("IMAGE_CFG_SCALE", 1.5)?,
            },
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).map_err(|_| anyhow!("missing required environment variable {name}"))
}

fn parse_or<T: std::str::FromStr>(name: &str, fallback: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("environment variable {name} has an invalid value")),
        Err(_) => Ok(fallback),
    }
}
