//! Image generation MCP server
//!
//! Adapter over the Stable Diffusion webui REST API. The webui base URL is
//! fixed at construction; there is no runtime mutation of the endpoint.
//! Generated images are decoded from base64 and saved under the output
//! directory.

use crate::fs::render;
use base64::Engine;
use chrono::Local;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use toolbelt_core::{Error, Result as CoreResult};
use tracing::info;

/// Default webui endpoint.
pub const WEBUI_URL_DEFAULT: &str = "http://127.0.0.1:7860";

/// Environment variable overriding the webui endpoint.
pub const ENV_WEBUI_URL: &str = "SD_WEBUI_URL";

/// Budget for one generation call (5 minutes).
pub const TXT2IMG_TIMEOUT_MS: u64 = 300_000;

/// Budget for status/listing calls (5 seconds).
pub const STATUS_TIMEOUT_MS: u64 = 5_000;

fn default_dimension() -> u32 {
    512
}

fn default_steps() -> u32 {
    20
}

fn default_cfg_scale() -> f64 {
    7.0
}

fn default_seed() -> i64 {
    -1
}

fn default_sampler() -> String {
    "Euler".to_string()
}

fn default_save_image() -> bool {
    true
}

#[derive(Deserialize, Serialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct Txt2ImgArgs {
    /// Prompt describing the image
    pub prompt: String,
    /// Things to avoid in the image
    #[serde(default)]
    pub negative_prompt: String,
    /// Image width in pixels
    #[serde(default = "default_dimension")]
    pub width: u32,
    /// Image height in pixels
    #[serde(default = "default_dimension")]
    pub height: u32,
    /// Sampling steps
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Classifier-free guidance scale
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    /// Seed (-1 for random)
    #[serde(default = "default_seed")]
    pub seed: i64,
    /// Sampler name
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    /// Save the decoded image to the output directory
    #[serde(default = "default_save_image")]
    pub save_image: bool,
}

/// Configuration for the image generation server.
#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    /// Webui base URL, fixed for the process lifetime
    pub webui_url: String,
    /// Directory generated images are saved to
    pub output_dir: PathBuf,
}

impl ImageGenConfig {
    pub fn new(webui_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            webui_url: webui_url.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Honor `SD_WEBUI_URL` when set.
    pub fn from_env(output_dir: impl Into<PathBuf>) -> Self {
        let url = std::env::var(ENV_WEBUI_URL).unwrap_or_else(|_| WEBUI_URL_DEFAULT.to_string());
        Self::new(url, output_dir)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.webui_url.starts_with("http://") && !self.webui_url.starts_with("https://") {
            return Err(Error::InvalidConfiguration {
                field: "webui_url".to_string(),
                reason: format!("{} is not an http(s) URL", self.webui_url),
            });
        }
        Ok(())
    }
}

/// Build the txt2img request payload.
fn build_txt2img_payload(args: &Txt2ImgArgs) -> Value {
    json!({
        "prompt": args.prompt,
        "negative_prompt": args.negative_prompt,
        "width": args.width,
        "height": args.height,
        "steps": args.steps,
        "cfg_scale": args.cfg_scale,
        "seed": args.seed,
        "sampler_name": args.sampler_name,
    })
}

/// Filename for a saved image, timestamped to the second.
fn image_filename() -> String {
    format!("sd_{}.png", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Pull the actual seed out of the generation response. The webui returns
/// its `info` field as a JSON string, not an object.
fn parse_actual_seed(response: &Value, requested: i64) -> i64 {
    response["info"]
        .as_str()
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|info| info["seed"].as_i64())
        .unwrap_or(requested)
}

/// MCP server adapting the Stable Diffusion webui API.
#[derive(Clone)]
pub struct ImageGenServer {
    config: ImageGenConfig,
    http: reqwest::Client,
    tool_router: ToolRouter<Self>,
}

impl ImageGenServer {
    pub fn new(config: ImageGenConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            tool_router: Self::tool_router(),
        }
    }

    fn map_transport_error(e: reqwest::Error, timeout_ms: u64) -> Error {
        if e.is_timeout() {
            Error::Timeout { timeout_ms }
        } else if e.is_connect() {
            Error::external(format!(
                "cannot reach webui: {e}; is it running with --api?"
            ))
        } else {
            Error::external(format!("webui request failed: {e}"))
        }
    }

    async fn get_json(&self, path: &str, timeout_ms: u64) -> CoreResult<Value> {
        let response = self
            .http
            .get(format!("{}{path}", self.config.webui_url))
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, timeout_ms))?;
        if !response.status().is_success() {
            return Err(Error::external(format!(
                "webui returned status {}",
                response.status().as_u16()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::external(format!("invalid webui response: {e}")))
    }

    async fn txt2img_inner(&self, args: &Txt2ImgArgs) -> CoreResult<String> {
        if args.prompt.trim().is_empty() {
            return Err(Error::invalid_input("prompt must not be empty".to_string()));
        }

        let payload = build_txt2img_payload(args);
        let response = self
            .http
            .post(format!("{}/sdapi/v1/txt2img", self.config.webui_url))
            .timeout(Duration::from_millis(TXT2IMG_TIMEOUT_MS))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(e, TXT2IMG_TIMEOUT_MS))?;
        if !response.status().is_success() {
            return Err(Error::external(format!(
                "webui returned status {}",
                response.status().as_u16()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::external(format!("invalid webui response: {e}")))?;

        let encoded = body["images"][0]
            .as_str()
            .ok_or_else(|| Error::external("no image in webui response".to_string()))?;
        let image = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| Error::DecodeError {
                path: "txt2img response".to_string(),
            })?;

        let mut result = json!({
            "prompt": args.prompt,
            "negative_prompt": args.negative_prompt,
            "width": args.width,
            "height": args.height,
            "steps": args.steps,
            "cfg_scale": args.cfg_scale,
            "sampler_name": args.sampler_name,
            "seed": parse_actual_seed(&body, args.seed),
            "image_bytes": image.len(),
        });

        if args.save_image {
            tokio::fs::create_dir_all(&self.config.output_dir).await?;
            let path = self.config.output_dir.join(image_filename());
            tokio::fs::write(&path, &image).await?;
            info!(path = %path.display(), bytes = image.len(), "Saved generated image");
            result["saved_to"] = json!(path.display().to_string());
        }

        Ok(serde_json::to_string_pretty(&result)?)
    }

    async fn get_models_inner(&self) -> CoreResult<String> {
        let models = self.get_json("/sdapi/v1/sd-models", STATUS_TIMEOUT_MS).await?;
        let formatted: Vec<Value> = models
            .as_array()
            .map(|ms| {
                ms.iter()
                    .map(|m| json!({"title": m["title"], "model_name": m["model_name"]}))
                    .collect()
            })
            .unwrap_or_default();
        Ok(serde_json::to_string_pretty(&formatted)?)
    }

    async fn get_samplers_inner(&self) -> CoreResult<String> {
        let samplers = self.get_json("/sdapi/v1/samplers", STATUS_TIMEOUT_MS).await?;
        let names: Vec<Value> = samplers
            .as_array()
            .map(|ss| ss.iter().map(|s| s["name"].clone()).collect())
            .unwrap_or_default();
        Ok(serde_json::to_string_pretty(&names)?)
    }

    async fn get_webui_status_inner(&self) -> CoreResult<String> {
        match self.get_json("/sdapi/v1/sd-models", STATUS_TIMEOUT_MS).await {
            Ok(models) => {
                let count = models.as_array().map(|m| m.len()).unwrap_or(0);
                Ok(format!(
                    "WebUI reachable at {} ({count} models loaded)",
                    self.config.webui_url
                ))
            }
            Err(e) => Ok(format!(
                "WebUI not reachable at {}: {e}",
                self.config.webui_url
            )),
        }
    }
}

#[tool_router]
impl ImageGenServer {
    #[tool(description = "Generate an image from a text prompt via the Stable Diffusion webui")]
    pub async fn txt2img(&self, Parameters(args): Parameters<Txt2ImgArgs>) -> String {
        render(self.txt2img_inner(&args).await)
    }

    #[tool(description = "List models available in the webui")]
    pub async fn get_models(&self) -> String {
        render(self.get_models_inner().await)
    }

    #[tool(description = "List samplers available in the webui")]
    pub async fn get_samplers(&self) -> String {
        render(self.get_samplers_inner().await)
    }

    #[tool(description = "Check whether the webui is reachable")]
    pub async fn get_webui_status(&self) -> String {
        render(self.get_webui_status_inner().await)
    }
}

#[tool_handler]
impl ServerHandler for ImageGenServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbelt-imagegen".into(),
                title: Some("Toolbelt Image Generation Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Text-to-image generation through a Stable Diffusion webui endpoint.".into(),
            ),
        }
    }
}
