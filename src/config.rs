//! TOML configuration.
//!
//! Every section is optional; omitted values fall back to the defaults the
//! services were tuned with. The generation API key is never read from the
//! file, only from the environment variable named by
//! `generation.api_key_env`.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8001"
//!
//! [chunking]
//! chunk_size = 500
//!
//! [retrieval]
//! top_k = 3
//!
//! [generation]
//! model = "gemini-3-flash-preview"
//! timeout_secs = 60
//! ```

use anyhow::{Context, Result};
use knowledge_relay_core::GenerationOptions;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chatbot: ChatbotConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8001".to_string()
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Words per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

impl ChunkingConfig {
    pub fn chunk_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.chunk_size).context("chunking.chunk_size must be > 0")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_api_key_env() -> String {
    "GENAI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl GenerationConfig {
    /// Read the API key from the environment. Empty values count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatbotConfig {
    #[serde(default = "default_chatbot_temperature")]
    pub temperature: f32,
    #[serde(default = "default_chatbot_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            temperature: default_chatbot_temperature(),
            max_output_tokens: default_chatbot_max_output_tokens(),
        }
    }
}

fn default_chatbot_temperature() -> f32 {
    GenerationOptions::CHATBOT.temperature
}
fn default_chatbot_max_output_tokens() -> u32 {
    GenerationOptions::CHATBOT.max_output_tokens
}

impl ChatbotConfig {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            ..GenerationOptions::CHATBOT
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_temperature")]
    pub temperature: f32,
    #[serde(default = "default_search_top_p")]
    pub top_p: f32,
    #[serde(default = "default_search_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            temperature: default_search_temperature(),
            top_p: default_search_top_p(),
            max_output_tokens: default_search_max_output_tokens(),
        }
    }
}

fn default_search_temperature() -> f32 {
    GenerationOptions::SEARCH.temperature
}
fn default_search_top_p() -> f32 {
    0.95
}
fn default_search_max_output_tokens() -> u32 {
    GenerationOptions::SEARCH.max_output_tokens
}

impl SearchConfig {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            top_p: Some(self.top_p),
            ..GenerationOptions::SEARCH
        }
    }
}

impl Config {
    /// Check value ranges. Called by [`load_config`] and for built-in defaults.
    pub fn validate(&self) -> Result<()> {
        self.chunking.chunk_size()?;

        if self.retrieval.top_k < 1 {
            anyhow::bail!("retrieval.top_k must be >= 1");
        }

        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("server.max_upload_bytes must be > 0");
        }

        if self.generation.model.trim().is_empty() {
            anyhow::bail!("generation.model must not be empty");
        }
        if self.generation.timeout_secs == 0 {
            anyhow::bail!("generation.timeout_secs must be > 0");
        }

        for (name, t) in [
            ("chatbot.temperature", self.chatbot.temperature),
            ("search.temperature", self.search.temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                anyhow::bail!("{} must be in [0.0, 2.0]", name);
            }
        }
        if !(self.search.top_p > 0.0 && self.search.top_p <= 1.0) {
            anyhow::bail!("search.top_p must be in (0.0, 1.0]");
        }
        if self.chatbot.max_output_tokens == 0 || self.search.max_output_tokens == 0 {
            anyhow::bail!("max_output_tokens must be > 0");
        }

        Ok(())
    }

    /// Bind address, with the `PORT` environment variable taking precedence.
    pub fn bind_addr(&self) -> String {
        match std::env::var("PORT") {
            Ok(port) if !port.trim().is_empty() => format!("0.0.0.0:{}", port.trim()),
            _ => self.server.bind.clone(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
