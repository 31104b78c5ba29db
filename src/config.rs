use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Process-wide configuration: defaults, then `config.toml`, then `ROLLCALL_*` env vars.
pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: invalid rollcall configuration"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub loglevel: String,
    /// Secret used to encrypt session cookies; at least 64 bytes. Random per process when unset.
    pub cookie_secret: Option<String>,
    pub insecure_cookie: bool,
    pub body_limit: usize,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            cookie_secret: None,
            insecure_cookie: false,
            body_limit: 1024 * 1024,
        }
    }
}

/// Hosted chat-completion endpoint (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub proxy: Option<Url>,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub retry_max_times: usize,
    pub requests_per_minute: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.openai.com/v1/").expect("static default url"),
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            proxy: None,
            connect_timeout_secs: 5,
            timeout_secs: 60,
            retry_max_times: 2,
            requests_per_minute: 60,
        }
    }
}

impl LlmConfig {
    pub fn completions_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join("chat/completions")
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("ROLLCALL_").split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completions_url_is_joined_under_base() {
        let cfg = LlmConfig::default();
        assert_eq!(
            cfg.completions_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ROLLCALL_LLM__MODEL", "gpt-4o-mini");
            jail.set_env("ROLLCALL_BASIC__INSECURE_COOKIE", "true");
            let cfg = Config::load()?;
            assert_eq!(cfg.llm.model, "gpt-4o-mini");
            assert!(cfg.basic.insecure_cookie);
            assert_eq!(cfg.llm.max_tokens, 500);
            Ok(())
        });
    }
}
