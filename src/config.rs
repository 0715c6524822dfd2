//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `PERSONA_BOT_CONFIG`), then applies the `LLM_*`
//! and `PERSONA_BOT_LOG_LEVEL` env overrides. Secrets (`DISCORD_TOKEN`,
//! `LLM_API_KEY`) are only ever read from the environment.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::prompt::Substyle;
use crate::throbber::ThrobberStyle;

/// Who the bot pretends to be.
#[derive(Debug, Clone)]
pub struct PersonaConfig {
    /// Display name, used in the ready banner.
    pub name: String,
    /// Instruction placed ahead of the user's input in every prompt.
    pub instruction: String,
}

/// Discord channel configuration.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Whether the Discord channel is explicitly enabled.
    pub enabled: bool,
    /// Text of the message posted while the completion is outstanding.
    pub placeholder: String,
    /// Literal marker that asks the bot to echo the prompt and input back.
    pub show_prompt_marker: String,
}

/// PTY (console) channel configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
}

/// Comms subsystem configuration.
#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub discord: DiscordConfig,
    pub pty: PtyConfig,
}

/// OpenAI-compatible completion endpoint configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Scheme + host, e.g. `http://my-llm-host`.
    pub host: String,
    pub port: u16,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// HTTP client timeout in seconds. Independent of the response race.
    pub timeout_seconds: u64,
}

impl OpenAiConfig {
    /// `{host}:{port}/v1/completions`.
    pub fn completions_url(&self) -> String {
        format!("{}:{}/v1/completions", self.host.trim_end_matches('/'), self.port)
    }
}

/// Dummy provider configuration (`[llm.dummy]`).
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Simulated latency before the echo is returned.
    pub delay: Duration,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"openai"`).
    pub provider: String,
    pub substyle: Substyle,
    /// How long a chat reply waits for the completion before giving up.
    pub response_timeout: Duration,
    pub openai: OpenAiConfig,
    pub dummy: DummyConfig,
}

/// Console progress indicator configuration.
#[derive(Debug, Clone)]
pub struct ThrobberConfig {
    pub enabled: bool,
    pub style: ThrobberStyle,
    pub frame_time: Duration,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub persona: PersonaConfig,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
    pub throbber: ThrobberConfig,
    /// Bot credential from `DISCORD_TOKEN`. Never sourced from TOML.
    pub discord_token: Option<String>,
    /// API key from `LLM_API_KEY`: `None` for keyless local servers.
    pub llm_api_key: Option<String>,
}

impl Config {
    pub fn comms_discord_should_load(&self) -> bool {
        self.comms.discord.enabled
    }

    pub fn comms_pty_should_load(&self) -> bool {
        self.comms.pty.enabled
    }
}

/// Env-var overrides, collected once by [`load`] and passed explicitly to
/// [`load_from`] so tests never mutate the process environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub provider: Option<String>,
    pub substyle: Option<String>,
    pub timeout: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub temperature: Option<String>,
    pub discord_token: Option<String>,
    pub llm_api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("PERSONA_BOT_LOG_LEVEL").ok(),
            provider: env::var("LLM_PROVIDER").ok(),
            substyle: env::var("LLM_SUBSTYLE").ok(),
            timeout: env::var("LLM_TIMEOUT").ok(),
            host: env::var("LLM_HOST").ok(),
            port: env::var("LLM_PORT").ok(),
            temperature: env::var("LLM_TEMP").ok(),
            discord_token: env::var("DISCORD_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    bot: RawBot,
    persona: RawPersona,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    throbber: RawThrobber,
}

#[derive(Deserialize)]
struct RawBot {
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawBot {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
struct RawPersona {
    name: String,
    instruction: String,
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    discord: RawDiscord,
    #[serde(default)]
    pty: RawPty,
}

#[derive(Deserialize)]
struct RawDiscord {
    /// Defaults to `true`: this is a Discord bot first.
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_placeholder")]
    placeholder: String,
    #[serde(default = "default_show_prompt_marker")]
    show_prompt_marker: String,
}

impl Default for RawDiscord {
    fn default() -> Self {
        Self {
            enabled: true,
            placeholder: default_placeholder(),
            show_prompt_marker: default_show_prompt_marker(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawPty {
    /// Defaults to `false`: the console must be explicitly enabled.
    #[serde(default)]
    enabled: bool,
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default = "default_substyle")]
    substyle: String,
    #[serde(default = "default_response_timeout_seconds")]
    response_timeout_seconds: u64,
    #[serde(default)]
    openai: RawOpenAiConfig,
    #[serde(default)]
    dummy: RawDummyConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            substyle: default_substyle(),
            response_timeout_seconds: default_response_timeout_seconds(),
            openai: RawOpenAiConfig::default(),
            dummy: RawDummyConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_host")]
    host: String,
    #[serde(default = "default_openai_port")]
    port: u16,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            host: default_openai_host(),
            port: default_openai_port(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawDummyConfig {
    #[serde(default)]
    delay_millis: u64,
}

#[derive(Deserialize)]
struct RawThrobber {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_throbber_style")]
    style: String,
    #[serde(default = "default_frame_millis")]
    frame_millis: u64,
}

impl Default for RawThrobber {
    fn default() -> Self {
        Self {
            enabled: true,
            style: default_throbber_style(),
            frame_millis: default_frame_millis(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_placeholder() -> String { "⏳".to_string() }
fn default_show_prompt_marker() -> String { "[show_prompt]".to_string() }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_substyle() -> String { "ALPACA".to_string() }
fn default_response_timeout_seconds() -> u64 { 15 }
fn default_openai_host() -> String { "http://localhost".to_string() }
fn default_openai_port() -> u16 { 8000 }
fn default_openai_model() -> String { "text-davinci-003".to_string() }
fn default_openai_temperature() -> f32 { 0.5 }
fn default_openai_max_tokens() -> u32 { 256 }
fn default_openai_timeout_seconds() -> u64 { 120 }
fn default_throbber_style() -> String { "triangles".to_string() }
fn default_frame_millis() -> u64 { 150 }

fn default_true() -> bool {
    true
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `config/default.toml` (or `PERSONA_BOT_CONFIG`), then
/// apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("PERSONA_BOT_CONFIG")
        .map(|p| expand_home(&p))
        .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
    load_from(&path, &Overrides::from_env())
}

/// Internal loader: accepts an explicit path and pre-collected overrides.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let llm = parsed.llm;
    let log_level = overrides.log_level.clone().unwrap_or(parsed.bot.log_level);

    let substyle_name = overrides.substyle.as_deref().unwrap_or(&llm.substyle);
    let substyle = substyle_name.parse::<Substyle>()?;

    let response_timeout_seconds = match overrides.timeout.as_deref() {
        Some(v) => parse_env_number::<u64>("LLM_TIMEOUT", v)?,
        None => llm.response_timeout_seconds,
    };
    let port = match overrides.port.as_deref() {
        Some(v) => parse_env_number::<u16>("LLM_PORT", v)?,
        None => llm.openai.port,
    };
    let temperature = match overrides.temperature.as_deref() {
        Some(v) => parse_env_number::<f32>("LLM_TEMP", v)?,
        None => llm.openai.temperature,
    };

    let throbber_style = parsed.throbber.style.parse::<ThrobberStyle>()?;

    Ok(Config {
        log_level,
        persona: PersonaConfig {
            name: parsed.persona.name,
            instruction: parsed.persona.instruction.trim().to_string(),
        },
        comms: CommsConfig {
            discord: DiscordConfig {
                enabled: parsed.comms.discord.enabled,
                placeholder: parsed.comms.discord.placeholder,
                show_prompt_marker: parsed.comms.discord.show_prompt_marker,
            },
            pty: PtyConfig {
                enabled: parsed.comms.pty.enabled,
            },
        },
        llm: LlmConfig {
            provider: overrides.provider.clone().unwrap_or(llm.provider),
            substyle,
            response_timeout: Duration::from_secs(response_timeout_seconds),
            openai: OpenAiConfig {
                host: overrides.host.clone().unwrap_or(llm.openai.host),
                port,
                model: llm.openai.model,
                temperature,
                max_tokens: llm.openai.max_tokens,
                timeout_seconds: llm.openai.timeout_seconds,
            },
            dummy: DummyConfig {
                delay: Duration::from_millis(llm.dummy.delay_millis),
            },
        },
        throbber: ThrobberConfig {
            enabled: parsed.throbber.enabled,
            style: throbber_style,
            frame_time: Duration::from_millis(parsed.throbber.frame_millis),
        },
        discord_token: overrides.discord_token.clone(),
        llm_api_key: overrides.llm_api_key.clone(),
    })
}

fn parse_env_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("{name}={value:?} is not a valid number: {e}")))
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests: dummy LLM, no tokens, no external calls.
#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Self {
            log_level: "info".into(),
            persona: PersonaConfig {
                name: "Test Persona".into(),
                instruction: "Answer tersely.".into(),
            },
            comms: CommsConfig {
                discord: DiscordConfig {
                    enabled: false,
                    placeholder: default_placeholder(),
                    show_prompt_marker: default_show_prompt_marker(),
                },
                pty: PtyConfig { enabled: true },
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                substyle: Substyle::Alpaca,
                response_timeout: Duration::from_secs(15),
                openai: OpenAiConfig {
                    host: "http://localhost".into(),
                    port: 0,
                    model: "test-model".into(),
                    temperature: 0.0,
                    max_tokens: 16,
                    timeout_seconds: 1,
                },
                dummy: DummyConfig { delay: Duration::ZERO },
            },
            throbber: ThrobberConfig {
                enabled: false,
                style: ThrobberStyle::Ascii,
                frame_time: Duration::from_millis(150),
            },
            discord_token: None,
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[persona]
name = "Ice Bear"
instruction = "Respond as if you are the character 'Ice Bear'."
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &Overrides::default()).unwrap();
        assert_eq!(cfg.persona.name, "Ice Bear");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.substyle, Substyle::Alpaca);
        assert_eq!(cfg.llm.response_timeout, Duration::from_secs(15));
        assert_eq!(cfg.llm.openai.port, 8000);
        assert!(cfg.comms_discord_should_load());
        assert!(!cfg.comms_pty_should_load());
        assert_eq!(cfg.comms.discord.show_prompt_marker, "[show_prompt]");
        assert_eq!(cfg.throbber.style, ThrobberStyle::Triangles);
        assert!(cfg.discord_token.is_none());
    }

    #[test]
    fn env_overrides_replace_toml_values() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = Overrides {
            log_level: Some("debug".into()),
            substyle: Some("ALPACA_INSTRUCT".into()),
            timeout: Some("60".into()),
            host: Some("http://my-llm-host".into()),
            port: Some("8001".into()),
            temperature: Some("0.9".into()),
            discord_token: Some("token".into()),
            ..Overrides::default()
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.llm.substyle, Substyle::AlpacaInstruct);
        assert_eq!(cfg.llm.response_timeout, Duration::from_secs(60));
        assert_eq!(cfg.llm.openai.completions_url(), "http://my-llm-host:8001/v1/completions");
        assert!((cfg.llm.openai.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(cfg.discord_token.as_deref(), Some("token"));
    }

    #[test]
    fn non_numeric_timeout_is_fatal() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = Overrides { timeout: Some("soon".into()), ..Overrides::default() };
        let err = load_from(f.path(), &overrides).unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT"));
    }

    #[test]
    fn unknown_substyle_is_fatal() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = Overrides { substyle: Some("LLAMA_CHAT".into()), ..Overrides::default() };
        assert!(matches!(load_from(f.path(), &overrides), Err(AppError::Config(_))));
    }

    #[test]
    fn missing_persona_is_parse_error() {
        let f = write_toml("[bot]\nlog_level = \"info\"\n");
        let msg = load_from(f.path(), &Overrides::default()).unwrap_err().to_string();
        assert!(msg.contains("parse error"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/persona.toml"), &Overrides::default());
        assert!(result.unwrap_err().to_string().contains("config error"));
    }

    #[test]
    fn host_trailing_slash_is_trimmed() {
        let mut cfg = Config::test_default();
        cfg.llm.openai.host = "http://llm/".into();
        cfg.llm.openai.port = 9000;
        assert_eq!(cfg.llm.openai.completions_url(), "http://llm:9000/v1/completions");
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/persona.toml");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("persona.toml"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("config/icebear.toml"), PathBuf::from("config/icebear.toml"));
    }
}
