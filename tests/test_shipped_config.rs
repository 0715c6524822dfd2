//! The config files shipped in `config/` must load and build a working state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use persona_bot::comms::CommsState;
use persona_bot::config::{Overrides, load_from};
use persona_bot::prompt::Substyle;

fn config_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join(name)
}

#[test]
fn test_default_config_is_jjj() {
    let cfg = load_from(&config_path("default.toml"), &Overrides::default()).unwrap();
    assert_eq!(cfg.persona.name, "J. Jonah Jameson");
    assert!(cfg.persona.instruction.starts_with("quip as if you are the character"));
    assert!(cfg.persona.instruction.ends_with("in quotes."));
    assert!(!cfg.persona.instruction.contains('\n'));
    assert_eq!(cfg.llm.substyle, Substyle::Alpaca);
    assert_eq!(cfg.llm.response_timeout, Duration::from_secs(15));
    assert_eq!(cfg.comms.discord.show_prompt_marker, "[show_prompt]");
}

#[test]
fn test_icebear_config() {
    let cfg = load_from(&config_path("icebear.toml"), &Overrides::default()).unwrap();
    assert_eq!(cfg.persona.name, "Ice Bear");
    assert_eq!(cfg.llm.substyle, Substyle::AlpacaInstruct);
    assert_eq!(cfg.llm.response_timeout, Duration::from_secs(60));
}

#[test]
fn test_env_style_overrides_apply_to_shipped_config() {
    let overrides = Overrides {
        substyle: Some("VICUNA".into()),
        timeout: Some("5".into()),
        ..Overrides::default()
    };
    let cfg = load_from(&config_path("icebear.toml"), &overrides).unwrap();
    assert_eq!(cfg.llm.substyle, Substyle::Vicuna);
    assert_eq!(cfg.llm.response_timeout, Duration::from_secs(5));
}

#[tokio::test]
async fn test_shipped_configs_build_comms_state() {
    for name in ["default.toml", "icebear.toml"] {
        let cfg = load_from(&config_path(name), &Overrides::default()).unwrap();
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let state = CommsState::from_config(&cfg, tx).unwrap();
        assert_eq!(state.persona_name(), cfg.persona.name);
    }
}
