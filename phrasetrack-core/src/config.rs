use std::path::{Path, PathBuf};

use phrasetrack_types::Tempo;
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<f32>,
    ppq: Option<u16>,
}

#[derive(Deserialize, Default)]
struct EngineConfig {
    enabled: Option<bool>,
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    autosave: Option<bool>,
}

pub struct Config {
    defaults: DefaultsConfig,
    engine: EngineConfig,
    runtime: RuntimeConfig,
}

impl Config {
    /// Embedded defaults merged with the user's `config.toml`, if any.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    pub fn load_from(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_engine(&mut base.engine, user.engine);
                            merge_runtime(&mut base.runtime, user.runtime);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            engine: base.engine,
            runtime: base.runtime,
        }
    }

    /// Tempo for new projects. Out-of-range values fall back to the built-in defaults.
    pub fn default_tempo(&self) -> Tempo {
        let fallback = Tempo::default();
        Tempo {
            bpm: self
                .defaults
                .bpm
                .filter(|bpm| *bpm > 0.0 && bpm.is_finite())
                .unwrap_or(fallback.bpm),
            ppq: self.defaults.ppq.filter(|ppq| *ppq > 0).unwrap_or(fallback.ppq),
        }
    }

    pub fn engine_enabled(&self) -> bool {
        self.engine.enabled.unwrap_or(true)
    }

    pub fn engine_host(&self) -> &str {
        self.engine.host.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn engine_port(&self) -> u16 {
        self.engine.port.unwrap_or(57120)
    }

    /// Whether the project is saved on shutdown.
    pub fn autosave_enabled(&self) -> bool {
        self.runtime.autosave.unwrap_or(true)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("phrasetrack").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.ppq.is_some() {
        base.ppq = user.ppq;
    }
}

fn merge_engine(base: &mut EngineConfig, user: EngineConfig) {
    if user.enabled.is_some() {
        base.enabled = user.enabled;
    }
    if user.host.is_some() {
        base.host = user.host;
    }
    if user.port.is_some() {
        base.port = user.port;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.autosave.is_some() {
        base.autosave = user.autosave;
    }
}
