use dotboy_core::joypad::{Button, ButtonEvent};
use log::warn;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub boot_rom: Option<PathBuf>,
    pub frames: Option<u64>,
    pub screenshot: Option<PathBuf>,
    pub pace: bool,
    pub input: Vec<InputEntry>,
}

/// One scripted button transition, applied once `frame` frames have been
/// presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputEntry {
    pub frame: u64,
    pub button: String,
    pub pressed: bool,
}

impl Default for InputEntry {
    fn default() -> Self {
        Self {
            frame: 0,
            button: String::new(),
            pressed: true,
        }
    }
}

impl InputEntry {
    pub fn event(&self) -> Option<ButtonEvent> {
        let button = Button::from_name(&self.button)?;
        Some(ButtonEvent {
            button,
            pressed: self.pressed,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
        std::env::var_os("APPDATA"),
    )
}

fn config_path_from(
    xdg: Option<OsString>,
    home: Option<OsString>,
    appdata: Option<OsString>,
) -> PathBuf {
    if let Some(xdg) = xdg {
        return PathBuf::from(xdg).join("dotboy").join("config.toml");
    }

    if let Some(home) = home {
        return PathBuf::from(home)
            .join(".config")
            .join("dotboy")
            .join("config.toml");
    }

    if let Some(appdata) = appdata {
        return PathBuf::from(appdata).join("dotboy").join("config.toml");
    }

    PathBuf::from("config.toml")
}

/// Read the config at `path`. A missing file is silently the default, a
/// malformed one is logged and replaced by the default.
pub fn load_from_file(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };

    match toml::from_str::<Config>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse config {}: {e}; using defaults",
                path.display()
            );
            Config::default()
        }
    }
}
