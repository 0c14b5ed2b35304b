//! `browser-plus.ini` configuration.
//!
//! The file is read once at startup. A missing file yields the defaults and a
//! malformed value only resets that value to its default, so a typo never
//! disables the whole feature set.

use std::{io, path::Path, sync::Arc};

use ini::{Ini, ParseOption, Properties};
use thiserror::Error;
use tracing::{debug, warn};

use crate::hotkey::{Hotkey, KeyMapping};

pub const CONFIG_FILE_NAME: &str = "browser-plus.ini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] ini::ParseError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub general: GeneralConfig,
    pub tabs: TabConfig,
    pub portable: PortableConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralConfig {
    /// Accelerator toggling the boss key, `None` when disabled.
    pub boss_key: Option<Hotkey>,
    pub key_mapping: Vec<KeyMapping>,
    /// Rewrite the about page inside `resources.pak`.
    pub about_page: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            boss_key: None,
            key_mapping: Vec::new(),
            about_page: true,
        }
    }
}

/// Where a link opened by a behavior lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewTabMode {
    #[default]
    Disabled,
    Foreground,
    Background,
}

impl NewTabMode {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "0" | "disabled" | "off" | "false" => NewTabMode::Disabled,
            "1" | "foreground" => NewTabMode::Foreground,
            "2" | "background" => NewTabMode::Background,
            _ => return None,
        })
    }

    #[inline]
    pub fn is_enabled(self) -> bool {
        self != NewTabMode::Disabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabConfig {
    pub double_click_close: bool,
    pub right_click_close: bool,
    pub keep_last_tab: bool,
    pub wheel_tab: bool,
    pub wheel_tab_when_press_rbutton: bool,
    pub open_url_new_tab: NewTabMode,
    pub bookmark_new_tab: NewTabMode,
    /// Skip new-tab behaviors while the current tab is a new-tab page.
    pub new_tab_disable: bool,
    /// Extra selected-tab names treated as a new-tab page.
    pub new_tab_disable_names: Vec<String>,
    /// Also inspect the document URL. Needs renderer accessibility to be on.
    pub new_tab_check_document: bool,
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            double_click_close: true,
            right_click_close: false,
            keep_last_tab: true,
            wheel_tab: true,
            wheel_tab_when_press_rbutton: true,
            open_url_new_tab: NewTabMode::Disabled,
            bookmark_new_tab: NewTabMode::Disabled,
            new_tab_disable: true,
            new_tab_disable_names: Vec::new(),
            new_tab_check_document: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableConfig {
    pub enabled: bool,
    pub data_dir: String,
    pub cache_dir: String,
    pub disable_features: Vec<String>,
    /// Extra arguments appended on relaunch, shell-quoted.
    pub command_line: String,
}

impl Default for PortableConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: r"%app%\..\Data".to_owned(),
            cache_dir: r"%app%\..\Cache".to_owned(),
            disable_features: vec!["RendererCodeIntegrity".to_owned()],
            command_line: String::new(),
        }
    }
}

impl Config {
    /// Load the configuration file at `path`, falling back to defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Arc<Self>, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no configuration at {}, using defaults", path.display());
                return Ok(Arc::new(Self::default()));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Arc::new(Self::parse(&content)?))
    }

    /// Parse configuration text. Backslashes and quotes are kept verbatim.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };

        Ok(Self::from_ini(&Ini::load_from_str_opt(s, opt)?))
    }

    pub fn from_ini(ini: &Ini) -> Self {
        let mut config = Self::default();

        if let Some(general) = ini.section(Some("general")) {
            let cfg = &mut config.general;

            if let Some(value) = scalar(general, "boss_key") {
                match Hotkey::parse(value) {
                    Ok(hotkey) => cfg.boss_key = hotkey,
                    Err(err) => warn!("ignoring general.boss_key. err: {err}"),
                }
            }

            // `;` separates mappings here
            if let Some(value) = value_with(general, "key_mapping", &['#']) {
                match KeyMapping::parse_list(value) {
                    Ok(mapping) => cfg.key_mapping = mapping,
                    Err(err) => warn!("ignoring general.key_mapping. err: {err}"),
                }
            }

            read_bool(general, "general", "about_page", &mut cfg.about_page);
        }

        if let Some(tabs) = ini.section(Some("tabs")) {
            let cfg = &mut config.tabs;
            read_bool(tabs, "tabs", "double_click_close", &mut cfg.double_click_close);
            read_bool(tabs, "tabs", "right_click_close", &mut cfg.right_click_close);
            read_bool(tabs, "tabs", "keep_last_tab", &mut cfg.keep_last_tab);
            read_bool(tabs, "tabs", "wheel_tab", &mut cfg.wheel_tab);
            read_bool(
                tabs,
                "tabs",
                "wheel_tab_when_press_rbutton",
                &mut cfg.wheel_tab_when_press_rbutton,
            );
            read_mode(tabs, "open_url_new_tab", &mut cfg.open_url_new_tab);
            read_mode(tabs, "bookmark_new_tab", &mut cfg.bookmark_new_tab);
            read_bool(tabs, "tabs", "new_tab_disable", &mut cfg.new_tab_disable);
            if let Some(value) = scalar(tabs, "new_tab_disable_name") {
                cfg.new_tab_disable_names = parse_name_list(value);
            }
            read_bool(
                tabs,
                "tabs",
                "new_tab_check_document",
                &mut cfg.new_tab_check_document,
            );
        }

        if let Some(portable) = ini.section(Some("portable")) {
            let cfg = &mut config.portable;
            read_bool(portable, "portable", "enabled", &mut cfg.enabled);
            if let Some(value) = scalar(portable, "data_dir") {
                cfg.data_dir = value.trim().to_owned();
            }
            if let Some(value) = scalar(portable, "cache_dir") {
                cfg.cache_dir = value.trim().to_owned();
            }
            if let Some(value) = scalar(portable, "disable_features") {
                cfg.disable_features = value
                    .split(',')
                    .map(str::trim)
                    .filter(|feature| !feature.is_empty())
                    .map(str::to_owned)
                    .collect();
            }
            if let Some(value) = scalar(portable, "command_line") {
                cfg.command_line = value.trim().to_owned();
            }
        }

        config
    }
}

/// Value of `key` without a trailing `;` or `#` comment.
fn scalar<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    value_with(props, key, &[';', '#'])
}

fn value_with<'a>(props: &'a Properties, key: &str, markers: &[char]) -> Option<&'a str> {
    props
        .get(key)
        .map(|value| strip_inline_comment(value, markers))
}

/// Cut `value` at the first comment marker that follows whitespace outside double quotes.
fn strip_inline_comment<'a>(value: &'a str, markers: &[char]) -> &'a str {
    let mut quoted = false;
    let mut after_space = false;

    for (i, ch) in value.char_indices() {
        if ch == '"' {
            quoted = !quoted;
        } else if !quoted && after_space && markers.contains(&ch) {
            return value[..i].trim_end();
        }

        after_space = ch.is_whitespace();
    }

    value
}

fn read_bool(props: &Properties, section: &str, key: &str, out: &mut bool) {
    let Some(value) = scalar(props, key) else {
        return;
    };

    match parse_bool(value) {
        Some(value) => *out = value,
        None => warn!("ignoring {section}.{key}: `{value}` is not a boolean"),
    }
}

fn read_mode(props: &Properties, key: &str, out: &mut NewTabMode) {
    let Some(value) = scalar(props, key) else {
        return;
    };

    match NewTabMode::parse(value) {
        Some(mode) => *out = mode,
        None => warn!("ignoring tabs.{key}: `{value}` is not a new tab mode"),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated list of names. Entries may be double-quoted to keep commas.
pub fn parse_name_list(s: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in s.chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                push_name(&mut names, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_name(&mut names, &current);

    names
}

fn push_name(names: &mut Vec<String>, raw: &str) {
    let name = raw.trim();
    if !name.is_empty() {
        names.push(name.to_owned());
    }
}
