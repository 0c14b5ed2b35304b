//! Command line handling for portable mode.
//!
//! Argument lists include the executable path at index 0. Browser switches after a
//! `--` or `--single-argument` terminator are not switches, so every inserted
//! argument goes before it.

use crate::config::PortableConfig;

pub const PORTABLE_FLAG: &str = "--portable";

const USER_DATA_DIR: &str = "--user-data-dir=";
const DISK_CACHE_DIR: &str = "--disk-cache-dir=";
const DISABLE_FEATURES: &str = "--disable-features=";
const PROCESS_TYPE: &str = "--type=";

#[inline]
fn is_terminator(arg: &str) -> bool {
    arg == "--" || arg == "--single-argument"
}

/// Switch part of an argument list, without the executable path.
fn switches(args: &[String]) -> &[String] {
    let rest = args.get(1..).unwrap_or_default();
    let end = rest
        .iter()
        .position(|arg| is_terminator(arg))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Whether these are the arguments of the main browser process rather than a child
/// (renderer, gpu, utility) process.
pub fn is_browser_process(args: &[String]) -> bool {
    !switches(args)
        .iter()
        .any(|arg| arg.starts_with(PROCESS_TYPE))
}

pub fn has_portable_flag(args: &[String]) -> bool {
    switches(args).iter().any(|arg| arg == PORTABLE_FLAG)
}

/// Arguments injected on a portable relaunch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortableOptions {
    pub user_data_dir: Option<String>,
    pub disk_cache_dir: Option<String>,
    pub disable_features: Vec<String>,
    pub extra_args: Vec<String>,
}

impl PortableOptions {
    /// Resolve configured paths against the directory holding the executable.
    pub fn from_config(config: &PortableConfig, app_dir: &str) -> Self {
        let dir = |raw: &str| (!raw.is_empty()).then(|| expand_path(raw, app_dir));

        Self {
            user_data_dir: dir(&config.data_dir),
            disk_cache_dir: dir(&config.cache_dir),
            disable_features: config.disable_features.clone(),
            extra_args: split_command_line(&config.command_line),
        }
    }
}

/// Build the relaunch argument list.
///
/// Adds [`PORTABLE_FLAG`], merges every `--disable-features=` list into one, and adds
/// the profile and cache directories unless the user already passed them.
pub fn augment(args: &[String], options: &PortableOptions) -> Vec<String> {
    let Some((exe, rest)) = args.split_first() else {
        return Vec::new();
    };
    let head_len = switches(args).len();
    let (head, tail) = rest.split_at(head_len);

    let mut out = Vec::with_capacity(args.len() + 5);
    out.push(exe.clone());

    let mut features = Vec::new();
    for arg in head {
        match arg.strip_prefix(DISABLE_FEATURES) {
            Some(list) => merge_features(&mut features, list.split(',')),
            None => out.push(arg.clone()),
        }
    }
    merge_features(
        &mut features,
        options.disable_features.iter().map(String::as_str),
    );

    if !has_portable_flag(args) {
        out.push(PORTABLE_FLAG.to_owned());
    }

    for (prefix, value) in [
        (USER_DATA_DIR, &options.user_data_dir),
        (DISK_CACHE_DIR, &options.disk_cache_dir),
    ] {
        if let Some(value) = value {
            if !head.iter().any(|arg| arg.starts_with(prefix)) {
                out.push(format!("{prefix}{value}"));
            }
        }
    }

    if !features.is_empty() {
        out.push(format!("{DISABLE_FEATURES}{}", features.join(",")));
    }

    for arg in &options.extra_args {
        if !head.contains(arg) {
            out.push(arg.clone());
        }
    }

    out.extend(tail.iter().cloned());
    out
}

fn merge_features<'a>(features: &mut Vec<String>, new: impl Iterator<Item = &'a str>) {
    for feature in new.map(str::trim).filter(|feature| !feature.is_empty()) {
        if !features.iter().any(|existing| existing == feature) {
            features.push(feature.to_owned());
        }
    }
}

/// Split a configured argument string on whitespace, honoring double quotes.
pub fn split_command_line(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for ch in s.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            ch if ch.is_whitespace() && !quoted => {
                if pending {
                    args.push(core::mem::take(&mut current));
                    pending = false;
                }
            }
            ch => {
                current.push(ch);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }

    args
}

/// Expand `%app%` to `app_dir` and `%NAME%` to environment variables.
///
/// Unknown variables are left untouched.
pub fn expand_path(raw: &str, app_dir: &str) -> String {
    expand_with(raw, |name| {
        if name.eq_ignore_ascii_case("app") {
            Some(app_dir.to_owned())
        } else {
            std::env::var(name).ok()
        }
    })
}

fn expand_with(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            rest = &rest[start..];
            break;
        };

        let name = &after[..end];
        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => {
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                out.push_str(name);
                rest = &after[end..];
            }
        }
    }

    out.push_str(rest);
    out
}
