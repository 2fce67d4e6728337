//! INI parsing: `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::defaults::DEFAULT_MAX_ZOOM;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parses an `Ini` into a `ConfigFile`, starting from defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider]
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "provider",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.provider.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = section.get("extension") {
            let v = v.trim().trim_start_matches('.');
            if v.is_empty() {
                return Err(invalid("provider", "extension", v, "must not be empty"));
            }
            config.provider.extension = v.to_string();
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid(
                    "provider",
                    "user_agent",
                    v,
                    "tile servers reject requests without a User-Agent",
                ));
            }
            config.provider.user_agent = v.to_string();
        }
        if let Some(v) = section.get("timeout") {
            config.provider.timeout = match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(invalid(
                        "provider",
                        "timeout",
                        v,
                        "must be a positive integer (seconds)",
                    ))
                }
            };
        }
        if let Some(v) = section.get("max_zoom") {
            config.provider.max_zoom = match v.trim().parse::<u8>() {
                Ok(zoom) if zoom <= MAX_ZOOM => zoom,
                _ => {
                    return Err(invalid(
                        "provider",
                        "max_zoom",
                        v,
                        &format!("must be 0-24 (default {})", DEFAULT_MAX_ZOOM),
                    ))
                }
            };
        }
    }

    // [cache]
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
    }

    // [render]
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("max_concurrent_fetches") {
            config.render.max_concurrent_fetches = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(invalid(
                        "render",
                        "max_concurrent_fetches",
                        v,
                        "must be a positive integer",
                    ))
                }
            };
        }
        if let Some(v) = section.get("coalesce_fetches") {
            config.render.coalesce_fetches = parse_bool(v)
                .ok_or_else(|| invalid("render", "coalesce_fetches", v, "must be true or false"))?;
        }
        if let Some(v) = section.get("timeout") {
            config.render.timeout = v.trim().parse().map_err(|_| {
                invalid(
                    "render",
                    "timeout",
                    v,
                    "must be a non-negative integer (seconds, 0 disables)",
                )
            })?;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Expands a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
