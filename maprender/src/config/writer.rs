//! INI serialization: `ConfigFile` → commented INI string.

use super::settings::ConfigFile;

/// Renders `config` as the text written to `config.ini`.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[provider]
; Tile server root; tiles are requested as {{base_url}}/{{zoom}}/{{x}}/{{y}}.{{extension}}
base_url = {}
extension = {}
; Identify your application; public servers block anonymous clients
user_agent = {}
; Per-request timeout in seconds
timeout = {}
; Highest zoom level the server provides
max_zoom = {}

[cache]
; Tiles are stored here as {{x}}_{{y}}_{{zoom}}.{{extension}} and never evicted
directory = {}

[render]
; Tile requests in flight at once
max_concurrent_fetches = {}
; Fetch a tile once even if several grid cells need it
coalesce_fetches = {}
; Render timeout in seconds (0 = no limit)
timeout = {}
"#,
        config.provider.base_url,
        config.provider.extension,
        config.provider.user_agent,
        config.provider.timeout,
        config.provider.max_zoom,
        config.cache.directory.display(),
        config.render.max_concurrent_fetches,
        config.render.coalesce_fetches,
        config.render.timeout,
    )
}
