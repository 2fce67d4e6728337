//! User configuration stored in `~/.maprender/config.ini`.
//!
//! ```ini
//! [provider]
//! base_url = https://tile.openstreetmap.org
//! extension = png
//! user_agent = maprender/0.1.0 (+https://github.com/maprender/maprender)
//! timeout = 30
//! max_zoom = 19
//!
//! [cache]
//! directory = ~/.maprender/cache
//!
//! [render]
//! max_concurrent_fetches = 16
//! coalesce_fetches = true
//! timeout = 120
//! ```
//!
//! Missing keys keep their defaults; a missing file is all defaults.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFile, ConfigFileError};
pub use settings::{CacheSettings, ProviderSettings, RenderSettings};
