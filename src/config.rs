//! Optional `config.json` in the data directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Unable to read {}: {source}", .path.display())]
	Read { path: PathBuf, source: io::Error },

	#[error("Invalid config in {}: {source}", .path.display())]
	Parse { path: PathBuf, source: serde_json::Error },
}

///startup settings, every field is optional in the file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	///interactive prompt
	pub prompt: String,
	///tracing filter directive, `RUST_LOG` takes precedence
	pub log: Option<String>
}
impl Default for Config {
	fn default() -> Self {
		Self {
			prompt: "clic> ".into(),
			log: None
		}
	}
}
impl Config {
	///read `config.json` from `dir`, defaults if there is none
	pub fn load(dir: &Path) -> Result<Self, ConfigError> {
		let path = dir.join(CONFIG_FILE);
		let text = match fs::read_to_string(&path) {
			Ok(t) => t,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {return Ok(Self::default());},
			Err(source) => {return Err(ConfigError::Read {path, source});}
		};
		serde_json::from_str(&text).map_err(|source| ConfigError::Parse {path, source})
	}
}

///`~/.clic`
pub fn default_home() -> Option<PathBuf> {
	dirs::home_dir().map(|h| h.join(".clic"))
}
