use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::fs;

use serde::Deserialize;

use crate::error::EngineError;

/// Which convention-specific `Convention` implementation the driver wires into the game.
/// Selected once at construction time; there is no runtime convention switching mid-game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConventionKind {
	Encoder,
	Hgroup,
}

impl Display for ConventionKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ConventionKind::Encoder => write!(f, "hat-guessing encoder"),
			ConventionKind::Hgroup => write!(f, "H-Group"),
		}
	}
}

/// Behavioral configuration, read once at startup from `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub use_localhost: bool,
	#[serde(default)]
	pub bots: HashMap<String, String>,
	pub convention: ConventionKind,
	#[serde(default)]
	pub disconnect_on_game_end: bool,
}

impl Config {
	pub fn load(path: &str) -> Result<Self, EngineError> {
		let raw = fs::read_to_string(path).map_err(|e| EngineError::Protocol(format!("couldn't read {path}: {e}")))?;
		serde_json::from_str(&raw).map_err(EngineError::from)
	}

	/// Looks up the password for a bot username. The `.env` file (per-instance secrets, keyed
	/// `HANABI_PASSWORD_<USERNAME>`) takes priority so real credentials never need to live in
	/// the checked-in `config.json`; `bots[username]` is the fallback, matching what a
	/// `use_localhost` development server typically uses.
	pub fn password_for(&self, username: &str) -> Option<String> {
		let env_key = format!("HANABI_PASSWORD_{}", username.to_uppercase());
		dotenvy::var(env_key).ok().or_else(|| self.bots.get(username).cloned())
	}

	pub fn host(&self) -> (&'static str, &'static str, &'static str) {
		if self.use_localhost {
			("http", "ws", "localhost")
		} else {
			("https", "wss", "hanab.live")
		}
	}
}
