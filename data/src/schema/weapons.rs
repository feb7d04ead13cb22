use serde::{Deserialize, Serialize};

/// `weapons.json`: `{ "weapons": [ { "name": ..., "stats": [...] } ] }`.
///
/// Stats stay as raw strings so one unknown name doesn't fail the whole file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Weapons {
	#[serde(default)]
	pub weapons: Vec<Weapon>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Weapon {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub stats: Vec<String>,
}
