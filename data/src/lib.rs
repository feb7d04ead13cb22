use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::Path,
};

use anyhow::{Context, Result};

mod catalog;
pub use catalog::{InvalidArity, StatCatalog, StatTuple};
pub mod labels;
mod schema;
mod stat;
pub use stat::{Stat, UnknownStat};

impl StatCatalog {
	/// Parse a `weapons.json` document.
	///
	/// Unknown stat names are skipped with a warning; entries left with fewer
	/// than 2 usable stats (or no name) are skipped.
	pub fn from_json(json: &str) -> Result<Self> {
		let doc: schema::weapons::Weapons = serde_json::from_str(json).context("Parse weapons JSON")?;
		Ok(Self::from_schema(doc))
	}

	pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).with_context(|| format!("Open catalog {}", path.display()))?;
		let doc: schema::weapons::Weapons = serde_json::from_reader(BufReader::new(file))
			.with_context(|| format!("Parse catalog {}", path.display()))?;
		let catalog = Self::from_schema(doc);
		tracing::info!("Loaded {} weapons from {}", catalog.len(), path.display());
		Ok(catalog)
	}

	fn from_schema(doc: schema::weapons::Weapons) -> Self {
		let mut catalog = Self::new();
		for weapon in doc.weapons {
			let stats = weapon
				.stats
				.iter()
				.filter_map(|name| match name.parse::<Stat>() {
					Ok(stat) => Some(stat),
					Err(err) => {
						tracing::warn!("Skipping {err} in weapon {:?}", weapon.name.as_deref().unwrap_or(""));
						None
					}
				})
				.collect::<Vec<_>>();

			let Some(name) = weapon.name.filter(|n| !n.is_empty()) else {
				continue;
			};
			if stats.len() < 2 {
				continue;
			}
			if let Err(err) = catalog.add_entry(name, stats) {
				tracing::warn!("Skipping weapon: {err}");
			}
		}
		catalog
	}

	/// Serialize in the same shape [`StatCatalog::from_json`] reads, sorted by name.
	pub fn to_json(&self) -> Result<String> {
		serde_json::to_string_pretty(&self.to_schema()).context("Serialize catalog")
	}

	pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent).with_context(|| format!("Create catalog dir {}", parent.display()))?;
		}

		let tmp = path.with_extension("json.tmp");
		let file = File::create(&tmp).with_context(|| format!("Write catalog temp {}", tmp.display()))?;
		let mut writer = BufWriter::new(file);
		serde_json::to_writer_pretty(&mut writer, &self.to_schema()).context("Serialize catalog")?;
		writer.flush().context("Flush catalog")?;
		drop(writer);

		// Replace existing file (Windows-friendly).
		if std::fs::rename(&tmp, path).is_err() {
			let _ = std::fs::remove_file(path);
			std::fs::rename(&tmp, path).with_context(|| format!("Persist catalog {}", path.display()))?;
		}
		tracing::info!("Exported {} weapons -> {}", self.len(), path.display());
		Ok(())
	}

	fn to_schema(&self) -> schema::weapons::Weapons {
		schema::weapons::Weapons {
			weapons: self
				.iter()
				.map(|(name, stats)| schema::weapons::Weapon {
					name: Some(name.to_owned()),
					stats: stats.iter().map(|s| s.name().to_owned()).collect(),
				})
				.collect(),
		}
	}
}
