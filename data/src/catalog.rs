use std::{
	collections::{BTreeSet, HashMap, HashSet},
	fmt,
};

use crate::Stat;

/// A 2- or 3-stat query against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatTuple {
	Two([Stat; 2]),
	Three([Stat; 3]),
}

impl StatTuple {
	pub fn as_slice(&self) -> &[Stat] {
		match self {
			Self::Two(v) => v,
			Self::Three(v) => v,
		}
	}

	/// Build from 2 or 3 stats in order; any other count yields `None`.
	pub fn from_slice(stats: &[Stat]) -> Option<Self> {
		match *stats {
			[a, b] => Some(Self::Two([a, b])),
			[a, b, c] => Some(Self::Three([a, b, c])),
			_ => None,
		}
	}
}

impl fmt::Display for StatTuple {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let names = self.as_slice().iter().map(|s| s.name()).collect::<Vec<_>>();
		f.write_str(&names.join(", "))
	}
}

/// A weapon was added with a distinct stat count outside `2..=3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArity {
	pub name: String,
	pub count: usize,
}

impl fmt::Display for InvalidArity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "weapon {:?} must have 2 or 3 unique stats, got {}", self.name, self.count)
	}
}

impl std::error::Error for InvalidArity {}

/// Weapons keyed by name plus an inverted stat -> names index.
#[derive(Debug, Clone, Default)]
pub struct StatCatalog {
	weapons: HashMap<String, BTreeSet<Stat>>,
	by_stat: HashMap<Stat, HashSet<String>>,
}

impl StatCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace a weapon. Duplicate stats collapse before the arity check.
	pub fn add_entry(&mut self, name: impl Into<String>, stats: impl IntoIterator<Item = Stat>) -> Result<(), InvalidArity> {
		let name = name.into();
		let stats = stats.into_iter().collect::<BTreeSet<_>>();
		if !(2..=3).contains(&stats.len()) {
			return Err(InvalidArity { name, count: stats.len() });
		}

		// Keep the inverted index in sync when an existing name is overwritten.
		if let Some(old) = self.weapons.get(&name) {
			for stat in old.difference(&stats) {
				if let Some(bucket) = self.by_stat.get_mut(stat) {
					bucket.remove(&name);
					if bucket.is_empty() {
						self.by_stat.remove(stat);
					}
				}
			}
		}

		for &stat in &stats {
			self.by_stat.entry(stat).or_default().insert(name.clone());
		}
		self.weapons.insert(name, stats);
		Ok(())
	}

	/// Names of every weapon whose required stats contain all of `query`.
	///
	/// Repeated stats in the query just add no extra constraint.
	pub fn lookup(&self, query: &StatTuple) -> BTreeSet<String> {
		let mut stats = query.as_slice().iter();
		let Some(first) = stats.next() else {
			return BTreeSet::new();
		};
		let Some(bucket) = self.by_stat.get(first) else {
			return BTreeSet::new();
		};

		let mut result = bucket.iter().collect::<HashSet<_>>();
		for stat in stats {
			let Some(bucket) = self.by_stat.get(stat) else {
				return BTreeSet::new();
			};
			result.retain(|name| bucket.contains(*name));
			if result.is_empty() {
				return BTreeSet::new();
			}
		}

		result.into_iter().cloned().collect()
	}

	pub fn get(&self, name: &str) -> Option<&BTreeSet<Stat>> {
		self.weapons.get(name)
	}

	pub fn len(&self) -> usize {
		self.weapons.len()
	}

	pub fn is_empty(&self) -> bool {
		self.weapons.is_empty()
	}

	/// Weapons sorted by name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Stat>)> {
		let mut entries = self.weapons.iter().map(|(k, v)| (k.as_str(), v)).collect::<Vec<_>>();
		entries.sort_by_key(|(name, _)| *name);
		entries.into_iter()
	}
}
