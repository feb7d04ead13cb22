//! Per-line stat classification: contrast gate, template cache, then OCR.

use std::{
	collections::BTreeMap,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use data::Stat;

use crate::{OwnedImage, Signature, TextRecognizer, guard::recognize_text, signature};

/// Below this luma standard deviation the line is still fading in.
pub const STAT_CONTRAST_MIN: f32 = 25.0;
/// Cache hit regardless of the runner-up.
pub const STAT_HAMMING_STRICT: u32 = 12;
/// Cache hit if the runner-up is at least [`STAT_HAMMING_MARGIN`] further away.
pub const STAT_HAMMING_THRESH: u32 = 40;
pub const STAT_HAMMING_MARGIN: u32 = 8;

/// Reference signatures of previously resolved stat lines, one per stat.
///
/// On disk this is a directory of `<STAT_NAME>.png` files; the file existing is
/// the cache entry.
#[derive(Debug, Default)]
pub struct StatCache {
	dir: Option<PathBuf>,
	sigs: BTreeMap<Stat, Signature>,
}

impl StatCache {
	/// Cache that never touches disk.
	pub fn in_memory() -> Self {
		Self::default()
	}

	/// Load every `<STAT_NAME>.png` in `dir`, creating the directory if needed.
	/// Files whose stem isn't a stat, or that fail to decode, are ignored.
	pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
		let dir = dir.into();
		std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

		let mut sigs = BTreeMap::new();
		for entry in std::fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
			let path = entry?.path();
			if path.extension().and_then(|e| e.to_str()) != Some("png") {
				continue;
			}
			let Some(stat) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse::<Stat>().ok()) else {
				continue;
			};
			match image::open(&path) {
				Ok(img) => {
					sigs.insert(stat, Signature::of(&img.to_luma8()));
				}
				Err(err) => tracing::warn!(error = %err, path = %path.display(), "skipping unreadable stat template"),
			}
		}

		tracing::debug!(count = sigs.len(), dir = %dir.display(), "loaded stat templates");
		Ok(Self { dir: Some(dir), sigs })
	}

	pub fn len(&self) -> usize {
		self.sigs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sigs.is_empty()
	}

	pub fn contains(&self, stat: Stat) -> bool {
		self.sigs.contains_key(&stat)
	}

	pub fn insert(&mut self, stat: Stat, sig: Signature) {
		self.sigs.insert(stat, sig);
	}

	fn path_for(dir: &Path, stat: Stat) -> PathBuf {
		dir.join(format!("{}.png", stat.name()))
	}

	/// Nearest cached stat, if it is close enough and unambiguous.
	pub fn lookup(&self, sig: &Signature) -> Option<Stat> {
		let mut best: Option<(Stat, u32)> = None;
		let mut second: Option<u32> = None;
		for (&stat, tpl) in &self.sigs {
			let dist = signature::distance(sig, tpl);
			match best {
				Some((_, b)) if dist >= b => {
					if second.is_none_or(|s| dist < s) {
						second = Some(dist);
					}
				}
				_ => {
					second = best.map(|(_, b)| b);
					best = Some((stat, dist));
				}
			}
		}

		let (stat, dist) = best?;
		if dist <= STAT_HAMMING_STRICT {
			return Some(stat);
		}
		let runner = second.unwrap_or(signature::SIG_BITS);
		(dist <= STAT_HAMMING_THRESH && runner - dist >= STAT_HAMMING_MARGIN).then_some(stat)
	}

	/// Store `img` as the template for `stat` unless one already exists.
	pub fn persist(&mut self, stat: Stat, img: &OwnedImage) -> Result<()> {
		if self.contains(stat) {
			return Ok(());
		}
		let gray = img.to_gray_image();
		if let Some(dir) = &self.dir {
			let path = Self::path_for(dir, stat);
			if path.exists() {
				return Ok(());
			}
			gray.save_with_format(&path, image::ImageFormat::Png)
				.with_context(|| format!("write {}", path.display()))?;
			tracing::info!(%stat, path = %path.display(), "saved stat template");
		}
		self.sigs.insert(stat, Signature::of(&gray));
		Ok(())
	}
}

/// How a line's result was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
	LowContrast,
	Cache,
	Ocr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
	pub stat: Option<Stat>,
	/// OCR text, or the stat name on a cache hit.
	pub raw: String,
	pub source: Source,
}

pub struct StatClassifier {
	cache: StatCache,
	use_cache: bool,
	create_cache: bool,
}

impl StatClassifier {
	pub fn new(cache: StatCache, use_cache: bool, create_cache: bool) -> Self {
		Self {
			cache,
			use_cache,
			create_cache,
		}
	}

	pub fn cache(&self) -> &StatCache {
		&self.cache
	}

	pub fn is_low_contrast(img: &OwnedImage) -> bool {
		crate::gray_std_dev(&img.to_gray_image()) < STAT_CONTRAST_MIN
	}

	/// Full strategy: contrast gate, cache, OCR, then cache write-back.
	pub fn classify(&mut self, img: &OwnedImage, ocr: &dyn TextRecognizer) -> Classification {
		if Self::is_low_contrast(img) {
			return Classification {
				stat: None,
				raw: String::new(),
				source: Source::LowContrast,
			};
		}

		if self.use_cache
			&& let Some(stat) = self.cache.lookup(&Signature::of(&img.to_gray_image()))
		{
			return Classification {
				stat: Some(stat),
				raw: stat.name().to_owned(),
				source: Source::Cache,
			};
		}

		let result = Self::recognize(img, ocr);
		if self.create_cache
			&& let Some(stat) = result.stat
			&& let Err(err) = self.cache.persist(stat, img)
		{
			tracing::warn!(error = %err, %stat, "failed to persist stat template");
		}
		result
	}

	/// OCR-only path, bypassing the cache. Still honours the contrast gate.
	pub fn classify_ocr(&self, img: &OwnedImage, ocr: &dyn TextRecognizer) -> Classification {
		if Self::is_low_contrast(img) {
			return Classification {
				stat: None,
				raw: String::new(),
				source: Source::LowContrast,
			};
		}
		Self::recognize(img, ocr)
	}

	fn recognize(img: &OwnedImage, ocr: &dyn TextRecognizer) -> Classification {
		let raw = recognize_text(img, ocr);
		Classification {
			stat: data::labels::choose_stat(&raw),
			raw,
			source: Source::Ocr,
		}
	}
}
