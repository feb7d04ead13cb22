//! One read cycle: pick a layout, capture, gate on quality, classify the three
//! stat lines, then re-read duplicates without the cache.

use std::{
	collections::HashSet,
	path::PathBuf,
	time::Instant,
};

use anyhow::Result;
use data::{Stat, StatTuple};

use crate::{
	Color, Layout, MenuGuard, OwnedImage, RegionSampler, StatClassifier, TextRecognizer,
	classifier::Source, guard::recognize_text,
};

/// Gold rarity colour (`#ffba03`) of the quality pixel.
pub const QUALITY_COLOR: Color = Color::new(255, 186, 3);
pub const COLOR_TOLERANCE: u8 = 10;

/// Plain switches the pipeline is constructed with.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
	pub require_three_stats: bool,
	pub use_quality_guard: bool,
	pub save_images: bool,
	pub log_debug: bool,
	/// Where `save_images` dumps captures.
	pub debug_dir: PathBuf,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			require_three_stats: true,
			use_quality_guard: true,
			save_images: false,
			log_debug: false,
			debug_dir: PathBuf::from("data/tmp/ocr_debug"),
		}
	}
}

/// Everything one [`LookupPipeline::read`] learned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
	pub layout: Option<&'static str>,
	pub menu_ok: bool,
	pub quality_ok: bool,
	/// Guard caption, only read when saving images.
	pub menu_text: String,
	pub raw_texts: [String; 3],
	pub stats: [Option<Stat>; 3],
	pub logs: Vec<String>,
}

impl RecognitionResult {
	fn rejected(menu_ok: bool, layout: Option<&'static str>, logs: Vec<String>) -> Self {
		Self {
			layout,
			menu_ok,
			logs,
			..Default::default()
		}
	}
}

pub struct LookupPipeline {
	config: PipelineConfig,
	layouts: Vec<Layout>,
	sampler: RegionSampler,
	guard: MenuGuard,
	classifier: StatClassifier,
	ocr: Box<dyn TextRecognizer>,
	debug_counter: u64,
	last: Option<RecognitionResult>,
}

impl LookupPipeline {
	pub fn new(
		config: PipelineConfig,
		layouts: Vec<Layout>,
		sampler: RegionSampler,
		guard: MenuGuard,
		classifier: StatClassifier,
		ocr: Box<dyn TextRecognizer>,
	) -> Self {
		Self {
			config,
			layouts,
			sampler,
			guard,
			classifier,
			ocr,
			debug_counter: 0,
			last: None,
		}
	}

	/// The most recent cycle's result.
	pub fn last_result(&self) -> Option<&RecognitionResult> {
		self.last.as_ref()
	}

	/// Run one full cycle.
	///
	/// Only environment failures (window gone, capture failing twice) are errors.
	/// "Nothing to read yet" outcomes are encoded in the result.
	pub fn read(&mut self) -> Result<RecognitionResult> {
		let result = self.read_inner()?;
		tracing::debug!(
			layout = result.layout,
			menu_ok = result.menu_ok,
			quality_ok = result.quality_ok,
			stats = ?result.stats,
			"read cycle"
		);
		self.last = Some(result.clone());
		Ok(result)
	}

	fn read_inner(&mut self) -> Result<RecognitionResult> {
		let t0 = Instant::now();
		let win = self.sampler.window_rect()?;
		let mut logs = Vec::new();

		// Selecting layout
		let mut chosen = None;
		for layout in &self.layouts {
			let menu_img = self.sampler.capture_region(layout, layout.menu_idx, &win)?;
			let check = self.guard.check(layout, &menu_img, self.ocr.as_ref());
			if check.accepted {
				if self.config.log_debug {
					logs.push(format!("[HIT] Menu Guard detected: {} menu", layout.name));
				}
				chosen = Some(layout.clone());
				break;
			}

			if self.config.save_images || self.config.log_debug {
				let path = self.config.debug_dir.join(format!("guard_{}_{}.png", layout.name, self.debug_counter));
				self.save_debug(&menu_img, path);
			}
			if self.config.log_debug {
				logs.push(format!("[MISS] Guard OCR '{}' for layout {}", check.text, layout.name));
			}
			self.debug_counter += 1;
		}

		let Some(layout) = chosen else {
			return Ok(RecognitionResult::rejected(false, None, logs));
		};

		// Capturing regions
		let t_cap = Instant::now();
		let imgs = self.sampler.capture_all(&layout, &win)?;
		let t_after_cap = Instant::now();

		if self.config.save_images {
			for (i, img) in imgs.iter().enumerate() {
				let path = self.config.debug_dir.join(format!("{}_region_{i}.png", layout.name));
				self.save_debug(img, path);
			}
		}

		// Checking quality
		if let Some(qidx) = layout.quality_idx
			&& self.config.use_quality_guard
		{
			let ok = imgs
				.get(qidx)
				.and_then(|img| img.as_image().first_pixel())
				.is_some_and(|px| px.within(QUALITY_COLOR, COLOR_TOLERANCE));
			if !ok {
				return Ok(RecognitionResult::rejected(true, Some(layout.name), logs));
			}
			if self.config.log_debug {
				logs.push("[HIT] Quality pixel matches #ffba03".to_string());
			}
		}

		let menu_text = if self.config.save_images {
			recognize_text(&imgs[layout.menu_idx], self.ocr.as_ref())
		} else {
			String::new()
		};

		// Classifying stats
		let mut stats: [Option<Stat>; 3] = [None; 3];
		let mut raw_texts: [String; 3] = Default::default();
		let mut faded = [false; 3];
		for (slot, &region) in layout.stat_indices.iter().enumerate() {
			let res = self.classifier.classify(&imgs[region], self.ocr.as_ref());
			if res.source == Source::LowContrast {
				faded[slot] = true;
				if self.config.log_debug {
					logs.push(format!("[SKIP] Stat region {} low contrast (fading)", slot + 1));
				}
			}
			stats[slot] = res.stat;
			raw_texts[slot] = res.raw;
		}

		// Resolving duplicates
		let mut seen = HashSet::new();
		for slot in 0..stats.len() {
			let duplicate = stats[slot].is_some_and(|s| seen.contains(&s));
			if (stats[slot].is_none() || duplicate) && !faded[slot] {
				let res = self.classifier.classify_ocr(&imgs[layout.stat_indices[slot]], self.ocr.as_ref());
				if self.config.log_debug {
					logs.push(format!("[RETRY] Stat region {} re-read without cache: {:?}", slot + 1, res.stat));
				}
				stats[slot] = res.stat;
				raw_texts[slot] = res.raw;
			}
			if let Some(stat) = stats[slot] {
				seen.insert(stat);
			}
		}

		if self.config.log_debug {
			let t_end = Instant::now();
			let ms = |a: Instant, b: Instant| b.duration_since(a).as_secs_f64() * 1000.0;
			logs.push(format!(
				"[TIMING] menu_check={:.1}ms capture={:.1}ms ocr={:.1}ms total={:.1}ms",
				ms(t0, t_cap),
				ms(t_cap, t_after_cap),
				ms(t_after_cap, t_end),
				ms(t0, t_end),
			));
		}

		Ok(RecognitionResult {
			layout: Some(layout.name),
			menu_ok: true,
			quality_ok: true,
			menu_text,
			raw_texts,
			stats,
			logs,
		})
	}

	/// Run a cycle and reduce it to a catalog query.
	///
	/// With `require_three_stats` only a full triple counts; otherwise a pair
	/// is accepted too. Resolved stats keep their region order.
	pub fn stat_tuple(&mut self) -> Result<Option<StatTuple>> {
		let result = self.read()?;
		if !result.quality_ok {
			return Ok(None);
		}

		let present = result.stats.iter().flatten().copied().collect::<Vec<_>>();
		Ok(match (present.len(), self.config.require_three_stats) {
			(3, _) | (2, false) => StatTuple::from_slice(&present),
			_ => None,
		})
	}

	fn save_debug(&self, img: &OwnedImage, path: PathBuf) {
		if let Err(err) = std::fs::create_dir_all(&self.config.debug_dir) {
			tracing::warn!(error = %err, "cannot create debug dir");
			return;
		}
		if let Err(err) = img.as_image().save_png(&path) {
			tracing::warn!(error = %err, path = %path.display(), "failed to save debug image");
		}
	}
}
