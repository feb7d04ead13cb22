//! Menu guard: is the layout's screen the one currently visible?

use std::{collections::HashMap, path::Path};

use image::GrayImage;

use crate::{Layout, OwnedImage, Signature, TextRecognizer, ocr, signature};

/// Max signature distance (of 256 bits) for an image guard hit.
pub const GUARD_HAMMING_THRESH: u32 = 40;
/// Min correlation peak for the template-matching fallback.
pub const GUARD_NCC_THRESH: f32 = 0.6;
/// Word every guard caption contains.
pub const GUARD_KEYWORD: &str = "essence";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
	/// Always accept.
	None,
	/// OCR the guard and look for the keyword.
	Ocr,
	/// Signature, then template correlation, against the stored guard image.
	#[default]
	Image,
}

struct GuardTemplate {
	gray: GrayImage,
	sig: Signature,
}

/// Outcome of one guard check. `text` is the OCR'd caption in [`GuardMode::Ocr`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuardCheck {
	pub accepted: bool,
	pub text: String,
}

pub struct MenuGuard {
	mode: GuardMode,
	templates: HashMap<&'static str, GuardTemplate>,
}

impl MenuGuard {
	pub fn new(mode: GuardMode) -> Self {
		Self {
			mode,
			templates: HashMap::new(),
		}
	}

	/// Load each layout's guard template from `data_dir`. Missing or unreadable
	/// files leave that layout without a template.
	pub fn load(mode: GuardMode, data_dir: impl AsRef<Path>, layouts: &[Layout]) -> Self {
		let mut guard = Self::new(mode);
		for layout in layouts {
			let path = data_dir.as_ref().join(layout.template_file);
			if !path.is_file() {
				tracing::debug!(layout = layout.name, path = %path.display(), "no guard template");
				continue;
			}
			match image::open(&path) {
				Ok(img) => guard.set_template(layout.name, img.to_luma8()),
				Err(err) => tracing::warn!(error = %err, path = %path.display(), "unreadable guard template"),
			}
		}
		guard
	}

	pub fn set_template(&mut self, layout: &'static str, gray: GrayImage) {
		let sig = Signature::of(&gray);
		self.templates.insert(layout, GuardTemplate { gray, sig });
	}

	pub fn check(&self, layout: &Layout, img: &OwnedImage, ocr: &dyn TextRecognizer) -> GuardCheck {
		match self.mode {
			GuardMode::None => GuardCheck {
				accepted: true,
				text: String::new(),
			},
			GuardMode::Image => GuardCheck {
				accepted: self.check_image(layout, img),
				text: String::new(),
			},
			GuardMode::Ocr => {
				let text = recognize_text(img, ocr).to_lowercase();
				GuardCheck {
					accepted: caption_matches(layout, &text),
					text,
				}
			}
		}
	}

	fn check_image(&self, layout: &Layout, img: &OwnedImage) -> bool {
		let Some(tpl) = self.templates.get(layout.name) else {
			return false;
		};
		let gray = img.to_gray_image();

		let dist = signature::distance(&Signature::of(&gray), &tpl.sig);
		if dist <= GUARD_HAMMING_THRESH {
			return true;
		}

		match match_template_peak(&gray, &tpl.gray) {
			Some(peak) => {
				tracing::trace!(layout = layout.name, dist, peak, "guard template fallback");
				peak >= GUARD_NCC_THRESH
			}
			None => false,
		}
	}
}

/// Preprocess, recognize, and keep the most confident line.
pub(crate) fn recognize_text(img: &OwnedImage, ocr: &dyn TextRecognizer) -> String {
	match crate::preprocess_for_ocr(img.as_image()) {
		Ok(prepped) => ocr::best_text(&ocr.recognize(prepped.as_image())),
		Err(err) => {
			tracing::warn!(error = %err, "ocr preprocessing failed");
			String::new()
		}
	}
}

fn caption_matches(layout: &Layout, lower: &str) -> bool {
	if lower.contains(GUARD_KEYWORD) {
		return true;
	}
	layout.guard_phrase.is_some_and(|phrase| lower.contains(phrase))
}

/// Peak zero-mean normalized cross-correlation of `tpl` slid over `img`.
/// `None` if the template doesn't fit.
pub fn match_template_peak(img: &GrayImage, tpl: &GrayImage) -> Option<f32> {
	let (iw, ih) = img.dimensions();
	let (tw, th) = tpl.dimensions();
	if tw == 0 || th == 0 || tw > iw || th > ih {
		return None;
	}

	let n = (tw * th) as f64;
	let t_mean = tpl.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
	let t_dev = tpl.pixels().map(|p| p.0[0] as f64 - t_mean).collect::<Vec<_>>();
	let t_norm = t_dev.iter().map(|d| d * d).sum::<f64>().sqrt();

	let mut peak = f64::MIN;
	for oy in 0..=(ih - th) {
		for ox in 0..=(iw - tw) {
			let mut sum = 0.0;
			for y in 0..th {
				for x in 0..tw {
					sum += img.get_pixel(ox + x, oy + y).0[0] as f64;
				}
			}
			let i_mean = sum / n;

			let mut cross = 0.0;
			let mut i_sq = 0.0;
			for y in 0..th {
				for x in 0..tw {
					let d = img.get_pixel(ox + x, oy + y).0[0] as f64 - i_mean;
					cross += d * t_dev[(y * tw + x) as usize];
					i_sq += d * d;
				}
			}

			let denom = i_sq.sqrt() * t_norm;
			let score = if denom > f64::EPSILON { cross / denom } else { 0.0 };
			peak = peak.max(score);
		}
	}
	Some(peak as f32)
}
