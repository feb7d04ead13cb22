//! Fuzzy matching of OCR text against the stat label table.

use crate::Stat;

/// Minimum similarity for a fuzzy label match.
pub const MATCH_THRESHOLD: f64 = 0.90;
/// How far the best stat must lead the runner-up stat.
pub const MATCH_MARGIN: f64 = 0.07;

// Absorbs rounding when a gap lands exactly on the margin.
const SCORE_EPSILON: f64 = 1e-9;

/// Lower-case, keep only alphanumerics and spaces, collapse whitespace.
pub fn normalize(text: &str) -> String {
	text.chars()
		.filter(|c| c.is_alphanumeric() || c.is_whitespace())
		.flat_map(char::to_lowercase)
		.collect::<String>()
		.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
}

/// Similarity ratio in `[0, 1]` derived from the Levenshtein distance.
pub fn similarity(a: &str, b: &str) -> f64 {
	let len = a.chars().count().max(b.chars().count());
	if len == 0 {
		return 1.0;
	}
	1.0 - levenshtein::levenshtein(a, b) as f64 / len as f64
}

/// Resolve raw OCR text to a stat using the default threshold and margin.
pub fn choose_stat(text: &str) -> Option<Stat> {
	choose_stat_with(text, MATCH_THRESHOLD, MATCH_MARGIN)
}

/// Resolve raw OCR text to a stat.
///
/// An exact normalized match wins immediately. Otherwise each stat scores as
/// its best alias, and the top stat is only accepted if it clears `threshold`
/// and leads the second stat by at least `margin`.
pub fn choose_stat_with(text: &str, threshold: f64, margin: f64) -> Option<Stat> {
	let text = normalize(text);
	if text.is_empty() {
		return None;
	}

	let mut best: Option<(Stat, f64)> = None;
	let mut second: Option<f64> = None;

	for &stat in Stat::ALL {
		let mut score = 0.0f64;
		for label in stat.labels() {
			let label = normalize(label);
			if label == text {
				return Some(stat);
			}
			score = score.max(similarity(&text, &label));
		}

		match best {
			Some((_, best_score)) if score <= best_score => {
				if second.is_none_or(|s| score > s) {
					second = Some(score);
				}
			}
			_ => {
				second = best.map(|(_, s)| s);
				best = Some((stat, score));
			}
		}
	}

	let (stat, score) = best?;
	if score < threshold {
		return None;
	}
	match second {
		Some(s) if score - s + SCORE_EPSILON < margin => None,
		_ => Some(stat),
	}
}
