use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

fn normalize_ocr_dir(dir: PathBuf) -> PathBuf {
	// Allow the env var to point either to the app root (containing `ocr/`)
	// or directly to the `ocr/` folder.
	if dir.join("detection.mnn").is_file() {
		dir
	} else {
		dir.join("ocr")
	}
}

/// Places assets are searched: `ESSENCEBUDDY_ASSETS_DIR`, the working
/// directory, then the executable's directory.
fn search_roots() -> Vec<PathBuf> {
	let mut roots = Vec::new();
	if let Some(dir) = std::env::var_os("ESSENCEBUDDY_ASSETS_DIR") {
		roots.push(PathBuf::from(dir));
	}
	if let Ok(cwd) = std::env::current_dir() {
		roots.push(cwd);
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		roots.push(dir.to_path_buf());
	}
	// Compile-time path to the workspace root, for `cargo run` from elsewhere.
	#[cfg(debug_assertions)]
	roots.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	roots
}

/// Resolve OCR model paths for `lang_code` (e.g. `latin`).
pub fn resolve_ocr_assets(lang_code: &str) -> Result<OcrAssets> {
	let recognition_name = format!("{lang_code}_recognition.mnn");
	let charset_name = format!("{lang_code}_charset.txt");

	let mut tried = Vec::new();
	for base in search_roots() {
		let ocr_dir = normalize_ocr_dir(base);
		let detection = ocr_dir.join("detection.mnn");
		let recognition = ocr_dir.join(&recognition_name);
		let charset = ocr_dir.join(&charset_name);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			return Ok(OcrAssets { detection, recognition, charset });
		}

		tried.push(ocr_dir);
	}

	bail!(
		"OCR model files not found. Expected these files:\n  - ocr/detection.mnn\n  - ocr/{recognition_name}\n  - ocr/{charset_name}\n\nSearched in:\n{}\n\nFix: copy the 'ocr/' folder next to the executable (or set ESSENCEBUDDY_ASSETS_DIR to the folder that contains it).",
		tried
			.into_iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}

fn is_crate_dir(dir: &Path) -> bool {
	dir.join("Cargo.toml").is_file()
}

/// Resolve the data directory. Absolute paths are used as-is; relative ones
/// take the first existing directory under a search root that is not a cargo
/// package, and otherwise fall back to the per-user data folder.
pub fn resolve_data_dir(configured: &Path) -> PathBuf {
	if configured.is_absolute() {
		return configured.to_path_buf();
	}
	search_roots()
		.into_iter()
		.map(|root| root.join(configured))
		.find(|p| p.is_dir() && !is_crate_dir(p))
		.unwrap_or_else(crate::config::default_data_dir)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn absolute_data_dir_is_kept() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(resolve_data_dir(dir.path()), dir.path());
	}

	#[test]
	fn missing_relative_data_dir_falls_back() {
		let rel = Path::new("definitely-not-a-data-dir-3141");
		assert_eq!(resolve_data_dir(rel), crate::config::default_data_dir());
	}

	#[test]
	fn data_dir_never_lands_in_a_crate() {
		let default = crate::config::Config::default().data_dir;
		assert!(!is_crate_dir(&resolve_data_dir(&default)));
		// The workspace has a `data` library crate next to this one.
		assert!(!is_crate_dir(&resolve_data_dir(Path::new("data"))));
	}

	#[test]
	fn crate_dir_detection() {
		let dir = tempfile::tempdir().unwrap();
		assert!(!is_crate_dir(dir.path()));
		std::fs::write(dir.path().join("Cargo.toml"), b"[package]").unwrap();
		assert!(is_crate_dir(dir.path()));
	}

	#[test]
	fn ocr_dir_accepts_either_level() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(normalize_ocr_dir(dir.path().to_path_buf()), dir.path().join("ocr"));
		std::fs::write(dir.path().join("detection.mnn"), b"").unwrap();
		assert_eq!(normalize_ocr_dir(dir.path().to_path_buf()), dir.path());
	}
}
