//! Layout geometry and pixel acquisition.

use std::fmt;

use anyhow::{Context, Result};

use crate::{Layout, NormRect, OwnedImage};

/// Client area of the game window in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
	pub left: i32,
	pub top: i32,
	pub width: u32,
	pub height: u32,
}

/// Absolute screen rectangle to grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
	pub left: i32,
	pub top: i32,
	pub width: u32,
	pub height: u32,
}

impl PixelRect {
	/// Scale `norm` into `win`, truncating to whole pixels.
	pub fn from_norm(norm: &NormRect, win: &WindowRect) -> Self {
		Self {
			left: win.left + (norm.x * win.width as f32) as i32,
			top: win.top + (norm.y * win.height as f32) as i32,
			width: (norm.w * win.width as f32) as u32,
			height: (norm.h * win.height as f32) as u32,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowNotFound {
	pub title: String,
}

impl fmt::Display for WindowNotFound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "game window {:?} not found", self.title)
	}
}

impl std::error::Error for WindowNotFound {}

/// Finds the game window. Implementations return [`WindowNotFound`] (wrapped in
/// `anyhow`) when no window has the title.
pub trait WindowLocator {
	fn window_rect(&self, title: &str) -> Result<WindowRect>;
}

/// Grabs screen pixels. Errors may be transient.
pub trait Grabber {
	fn grab(&self, rect: PixelRect) -> Result<OwnedImage>;
}

pub struct RegionSampler {
	title: String,
	locator: Box<dyn WindowLocator>,
	grabber: Box<dyn Grabber>,
}

impl RegionSampler {
	pub fn new(title: impl Into<String>, locator: Box<dyn WindowLocator>, grabber: Box<dyn Grabber>) -> Self {
		Self {
			title: title.into(),
			locator,
			grabber,
		}
	}

	pub fn window_rect(&self) -> Result<WindowRect> {
		self.locator.window_rect(&self.title)
	}

	/// Capture one region of `layout` against `win`.
	pub fn capture_region(&self, layout: &Layout, idx: usize, win: &WindowRect) -> Result<OwnedImage> {
		let norm = layout
			.regions
			.get(idx)
			.with_context(|| format!("layout {} has no region {idx}", layout.name))?;
		self.grab(PixelRect::from_norm(norm, win))
	}

	/// Capture every region of `layout` against the same `win` snapshot.
	pub fn capture_all(&self, layout: &Layout, win: &WindowRect) -> Result<Vec<OwnedImage>> {
		layout
			.regions
			.iter()
			.map(|norm| self.grab(PixelRect::from_norm(norm, win)))
			.collect()
	}

	fn grab(&self, rect: PixelRect) -> Result<OwnedImage> {
		match self.grabber.grab(rect) {
			Ok(img) => Ok(img),
			Err(err) => {
				tracing::debug!(error = %err, ?rect, "grab failed, retrying once");
				self.grabber.grab(rect).with_context(|| format!("capture {rect:?}"))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::{Color, INVENTORY};

	struct Fixed(WindowRect);

	impl WindowLocator for Fixed {
		fn window_rect(&self, _title: &str) -> Result<WindowRect> {
			Ok(self.0)
		}
	}

	/// Fails the first `failures` grabs, then returns a solid image sized to the rect.
	struct Flaky {
		failures: Cell<u32>,
		calls: std::rc::Rc<Cell<u32>>,
	}

	impl Grabber for Flaky {
		fn grab(&self, rect: PixelRect) -> Result<OwnedImage> {
			self.calls.set(self.calls.get() + 1);
			if self.failures.get() > 0 {
				self.failures.set(self.failures.get() - 1);
				anyhow::bail!("stale handle");
			}
			Ok(OwnedImage::filled(rect.width, rect.height, Color::gray(255)))
		}
	}

	const WIN: WindowRect = WindowRect {
		left: 100,
		top: 50,
		width: 1920,
		height: 1080,
	};

	fn sampler(failures: u32) -> (RegionSampler, std::rc::Rc<Cell<u32>>) {
		let calls = std::rc::Rc::new(Cell::new(0));
		let grabber = Flaky {
			failures: Cell::new(failures),
			calls: calls.clone(),
		};
		(RegionSampler::new("Endfield", Box::new(Fixed(WIN)), Box::new(grabber)), calls)
	}

	#[test]
	fn norm_to_abs_truncates() {
		let rect = PixelRect::from_norm(&NormRect::new(0.785, 0.337, 0.16, 0.023), &WIN);
		assert_eq!(
			rect,
			PixelRect {
				left: 100 + 1507,
				top: 50 + 363,
				width: 307,
				height: 24
			}
		);
	}

	#[test]
	fn retries_once_then_succeeds() {
		let (s, calls) = sampler(1);
		let img = s.capture_region(&INVENTORY, 1, &WIN).unwrap();
		assert_eq!((img.width(), img.height()), (307, 24));
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn second_failure_surfaces() {
		let (s, calls) = sampler(2);
		assert!(s.capture_region(&INVENTORY, 0, &WIN).is_err());
		assert_eq!(calls.get(), 2);
	}

	#[test]
	fn capture_all_covers_every_region() {
		let (s, _) = sampler(0);
		let win = s.window_rect().unwrap();
		let imgs = s.capture_all(&INVENTORY, &win).unwrap();
		assert_eq!(imgs.len(), INVENTORY.regions.len());
		assert_eq!((imgs[4].width(), imgs[4].height()), (1, 1));
	}

	#[test]
	fn bad_index_is_an_error() {
		let (s, _) = sampler(0);
		assert!(s.capture_region(&INVENTORY, 9, &WIN).is_err());
	}
}
