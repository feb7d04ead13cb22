//! `xcap`-backed window lookup and screen grabs.

use anyhow::{Context, Result};
use xcap::image::EncodableLayout;
use ie::{PixelRect, WindowNotFound, WindowRect};

fn find_window(title: &str) -> Result<xcap::Window> {
	let windows = xcap::Window::all().context("enumerate windows")?;
	windows
		.into_iter()
		.find(|window| window.title().ok().as_deref() == Some(title))
		.ok_or_else(|| WindowNotFound { title: title.to_owned() }.into())
}

pub struct XcapWindows;

impl ie::WindowLocator for XcapWindows {
	fn window_rect(&self, title: &str) -> Result<WindowRect> {
		let window = find_window(title)?;
		Ok(WindowRect {
			left: window.x().context("window x")?,
			top: window.y().context("window y")?,
			width: window.width().context("window width")?,
			height: window.height().context("window height")?,
		})
	}
}

/// Grabs from whichever monitor holds the rectangle's top-left corner.
pub struct XcapGrabber;

impl ie::Grabber for XcapGrabber {
	fn grab(&self, rect: PixelRect) -> Result<ie::OwnedImage> {
		let monitor = xcap::Monitor::from_point(rect.left, rect.top)
			.with_context(|| format!("no monitor at ({}, {})", rect.left, rect.top))?;
		let x = (rect.left - monitor.x().context("monitor x")?).max(0) as u32;
		let y = (rect.top - monitor.y().context("monitor y")?).max(0) as u32;

		let img = monitor
			.capture_region(x, y, rect.width.max(1), rect.height.max(1))
			.with_context(|| format!("capture {rect:?}"))?;
		Ok(ie::OwnedImage::from_rgba(img.width() as usize, img.as_bytes()))
	}
}
