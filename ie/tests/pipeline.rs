use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use data::{Stat, StatCatalog, StatTuple};
use ie::{
	Color, GuardMode, Image, LookupPipeline, MenuGuard, OwnedImage, PipelineConfig, PixelRect, RegionSampler,
	Signature, StatCache, StatClassifier, TextLine, TextRecognizer, WindowLocator, WindowNotFound, WindowRect,
	default_layouts,
};

const WIN: WindowRect = WindowRect {
	left: 0,
	top: 0,
	width: 1000,
	height: 1000,
};

struct Window(Option<WindowRect>);

impl WindowLocator for Window {
	fn window_rect(&self, title: &str) -> anyhow::Result<WindowRect> {
		self.0.ok_or_else(|| WindowNotFound { title: title.to_owned() }.into())
	}
}

/// Screen content keyed by the grabbed rectangle.
struct Screen(Box<dyn Fn(PixelRect) -> anyhow::Result<OwnedImage>>);

impl ie::Grabber for Screen {
	fn grab(&self, rect: PixelRect) -> anyhow::Result<OwnedImage> {
		(self.0)(rect)
	}
}

/// Answers OCR calls from a queue, in call order.
#[derive(Clone, Default)]
struct Script(Rc<RefCell<VecDeque<&'static str>>>, Rc<RefCell<u32>>);

impl Script {
	fn new(lines: &[&'static str]) -> Self {
		Self(Rc::new(RefCell::new(lines.iter().copied().collect())), Rc::default())
	}

	fn calls(&self) -> u32 {
		*self.1.borrow()
	}
}

impl TextRecognizer for Script {
	fn recognize(&self, _image: Image) -> Vec<TextLine> {
		*self.1.borrow_mut() += 1;
		match self.0.borrow_mut().pop_front() {
			Some(text) => vec![TextLine::new(text, 0.9)],
			None => Vec::new(),
		}
	}
}

const GOLD: Color = Color::new(255, 186, 3);

fn stripes(rect: PixelRect, period: u32) -> OwnedImage {
	OwnedImage::from_fn(rect.width, rect.height, |x, _| {
		Color::gray(if (x / period) % 2 == 0 { 25 } else { 225 })
	})
}

fn faded(rect: PixelRect) -> OwnedImage {
	OwnedImage::from_fn(rect.width, rect.height, |x, _| Color::gray(if x % 2 == 0 { 100 } else { 120 }))
}

/// Inventory-style screen: readable stat lines, given quality colour, and
/// optionally one faded line (1-based).
fn inventory_screen(quality: Color, faded_line: Option<usize>) -> Screen {
	Screen(Box::new(move |rect: PixelRect| {
		if rect.width <= 1 && rect.height <= 1 {
			return Ok(OwnedImage::filled(rect.width.max(1), rect.height.max(1), quality));
		}
		let line = match rect.top {
			337 => Some(1),
			387 => Some(2),
			440 => Some(3),
			_ => None,
		};
		if line.is_some() && line == faded_line {
			return Ok(faded(rect));
		}
		Ok(stripes(rect, 8))
	}))
}

struct Setup {
	config: PipelineConfig,
	guard: MenuGuard,
	cache: StatCache,
	use_cache: bool,
	window: Option<WindowRect>,
}

impl Default for Setup {
	fn default() -> Self {
		Self {
			config: PipelineConfig::default(),
			guard: MenuGuard::new(GuardMode::None),
			cache: StatCache::in_memory(),
			use_cache: false,
			window: Some(WIN),
		}
	}
}

impl Setup {
	fn build(self, screen: Screen, ocr: &Script) -> LookupPipeline {
		let sampler = RegionSampler::new("Endfield", Box::new(Window(self.window)), Box::new(screen));
		let classifier = StatClassifier::new(self.cache, self.use_cache, false);
		LookupPipeline::new(self.config, default_layouts(), sampler, self.guard, classifier, Box::new(ocr.clone()))
	}
}

#[test]
fn no_layout_matched_is_not_an_error() {
	let ocr = Script::new(&[]);
	let setup = Setup {
		guard: MenuGuard::new(GuardMode::Image),
		..Default::default()
	};
	let mut pipeline = setup.build(inventory_screen(GOLD, None), &ocr);

	let result = pipeline.read().unwrap();
	assert!(!result.menu_ok);
	assert!(!result.quality_ok);
	assert_eq!(result.layout, None);
	assert_eq!(result.stats, [None, None, None]);
	assert_eq!(pipeline.stat_tuple().unwrap(), None);
	assert_eq!(ocr.calls(), 0);
}

#[test]
fn three_lines_resolve_and_hit_the_catalog() {
	let ocr = Script::new(&["Attack Boost", "Critical Rate Boost", "assault"]);
	let mut pipeline = Setup::default().build(inventory_screen(GOLD, None), &ocr);

	let tuple = pipeline.stat_tuple().unwrap().unwrap();
	assert_eq!(tuple, StatTuple::Three([Stat::AttackBoost, Stat::CriticalRateBoost, Stat::Assault]));

	let last = pipeline.last_result().unwrap();
	assert_eq!(last.layout, Some("inventory"));
	assert_eq!(last.raw_texts[1], "Critical Rate Boost");

	let mut catalog = StatCatalog::new();
	catalog.add_entry("Blade", [Stat::AttackBoost, Stat::CriticalRateBoost, Stat::Assault]).unwrap();
	assert!(catalog.lookup(&tuple).contains("Blade"));
}

#[test]
fn quality_gate_rejects_before_ocr() {
	let ocr = Script::new(&["Attack Boost", "Critical Rate Boost", "Assault"]);
	let mut pipeline = Setup::default().build(inventory_screen(Color::new(120, 60, 200), None), &ocr);

	let result = pipeline.read().unwrap();
	assert!(result.menu_ok);
	assert!(!result.quality_ok);
	assert_eq!(result.stats, [None, None, None]);
	assert_eq!(ocr.calls(), 0);
}

#[test]
fn quality_gate_can_be_disabled() {
	let ocr = Script::new(&["Flow", "Pursuit", "HP Boost"]);
	let mut setup = Setup::default();
	setup.config.use_quality_guard = false;
	let mut pipeline = setup.build(inventory_screen(Color::BLACK, None), &ocr);

	let result = pipeline.read().unwrap();
	assert!(result.quality_ok);
	assert_eq!(result.stats, [Some(Stat::Flow), Some(Stat::Pursuit), Some(Stat::HpBoost)]);
}

#[test]
fn faded_line_is_skipped_and_never_retried() {
	let ocr = Script::new(&["Flow", "Pursuit", "Assault"]);
	let mut pipeline = Setup::default().build(inventory_screen(GOLD, Some(2)), &ocr);

	let result = pipeline.read().unwrap();
	assert_eq!(result.stats, [Some(Stat::Flow), None, Some(Stat::Pursuit)]);
	assert_eq!(result.raw_texts[1], "");
	assert_eq!(ocr.calls(), 2);
}

#[test]
fn pairs_count_only_when_three_are_not_required() {
	let strict = Script::new(&["Flow", "Pursuit"]);
	let mut pipeline = Setup::default().build(inventory_screen(GOLD, Some(3)), &strict);
	assert_eq!(pipeline.stat_tuple().unwrap(), None);

	let relaxed = Script::new(&["Flow", "Pursuit"]);
	let mut setup = Setup::default();
	setup.config.require_three_stats = false;
	let mut pipeline = setup.build(inventory_screen(GOLD, Some(3)), &relaxed);
	assert_eq!(pipeline.stat_tuple().unwrap(), Some(StatTuple::Two([Stat::Flow, Stat::Pursuit])));
}

#[test]
fn unresolved_line_is_reread_once() {
	// First pass: second line unreadable. Retry pass reads it again.
	let ocr = Script::new(&["Flow", "xqz", "Pursuit", "Assault"]);
	let mut pipeline = Setup::default().build(inventory_screen(GOLD, None), &ocr);

	let result = pipeline.read().unwrap();
	assert_eq!(result.stats, [Some(Stat::Flow), Some(Stat::Assault), Some(Stat::Pursuit)]);
	assert_eq!(ocr.calls(), 4);
}

#[test]
fn stale_cache_duplicates_are_reread_without_cache() {
	// Every line matches the cached ATTACK_BOOST template; lines 2 and 3 are
	// duplicates and must go through OCR.
	let sample = stripes(
		PixelRect {
			left: 785,
			top: 337,
			width: 160,
			height: 23,
		},
		8,
	);
	let mut cache = StatCache::in_memory();
	cache.insert(Stat::AttackBoost, Signature::of(&sample.to_gray_image()));

	let ocr = Script::new(&["Critical Rate Boost", "Assault"]);
	let setup = Setup {
		cache,
		use_cache: true,
		..Default::default()
	};
	let mut pipeline = setup.build(inventory_screen(GOLD, None), &ocr);

	let result = pipeline.read().unwrap();
	assert_eq!(result.stats, [Some(Stat::AttackBoost), Some(Stat::CriticalRateBoost), Some(Stat::Assault)]);
	assert_eq!(result.raw_texts[0], "ATTACK_BOOST");
	assert_eq!(ocr.calls(), 2);
}

#[test]
fn duplicate_survives_only_if_ocr_agrees() {
	let ocr = Script::new(&["Flow", "Flow", "Assault"]);
	let mut pipeline = Setup::default().build(inventory_screen(GOLD, None), &ocr);
	let result = pipeline.read().unwrap();
	// Line 2 was re-read; the script ran dry so OCR saw nothing.
	assert_eq!(result.stats, [Some(Stat::Flow), None, Some(Stat::Assault)]);

	let ocr = Script::new(&["Flow", "Flow", "Assault", "Flow"]);
	let mut pipeline = Setup::default().build(inventory_screen(GOLD, None), &ocr);
	let result = pipeline.read().unwrap();
	assert_eq!(result.stats, [Some(Stat::Flow), Some(Stat::Flow), Some(Stat::Assault)]);
}

#[test]
fn ocr_guard_falls_through_to_etch() {
	let ocr = Script::new(&["Weapons", "Etch Essence", "Flow", "Pursuit", "Assault"]);
	let setup = Setup {
		guard: MenuGuard::new(GuardMode::Ocr),
		..Default::default()
	};
	let screen = Screen(Box::new(|rect: PixelRect| Ok(stripes(rect, 6))));
	let mut pipeline = setup.build(screen, &ocr);

	let result = pipeline.read().unwrap();
	assert_eq!(result.layout, Some("etch"));
	assert!(result.quality_ok);
	assert_eq!(result.stats, [Some(Stat::Flow), Some(Stat::Pursuit), Some(Stat::Assault)]);
}

#[test]
fn image_guard_selects_templated_layout() {
	let guard_rect = PixelRect {
		left: 25,
		top: 72,
		width: 50,
		height: 23,
	};
	let mut guard = MenuGuard::new(GuardMode::Image);
	guard.set_template("inventory", stripes(guard_rect, 8).to_gray_image());

	let ocr = Script::new(&["Flow", "Pursuit", "Assault"]);
	let setup = Setup {
		guard,
		..Default::default()
	};
	let mut pipeline = setup.build(inventory_screen(GOLD, None), &ocr);
	assert_eq!(pipeline.read().unwrap().layout, Some("inventory"));
}

#[test]
fn missing_window_is_an_environment_error() {
	let ocr = Script::new(&[]);
	let setup = Setup {
		window: None,
		..Default::default()
	};
	let mut pipeline = setup.build(inventory_screen(GOLD, None), &ocr);

	let err = pipeline.read().unwrap_err();
	assert!(err.downcast_ref::<WindowNotFound>().is_some());
	assert!(pipeline.stat_tuple().is_err());
}

#[test]
fn persistent_capture_failure_surfaces() {
	let ocr = Script::new(&[]);
	let screen = Screen(Box::new(|_: PixelRect| -> anyhow::Result<OwnedImage> { anyhow::bail!("stale handle") }));
	let mut pipeline = Setup::default().build(screen, &ocr);
	assert!(pipeline.read().is_err());
}

#[test]
fn debug_logs_and_image_dumps() {
	let dir = tempfile::tempdir().unwrap();
	// menu_text is read before the stat lines when saving images.
	let ocr = Script::new(&["Essence", "Flow", "Pursuit", "Assault"]);
	let mut setup = Setup::default();
	setup.config.log_debug = true;
	setup.config.save_images = true;
	setup.config.debug_dir = dir.path().to_path_buf();
	let mut pipeline = setup.build(inventory_screen(GOLD, None), &ocr);

	let result = pipeline.read().unwrap();
	assert_eq!(result.menu_text, "Essence");
	assert!(result.logs.iter().any(|l| l.starts_with("[HIT] Menu Guard detected: inventory")));
	assert!(result.logs.iter().any(|l| l.starts_with("[HIT] Quality pixel")));
	assert!(result.logs.iter().any(|l| l.starts_with("[TIMING]")));
	for i in 0..5 {
		assert!(dir.path().join(format!("inventory_region_{i}.png")).is_file());
	}
}
