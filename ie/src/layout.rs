/// Rectangle in fractions of the window's client area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRect {
	pub x: f32,
	pub y: f32,
	pub w: f32,
	pub h: f32,
}

impl NormRect {
	pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
		Self { x, y, w, h }
	}
}

/// A screen the essence panel can appear on.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
	pub name: &'static str,
	pub regions: &'static [NormRect],
	/// Region confirming this screen is the one visible.
	pub menu_idx: usize,
	/// Single-pixel region whose colour confirms item rarity.
	pub quality_idx: Option<usize>,
	/// Regions holding the three stat lines, top to bottom.
	pub stat_indices: [usize; 3],
	/// More specific guard phrase accepted alongside the generic keyword.
	pub guard_phrase: Option<&'static str>,
	/// Guard template file in the data directory.
	pub template_file: &'static str,
}

pub const INVENTORY: Layout = Layout {
	name: "inventory",
	regions: &[
		NormRect::new(0.025, 0.072, 0.05, 0.023),
		NormRect::new(0.785, 0.337, 0.16, 0.023),
		NormRect::new(0.785, 0.387, 0.16, 0.023),
		NormRect::new(0.785, 0.44, 0.16, 0.023),
		NormRect::new(0.789, 0.075, 0.001, 0.001),
	],
	menu_idx: 0,
	quality_idx: Some(4),
	stat_indices: [1, 2, 3],
	guard_phrase: None,
	template_file: "Menu_Guard_Inventory.png",
};

pub const ETCH: Layout = Layout {
	name: "etch",
	regions: &[
		NormRect::new(0.035, 0.03, 0.09, 0.023),
		NormRect::new(0.1, 0.50, 0.15, 0.023),
		NormRect::new(0.1, 0.54, 0.15, 0.023),
		NormRect::new(0.1, 0.575, 0.15, 0.023),
	],
	menu_idx: 0,
	quality_idx: None,
	stat_indices: [1, 2, 3],
	guard_phrase: Some("etch essence"),
	template_file: "Menu_Guard_Etch.png",
};

/// Built-in layouts in the order they are tried.
pub fn default_layouts() -> Vec<Layout> {
	vec![INVENTORY, ETCH]
}
