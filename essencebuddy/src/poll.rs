use std::{
	collections::BTreeSet,
	io::BufRead,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::Duration,
};

use data::{StatCatalog, StatTuple};
use ie::LookupPipeline;

/// Shared on/off switch for the read loop. Starts paused.
#[derive(Clone, Default)]
pub struct Toggle(Arc<AtomicBool>);

impl Toggle {
	pub fn is_active(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}

	/// Flip the switch, returning the new state.
	pub fn flip(&self) -> bool {
		!self.0.fetch_xor(true, Ordering::Relaxed)
	}

	/// Flip on every line read from stdin.
	pub fn watch_stdin(&self) {
		let toggle = self.clone();
		std::thread::spawn(move || {
			for line in std::io::stdin().lock().lines() {
				if line.is_err() {
					break;
				}
				let state = if toggle.flip() { "running" } else { "paused" };
				println!("[{state}] press Enter to toggle");
			}
		});
	}
}

pub fn format_hit(tuple: &StatTuple, names: &BTreeSet<String>) -> String {
	let names = names.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
	format!("[HIT] {tuple} -> {names}")
}

/// Run one cycle. Returns the matching names when the screen held a
/// full query that hit the catalog.
pub fn cycle(pipeline: &mut LookupPipeline, catalog: &StatCatalog) -> anyhow::Result<Option<BTreeSet<String>>> {
	let Some(tuple) = pipeline.stat_tuple()? else {
		return Ok(None);
	};

	let names = catalog.lookup(&tuple);
	if names.is_empty() {
		tracing::info!(stats = %tuple, "[MISS] no catalog entry");
		return Ok(None);
	}

	println!("{}", format_hit(&tuple, &names));
	Ok(Some(names))
}

/// Poll until the process exits. Errors are logged and the loop keeps going.
pub fn run(mut pipeline: LookupPipeline, catalog: &StatCatalog, toggle: Toggle, delay: Duration, log_debug: bool) -> ! {
	let mut last_hit = None;
	loop {
		if toggle.is_active() {
			match cycle(&mut pipeline, catalog) {
				Ok(Some(names)) => {
					// Only chime when the screen changes to a new hit.
					if last_hit.as_ref() != Some(&names) {
						crate::alert::chime();
					}
					last_hit = Some(names);
				}
				Ok(None) => last_hit = None,
				Err(err) => {
					tracing::warn!(error = %err, "read cycle failed");
					last_hit = None;
				}
			}

			if log_debug && let Some(result) = pipeline.last_result() {
				for line in &result.logs {
					println!("{line}");
				}
			}
		}

		std::thread::sleep(delay);
	}
}
