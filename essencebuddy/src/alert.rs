use std::io::Write;

/// Ring the terminal bell.
pub fn chime() {
	let mut out = std::io::stdout().lock();
	if let Err(err) = out.write_all(b"\x07").and_then(|_| out.flush()) {
		tracing::debug!(error = %err, "bell failed");
	}
}
