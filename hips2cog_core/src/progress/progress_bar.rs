//! A cloneable, thread-safe progress bar drawn on stderr.
//!
//! The line shows the message, a bar with sub-character precision, `pos/len`, the percentage,
//! throughput and the estimated time remaining. Redraws are throttled to two per second.

use std::{
	env,
	io::{self, Write},
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

struct Inner {
	message: String,
	len: u64,
	pos: u64,
	start: Instant,
	last_draw: Option<Instant>,
	visible: bool,
}

impl Inner {
	fn redraw(&mut self, force: bool) {
		if !self.visible {
			return;
		}
		if !force && self.last_draw.is_some_and(|t| t.elapsed() < Duration::from_millis(500)) {
			return;
		}
		self.last_draw = Some(Instant::now());
		let line = self.render(terminal_width());
		let mut stderr = io::stderr();
		let _ = write!(stderr, "\r\x1b[2K{line}");
		let _ = stderr.flush();
	}

	fn render(&self, width: usize) -> String {
		let len = self.len.max(1);
		let pos = self.pos.min(len);
		let elapsed = self.start.elapsed().as_secs_f64();
		let per_sec = if elapsed > 0.0 { pos as f64 / elapsed } else { 0.0 };
		let eta = if pos > 0 {
			Duration::from_secs_f64(elapsed * (len - pos) as f64 / pos as f64)
		} else {
			Duration::ZERO
		};
		let percent = pos * 100 / len;
		let msg = &self.message;

		let line = |bar: &str| {
			format!(
				"{msg}▕{bar}▏{pos}/{len} ({percent:>3}%) {:>5} {:>5}",
				format_rate(per_sec),
				format_eta(eta)
			)
		};
		let bar_width = width.saturating_sub(line("").chars().count()).max(10);
		line(&make_bar(pos, len, bar_width))
	}
}

#[derive(Clone)]
pub struct ProgressBar {
	inner: Arc<Mutex<Inner>>,
}

impl ProgressBar {
	pub fn new(message: &str, max_value: u64, visible: bool) -> ProgressBar {
		let progress = ProgressBar {
			inner: Arc::new(Mutex::new(Inner {
				message: message.to_string(),
				len: max_value,
				pos: 0,
				start: Instant::now(),
				last_draw: None,
				visible: visible && !cfg!(test),
			})),
		};
		progress.update(|inner| inner.redraw(true));
		progress
	}

	fn update(&self, f: impl FnOnce(&mut Inner)) {
		if let Ok(mut inner) = self.inner.lock() {
			f(&mut inner);
		}
	}

	pub fn set_position(&self, value: u64) {
		self.update(|inner| {
			inner.pos = value.min(inner.len);
			inner.redraw(false);
		});
	}

	pub fn inc(&self, value: u64) {
		self.update(|inner| {
			inner.pos = inner.pos.saturating_add(value).min(inner.len);
			inner.redraw(false);
		});
	}

	pub fn position(&self) -> u64 {
		self.inner.lock().map_or(0, |inner| inner.pos)
	}

	/// Jumps to the end and terminates the line.
	pub fn finish(&self) {
		self.update(|inner| {
			inner.pos = inner.len;
			inner.redraw(true);
			if inner.visible {
				let _ = io::stderr().write_all(b"\n");
			}
			inner.visible = false;
		});
	}
}

fn terminal_width() -> usize {
	env::var("COLUMNS")
		.ok()
		.and_then(|cols| cols.parse::<usize>().ok())
		.map_or(80, |v| v.max(10))
}

fn make_bar(pos: u64, len: u64, width: usize) -> String {
	const PARTIALS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

	let exact = (pos as f64 / len.max(1) as f64).clamp(0.0, 1.0) * width as f64;
	let whole = (exact.floor() as usize).min(width);
	let mut bar = "█".repeat(whole);
	if whole < width {
		bar.push(PARTIALS[((exact - whole as f64) * 8.0).floor() as usize % 8]);
		bar.push_str(&" ".repeat(width - whole - 1));
	}
	bar
}

fn format_rate(per_sec: f64) -> String {
	if !per_sec.is_finite() {
		return "--/s".to_string();
	}
	let (value, unit) = match per_sec {
		v if v >= 1e9 => (v / 1e9, "G"),
		v if v >= 1e6 => (v / 1e6, "M"),
		v if v >= 1e3 => (v / 1e3, "k"),
		v => return format!("{v:.0}/s"),
	};
	format!("{value:.1}{unit}/s")
}

fn format_eta(d: Duration) -> String {
	let total = d.as_secs();
	let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
	if h > 0 {
		format!("{h:02}:{m:02}:{s:02}")
	} else {
		format!("{m:02}:{s:02}")
	}
}
