//! Terminal progress for long-running conversion stages.
//!
//! ```rust
//! use hips2cog_core::progress::get_progress_bar;
//!
//! let progress = get_progress_bar("fetching order 3", 768, true);
//! progress.inc(10);
//! progress.finish();
//! ```

mod progress_bar;

pub use progress_bar::ProgressBar;

/// Creates a progress bar on stderr, or a silent one that only counts.
pub fn get_progress_bar(message: &str, max_value: u64, silent: bool) -> ProgressBar {
	ProgressBar::new(message, max_value, !silent)
}
