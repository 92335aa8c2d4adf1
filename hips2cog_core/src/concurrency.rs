//! How many tiles are fetched, reduced and encoded at the same time.
//!
//! Fetching is dominated by waiting on disk or network, so it runs wider than the CPU count.
//! Decoding, 2×2 reduction and block compression saturate a core each and run at CPU width.
//!
//! ```
//! use hips2cog_core::ConcurrencyLimits;
//!
//! let limits = ConcurrencyLimits::default();
//! assert!(limits.fetch > limits.compute);
//!
//! let limits = ConcurrencyLimits::with_max(2);
//! assert!(limits.fetch <= 2 && limits.compute <= 2);
//! ```

/// Width of the parallel stages of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
	/// In-flight tile fetches (file reads, HTTP requests).
	pub fetch: usize,
	/// Concurrent decode, reduce and encode jobs on the blocking pool.
	pub compute: usize,
}

impl ConcurrencyLimits {
	pub fn new(fetch: usize, compute: usize) -> Self {
		Self {
			fetch: fetch.max(1),
			compute: compute.max(1),
		}
	}

	/// Limits for a user-supplied `--concurrency N`: no stage exceeds `n`.
	pub fn with_max(n: usize) -> Self {
		let default = Self::default();
		Self::new(default.fetch.min(n), default.compute.min(n))
	}

	pub fn cpu_count() -> usize {
		num_cpus::get()
	}
}

impl Default for ConcurrencyLimits {
	/// Fetching at 3× and computing at 1× the logical CPU count.
	fn default() -> Self {
		let cpus = num_cpus::get().max(1);
		Self {
			fetch: cpus * 3,
			compute: cpus,
		}
	}
}
