// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Instant;

use hdrhistogram::Histogram;

/// Collector for benchmark results. Latencies are recorded in
/// microseconds at join time, on the driver thread.
pub struct Metrics {
	completed: u64,
	failed: u64,
	rejected: u64,
	// Range: 1 microsecond to 60 seconds, 3 significant figures
	latency: Histogram<u64>,
	started: Instant,
}

impl Metrics {
	pub fn new() -> Self {
		Self {
			completed: 0,
			failed: 0,
			rejected: 0,
			latency: Histogram::new_with_bounds(1, 60_000_000, 3).expect("failed to create histogram"),
			started: Instant::now(),
		}
	}

	/// Record a completed task and its scheduling latency.
	pub fn record(&mut self, latency_us: u64) {
		self.completed += 1;
		let _ = self.latency.record(latency_us.max(1));
	}

	pub fn record_failure(&mut self) {
		self.failed += 1;
	}

	pub fn record_rejected(&mut self) {
		self.rejected += 1;
	}

	pub fn summary(&self) -> Summary {
		let duration_secs = self.started.elapsed().as_secs_f64();
		let total = self.completed + self.failed;
		Summary {
			completed: self.completed,
			failed: self.failed,
			rejected: self.rejected,
			duration_secs,
			throughput: if duration_secs > 0.0 {
				total as f64 / duration_secs
			} else {
				0.0
			},
			latency_min_us: self.latency.min(),
			latency_max_us: self.latency.max(),
			latency_avg_us: self.latency.mean(),
			latency_p50_us: self.latency.value_at_quantile(0.50),
			latency_p90_us: self.latency.value_at_quantile(0.90),
			latency_p99_us: self.latency.value_at_quantile(0.99),
		}
	}
}

/// Summary of one benchmark run.
pub struct Summary {
	pub completed: u64,
	pub failed: u64,
	pub rejected: u64,
	pub duration_secs: f64,
	pub throughput: f64,
	pub latency_min_us: u64,
	pub latency_max_us: u64,
	pub latency_avg_us: f64,
	pub latency_p50_us: u64,
	pub latency_p90_us: u64,
	pub latency_p99_us: u64,
}

impl Summary {
	pub fn print(&self) {
		println!("completed            {}", self.completed);
		println!("failed               {}", self.failed);
		println!("rejected             {}", self.rejected);
		println!("duration             {:.2} s", self.duration_secs);
		println!("throughput           {:.0} tasks/s", self.throughput);
		println!("scheduling latency   min {} µs / avg {:.0} µs / max {} µs", self.latency_min_us, self.latency_avg_us, self.latency_max_us);
		println!("                     p50 {} µs / p90 {} µs / p99 {} µs", self.latency_p50_us, self.latency_p90_us, self.latency_p99_us);
	}
}
