// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

/// Sizing behavior of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
	/// Worker count is fixed at `min_workers` for the pool's lifetime.
	Fixed,
	/// Worker count grows under backlog up to `max_workers` and shrinks
	/// back to `min_workers` once workers sit idle past `idle_timeout`.
	Elastic,
}

/// Configuration for the worker pool. Fixed once the pool is built; there
/// is no post-start reconfiguration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
	pub mode: PoolMode,
	/// Workers spawned at start; the floor the pool never shrinks below.
	pub min_workers: usize,
	/// Ceiling for elastic growth. Ignored in fixed mode.
	pub max_workers: usize,
	/// Maximum number of queued tasks before submissions block.
	pub queue_capacity: usize,
	/// How long a surplus worker may sit idle before it retires
	/// (elastic mode only).
	pub idle_timeout: Duration,
	/// Default time a submission waits for queue capacity.
	pub submit_timeout: Duration,
	/// Tick interval of the shrink controller (elastic mode only).
	pub shrink_interval: Duration,
}

impl Default for PoolConfig {
	fn default() -> Self {
		let cpus = num_cpus::get();
		Self {
			mode: PoolMode::Fixed,
			min_workers: cpus,
			max_workers: cpus * 2,
			queue_capacity: 1024,
			idle_timeout: Duration::from_secs(60),
			submit_timeout: Duration::from_secs(1),
			shrink_interval: Duration::from_millis(100),
		}
	}
}
