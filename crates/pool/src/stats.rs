// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Best-effort snapshot of pool occupancy. Values may be stale by the time
/// the caller reads them when the pool is under concurrent activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
	/// Workers currently registered, idle or busy.
	pub workers: usize,
	/// Workers currently waiting for work.
	pub idle_workers: usize,
	/// Tasks accepted but not yet started.
	pub queued_tasks: usize,
}
