// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The worker loop.
//!
//! A worker cycles between idle (waiting inside the coordination lock) and
//! running (executing a task with no lock held). It exits through exactly
//! two doors: retirement after sitting idle past the configured timeout
//! while the pool is above its floor (elastic mode only), or pool
//! shutdown. A panicking work item is contained by the task cell and never
//! takes the worker thread down with it.

use std::{
	thread,
	time::Instant,
};

use tracing::debug;

use crate::{
	PoolMode,
	pool::{Core, Lifecycle, Shared},
};

/// Registry entry for one worker, keyed by a stable id and mutated only
/// under the coordination lock.
pub(crate) struct WorkerEntry {
	pub thread: Option<thread::JoinHandle<()>>,
	pub busy: bool,
	pub idle_since: Instant,
}

pub(crate) fn worker_loop(shared: &Shared, id: u64) {
	debug!("worker {} started", id);
	let config = &shared.config;
	let mut core = shared.core.lock();
	loop {
		if let Some(task) = core.queue.pop() {
			// Mark busy before the lock is released so idle
			// bookkeeping is never observed mid-transition.
			if let Some(entry) = core.workers.get_mut(&id) {
				entry.busy = true;
			}
			core.idle_workers -= 1;
			shared.slot_free.notify_one();
			if config.mode == PoolMode::Elastic && core.queue.is_empty() {
				shared.shrink.notify_one();
			}
			drop(core);

			task.run();

			core = shared.core.lock();
			if let Some(entry) = core.workers.get_mut(&id) {
				entry.busy = false;
				entry.idle_since = Instant::now();
			}
			core.idle_workers += 1;
			continue;
		}

		match core.lifecycle {
			Lifecycle::Draining | Lifecycle::Stopped => break,
			Lifecycle::Created | Lifecycle::Running => {}
		}

		if config.mode == PoolMode::Elastic && core.workers.len() > config.min_workers {
			let idle_for = core.workers.get(&id).map(|e| e.idle_since.elapsed()).unwrap_or_default();
			match config.idle_timeout.checked_sub(idle_for) {
				Some(remaining) => {
					shared.task_ready.wait_for(&mut core, remaining);
				}
				None => {
					retire(&mut core, id);
					shared.shrink.notify_one();
					drop(core);
					debug!("worker {} retired after idle timeout", id);
					return;
				}
			}
		} else {
			shared.task_ready.wait(&mut core);
		}
	}
	drop(core);
	debug!("worker {} stopped", id);
}

/// Remove the worker's own registry entry and hand its thread handle to
/// the join collector. Runs in the retiring worker itself, inside the
/// coordination lock; the handle is joined later by the shrinker or the
/// shutdown path, never by the retiring thread.
fn retire(core: &mut Core, id: u64) {
	if let Some(mut entry) = core.workers.remove(&id) {
		core.idle_workers -= 1;
		if let Some(handle) = entry.thread.take() {
			core.retired.push(handle);
		}
	}
}
