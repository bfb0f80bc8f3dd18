// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Elastic-mode scaling controllers.
//!
//! The grower adds one worker per wakeup while sustained backlog leaves no
//! worker idle; the shrinker reaps retired worker threads and periodically
//! wakes over-idle workers so they re-evaluate retirement. Both re-check
//! their predicates under the coordination lock, so the ceiling is never
//! overshot by concurrent wakeups and the floor is never breached.

use std::{mem, sync::Arc};

use tracing::{debug, error};

use crate::pool::{Core, Lifecycle, Shared, spawn_worker};

pub(crate) fn grower_loop(shared: &Arc<Shared>) {
	debug!("grower started");
	let mut core = shared.core.lock();
	loop {
		if !matches!(core.lifecycle, Lifecycle::Running) {
			break;
		}
		if growth_needed(&core, shared) {
			match spawn_worker(shared, &mut core) {
				Ok(id) => {
					debug!("grew pool to {} workers (worker {})", core.workers.len(), id);
					continue;
				}
				Err(e) => {
					// The pool keeps running at reduced
					// capacity; the operator sees the error.
					error!("failed to grow pool: {}", e);
				}
			}
		}
		shared.scale.wait(&mut core);
	}
	drop(core);
	debug!("grower stopped");
}

fn growth_needed(core: &Core, shared: &Shared) -> bool {
	matches!(core.lifecycle, Lifecycle::Running)
		&& core.idle_workers == 0
		&& core.workers.len() < shared.config.max_workers
		&& !core.queue.is_empty()
}

pub(crate) fn shrinker_loop(shared: &Arc<Shared>) {
	debug!("shrinker started");
	let config = &shared.config;
	let mut core = shared.core.lock();
	loop {
		if !matches!(core.lifecycle, Lifecycle::Running) {
			break;
		}

		let finished = mem::take(&mut core.retired);
		if !finished.is_empty() {
			drop(core);
			for handle in finished {
				let _ = handle.join();
			}
			core = shared.core.lock();
			continue;
		}

		if idle_worker_expired(&core, shared) {
			// Retirement itself happens in the woken workers, one
			// at a time under the lock, so the floor check stays
			// consistent.
			shared.task_ready.notify_all();
		}

		shared.shrink.wait_for(&mut core, config.shrink_interval);
	}
	drop(core);
	debug!("shrinker stopped");
}

fn idle_worker_expired(core: &Core, shared: &Shared) -> bool {
	core.workers.len() > shared.config.min_workers
		&& core.workers.values().any(|w| !w.busy && w.idle_since.elapsed() >= shared.config.idle_timeout)
}
