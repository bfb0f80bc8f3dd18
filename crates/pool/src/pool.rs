// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The pool facade: lifecycle, submission, and the coordination state.
//!
//! One mutex guards everything the pool mutates: the task queue, the
//! worker registry, idle bookkeeping, and the lifecycle state. Condition
//! variables tied to that lock carry the cross-thread signals, and every
//! wait re-checks its predicate after waking. The lock is never held while
//! a work item executes.

use std::{
	collections::HashMap,
	io,
	sync::Arc,
	thread,
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use crate::{
	JoinHandle, PoolConfig, PoolMode, PoolStats, Priority, StartError, SubmitError,
	handle::completion_channel,
	queue::TaskQueue,
	scale::{grower_loop, shrinker_loop},
	task::WorkCell,
	worker::{WorkerEntry, worker_loop},
};

/// How a shutdown treats tasks that are still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
	/// Stop accepting submissions and run everything already queued to
	/// completion before stopping.
	Drain,
	/// Stop accepting submissions and discard everything still queued,
	/// resolving each discarded handle to cancelled. Tasks already
	/// executing finish normally.
	Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
	Created,
	Running,
	Draining,
	Stopped,
}

/// State guarded by the single coordination lock.
pub(crate) struct Core {
	pub lifecycle: Lifecycle,
	pub queue: TaskQueue,
	pub workers: HashMap<u64, WorkerEntry>,
	pub next_worker_id: u64,
	pub idle_workers: usize,
	/// Thread handles of retired workers, awaiting a join by the
	/// shrinker or the shutdown path.
	pub retired: Vec<thread::JoinHandle<()>>,
}

pub(crate) struct Shared {
	pub config: PoolConfig,
	pub core: Mutex<Core>,
	/// Woken when a task is queued or workers must re-check exit
	/// conditions.
	pub task_ready: Condvar,
	/// Woken when a queue slot frees up.
	pub slot_free: Condvar,
	/// Woken when a push leaves no worker idle below the ceiling.
	pub scale: Condvar,
	/// Woken when the queue empties or retired threads await a join.
	pub shrink: Condvar,
}

/// Spawn one worker and register it. Called with the coordination lock
/// held, so the new thread cannot observe the registry before its own
/// entry exists.
pub(crate) fn spawn_worker(shared: &Arc<Shared>, core: &mut Core) -> io::Result<u64> {
	let id = core.next_worker_id;
	core.next_worker_id += 1;

	let thread_shared = Arc::clone(shared);
	let handle = thread::Builder::new()
		.name(format!("taskpool-worker-{}", id))
		.spawn(move || worker_loop(&thread_shared, id))?;

	core.workers.insert(
		id,
		WorkerEntry {
			thread: Some(handle),
			busy: false,
			idle_since: Instant::now(),
		},
	);
	core.idle_workers += 1;
	Ok(id)
}

/// A pool of worker threads executing submitted closures by priority.
///
/// Construct through [`WorkerPool::builder`], call [`start`], submit work,
/// and shut down with [`shutdown`]. Dropping a running pool performs an
/// implicit cancelling shutdown, so threads are never leaked.
///
/// [`start`]: WorkerPool::start
/// [`shutdown`]: WorkerPool::shutdown
pub struct WorkerPool {
	shared: Arc<Shared>,
	controllers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
	/// Create an unstarted pool with `min_workers` as the floor and
	/// `max_workers` as the elastic ceiling, other settings at their
	/// defaults.
	pub fn new(min_workers: usize, max_workers: usize) -> Self {
		Self::builder().min_workers(min_workers).max_workers(max_workers).build()
	}

	pub fn with_config(config: PoolConfig) -> Self {
		PoolBuilder {
			config,
		}
		.build()
	}

	pub fn builder() -> PoolBuilder {
		PoolBuilder {
			config: PoolConfig::default(),
		}
	}

	pub fn config(&self) -> &PoolConfig {
		&self.shared.config
	}

	/// Spawn the floor worker count and, in elastic mode, the scaling
	/// controllers. The pool accepts submissions once this returns.
	pub fn start(&mut self) -> Result<(), StartError> {
		let mut core = self.shared.core.lock();
		if !matches!(core.lifecycle, Lifecycle::Created) {
			return Err(StartError::AlreadyStarted);
		}

		for _ in 0..self.shared.config.min_workers {
			if let Err(e) = spawn_worker(&self.shared, &mut core) {
				self.abort_start(core);
				return Err(StartError::Spawn(e));
			}
		}
		core.lifecycle = Lifecycle::Running;
		drop(core);

		if self.shared.config.mode == PoolMode::Elastic {
			for (name, run) in [("taskpool-grower", grower_loop as fn(&Arc<Shared>)), ("taskpool-shrinker", shrinker_loop)] {
				let shared = Arc::clone(&self.shared);
				match thread::Builder::new().name(name.to_string()).spawn(move || run(&shared)) {
					Ok(handle) => self.controllers.push(handle),
					Err(e) => {
						self.shutdown(ShutdownMode::Cancel);
						return Err(StartError::Spawn(e));
					}
				}
			}
		}

		debug!("pool started with {} workers", self.shared.config.min_workers);
		Ok(())
	}

	/// Submit a work item at normal priority with the configured submit
	/// timeout.
	pub fn submit<T, F>(&self, work: F) -> Result<JoinHandle<T>, SubmitError>
	where
		T: Send + 'static,
		F: FnOnce() -> T + Send + 'static,
	{
		self.submit_with(Priority::Normal, work)
	}

	/// Submit a work item at the given priority with the configured
	/// submit timeout.
	pub fn submit_with<T, F>(&self, priority: Priority, work: F) -> Result<JoinHandle<T>, SubmitError>
	where
		T: Send + 'static,
		F: FnOnce() -> T + Send + 'static,
	{
		self.submit_timeout(priority, work, self.shared.config.submit_timeout)
	}

	/// Submit a work item, waiting up to `timeout` for queue capacity.
	///
	/// A zero timeout checks capacity once and fails immediately with
	/// [`SubmitError::Backpressure`] when the queue is full. A failed
	/// submission never enqueues the task and returns no handle.
	pub fn submit_timeout<T, F>(&self, priority: Priority, work: F, timeout: Duration) -> Result<JoinHandle<T>, SubmitError>
	where
		T: Send + 'static,
		F: FnOnce() -> T + Send + 'static,
	{
		let (completion, handle) = completion_channel();
		let cell = WorkCell::new(work, completion);
		let deadline = Instant::now().checked_add(timeout);

		let mut core = self.shared.core.lock();
		loop {
			if !matches!(core.lifecycle, Lifecycle::Running) {
				return Err(SubmitError::PoolClosed);
			}
			if core.queue.has_capacity() {
				let had_idle = core.idle_workers > 0;
				core.queue.push(priority, Box::new(cell));
				self.shared.task_ready.notify_one();
				if self.shared.config.mode == PoolMode::Elastic
					&& !had_idle && core.workers.len() < self.shared.config.max_workers
				{
					self.shared.scale.notify_one();
				}
				return Ok(handle);
			}
			match deadline {
				Some(deadline) => {
					let now = Instant::now();
					if now >= deadline {
						return Err(SubmitError::Backpressure);
					}
					self.shared.slot_free.wait_for(&mut core, deadline - now);
				}
				None => {
					self.shared.slot_free.wait(&mut core);
				}
			}
		}
	}

	/// Shut the pool down and block until every worker and controller
	/// thread has joined. Idempotent: shutting down a stopped pool is a
	/// no-op.
	pub fn shutdown(&mut self, mode: ShutdownMode) {
		let mut core = self.shared.core.lock();
		match core.lifecycle {
			Lifecycle::Stopped => return,
			Lifecycle::Created => {
				core.lifecycle = Lifecycle::Stopped;
				return;
			}
			Lifecycle::Running | Lifecycle::Draining => {}
		}
		core.lifecycle = Lifecycle::Draining;

		let cancelled = match mode {
			ShutdownMode::Cancel => core.queue.drain(),
			ShutdownMode::Drain => Vec::new(),
		};

		let mut threads: Vec<_> = core.workers.values_mut().filter_map(|w| w.thread.take()).collect();
		threads.append(&mut core.retired);

		self.shared.task_ready.notify_all();
		self.shared.slot_free.notify_all();
		self.shared.scale.notify_all();
		self.shared.shrink.notify_all();
		drop(core);

		for task in cancelled {
			task.cancel();
		}
		for handle in threads {
			let _ = handle.join();
		}
		for handle in self.controllers.drain(..) {
			let _ = handle.join();
		}

		let mut core = self.shared.core.lock();
		core.workers.clear();
		core.idle_workers = 0;
		core.lifecycle = Lifecycle::Stopped;
		debug!("pool stopped");
	}

	pub fn is_running(&self) -> bool {
		matches!(self.shared.core.lock().lifecycle, Lifecycle::Running)
	}

	/// Current number of registered workers, idle or busy.
	pub fn worker_count(&self) -> usize {
		self.shared.core.lock().workers.len()
	}

	/// Current number of workers waiting for work.
	pub fn idle_count(&self) -> usize {
		self.shared.core.lock().idle_workers
	}

	/// Number of tasks accepted but not yet started.
	pub fn queued_tasks(&self) -> usize {
		self.shared.core.lock().queue.len()
	}

	pub fn stats(&self) -> PoolStats {
		let core = self.shared.core.lock();
		PoolStats {
			workers: core.workers.len(),
			idle_workers: core.idle_workers,
			queued_tasks: core.queue.len(),
		}
	}

	/// Tear down workers spawned by a `start` that failed partway.
	fn abort_start(&self, mut core: MutexGuard<'_, Core>) {
		core.lifecycle = Lifecycle::Draining;
		let threads: Vec<_> = core.workers.values_mut().filter_map(|w| w.thread.take()).collect();
		self.shared.task_ready.notify_all();
		drop(core);

		for handle in threads {
			let _ = handle.join();
		}

		let mut core = self.shared.core.lock();
		core.workers.clear();
		core.idle_workers = 0;
		core.lifecycle = Lifecycle::Stopped;
	}
}

impl Drop for WorkerPool {
	fn drop(&mut self) {
		self.shutdown(ShutdownMode::Cancel);
	}
}

/// Builder for a [`WorkerPool`]. All configuration happens here, before
/// the pool exists; a started pool cannot be reconfigured.
pub struct PoolBuilder {
	config: PoolConfig,
}

impl PoolBuilder {
	pub fn mode(mut self, mode: PoolMode) -> Self {
		self.config.mode = mode;
		self
	}

	pub fn min_workers(mut self, count: usize) -> Self {
		self.config.min_workers = count;
		self
	}

	pub fn max_workers(mut self, count: usize) -> Self {
		self.config.max_workers = count;
		self
	}

	pub fn queue_capacity(mut self, capacity: usize) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	pub fn idle_timeout(mut self, timeout: Duration) -> Self {
		self.config.idle_timeout = timeout;
		self
	}

	pub fn submit_timeout(mut self, timeout: Duration) -> Self {
		self.config.submit_timeout = timeout;
		self
	}

	pub fn shrink_interval(mut self, interval: Duration) -> Self {
		self.config.shrink_interval = interval;
		self
	}

	/// Create the pool in its unstarted state.
	///
	/// # Panics
	///
	/// Panics if the floor is zero, the queue capacity is zero, or an
	/// elastic ceiling is below the floor.
	pub fn build(self) -> WorkerPool {
		let config = self.config;
		assert!(config.min_workers > 0, "pool must have at least one worker");
		assert!(config.queue_capacity > 0, "queue capacity must be non-zero");
		if config.mode == PoolMode::Elastic {
			assert!(config.max_workers >= config.min_workers, "pool ceiling cannot be below the floor");
		}

		let queue_capacity = config.queue_capacity;
		WorkerPool {
			shared: Arc::new(Shared {
				config,
				core: Mutex::new(Core {
					lifecycle: Lifecycle::Created,
					queue: TaskQueue::new(queue_capacity),
					workers: HashMap::new(),
					next_worker_id: 0,
					idle_workers: 0,
					retired: Vec::new(),
				}),
				task_ready: Condvar::new(),
				slot_free: Condvar::new(),
				scale: Condvar::new(),
				shrink: Condvar::new(),
			}),
			controllers: Vec::new(),
		}
	}
}
