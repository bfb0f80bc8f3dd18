// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Tests for drain and cancel shutdown semantics.

use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	thread,
	time::{Duration, Instant},
};

use taskpool::{JoinHandle, ShutdownMode, SubmitError, TaskError, WorkerPool};

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		thread::sleep(Duration::from_millis(5));
	}
	condition()
}

/// Pin the pool's single worker until the gate opens, so submissions made
/// meanwhile stay queued.
fn submit_blocker(pool: &WorkerPool, started: &Arc<AtomicUsize>, gate: &Arc<AtomicUsize>) -> JoinHandle<()> {
	let started = Arc::clone(started);
	let gate = Arc::clone(gate);
	let handle = pool
		.submit({
			let started = Arc::clone(&started);
			move || {
				started.store(1, Ordering::Relaxed);
				while gate.load(Ordering::Relaxed) == 0 {
					thread::sleep(Duration::from_millis(1));
				}
			}
		})
		.unwrap();
	assert!(wait_until(Duration::from_secs(5), || started.load(Ordering::Relaxed) == 1));
	handle
}

#[test]
fn test_drain_runs_queued_tasks_to_completion() {
	let mut pool = WorkerPool::builder().min_workers(1).max_workers(1).queue_capacity(100).build();
	pool.start().unwrap();

	let started = Arc::new(AtomicUsize::new(0));
	let gate = Arc::new(AtomicUsize::new(0));
	let blocker = submit_blocker(&pool, &started, &gate);

	let counter = Arc::new(AtomicUsize::new(0));
	let mut handles = Vec::new();
	for _ in 0..5 {
		let counter = Arc::clone(&counter);
		handles.push(pool
			.submit(move || {
				counter.fetch_add(1, Ordering::Relaxed);
			})
			.unwrap());
	}

	// Unblock the worker shortly after shutdown begins waiting.
	let releaser = {
		let gate = Arc::clone(&gate);
		thread::spawn(move || {
			thread::sleep(Duration::from_millis(50));
			gate.store(1, Ordering::Relaxed);
		})
	};

	pool.shutdown(ShutdownMode::Drain);
	releaser.join().unwrap();

	// Everything queued before shutdown ran to completion.
	assert_eq!(counter.load(Ordering::Relaxed), 5);
	assert!(blocker.join().is_ok());
	for handle in handles {
		assert!(handle.join().is_ok());
	}
	assert!(!pool.is_running());
}

#[test]
fn test_cancel_discards_queued_tasks() {
	let mut pool = WorkerPool::builder().min_workers(1).max_workers(1).queue_capacity(100).build();
	pool.start().unwrap();

	let started = Arc::new(AtomicUsize::new(0));
	let gate = Arc::new(AtomicUsize::new(0));
	let blocker = submit_blocker(&pool, &started, &gate);

	let counter = Arc::new(AtomicUsize::new(0));
	let mut handles = Vec::new();
	for _ in 0..5 {
		let counter = Arc::clone(&counter);
		handles.push(pool
			.submit(move || {
				counter.fetch_add(1, Ordering::Relaxed);
			})
			.unwrap());
	}

	let releaser = {
		let gate = Arc::clone(&gate);
		thread::spawn(move || {
			thread::sleep(Duration::from_millis(100));
			gate.store(1, Ordering::Relaxed);
		})
	};

	// The worker is still pinned when shutdown begins, so all five
	// tasks are discarded unexecuted; the running blocker finishes
	// normally.
	pool.shutdown(ShutdownMode::Cancel);
	releaser.join().unwrap();

	assert_eq!(counter.load(Ordering::Relaxed), 0);
	assert!(blocker.join().is_ok());
	for handle in handles {
		assert!(matches!(handle.join(), Err(TaskError::Cancelled)));
	}
}

#[test]
fn test_shutdown_is_idempotent() {
	let mut pool = WorkerPool::new(2, 2);
	pool.start().unwrap();

	pool.shutdown(ShutdownMode::Drain);
	assert!(!pool.is_running());

	// Further shutdowns of any kind are no-ops.
	pool.shutdown(ShutdownMode::Drain);
	pool.shutdown(ShutdownMode::Cancel);
	assert!(!pool.is_running());
	assert_eq!(pool.worker_count(), 0);
}

#[test]
fn test_submit_after_shutdown_is_rejected() {
	let mut pool = WorkerPool::new(1, 1);
	pool.start().unwrap();
	pool.shutdown(ShutdownMode::Drain);

	assert_eq!(pool.submit(|| ()).err(), Some(SubmitError::PoolClosed));
}

#[test]
fn test_shutdown_of_unstarted_pool() {
	let mut pool = WorkerPool::new(1, 1);
	pool.shutdown(ShutdownMode::Drain);
	assert!(!pool.is_running());
	assert!(pool.start().is_err());
}

#[test]
fn test_drop_performs_cancel_shutdown() {
	let started = Arc::new(AtomicUsize::new(0));
	let gate = Arc::new(AtomicUsize::new(0));
	let counter = Arc::new(AtomicUsize::new(0));

	let (blocker, queued) = {
		let mut pool = WorkerPool::builder().min_workers(1).max_workers(1).queue_capacity(100).build();
		pool.start().unwrap();

		let blocker = submit_blocker(&pool, &started, &gate);
		let counter = Arc::clone(&counter);
		let queued = pool
			.submit(move || {
				counter.fetch_add(1, Ordering::Relaxed);
			})
			.unwrap();

		let releaser = {
			let gate = Arc::clone(&gate);
			thread::spawn(move || {
				thread::sleep(Duration::from_millis(50));
				gate.store(1, Ordering::Relaxed);
			})
		};

		drop(pool);
		releaser.join().unwrap();
		(blocker, queued)
	};

	// The implicit shutdown cancelled the queued task and let the
	// running one finish.
	assert!(blocker.join().is_ok());
	assert!(matches!(queued.join(), Err(TaskError::Cancelled)));
	assert_eq!(counter.load(Ordering::Relaxed), 0);
}
