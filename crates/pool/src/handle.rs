// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Completion handles returned by task submission.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

use crate::TaskError;

/// Outcome of an accepted task: the produced value, or why it never
/// produced one.
pub type TaskResult<T> = Result<T, TaskError>;

/// Resolving side of a completion handle. Held by the task cell; consumed
/// by the single resolution.
pub(crate) struct Completion<T> {
	tx: Sender<TaskResult<T>>,
}

impl<T> Completion<T> {
	pub fn resolve(self, result: TaskResult<T>) {
		// The receiver may already have been dropped by a caller that
		// lost interest in the result.
		let _ = self.tx.send(result);
	}
}

/// Observing side of a task's eventual result.
///
/// The handle outlives the pool: it stays valid after shutdown and resolves
/// exactly once, to the task's value, a captured panic, or cancellation.
#[derive(Debug)]
pub struct JoinHandle<T> {
	rx: Receiver<TaskResult<T>>,
}

impl<T> JoinHandle<T> {
	/// Block until the task resolves.
	pub fn join(self) -> TaskResult<T> {
		self.rx.recv().unwrap_or(Err(TaskError::Cancelled))
	}

	/// Block until the task resolves or the timeout elapses. On timeout
	/// the handle is returned so the caller can keep waiting.
	pub fn join_timeout(self, timeout: Duration) -> Result<TaskResult<T>, Self> {
		match self.rx.recv_timeout(timeout) {
			Ok(result) => Ok(result),
			Err(RecvTimeoutError::Timeout) => Err(self),
			Err(RecvTimeoutError::Disconnected) => Ok(Err(TaskError::Cancelled)),
		}
	}

	/// Non-blocking poll for the result.
	pub fn try_join(self) -> Result<TaskResult<T>, Self> {
		match self.rx.try_recv() {
			Ok(result) => Ok(result),
			Err(TryRecvError::Empty) => Err(self),
			Err(TryRecvError::Disconnected) => Ok(Err(TaskError::Cancelled)),
		}
	}

	/// Whether the task has resolved.
	pub fn is_finished(&self) -> bool {
		!self.rx.is_empty()
	}
}

pub(crate) fn completion_channel<T>() -> (Completion<T>, JoinHandle<T>) {
	let (tx, rx) = bounded(1);
	(
		Completion {
			tx,
		},
		JoinHandle {
			rx,
		},
	)
}
