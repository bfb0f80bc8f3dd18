// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::io;

/// Why a submission was rejected. Surfaced synchronously from `submit`;
/// the pool never retries on the caller's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
	/// The task queue was still at capacity when the submit timeout
	/// elapsed. Expected under load, not exceptional.
	#[error("task queue at capacity")]
	Backpressure,
	/// The pool is not running (not yet started, draining, or stopped).
	#[error("pool is closed to new submissions")]
	PoolClosed,
}

/// Why an accepted task produced no value. Surfaced through its handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
	/// The task was still queued when a cancelling shutdown discarded it.
	#[error("task cancelled before execution")]
	Cancelled,
	/// The work item panicked. This is a fault of the work item, not of
	/// the pool; the executing worker survives.
	#[error("task panicked: {message}")]
	Panicked { message: String },
}

/// Why the pool failed to start.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
	#[error("pool already started")]
	AlreadyStarted,
	#[error("failed to spawn pool thread")]
	Spawn(#[from] io::Error),
}
