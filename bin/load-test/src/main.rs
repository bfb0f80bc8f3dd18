// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Benchmark driver: submits mixed-priority workloads and reports
//! scheduling latency and throughput.

mod metrics;

use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use taskpool::{PoolMode, Priority, SubmitError, WorkerPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::metrics::Metrics;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
	Fixed,
	Elastic,
}

#[derive(Debug, Parser)]
#[command(name = "taskpool-load-test", about = "Load test for the taskpool worker pool")]
struct Args {
	/// Number of tasks to submit
	#[arg(long, default_value_t = 100_000)]
	tasks: usize,

	/// Pool sizing mode
	#[arg(long, value_enum, default_value = "fixed")]
	mode: Mode,

	/// Worker floor (defaults to the number of CPUs)
	#[arg(long)]
	min_workers: Option<usize>,

	/// Worker ceiling for elastic mode (defaults to twice the floor)
	#[arg(long)]
	max_workers: Option<usize>,

	/// Task queue capacity
	#[arg(long, default_value_t = 1024)]
	queue_capacity: usize,

	/// Simulated work per task, in microseconds
	#[arg(long, default_value_t = 50)]
	work_us: u64,

	/// Time a submission may wait for queue capacity, in milliseconds
	#[arg(long, default_value_t = 1000)]
	submit_timeout_ms: u64,
}

fn busy_work(duration: Duration) {
	let start = Instant::now();
	while start.elapsed() < duration {
		std::hint::spin_loop();
	}
}

fn main() {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let args = Args::parse();

	let mut builder = WorkerPool::builder()
		.mode(match args.mode {
			Mode::Fixed => PoolMode::Fixed,
			Mode::Elastic => PoolMode::Elastic,
		})
		.queue_capacity(args.queue_capacity)
		.submit_timeout(Duration::from_millis(args.submit_timeout_ms));
	if let Some(min) = args.min_workers {
		builder = builder.min_workers(min).max_workers(args.max_workers.unwrap_or(min * 2));
	} else if let Some(max) = args.max_workers {
		builder = builder.max_workers(max);
	}

	let mut pool = builder.build();
	pool.start().expect("failed to start pool");
	info!("pool started: mode {:?}, {} workers, queue capacity {}", args.mode, pool.worker_count(), args.queue_capacity);

	let priorities = [Priority::Low, Priority::Normal, Priority::High];
	let work = Duration::from_micros(args.work_us);
	let mut metrics = Metrics::new();
	let mut handles = Vec::with_capacity(args.tasks);

	for i in 0..args.tasks {
		let priority = priorities[i % priorities.len()];
		let submitted = Instant::now();
		match pool.submit_with(priority, move || {
			let waited = submitted.elapsed();
			busy_work(work);
			waited.as_micros() as u64
		}) {
			Ok(handle) => handles.push(handle),
			Err(SubmitError::Backpressure) => metrics.record_rejected(),
			Err(e) => {
				eprintln!("submission failed: {}", e);
				break;
			}
		}
	}

	for handle in handles {
		match handle.join() {
			Ok(latency_us) => metrics.record(latency_us),
			Err(_) => metrics.record_failure(),
		}
	}

	let stats = pool.stats();
	info!("draining pool: {} workers, {} queued", stats.workers, stats.queued_tasks);
	pool.shutdown(taskpool::ShutdownMode::Drain);

	metrics.summary().print();
}
