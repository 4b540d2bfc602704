//! # Worker pool
//!
//! Fixed set of worker threads evaluating `(condition, vehicle, candidate)` tasks against
//! read-only shared data, driven by a single coordinator.
//!
//! Channels
//! -----------------
//! Three unbounded channels, each one-directional:
//!
//! * tasks (coordinator → workers): [`TaskMessage::Task`] or the [`TaskMessage::Return`]
//!   sentinel. Workers race for messages.
//! * reports (workers → coordinator): one [`WorkerReport`] per `Return`.
//! * commands (coordinator → workers): [`Command::Resume`] or [`Command::Exit`].
//!
//! Worker state machine
//! -----------------
//! ```text
//!   Processing --Task--> evaluate, accumulate --> Processing
//!   Processing --Return--> send report, clear --> Idle (blocked on commands)
//!   Idle --Resume--> Processing
//!   Idle --Exit--> exited
//! ```
//!
//! Barrier
//! -----------------
//! After enqueuing the tasks of an iteration, the coordinator enqueues one `Return` per worker
//! and waits for exactly as many reports. A worker which has reported is blocked on the
//! command channel and cannot take a second `Return`, so once all reports are in, every
//! worker is idle and every task of the iteration has been processed. The coordinator then
//! checks that the completed task counts add up to the enqueued count.
//!
//! A hung worker would stall the barrier forever: the wait is bounded by the configured
//! timeout and surfaces as [`TrackError::WorkerStalled`].
//!
//! Dropping a pool without [`WorkerPool::shutdown`] closes the channels; idle workers exit
//! at once, busy workers exit after draining the queued tasks.
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration as StdDuration, Instant};

use ahash::RandomState;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use hifitime::Duration;
use log::{debug, warn};

use crate::conditions::{ConditionSamples, ReferenceCondition};
use crate::constants::VehicleId;
use crate::point::TrackPoint;
use crate::session::SessionData;
use crate::track::TrackTopology;
use crate::trackmap_errors::TrackError;

/// Samples collected during one iteration, keyed by condition index.
pub type IterationResult = HashMap<usize, ConditionSamples, RandomState>;

/// Read-only data visible to every worker.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub track: Arc<TrackTopology>,
    pub session: Arc<SessionData>,
    pub conditions: Vec<ReferenceCondition>,
    pub crossing_window: Duration,
}

/// Unit of work: evaluate one condition for one vehicle at one candidate point.
#[derive(Debug, Clone)]
pub(crate) struct Task {
    /// Index into [`SharedState::conditions`].
    pub condition: usize,
    pub vehicle: VehicleId,
    pub candidate: TrackPoint,
}

#[derive(Debug)]
pub(crate) enum TaskMessage {
    Task(Task),
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Resume,
    Exit,
}

#[derive(Debug)]
pub(crate) struct WorkerReport {
    pub worker: usize,
    pub completed: usize,
    pub results: IterationResult,
}

/// Concatenate the reports of all workers, per condition.
fn merge_reports(reports: Vec<WorkerReport>) -> IterationResult {
    let mut merged = IterationResult::default();
    for report in reports {
        for (condition, samples) in report.results {
            merged.entry(condition).or_default().merge(samples);
        }
    }
    merged
}

fn run_worker(
    id: usize,
    shared: Arc<SharedState>,
    tasks: Receiver<TaskMessage>,
    reports: Sender<WorkerReport>,
    commands: Receiver<Command>,
) {
    let mut results = IterationResult::default();
    let mut completed = 0usize;

    loop {
        match tasks.recv() {
            Ok(TaskMessage::Task(task)) => {
                match shared.conditions.get(task.condition) {
                    Some(condition) => {
                        let samples = condition.evaluate(
                            &shared.track,
                            &shared.session,
                            &task.vehicle,
                            &task.candidate,
                            shared.crossing_window,
                        );
                        results.entry(task.condition).or_default().merge(samples);
                    }
                    None => warn!("Worker {id}: unknown condition index {}", task.condition),
                }
                completed += 1;
            }
            Ok(TaskMessage::Return) => {
                let report = WorkerReport {
                    worker: id,
                    completed: std::mem::take(&mut completed),
                    results: std::mem::take(&mut results),
                };
                if reports.send(report).is_err() {
                    debug!("Worker {id}: coordinator gone, exiting");
                    return;
                }

                match commands.recv() {
                    Ok(Command::Resume) => continue,
                    Ok(Command::Exit) => {
                        debug!("Worker {id}: exit");
                        return;
                    }
                    Err(_) => {
                        debug!("Worker {id}: command channel closed, exiting");
                        return;
                    }
                }
            }
            Err(_) => {
                debug!("Worker {id}: task channel closed, exiting");
                return;
            }
        }
    }
}

/// Coordinator side of the worker threads.
pub(crate) struct WorkerPool {
    tasks: Sender<TaskMessage>,
    commands: Sender<Command>,
    reports: Receiver<WorkerReport>,
    handles: Vec<JoinHandle<()>>,
    barrier_timeout: Option<StdDuration>,
}

impl WorkerPool {
    /// Start `workers` threads sharing `shared`.
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::InvalidParameter`] if `workers == 0`.
    /// * [`TrackError::IoError`] if a thread cannot be spawned.
    pub fn spawn(
        workers: usize,
        shared: Arc<SharedState>,
        barrier_timeout: Option<StdDuration>,
    ) -> Result<Self, TrackError> {
        if workers == 0 {
            return Err(TrackError::InvalidParameter(
                "a worker pool needs at least one worker".into(),
            ));
        }

        let (task_tx, task_rx) = unbounded();
        let (report_tx, report_rx) = unbounded();
        let (command_tx, command_rx) = unbounded();

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let shared = Arc::clone(&shared);
            let tasks = task_rx.clone();
            let reports = report_tx.clone();
            let commands = command_rx.clone();

            let handle = thread::Builder::new()
                .name(format!("trackmap-worker-{id}"))
                .spawn(move || run_worker(id, shared, tasks, reports, commands))?;
            handles.push(handle);
        }
        debug!("Started {workers} workers");

        // only workers hold report senders: all of them gone means disconnected
        drop(report_tx);

        Ok(WorkerPool {
            tasks: task_tx,
            commands: command_tx,
            reports: report_rx,
            handles,
            barrier_timeout,
        })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Process one iteration: enqueue `tasks`, wait at the barrier, merge the reports.
    ///
    /// The workers are idle when this returns; call [`WorkerPool::resume_all`] before the
    /// next iteration.
    ///
    /// Errors
    /// ----------
    /// * [`TrackError::WorkerStalled`] / [`TrackError::WorkersDisconnected`] from the barrier.
    /// * [`TrackError::BarrierMismatch`] if the reported task count differs from the
    ///   enqueued one.
    pub fn run_iteration(&mut self, tasks: Vec<Task>) -> Result<IterationResult, TrackError> {
        let enqueued = tasks.len();
        for task in tasks {
            self.tasks
                .send(TaskMessage::Task(task))
                .map_err(|_| TrackError::ChannelClosed("task channel".into()))?;
        }

        let reports = self.barrier()?;
        let completed: usize = reports.iter().map(|r| r.completed).sum();
        if completed != enqueued {
            return Err(TrackError::BarrierMismatch {
                expected: enqueued,
                completed,
            });
        }

        Ok(merge_reports(reports))
    }

    /// Queue one `Return` per worker and collect exactly as many reports.
    fn barrier(&mut self) -> Result<Vec<WorkerReport>, TrackError> {
        let expected = self.size();
        for _ in 0..expected {
            self.tasks
                .send(TaskMessage::Return)
                .map_err(|_| TrackError::ChannelClosed("task channel".into()))?;
        }

        let started = Instant::now();
        let mut reports = Vec::with_capacity(expected);

        while reports.len() < expected {
            let report = match self.barrier_timeout {
                Some(limit) => {
                    let remaining = limit.saturating_sub(started.elapsed());
                    match self.reports.recv_timeout(remaining) {
                        Ok(report) => report,
                        Err(RecvTimeoutError::Timeout) => {
                            return Err(TrackError::WorkerStalled {
                                waited: started.elapsed(),
                                received: reports.len(),
                                expected,
                            })
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            return Err(TrackError::WorkersDisconnected)
                        }
                    }
                }
                None => self
                    .reports
                    .recv()
                    .map_err(|_| TrackError::WorkersDisconnected)?,
            };
            debug!(
                "Worker {} reported {} completed tasks",
                report.worker, report.completed
            );
            reports.push(report);
        }

        Ok(reports)
    }

    fn broadcast(&self, command: Command) -> Result<(), TrackError> {
        for _ in 0..self.size() {
            self.commands
                .send(command)
                .map_err(|_| TrackError::ChannelClosed("command channel".into()))?;
        }
        Ok(())
    }

    /// Send every idle worker back to processing.
    pub fn resume_all(&self) -> Result<(), TrackError> {
        self.broadcast(Command::Resume)
    }

    /// Final barrier, `Exit` to every worker, then join them.
    pub fn shutdown(mut self) -> Result<(), TrackError> {
        self.barrier()?;
        self.broadcast(Command::Exit)?;

        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                warn!("{name} panicked before joining");
            }
        }
        debug!("All workers joined");
        Ok(())
    }
}
