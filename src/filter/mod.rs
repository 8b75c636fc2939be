//! Concurrent per-candidate evidence filtering.
//!
//! For a question and an ordered candidate list, decides per candidate
//! whether it can answer the question, via an external judge call under
//! bounded concurrency.
//!
//! ## Task lifecycle
//!
//! ```text
//! Pending -> Dispatched -> Succeeded(verdict)
//!                       -> TimedOut --+--> Retried -> Pending   (attempts left)
//!                       -> Failed  ---+--> Exhausted            (retries spent)
//! ```
//!
//! ## Concurrency model
//!
//! A fixed pool of `max_workers` threads consumes a task channel. Each
//! judge call runs on a detached watchdog thread and is awaited with a
//! deadline; a call that outlives its deadline is abandoned (best-effort
//! cancellation — the downstream call may keep executing) and the task is
//! marked timed out. Workers push outcomes on a results channel consumed
//! by a single aggregator that owns every counter and the progress
//! callback, so no other part of the engine shares mutable state.
//!
//! Results are collected in completion order, not submission order; each
//! record retains the candidate's fused score so callers can re-sort by
//! rank. If timeouts or errors exceed `critical_failure_ratio` of the
//! candidate set, the run aborts with [`QfError::CriticalFailure`] instead
//! of returning a near-empty result that would masquerade as "no evidence
//! found".

pub mod cache;
pub mod verdict;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use tracing::{debug, info, warn};

pub use cache::{DEFAULT_CACHE_CAPACITY, JudgementCache};
pub use verdict::{JudgeFields, ParsedVerdict, Verdict, parse_reply};

use crate::candidate::{Candidate, sort_by_fused_score};
use crate::error::{QfError, Result};
use crate::judge::Judge;

/// How often a worker wakes to check the deadline and the cancel flag
/// while a judge call is in flight.
const WATCHDOG_TICK: Duration = Duration::from_millis(100);

/// Resolved parameters for one filter run. Per-model overrides are applied
/// by the configuration layer before these are constructed.
#[derive(Debug, Clone)]
pub struct FilterParams {
    /// Worker pool size.
    pub max_workers: usize,
    /// Hard deadline per judge call.
    pub per_call_timeout: Duration,
    /// Retries after the initial attempt, per candidate.
    pub max_retries: u32,
    /// Abort the run when timeouts or errors exceed this fraction of the
    /// candidate set.
    pub critical_failure_ratio: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            max_workers: 4,
            per_call_timeout: Duration::from_secs(30),
            max_retries: 1,
            critical_failure_ratio: 0.5,
        }
    }
}

/// One judge call to make: a candidate, the question, and which attempt
/// this is (1-based).
#[derive(Debug, Clone)]
pub struct JudgementTask {
    pub question: Arc<str>,
    pub candidate: Candidate,
    pub attempt: u32,
}

/// Terminal record for one candidate. Created once by the aggregator when
/// the task completes and never mutated afterward.
#[derive(Debug, Clone)]
pub struct JudgementRecord {
    pub candidate_id: String,
    pub kb_id: String,
    pub verdict: Verdict,
    pub reasoning: String,
    pub key_passage: Option<String>,
    /// Latency of the final attempt; zero for cache hits.
    pub latency: Duration,
    /// Attempts made; zero for cache hits.
    pub attempts: u32,
    /// Original fused score, retained so callers can re-sort by rank.
    pub fused_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRunStatus {
    Completed,
    Aborted,
}

/// Aggregate outcome of a filter run.
#[derive(Debug, Clone)]
pub struct FilterRun {
    pub run_id: uuid::Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub status: FilterRunStatus,
    /// Records in completion order.
    pub records: Vec<JudgementRecord>,
    /// Accepted ("answerable") candidates in completion order.
    pub accepted: Vec<Candidate>,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub timeout_count: usize,
    pub error_count: usize,
    pub cache_hits: usize,
    pub duration: Duration,
}

impl FilterRun {
    fn empty() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            status: FilterRunStatus::Completed,
            records: Vec::new(),
            accepted: Vec::new(),
            accepted_count: 0,
            rejected_count: 0,
            timeout_count: 0,
            error_count: 0,
            cache_hits: 0,
            duration: Duration::ZERO,
        }
    }

    pub fn total(&self) -> usize {
        self.accepted_count + self.rejected_count + self.timeout_count + self.error_count
    }

    /// Accepted candidates re-sorted by fused score descending.
    pub fn accepted_sorted(&self) -> Vec<Candidate> {
        let mut out = self.accepted.clone();
        sort_by_fused_score(&mut out);
        out
    }

    /// Summary string suitable for logging.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("accepted {}", self.accepted_count),
            format!("rejected {}", self.rejected_count),
        ];
        if self.timeout_count > 0 {
            parts.push(format!("{} timeouts", self.timeout_count));
        }
        if self.error_count > 0 {
            parts.push(format!("{} errors", self.error_count));
        }
        if self.cache_hits > 0 {
            parts.push(format!("{} cached", self.cache_hits));
        }
        parts.join(", ")
    }
}

enum WorkerOutcome {
    Judged(JudgeFields),
    TimedOut,
    Failed(String),
    /// Run cancelled while the call was in flight; no retry, no record.
    Cancelled,
}

struct WorkerResult {
    task: JudgementTask,
    outcome: WorkerOutcome,
    latency: Duration,
}

/// Bounded-concurrency evidence filter over an external judge.
pub struct EvidenceFilter {
    judge: Arc<dyn Judge>,
    params: FilterParams,
    cache: Option<Arc<JudgementCache>>,
}

impl EvidenceFilter {
    pub fn new(judge: Arc<dyn Judge>, params: FilterParams) -> Self {
        Self {
            judge,
            params,
            cache: None,
        }
    }

    /// Attach an explicit judgement cache shared across runs.
    pub fn with_cache(mut self, cache: Arc<JudgementCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run the filter. `progress` fires exactly once per completed
    /// candidate with `(processed, total)`, `processed` monotonically
    /// non-decreasing.
    ///
    /// # Errors
    ///
    /// [`QfError::CriticalFailure`] when timeouts or errors exceed the
    /// configured ratio of the candidate set; the caller is expected to
    /// fall back to the unfiltered candidate list.
    pub fn run(
        &self,
        question: &str,
        candidates: &[Candidate],
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<FilterRun> {
        let started = Instant::now();
        let total = candidates.len();
        let mut run = FilterRun::empty();

        if total == 0 {
            return Ok(run);
        }

        let question: Arc<str> = Arc::from(question);
        let mut processed = 0usize;

        // Resolve cache hits up front; only uncached candidates are
        // dispatched to the pool.
        let mut pending: Vec<JudgementTask> = Vec::new();
        for candidate in candidates {
            let cached = self.cache.as_ref().and_then(|cache| {
                cache.get(&question, &candidate.knowledge_base_id, &candidate.id)
            });
            if let Some(fields) = cached {
                run.cache_hits += 1;
                self.record_terminal(
                    &mut run,
                    candidate,
                    fields.verdict(),
                    fields.reasoning.clone(),
                    fields.key_passage.clone(),
                    Duration::ZERO,
                    0,
                );
                processed += 1;
                if let Some(cb) = progress.as_deref_mut() {
                    cb(processed, total);
                }
            } else {
                pending.push(JudgementTask {
                    question: Arc::clone(&question),
                    candidate: candidate.clone(),
                    attempt: 1,
                });
            }
        }

        if pending.is_empty() {
            run.duration = started.elapsed();
            return Ok(run);
        }

        let workers = self.params.max_workers.clamp(1, pending.len());
        let cancel = Arc::new(AtomicBool::new(false));
        let (task_tx, task_rx) = unbounded::<JudgementTask>();
        let (result_tx, result_rx) = unbounded::<WorkerResult>();

        let mut outstanding = pending.len();
        for task in pending {
            task_tx
                .send(task)
                .map_err(|_| QfError::JudgeCall("worker pool disconnected".to_string()))?;
        }

        let critical: Result<()> = std::thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let cancel = Arc::clone(&cancel);
                let judge = Arc::clone(&self.judge);
                let timeout = self.params.per_call_timeout;
                scope.spawn(move || {
                    worker_loop(&judge, &task_rx, &result_tx, &cancel, timeout);
                });
            }
            drop(result_tx);

            let outcome = self.aggregate(
                &mut run,
                &result_rx,
                &task_tx,
                &mut outstanding,
                &mut processed,
                total,
                &mut progress,
            );

            // Closing the task channel and raising the cancel flag lets
            // every worker exit; in-flight calls are abandoned at the next
            // watchdog tick.
            cancel.store(true, Ordering::Relaxed);
            drop(task_tx);
            outcome
        });

        run.duration = started.elapsed();

        match critical {
            Ok(()) => {
                info!(run_id = %run.run_id, "evidence filter completed: {}", run.summary());
                Ok(run)
            }
            Err(err) => {
                run.status = FilterRunStatus::Aborted;
                warn!(run_id = %run.run_id, "evidence filter aborted: {}", run.summary());
                Err(err)
            }
        }
    }

    /// Consume worker results, re-enqueue retries, own all counters.
    #[allow(clippy::too_many_arguments)]
    fn aggregate(
        &self,
        run: &mut FilterRun,
        result_rx: &Receiver<WorkerResult>,
        task_tx: &Sender<JudgementTask>,
        outstanding: &mut usize,
        processed: &mut usize,
        total: usize,
        progress: &mut Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()> {
        while *outstanding > 0 {
            let result = result_rx
                .recv()
                .map_err(|_| QfError::JudgeCall("worker pool disconnected".to_string()))?;

            let (verdict, reasoning, key_passage) = match result.outcome {
                WorkerOutcome::Cancelled => {
                    *outstanding -= 1;
                    continue;
                }
                WorkerOutcome::Judged(fields) => {
                    if let Some(cache) = &self.cache {
                        cache.put(
                            &result.task.question,
                            &result.task.candidate.knowledge_base_id,
                            &result.task.candidate.id,
                            fields.clone(),
                        );
                    }
                    (fields.verdict(), fields.reasoning, fields.key_passage)
                }
                WorkerOutcome::TimedOut => {
                    if result.task.attempt <= self.params.max_retries {
                        self.requeue(task_tx, result.task)?;
                        continue;
                    }
                    (Verdict::Timeout, "judge call timed out".to_string(), None)
                }
                WorkerOutcome::Failed(reason) => {
                    if result.task.attempt <= self.params.max_retries {
                        self.requeue(task_tx, result.task)?;
                        continue;
                    }
                    (Verdict::Error, reason, None)
                }
            };

            *outstanding -= 1;
            self.record_terminal(
                run,
                &result.task.candidate,
                verdict,
                reasoning,
                key_passage,
                result.latency,
                result.task.attempt,
            );
            *processed += 1;
            if let Some(cb) = progress.as_deref_mut() {
                cb(*processed, total);
            }

            let limit = self.params.critical_failure_ratio * total as f64;
            if run.timeout_count as f64 > limit || run.error_count as f64 > limit {
                return Err(QfError::CriticalFailure {
                    timeouts: run.timeout_count,
                    errors: run.error_count,
                    total,
                    ratio: self.params.critical_failure_ratio,
                });
            }
        }

        Ok(())
    }

    fn requeue(&self, task_tx: &Sender<JudgementTask>, mut task: JudgementTask) -> Result<()> {
        debug!(
            candidate = %task.candidate.id,
            attempt = task.attempt,
            "retrying judgement task"
        );
        task.attempt += 1;
        task_tx
            .send(task)
            .map_err(|_| QfError::JudgeCall("worker pool disconnected".to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    fn record_terminal(
        &self,
        run: &mut FilterRun,
        candidate: &Candidate,
        verdict: Verdict,
        reasoning: String,
        key_passage: Option<String>,
        latency: Duration,
        attempts: u32,
    ) {
        match verdict {
            Verdict::RelevantAnswerable => {
                run.accepted_count += 1;
                run.accepted.push(candidate.clone());
            }
            Verdict::RelevantUnanswerable | Verdict::Irrelevant => run.rejected_count += 1,
            Verdict::Timeout => run.timeout_count += 1,
            Verdict::Error => run.error_count += 1,
        }

        run.records.push(JudgementRecord {
            candidate_id: candidate.id.clone(),
            kb_id: candidate.knowledge_base_id.clone(),
            verdict,
            reasoning,
            key_passage,
            latency,
            attempts,
            fused_score: candidate.fused_score,
        });
    }
}

fn worker_loop(
    judge: &Arc<dyn Judge>,
    task_rx: &Receiver<JudgementTask>,
    result_tx: &Sender<WorkerResult>,
    cancel: &AtomicBool,
    timeout: Duration,
) {
    while let Ok(task) = task_rx.recv() {
        if cancel.load(Ordering::Relaxed) {
            let _ = result_tx.send(WorkerResult {
                task,
                outcome: WorkerOutcome::Cancelled,
                latency: Duration::ZERO,
            });
            continue;
        }

        let started = Instant::now();
        let outcome = judge_with_deadline(judge, &task, cancel, timeout);
        let latency = started.elapsed();

        if result_tx
            .send(WorkerResult {
                task,
                outcome,
                latency,
            })
            .is_err()
        {
            break;
        }
    }
}

/// Run one judge call on a detached watchdog thread and await it with a
/// deadline. The watchdog thread owns its inputs, so a timed-out call is
/// simply abandoned; its eventual result is dropped with the channel.
fn judge_with_deadline(
    judge: &Arc<dyn Judge>,
    task: &JudgementTask,
    cancel: &AtomicBool,
    timeout: Duration,
) -> WorkerOutcome {
    let (reply_tx, reply_rx) = bounded::<Result<String>>(1);
    let judge = Arc::clone(judge);
    let question = Arc::clone(&task.question);
    let text = task.candidate.text.clone();

    std::thread::spawn(move || {
        let reply = judge.evaluate(&question, &text);
        let _ = reply_tx.send(reply);
    });

    let deadline = Instant::now() + timeout;
    loop {
        match reply_rx.recv_timeout(WATCHDOG_TICK.min(timeout)) {
            Ok(Ok(raw)) => {
                return match parse_reply(&raw) {
                    ParsedVerdict::Structured(fields) | ParsedVerdict::Heuristic(fields) => {
                        WorkerOutcome::Judged(fields)
                    }
                    ParsedVerdict::Unparseable => {
                        WorkerOutcome::Failed("judge reply unparseable".to_string())
                    }
                };
            }
            Ok(Err(err)) => return WorkerOutcome::Failed(err.to_string()),
            Err(RecvTimeoutError::Timeout) => {
                if cancel.load(Ordering::Relaxed) {
                    return WorkerOutcome::Cancelled;
                }
                if Instant::now() >= deadline {
                    return WorkerOutcome::TimedOut;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return WorkerOutcome::Failed("judge call panicked".to_string());
            }
        }
    }
}
