//! Auto-advancing demo timer.
//!
//! Each quiz item is shown for one cycle: the question alone, then the
//! question with the answer revealed, then a short transition before the next
//! item. Items wrap around forever until the owning [`DemoTimer`] is stopped
//! or dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::quiz::QuizItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoTiming {
    /// Granularity of the periodic tick.
    pub tick: Duration,
    /// Elapsed time at which the answer is revealed.
    pub answer_at: Duration,
    /// Elapsed time at which the transition to the next item begins.
    pub advance_at: Duration,
    /// Length of the transition before the next item is shown.
    pub transition_delay: Duration,
}

impl DemoTiming {
    pub const DEFAULT_TICK: Duration = Duration::from_millis(100);
    pub const DEFAULT_ANSWER_AT: Duration = Duration::from_millis(5000);
    pub const DEFAULT_ADVANCE_AT: Duration = Duration::from_millis(9000);
    pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(500);

    /// Phase an item is in after `elapsed` time within its cycle.
    pub fn phase_at(&self, elapsed: Duration) -> Phase {
        if elapsed >= self.advance_at {
            Phase::Transitioning
        } else if elapsed >= self.answer_at {
            Phase::Answer
        } else {
            Phase::Question
        }
    }

    /// Time one item occupies before the next one is shown.
    pub fn cycle(&self) -> Duration {
        self.advance_at + self.transition_delay
    }
}

impl Default for DemoTiming {
    fn default() -> Self {
        Self {
            tick: Self::DEFAULT_TICK,
            answer_at: Self::DEFAULT_ANSWER_AT,
            advance_at: Self::DEFAULT_ADVANCE_AT,
            transition_delay: Self::DEFAULT_TRANSITION_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Question,
    Answer,
    Transitioning,
}

impl Phase {
    pub fn reveals_answer(self) -> bool {
        matches!(self, Phase::Answer | Phase::Transitioning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    RevealAnswer,
    BeginTransition,
}

/// State owned by a single running demo loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoTimerState {
    current_index: usize,
    phase: Phase,
    elapsed: Duration,
}

impl DemoTimerState {
    pub fn new() -> Self {
        Self {
            current_index: 0,
            phase: Phase::Question,
            elapsed: Duration::ZERO,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Accounts for one tick. Thresholds are crossed one at a time, in order,
    /// so a coarse tick can never skip the answer phase.
    pub fn tick(&mut self, timing: &DemoTiming) -> TickOutcome {
        if self.phase == Phase::Transitioning {
            return TickOutcome::Unchanged;
        }

        self.elapsed += timing.tick;
        match (self.phase, timing.phase_at(self.elapsed)) {
            (Phase::Question, Phase::Answer | Phase::Transitioning) => {
                self.phase = Phase::Answer;
                TickOutcome::RevealAnswer
            }
            (Phase::Answer, Phase::Transitioning) => {
                self.phase = Phase::Transitioning;
                TickOutcome::BeginTransition
            }
            _ => TickOutcome::Unchanged,
        }
    }

    /// Moves to the next of `len` items and starts its cycle over.
    /// An empty dataset leaves the state untouched.
    pub fn advance(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.current_index = (self.current_index + 1) % len;
        self.phase = Phase::Question;
        self.elapsed = Duration::ZERO;
    }

    fn snapshot(&self, dataset: &[QuizItem]) -> DemoSnapshot {
        DemoSnapshot {
            index: self.current_index,
            item: dataset.get(self.current_index).cloned(),
            phase: self.phase,
            reveal_answer: self.phase.reveals_answer(),
            elapsed: self.elapsed,
        }
    }
}

impl Default for DemoTimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the presentation layer sees after every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSnapshot {
    pub index: usize,
    /// `None` only when the dataset is empty.
    pub item: Option<QuizItem>,
    pub phase: Phase,
    pub reveal_answer: bool,
    pub elapsed: Duration,
}

/// Snapshot channel shared by the handle and its loop.
///
/// Every running loop carries the generation it was started with. Stopping or
/// restarting bumps the generation while holding the channel's write lock, so
/// a retired loop can never publish again, even if it is mid-poll on another
/// worker when it gets aborted.
struct Published {
    tx: watch::Sender<DemoSnapshot>,
    generation: AtomicU64,
}

impl Published {
    fn publish(&self, generation: u64, snapshot: DemoSnapshot) -> bool {
        let mut live = false;
        self.tx.send_if_modified(|current| {
            live = self.generation.load(Ordering::Acquire) == generation;
            if live {
                *current = snapshot;
            }
            live
        });
        live
    }

    fn retire(&self) {
        self.tx.send_if_modified(|_| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            false
        });
    }

    fn begin(&self, initial: DemoSnapshot) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|current| {
            generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *current = initial;
        });
        generation
    }
}

/// Owning handle of a demo loop. Dropping it cancels the loop.
pub struct DemoTimer {
    dataset: Arc<[QuizItem]>,
    timing: DemoTiming,
    published: Arc<Published>,
    task: Option<JoinHandle<()>>,
}

impl DemoTimer {
    /// Starts cycling through `dataset`. Must be called inside a tokio runtime.
    ///
    /// An empty dataset holds a placeholder snapshot and spawns nothing.
    pub fn start(dataset: Arc<[QuizItem]>, timing: DemoTiming) -> Self {
        let initial = DemoTimerState::new().snapshot(&dataset);
        let (tx, _rx) = watch::channel(initial);
        let mut timer = Self {
            dataset,
            timing,
            published: Arc::new(Published {
                tx,
                generation: AtomicU64::new(0),
            }),
            task: None,
        };
        timer.spawn_loop();
        timer
    }

    /// Cancels the current loop and starts again from the first item.
    pub fn restart(&mut self) {
        self.stop();
        self.spawn_loop();
    }

    /// Cancels the loop, including a pending transition. Idempotent.
    pub fn stop(&mut self) {
        self.published.retire();
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Demo timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<DemoSnapshot> {
        self.published.tx.subscribe()
    }

    pub fn snapshot(&self) -> DemoSnapshot {
        self.published.tx.borrow().clone()
    }

    fn spawn_loop(&mut self) {
        let generation = self
            .published
            .begin(DemoTimerState::new().snapshot(&self.dataset));

        if self.dataset.is_empty() {
            debug!("Demo dataset is empty, holding placeholder");
            return;
        }

        let first_tick = Instant::now() + self.timing.tick;
        self.task = Some(tokio::spawn(run_loop(
            Arc::clone(&self.dataset),
            self.timing,
            Arc::clone(&self.published),
            generation,
            first_tick,
        )));
        debug!(
            "Demo timer started over {} items (generation {})",
            self.dataset.len(),
            generation
        );
    }
}

impl Drop for DemoTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    dataset: Arc<[QuizItem]>,
    timing: DemoTiming,
    published: Arc<Published>,
    generation: u64,
    first_tick: Instant,
) {
    let mut state = DemoTimerState::new();
    let mut ticker = time::interval_at(first_tick, timing.tick);

    loop {
        ticker.tick().await;
        let outcome = state.tick(&timing);
        if outcome != TickOutcome::Unchanged {
            trace!(
                "Demo item {} entered {:?} at {:?}",
                state.current_index(),
                state.phase(),
                state.elapsed()
            );
        }
        if !published.publish(generation, state.snapshot(&dataset)) {
            return;
        }

        if outcome == TickOutcome::BeginTransition {
            time::sleep(timing.transition_delay).await;
            state.advance(dataset.len());
            if !published.publish(generation, state.snapshot(&dataset)) {
                return;
            }
            ticker.reset();
        }
    }
}
