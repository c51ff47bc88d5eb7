//! Render Interval - adaptive redraw scheduler.
//!
//! Periodically refreshes a container while somebody needs it, and only while
//! there is something to draw. Callers take reference-counted activations;
//! overlapping activations share one timer.
//!
//! # Pattern
//!
//! - First activation starts a timer if the container has content, otherwise
//!   subscribes to content changes and waits
//! - New content while waiting starts the timer and draws immediately
//! - A tick that finds the container empty stops the timer and waits again
//! - Releasing the last activation stops everything and draws one final frame
//!
//! # Runtime
//!
//! The timer is a tokio task spawned with [`tokio::task::spawn_local`], so
//! entering the active phase must happen inside a [`tokio::task::LocalSet`]
//! on a current-thread runtime.
//!
//! # Example
//!
//! ```ignore
//! use static_text::{Container, RenderInterval};
//!
//! let container = Container::stderr();
//! let interval = RenderInterval::new(container.clone());
//! let scope = container.create_scope();
//!
//! let activation = interval.start()?;
//! scope.set_text("Working...");
//! do_work().await;
//! activation.release()?;
//! ```

use std::cell::{Cell, RefCell};
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::config::{Config, DEFAULT_INTERVAL_MS};
use crate::container::{Container, ResolvedFrame, SubscriberId};
use crate::error::{Error, Result};

/// Period used by [`RenderInterval::new`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(DEFAULT_INTERVAL_MS);

/// Shortest accepted period. Shorter values are clamped.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalPhase {
    /// No outstanding activations.
    Idle,
    /// Activated, container empty, waiting for content.
    Waiting,
    /// Activated, timer running.
    Active,
    /// Disposed; `start()` fails.
    Disposed,
}

// =============================================================================
// State
// =============================================================================

struct Timer {
    handle: JoinHandle<()>,
    generation: u64,
}

struct IntervalState {
    period: Duration,
    ref_count: usize,
    timer: Option<Timer>,
    subscription: Option<SubscriberId>,
    /// Bumped whenever a timer is spawned or stopped; stale tasks compare against it.
    generation: u64,
    disposed: bool,
}

struct IntervalInner {
    container: Container,
    state: RefCell<IntervalState>,
}

impl IntervalInner {
    /// Resolve the container once for a decision and the draw that follows it.
    ///
    /// `None` when resolution failed; the error is logged.
    fn resolve(&self) -> Option<ResolvedFrame> {
        match self.container.resolve_frame() {
            Ok(frame) => Some(frame),
            Err(err) => {
                error!(error = %err, "resolving static text failed");
                None
            }
        }
    }

    fn draw(&self, frame: Option<&ResolvedFrame>) {
        let Some(frame) = frame else {
            return;
        };
        if let Err(err) = self.container.draw_frame(frame) {
            error!(error = %err, "static text refresh failed");
        }
    }

    /// Leave Idle: start the timer or wait for content.
    fn engage(self: &Rc<Self>) {
        let frame = self.resolve();
        if has_content(frame.as_ref()) {
            self.activate(frame.as_ref());
        } else {
            debug!("render interval waiting for content");
            self.subscribe();
        }
    }

    /// Start ticking and draw `frame` right away.
    fn activate(self: &Rc<Self>, frame: Option<&ResolvedFrame>) {
        debug!("render interval active");
        self.spawn_timer();
        self.draw(frame);
    }

    fn spawn_timer(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        let generation = state.generation;
        let handle =
            tokio::task::spawn_local(run_timer(Rc::downgrade(self), state.period, generation));
        state.timer = Some(Timer { handle, generation });
    }

    fn stop_timer(&self) {
        let timer = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.handle.abort();
        }
    }

    fn subscribe(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let id = self.container.subscribe_changes(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_content_changed();
            }
        }));
        self.state.borrow_mut().subscription = Some(id);
    }

    fn unsubscribe(&self) {
        let subscription = self.state.borrow_mut().subscription.take();
        if let Some(id) = subscription {
            self.container.unsubscribe_changes(id);
        }
    }

    /// Tear down timer and subscription.
    fn stop_all(&self) {
        self.stop_timer();
        self.unsubscribe();
    }

    fn on_content_changed(self: &Rc<Self>) {
        {
            let state = self.state.borrow();
            if state.disposed || state.ref_count == 0 || state.subscription.is_none() {
                return;
            }
        }
        let frame = self.resolve();
        if has_content(frame.as_ref()) {
            self.unsubscribe();
            self.activate(frame.as_ref());
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state.borrow();
        !state.disposed
            && state.ref_count > 0
            && state.timer.as_ref().is_some_and(|t| t.generation == generation)
    }

    fn on_tick(self: &Rc<Self>, generation: u64) -> ControlFlow<()> {
        if !self.is_current(generation) {
            return ControlFlow::Break(());
        }

        let frame = self.resolve();
        self.draw(frame.as_ref());

        if !self.is_current(generation) {
            return ControlFlow::Break(());
        }
        if has_content(frame.as_ref()) {
            return ControlFlow::Continue(());
        }

        // The task ends by returning Break, so the handle is dropped, not aborted.
        self.state.borrow_mut().timer.take();
        debug!("render interval idle, waiting for content");
        self.subscribe();
        ControlFlow::Break(())
    }

    fn release_one(&self) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.ref_count == 0 {
                return Ok(());
            }
            state.ref_count -= 1;
            if state.ref_count > 0 {
                return Ok(());
            }
        }
        debug!("last activation released");
        self.stop_all();
        self.container.refresh(None)
    }
}

/// A frame that failed to resolve counts as content.
fn has_content(frame: Option<&ResolvedFrame>) -> bool {
    frame.is_none_or(|frame| !frame.is_empty())
}

async fn run_timer(interval: Weak<IntervalInner>, period: Duration, generation: u64) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = interval.upgrade() else {
            break;
        };
        if inner.on_tick(generation).is_break() {
            break;
        }
    }
}

// =============================================================================
// Render Interval
// =============================================================================

/// Adaptive periodic refresh of one container.
///
/// Dropping the interval disposes it.
pub struct RenderInterval {
    inner: Rc<IntervalInner>,
}

impl RenderInterval {
    pub fn new(container: Container) -> Self {
        Self::with_interval(container, DEFAULT_INTERVAL)
    }

    pub fn with_interval(container: Container, period: Duration) -> Self {
        Self {
            inner: Rc::new(IntervalInner {
                container,
                state: RefCell::new(IntervalState {
                    period: period.max(MIN_INTERVAL),
                    ref_count: 0,
                    timer: None,
                    subscription: None,
                    generation: 0,
                    disposed: false,
                }),
            }),
        }
    }

    pub fn from_config(container: Container, config: &Config) -> Self {
        Self::with_interval(container, config.interval())
    }

    pub fn interval(&self) -> Duration {
        self.inner.state.borrow().period
    }

    /// Change the period. A running timer restarts at the new period.
    pub fn set_interval(&self, period: Duration) {
        let running = {
            let mut state = self.inner.state.borrow_mut();
            state.period = period.max(MIN_INTERVAL);
            state.timer.is_some()
        };
        if running {
            self.inner.stop_timer();
            self.inner.spawn_timer();
        }
    }

    /// Take an activation.
    ///
    /// The first outstanding activation starts the scheduler; the scheduler
    /// runs until every activation is released.
    ///
    /// # Panics
    ///
    /// Entering the active phase panics outside a tokio `LocalSet`.
    pub fn start(&self) -> Result<Activation> {
        let first = {
            let mut state = self.inner.state.borrow_mut();
            if state.disposed {
                return Err(Error::IntervalDisposed);
            }
            state.ref_count += 1;
            state.ref_count == 1
        };
        if first {
            self.inner.engage();
        }
        Ok(Activation {
            interval: Rc::downgrade(&self.inner),
            released: Cell::new(false),
        })
    }

    pub fn phase(&self) -> IntervalPhase {
        let state = self.inner.state.borrow();
        if state.disposed {
            IntervalPhase::Disposed
        } else if state.ref_count == 0 {
            IntervalPhase::Idle
        } else if state.timer.is_some() {
            IntervalPhase::Active
        } else {
            IntervalPhase::Waiting
        }
    }

    /// Outstanding activations.
    pub fn ref_count(&self) -> usize {
        self.inner.state.borrow().ref_count
    }

    /// Stop everything for good. No final refresh is drawn.
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.ref_count = 0;
        }
        self.inner.stop_all();
        debug!("render interval disposed");
    }
}

impl Drop for RenderInterval {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// Activation
// =============================================================================

/// One reference-counted use of a [`RenderInterval`].
///
/// Released explicitly with [`Activation::release`] or when dropped.
#[must_use = "dropping an activation releases it immediately"]
pub struct Activation {
    interval: Weak<IntervalInner>,
    released: Cell<bool>,
}

impl Activation {
    /// Give the activation back. Releasing the last one stops the scheduler
    /// and draws a final frame, whose error is returned. Calling again does
    /// nothing.
    pub fn release(&self) -> Result<()> {
        if self.released.replace(true) {
            return Ok(());
        }
        match self.interval.upgrade() {
            Some(inner) => inner.release_one(),
            None => Ok(()),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(error = %err, "final refresh after releasing activation failed");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ConsoleSize;
    use crate::testing::{EngineCall, recording_container};
    use crate::text::Deferred;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    const SIZE: Option<ConsoleSize> = Some(ConsoleSize::new(80, 24));
    const PERIOD: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_defaults_and_clamping() {
        let (container, _engine, _sink) = recording_container(SIZE);
        let interval = RenderInterval::new(container.clone());
        assert_eq!(interval.interval(), ms(60));
        assert_eq!(interval.phase(), IntervalPhase::Idle);

        interval.set_interval(Duration::ZERO);
        assert_eq!(interval.interval(), MIN_INTERVAL);

        let config = Config { interval_ms: 250, ..Config::default() };
        assert_eq!(RenderInterval::from_config(container, &config).interval(), ms(250));
    }

    #[test]
    fn test_start_without_content_waits_without_runtime() {
        let (container, _engine, sink) = recording_container(SIZE);
        let interval = RenderInterval::with_interval(container.clone(), PERIOD);
        let scope = container.create_scope();
        scope.set_text("");

        let activation = interval.start().unwrap();
        assert_eq!(interval.phase(), IntervalPhase::Waiting);
        assert_eq!(interval.ref_count(), 1);

        activation.release().unwrap();
        assert_eq!(interval.phase(), IntervalPhase::Idle);
        assert_eq!(sink.writes(), vec!["render:"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_never_writes() {
        LocalSet::new()
            .run_until(async {
                let (container, engine, sink) = recording_container(SIZE);
                let _interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("content");

                sleep(ms(1_050)).await;
                assert_eq!(sink.count(), 0);
                assert!(engine.calls().is_empty());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiting_then_immediate_then_periodic() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();

                let _activation = interval.start().unwrap();
                assert_eq!(interval.phase(), IntervalPhase::Waiting);

                sleep(ms(250)).await;
                assert_eq!(sink.count(), 0);

                scope.set_text("");
                assert_eq!(interval.phase(), IntervalPhase::Waiting);

                scope.set_text("working");
                assert_eq!(interval.phase(), IntervalPhase::Active);
                assert_eq!(sink.count(), 1);

                sleep(ms(250)).await;
                assert_eq!(sink.count(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_frame_evaluates_deferred_once() {
        LocalSet::new()
            .run_until(async {
                let (container, engine, _sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();

                let _activation = interval.start().unwrap();
                let evaluations = Rc::new(Cell::new(0));
                let counter = evaluations.clone();
                scope.set_text(Deferred::new(move |_| {
                    counter.set(counter.get() + 1);
                    format!("frame {}", counter.get())
                }));

                sleep(ms(350)).await;
                assert_eq!(engine.render_count(), 4);
                assert_eq!(evaluations.get(), engine.render_count());

                let drawn: Vec<String> = engine
                    .calls()
                    .into_iter()
                    .filter_map(|call| match call {
                        EngineCall::Render(items, _) => Some(items[0].text.clone()),
                        _ => None,
                    })
                    .collect();
                assert_eq!(drawn, vec!["frame 1", "frame 2", "frame 3", "frame 4"]);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_content_draws_immediately() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("ready");

                let _activation = interval.start().unwrap();
                assert_eq!(interval.phase(), IntervalPhase::Active);
                assert_eq!(sink.writes(), vec!["render:ready"]);

                sleep(ms(50)).await;
                assert_eq!(sink.count(), 1);
                sleep(ms(100)).await;
                assert_eq!(sink.count(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_activations_share_one_timer() {
        LocalSet::new()
            .run_until(async {
                let (container, engine, _sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("shared");

                let first = interval.start().unwrap();
                let second = interval.start().unwrap();
                assert_eq!(interval.ref_count(), 2);
                assert_eq!(engine.render_count(), 1);

                sleep(ms(250)).await;
                assert_eq!(engine.render_count(), 3);

                first.release().unwrap();
                assert_eq!(interval.phase(), IntervalPhase::Active);
                assert_eq!(engine.render_count(), 3);

                sleep(ms(100)).await;
                assert_eq!(engine.render_count(), 4);

                second.release().unwrap();
                assert_eq!(interval.phase(), IntervalPhase::Idle);
                assert_eq!(engine.render_count(), 5);

                second.release().unwrap();
                first.release().unwrap();
                sleep(ms(1_000)).await;
                assert_eq!(engine.render_count(), 5);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_demotes_to_waiting_when_empty() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("busy");

                let _activation = interval.start().unwrap();
                assert_eq!(sink.count(), 1);

                scope.set_text("");
                sleep(ms(150)).await;
                assert_eq!(interval.phase(), IntervalPhase::Waiting);
                assert_eq!(sink.writes(), vec!["render:busy", "render:"]);

                sleep(ms(500)).await;
                assert_eq!(sink.count(), 2);

                scope.set_text("again");
                assert_eq!(interval.phase(), IntervalPhase::Active);
                assert_eq!(sink.count(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_with_outstanding_activation() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("x");

                let activation = interval.start().unwrap();
                assert_eq!(sink.count(), 1);

                interval.dispose();
                interval.dispose();
                assert_eq!(interval.phase(), IntervalPhase::Disposed);
                assert!(matches!(interval.start(), Err(Error::IntervalDisposed)));

                sleep(ms(550)).await;
                activation.release().unwrap();
                assert_eq!(sink.count(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_restarts_timer() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("x");

                let _activation = interval.start().unwrap();
                sleep(ms(150)).await;
                assert_eq!(sink.count(), 2);

                interval.set_interval(ms(1_000));
                assert_eq!(interval.interval(), ms(1_000));
                assert_eq!(interval.ref_count(), 1);
                assert_eq!(interval.phase(), IntervalPhase::Active);

                sleep(ms(900)).await;
                assert_eq!(sink.count(), 2);
                sleep(ms(200)).await;
                assert_eq!(sink.count(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_interval_stops_timer() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("x");

                let activation = interval.start().unwrap();
                drop(interval);

                sleep(ms(550)).await;
                activation.release().unwrap();
                assert_eq!(sink.count(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_content_check_keeps_ticking() {
        LocalSet::new()
            .run_until(async {
                let (container, engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text(Deferred::fallible(|_| Err::<&str, _>("unavailable")));

                let _activation = interval.start().unwrap();
                assert_eq!(interval.phase(), IntervalPhase::Active);

                sleep(ms(250)).await;
                assert_eq!(interval.phase(), IntervalPhase::Active);
                assert_eq!(sink.count(), 0);
                assert_eq!(engine.render_count(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_activation_releases() {
        LocalSet::new()
            .run_until(async {
                let (container, _engine, sink) = recording_container(SIZE);
                let interval = RenderInterval::with_interval(container.clone(), PERIOD);
                let scope = container.create_scope();
                scope.set_text("x");

                {
                    let activation = interval.start().unwrap();
                    assert!(!activation.is_released());
                }
                assert_eq!(interval.phase(), IntervalPhase::Idle);
                assert_eq!(sink.count(), 2);
            })
            .await;
    }
}
