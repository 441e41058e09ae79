//! One running brew, shared by every surface that shows it.
//!
//! [`SharedTimer`] owns the single [`BrewTimerEngine`] of a session together
//! with the task that ticks it once per second. Clones are handles to the same
//! session, never copies of the engine, so a pause issued from the focus
//! overlay is what the main panel renders next.
//!
//! After every command or tick the order is fixed:
//! 1. the engine mutates under the lock and the driver is started/stopped to match
//! 2. still under the lock, the new snapshot is published on the watch channel
//! 3. events go out on the broadcast channel
//! 4. notification sinks run, then the history writer on `BrewFinished`

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::NotificationSink;
use crate::recipe::StepTable;
use crate::storage::HistoryWriter;
use crate::timer::{BrewTimerEngine, TimerSnapshot};

/// One tick of the engine.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const EVENT_CAPACITY: usize = 64;

/// Cheap-to-clone handle on the one engine of a brew session.
#[derive(Clone)]
pub struct SharedTimer {
    inner: Arc<Inner>,
}

struct Inner {
    core: Mutex<Core>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    event_tx: broadcast::Sender<Event>,
    notifiers: Vec<Arc<dyn NotificationSink>>,
    history: Option<Arc<dyn HistoryWriter>>,
    runtime: Handle,
}

struct Core {
    engine: BrewTimerEngine,
    driver: Option<Driver>,
    /// Bumped every time a driver is spawned; ticks carry the epoch they
    /// were spawned with so a stale one can be recognised and dropped.
    epoch: u64,
    /// Set by `shutdown`; no driver is spawned afterwards.
    closed: bool,
}

struct Driver {
    epoch: u64,
    handle: JoinHandle<()>,
}

pub struct SharedTimerBuilder {
    engine: BrewTimerEngine,
    notifiers: Vec<Arc<dyn NotificationSink>>,
    history: Option<Arc<dyn HistoryWriter>>,
    runtime: Option<Handle>,
}

impl SharedTimerBuilder {
    pub fn notifier(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifiers.push(sink);
        self
    }

    pub fn history(mut self, writer: Arc<dyn HistoryWriter>) -> Self {
        self.history = Some(writer);
        self
    }

    /// Spawn the tick driver on `runtime` instead of the ambient one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// # Errors
    /// Returns [`CoreError::Runtime`] when no runtime was given and the
    /// caller is not inside a tokio runtime.
    pub fn build(self) -> Result<SharedTimer> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| CoreError::Runtime(e.to_string()))?,
        };
        let (snapshot_tx, _) = watch::channel(self.engine.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        debug!(
            "Opened brew session {} for recipe {}",
            self.engine.session_id(),
            self.engine.steps().recipe_id()
        );
        Ok(SharedTimer {
            inner: Arc::new(Inner {
                core: Mutex::new(Core {
                    engine: self.engine,
                    driver: None,
                    epoch: 0,
                    closed: false,
                }),
                snapshot_tx,
                event_tx,
                notifiers: self.notifiers,
                history: self.history,
                runtime,
            }),
        })
    }
}

impl SharedTimer {
    pub fn builder(engine: BrewTimerEngine) -> SharedTimerBuilder {
        SharedTimerBuilder {
            engine,
            notifiers: Vec::new(),
            history: None,
            runtime: None,
        }
    }

    /// Share `engine` with no notifiers or history, on the ambient runtime.
    pub fn new(engine: BrewTimerEngine) -> Result<Self> {
        Self::builder(engine).build()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.event_tx.subscribe()
    }

    /// Read-only access to the step table of the current session.
    pub fn with_steps<T>(&self, f: impl FnOnce(&StepTable) -> T) -> T {
        f(self.inner.lock().engine.steps())
    }

    /// Attach a presentation surface.
    pub fn attach(&self, label: impl Into<String>) -> TimerView {
        TimerView {
            label: label.into(),
            timer: self.clone(),
            rx: self.subscribe(),
        }
    }

    /// Whether the tick driver is currently alive.
    pub fn is_driving(&self) -> bool {
        self.inner
            .lock()
            .driver
            .as_ref()
            .is_some_and(|d| !d.handle.is_finished())
    }

    /// True when both handles point at the same session.
    pub fn same_session(&self, other: &SharedTimer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::start)
    }

    pub fn pause(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::pause)
    }

    pub fn resume(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::resume)
    }

    pub fn toggle_pause(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::toggle_pause)
    }

    pub fn advance_step(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::advance_step)
    }

    pub fn jump_to_step(&self, target: usize) -> Vec<Event> {
        self.inner.apply(|engine| engine.jump_to_step(target))
    }

    pub fn finish(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::finish)
    }

    pub fn reset(&self) -> Vec<Event> {
        self.inner.apply(BrewTimerEngine::reset)
    }

    /// Start a fresh idle session on a different recipe.
    pub fn load_recipe(&self, steps: StepTable) -> Vec<Event> {
        self.inner.apply(|engine| engine.load_recipe(steps))
    }

    /// Stop the tick driver for good without finishing the brew.
    ///
    /// Used when the owning context goes away mid-brew; the engine keeps its
    /// last state but no further tick will reach it, even after a resume.
    pub fn shutdown(&self) {
        let mut core = self.inner.lock();
        core.closed = true;
        core.stop_driver();
        debug!("Brew session {} shut down", core.engine.session_id());
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Core> {
        // Engine commands don't panic; a poisoned lock still holds a usable engine.
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply<F>(self: &Arc<Self>, command: F) -> Vec<Event>
    where
        F: FnOnce(&mut BrewTimerEngine) -> Vec<Event>,
    {
        let events = {
            let mut core = self.lock();
            let events = command(&mut core.engine);
            if events.is_empty() {
                return events;
            }
            self.sync_driver(&mut core);
            // Sent under the lock so the watch channel sees mutations in engine order.
            self.snapshot_tx.send_replace(core.engine.snapshot());
            events
        };
        self.publish(&events);
        events
    }

    /// Deliver one tick from the driver spawned with `epoch`.
    ///
    /// Returns false once the driver should exit.
    fn tick(self: &Arc<Self>, epoch: u64) -> bool {
        let events = {
            let mut core = self.lock();
            let current = core.driver.as_ref().map(|d| d.epoch);
            if current != Some(epoch) || !core.engine.is_ticking() {
                debug!("Dropping stale tick from driver {epoch}");
                return false;
            }
            let events = core.engine.tick();
            self.snapshot_tx.send_replace(core.engine.snapshot());
            events
        };
        self.publish(&events);
        true
    }

    /// Make the driver match the engine: alive iff the engine is ticking.
    fn sync_driver(self: &Arc<Self>, core: &mut Core) {
        let should_tick = core.engine.is_ticking() && !core.closed;
        let live = core.driver.as_ref().is_some_and(|d| !d.handle.is_finished());
        match (should_tick, live) {
            (true, false) => {
                core.epoch += 1;
                let epoch = core.epoch;
                let weak = Arc::downgrade(self);
                let handle = self.runtime.spawn(run_driver(weak, epoch));
                core.driver = Some(Driver { epoch, handle });
                debug!("Tick driver {epoch} started");
            }
            (false, _) => core.stop_driver(),
            (true, true) => {}
        }
    }

    /// Fan `events` out to subscribers, sinks and history. The snapshot for
    /// them is already on the watch channel.
    fn publish(&self, events: &[Event]) {
        for event in events {
            // No receivers is fine; surfaces may only watch snapshots.
            let _ = self.event_tx.send(event.clone());
        }

        for event in events {
            for sink in &self.notifiers {
                sink.notify(event);
            }
            if let Event::BrewFinished { summary, .. } = event {
                info!(
                    "Brew {} finished: {}/{} steps, {}s elapsed, {}s overtime",
                    summary.session_id,
                    summary.completed_steps.len(),
                    summary.total_steps,
                    summary.elapsed_secs,
                    summary.overtime_secs
                );
                if let Some(history) = &self.history {
                    if let Err(e) = history.record(summary) {
                        error!("Failed to save brew {} to history: {}", summary.session_id, e);
                    }
                }
            }
        }
    }
}

impl Core {
    fn stop_driver(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.handle.abort();
            debug!("Tick driver {} stopped", driver.epoch);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let core = self.core.get_mut().unwrap_or_else(|p| p.into_inner());
        core.stop_driver();
    }
}

async fn run_driver(inner: Weak<Inner>, epoch: u64) {
    let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    // A stalled runtime loses the time instead of replaying it in a burst.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let Some(session) = inner.upgrade() else {
            break;
        };
        if !session.tick(epoch) {
            break;
        }
    }
}

/// A presentation surface attached to a [`SharedTimer`].
///
/// Reads come from the shared snapshot stream; commands go to the shared
/// engine.
pub struct TimerView {
    label: String,
    timer: SharedTimer,
    rx: watch::Receiver<TimerSnapshot>,
}

impl TimerView {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timer(&self) -> &SharedTimer {
        &self.timer
    }

    /// The latest snapshot, marking it as seen.
    pub fn current(&mut self) -> TimerSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next published snapshot.
    ///
    /// Returns `None` once the session is gone.
    pub async fn changed(&mut self) -> Option<TimerSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn toggle_pause(&self) -> Vec<Event> {
        self.timer.toggle_pause()
    }

    pub fn advance_step(&self) -> Vec<Event> {
        self.timer.advance_step()
    }

    pub fn finish(&self) -> Vec<Event> {
        self.timer.finish()
    }
}
