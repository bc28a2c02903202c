//! Lazy instance: the scan driver and the element load state machine.
//!
//! Each element moves through pending, dispatched and settled. A scan
//! marks every candidate as handled and queues its load; loaders report
//! back through their responder, and the settlement is handled as its own
//! queue task. Once the item collection is empty and nothing is in flight,
//! `on_finished_all` fires.
//!
//! The instance never reads a clock. Every entry point takes the current
//! [`Instant`] and the host drives queued work by calling [`Lazy::tick`].

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use fos_dom::{Document, NodeId};
use smol::LocalExecutor;
use smol::channel::{self, Receiver, Sender};

use crate::callbacks::Callbacks;
use crate::item::{self, ElementKind};
use crate::loader::image::ImageLoader;
use crate::loader::{LoadContext, Loader, LoaderRegistry, default_registry};
use crate::queue::{Enqueued, ExecutionQueue, QueueTask};
use crate::responder::{DispatchId, Responder, Settlement};
use crate::throttle::Throttle;
use crate::viewport::ViewportCache;
use crate::{Bind, Config, Platform, Result, ScrollTarget, SharedDocument};

/// Host events routed to an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyEvent {
    /// The window `load` event
    PageLoad,
    Scroll(ScrollTarget),
    Resize(ScrollTarget),
}

#[derive(Debug)]
enum Task {
    Rescan { force: bool },
    Load { node: NodeId, id: DispatchId, kind: ElementKind },
    Settled(Settlement),
    FinishedAll,
}

impl QueueTask for Task {
    fn absorb(&mut self, later: Self) {
        if let (Task::Rescan { force }, Task::Rescan { force: later_force }) = (self, later) {
            *force |= later_force;
        }
    }
}

/// Configures and creates a [`Lazy`] instance
pub struct LazyBuilder {
    document: SharedDocument,
    platform: Rc<dyn Platform>,
    items: Vec<NodeId>,
    config: Config,
    registry: Option<Rc<LoaderRegistry>>,
    callbacks: Callbacks,
}

impl LazyBuilder {
    /// Candidate elements, in scan order
    pub fn items(mut self, items: impl IntoIterator<Item = NodeId>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use `registry` instead of the shared default one
    pub fn registry(mut self, registry: Rc<LoaderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn before_load(mut self, callback: impl FnMut(NodeId, &mut Document) + 'static) -> Self {
        self.callbacks.before_load = Some(Box::new(callback));
        self
    }

    pub fn after_load(mut self, callback: impl FnMut(NodeId, &mut Document) + 'static) -> Self {
        self.callbacks.after_load = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(NodeId, &mut Document) + 'static) -> Self {
        self.callbacks.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_finished_all(mut self, callback: impl FnMut() + 'static) -> Self {
        self.callbacks.on_finished_all = Some(Box::new(callback));
        self
    }

    /// Validate the configuration, prepare the items and start the instance.
    ///
    /// With `Bind::Event`, or a document that already finished loading,
    /// the first scan is triggered right away.
    pub fn build(self, now: Instant) -> Result<Lazy> {
        self.config.validate()?;
        let config = Rc::new(self.config);

        let items = {
            let mut doc = self.document.borrow_mut();
            item::prepare(&mut doc, self.items, &config, &[])
        };
        let (settle_tx, settle_rx) = channel::unbounded();

        let mut lazy = Lazy {
            queue: ExecutionQueue::new(config.enable_queueing, config.queue_interval()),
            throttle: Throttle::new(config.throttle_interval(), config.enable_throttle),
            registry: self.registry.unwrap_or_else(default_registry),
            image_loader: Rc::new(ImageLoader),
            document: self.document,
            platform: self.platform,
            callbacks: self.callbacks,
            items,
            in_flight: HashSet::new(),
            next_dispatch: 0,
            viewport: ViewportCache::new(),
            delay_until: None,
            executor: Rc::new(LocalExecutor::new()),
            settle_tx,
            settle_rx,
            alive: Rc::new(Cell::new(true)),
            initialized: false,
            listening: false,
            finish_armed: true,
            config,
        };

        tracing::info!(name = %lazy.config.name, items = lazy.items.len(), "lazy instance created");

        let loaded = lazy.document.borrow().is_loaded();
        if lazy.config.bind == Bind::Event || loaded {
            lazy.initialize(now);
        }
        lazy.pump();
        Ok(lazy)
    }
}

/// Deferred loading instance bound to one document
pub struct Lazy {
    config: Rc<Config>,
    document: SharedDocument,
    platform: Rc<dyn Platform>,
    registry: Rc<LoaderRegistry>,
    image_loader: Rc<dyn Loader>,
    callbacks: Callbacks,

    items: Vec<NodeId>,
    in_flight: HashSet<DispatchId>,
    next_dispatch: u64,

    queue: ExecutionQueue<Task>,
    throttle: Throttle,
    viewport: ViewportCache,
    delay_until: Option<Instant>,

    executor: Rc<LocalExecutor<'static>>,
    settle_tx: Sender<Settlement>,
    settle_rx: Receiver<Settlement>,
    alive: Rc<Cell<bool>>,

    initialized: bool,
    listening: bool,
    finish_armed: bool,
}

impl Lazy {
    pub fn builder(document: SharedDocument, platform: Rc<dyn Platform>) -> LazyBuilder {
        LazyBuilder {
            document,
            platform,
            items: Vec::new(),
            config: Config::default(),
            registry: None,
            callbacks: Callbacks::default(),
        }
    }

    // ------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------

    /// Request a scan, optionally subject to the throttle
    pub fn update(&mut self, use_throttle: bool, now: Instant) {
        if self.is_destroyed() {
            return;
        }
        self.request_scan(now, !use_throttle, false);
        self.pump();
    }

    /// Force-load every remaining item regardless of position
    pub fn load_all(&mut self, now: Instant) {
        if self.is_destroyed() {
            return;
        }
        tracing::debug!(name = %self.config.name, "load all requested");
        self.request_scan(now, true, true);
        self.pump();
    }

    /// Prepare and merge more candidates. Nodes that are handled or
    /// already tracked are ignored. Returns how many were added.
    pub fn add_items(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> usize {
        if self.is_destroyed() {
            return 0;
        }
        let fresh = {
            let mut doc = self.document.borrow_mut();
            item::prepare(&mut doc, nodes, &self.config, &self.items)
        };
        if !fresh.is_empty() {
            self.finish_armed = true;
        }
        let added = fresh.len();
        self.items.extend(fresh);
        tracing::debug!(added, items = self.items.len(), "items added");
        added
    }

    /// Items not yet handled
    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    /// Stop the instance for good.
    ///
    /// Pending work is dropped and responders still held by loaders become
    /// no-ops.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.detach_listeners();
        self.alive.set(false);
        self.items.clear();
        self.queue.clear();
        self.throttle.cancel();
        self.delay_until = None;
        self.settle_rx.close();
        tracing::info!(name = %self.config.name, "lazy instance destroyed");
    }

    /// Route a host event
    pub fn handle_event(&mut self, event: LazyEvent, now: Instant) {
        if self.is_destroyed() {
            return;
        }
        match event {
            LazyEvent::PageLoad => {
                if !self.initialized {
                    self.initialize(now);
                }
            }
            LazyEvent::Scroll(target) | LazyEvent::Resize(target) => {
                // re-measure on the next scan, listening or not
                if matches!(event, LazyEvent::Resize(_)) {
                    self.viewport.invalidate();
                }
                if !self.listening || target != self.config.append_scroll {
                    return;
                }
                self.request_scan(now, false, false);
            }
        }
        self.pump();
    }

    /// Advance timers and run due work
    pub fn tick(&mut self, now: Instant) {
        if self.is_destroyed() {
            return;
        }

        if self.delay_until.is_some_and(|at| now >= at) {
            self.delay_until = None;
            tracing::debug!(name = %self.config.name, "delay elapsed, loading everything");
            self.schedule(Task::Rescan { force: true });
        }
        if self.throttle.poll(now) {
            self.schedule(Task::Rescan { force: false });
        }

        self.pump();
        if let Some(task) = self.queue.pop_due(now) {
            self.run(task);
        }
        self.pump();
    }

    /// Dispatched elements that have not settled yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether scroll and resize events trigger scans
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_destroyed(&self) -> bool {
        !self.alive.get()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Queued tasks not yet run
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    // ------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------

    fn initialize(&mut self, now: Instant) {
        self.initialized = true;

        if let Some(delay) = self.config.delay_duration() {
            self.delay_until = Some(now + delay);
        }
        if self.config.delay.is_none() || self.config.combined {
            self.listening = true;
            self.request_scan(now, true, false);
        }
        tracing::info!(
            name = %self.config.name,
            listening = self.listening,
            delayed = self.delay_until.is_some(),
            "lazy instance initialized"
        );
    }

    fn request_scan(&mut self, now: Instant, ignore_throttle: bool, force: bool) {
        if self.throttle.trigger(now, ignore_throttle) {
            self.schedule(Task::Rescan { force });
        }
    }

    fn detach_listeners(&mut self) {
        if self.listening {
            self.listening = false;
            tracing::debug!(name = %self.config.name, "listeners detached");
        }
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    fn schedule(&mut self, task: Task) {
        let rescan = matches!(task, Task::Rescan { .. });
        match self.queue.enqueue(task, rescan) {
            Enqueued::Immediate(task) => self.run(task),
            Enqueued::Deferred | Enqueued::Coalesced => {}
        }
    }

    fn run(&mut self, task: Task) {
        tracing::trace!("running {:?}", task);
        match task {
            Task::Rescan { force } => self.scan(force),
            Task::Load { node, id, kind } => self.start_load(node, id, kind),
            Task::Settled(settlement) => self.finish_load(settlement),
            Task::FinishedAll => {
                tracing::info!(name = %self.config.name, "all items finished");
                self.callbacks.finished_all();
            }
        }
    }

    /// Drive loader futures and turn settlements into queue tasks
    fn pump(&mut self) {
        loop {
            let mut progressed = false;
            while self.executor.try_tick() {
                progressed = true;
            }
            while let Ok(settlement) = self.settle_rx.try_recv() {
                progressed = true;
                if self.in_flight.contains(&settlement.id) {
                    self.schedule(Task::Settled(settlement));
                } else {
                    tracing::trace!(node = %settlement.node, "stale settlement ignored");
                }
            }
            if !progressed || self.is_destroyed() {
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Scan and state machine
    // ------------------------------------------------------------------

    fn scan(&mut self, force: bool) {
        if self.items.is_empty() {
            return;
        }

        let config = Rc::clone(&self.config);
        let viewport = self.viewport.get(&self.document.borrow());
        let mut dispatched = 0usize;

        for node in self.items.clone() {
            let kind = {
                let mut doc = self.document.borrow_mut();
                let Some(kind) = item::is_candidate(&doc, node, &config, viewport, force) else {
                    continue;
                };
                if let Err(err) = doc.set_flag(node, &config.handled_name) {
                    tracing::warn!(node = %node, "cannot mark element handled: {}", err);
                    continue;
                }
                kind
            };

            let id = DispatchId(self.next_dispatch);
            self.next_dispatch += 1;
            self.in_flight.insert(id);
            dispatched += 1;
            tracing::debug!(node = %node, kind = ?kind, "dispatching load");
            self.schedule(Task::Load { node, id, kind });
        }

        {
            let doc = self.document.borrow();
            self.items.retain(|node| !doc.has_flag(*node, &config.handled_name));
        }
        tracing::trace!(force, dispatched, remaining = self.items.len(), "scan finished");

        // items handled elsewhere leave nothing to settle
        if self.finish_armed && self.items.is_empty() && self.in_flight.is_empty() {
            self.finish_armed = false;
            self.schedule(Task::FinishedAll);
        }

        if self.items.is_empty() && config.auto_destroy {
            self.detach_listeners();
        }
    }

    fn start_load(&mut self, node: NodeId, id: DispatchId, kind: ElementKind) {
        if !self.in_flight.contains(&id) {
            return;
        }

        self.callbacks.before_load(node, &mut self.document.borrow_mut());

        let responder = Responder::new(id, node, self.settle_tx.clone(), Rc::clone(&self.alive));
        let loader = match &kind {
            ElementKind::Custom(name) => {
                let tag = self.document.borrow().tag_name(node).unwrap_or_default().to_string();
                self.registry.resolve(name, &tag)
            }
            ElementKind::Image | ElementKind::BackgroundCarrier => Ok(Rc::clone(&self.image_loader)),
        };

        match loader {
            Ok(loader) => {
                let cx = LoadContext::new(
                    node,
                    Rc::clone(&self.document),
                    Rc::clone(&self.platform),
                    Rc::clone(&self.config),
                    Rc::clone(&self.executor),
                );
                loader.load(cx, responder);
            }
            Err(err) => {
                tracing::warn!(node = %node, "{}", err);
                responder.fail();
            }
        }
    }

    fn finish_load(&mut self, settlement: Settlement) {
        let Settlement { id, node, success } = settlement;
        if !self.in_flight.contains(&id) {
            return;
        }

        {
            let mut doc = self.document.borrow_mut();
            if success {
                if let Err(err) = doc.set_flag(node, &self.config.loaded_name) {
                    tracing::debug!(node = %node, "loaded flag not set: {}", err);
                }
                self.callbacks.after_load(node, &mut doc);
            } else {
                self.callbacks.on_error(node, &mut doc);
            }
        }

        self.in_flight.remove(&id);
        tracing::debug!(node = %node, success, in_flight = self.in_flight.len(), "load settled");

        if self.finish_armed && self.items.is_empty() && self.in_flight.is_empty() {
            self.finish_armed = false;
            self.schedule(Task::FinishedAll);
        }
    }
}

impl std::fmt::Debug for Lazy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy")
            .field("name", &self.config.name)
            .field("items", &self.items.len())
            .field("in_flight", &self.in_flight.len())
            .field("queued", &self.queue.len())
            .field("listening", &self.listening)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
