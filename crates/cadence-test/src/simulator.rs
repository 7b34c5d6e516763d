//! Scheduler Simulator - drives a handler against randomly paced streams
//!
//! Simulates:
//! - Producers advancing their streams at independent, random paces
//! - Bound-only advances (a stream promising nothing at a timestamp)
//! - A scheduler reacting to notifications with `schedule_invocations`

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadence_core::{CadenceError, CadenceResult, Packet, StreamId, Timestamp};
use cadence_handler::{
    build_sync_sets, HandlerCallbacks, HandlerOptions, HandlerRegistry, InputStreamHandler,
    Invocation, SyncSetConfig, SyncSetInputStreamHandler,
};
use cadence_stream::{InputStreamCollection, InputStreamQueue};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// How a simulated producer paces its stream
#[derive(Clone, Debug)]
pub struct StreamProfile {
    /// Timestamp distance between consecutive events
    pub period: i64,
    /// First timestamp
    pub phase: i64,
    /// Chance per step that the producer emits its next event
    pub emit_probability: f64,
    /// Chance that an event only advances the bound instead of carrying a packet
    pub bound_only_probability: f64,
    /// Events before the stream is closed
    pub events: usize,
}

impl StreamProfile {
    pub fn new(period: i64, events: usize) -> Self {
        StreamProfile {
            period,
            phase: 0,
            emit_probability: 1.0,
            bound_only_probability: 0.0,
            events,
        }
    }

    /// Emits every step
    pub fn steady(period: i64, events: usize) -> Self {
        Self::new(period, events)
    }

    /// Emits irregularly
    pub fn jittery(period: i64, events: usize) -> Self {
        StreamProfile {
            emit_probability: 0.4,
            ..Self::new(period, events)
        }
    }

    /// Emits irregularly and often skips timestamps with a bound
    pub fn sparse(period: i64, events: usize) -> Self {
        StreamProfile {
            emit_probability: 0.5,
            bound_only_probability: 0.5,
            ..Self::new(period, events)
        }
    }

    pub fn with_phase(mut self, phase: i64) -> Self {
        self.phase = phase;
        self
    }
}

struct Producer {
    profile: StreamProfile,
    next: i64,
    emitted: usize,
}

impl Producer {
    fn new(profile: StreamProfile) -> Self {
        Producer {
            next: profile.phase,
            profile,
            emitted: 0,
        }
    }

    fn is_active(&self) -> bool {
        self.emitted < self.profile.events
    }

    /// Maybe emit one event. Returns the packet timestamp if a packet was added.
    fn step(&mut self, queue: &InputStreamQueue, rng: &mut StdRng) -> CadenceResult<Option<Timestamp>> {
        if !self.is_active() || !rng.gen_bool(self.profile.emit_probability) {
            return Ok(None);
        }

        let timestamp = Timestamp::new(self.next);
        let produced = if rng.gen_bool(self.profile.bound_only_probability) {
            queue.set_next_timestamp_bound(timestamp.next_allowed_in_stream());
            None
        } else {
            queue.add_packet(Packet::new(timestamp, self.next.to_le_bytes().to_vec()))?;
            Some(timestamp)
        };

        self.next += self.profile.period;
        self.emitted += 1;
        if !self.is_active() {
            queue.close();
        }
        Ok(produced)
    }
}

/// Simulation setup
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Stream declarations with their producer profiles, e.g. `("VIDEO:0:left", ..)`
    pub streams: Vec<(String, StreamProfile)>,
    pub sync_sets: SyncSetConfig,
    /// Invocations the scheduler may start per notification
    pub max_allowance: usize,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn new(seed: u64) -> Self {
        SimulationConfig {
            streams: Vec::new(),
            sync_sets: SyncSetConfig::new(),
            max_allowance: 2,
            seed,
        }
    }

    pub fn with_stream(mut self, declaration: impl Into<String>, profile: StreamProfile) -> Self {
        self.streams.push((declaration.into(), profile));
        self
    }

    pub fn with_sync_set<I, S>(mut self, tag_index: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sync_sets = self.sync_sets.with_sync_set(tag_index);
        self
    }

    pub fn with_max_allowance(mut self, max_allowance: usize) -> Self {
        self.max_allowance = max_allowance;
        self
    }
}

/// Simulated scheduler around one node's handler
pub struct SchedulerSimulator {
    handler: Arc<dyn InputStreamHandler>,
    queues: Vec<Arc<InputStreamQueue>>,
    /// Producers in stream id order
    producers: Vec<Producer>,
    sync_sets: Vec<Vec<StreamId>>,
    rng: StdRng,
    max_allowance: usize,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    errors: Arc<Mutex<Vec<CadenceError>>>,
    notifications: Arc<AtomicUsize>,
    produced: Vec<Vec<Timestamp>>,
    steps: u64,
}

impl SchedulerSimulator {
    pub fn new(config: SimulationConfig) -> CadenceResult<Self> {
        let declarations: Vec<&str> = config.streams.iter().map(|(d, _)| d.as_str()).collect();
        let (collection, queues) = InputStreamCollection::with_queues(&declarations)?;

        // Queues come back in id order; line the producers up with them.
        let mut producers = Vec::with_capacity(queues.len());
        for id in collection.ids() {
            let name = collection.tag_map().name(id).unwrap_or_default();
            let profile = config
                .streams
                .iter()
                .find(|(decl, _)| decl.rsplit(':').next() == Some(name))
                .map(|(_, profile)| profile.clone())
                .unwrap_or_else(|| StreamProfile::steady(1, 0));
            producers.push(Producer::new(profile));
        }

        let sync_sets = build_sync_sets(&collection, &config.sync_sets)?;
        let handler = HandlerRegistry::with_builtins().create(
            SyncSetInputStreamHandler::NAME,
            Arc::new(collection),
            &HandlerOptions::with_sync_sets(config.sync_sets),
        )?;

        let invocations = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let notifications = Arc::new(AtomicUsize::new(0));
        let (i, e, n) = (
            Arc::clone(&invocations),
            Arc::clone(&errors),
            Arc::clone(&notifications),
        );
        handler.prepare_for_run(HandlerCallbacks {
            headers_ready: Box::new(|| {}),
            notification: Box::new(move || {
                n.fetch_add(1, Ordering::Relaxed);
            }),
            schedule: Box::new(move |invocation| i.lock().push(invocation)),
            error: Box::new(move |err| e.lock().push(err)),
        })?;

        let produced = vec![Vec::new(); queues.len()];
        Ok(SchedulerSimulator {
            handler,
            queues,
            producers,
            sync_sets,
            rng: StdRng::seed_from_u64(config.seed),
            max_allowance: config.max_allowance,
            invocations,
            errors,
            notifications,
            produced,
            steps: 0,
        })
    }

    pub fn handler(&self) -> &Arc<dyn InputStreamHandler> {
        &self.handler
    }

    /// Advance every producer once, then let the scheduler react.
    pub fn step(&mut self) -> CadenceResult<()> {
        for (index, producer) in self.producers.iter_mut().enumerate() {
            if let Some(timestamp) = producer.step(&self.queues[index], &mut self.rng)? {
                self.produced[index].push(timestamp);
            }
        }
        self.handler.core().notify();
        self.handler.schedule_invocations(self.max_allowance);
        self.steps += 1;
        Ok(())
    }

    pub fn is_producing(&self) -> bool {
        self.producers.iter().any(Producer::is_active)
    }

    /// Run until every producer is done, then drain the handler.
    pub fn run(mut self) -> CadenceResult<SimulationReport> {
        while self.is_producing() {
            self.step()?;
        }
        while self.handler.schedule_invocations(self.max_allowance) > 0 {}

        debug!(
            steps = self.steps,
            invocations = self.invocations.lock().len(),
            "simulation finished"
        );
        Ok(SimulationReport {
            invocations: std::mem::take(&mut *self.invocations.lock()),
            errors: std::mem::take(&mut *self.errors.lock()),
            notifications: self.notifications.load(Ordering::Relaxed),
            produced: self.produced,
            sync_sets: self.sync_sets,
            steps: self.steps,
        })
    }
}

/// Outcome of a simulation run
#[derive(Debug)]
pub struct SimulationReport {
    pub invocations: Vec<Invocation>,
    pub errors: Vec<CadenceError>,
    pub notifications: usize,
    /// Packet timestamps added per stream, in id order
    pub produced: Vec<Vec<Timestamp>>,
    pub sync_sets: Vec<Vec<StreamId>>,
    pub steps: u64,
}

impl SimulationReport {
    /// Packet timestamps delivered per stream, in delivery order
    pub fn delivered(&self) -> Vec<Vec<Timestamp>> {
        let mut delivered = vec![Vec::new(); self.produced.len()];
        for invocation in &self.invocations {
            if let Invocation::Process(input_set) = invocation {
                for id in input_set.filled_ids() {
                    if let Some(packet) = input_set.packet(id) {
                        delivered[id.index()].push(packet.timestamp());
                    }
                }
            }
        }
        delivered
    }

    /// Every produced packet was delivered exactly once, in order.
    pub fn is_lossless(&self) -> bool {
        self.delivered() == self.produced
    }

    /// Index of the sync set containing every filled stream of each
    /// invocation, or `None` if some invocation spans sets.
    pub fn sync_set_per_invocation(&self) -> Option<Vec<usize>> {
        self.invocations
            .iter()
            .filter_map(|invocation| match invocation {
                Invocation::Process(input_set) => Some(input_set),
                Invocation::Close => None,
            })
            .map(|input_set| {
                let filled: Vec<StreamId> = input_set.filled_ids().collect();
                self.sync_sets
                    .iter()
                    .position(|set| filled.iter().all(|id| set.contains(id)))
            })
            .collect()
    }

    /// Invocation timestamps strictly increase within each sync set.
    pub fn is_ordered_per_sync_set(&self) -> bool {
        let Some(owners) = self.sync_set_per_invocation() else {
            return false;
        };
        let mut last: BTreeMap<usize, Timestamp> = BTreeMap::new();
        let processed = self
            .invocations
            .iter()
            .filter(|invocation| matches!(invocation, Invocation::Process(_)));
        for (owner, invocation) in owners.into_iter().zip(processed) {
            let timestamp = invocation.timestamp();
            if last.get(&owner).is_some_and(|prev| *prev >= timestamp) {
                return false;
            }
            last.insert(owner, timestamp);
        }
        true
    }

    /// A close was scheduled exactly once, as the final invocation.
    pub fn closed_once(&self) -> bool {
        let closes = self
            .invocations
            .iter()
            .filter(|invocation| **invocation == Invocation::Close)
            .count();
        closes == 1 && self.invocations.last() == Some(&Invocation::Close)
    }
}
