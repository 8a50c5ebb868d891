//! Scenario scheduler
//!
//! Owns the population of actors for one run: launches them staggered across
//! the ramp-up window (one tokio task each), lets every actor loop
//! independently (wait, pick, perform, record), and stops them gracefully.
//! An actor's in-flight action always runs to completion; stop signals are
//! honored between iterations only, so no two actions of the same actor can
//! ever overlap.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, PacingConfig};
use crate::session::Roster;

use super::action::ActionSet;
use super::actor::{Actor, ActorRng, BootstrapContext};
use super::metrics::{Recorder, RunReport};

/// How one actor task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    BootstrapFailed,
    Completed { actions: u64 },
}

/// Requests a graceful stop of a running scenario
#[derive(Clone)]
pub struct StopHandle {
    trigger: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        let _ = self.trigger.send(true);
    }
}

struct ActorContext {
    kind: &'static str,
    slot: usize,
    bootstrap: BootstrapContext,
    pacing: PacingConfig,
    recorder: Recorder,
    stop: watch::Receiver<bool>,
    rng: ActorRng,
}

/// Object-safe view of one kind's population
trait Population: Send + Sync {
    fn kind(&self) -> &'static str;
    fn target(&self) -> usize;
    fn set_target(&mut self, target: usize);
    fn launch(&self, ctx: ActorContext) -> JoinHandle<ActorExit>;
}

struct KindPopulation<A: Actor> {
    target: usize,
    actions: Arc<ActionSet<A>>,
}

impl<A: Actor> KindPopulation<A> {
    fn new() -> Self {
        Self {
            target: 0,
            actions: Arc::new(A::actions()),
        }
    }
}

impl<A: Actor> Population for KindPopulation<A> {
    fn kind(&self) -> &'static str {
        A::KIND
    }

    fn target(&self) -> usize {
        self.target
    }

    fn set_target(&mut self, target: usize) {
        self.target = target;
    }

    fn launch(&self, ctx: ActorContext) -> JoinHandle<ActorExit> {
        let actions = Arc::clone(&self.actions);
        tokio::spawn(drive_actor::<A>(actions, ctx))
    }
}

/// One actor's whole life: bootstrap, the action loop, exit
async fn drive_actor<A: Actor>(actions: Arc<ActionSet<A>>, mut ctx: ActorContext) -> ActorExit {
    let mut actor = match A::bootstrap(&ctx.bootstrap).await {
        Ok(actor) => actor,
        Err(err) => {
            warn!(kind = ctx.kind, slot = ctx.slot, error = %err, "actor bootstrap failed");
            ctx.recorder.actor_bootstrap_failed(ctx.kind);
            return ActorExit::BootstrapFailed;
        }
    };
    ctx.recorder.actor_started(ctx.kind);
    debug!(kind = ctx.kind, slot = ctx.slot, "actor online");

    let mut performed = 0u64;
    loop {
        if *ctx.stop.borrow() {
            break;
        }
        if let Some(limit) = ctx.pacing.actions_per_actor
            && performed >= limit
        {
            break;
        }
        let wait = ctx.pacing.sample_wait(&mut ctx.rng);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = ctx.stop.wait_for(|stopped| *stopped) => break,
        }
        let Some(action) = actions.pick(&mut ctx.rng) else {
            break;
        };
        // Stop is only honored between iterations; an in-flight action
        // always runs to completion.
        let result = action.perform(&mut actor).await;
        if let Err(err) = &result {
            debug!(
                kind = ctx.kind,
                slot = ctx.slot,
                action = action.name(),
                error = %err,
                "action failed"
            );
        }
        ctx.recorder.action(ctx.kind, action.name(), &result);
        performed += 1;
    }

    ctx.recorder.actor_finished(ctx.kind);
    debug!(
        kind = ctx.kind,
        slot = ctx.slot,
        actions = performed,
        "actor done"
    );
    ActorExit::Completed { actions: performed }
}

/// A configured set of populations, ready to run once
pub struct Scenario {
    config: Config,
    recorder: Recorder,
    populations: Vec<Box<dyn Population>>,
    explicit_targets: bool,
    trigger: Arc<watch::Sender<bool>>,
    trigger_rx: watch::Receiver<bool>,
}

impl Scenario {
    pub fn new(config: Config) -> Self {
        let (trigger, trigger_rx) = watch::channel(false);
        Self {
            config,
            recorder: Recorder::new(),
            populations: Vec::new(),
            explicit_targets: false,
            trigger: Arc::new(trigger),
            trigger_rx,
        }
    }

    /// Register a kind; its population comes from the run configuration
    pub fn register<A: Actor>(mut self) -> Self {
        self.populations.push(Box::new(KindPopulation::<A>::new()));
        self
    }

    /// Register a kind with an explicit population, bypassing the
    /// configuration's population section entirely
    pub fn with_population<A: Actor>(mut self, count: usize) -> Self {
        let mut population = KindPopulation::<A>::new();
        population.set_target(count);
        self.populations.push(Box::new(population));
        self.explicit_targets = true;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            trigger: Arc::clone(&self.trigger),
        }
    }

    /// The metrics sink shared by every actor of this run
    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    fn apply_population(&mut self) {
        if self.explicit_targets {
            return;
        }
        match self.config.population.per_kind.clone() {
            Some(per_kind) => {
                for (kind, count) in per_kind {
                    match self
                        .populations
                        .iter_mut()
                        .find(|population| population.kind() == kind)
                    {
                        Some(population) => population.set_target(count),
                        None => warn!(kind, "population names an unknown actor kind"),
                    }
                }
            }
            None => {
                if self.populations.is_empty() {
                    return;
                }
                let total = self.config.population.total;
                let kinds = self.populations.len();
                for (idx, population) in self.populations.iter_mut().enumerate() {
                    let share = total / kinds + usize::from(idx < total % kinds);
                    population.set_target(share);
                }
            }
        }
    }

    /// Launch order: kinds interleaved round-robin so mixed traffic ramps up
    /// together instead of kind by kind
    fn spawn_plan(&self) -> Vec<usize> {
        let targets: Vec<usize> = self
            .populations
            .iter()
            .map(|population| population.target())
            .collect();
        let rounds = targets.iter().copied().max().unwrap_or(0);
        let mut plan = Vec::with_capacity(targets.iter().sum());
        for round in 0..rounds {
            for (idx, &target) in targets.iter().enumerate() {
                if round < target {
                    plan.push(idx);
                }
            }
        }
        plan
    }

    /// Run to completion and build the final report
    pub async fn run(mut self) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = tokio::time::Instant::now();
        self.apply_population();

        let plan = self.spawn_plan();
        let total = plan.len();
        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        info!(
            run = %run_id,
            actors = total,
            kinds = self.populations.len(),
            seed = base_seed,
            target = %self.config.target_url,
            "starting scenario"
        );

        let launch_gap = if total > 1 {
            self.config.pacing.ramp_up / total as u32
        } else {
            Duration::ZERO
        };

        let mut handles = Vec::with_capacity(total);
        let mut stops = Vec::with_capacity(total);
        let mut trigger_rx = self.trigger_rx.clone();

        for (slot, &pop_idx) in plan.iter().enumerate() {
            if *trigger_rx.borrow() {
                break;
            }
            let population = &self.populations[pop_idx];
            let (stop_tx, stop_rx) = watch::channel(false);
            let bootstrap = BootstrapContext::new(
                self.config.target_url.clone(),
                self.config.request_timeout,
                Roster::new(self.config.accounts.clone()),
                self.recorder.clone(),
                slot,
                base_seed.wrapping_add(2 * slot as u64 + 1),
            );
            let ctx = ActorContext {
                kind: population.kind(),
                slot,
                bootstrap,
                pacing: self.config.pacing.clone(),
                recorder: self.recorder.clone(),
                stop: stop_rx,
                rng: ActorRng::seed_from_u64(base_seed.wrapping_add(2 * slot as u64)),
            };
            handles.push(population.launch(ctx));
            stops.push(stop_tx);
            if launch_gap > Duration::ZERO && slot + 1 < total {
                tokio::select! {
                    _ = tokio::time::sleep(launch_gap) => {}
                    _ = trigger_rx.wait_for(|stopped| *stopped) => {}
                }
            }
        }
        info!(actors = handles.len(), "ramp-up complete");

        let mut all = futures_util::future::join_all(handles);
        let deadline = self.config.pacing.run_for.map(|run_for| started + run_for);

        let exits = tokio::select! {
            exits = &mut all => exits,
            _ = wait_for_shutdown(deadline, &mut trigger_rx) => {
                info!("stopping, in-flight actions will finish");
                ramp_down(stops, self.config.pacing.ramp_down).await;
                all.await
            }
        };

        let panicked = exits.iter().filter(|exit| exit.is_err()).count();
        if panicked > 0 {
            warn!(count = panicked, "actor tasks ended abnormally");
        }

        let report = self.recorder.report(run_id, started_at, started.elapsed());
        info!(
            requests = report.requests_total,
            failed = report.requests_failed,
            duration_secs = format!("{:.1}", report.duration_secs),
            "scenario finished"
        );
        report
    }
}

async fn wait_for_shutdown(
    deadline: Option<tokio::time::Instant>,
    trigger: &mut watch::Receiver<bool>,
) {
    match deadline {
        Some(at) => {
            tokio::select! {
                _ = tokio::time::sleep_until(at) => {}
                _ = trigger.wait_for(|stopped| *stopped) => {}
            }
        }
        None => {
            let _ = trigger.wait_for(|stopped| *stopped).await;
        }
    }
}

/// Signal stops staggered across the ramp-down window
async fn ramp_down(stops: Vec<watch::Sender<bool>>, window: Duration) {
    if stops.is_empty() {
        return;
    }
    let gap = if stops.len() > 1 {
        window / stops.len() as u32
    } else {
        Duration::ZERO
    };
    let last = stops.len() - 1;
    for (idx, stop) in stops.into_iter().enumerate() {
        let _ = stop.send(true);
        if gap > Duration::ZERO && idx < last {
            tokio::time::sleep(gap).await;
        }
    }
}
