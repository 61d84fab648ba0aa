//! The run pipeline and its asynchronous handle.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::api::{
    DemandForecast, OptimizationRequest, OptimizationResponse, PhaseTiming, RunRecord, RunSink,
};
use crate::builder;
use crate::error::{ConfigError, PartialReason, ValidationError};
use crate::evaluation::FitnessEvaluator;
use crate::explain::explain;
use crate::ga::evolve;
use crate::rl::{Refiner, ValueStore};

use super::finalize::finalize;
use super::{Budget, CancelToken, Phase, PhaseCell, SolverConfig};

/// Result of a run: the response plus run diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    /// Response for the caller.
    pub response: OptimizationResponse,
    /// Seed every stochastic step derived from.
    pub seed: u64,
    /// Wall-clock time per phase.
    pub timings: Vec<PhaseTiming>,
    /// GA generations run; 0 when the GA was skipped.
    pub generations: usize,
    /// Best GA score after each generation.
    pub fitness_history: Vec<f64>,
    /// Whether the refiner replaced its input; `None` when it did not run.
    pub refined: Option<bool>,
    /// Policy version the refiner read.
    pub policy_version: Option<u64>,
}

/// Runs optimization requests.
///
/// Cheap to clone; collaborators are shared.
#[derive(Clone)]
pub struct HybridController {
    config: SolverConfig,
    forecast: Option<Arc<dyn DemandForecast>>,
    sink: Option<Arc<dyn RunSink>>,
    store: Option<Arc<ValueStore>>,
}

impl fmt::Debug for HybridController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridController")
            .field("config", &self.config)
            .field("forecast", &self.forecast.is_some())
            .field("sink", &self.sink.is_some())
            .field("store", &self.store)
            .finish()
    }
}

impl HybridController {
    /// Creates a controller after validating `config`.
    pub fn new(config: SolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            forecast: None,
            sink: None,
            store: None,
        })
    }

    /// Uses `forecast` for requests asking for forecast rider counts.
    pub fn with_forecast(mut self, forecast: Arc<dyn DemandForecast>) -> Self {
        self.forecast = Some(forecast);
        self
    }

    /// Hands a [`RunRecord`] of every completed run to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn RunSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Reads and trains this store instead of [`ValueStore::global`].
    pub fn with_value_store(mut self, store: Arc<ValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The value store runs read.
    pub fn value_store(&self) -> &ValueStore {
        self.store.as_deref().unwrap_or_else(|| ValueStore::global())
    }

    /// Runs `request` to completion on the calling thread.
    ///
    /// # Errors
    ///
    /// Only malformed input fails; infeasibility and budget exhaustion are
    /// reported inside the response.
    pub fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationOutcome, ValidationError> {
        self.execute(request, CancelToken::new(), &PhaseCell::default())
    }

    /// Like [`optimize`](Self::optimize), stopping early once `token` is
    /// cancelled.
    pub fn optimize_with_cancel(
        &self,
        request: &OptimizationRequest,
        token: CancelToken,
    ) -> Result<OptimizationOutcome, ValidationError> {
        self.execute(request, token, &PhaseCell::default())
    }

    /// Runs `request` on a worker thread.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_busroute::api::{AlgorithmMode, BusInput, OptimizationRequest, StopInput};
    /// use u_busroute::hybrid::{HybridController, SolverConfig};
    ///
    /// let request = OptimizationRequest::new(
    ///     AlgorithmMode::Hybrid,
    ///     vec![StopInput::new(1, 12.97, 77.59, 4), StopInput::new(2, 12.98, 77.60, 3)],
    ///     vec![BusInput::new(1, 20)],
    /// )
    /// .with_seed(1);
    /// let controller = HybridController::new(SolverConfig::fast()).unwrap();
    /// let handle = controller.spawn(request);
    /// let outcome = handle.wait().unwrap();
    /// assert_eq!(outcome.response.routes.len(), 1);
    /// ```
    pub fn spawn(&self, request: OptimizationRequest) -> RunHandle {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let token = CancelToken::new();
        let phase = PhaseCell::default();
        let controller = self.clone();
        let worker_token = token.clone();
        let worker_phase = phase.clone();
        thread::spawn(move || {
            let result = controller.execute(&request, worker_token, &worker_phase);
            // The handle may already be gone.
            let _ = tx.send(result);
        });
        RunHandle {
            rx,
            token,
            phase,
            done: None,
        }
    }

    #[tracing::instrument(
        level = "info",
        name = "optimize",
        skip_all,
        fields(
            algorithm = request.algorithm.name(),
            stops = request.stops.len(),
            buses = request.buses.len()
        )
    )]
    fn execute(
        &self,
        request: &OptimizationRequest,
        token: CancelToken,
        phase: &PhaseCell,
    ) -> Result<OptimizationOutcome, ValidationError> {
        let mode = request.algorithm;
        let mut timings = Vec::with_capacity(4);
        let mut lap = Instant::now();
        let mut record = |done: Phase, lap: &mut Instant| {
            timings.push(PhaseTiming::new(done, lap.elapsed()));
            *lap = Instant::now();
        };

        phase.set(Phase::Init);
        let seed = request
            .seed
            .or(self.config.seed)
            .unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let context = request.context.unwrap_or_default();
        let budget = Budget::with_time_limit(request.constraints.time_budget(), token);
        record(Phase::Init, &mut lap);

        phase.set(Phase::Seed);
        let built = builder::build(request, self.forecast.as_deref())?;
        let model = &built.model;
        let fitness = FitnessEvaluator::new(model, self.config.weights.clone());
        info!(
            seed,
            stops = model.num_stops(),
            buses = model.num_buses(),
            infeasible = model.is_infeasible(),
            "model built"
        );
        record(Phase::Seed, &mut lap);

        let mut best = built.seed.clone();
        let mut reasons: Vec<PartialReason> = Vec::new();
        let mut generations = 0;
        let mut fitness_history = Vec::new();
        let mut refined = None;
        let mut policy_version = None;

        if mode.runs_genetic() {
            phase.set(Phase::GaSearch);
            let ga_budget = if mode.runs_refiner() {
                share(&budget, self.config.ga_budget_share)
            } else {
                budget.clone()
            };
            let result = evolve(&fitness, &best, &self.config.ga, &ga_budget, &mut rng);
            if result.termination.partial_reason().is_some() {
                reasons.extend(budget.stop_reason());
            }
            generations = result.generations;
            fitness_history = result.fitness_history;
            best = result.best.into_candidate();
            record(Phase::GaSearch, &mut lap);
        }

        if mode.runs_refiner() {
            if let Some(reason) = budget.stop_reason() {
                reasons.push(reason);
            } else {
                phase.set(Phase::RlRefine);
                let refiner = Refiner::new(self.config.refiner.clone(), self.value_store());
                let out = refiner.refine(&fitness, &best, &context, &budget, &mut rng);
                info!(
                    steps = out.steps,
                    accepted = out.accepted,
                    improved = out.improved,
                    "refinement finished"
                );
                reasons.extend(out.stopped);
                refined = Some(out.improved);
                policy_version = Some(out.policy_version);
                if out.improved {
                    best = out.candidate;
                } else {
                    debug!("refinement rejected, keeping previous candidate");
                }
                record(Phase::RlRefine, &mut lap);
            }
        }

        if reasons.contains(&PartialReason::BudgetExhausted) {
            warn!(
                budget_ms = model.constraints().time_budget().as_millis() as u64,
                "time budget exhausted, returning best found"
            );
        }

        phase.set(Phase::Finalize);
        let done = finalize(&fitness, &best, built.warnings.clone(), reasons);
        let explanation = request.explain.as_ref().map(|req| {
            explain(
                &fitness,
                &built.seed,
                &best,
                req,
                &self.config.explain,
                &context,
            )
        });
        let response = OptimizationResponse {
            algorithm: mode,
            metrics: done.metrics,
            routes: done.routes,
            unassigned: done.unassigned,
            warnings: done.warnings,
            partial: done.partial,
            partial_reasons: done.partial_reasons,
            explanation,
        };
        record(Phase::Finalize, &mut lap);

        let elapsed_ms: f64 = timings.iter().map(|t| t.elapsed_ms).sum();
        info!(
            score = response.metrics.score,
            routes = response.routes.len(),
            unassigned = response.unassigned.len(),
            partial = response.partial,
            elapsed_ms,
            "optimization finished"
        );

        if let Some(sink) = &self.sink {
            sink.record(RunRecord::new(
                request.clone(),
                response.clone(),
                seed,
                timings.clone(),
            ));
        }

        Ok(OptimizationOutcome {
            response,
            seed,
            timings,
            generations,
            fitness_history,
            refined,
            policy_version,
        })
    }
}

/// A budget ending after `fraction` of the time `budget` has left, sharing
/// its cancellation token.
fn share(budget: &Budget, fraction: f64) -> Budget {
    match budget.remaining() {
        Some(left) => Budget::with_time_limit(left.mul_f64(fraction), budget.token().clone()),
        None => budget.clone(),
    }
}

/// Handle to a run executing on a worker thread.
#[derive(Debug)]
pub struct RunHandle {
    rx: Receiver<Result<OptimizationOutcome, ValidationError>>,
    token: CancelToken,
    phase: PhaseCell,
    done: Option<Result<OptimizationOutcome, ValidationError>>,
}

impl RunHandle {
    /// Current phase of the run.
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Asks the run to stop and return its best result so far.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The run's cancellation token.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Whether the result is available.
    pub fn is_finished(&mut self) -> bool {
        self.poll();
        self.done.is_some()
    }

    /// Takes the result if the run has finished.
    pub fn try_result(&mut self) -> Option<Result<OptimizationOutcome, ValidationError>> {
        self.poll();
        self.done.take()
    }

    /// Blocks until the run finishes.
    ///
    /// # Panics
    ///
    /// Panics if the worker thread panicked before sending its result.
    pub fn wait(mut self) -> Result<OptimizationOutcome, ValidationError> {
        if let Some(done) = self.done.take() {
            return done;
        }
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => panic!("optimization worker terminated without a result"),
        }
    }

    /// Blocks for at most `timeout`.
    pub fn wait_timeout(
        &mut self,
        timeout: Duration,
    ) -> Option<Result<OptimizationOutcome, ValidationError>> {
        if self.done.is_none() {
            self.done = self.rx.recv_timeout(timeout).ok();
        }
        self.done.take()
    }

    fn poll(&mut self) {
        if self.done.is_some() {
            return;
        }
        if let Ok(result) = self.rx.try_recv() {
            self.done = Some(result);
        }
    }
}
