//! The control loop
//!
//! Drives one cycle per test case: generate load, parse the report,
//! build the feature vector, predict, scale, persist, pace. Cycle-local
//! failures skip to the next case after pacing; only a storage failure
//! ends the run, because a run that cannot persist observations has no
//! value. Cycles are strictly sequential — overlapping scale commands
//! against the same workload have no defined semantics.

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::features::FeatureVectorBuilder;
use crate::loadgen::{parser, LoadGenerator};
use crate::models::{ObservationRecord, TestCase};
use crate::predictor::PredictorClient;
use crate::scaler::ScalingActuator;
use crate::store::ObservationStore;
use tracing::{error, info, warn};

/// Outcome of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub case: TestCase,
    pub replicas: u32,
    /// Whether the scale command was applied. The observation records
    /// the attempted decision either way, so later analysis can tell
    /// "decided N" apart from "successfully applied N" through this
    /// flag and the run log.
    pub scale_applied: bool,
}

/// Totals for one run over the configured schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub aborted: usize,
    pub scale_failures: usize,
}

/// Sequential predict-then-scale loop over a test-case schedule.
pub struct ControlLoop<'a> {
    config: &'a ControllerConfig,
    loadgen: LoadGenerator,
    builder: FeatureVectorBuilder,
    predictor: PredictorClient,
    scaler: ScalingActuator,
    store: ObservationStore,
}

impl<'a> ControlLoop<'a> {
    /// Build a loop and its components from one configuration value.
    pub fn new(config: &'a ControllerConfig) -> anyhow::Result<Self> {
        let loadgen = LoadGenerator::new(
            &config.loadgen_bin,
            &config.target_url,
            config.generate_timeout(),
        );
        let predictor = PredictorClient::new(
            &config.predictor_url,
            config.predict_timeout(),
            config.retry(),
        )?;
        let scaler = ScalingActuator::new(
            &config.orchestrator_bin,
            &config.workload,
            &config.namespace,
            config.scale_timeout(),
        );
        let store = ObservationStore::new(&config.log_path);

        Ok(Self {
            config,
            loadgen,
            builder: FeatureVectorBuilder::new(),
            predictor,
            scaler,
            store,
        })
    }

    /// Run every scheduled test case in order.
    pub async fn run(&self) -> Result<RunSummary> {
        let schedule = self.config.schedule();
        info!(
            cases = schedule.len(),
            workload = %self.config.workload,
            "starting control loop"
        );

        let mut summary = RunSummary::default();
        let last = schedule.len().saturating_sub(1);

        for (index, case) in schedule.iter().enumerate() {
            info!(
                case = index + 1,
                requests = case.requests,
                concurrency = case.concurrency,
                "starting cycle"
            );

            match self.run_cycle(case).await {
                Ok(outcome) => {
                    summary.completed += 1;
                    if !outcome.scale_applied {
                        summary.scale_failures += 1;
                    }
                    info!(
                        replicas = outcome.replicas,
                        applied = outcome.scale_applied,
                        "cycle complete"
                    );
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "observation store failed, aborting run");
                    return Err(e);
                }
                Err(e) => {
                    summary.aborted += 1;
                    warn!(error = %e, "cycle aborted");
                }
            }

            // Let the scaled workload stabilize before the next
            // measurement. No delay after the final case.
            if index < last {
                tokio::time::sleep(self.config.pace()).await;
            }
        }

        info!(
            completed = summary.completed,
            aborted = summary.aborted,
            scale_failures = summary.scale_failures,
            "control loop finished"
        );
        Ok(summary)
    }

    /// One GENERATE → PARSE → BUILD → PREDICT → SCALE → LOG pass.
    async fn run_cycle(&self, case: &TestCase) -> Result<CycleOutcome> {
        let report = self.loadgen.run(case).await?;
        let record = parser::parse(&report, case.concurrency);
        let vector = self.builder.build(&record, case.concurrency)?;
        let decision = self.predictor.predict(&vector).await?;

        let scale_applied = match self.scaler.scale(decision.replicas()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    error = %e,
                    replicas = decision.replicas(),
                    "scale command failed, recording attempted decision"
                );
                false
            }
        };

        let observation = ObservationRecord::new(vector, decision);
        self.store.append(&observation)?;

        Ok(CycleOutcome {
            case: *case,
            replicas: decision.replicas(),
            scale_applied,
        })
    }
}
