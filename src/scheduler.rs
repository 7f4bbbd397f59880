//! Concurrent assessment of a manifest's entities.
//!
//! Every entity runs as its own task; a semaphore bounds how many are talking
//! to backends at once. Results are slotted by position so the report keeps
//! discovery order. A failing entity degrades only itself. The run-level
//! deadline and the cancellation future both finalize the report early, with
//! unfinished entities marked degraded.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregate::{aggregate, aggregate_overall, Assessment};
use crate::gateway::{assess_with_policy, Gateways, RawResult, RetryPolicy};
use crate::models::{AggregationMode, ComponentResult, Entity, Report};
use crate::normalizer::normalize;

/// Reason given to an entity whose assessment panicked.
const TASK_FAILED: &str = "assessment task failed";

pub struct Dispatcher {
    gateways: Gateways,
    policy: RetryPolicy,
    max_parallel: usize,
    run_timeout: Duration,
    progress: Option<ProgressBar>,
}

impl Dispatcher {
    pub fn new(
        gateways: Gateways,
        policy: RetryPolicy,
        max_parallel: usize,
        run_timeout: Duration,
    ) -> Self {
        Self {
            gateways,
            policy,
            max_parallel: max_parallel.max(1),
            run_timeout,
            progress: None,
        }
    }

    /// Advance `progress` once per finished entity.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(&self, entities: Vec<Entity>, mode: AggregationMode) -> Report {
        self.run_until(entities, mode, futures::future::pending()).await
    }

    /// Assess `entities`, stopping early when `cancel` resolves.
    pub async fn run_until<F>(&self, entities: Vec<Entity>, mode: AggregationMode, cancel: F) -> Report
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            entities = entities.len(),
            max_parallel = self.max_parallel,
            %mode,
            "starting assessment run"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();
        for (idx, entity) in entities.iter().enumerate() {
            let entity = entity.clone();
            let gateways = self.gateways.clone();
            let policy = self.policy.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = AssertUnwindSafe(assess_entity(&gateways, &entity, &policy, mode))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!(entity = %entity.id, "assessment task panicked");
                        aggregate(&entity, Assessment::failed(TASK_FAILED), mode)
                    });
                (idx, result)
            });
        }

        let mut slots: Vec<Option<ComponentResult>> = vec![None; entities.len()];
        let mut interrupted: Option<&'static str> = None;

        let deadline = tokio::time::sleep(self.run_timeout);
        tokio::pin!(deadline);
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok((idx, result))) => {
                        if let Some(pb) = &self.progress {
                            pb.set_message(result.name.clone());
                            pb.inc(1);
                        }
                        slots[idx] = Some(result);
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "assessment task failed");
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::warn!(timeout = ?self.run_timeout, "run timeout reached, finalizing partial report");
                    interrupted = Some("run timeout");
                    break;
                }
                _ = &mut cancel => {
                    tracing::warn!("run cancelled, finalizing partial report");
                    interrupted = Some("cancelled");
                    break;
                }
            }
        }
        // Drops in-flight requests of unfinished entities.
        tasks.abort_all();

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        let reason = interrupted.unwrap_or(TASK_FAILED);
        let components: Vec<ComponentResult> = slots
            .into_iter()
            .zip(&entities)
            .map(|(slot, entity)| {
                slot.unwrap_or_else(|| aggregate(entity, Assessment::failed(reason), mode))
            })
            .collect();

        let overall_score = aggregate_overall(&components, mode);
        tracing::info!(score = ?overall_score.score, "assessment run finished");

        Report {
            components,
            overall_score,
            aggregation_mode: mode,
            generated_at: Utc::now(),
        }
    }
}

/// Assess one entity: its primary backend (if any and if the entity is
/// specified well enough), then the local structure checks.
pub async fn assess_entity(
    gateways: &Gateways,
    entity: &Entity,
    policy: &RetryPolicy,
    mode: AggregationMode,
) -> ComponentResult {
    let mut assessment = Assessment::default();

    match (&entity.under_specified, gateways.primary(entity.kind)) {
        (Some(why), _) => {
            tracing::info!(entity = %entity.id, reason = %why, "under-specified, skipping remote assessment");
        }
        (None, Some(primary)) => {
            let backend = primary.backend();
            assessment.tools.push(backend);
            tracing::debug!(entity = %entity.id, %backend, "dispatching");
            match assess_with_policy(primary.as_ref(), entity, policy).await {
                Ok(raw) => collect(&raw, &mut assessment),
                Err(err) => {
                    tracing::info!(entity = %entity.id, backend = %err.backend(), reason = %err.degrade_reason(), "component degraded");
                    assessment.failure = Some(err.degrade_reason());
                }
            }
        }
        (None, None) => {}
    }

    let structure = gateways.structure();
    assessment.tools.push(structure.backend());
    match assess_with_policy(structure.as_ref(), entity, policy).await {
        Ok(raw) => collect(&raw, &mut assessment),
        Err(err) => {
            if assessment.failure.is_none() {
                assessment.failure = Some(err.degrade_reason());
            }
        }
    }

    aggregate(entity, assessment, mode)
}

fn collect(raw: &RawResult, assessment: &mut Assessment) {
    match normalize(raw) {
        Ok(normalized) => {
            assessment.checks.extend(normalized.checks);
            assessment.warnings.extend(normalized.warnings);
        }
        Err(err) => {
            tracing::warn!(backend = %raw.backend, error = %err, "discarding malformed response");
            assessment.warnings.push(err.to_string());
            if assessment.failure.is_none() {
                assessment.failure = Some(format!("malformed response from {}", raw.backend));
            }
        }
    }
}
