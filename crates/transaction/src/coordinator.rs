// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Transaction Coordinator: walks a `TransactionPlan`
//! tree, dispatching leaves to an [`ActionSink`], running `Sequence`
//! children in order and `Parallel` children concurrently, and unwinding
//! a Saga-style undo log on failure.
//!
//! Deadline/cancellation is cooperative: a [`CancellationToken`] is
//! threaded through every suspension point rather than wrapping the whole
//! plan in `tokio::time::timeout`, so a deadline firing mid-plan still
//! lets already-completed steps roll back through the normal failure path
//! instead of losing that state when an outer future is dropped
//!.

use crate::action_sink::ActionSink;
use crate::error::{RollbackReport, TransactionError, TransactionReport};
use crate::idempotency::IdempotencyLedger;
use crate::locks::LockManager;
use dcc_core::{ActionSpec, CompensationOrder, CompensationPolicy, ExecutionContext, FailureStrategy, PlanNode, TransactionPlan};
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct NodeFailure {
    error: TransactionError,
    rollback: RollbackReport,
}

type NodeResult = Result<(), NodeFailure>;

/// Executes `TransactionPlan`s against a concrete [`ActionSink`]
/// implementation (normally the hub's local-device router).
pub struct Coordinator<S: ActionSink + 'static> {
    sink: Arc<S>,
    locks: LockManager,
}

impl<S: ActionSink + 'static> Coordinator<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink, locks: LockManager::new() }
    }

    /// The sink this coordinator drives plan leaves through, for callers
    /// that need their own handle to it (e.g. to spawn detached work).
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    pub async fn execute(&self, plan: &TransactionPlan, ctx: ExecutionContext) -> TransactionReport {
        let ledger = IdempotencyLedger::new();
        let cancel = CancellationToken::new();

        let deadline_task = plan.deadline.map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                cancel.cancel();
            })
        });

        tracing::debug!(plan = %plan.name, "executing transaction plan");
        let result = self.exec_node(&plan.root, &ctx, &ledger, &cancel).await;

        if let Some(task) = deadline_task {
            task.abort();
        }

        match result {
            Ok(()) => {
                tracing::debug!(plan = %plan.name, "transaction plan completed");
                TransactionReport::success()
            }
            Err(failure) => {
                tracing::warn!(plan = %plan.name, error = %failure.error, "transaction plan failed");
                TransactionReport { error: Some(failure.error), rollback: failure.rollback }
            }
        }
    }

    fn exec_node<'a>(
        &'a self,
        node: &'a PlanNode,
        ctx: &'a ExecutionContext,
        ledger: &'a IdempotencyLedger,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = NodeResult> + Send + 'a>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(NodeFailure { error: TransactionError::DeadlineExceeded, rollback: RollbackReport::default() });
            }
            match &node.spec {
                ActionSpec::Sequence { steps } => self.exec_sequence(steps, ctx, ledger, cancel).await,
                ActionSpec::Parallel { branches, failure_strategy, compensation_order } => {
                    self.exec_parallel(branches, *failure_strategy, *compensation_order, ctx, ledger, cancel).await
                }
                _ => self.exec_leaf(node, ctx, ledger, cancel).await,
            }
        })
    }

    async fn exec_sequence<'a>(
        &'a self,
        steps: &'a [PlanNode],
        ctx: &'a ExecutionContext,
        ledger: &'a IdempotencyLedger,
        cancel: &'a CancellationToken,
    ) -> NodeResult {
        let mut completed: Vec<&PlanNode> = Vec::with_capacity(steps.len());
        for step in steps {
            match self.exec_node(step, ctx, ledger, cancel).await {
                Ok(()) => completed.push(step),
                Err(failure) => {
                    let mut rollback = failure.rollback;
                    rollback.merge(self.rollback_sequence(&completed, ctx).await);
                    return Err(NodeFailure { error: failure.error, rollback });
                }
            }
        }
        Ok(())
    }

    /// Unwind a `Sequence`'s already-completed steps in reverse order —
    /// the canonical Saga LIFO unwind.
    async fn rollback_sequence(&self, completed: &[&PlanNode], ctx: &ExecutionContext) -> RollbackReport {
        let mut report = RollbackReport::default();
        for step in completed.iter().rev() {
            if report.needs_manual_intervention {
                break;
            }
            if let Some(compensation) = &step.compensation {
                report.merge(self.run_compensation(compensation, step.compensation_policy.0, ctx).await);
            }
        }
        report
    }

    async fn exec_parallel<'a>(
        &'a self,
        branches: &'a [PlanNode],
        failure_strategy: FailureStrategy,
        compensation_order: CompensationOrder,
        ctx: &'a ExecutionContext,
        ledger: &'a IdempotencyLedger,
        cancel: &'a CancellationToken,
    ) -> NodeResult {
        if branches.is_empty() {
            // An empty parallel branch list succeeds immediately.
            return Ok(());
        }

        let mut futures: FuturesUnordered<Pin<Box<dyn Future<Output = (usize, NodeResult)> + Send + 'a>>> =
            branches
                .iter()
                .enumerate()
                .map(|(idx, branch)| {
                    Box::pin(async move { (idx, self.exec_node(branch, ctx, ledger, cancel).await) })
                        as Pin<Box<dyn Future<Output = (usize, NodeResult)> + Send + 'a>>
                })
                .collect();

        let mut completed_order: Vec<usize> = Vec::with_capacity(branches.len());
        let mut first_error: Option<TransactionError> = None;

        while let Some((idx, result)) = futures.next().await {
            match result {
                Ok(()) => completed_order.push(idx),
                Err(failure) => {
                    if first_error.is_none() {
                        first_error = Some(failure.error);
                    }
                    if matches!(failure_strategy, FailureStrategy::FailFast) {
                        // Dropping `futures` cancels every still-outstanding branch
                        // cooperatively.
                        break;
                    }
                }
            }
        }
        drop(futures);

        match failure_strategy {
            FailureStrategy::BestEffort => {
                if completed_order.is_empty() {
                    Err(NodeFailure {
                        error: first_error.unwrap_or(TransactionError::Cancelled),
                        rollback: RollbackReport::default(),
                    })
                } else {
                    Ok(())
                }
            }
            FailureStrategy::CollectAll | FailureStrategy::FailFast => match first_error {
                None => Ok(()),
                Some(error) => {
                    let rollback = self.rollback_parallel(branches, &completed_order, compensation_order, ctx).await;
                    Err(NodeFailure { error, rollback })
                }
            },
        }
    }

    /// Unwind a `Parallel` node's own completed branches per its
    /// `compensation_order`.
    async fn rollback_parallel(
        &self,
        branches: &[PlanNode],
        completed_order: &[usize],
        order: CompensationOrder,
        ctx: &ExecutionContext,
    ) -> RollbackReport {
        match order {
            CompensationOrder::SequentialReverse => {
                let mut report = RollbackReport::default();
                for &idx in completed_order.iter().rev() {
                    if report.needs_manual_intervention {
                        break;
                    }
                    if let Some(compensation) = &branches[idx].compensation {
                        report.merge(self.run_compensation(compensation, branches[idx].compensation_policy.0, ctx).await);
                    }
                }
                report
            }
            CompensationOrder::Parallel => {
                let pending: Vec<_> = completed_order
                    .iter()
                    .filter_map(|&idx| {
                        branches[idx]
                            .compensation
                            .as_ref()
                            .map(|compensation| self.run_compensation(compensation, branches[idx].compensation_policy.0, ctx))
                    })
                    .collect();
                let mut report = RollbackReport::default();
                for r in futures_util::future::join_all(pending).await {
                    report.merge(r);
                }
                report
            }
        }
    }

    async fn exec_leaf<'a>(
        &'a self,
        node: &'a PlanNode,
        ctx: &'a ExecutionContext,
        ledger: &'a IdempotencyLedger,
        cancel: &'a CancellationToken,
    ) -> NodeResult {
        if let Some(key) = &node.idempotency_key {
            if ledger.already_completed(key) {
                tracing::debug!(%key, "idempotent leaf skip");
                return Ok(());
            }
        }

        let lock_specs = node.spec.direct_locks();
        let _guard = self.locks.acquire(&lock_specs).await;

        let max_attempts = node.retry.map(|r| r.max_attempts).unwrap_or(0);
        let backoff = node.retry.map(|r| r.backoff).unwrap_or_default();
        let mut attempt = 0u32;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransactionError::DeadlineExceeded),
                r = self.call_leaf_with_timeout(node, ctx) => r,
            };

            match outcome {
                Ok(()) => {
                    if let Some(key) = &node.idempotency_key {
                        ledger.mark_completed(key);
                    }
                    return Ok(());
                }
                Err(error) => {
                    if attempt < max_attempts && !matches!(error, TransactionError::DeadlineExceeded) {
                        attempt += 1;
                        tracing::warn!(attempt, max_attempts, error = %error, "leaf failed, retrying after backoff");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(NodeFailure { error, rollback: RollbackReport::default() });
                }
            }
        }
    }

    async fn call_leaf_with_timeout(&self, node: &PlanNode, ctx: &ExecutionContext) -> Result<(), TransactionError> {
        let call = self.call_sink(&node.spec, ctx);
        match node.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(r) => r,
                Err(_) => Err(TransactionError::TimedOut),
            },
            None => call.await,
        }
    }

    async fn call_sink(&self, spec: &ActionSpec, ctx: &ExecutionContext) -> Result<(), TransactionError> {
        match spec {
            ActionSpec::Attach { device, blueprint_id, blueprint_version, config } => {
                self.sink.attach(device, blueprint_id, blueprint_version.as_deref(), config, ctx).await
            }
            ActionSpec::Detach { device } => self.sink.detach(device, ctx).await,
            ActionSpec::Start { device } => self.sink.start(device, ctx).await,
            ActionSpec::Stop { device } => self.sink.stop(device, ctx).await,
            ActionSpec::WriteProperty { device, property, value } => {
                self.sink.write_property(device, property, value, ctx).await
            }
            ActionSpec::InvokeAction { device, action, input } => {
                self.sink.invoke_action(device, action, input, ctx).await.map(|_| ())
            }
            ActionSpec::Sequence { .. } | ActionSpec::Parallel { .. } => {
                unreachable!("composite nodes never reach call_sink")
            }
        }
    }

    /// Run a node's compensation plan (itself a full `TransactionPlan`,
    /// executed with a fresh idempotency scope) and interpret its own
    /// failure per `CompensationPolicy`.
    async fn run_compensation(&self, plan: &TransactionPlan, policy: CompensationPolicy, ctx: &ExecutionContext) -> RollbackReport {
        let ledger = IdempotencyLedger::new();
        let cancel = CancellationToken::new();
        let result = self.exec_node(&plan.root, ctx, &ledger, &cancel).await;
        let Err(failure) = result else {
            return RollbackReport::default();
        };

        match policy {
            CompensationPolicy::Abort => {
                tracing::error!(plan = %plan.name, error = %failure.error, "compensation aborted; manual intervention required");
                RollbackReport { degraded: true, needs_manual_intervention: true }
            }
            CompensationPolicy::ContinueAndFlag => {
                tracing::warn!(plan = %plan.name, error = %failure.error, "compensation failed, continuing rollback");
                RollbackReport { degraded: true, needs_manual_intervention: false }
            }
            CompensationPolicy::Retry => {
                let retry_ledger = IdempotencyLedger::new();
                let retry_cancel = CancellationToken::new();
                match self.exec_node(&plan.root, ctx, &retry_ledger, &retry_cancel).await {
                    Ok(()) => RollbackReport::default(),
                    Err(_) => {
                        tracing::error!(plan = %plan.name, "compensation retry exhausted; manual intervention required");
                        RollbackReport { degraded: true, needs_manual_intervention: true }
                    }
                }
            }
        }
    }

    /// Directly invoke a blueprint action outside of any plan — used by
    /// the hub's `execute()` surface for single-action dispatch
    ///.
    pub async fn invoke_action_direct(
        &self,
        device: &str,
        action: &str,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<Value, TransactionError> {
        self.sink.invoke_action(device, action, &input, ctx).await
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
