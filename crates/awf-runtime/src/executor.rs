// SPDX-License-Identifier: MIT OR Apache-2.0
//! The execution loop (`spec.md` §4.4): parse, validate, then walk
//! `order` once, dispatching each operation through path resolution,
//! credential resolution, caching, rate limiting, and retry.

use crate::cancel::CancellationToken;
use crate::limits::ResourceTracker;
use crate::response::{execution_status_str, ExecutionResponse, RunOutcome};
use awf_audit::{sanitize_args_digest, AuditEvent, AuditSink};
use awf_cache::ResultCache;
use awf_catalog::kinds::{api_call, conditional, filter_data, loop_op, merge_data, store_data, transform_data, wait};
use awf_catalog::{preserved_argument_keys, Storage};
use awf_config::RuntimeConfig;
use awf_core::{
    as_credential_ref, CatalogProvider, ExecutionRecord, ExecutionStatus, Issue, IssueCategory, OperationRecord, OperationStatus,
    ValidationReport, Workflow,
};
use awf_credential::{format_credential, CredentialResolver};
use awf_datamodel::{collect_reference_paths, parse_path, resolve_references, DataModel};
use awf_error::{ErrorCode, WorkflowError};
use awf_ratelimit::RateLimiter;
use awf_retry::RetryPolicy;
use chrono::Utc;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Orchestrates one workflow submission end to end.
///
/// Owns no per-execution state itself — every field is a shared
/// dependency injected at construction, and `run` builds its own
/// [`DataModel`], [`ResourceTracker`], and [`ExecutionRecord`] fresh for
/// each call, so one `Executor` can serve many concurrent executions.
pub struct Executor {
    catalog_provider: Arc<dyn CatalogProvider>,
    credential_resolver: Arc<dyn CredentialResolver>,
    audit_sink: Arc<dyn AuditSink>,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<ResultCache>,
    storage: Arc<dyn Storage>,
    http_client: reqwest::Client,
    config: RuntimeConfig,
    config_version: String,
}

/// The agent/execution pair threaded through the per-operation pipeline,
/// bundled so helper methods don't need a five-argument parameter list.
struct OpContext<'a> {
    agent_id: &'a str,
    execution_id: &'a str,
}

impl Executor {
    /// Build an executor from its injected dependencies. `config_version`
    /// identifies the `RuntimeConfig` snapshot `config` was loaded from,
    /// for correlation on the [`ExecutionRecord`].
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog_provider: Arc<dyn CatalogProvider>,
        credential_resolver: Arc<dyn CredentialResolver>,
        audit_sink: Arc<dyn AuditSink>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<ResultCache>,
        storage: Arc<dyn Storage>,
        http_client: reqwest::Client,
        config: RuntimeConfig,
        config_version: impl Into<String>,
    ) -> Self {
        Self {
            catalog_provider,
            credential_resolver,
            audit_sink,
            rate_limiter,
            cache,
            storage,
            http_client,
            config,
            config_version: config_version.into(),
        }
    }

    /// Parse, validate, and (if accepted) run `workflow_bytes` on behalf
    /// of `agent_id`, honoring `cancel` throughout.
    pub async fn run(&self, agent_id: &str, workflow_bytes: &[u8], cancel: CancellationToken) -> RunOutcome {
        let workflow = match awf_protocol::parse_workflow(workflow_bytes) {
            Ok(w) => w,
            Err(e) => return RunOutcome::Rejected(ValidationReport::from_issues(vec![parse_error_issue(e)])),
        };

        let Some(catalog) = self.catalog_provider.get_allowed_catalog(agent_id) else {
            return RunOutcome::Rejected(ValidationReport::from_issues(vec![Issue::error(
                IssueCategory::Permission,
                format!("agent {agent_id:?} has no allowed catalog"),
            )]));
        };

        let report = awf_validate::validate(&workflow, &catalog);
        if !report.valid {
            return RunOutcome::Rejected(report);
        }

        let ctx = OpContext { agent_id, execution_id: &workflow.execution_id };
        let started_at = Utc::now();
        let mut record = ExecutionRecord {
            execution_id: workflow.execution_id.clone(),
            agent_id: agent_id.to_string(),
            workflow_hash: compute_workflow_hash(&workflow),
            operations: workflow
                .order
                .iter()
                .filter_map(|id| workflow.operation(id))
                .map(|op| OperationRecord::pending(op.operation_id.clone(), op.kind.clone(), op.args.clone()))
                .collect(),
            status: ExecutionStatus::Running,
            started_at,
            finished_at: None,
            total_duration_ms: None,
            config_version: self.config_version.clone(),
        };

        self.record_audit(AuditEvent::ExecutionStarted {
            timestamp: started_at,
            execution_id: ctx.execution_id.to_string(),
            agent_id: agent_id.to_string(),
        });

        let mut data_model = DataModel::new();
        let mut tracker = ResourceTracker::new(self.config.limits.clone());
        let mut skipped_ids: HashSet<String> = HashSet::new();
        let mut skipped_output_paths: Vec<String> = Vec::new();
        let mut aborted = false;

        for id in &workflow.order {
            let Some(op) = workflow.operation(id) else { continue };

            if cancel.is_cancelled() {
                aborted = true;
                break;
            }

            if skipped_ids.contains(id) {
                self.finish_as_skipped(&mut record, id, &mut skipped_output_paths, &op.kind, &op.args);
                continue;
            }

            let mut refs = Vec::new();
            collect_reference_paths(&op.args, &mut refs);
            if refs.iter().any(|p| skipped_output_paths.iter().any(|sp| path_under(p, sp))) {
                skipped_ids.insert(id.clone());
                self.finish_as_skipped(&mut record, id, &mut skipped_output_paths, &op.kind, &op.args);
                continue;
            }

            if let Err(e) = tracker.record_operation().and_then(|()| tracker.check_duration()) {
                let rec_op = record.operation_mut(id).expect("record seeded from order");
                rec_op.status = OperationStatus::Failed;
                rec_op.error = Some(e.to_record());
                aborted = true;
                break;
            }

            let outcome: Result<Option<Value>, WorkflowError> = match op.kind.as_str() {
                "Conditional" => self.run_conditional(&ctx, id, &op.args, &data_model, &mut skipped_ids, &mut record).await,
                "Loop" => {
                    self.run_loop(&ctx, id, &op.args, &workflow, &mut data_model, &mut tracker, &cancel, &mut record).await
                }
                kind => self.run_leaf(&ctx, id, kind, &op.args, &mut data_model, &cancel, &mut record).await,
            };

            match outcome {
                Ok(_) => {}
                Err(_) => {
                    aborted = true;
                    break;
                }
            }

            if let Err(e) = tracker.check_data_model_size(data_model.encoded_size()) {
                let rec_op = record.operation_mut(id).expect("record seeded from order");
                rec_op.status = OperationStatus::Failed;
                rec_op.error = Some(e.to_record());
                aborted = true;
                break;
            }
        }

        record.status = record.derive_final_status();
        if aborted && record.status == ExecutionStatus::Success {
            record.status = ExecutionStatus::Failed;
        }

        let finished_at = Utc::now();
        record.finished_at = Some(finished_at);
        record.total_duration_ms = Some((finished_at - started_at).num_milliseconds());

        self.record_audit(AuditEvent::ExecutionFinished {
            timestamp: finished_at,
            execution_id: ctx.execution_id.to_string(),
            status: execution_status_str(record.status).to_string(),
            duration_ms: record.total_duration_ms.unwrap_or(0).max(0) as u64,
        });

        RunOutcome::Completed(ExecutionResponse::from_record(&record, data_model.as_value()))
    }

    fn finish_as_skipped(
        &self,
        record: &mut ExecutionRecord,
        id: &str,
        skipped_output_paths: &mut Vec<String>,
        kind: &str,
        raw_args: &Value,
    ) {
        let now = Utc::now();
        if let Some(rec_op) = record.operation_mut(id) {
            rec_op.started_at = Some(now);
            rec_op.finished_at = Some(now);
            rec_op.status = OperationStatus::Skipped;
        }
        self.record_audit(AuditEvent::OperationFinished {
            timestamp: now,
            execution_id: record.execution_id.clone(),
            operation_id: id.to_string(),
            status: "skipped".to_string(),
            duration_ms: 0,
        });
        if let Some(output) = declared_output_path(kind, raw_args) {
            skipped_output_paths.push(output);
        }
    }

    async fn run_conditional(
        &self,
        ctx: &OpContext<'_>,
        id: &str,
        raw_args: &Value,
        data_model: &DataModel,
        skipped_ids: &mut HashSet<String>,
        record: &mut ExecutionRecord,
    ) -> Result<Option<Value>, WorkflowError> {
        let started = Utc::now();
        record.operation_mut(id).expect("record seeded from order").started_at = Some(started);
        self.record_audit(AuditEvent::OperationStarted {
            timestamp: started,
            execution_id: ctx.execution_id.to_string(),
            operation_id: id.to_string(),
            kind: "Conditional".to_string(),
            args_digest: sanitize_args_digest(raw_args),
        });

        let result = (|| -> Result<(), WorkflowError> {
            let parsed: conditional::ConditionalArgs = serde_json::from_value(raw_args.clone())
                .map_err(|e| WorkflowError::new(ErrorCode::Internal, format!("Conditional args no longer match schema: {e}")))?;
            let taken = conditional::evaluate(&parsed.condition, data_model)?;
            let not_taken = if taken { parsed.if_false.unwrap_or_default() } else { parsed.if_true };
            for skipped in not_taken {
                skipped_ids.insert(skipped);
            }
            Ok(())
        })();

        let finished = Utc::now();
        let rec_op = record.operation_mut(id).expect("record seeded from order");
        rec_op.finished_at = Some(finished);
        rec_op.status = if result.is_ok() { OperationStatus::Success } else { OperationStatus::Failed };
        if let Err(ref e) = result {
            rec_op.error = Some(e.to_record());
        }
        self.record_audit(AuditEvent::OperationFinished {
            timestamp: finished,
            execution_id: ctx.execution_id.to_string(),
            operation_id: id.to_string(),
            status: if result.is_ok() { "success" } else { "failed" }.to_string(),
            duration_ms: (finished - started).num_milliseconds().max(0) as u64,
        });
        result.map(|()| None)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_loop(
        &self,
        ctx: &OpContext<'_>,
        id: &str,
        raw_args: &Value,
        workflow: &Workflow,
        data_model: &mut DataModel,
        tracker: &mut ResourceTracker,
        cancel: &CancellationToken,
        record: &mut ExecutionRecord,
    ) -> Result<Option<Value>, WorkflowError> {
        let started = Utc::now();
        record.operation_mut(id).expect("record seeded from order").started_at = Some(started);
        self.record_audit(AuditEvent::OperationStarted {
            timestamp: started,
            execution_id: ctx.execution_id.to_string(),
            operation_id: id.to_string(),
            kind: "Loop".to_string(),
            args_digest: sanitize_args_digest(raw_args),
        });

        let result = self.run_loop_body(ctx, id, raw_args, workflow, data_model, tracker, cancel).await;

        let finished = Utc::now();
        let rec_op = record.operation_mut(id).expect("record seeded from order");
        rec_op.finished_at = Some(finished);
        match &result {
            Ok(value) => {
                rec_op.status = OperationStatus::Success;
                rec_op.result = value.clone();
            }
            Err(e) => {
                rec_op.status = OperationStatus::Failed;
                rec_op.error = Some(e.to_record());
            }
        }
        self.record_audit(AuditEvent::OperationFinished {
            timestamp: finished,
            execution_id: ctx.execution_id.to_string(),
            operation_id: id.to_string(),
            status: if result.is_ok() { "success" } else { "failed" }.to_string(),
            duration_ms: (finished - started).num_milliseconds().max(0) as u64,
        });
        result
    }

    async fn run_loop_body(
        &self,
        ctx: &OpContext<'_>,
        loop_id: &str,
        raw_args: &Value,
        workflow: &Workflow,
        data_model: &mut DataModel,
        tracker: &mut ResourceTracker,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, WorkflowError> {
        let concrete = resolve_args(raw_args, data_model, "Loop")?;
        let loop_args: loop_op::LoopArgs = serde_json::from_value(concrete)
            .map_err(|e| WorkflowError::new(ErrorCode::DataTypeMismatch, format!("Loop args invalid after resolution: {e}")))?;
        let elements = loop_args.elements()?.to_vec();
        let current_path = parse_path(loop_op::CURRENT_BINDING_PATH)?;
        let index_path = parse_path(loop_op::INDEX_BINDING_PATH)?;

        let mut collected = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(WorkflowError::new(ErrorCode::Cancellation, "execution cancelled"));
            }
            tracker.check_duration()?;
            data_model.write(&current_path, element)?;
            data_model.write(&index_path, Value::from(index))?;

            let mut last_result = Value::Null;
            for nested_id in &loop_args.operations {
                let Some(nested_op) = workflow.operation(nested_id) else {
                    return Err(WorkflowError::new(ErrorCode::Internal, format!("Loop references undefined operation {nested_id:?}"))
                        .with_operation_id(loop_id.to_string()));
                };
                tracker.record_operation()?;
                let started = Utc::now();
                self.record_audit(AuditEvent::OperationStarted {
                    timestamp: started,
                    execution_id: ctx.execution_id.to_string(),
                    operation_id: nested_id.clone(),
                    kind: nested_op.kind.clone(),
                    args_digest: sanitize_args_digest(&nested_op.args),
                });
                let outcome = self.run_leaf_operation(ctx, nested_id, &nested_op.kind, &nested_op.args, data_model, cancel).await;
                let finished = Utc::now();
                self.record_audit(AuditEvent::OperationFinished {
                    timestamp: finished,
                    execution_id: ctx.execution_id.to_string(),
                    operation_id: nested_id.clone(),
                    status: if outcome.is_ok() { "success" } else { "failed" }.to_string(),
                    duration_ms: (finished - started).num_milliseconds().max(0) as u64,
                });
                last_result = outcome?;
                tracker.check_data_model_size(data_model.encoded_size())?;
            }
            collected.push(last_result);
        }

        match &loop_args.output_path {
            Some(output_path) => {
                let path = parse_path(output_path)?;
                data_model.write(&path, Value::Array(collected.clone()))?;
                Ok(Some(Value::Array(collected)))
            }
            None => Ok(None),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_leaf(
        &self,
        ctx: &OpContext<'_>,
        id: &str,
        kind: &str,
        raw_args: &Value,
        data_model: &mut DataModel,
        cancel: &CancellationToken,
        record: &mut ExecutionRecord,
    ) -> Result<Option<Value>, WorkflowError> {
        let started = Utc::now();
        record.operation_mut(id).expect("record seeded from order").started_at = Some(started);
        self.record_audit(AuditEvent::OperationStarted {
            timestamp: started,
            execution_id: ctx.execution_id.to_string(),
            operation_id: id.to_string(),
            kind: kind.to_string(),
            args_digest: sanitize_args_digest(raw_args),
        });

        let result = self.run_leaf_operation(ctx, id, kind, raw_args, data_model, cancel).await;

        let finished = Utc::now();
        let rec_op = record.operation_mut(id).expect("record seeded from order");
        rec_op.finished_at = Some(finished);
        match &result {
            Ok(value) => {
                rec_op.status = OperationStatus::Success;
                rec_op.result = Some(value.clone());
            }
            Err(e) => {
                rec_op.status = OperationStatus::Failed;
                rec_op.error = Some(e.to_record());
            }
        }
        self.record_audit(AuditEvent::OperationFinished {
            timestamp: finished,
            execution_id: ctx.execution_id.to_string(),
            operation_id: id.to_string(),
            status: if result.is_ok() { "success" } else { "failed" }.to_string(),
            duration_ms: (finished - started).num_milliseconds().max(0) as u64,
        });
        result.map(Some)
    }

    /// Steps 2-7 of `spec.md` §4.4 for a single non-control-flow operation:
    /// resolve paths, resolve credentials (and audit their use), check the
    /// cache, rate-limit, dispatch (retrying if the kind is retryable),
    /// write the result, and cache it.
    async fn run_leaf_operation(
        &self,
        ctx: &OpContext<'_>,
        operation_id: &str,
        kind: &str,
        raw_args: &Value,
        data_model: &mut DataModel,
        cancel: &CancellationToken,
    ) -> Result<Value, WorkflowError> {
        let concrete_args = resolve_args(raw_args, data_model, kind)?;

        let cache_enabled = self.config.cache.enabled && is_cacheable_for(kind, raw_args);
        let canonical_args = canonicalize_for_cache(&concrete_args);
        let cache_key = awf_cache::compute_key(kind, &canonical_args);

        // Credentials resolve (and are audited) whether or not the result
        // ends up served from cache: `spec.md` §4.4 orders credential
        // resolution before the cache check.
        let resolved_args = self.resolve_credentials(&concrete_args, ctx.execution_id, operation_id)?;

        if cache_enabled {
            if let Some(cached) = self.cache.get(&cache_key) {
                self.write_output(kind, raw_args, data_model, &cached)?;
                return Ok(cached);
            }
        }

        self.rate_limiter.acquire(ctx.agent_id, kind).await?;

        let retryable = awf_catalog::lookup(kind).map(|e| e.retryable).unwrap_or(false);
        let policy = retry_policy_from_config(&self.config.retry);

        let invoke = async {
            if retryable {
                awf_retry::retry(&policy, |_attempt| self.dispatch(kind, &resolved_args)).await.map(|(v, _)| v)
            } else {
                self.dispatch(kind, &resolved_args).await
            }
        };

        let value = tokio::select! {
            r = invoke => r?,
            () = cancel.cancelled() => return Err(WorkflowError::new(ErrorCode::Cancellation, "execution cancelled")),
        };

        self.write_output(kind, raw_args, data_model, &value)?;
        if cache_enabled {
            let ttl = self.ttl_for(kind);
            if !ttl.is_zero() {
                self.cache.set(cache_key, value.clone(), kind.to_string(), ttl);
            }
        }
        Ok(value)
    }

    async fn dispatch(&self, kind: &str, args: &Value) -> Result<Value, WorkflowError> {
        match kind {
            "ApiCall" => {
                let parsed: api_call::ApiCallArgs = serde_json::from_value(args.clone()).map_err(|e| schema_err(kind, e))?;
                api_call::execute(&parsed, &self.http_client).await
            }
            "FilterData" => {
                let parsed: filter_data::FilterDataArgs = serde_json::from_value(args.clone()).map_err(|e| schema_err(kind, e))?;
                filter_data::execute(&parsed)
            }
            "TransformData" => {
                let parsed: transform_data::TransformDataArgs =
                    serde_json::from_value(args.clone()).map_err(|e| schema_err(kind, e))?;
                transform_data::execute(&parsed)
            }
            "MergeData" => {
                let parsed: merge_data::MergeDataArgs = serde_json::from_value(args.clone()).map_err(|e| schema_err(kind, e))?;
                merge_data::execute(&parsed)
            }
            "StoreData" => {
                let parsed: store_data::StoreDataArgs = serde_json::from_value(args.clone()).map_err(|e| schema_err(kind, e))?;
                store_data::execute(&parsed, self.storage.as_ref())
            }
            "Wait" => {
                let parsed: wait::WaitArgs = serde_json::from_value(args.clone()).map_err(|e| schema_err(kind, e))?;
                wait::execute(&parsed).await
            }
            other => Err(WorkflowError::new(ErrorCode::Internal, format!("{other:?} has no leaf dispatch"))),
        }
    }

    fn write_output(&self, kind: &str, raw_args: &Value, data_model: &mut DataModel, value: &Value) -> Result<(), WorkflowError> {
        match declared_output_path(kind, raw_args) {
            Some(output_path) => {
                let path = parse_path(&output_path)?;
                data_model.write(&path, value.clone())
            }
            None => Ok(()),
        }
    }

    fn resolve_credentials(&self, value: &Value, execution_id: &str, operation_id: &str) -> Result<Value, WorkflowError> {
        if let Some(credential_ref) = as_credential_ref(value) {
            let resolved = self.credential_resolver.resolve(&credential_ref.id)?;
            self.record_audit(AuditEvent::CredentialUsed {
                timestamp: Utc::now(),
                execution_id: execution_id.to_string(),
                operation_id: operation_id.to_string(),
                credential_id: credential_ref.id,
            });
            return Ok(Value::String(format_credential(&resolved.value, &resolved.credential_type)));
        }
        match value {
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_credentials(v, execution_id, operation_id)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for v in items {
                    out.push(self.resolve_credentials(v, execution_id, operation_id)?);
                }
                Ok(Value::Array(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn ttl_for(&self, kind: &str) -> Duration {
        let secs = self.config.cache.per_kind_ttl_sec.get(kind).copied().unwrap_or(self.config.cache.default_ttl_sec);
        Duration::from_secs(secs)
    }

    /// Log-and-swallow: an audit sink outage should not itself crash an
    /// otherwise-healthy execution, but must not pass unnoticed either.
    fn record_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit_sink.append(&event) {
            tracing::error!(error = %e, "audit sink append failed");
        }
    }
}

/// Apply the Executor's generic path-resolution pass to `raw_args`,
/// leaving `kind`'s preserved top-level keys untouched (`awf_catalog::
/// preserved_argument_keys`).
fn resolve_args(raw_args: &Value, data_model: &DataModel, kind: &str) -> Result<Value, WorkflowError> {
    let preserved = preserved_argument_keys(kind);
    match raw_args {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let resolved = if preserved.contains(&k.as_str()) { v.clone() } else { resolve_references(v, data_model)? };
                out.insert(k.clone(), resolved);
            }
            Ok(Value::Object(out))
        }
        other => resolve_references(other, data_model),
    }
}

/// Replace credential markers with a stable placeholder rather than the
/// resolved secret, so the cache key never encodes plaintext
/// (`spec.md` §8: no credential plaintext in any cache entry).
fn canonicalize_for_cache(value: &Value) -> Value {
    if as_credential_ref(value).is_some() {
        return Value::String("<credential>".to_string());
    }
    match value {
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), canonicalize_for_cache(v))).collect()),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_for_cache).collect()),
        other => other.clone(),
    }
}

fn is_cacheable_for(kind: &str, raw_args: &Value) -> bool {
    match awf_catalog::lookup(kind) {
        Some(entry) if entry.cacheable => {
            if kind == "ApiCall" {
                api_call::is_cacheable(raw_args)
            } else {
                true
            }
        }
        _ => false,
    }
}

fn declared_output_path(kind: &str, raw_args: &Value) -> Option<String> {
    if kind == "Conditional" {
        return None;
    }
    raw_args.get("outputPath").and_then(Value::as_str).map(str::to_string)
}

/// Mirrors `awf-validate`'s private `path_under`: `path` falls under
/// `producer` if it equals it or addresses into it (`producer[...` or
/// `producer.field`).
fn path_under(path: &str, producer: &str) -> bool {
    path == producer || path.starts_with(&format!("{producer}[")) || path.starts_with(&format!("{producer}."))
}

fn schema_err(kind: &str, e: serde_json::Error) -> WorkflowError {
    WorkflowError::new(ErrorCode::DataTypeMismatch, format!("{kind} arguments did not match schema after resolution: {e}"))
}

fn retry_policy_from_config(config: &awf_config::RetryConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: config.max_retries,
        initial_delay: Duration::from_millis(config.initial_delay_ms),
        max_delay: Duration::from_millis(config.max_delay_ms),
        backoff_base: config.backoff_base,
        jitter: config.jitter,
    }
}

fn parse_error_issue(e: WorkflowError) -> Issue {
    let mut issue = Issue::error(IssueCategory::Structure, e.message.clone());
    if let Some(operation_id) = e.operation_id.clone() {
        issue = issue.with_operation_id(operation_id);
    }
    issue
}

fn compute_workflow_hash(workflow: &Workflow) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workflow.execution_id.as_bytes());
    for id in &workflow.order {
        hasher.update(id.as_bytes());
        if let Some(op) = workflow.operation(id) {
            hasher.update(op.kind.as_bytes());
            if let Ok(encoded) = serde_json::to_vec(&op.args) {
                hasher.update(&encoded);
            }
        }
    }
    format!("{:x}", hasher.finalize())
}
