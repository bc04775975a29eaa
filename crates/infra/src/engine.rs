//! Stock transformation engine (application-level orchestration).
//!
//! ```text
//! request
//!   ↓
//! 1. Load source + target from the store
//!   ↓
//! 2. Validate against the conversion registry (pure)
//!   ↓
//! 3. Write source stock, then target stock (both version-checked)
//!   │    ├─ concurrent change → reload, re-validate, retry (bounded)
//!   │    └─ target write fails → restore source stock
//!   ↓
//! 4. Hand the record to the audit sink (best-effort)
//!   ↓
//! 5. Notify the caller's observer, if any
//! ```
//!
//! Collaborators are injected; the engine holds no global state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use koperasi_core::{Entity, ExpectedVersion, ItemCode, TransformationId};
use koperasi_inventory::{
    ConversionRegistry, InventoryItem, RatioError, TransformationAttempt, TransformationError,
    TransformationInput, TransformationPreview, TransformationRecord, TransformationStage,
    ValidatedTransformation, validate,
};

use crate::audit::AuditSink;
use crate::config::{DEFAULT_MAX_CONFLICT_RETRIES, EngineConfig};
use crate::notify::TransformationObserver;
use crate::store::{InventoryStore, StoreError};

/// A transformation as submitted by a form or an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRequest {
    pub source_code: String,
    pub target_code: String,
    pub quantity: f64,
    pub user: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TransformationRequest {
    pub fn new(
        source_code: impl Into<String>,
        target_code: impl Into<String>,
        quantity: f64,
        user: impl Into<String>,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            target_code: target_code.into(),
            quantity,
            user: user.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Outcome of writing both stock levels.
#[derive(Debug)]
enum CommitError {
    /// Another writer got there first; nothing is left modified.
    Conflict(String),
    Failed(TransformationError),
}

pub struct TransformationEngine<S, A> {
    store: S,
    registry: ConversionRegistry,
    audit: A,
    max_conflict_retries: u32,
}

impl<S, A> TransformationEngine<S, A>
where
    S: InventoryStore,
    A: AuditSink,
{
    pub fn new(store: S, registry: ConversionRegistry, audit: A) -> Self {
        Self {
            store,
            registry,
            audit,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn from_config(store: S, audit: A, config: &EngineConfig) -> Result<Self, RatioError> {
        let registry = config.build_registry()?;
        Ok(Self::new(store, registry, audit).with_max_conflict_retries(config.max_conflict_retries))
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Project the effect of a transformation without mutating anything.
    #[tracing::instrument(skip(self))]
    pub fn preview(
        &self,
        source_code: &str,
        target_code: &str,
        quantity: f64,
    ) -> Result<TransformationPreview, TransformationError> {
        self.validate_current(source_code, target_code, quantity)
            .map(|validated| validated.preview())
    }

    /// Validate and commit a transformation.
    pub fn execute(
        &self,
        source_code: &str,
        target_code: &str,
        quantity: f64,
        user: &str,
    ) -> Result<TransformationRecord, TransformationError> {
        let request = TransformationRequest::new(source_code, target_code, quantity, user);
        self.execute_request(&request, None)
    }

    /// Like [`execute`](Self::execute), notifying `observer` once committed.
    pub fn execute_with(
        &self,
        source_code: &str,
        target_code: &str,
        quantity: f64,
        user: &str,
        observer: &dyn TransformationObserver,
    ) -> Result<TransformationRecord, TransformationError> {
        let request = TransformationRequest::new(source_code, target_code, quantity, user);
        self.execute_request(&request, Some(observer))
    }

    #[tracing::instrument(
        skip(self, request, observer),
        fields(
            source = %request.source_code,
            target = %request.target_code,
            quantity = request.quantity,
            user = %request.user,
        )
    )]
    pub fn execute_request(
        &self,
        request: &TransformationRequest,
        observer: Option<&dyn TransformationObserver>,
    ) -> Result<TransformationRecord, TransformationError> {
        let mut attempt = TransformationAttempt::new();
        let mut conflicts = 0;

        // Validation always runs on freshly loaded items, so a stale preview
        // can never be committed.
        let validated = loop {
            let validated = match self.validate_current(
                &request.source_code,
                &request.target_code,
                request.quantity,
            ) {
                Ok(validated) => validated,
                Err(err) => {
                    let stage = match err.kind() {
                        kind if err.is_validation() => TransformationStage::Rejected(kind),
                        _ => TransformationStage::Failed,
                    };
                    advance(&mut attempt, stage);
                    tracing::warn!(error = %err, kind = %err.kind(), "stock transformation rejected");
                    return Err(err);
                }
            };
            advance(&mut attempt, TransformationStage::Validated);

            match self.commit(&validated) {
                Ok(()) => break validated,
                Err(CommitError::Conflict(msg)) if conflicts < self.max_conflict_retries => {
                    conflicts += 1;
                    tracing::warn!(conflicts, reason = %msg, "concurrent stock change, re-validating");
                }
                Err(CommitError::Conflict(msg)) => {
                    advance(&mut attempt, TransformationStage::Failed);
                    return Err(TransformationError::persistence(format!(
                        "gave up after {conflicts} concurrent modifications: {msg}"
                    )));
                }
                Err(CommitError::Failed(err)) => {
                    advance(&mut attempt, TransformationStage::Failed);
                    return Err(err);
                }
            }
        };
        advance(&mut attempt, TransformationStage::Committed);

        let record = validated.to_record(
            TransformationId::new(),
            Utc::now(),
            request.user.clone(),
            request.notes.clone(),
        );
        tracing::info!(
            transformation_id = %record.id,
            removed = record.source_item.quantity_removed,
            added = record.target_item.quantity_added,
            ratio = record.conversion_ratio,
            "stock transformation committed"
        );

        match self.audit.record(&record) {
            Ok(()) => advance(&mut attempt, TransformationStage::Recorded),
            Err(err) => tracing::warn!(
                transformation_id = %record.id,
                error = %err,
                "failed to record stock transformation; stock change stands"
            ),
        }

        if let Some(observer) = observer {
            observer.on_transformed(&record);
        }

        Ok(record)
    }

    fn load(&self, code: &str) -> Result<Option<InventoryItem>, TransformationError> {
        // A code that cannot be parsed cannot exist in the store either.
        let Ok(code) = ItemCode::new(code) else {
            return Ok(None);
        };
        self.store
            .get(&code)
            .map_err(|err| TransformationError::persistence(format!("loading {code}: {err}")))
    }

    fn validate_current(
        &self,
        source_code: &str,
        target_code: &str,
        quantity: f64,
    ) -> Result<ValidatedTransformation, TransformationError> {
        let source = self.load(source_code)?;
        let target = self.load(target_code)?;

        validate(
            &TransformationInput {
                source_code,
                source: source.as_ref(),
                target_code,
                target: target.as_ref(),
                quantity,
            },
            &self.registry,
        )
    }

    /// Write both stock levels as one logical unit.
    ///
    /// Either both writes land, or the source write is reverted before
    /// returning. The only exception is a failed revert, which is reported
    /// in the returned error.
    fn commit(&self, validated: &ValidatedTransformation) -> Result<(), CommitError> {
        let source = validated.source();
        let target = validated.target();

        let written_source = match self.store.update_stock(
            source.code(),
            validated.source_stock_after(),
            ExpectedVersion::Exact(source.version()),
        ) {
            Ok(item) => item,
            Err(StoreError::Concurrency(msg)) => return Err(CommitError::Conflict(msg)),
            Err(err) => {
                return Err(CommitError::Failed(TransformationError::persistence(format!(
                    "updating source {}: {err}",
                    source.code()
                ))));
            }
        };

        let target_err = match self.store.update_stock(
            target.code(),
            validated.target_stock_after(),
            ExpectedVersion::Exact(target.version()),
        ) {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        match self.store.update_stock(
            source.code(),
            source.stock(),
            ExpectedVersion::Exact(written_source.version()),
        ) {
            Ok(_) => {
                tracing::warn!(
                    source = %source.code(),
                    target = %target.code(),
                    error = %target_err,
                    "target stock write failed; source stock restored"
                );
                match target_err {
                    StoreError::Concurrency(msg) => Err(CommitError::Conflict(msg)),
                    err => Err(CommitError::Failed(TransformationError::persistence(format!(
                        "updating target {}: {err}",
                        target.code()
                    )))),
                }
            }
            Err(restore_err) => {
                tracing::error!(
                    source = %source.code(),
                    target = %target.code(),
                    error = %target_err,
                    restore_error = %restore_err,
                    stock_before = source.stock(),
                    "target stock write failed and source stock could not be restored"
                );
                Err(CommitError::Failed(TransformationError::persistence(format!(
                    "updating target {}: {target_err}; restoring source {} also failed: {restore_err}",
                    target.code(),
                    source.code()
                ))))
            }
        }
    }
}

fn advance(attempt: &mut TransformationAttempt, next: TransformationStage) {
    let from = attempt.stage();
    match attempt.advance(next) {
        Ok(()) => tracing::debug!(from = from.as_str(), to = next.as_str(), "transformation stage"),
        Err(err) => tracing::error!(error = %err, "transformation lifecycle violated"),
    }
}
