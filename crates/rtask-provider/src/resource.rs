//! Recurring task resource lifecycle
//!
//! Create, adopt, read, update, delete and import of one combined
//! recurring task resource. Every step goes through the engine first, so
//! an invalid desired record never reaches the client.

use crate::client::TaskClient;
use crate::error::ProviderError;
use crate::state::ResourceState;
use crate::wire;
use rtask_engine::{EngineConfig, ReconcileMode, Reconciliation, StateNormalizer, VariantDispatcher};
use rtask_record::TaskRecord;
use rtask_variant::VariantRegistry;
use serde_json::Value as JsonValue;

/// Result of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Server already matched; nothing was sent
    NoOp,
    /// Patch with this many operations was applied
    Patched(usize),
}

/// Lifecycle driver over a [`TaskClient`]
#[derive(Debug)]
pub struct RecurringTaskResource<C> {
    client: C,
    registry: &'static VariantRegistry,
    config: EngineConfig,
}

impl<C: TaskClient> RecurringTaskResource<C> {
    /// Resource over the built-in catalog
    #[must_use]
    pub fn new(client: C, config: EngineConfig) -> Self {
        Self::with_registry(client, VariantRegistry::recurring_tasks(), config)
    }

    /// Resource over a custom registry
    #[must_use]
    pub fn with_registry(client: C, registry: &'static VariantRegistry, config: EngineConfig) -> Self {
        Self { client, registry, config }
    }

    /// Valid plan or the reason there is none
    fn plan(
        &self,
        mode: ReconcileMode,
        desired: &TaskRecord,
        observed: Option<&TaskRecord>,
    ) -> Result<Reconciliation, ProviderError> {
        let plan = VariantDispatcher::with_config(self.registry, self.config.with_mode(mode))
            .reconcile(desired, observed)
            .map_err(|e| {
                if e.is_bug() {
                    tracing::error!("Engine defect reconciling '{}' task: {}", desired.task_type(), e);
                } else {
                    tracing::warn!("Cannot reconcile '{}' task: {}", desired.task_type(), e);
                }
                e
            })?;
        if !plan.is_valid() {
            return Err(ProviderError::Validation(plan.errors));
        }
        Ok(plan)
    }

    /// Create a task, or adopt it when configured to
    ///
    /// # Errors
    /// `Validation` before any request when `desired` is invalid; otherwise
    /// engine, wire or client errors
    pub async fn create(&self, id: &str, desired: &TaskRecord) -> Result<ResourceState, ProviderError> {
        if self.config.is_adopt() {
            return self.adopt(id, desired).await;
        }

        let plan = self.plan(ReconcileMode::Create, desired, None)?;
        let variant = self.registry.lookup(desired.task_type()).map_err(rtask_engine::EngineError::from)?;

        tracing::info!("Creating recurring task '{}' ({})", id, variant.name());
        let response = self
            .client
            .create(wire::create_payload(id, &plan.record, variant))
            .await?;
        self.state_from_response(id, &response, false)
    }

    /// Take over an existing task, patching only what differs
    ///
    /// # Errors
    /// `Client(NotFound)` if the task does not exist; `Validation` before
    /// any write when `desired` is invalid
    pub async fn adopt(&self, id: &str, desired: &TaskRecord) -> Result<ResourceState, ProviderError> {
        let existing = self.client.get(id).await?;
        let observed = self.state_from_response(id, &existing, true)?;
        let Some(record) = observed.record.as_ref() else {
            return Err(ProviderError::NotLoaded(id.to_string()));
        };

        let plan = self.plan(ReconcileMode::Adopt, desired, Some(record))?;
        if plan.patch.is_empty() {
            tracing::info!("Adopted recurring task '{}': no changes", id);
            return Ok(observed);
        }

        tracing::info!("Adopting recurring task '{}' with {} change(s)", id, plan.patch.len());
        let response = self.client.patch(id, wire::patch_payload(&plan.patch)).await?;
        self.state_from_response(id, &response, true)
    }

    /// Refresh state from the server
    ///
    /// Returns `None` when the task no longer exists.
    ///
    /// # Errors
    /// Client errors other than `NotFound`, or wire errors
    pub async fn read(&self, state: &ResourceState) -> Result<Option<ResourceState>, ProviderError> {
        let response = match self.client.get(&state.id).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Recurring task '{}' no longer exists", state.id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mut refreshed = self.state_from_response(&state.id, &response, state.adopted)?;
        refreshed.last_updated = state.last_updated;
        Ok(Some(refreshed))
    }

    /// Move the server object to `desired`
    ///
    /// # Errors
    /// `NotLoaded` for an import that was never read; `Validation` before
    /// any request when `desired` is invalid
    pub async fn update(
        &self,
        state: &ResourceState,
        desired: &TaskRecord,
    ) -> Result<(ResourceState, UpdateOutcome), ProviderError> {
        let stored = state
            .record
            .as_ref()
            .ok_or_else(|| ProviderError::NotLoaded(state.id.clone()))?;

        let mode = if state.adopted {
            ReconcileMode::Adopt
        } else {
            ReconcileMode::Create
        };
        let plan = self.plan(mode, desired, Some(stored))?;

        if plan.patch.is_empty() {
            tracing::info!("Recurring task '{}': no changes", state.id);
            let mut unchanged = state.clone();
            unchanged.touch();
            return Ok((unchanged, UpdateOutcome::NoOp));
        }

        let count = plan.patch.len();
        tracing::info!("Updating recurring task '{}' with {} operation(s)", state.id, count);
        for op in &plan.patch {
            tracing::debug!("  {}", op);
        }
        let response = self.client.patch(&state.id, wire::patch_payload(&plan.patch)).await?;
        let updated = self.state_from_response(&state.id, &response, state.adopted)?;
        Ok((updated, UpdateOutcome::Patched(count)))
    }

    /// Remove the task from the server
    ///
    /// Adopted tasks are only forgotten. A task that is already gone counts
    /// as deleted.
    ///
    /// # Errors
    /// Client errors other than `NotFound`
    pub async fn delete(&self, state: &ResourceState) -> Result<(), ProviderError> {
        if state.adopted {
            tracing::info!("Releasing adopted recurring task '{}' without deleting it", state.id);
            return Ok(());
        }
        match self.client.delete(&state.id).await {
            Ok(()) => {
                tracing::info!("Deleted recurring task '{}'", state.id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("Recurring task '{}' was already gone", state.id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Start tracking an existing task by id
    #[must_use]
    pub fn import(&self, id: &str) -> ResourceState {
        tracing::debug!("Importing recurring task '{}'", id);
        ResourceState::imported(id)
    }

    fn state_from_response(&self, id: &str, response: &JsonValue, adopted: bool) -> Result<ResourceState, ProviderError> {
        let parsed = wire::parse_response(response, self.registry)?;
        let record = StateNormalizer::new(self.registry).normalize(&parsed.record)?;
        let id = parsed.id.unwrap_or_else(|| id.to_string());
        Ok(ResourceState::new(id, record)
            .with_messages(parsed.notifications, parsed.required_actions)
            .with_adopted(adopted))
    }
}
