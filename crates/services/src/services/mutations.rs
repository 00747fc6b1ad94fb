//! Create / update / delete commands and their cache invalidation.

use std::{
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use domain::{Validate, ValidationErrors};
use strum_macros::Display;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    api_client::{ApiClient, ApiError},
    dialog::{DialogError, DialogMode, FormDialog},
    notification::{Notifier, Toast},
    query_cache::QueryCache,
    query_key::QueryKey,
    resources::Resource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

#[derive(Debug)]
pub enum MutationRequest<R: Resource> {
    Create(R::Create),
    Update { id: Uuid, patch: R::Update },
    Delete { id: Uuid },
}

impl<R: Resource> MutationRequest<R> {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create(_) => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Create(payload) => payload.validate(),
            Self::Update { patch, .. } => patch.validate(),
            Self::Delete { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("a submission is already in flight")]
    AlreadyInFlight,
    #[error(transparent)]
    Dialog(#[from] DialogError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl MutationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<R> {
    Created(R),
    Updated(R),
    Deleted(Uuid),
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends writes for one resource and refreshes whatever they affect.
///
/// Only one submission runs at a time. Cache keys are invalidated strictly
/// after a successful response and before the success toast is shown; a
/// failed write leaves the cache untouched.
pub struct MutationCommand<R> {
    client: ApiClient,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    in_flight: Arc<AtomicBool>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for MutationCommand<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: self.cache.clone(),
            notifier: Arc::clone(&self.notifier),
            in_flight: Arc::clone(&self.in_flight),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> MutationCommand<R> {
    pub fn new(client: ApiClient, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            cache,
            notifier,
            in_flight: Arc::new(AtomicBool::new(false)),
            _resource: PhantomData,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The list prefix plus dependent keys, each once.
    pub fn affected_keys() -> Vec<QueryKey> {
        let mut keys = vec![R::list_key()];
        for key in R::dependent_keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    pub async fn execute(
        &self,
        request: MutationRequest<R>,
    ) -> Result<MutationOutcome<R>, MutationError> {
        self.execute_then(request, || {}).await
    }

    /// Runs the dialog through a submission: Open → Submitting, then Closed on
    /// success or back to Open with the form (and any field errors) on failure.
    pub async fn submit(
        &self,
        dialog: &mut FormDialog<R::Create>,
    ) -> Result<MutationOutcome<R>, MutationError> {
        let (mode, form) = dialog.begin_submit()?;
        let request = match mode {
            DialogMode::Create => MutationRequest::Create(form),
            DialogMode::Edit(id) => MutationRequest::Update {
                id,
                patch: form.into(),
            },
        };

        let result = self.execute_then(request, || dialog.succeed()).await;
        if let Err(err) = &result {
            let errors = match err {
                MutationError::Validation(errors) => errors.clone(),
                _ => ValidationErrors::new(),
            };
            dialog.fail(errors);
        }
        result
    }

    async fn execute_then(
        &self,
        request: MutationRequest<R>,
        on_success: impl FnOnce(),
    ) -> Result<MutationOutcome<R>, MutationError> {
        request.validate().map_err(MutationError::Validation)?;
        let _guard = self.acquire()?;

        let kind = request.kind();
        match self.send(request).await {
            Ok(outcome) => {
                for key in Self::affected_keys() {
                    self.cache.invalidate(&key);
                }
                on_success();
                info!(resource = R::PATH, action = %kind, "mutation succeeded");
                self.notifier
                    .notify(Toast::success(format!("{} {}", R::LABEL, kind.past_tense())));
                Ok(outcome)
            }
            Err(err) => {
                warn!(resource = R::PATH, action = %kind, error = %err, "mutation failed");
                self.notifier.notify(Toast::error(
                    format!("Could not {kind} {}", R::LABEL.to_lowercase()),
                    err.user_message(),
                ));
                Err(MutationError::Api(err))
            }
        }
    }

    fn acquire(&self) -> Result<InFlightGuard, MutationError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard(Arc::clone(&self.in_flight)))
            .map_err(|_| MutationError::AlreadyInFlight)
    }

    async fn send(&self, request: MutationRequest<R>) -> Result<MutationOutcome<R>, ApiError> {
        match request {
            MutationRequest::Create(payload) => self
                .client
                .post_json(&R::list_key(), &payload)
                .await
                .map(MutationOutcome::Created),
            MutationRequest::Update { id, patch } => self
                .client
                .patch_json(&R::record_key(id), &patch)
                .await
                .map(MutationOutcome::Updated),
            MutationRequest::Delete { id } => self
                .client
                .delete(&R::record_key(id))
                .await
                .map(|()| MutationOutcome::Deleted(id)),
        }
    }
}
