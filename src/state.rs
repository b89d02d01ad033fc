//! Form State Controller - Values, Errors, Guarded Submission
//!
//! One controller per mounted form instance. Interior locking keeps
//! the cooperative model honest: `set_value` may land while a
//! submission awaits its callback, but the submission validates and
//! sends the snapshot taken when it started, and a late-arriving
//! outcome is applied only if that submission is still the active one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::compiler::{compile, CompiledNode};
use crate::condition::is_visible;
use crate::descriptor::{FieldValue, FormSchema, FormState};
use crate::rules::parse_rules;

const EMPTY: FieldValue = FieldValue::Null;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// A submission is already in flight; the new attempt is rejected
    /// immediately, not queued, and touches no state.
    #[error("A submission is already in flight")]
    Busy,

    /// Visible fields failed validation; messages are in the error map
    /// and the callback was never invoked.
    #[error("Validation failed for {0} field(s)")]
    Validation(usize),

    /// The external submit callback failed. Values and error map are
    /// left untouched so the user can retry without re-entering data.
    #[error("Submit callback failed: {0}")]
    Callback(String),

    /// The submission was cancelled (or superseded) while its callback
    /// was in flight; the outcome was discarded.
    #[error("Submission is no longer active")]
    Aborted,
}

/// Snapshot handed to the submit callback: visible-field values at
/// the moment the submission started.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub id: Uuid,
    pub values: BTreeMap<String, FieldValue>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of a validation pass. `checked` lists exactly the keys
/// that were validated; hidden fields never appear in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checked: Vec<String>,
    pub errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

struct Inner {
    values: FormState,
    errors: BTreeMap<String, String>,
    nodes: Vec<CompiledNode>,
    in_flight: Option<u64>,
    next_token: u64,
}

/// Owns the live state of one form instance.
pub struct FormController {
    schema: FormSchema,
    /// State key -> indices of nodes whose visibility depends on it.
    deps: HashMap<String, Vec<usize>>,
    inner: Mutex<Inner>,
}

impl FormController {
    pub fn new(schema: FormSchema) -> Self {
        Self::with_values(schema, FormState::new())
    }

    /// Mount with caller-supplied initial values.
    pub fn with_values(schema: FormSchema, values: FormState) -> Self {
        let nodes = compile(&schema, &values);

        let mut deps: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, field) in schema.fields.iter().enumerate() {
            for condition in &field.conditions {
                deps.entry(condition.field.clone()).or_default().push(idx);
            }
        }

        Self {
            schema,
            deps,
            inner: Mutex::new(Inner {
                values,
                errors: BTreeMap::new(),
                nodes,
                in_flight: None,
                next_token: 0,
            }),
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Write one value. Clears that key's error entry and recomputes
    /// visibility for exactly the nodes whose conditions reference it.
    pub fn set_value(&self, key: &str, value: FieldValue) {
        let mut inner = self.inner.lock().expect("form state lock poisoned");
        inner.values.insert(key.to_string(), value);
        inner.errors.remove(key);

        if let Some(dependents) = self.deps.get(key) {
            for &idx in dependents {
                let visible = is_visible(&self.schema.fields[idx].conditions, &inner.values);
                inner.nodes[idx].visible = visible;
            }
        }
    }

    pub fn get_value(&self, key: &str) -> Option<FieldValue> {
        let inner = self.inner.lock().expect("form state lock poisoned");
        inner.values.get(key).cloned()
    }

    pub fn errors(&self) -> BTreeMap<String, String> {
        let inner = self.inner.lock().expect("form state lock poisoned");
        inner.errors.clone()
    }

    /// Current node tree snapshot for the renderer.
    pub fn nodes(&self) -> Vec<CompiledNode> {
        let inner = self.inner.lock().expect("form state lock poisoned");
        inner.nodes.clone()
    }

    /// Run validation over visible fields without submitting.
    pub fn validate(&self) -> ValidationReport {
        let inner = self.inner.lock().expect("form state lock poisoned");
        self.validate_visible(&inner)
    }

    /// Validate, then hand the snapshot to the caller's submit
    /// callback. See [`SubmitError`] for the failure modes.
    pub async fn submit<F, Fut>(&self, send: F) -> Result<SubmissionReceipt, SubmitError>
    where
        F: FnOnce(SubmissionPayload) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let (token, payload) = self.begin_submission()?;
        let receipt = SubmissionReceipt {
            id: payload.id,
            submitted_at: payload.submitted_at,
        };

        // The lock is not held across this await; set_value calls
        // during the flight update state but not the snapshot.
        let outcome = send(payload).await;

        self.finish_submission(token, outcome)?;
        Ok(receipt)
    }

    /// Unmount/navigation path: a callback outcome arriving after this
    /// call is discarded instead of being applied to a dead form.
    pub fn cancel_submission(&self) {
        let mut inner = self.inner.lock().expect("form state lock poisoned");
        if inner.in_flight.take().is_some() {
            tracing::debug!("in-flight submission cancelled");
        }
    }

    fn begin_submission(&self) -> Result<(u64, SubmissionPayload), SubmitError> {
        let mut inner = self.inner.lock().expect("form state lock poisoned");

        // Busy check first: a rejected duplicate leaves everything
        // untouched.
        if inner.in_flight.is_some() {
            return Err(SubmitError::Busy);
        }

        inner.errors.clear();
        let report = self.validate_visible(&inner);
        if !report.is_clean() {
            let count = report.errors.len();
            inner.errors = report.errors;
            return Err(SubmitError::Validation(count));
        }

        let token = inner.next_token;
        inner.next_token += 1;
        inner.in_flight = Some(token);

        let mut values = BTreeMap::new();
        for node in inner.nodes.iter().filter(|n| n.visible) {
            if let Some(value) = inner.values.get(&node.key) {
                values.insert(node.key.clone(), value.clone());
            }
        }

        Ok((
            token,
            SubmissionPayload {
                id: Uuid::new_v4(),
                values,
                submitted_at: Utc::now(),
            },
        ))
    }

    fn finish_submission(&self, token: u64, outcome: Result<(), String>) -> Result<(), SubmitError> {
        let mut inner = self.inner.lock().expect("form state lock poisoned");

        // Stale-response guard: only the submission that is still
        // active may apply its outcome.
        if inner.in_flight != Some(token) {
            return Err(SubmitError::Aborted);
        }
        inner.in_flight = None;

        outcome.map_err(SubmitError::Callback)
    }

    /// Hidden fields are exempt: a conditionally hidden required field
    /// never blocks submission.
    fn validate_visible(&self, inner: &Inner) -> ValidationReport {
        let mut checked = Vec::new();
        let mut errors = BTreeMap::new();

        for (field, node) in self.schema.fields.iter().zip(&inner.nodes) {
            if !node.visible {
                continue;
            }
            checked.push(field.key.clone());

            let Some(expr) = &field.validation else {
                continue;
            };
            let value = inner.values.get(&field.key).unwrap_or(&EMPTY);
            let label = field.label.as_deref().unwrap_or(&field.key);

            for rule in parse_rules(expr) {
                if !rule.check(value) {
                    let message = field
                        .validation_messages
                        .get(rule.name())
                        .cloned()
                        .unwrap_or_else(|| rule.default_message(label));
                    errors.insert(field.key.clone(), message);
                    break;
                }
            }
        }

        ValidationReport { checked, errors }
    }
}
