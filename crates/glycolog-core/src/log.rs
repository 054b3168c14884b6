//! The glycemia log: a local list of readings kept in step with the store.
//!
//! The store is the only source of truth. A submission is never appended
//! locally; the list is re-fetched after the store accepts it. A deletion
//! only removes the reading locally once the store confirms it.
//!
//! Each operation moves the observable [`OpState`] through
//! `Idle -> Pending -> Succeeded | Failed`. The outcome stays until the next
//! operation begins or the caller calls [`GlycemiaLog::acknowledge`].
//! Operations take `&mut self`, so a single log never has two requests in
//! flight.

use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{CoreError, Result, ValidationError};
use crate::reading::{normalize_value_input, Reading, ReadingTime, ReadingValue};
use crate::store::{NewReading, StoreClient};

/// Which operation a state refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Refresh,
    Submit,
    Delete,
}

/// Progress of the most recent operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OpState {
    Idle,
    Pending { op: OpKind },
    Succeeded { op: OpKind },
    Failed { op: OpKind, message: String },
}

/// Text fields of the entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub value: String,
    pub note: String,
}

impl EntryForm {
    pub fn clear(&mut self) {
        self.value.clear();
        self.note.clear();
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    /// Value as acknowledged by the store.
    pub value: String,
    /// Set when the follow-up refresh failed. The submission itself stands.
    pub refresh_error: Option<String>,
}

/// A proposed deletion awaiting confirmation.
///
/// Only [`GlycemiaLog::propose_delete`] creates one; pass it to
/// [`GlycemiaLog::confirm_delete`] or drop it (or call [`cancel`](Self::cancel))
/// to abandon the deletion.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a proposed deletion does nothing until confirmed"]
pub struct PendingDelete {
    id: String,
}

impl PendingDelete {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cancel(self) {
        tracing::debug!(id = %self.id, "deletion cancelled");
    }
}

/// Local mirror of the user's readings.
pub struct GlycemiaLog {
    store: StoreClient,
    readings: Vec<Reading>,
    skipped: usize,
    form: EntryForm,
    state: watch::Sender<OpState>,
}

impl GlycemiaLog {
    pub fn new(store: StoreClient) -> Self {
        let (state, _) = watch::channel(OpState::Idle);
        Self {
            store,
            readings: Vec::new(),
            skipped: 0,
            form: EntryForm::default(),
            state,
        }
    }

    /// Readings in the order the store listed them.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn get(&self, id: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.id == id)
    }

    /// Listing items left out of the last fetched list because they carry
    /// no id.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntryForm {
        &mut self.form
    }

    pub fn state(&self) -> OpState {
        self.state.borrow().clone()
    }

    /// Watch operation progress, e.g. to disable the submit control while a
    /// submission is pending or to show the last failure.
    pub fn subscribe(&self) -> watch::Receiver<OpState> {
        self.state.subscribe()
    }

    /// Clear a shown outcome back to `Idle`.
    pub fn acknowledge(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, OpState::Succeeded { .. } | OpState::Failed { .. }) {
                *state = OpState::Idle;
                true
            } else {
                false
            }
        });
    }

    fn begin(&self, op: OpKind) {
        self.state.send_replace(OpState::Pending { op });
    }

    fn succeed(&self, op: OpKind) {
        self.state.send_replace(OpState::Succeeded { op });
    }

    fn fail(&self, op: OpKind, error: &CoreError) {
        self.state.send_replace(OpState::Failed {
            op,
            message: error.to_string(),
        });
    }

    /// Replace the local list with the store's current listing.
    ///
    /// On any failure the previous list is kept as is.
    pub async fn refresh(&mut self) -> Result<&[Reading]> {
        self.begin(OpKind::Refresh);
        match self.reload().await {
            Ok(()) => self.succeed(OpKind::Refresh),
            Err(e) => {
                self.fail(OpKind::Refresh, &e);
                return Err(e);
            }
        }
        Ok(&self.readings)
    }

    /// Fetch and assign the list without touching the operation state.
    async fn reload(&mut self) -> Result<()> {
        let (readings, skipped) = self.fetch().await?;
        self.readings = readings;
        self.skipped = skipped;
        tracing::info!(count = self.readings.len(), skipped, "readings refreshed");
        Ok(())
    }

    async fn fetch(&self) -> Result<(Vec<Reading>, usize)> {
        let items = self.store.list().await?;
        let mut seen = HashSet::with_capacity(items.len());
        let mut readings = Vec::with_capacity(items.len());
        let mut skipped = 0;

        for item in &items {
            let reading = match Reading::from_wire(item) {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping listing item");
                    skipped += 1;
                    continue;
                }
            };
            if !seen.insert(reading.id.clone()) {
                tracing::warn!(id = %reading.id, "duplicate reading id in listing, keeping first");
                continue;
            }
            if let ReadingValue::Invalid { raw } = &reading.value {
                tracing::warn!(id = %reading.id, %raw, "reading has an unreadable value");
            }
            if let ReadingTime::Invalid { raw } = &reading.timestamp {
                tracing::warn!(id = %reading.id, %raw, "reading has an unreadable date");
            }
            readings.push(reading);
        }

        Ok((readings, skipped))
    }

    /// Fill the entry form and submit it.
    pub async fn submit(&mut self, raw_value: &str, note: &str) -> Result<SubmitReceipt> {
        self.form = EntryForm {
            value: raw_value.to_string(),
            note: note.to_string(),
        };
        self.submit_form().await
    }

    /// Submit the current entry form.
    ///
    /// An empty or non-numeric value fails before any request. On
    /// acceptance the form is cleared and the list re-fetched before the
    /// state turns `Succeeded`; on rejection the form keeps what the user
    /// typed.
    pub async fn submit_form(&mut self) -> Result<SubmitReceipt> {
        let value = normalize_value_input(&self.form.value)?;
        let request = NewReading {
            value,
            note: self.form.note.clone(),
        };

        self.begin(OpKind::Submit);
        let echoed = match self.store.add(&request).await {
            Ok(echoed) => echoed,
            Err(e) => {
                let e = CoreError::from(e);
                self.fail(OpKind::Submit, &e);
                return Err(e);
            }
        };

        tracing::info!(value = %echoed, "reading submitted");
        self.form.clear();

        let refresh_error = match self.reload().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "refresh after submit failed");
                Some(e.to_string())
            }
        };
        self.succeed(OpKind::Submit);

        Ok(SubmitReceipt {
            value: echoed,
            refresh_error,
        })
    }

    /// First step of a deletion: check the reading exists locally.
    pub fn propose_delete(&self, id: &str) -> Result<PendingDelete, ValidationError> {
        if self.get(id).is_none() {
            return Err(ValidationError::UnknownReading(id.to_string()));
        }
        Ok(PendingDelete { id: id.to_string() })
    }

    /// Second step of a deletion: ask the store to delete the reading.
    ///
    /// The reading must still be in the local list. It leaves the list only
    /// after the store confirms, followed by a best-effort refresh.
    pub async fn confirm_delete(&mut self, pending: PendingDelete) -> Result<()> {
        let id = pending.id;
        if self.get(&id).is_none() {
            return Err(ValidationError::UnknownReading(id).into());
        }

        self.begin(OpKind::Delete);
        if let Err(e) = self.store.delete(&id).await {
            let e = CoreError::from(e);
            self.fail(OpKind::Delete, &e);
            return Err(e);
        }

        self.readings.retain(|r| r.id != id);
        tracing::info!(%id, "reading deleted");

        if let Err(e) = self.reload().await {
            tracing::warn!(error = %e, "refresh after delete failed");
        }
        self.succeed(OpKind::Delete);
        Ok(())
    }
}
