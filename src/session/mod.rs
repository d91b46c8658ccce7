//! The edit session: current image pair, prompt, status and history.
//!
//! A session is a single owned value passed explicitly to every operation.
//! Each state change publishes a [`SessionSnapshot`] to the registered
//! [`SessionObserver`], so a view can be a pure function of the snapshot.

mod history;
mod status;

pub use history::{EditRecord, History, RecordId, MAX_HISTORY};
pub use status::{ProcessingStatus, IN_PROGRESS_MESSAGE};

use crate::error::Result;
use crate::image::{ImageEditor, ImagePayload};
use crate::presets::QuickAction;
use chrono::Utc;

/// Read-only view of a session, handed to observers.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    /// The uploaded (or restored) original image.
    pub original: Option<&'a ImagePayload>,
    /// The current edit result.
    pub edited: Option<&'a ImagePayload>,
    /// Pending prompt text.
    pub prompt: &'a str,
    /// Edit lifecycle state.
    pub status: &'a ProcessingStatus,
    /// Completed edits, newest first.
    pub history: &'a History,
}

/// Receives a snapshot after every session state change.
pub trait SessionObserver: Send {
    /// Called with the new state.
    fn on_change(&mut self, snapshot: &SessionSnapshot<'_>);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionSnapshot<'_>) + Send,
{
    fn on_change(&mut self, snapshot: &SessionSnapshot<'_>) {
        self(snapshot)
    }
}

/// Result of an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing happened: no image, blank instruction, or an edit already running.
    Skipped,
    /// The edit succeeded and was recorded under this id.
    Completed(RecordId),
    /// The edit failed; the session status carries the message.
    Failed(String),
    /// The session moved on (new upload, reset, history selection) while the
    /// edit was running, so its result was dropped.
    Stale,
}

/// Work handed out by [`EditSession::begin_edit`].
///
/// Pass the ticket's image and instruction to an [`ImageEditor`], then hand
/// the result back through [`EditSession::finish_edit`]. A ticket is
/// consumed when finished, so one edit is recorded at most once.
#[derive(Debug)]
#[must_use = "an edit ticket must be finished or the session stays in progress"]
pub struct EditTicket {
    original: ImagePayload,
    instruction: String,
    generation: u64,
}

impl EditTicket {
    /// The image to edit.
    pub fn original(&self) -> &ImagePayload {
        &self.original
    }

    /// The instruction to apply.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

/// A single user's edit session.
#[derive(Default)]
pub struct EditSession {
    original: Option<ImagePayload>,
    edited: Option<ImagePayload>,
    prompt: String,
    status: ProcessingStatus,
    history: History,
    // bumped whenever the displayed pair is replaced, so late results can be told apart
    generation: u64,
    observer: Option<Box<dyn SessionObserver>>,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("has_original", &self.original.is_some())
            .field("has_edited", &self.edited.is_some())
            .field("prompt", &self.prompt)
            .field("status", &self.status)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl EditSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the observer, replacing any previous one.
    ///
    /// The observer immediately receives the current state.
    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observer = Some(Box::new(observer));
        self.publish();
    }

    /// Removes the observer.
    pub fn unsubscribe(&mut self) {
        self.observer = None;
    }

    /// Returns a read-only view of the current state.
    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            original: self.original.as_ref(),
            edited: self.edited.as_ref(),
            prompt: &self.prompt,
            status: &self.status,
            history: &self.history,
        }
    }

    /// The current original image.
    pub fn original(&self) -> Option<&ImagePayload> {
        self.original.as_ref()
    }

    /// The current edit result.
    pub fn edited(&self) -> Option<&ImagePayload> {
        self.edited.as_ref()
    }

    /// The pending prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The edit lifecycle state.
    pub fn status(&self) -> &ProcessingStatus {
        &self.status
    }

    /// Completed edits, newest first.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Starts a new session around `image`.
    ///
    /// Clears the edit result, prompt text and any error.
    pub fn set_original(&mut self, image: ImagePayload) {
        tracing::info!(
            size_bytes = image.size(),
            mime_type = image.mime_type(),
            "new original image"
        );
        self.original = Some(image);
        self.edited = None;
        self.prompt.clear();
        self.status = ProcessingStatus::Idle;
        self.generation += 1;
        self.publish();
    }

    /// Updates the pending prompt text.
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
        self.publish();
    }

    /// Drops the current edit result, keeping the original and prompt.
    pub fn clear_edited(&mut self) {
        self.edited = None;
        self.publish();
    }

    /// Clears the original, result, prompt and status. History is kept.
    pub fn reset(&mut self) {
        tracing::debug!(history_len = self.history.len(), "session reset");
        self.original = None;
        self.edited = None;
        self.prompt.clear();
        self.status = ProcessingStatus::Idle;
        self.generation += 1;
        self.publish();
    }

    /// Restores the original, result and prompt of a history entry.
    ///
    /// Returns false (and changes nothing) if no entry has that id.
    pub fn select_history_entry(&mut self, id: RecordId) -> bool {
        let Some(record) = self.history.get(id) else {
            return false;
        };
        self.original = Some(record.original().clone());
        self.edited = Some(record.edited().clone());
        self.prompt = record.instruction().to_string();
        if self.status.is_in_progress() {
            self.status = ProcessingStatus::Idle;
        }
        self.generation += 1;
        self.publish();
        true
    }

    /// Validates an edit request and marks the session in progress.
    ///
    /// Uses `instruction` when it is non-empty, the pending prompt otherwise.
    /// Returns `None` without touching state when there is no original image,
    /// the instruction is blank, or an edit is already running.
    pub fn begin_edit(&mut self, instruction: Option<&str>) -> Option<EditTicket> {
        if self.status.is_in_progress() {
            tracing::debug!("edit already in progress, ignoring request");
            return None;
        }
        let original = self.original.as_ref()?;
        let instruction = instruction
            .filter(|s| !s.is_empty())
            .unwrap_or(self.prompt.as_str());
        if instruction.trim().is_empty() {
            return None;
        }

        let ticket = EditTicket {
            original: original.clone(),
            instruction: instruction.to_string(),
            generation: self.generation,
        };
        self.status = ProcessingStatus::InProgress(IN_PROGRESS_MESSAGE.to_string());
        self.publish();
        Some(ticket)
    }

    /// Applies the editor's result for a ticket from [`begin_edit`](Self::begin_edit).
    ///
    /// Returns [`EditOutcome::Stale`] if the session moved on or is no longer
    /// waiting for a result.
    pub fn finish_edit(&mut self, ticket: EditTicket, result: Result<ImagePayload>) -> EditOutcome {
        if ticket.generation != self.generation || !self.status.is_in_progress() {
            tracing::debug!("discarding result for a superseded edit");
            return EditOutcome::Stale;
        }

        match result {
            Ok(edited) => {
                self.edited = Some(edited.clone());
                let id = self
                    .history
                    .record(ticket.original, edited, ticket.instruction, Utc::now())
                    .id();
                self.status = ProcessingStatus::Idle;
                tracing::info!(%id, history_len = self.history.len(), "edit recorded");
                self.publish();
                EditOutcome::Completed(id)
            }
            Err(e) => {
                let message = e.user_message();
                tracing::warn!("edit failed: {message}");
                self.status = ProcessingStatus::Failed(message.clone());
                self.publish();
                EditOutcome::Failed(message)
            }
        }
    }

    /// Runs a whole edit: validate, call the editor once, record the result.
    ///
    /// Never returns an error: failures end up in [`ProcessingStatus::Failed`]
    /// and leave the previous result and history untouched.
    pub async fn request_edit(
        &mut self,
        editor: &dyn ImageEditor,
        instruction: Option<&str>,
    ) -> EditOutcome {
        let Some(ticket) = self.begin_edit(instruction) else {
            return EditOutcome::Skipped;
        };
        let result = editor
            .submit_edit(ticket.original(), ticket.instruction())
            .await;
        self.finish_edit(ticket, result)
    }

    /// Runs a quick-action preset as an edit.
    pub async fn request_quick_action(
        &mut self,
        editor: &dyn ImageEditor,
        action: QuickAction,
    ) -> EditOutcome {
        self.request_edit(editor, Some(action.instruction())).await
    }

    fn publish(&mut self) {
        let Self {
            original,
            edited,
            prompt,
            status,
            history,
            observer,
            ..
        } = self;
        if let Some(observer) = observer {
            observer.on_change(&SessionSnapshot {
                original: original.as_ref(),
                edited: edited.as_ref(),
                prompt,
                status,
                history,
            });
        }
    }
}
