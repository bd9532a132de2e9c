//! Session orchestrator
//!
//! The only writer of `SessionState`. Every user intent (capture, delete,
//! mode changes, assembly) goes through here. Gateway calls run as
//! independent tasks; when they finish they rejoin through the same
//! update path and touch exactly one record (or the assembly slot),
//! looked up by identity.
//!
//! Observers subscribe to a `watch` channel. Each logical change publishes
//! one complete snapshot while the state lock is still held, so no reader
//! ever sees a half-applied update and snapshots arrive in order.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::catalog::ModeCatalog;
use crate::error::{BoothError, GatewayError};
use crate::gateway::{AssemblyGateway, TransformGateway};
use crate::state::{Frame, ModeSelection, PhotoId, PhotoRecord, SessionState};

/// Receiver side of the change notifications
pub type SessionWatcher = watch::Receiver<SessionState>;

/// User intents, as forwarded by a presentation layer
#[derive(Debug, Clone)]
pub enum Intent {
    Capture(Frame),
    Delete(PhotoId),
    SetMode(ModeSelection),
    SetCustomPrompt(String),
    /// The custom prompt editor was closed
    CloseCustomPrompt,
    Assemble,
    DismissAssembly,
}

/// Result of a dispatched intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Captured(PhotoId),
    Applied,
}

/// Owned state plus the channel its snapshots are published on
struct Shared {
    state: Mutex<SessionState>,
    published: watch::Sender<SessionState>,
    /// Gateway tasks that have not rejoined yet, including ones whose
    /// result will be discarded
    outstanding: watch::Sender<usize>,
}

/// Counts a gateway task as outstanding until dropped
struct TaskGuard(Arc<Shared>);

impl TaskGuard {
    fn new(shared: &Arc<Shared>) -> Self {
        shared.outstanding.send_modify(|count| *count += 1);
        TaskGuard(Arc::clone(shared))
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0
            .outstanding
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

impl Shared {
    /// Run `f` under the lock. When it reports a change, bump the
    /// revision and publish the new snapshot before releasing the lock.
    fn update<T>(&self, f: impl FnOnce(&mut SessionState) -> (bool, T)) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (changed, value) = f(&mut state);
        if changed {
            state.bump_revision();
            self.published.send_replace(state.clone());
        }
        value
    }

    fn apply(&self, f: impl FnOnce(&mut SessionState) -> bool) -> bool {
        self.update(|state| {
            let changed = f(state);
            (changed, changed)
        })
    }

    /// Like `update`, but only an `Ok` counts as a change
    fn try_update<T>(
        &self,
        f: impl FnOnce(&mut SessionState) -> Result<T, BoothError>,
    ) -> Result<T, BoothError> {
        self.update(|state| {
            let result = f(state);
            (result.is_ok(), result)
        })
    }
}

/// Drives a photo booth session
pub struct Orchestrator {
    catalog: Arc<ModeCatalog>,
    transformer: Arc<dyn TransformGateway>,
    assembler: Arc<dyn AssemblyGateway>,
    shared: Arc<Shared>,
}

impl Orchestrator {
    /// Start an empty session in `initial_mode`.
    ///
    /// `capture` and `assemble` spawn Tokio tasks, so they must be called
    /// from within a Tokio runtime.
    pub fn new(
        catalog: Arc<ModeCatalog>,
        initial_mode: ModeSelection,
        transformer: Arc<dyn TransformGateway>,
        assembler: Arc<dyn AssemblyGateway>,
    ) -> Self {
        let initial = SessionState::new(initial_mode);
        let (published, _) = watch::channel(initial.clone());
        let (outstanding, _) = watch::channel(0);

        Self {
            catalog,
            transformer,
            assembler,
            shared: Arc::new(Shared {
                state: Mutex::new(initial),
                published,
                outstanding,
            }),
        }
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    /// Register for change notifications
    pub fn subscribe(&self) -> SessionWatcher {
        self.shared.published.subscribe()
    }

    /// Current state; cheap, frames are shared
    pub fn snapshot(&self) -> SessionState {
        self.shared.published.borrow().clone()
    }

    pub fn photo(&self, id: PhotoId) -> Option<PhotoRecord> {
        self.shared.published.borrow().photo(id).cloned()
    }

    /// Forward a user intent to the matching operation
    pub fn dispatch(&self, intent: Intent) -> Result<Outcome, BoothError> {
        match intent {
            Intent::Capture(frame) => self.capture(frame).map(Outcome::Captured),
            Intent::Delete(id) => {
                self.delete(id);
                Ok(Outcome::Applied)
            }
            Intent::SetMode(mode) => self.set_mode(mode).map(|_| Outcome::Applied),
            Intent::SetCustomPrompt(text) => {
                self.set_custom_prompt(text);
                Ok(Outcome::Applied)
            }
            Intent::CloseCustomPrompt => {
                self.close_custom_prompt();
                Ok(Outcome::Applied)
            }
            Intent::Assemble => self.assemble().map(|_| Outcome::Applied),
            Intent::DismissAssembly => {
                self.dismiss_assembly();
                Ok(Outcome::Applied)
            }
        }
    }

    // ========== Capture ==========

    /// Record a new photo and start transforming it.
    ///
    /// Returns as soon as the pending record is in place; the
    /// transformation result lands on the record later.
    pub fn capture(&self, frame: Frame) -> Result<PhotoId, BoothError> {
        let catalog = Arc::clone(&self.catalog);
        let source = frame.clone();

        let (id, label, instruction) = self.shared.try_update(move |state| {
            let (mode, instruction) = state.resolve_next_mode(&catalog, &mut rand::thread_rng())?;
            let label = mode.label().to_string();
            let record = PhotoRecord::pending(source, mode);
            let id = record.id;
            state.push_photo(record);
            Ok((id, label, instruction))
        })?;

        tracing::info!(photo = %id, mode = %label, "📸 Captured photo");
        self.spawn_transform(id, frame, instruction);
        Ok(id)
    }

    fn spawn_transform(&self, id: PhotoId, frame: Frame, instruction: String) {
        let guard = TaskGuard::new(&self.shared);
        let gateway = Arc::clone(&self.transformer);

        tokio::spawn(async move {
            let shared = &guard.0;
            // Own task so a panicking gateway still settles the record
            let call = tokio::spawn(async move { gateway.transform(frame, instruction).await });
            let outcome = match call.await {
                Ok(result) => result,
                Err(e) => Err(GatewayError::Join(e.to_string())),
            };

            let outcome = match outcome {
                Ok(output) => {
                    tracing::info!(photo = %id, "✅ Transformation ready");
                    Ok(output)
                }
                Err(e) => {
                    tracing::warn!(photo = %id, "Transformation failed: {e}");
                    Err(e.to_string())
                }
            };

            if !shared.apply(|state| state.complete_photo(id, outcome)) {
                tracing::debug!(photo = %id, "Discarding transformation result for deleted photo");
            }
        });
    }

    // ========== Delete ==========

    /// Remove a photo. Unknown ids are a no-op; an in-flight
    /// transformation keeps running and its result is dropped.
    pub fn delete(&self, id: PhotoId) -> bool {
        let removed = self.shared.apply(|state| state.remove_photo(id));
        if removed {
            tracing::info!(photo = %id, "🗑️ Deleted photo");
        }
        removed
    }

    // ========== Modes ==========

    /// Select the mode for the next capture
    pub fn set_mode(&self, mode: ModeSelection) -> Result<(), BoothError> {
        if let ModeSelection::Catalog(id) = &mode {
            if !self.catalog.contains(id) {
                return Err(BoothError::UnknownMode(id.clone()));
            }
        }
        tracing::debug!(mode = %mode, "Mode selected");
        self.shared.apply(|state| state.set_active_mode(mode));
        Ok(())
    }

    /// `set_mode` by id (`custom`, `random` or a catalog id)
    pub fn set_mode_id(&self, id: &str) -> Result<(), BoothError> {
        let mode = self.catalog.parse_selection(id)?;
        self.set_mode(mode)
    }

    /// Replace the live custom prompt; already captured photos keep theirs
    pub fn set_custom_prompt(&self, text: impl Into<String>) {
        let text = text.into();
        self.shared.apply(|state| state.set_custom_prompt(text));
    }

    /// Closing the editor with a blank prompt leaves custom mode
    pub fn close_custom_prompt(&self) {
        let catalog = &self.catalog;
        self.shared.apply(|state| state.close_custom_prompt(catalog));
    }

    // ========== Assembly ==========

    /// Assemble the outputs of all ready photos, in capture order.
    ///
    /// The set of frames is fixed here; later captures or deletions do
    /// not change what the running assembly receives.
    pub fn assemble(&self) -> Result<(), BoothError> {
        let (ticket, frames) = self.shared.try_update(|state| state.begin_assembly())?;
        tracing::info!(ticket, frames = frames.len(), "🎞️ Assembling");

        let guard = TaskGuard::new(&self.shared);
        let gateway = Arc::clone(&self.assembler);
        tokio::spawn(async move {
            let shared = &guard.0;
            let call = tokio::spawn(async move { gateway.assemble(frames).await });
            let outcome = match call.await {
                Ok(result) => result,
                Err(e) => Err(GatewayError::Join(e.to_string())),
            };

            let outcome = outcome.map_err(|e| {
                tracing::warn!(ticket, "Assembly failed: {e}");
                e.to_string()
            });

            if !shared.apply(|state| state.finish_assembly(ticket, outcome)) {
                tracing::debug!(ticket, "Discarding result of dismissed assembly");
            }
        });
        Ok(())
    }

    /// Drop the assembly result (or forget a running one)
    pub fn dismiss_assembly(&self) {
        self.shared.apply(|state| state.dismiss_assembly());
    }

    /// Gateway calls whose results have not been applied or discarded yet
    pub fn outstanding(&self) -> usize {
        *self.shared.outstanding.borrow()
    }

    /// Wait until every gateway task has rejoined, then return the state.
    ///
    /// A gateway that never answers keeps this waiting forever.
    pub async fn settled(&self) -> SessionState {
        let mut outstanding = self.shared.outstanding.subscribe();
        // Only fails once the sender is dropped, and `self` holds it
        let _ = outstanding.wait_for(|&count| count == 0).await;
        self.snapshot()
    }
}
