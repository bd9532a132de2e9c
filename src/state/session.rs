//! The mutable session core
//!
//! `SessionState` owns every photo record, the active mode, the custom
//! prompt text and the assembly state. Its mutators are crate-private:
//! only the orchestrator writes, everyone else reads snapshots.
//!
//! Records are always addressed by `PhotoId`, never by position, so a
//! deletion can't shift a late completion onto the wrong photo.

use rand::Rng;

use super::data::{Artifact, AssemblyState, Frame, PhotoId, PhotoRecord, PhotoStatus};
use super::mode::{ModeSelection, ResolvedMode};
use crate::catalog::ModeCatalog;
use crate::error::BoothError;

/// Minimum number of ready photos an assembly needs
pub const MIN_ASSEMBLY_PHOTOS: usize = 2;

/// Everything a renderer needs to draw the booth
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Capture order; only deletion removes entries
    photos: Vec<PhotoRecord>,
    /// Mode used for the next capture
    active_mode: ModeSelection,
    /// Live-edited text for custom mode
    custom_prompt: String,
    assembly: AssemblyState,
    /// Reason the last assembly failed, until the next attempt or dismissal
    assembly_error: Option<String>,
    next_ticket: u64,
    /// Bumped once per logical change
    revision: u64,
}

impl SessionState {
    pub fn new(active_mode: ModeSelection) -> Self {
        Self {
            photos: Vec::new(),
            active_mode,
            custom_prompt: String::new(),
            assembly: AssemblyState::Idle,
            assembly_error: None,
            next_ticket: 0,
            revision: 0,
        }
    }

    // ========== Queries ==========

    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    /// Look up a record; stale ids simply return `None`
    pub fn photo(&self, id: PhotoId) -> Option<&PhotoRecord> {
        self.photos.iter().find(|photo| photo.id == id)
    }

    pub fn active_mode(&self) -> &ModeSelection {
        &self.active_mode
    }

    pub fn custom_prompt(&self) -> &str {
        &self.custom_prompt
    }

    pub fn assembly(&self) -> &AssemblyState {
        &self.assembly
    }

    pub fn assembly_error(&self) -> Option<&str> {
        self.assembly_error.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn ready_count(&self) -> usize {
        self.photos.iter().filter(|photo| photo.status.is_ready()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.photos.iter().filter(|photo| photo.status.is_pending()).count()
    }

    /// Whether `assemble` would currently be accepted
    pub fn can_assemble(&self) -> bool {
        self.ready_count() >= MIN_ASSEMBLY_PHOTOS && !self.assembly.is_in_progress()
    }

    /// Outputs of all ready photos, in capture order
    pub fn ready_outputs(&self) -> Vec<Frame> {
        self.photos
            .iter()
            .filter_map(|photo| photo.output().cloned())
            .collect()
    }

    /// Resolve the active mode for a new photo.
    ///
    /// Random picks a concrete catalog entry; custom snapshots the prompt
    /// text and rejects it when blank. Returns the resolved mode together
    /// with the instruction to send.
    pub fn resolve_next_mode<R: Rng + ?Sized>(
        &self,
        catalog: &ModeCatalog,
        rng: &mut R,
    ) -> Result<(ResolvedMode, String), BoothError> {
        match &self.active_mode {
            ModeSelection::Random => {
                let picked = catalog.pick_random_with(rng);
                Ok((
                    ResolvedMode::Catalog(picked.id.clone()),
                    picked.instruction.clone(),
                ))
            }
            ModeSelection::Custom => {
                if self.custom_prompt.trim().is_empty() {
                    return Err(BoothError::EmptyInstruction);
                }
                let text = self.custom_prompt.clone();
                Ok((ResolvedMode::Custom(text.clone()), text))
            }
            ModeSelection::Catalog(id) => {
                let entry = catalog
                    .get(id)
                    .ok_or_else(|| BoothError::UnknownMode(id.clone()))?;
                Ok((ResolvedMode::Catalog(id.clone()), entry.instruction.clone()))
            }
        }
    }

    // ========== Mutations (orchestrator only) ==========

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    pub(crate) fn push_photo(&mut self, record: PhotoRecord) {
        self.photos.push(record);
    }

    /// Remove a record without reordering the survivors
    pub(crate) fn remove_photo(&mut self, id: PhotoId) -> bool {
        let before = self.photos.len();
        self.photos.retain(|photo| photo.id != id);
        self.photos.len() != before
    }

    /// Apply a transformation outcome to its record.
    ///
    /// Only a pending record is updated; a deleted or already settled
    /// record is left alone and `false` is returned.
    pub(crate) fn complete_photo(&mut self, id: PhotoId, outcome: Result<Frame, String>) -> bool {
        let Some(photo) = self.photos.iter_mut().find(|photo| photo.id == id) else {
            return false;
        };
        if !photo.status.is_pending() {
            return false;
        }

        photo.status = match outcome {
            Ok(output) => PhotoStatus::Ready { output },
            Err(reason) => PhotoStatus::Failed { reason },
        };
        true
    }

    pub(crate) fn set_active_mode(&mut self, mode: ModeSelection) -> bool {
        if self.active_mode == mode {
            return false;
        }
        self.active_mode = mode;
        true
    }

    pub(crate) fn set_custom_prompt(&mut self, text: String) -> bool {
        if self.custom_prompt == text {
            return false;
        }
        self.custom_prompt = text;
        true
    }

    /// Leaving the prompt editor with nothing typed falls back to the
    /// first catalog mode
    pub(crate) fn close_custom_prompt(&mut self, catalog: &ModeCatalog) -> bool {
        if self.active_mode == ModeSelection::Custom && self.custom_prompt.trim().is_empty() {
            self.active_mode = ModeSelection::Catalog(catalog.first().id.clone());
            return true;
        }
        false
    }

    /// Check preconditions, flip to `InProgress` and snapshot the outputs.
    ///
    /// Returns the ticket of this run and the frames to assemble.
    pub(crate) fn begin_assembly(&mut self) -> Result<(u64, Vec<Frame>), BoothError> {
        if self.assembly.is_in_progress() {
            return Err(BoothError::AssemblyAlreadyInProgress);
        }
        let ready = self.ready_count();
        if ready < MIN_ASSEMBLY_PHOTOS {
            return Err(BoothError::InsufficientReadyPhotos { ready });
        }

        let frames = self.ready_outputs();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.assembly = AssemblyState::InProgress {
            ticket,
            frames: frames.len(),
        };
        self.assembly_error = None;
        Ok((ticket, frames))
    }

    /// Apply an assembly outcome if `ticket` is still the run in progress
    pub(crate) fn finish_assembly(&mut self, ticket: u64, outcome: Result<Artifact, String>) -> bool {
        match self.assembly {
            AssemblyState::InProgress { ticket: current, .. } if current == ticket => {}
            _ => return false,
        }

        match outcome {
            Ok(artifact) => self.assembly = AssemblyState::Ready(artifact),
            Err(reason) => {
                self.assembly = AssemblyState::Idle;
                self.assembly_error = Some(reason);
            }
        }
        true
    }

    pub(crate) fn dismiss_assembly(&mut self) -> bool {
        if self.assembly == AssemblyState::Idle && self.assembly_error.is_none() {
            return false;
        }
        self.assembly = AssemblyState::Idle;
        self.assembly_error = None;
        true
    }
}
