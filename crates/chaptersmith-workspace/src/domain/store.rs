//! Number-keyed chapter store for the open project.

use std::collections::BTreeMap;

use chaptersmith_core::chapter::Chapter;
use chaptersmith_core::error::DomainError;

use super::lifecycle::{ChapterPhase, Lifecycle, LifecycleEvent};

#[derive(Debug, Clone)]
struct Slot {
    record: Chapter,
    lifecycle: Lifecycle,
    revision: u64,
}

/// Revision of every chapter at the moment a full reload was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revisions(BTreeMap<u32, u64>);

/// Local view of one project's chapters.
///
/// Records are keyed by chapter number and only ever replaced by a record the
/// server confirmed. Every replacement stamps the slot with a new revision.
/// Once initialized the key set is exactly `1..=chapter_count`.
#[derive(Debug, Clone)]
pub struct ChapterStore {
    chapter_count: u32,
    next_revision: u64,
    slots: BTreeMap<u32, Slot>,
}

impl ChapterStore {
    /// Creates an uninitialized store for a project of `chapter_count` chapters.
    #[must_use]
    pub fn new(chapter_count: u32) -> Self {
        Self {
            chapter_count,
            next_revision: 1,
            slots: BTreeMap::new(),
        }
    }

    /// Captures the current revision of every chapter.
    #[must_use]
    pub fn revisions(&self) -> Revisions {
        Revisions(
            self.slots
                .iter()
                .map(|(number, slot)| (*number, slot.revision))
                .collect(),
        )
    }

    /// Replaces the chapter list with the one the server returned for a
    /// reload requested at `since`.
    ///
    /// A chapter whose record changed after `since`, or for which `is_busy`
    /// holds, keeps its local slot. Other known chapters take the server
    /// record and reconcile their lifecycle against its status; new chapters
    /// start from their server status. Returns the numbers that were kept.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the numbers are not exactly
    /// `1..=chapter_count`. The store is unchanged on error.
    pub fn replace_all(
        &mut self,
        chapters: Vec<Chapter>,
        since: &Revisions,
        is_busy: impl Fn(u32) -> bool,
    ) -> Result<Vec<u32>, DomainError> {
        let mut numbers: Vec<u32> = chapters.iter().map(|chapter| chapter.number).collect();
        numbers.sort_unstable();
        if !numbers.iter().copied().eq(1..=self.chapter_count) {
            return Err(DomainError::Validation(format!(
                "backend returned chapters {numbers:?}, expected 1..={}",
                self.chapter_count
            )));
        }

        let mut next_revision = self.next_revision;
        let mut kept = Vec::new();
        let mut slots = BTreeMap::new();
        for record in chapters {
            let number = record.number;
            let slot = match self.slots.get(&number) {
                Some(existing)
                    if is_busy(number) || since.0.get(&number) != Some(&existing.revision) =>
                {
                    kept.push(number);
                    existing.clone()
                }
                existing => {
                    let lifecycle = match existing {
                        Some(existing) => {
                            let mut lifecycle = existing.lifecycle;
                            lifecycle.apply(number, LifecycleEvent::Reconciled(record.status))?;
                            lifecycle
                        }
                        None => Lifecycle::from_status(record.status),
                    };
                    let revision = next_revision;
                    next_revision += 1;
                    Slot {
                        record,
                        lifecycle,
                        revision,
                    }
                }
            };
            slots.insert(number, slot);
        }
        self.slots = slots;
        self.next_revision = next_revision;
        kept.sort_unstable();
        Ok(kept)
    }

    /// Replaces the record with the same number as `record`.
    ///
    /// Only that slot changes; the lifecycle is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterNotFound` if no chapter has that number.
    pub fn merge(&mut self, record: Chapter) -> Result<&Chapter, DomainError> {
        let slot = self
            .slots
            .get_mut(&record.number)
            .ok_or(DomainError::ChapterNotFound(record.number))?;
        slot.record = record;
        slot.revision = self.next_revision;
        self.next_revision += 1;
        Ok(&slot.record)
    }

    /// Returns the record of chapter `number`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterNotFound` if no chapter has that number.
    pub fn get(&self, number: u32) -> Result<&Chapter, DomainError> {
        self.slots
            .get(&number)
            .map(|slot| &slot.record)
            .ok_or(DomainError::ChapterNotFound(number))
    }

    /// Returns the lifecycle phase of chapter `number`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterNotFound` if no chapter has that number.
    pub fn phase(&self, number: u32) -> Result<ChapterPhase, DomainError> {
        self.slots
            .get(&number)
            .map(|slot| slot.lifecycle.phase())
            .ok_or(DomainError::ChapterNotFound(number))
    }

    /// Feeds a lifecycle event to chapter `number`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterNotFound` for an unknown chapter, or the
    /// lifecycle's own error if the phase rejects the event.
    pub fn transition(
        &mut self,
        number: u32,
        event: LifecycleEvent,
    ) -> Result<ChapterPhase, DomainError> {
        let slot = self
            .slots
            .get_mut(&number)
            .ok_or(DomainError::ChapterNotFound(number))?;
        let phase = slot.lifecycle.apply(number, event)?;
        tracing::debug!(chapter = number, ?event, %phase, "chapter transition");
        Ok(phase)
    }

    /// Iterates chapters in number order with their phases.
    pub fn iter(&self) -> impl Iterator<Item = (&Chapter, ChapterPhase)> {
        self.slots
            .values()
            .map(|slot| (&slot.record, slot.lifecycle.phase()))
    }
}
