//! Per-chapter in-flight request tracking.
//!
//! Every mutation of a chapter holds a ticket. A newer update on the same
//! chapter cancels the older ticket, so a late response can never overwrite
//! newer local state. A generation is exclusive: nothing else may start on
//! its chapter until it settles. Chapters never block each other.

use std::collections::HashMap;

use chaptersmith_core::error::DomainError;
use tokio_util::sync::CancellationToken;

/// The kind of request a ticket guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A generation request.
    Generate,
    /// A partial update (save or POV override).
    Update,
}

/// Permission to apply the response of one request to one chapter.
#[derive(Debug, Clone)]
pub struct Ticket {
    /// The chapter the request targets.
    pub number: u32,
    /// What the request does.
    pub kind: OperationKind,
    id: u64,
    cancel: CancellationToken,
}

impl Ticket {
    /// Token cancelled when this ticket is superseded or its session closes.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[derive(Debug)]
struct Active {
    id: u64,
    kind: OperationKind,
    cancel: CancellationToken,
}

/// In-flight requests of one project session, at most one per chapter.
#[derive(Debug)]
pub struct InFlightRegistry {
    session: CancellationToken,
    next_id: u64,
    active: HashMap<u32, Active>,
}

impl InFlightRegistry {
    /// Creates a registry whose tickets are all cancelled with `session`.
    #[must_use]
    pub fn new(session: CancellationToken) -> Self {
        Self {
            session,
            next_id: 1,
            active: HashMap::new(),
        }
    }

    /// Issues a ticket for a new request on chapter `number`.
    ///
    /// An update already in flight for the chapter is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterBusy` while a generation for the chapter
    /// is in flight, and `DomainError::Cancelled` if the session is already
    /// closed.
    pub fn begin(&mut self, number: u32, kind: OperationKind) -> Result<Ticket, DomainError> {
        if self.session.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self
            .active
            .get(&number)
            .is_some_and(|active| active.kind == OperationKind::Generate)
        {
            return Err(DomainError::ChapterBusy(number));
        }

        if let Some(stale) = self.active.remove(&number) {
            stale.cancel.cancel();
            tracing::warn!(chapter = number, next = ?kind, "superseding in-flight update");
        }

        let id = self.next_id;
        self.next_id += 1;
        let cancel = self.session.child_token();
        self.active.insert(
            number,
            Active {
                id,
                kind,
                cancel: cancel.clone(),
            },
        );

        Ok(Ticket {
            number,
            kind,
            id,
            cancel,
        })
    }

    /// Whether any request for chapter `number` is in flight.
    #[must_use]
    pub fn is_active(&self, number: u32) -> bool {
        self.active.contains_key(&number)
    }

    /// Whether `ticket` is still the newest request for its chapter.
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        !ticket.cancel.is_cancelled()
            && self
                .active
                .get(&ticket.number)
                .is_some_and(|active| active.id == ticket.id)
    }

    /// Retires `ticket`, returning whether its response may be applied.
    pub fn finish(&mut self, ticket: &Ticket) -> bool {
        let current = self.is_current(ticket);
        if current {
            self.active.remove(&ticket.number);
        }
        current
    }

    /// Cancels every request of the session.
    pub fn cancel_all(&mut self) {
        self.session.cancel();
        self.active.clear();
    }
}
