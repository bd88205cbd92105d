//! Queue State
//!
//! Storage for everything accepted before the transport is ready: request
//! handler registrations, event listener registrations, outgoing requests and
//! outgoing events. `QueueState` is not synchronized itself; the bridge keeps
//! it behind the same mutex as the readiness gate.

use core::fmt;
use std::collections::{BTreeMap, HashMap, VecDeque};

use rnbridge_core::{
    BridgeEvent, BridgeRequest, EventListenerRef, Identifier, RequestHandlerRef,
    ResponseListenerRef,
};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Queued Entries
// ----------------------------------------------------------------------------

/// A request handler waiting to be registered with the transport
pub struct HandlerRegistration {
    pub id: Identifier,
    pub name: String,
    pub handler: RequestHandlerRef,
}

/// An event listener waiting to be registered with the transport
pub struct ListenerRegistration {
    pub id: Identifier,
    pub name: String,
    pub listener: EventListenerRef,
}

/// A request waiting to be sent, with the listener that receives its response
pub struct PendingRequest {
    pub request: BridgeRequest,
    pub listener: ResponseListenerRef,
}

/// Phases of the flush, in the order they are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlushPhase {
    Handlers,
    Listeners,
    Requests,
    Events,
}

/// One entry taken off the queues during the flush
pub enum QueuedEntry {
    Handler(HandlerRegistration),
    Listener(ListenerRegistration),
    Request(PendingRequest),
    Event(BridgeEvent),
}

impl QueuedEntry {
    pub fn phase(&self) -> FlushPhase {
        match self {
            QueuedEntry::Handler(_) => FlushPhase::Handlers,
            QueuedEntry::Listener(_) => FlushPhase::Listeners,
            QueuedEntry::Request(_) => FlushPhase::Requests,
            QueuedEntry::Event(_) => FlushPhase::Events,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            QueuedEntry::Handler(reg) => &reg.name,
            QueuedEntry::Listener(reg) => &reg.name,
            QueuedEntry::Request(pending) => &pending.request.name,
            QueuedEntry::Event(event) => &event.name,
        }
    }
}

impl fmt::Debug for QueuedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueuedEntry::Handler(reg) => write!(f, "Handler({}, {})", reg.name, reg.id),
            QueuedEntry::Listener(reg) => write!(f, "Listener({}, {})", reg.name, reg.id),
            QueuedEntry::Request(pending) => write!(f, "Request({})", pending.request),
            QueuedEntry::Event(event) => write!(f, "Event({})", event),
        }
    }
}

// ----------------------------------------------------------------------------
// Summary
// ----------------------------------------------------------------------------

/// Snapshot of the queues plus overwrite counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSummary {
    pub handlers: usize,
    pub listeners: usize,
    pub requests: usize,
    pub events: usize,
    /// Queued handlers replaced by a later registration for the same request name
    pub displaced_handlers: u64,
    /// Queued requests whose response listener was replaced by a re-send
    pub replaced_requests: u64,
}

impl PendingSummary {
    pub fn total(&self) -> usize {
        self.handlers + self.listeners + self.requests + self.events
    }
}

// ----------------------------------------------------------------------------
// Queue State
// ----------------------------------------------------------------------------

struct ListenerGroup {
    name: String,
    registrations: BTreeMap<u64, ListenerRegistration>,
}

/// The four pre-readiness queues
///
/// - handlers: one registration per request name, in first-registration order
/// - listeners: grouped by event name, groups in first-registration order
/// - requests: insertion order, unique by request id
/// - events: FIFO
///
/// Ordered entries are keyed by a monotonically increasing sequence number
/// and indexed by name and identifier, so queuing, replacing and removing an
/// entry never scans the queue.
#[derive(Default)]
pub struct QueueState {
    next_seq: u64,
    handlers: BTreeMap<u64, HandlerRegistration>,
    handler_names: HashMap<String, u64>,
    handler_ids: HashMap<Identifier, u64>,
    listener_groups: BTreeMap<u64, ListenerGroup>,
    group_names: HashMap<String, u64>,
    /// Identifier -> (group sequence, registration sequence)
    listener_ids: HashMap<Identifier, (u64, u64)>,
    listener_count: usize,
    requests: BTreeMap<u64, PendingRequest>,
    request_ids: HashMap<Uuid, u64>,
    events: VecDeque<BridgeEvent>,
    displaced_handlers: u64,
    replaced_requests: u64,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Queue a handler registration
    ///
    /// A registration for a request name that is already queued replaces the
    /// earlier one in place. The displaced registration is returned and will
    /// never reach the transport.
    pub fn push_handler(&mut self, registration: HandlerRegistration) -> Option<HandlerRegistration> {
        let id = registration.id;
        let seq = match self.handler_names.get(&registration.name).copied() {
            Some(seq) => seq,
            None => {
                let seq = self.next_seq();
                self.handler_names.insert(registration.name.clone(), seq);
                self.handler_ids.insert(id, seq);
                self.handlers.insert(seq, registration);
                return None;
            }
        };

        self.handler_ids.insert(id, seq);
        let displaced = self.handlers.insert(seq, registration)?;
        if displaced.id != id {
            self.handler_ids.remove(&displaced.id);
        }
        self.displaced_handlers += 1;
        Some(displaced)
    }

    /// Queue a listener registration behind earlier ones for the same event name
    pub fn push_listener(&mut self, registration: ListenerRegistration) {
        let seq = self.next_seq();
        let group_seq = *self
            .group_names
            .entry(registration.name.clone())
            .or_insert(seq);
        self.listener_ids.insert(registration.id, (group_seq, seq));
        self.listener_groups
            .entry(group_seq)
            .or_insert_with(|| ListenerGroup {
                name: registration.name.clone(),
                registrations: BTreeMap::new(),
            })
            .registrations
            .insert(seq, registration);
        self.listener_count += 1;
    }

    /// Queue an outgoing request
    ///
    /// Re-queuing a request with the same id keeps its position and swaps in
    /// the new response listener; the replaced listener is returned.
    pub fn push_request(&mut self, pending: PendingRequest) -> Option<ResponseListenerRef> {
        if let Some(slot) = self
            .request_ids
            .get(&pending.request.id)
            .and_then(|seq| self.requests.get_mut(seq))
        {
            self.replaced_requests += 1;
            slot.request = pending.request;
            return Some(std::mem::replace(&mut slot.listener, pending.listener));
        }

        let seq = self.next_seq();
        self.request_ids.insert(pending.request.id, seq);
        self.requests.insert(seq, pending);
        None
    }

    /// Queue an outgoing event
    pub fn push_event(&mut self, event: BridgeEvent) {
        self.events.push_back(event);
    }

    /// Remove a queued listener registration by identifier
    ///
    /// The event name group is dropped once its last registration is removed.
    pub fn remove_listener(&mut self, id: Identifier) -> Option<EventListenerRef> {
        let (group_seq, seq) = self.listener_ids.remove(&id)?;
        let group = self.listener_groups.get_mut(&group_seq)?;
        let removed = group.registrations.remove(&seq)?;
        self.listener_count -= 1;

        if group.registrations.is_empty() {
            if let Some(group) = self.listener_groups.remove(&group_seq) {
                self.group_names.remove(&group.name);
            }
        }
        Some(removed.listener)
    }

    /// Remove a queued handler registration by identifier
    pub fn remove_handler(&mut self, id: Identifier) -> Option<RequestHandlerRef> {
        let seq = self.handler_ids.remove(&id)?;
        let removed = self.handlers.remove(&seq)?;
        self.handler_names.remove(&removed.name);
        Some(removed.handler)
    }

    /// Whether a handler registration with this identifier is queued
    pub fn contains_handler(&self, id: Identifier) -> bool {
        self.handler_ids.contains_key(&id)
    }

    /// Take the next entry in flush order
    pub fn pop_next(&mut self) -> Option<QueuedEntry> {
        if let Some((_, registration)) = self.handlers.pop_first() {
            self.handler_names.remove(&registration.name);
            self.handler_ids.remove(&registration.id);
            return Some(QueuedEntry::Handler(registration));
        }

        if let Some(mut group) = self.listener_groups.first_entry() {
            let registration = group
                .get_mut()
                .registrations
                .pop_first()
                .map(|(_, registration)| registration);
            if group.get().registrations.is_empty() {
                let emptied = group.remove();
                self.group_names.remove(&emptied.name);
            }
            if let Some(registration) = registration {
                self.listener_ids.remove(&registration.id);
                self.listener_count -= 1;
                return Some(QueuedEntry::Listener(registration));
            }
        }

        if let Some((_, pending)) = self.requests.pop_first() {
            self.request_ids.remove(&pending.request.id);
            return Some(QueuedEntry::Request(pending));
        }

        self.events.pop_front().map(QueuedEntry::Event)
    }

    /// Discard everything still queued, returning what was discarded
    pub fn clear(&mut self) -> PendingSummary {
        let discarded = self.summary();
        self.handlers.clear();
        self.handler_names.clear();
        self.handler_ids.clear();
        self.listener_groups.clear();
        self.group_names.clear();
        self.listener_ids.clear();
        self.listener_count = 0;
        self.requests.clear();
        self.request_ids.clear();
        self.events.clear();
        discarded
    }

    pub fn summary(&self) -> PendingSummary {
        PendingSummary {
            handlers: self.handlers.len(),
            listeners: self.listener_count,
            requests: self.requests.len(),
            events: self.events.len(),
            displaced_handlers: self.displaced_handlers,
            replaced_requests: self.replaced_requests,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len() + self.listener_count + self.requests.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueState")
            .field("summary", &self.summary())
            .finish()
    }
}
