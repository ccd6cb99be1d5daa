// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pending user-visible events: subscription requests, room invitations.
//!
//! Each event has a short id the user answers with (`accept`, `reject`,
//! `ignore`), an optional deadline, and a callback deciding what the
//! answer does.  On non-user contexts (timeout, cancel) the event is
//! always destroyed; on user contexts the callback may keep it alive.

use jid::{BareJid, Jid};

use crate::session::Session;

/// Events without an explicit deadline linger for five days.
pub const EVS_MAX_TIMEOUT: i64 = 432_000;

/// How an event got resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventContext {
    /// The deadline passed.
    Timeout,
    /// The user ignored (or the system cancelled) the event.
    Cancel,
    /// The user accepted.
    Accept,
    /// The user rejected.
    Reject,
}

impl EventContext {
    /// User contexts are the ones an explicit answer produces.
    pub fn is_user(self) -> bool {
        matches!(self, EventContext::Accept | EventContext::Reject)
    }
}

/// What the event is about, for display purposes.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Somebody asked to subscribe to our presence.
    Subscription {
        /// Who is asking.
        jid: BareJid,
    },
    /// Somebody invited us to a room.
    RoomInvite {
        /// The room.
        room: BareJid,
        /// The inviter, when known.
        from: Option<Jid>,
        /// Room password from the invitation.
        password: Option<String>,
    },
    /// Anything else.
    Other,
}

/// The callback returns `true` to destroy the event.
pub type EventCallback = Box<dyn FnMut(&mut Session, EventContext) -> bool + Send>;

struct EventEntry {
    id: String,
    description: String,
    expires: i64,
    payload: EventPayload,
    callback: EventCallback,
}

/// The pending-event table.
#[derive(Default)]
pub struct EventRegistry {
    events: Vec<EventEntry>,
    counter: u64,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> EventRegistry {
        EventRegistry::default()
    }

    /// Registers an event; `id` of `None` allocates a numeric one.  The
    /// returned id is what the user answers with.  `timeout` of zero
    /// falls back to [`EVS_MAX_TIMEOUT`].
    pub fn add(
        &mut self,
        id: Option<String>,
        description: String,
        now: i64,
        timeout: i64,
        payload: EventPayload,
        callback: EventCallback,
    ) -> Option<String> {
        let id = match id {
            Some(id) => {
                if self.find(&id).is_some() {
                    return None;
                }
                id
            }
            None => loop {
                self.counter = self.counter.wrapping_add(1);
                let candidate = self.counter.to_string();
                if self.find(&candidate).is_none() {
                    break candidate;
                }
            },
        };
        let timeout = if timeout > 0 { timeout } else { EVS_MAX_TIMEOUT };
        self.events.push(EventEntry {
            id: id.clone(),
            description,
            expires: now + timeout,
            payload,
            callback,
        });
        Some(id)
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }

    /// Resolves an event by id.  Returns `false` when the id is unknown.
    pub fn resolve(registry_owner: &mut Session, id: &str, context: EventContext) -> bool {
        let Some(index) = registry_owner.events.find(id) else {
            return false;
        };
        let mut entry = registry_owner.events.events.remove(index);
        let destroy = (entry.callback)(registry_owner, context) || !context.is_user();
        if !destroy {
            registry_owner.events.events.insert(index.min(registry_owner.events.events.len()), entry);
        }
        true
    }

    /// Fires timeouts; returns how many events expired.
    pub fn sweep(registry_owner: &mut Session, now: i64) -> usize {
        let mut fired = 0;
        loop {
            let Some(index) = registry_owner
                .events
                .events
                .iter()
                .position(|event| event.expires <= now)
            else {
                break;
            };
            let mut entry = registry_owner.events.events.remove(index);
            (entry.callback)(registry_owner, EventContext::Timeout);
            fired += 1;
        }
        fired
    }

    /// Lists `(id, description)` pairs for display.
    pub fn list(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .map(|event| (event.id.clone(), event.description.clone()))
            .collect()
    }

    /// The payload of an event, for display.
    pub fn payload(&self, id: &str) -> Option<&EventPayload> {
        self.find(id).map(|index| &self.events[index].payload)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event is pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
