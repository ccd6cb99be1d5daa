// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::FullJid;

use crate::roster::Status;

/// Things the embedding UI wants to react to.  The renderer pulls lines
/// from the buffers itself; these events only say what turned stale.
#[derive(Debug, Clone)]
pub enum Event {
    /// The session is authenticated and bound.
    Online(FullJid),
    /// The session ended; the reason is human-readable when present.
    Disconnected(Option<String>),
    /// Authentication failed permanently; no reconnection is scheduled.
    AuthFailed(String),
    /// The roster or buddylist changed shape.
    RosterUpdated,
    /// One contact's presence or state changed.
    BuddyChanged(String),
    /// Lines were appended to a buffer.
    BufferUpdated(String),
    /// A message arrived; `highlight` marks own-nick mentions in rooms.
    MessageIn {
        /// Bare JID of the buffer it landed in.
        from: String,
        /// Whether the line was highlighted.
        highlight: bool,
    },
    /// A delivery receipt came back.
    ReceiptReceived {
        /// The message id being acknowledged.
        id: String,
        /// Who acknowledged.
        from: String,
    },
    /// A pending event awaits an answer (subscription, invitation).
    EventNew {
        /// Id to answer with.
        id: String,
        /// Human-readable description.
        description: String,
    },
    /// We are inside a room.
    RoomJoined(String),
    /// We left (or were removed from) a room.
    RoomLeft(String),
    /// A room topic changed.
    TopicChanged {
        /// The room.
        room: String,
        /// The new topic; `None` means cleared.
        topic: Option<String>,
    },
    /// Our own status changed (including autoaway flips).
    StatusChanged(Status, Option<String>),
}
