// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Outgoing chat-state machine (typing notifications).
//!
//! Until a peer proves it understands chat states we send nothing beyond
//! the probing `<active/>` on a real message; once a resource is marked
//! `ok` we emit transitions, never repeating the state we last sent.

use causerie_stanza::chatstates::ChatState;
use causerie_stanza::message::Message;

use crate::roster::{ChatStateSupport, OutChatState};
use crate::session::{ComposeState, Session};

fn wire_state(state: OutChatState) -> ChatState {
    match state {
        OutChatState::Active => ChatState::Active,
        OutChatState::Composing => ChatState::Composing,
        OutChatState::Paused => ChatState::Paused,
    }
}

/// Attaches the probing/confirming chat state to an outgoing message and
/// updates the per-resource record.  Mirrors the rule that a first send
/// flips `unknown` to `probed`, and nothing else is sent until the peer
/// replies with a state of its own.
pub(crate) fn decorate_outgoing(
    session: &mut Session,
    bare: &str,
    resource_name: &str,
    message: &mut Message,
) {
    if session.config.disable_chatstates {
        return;
    }
    let Some(resource) = session.roster.touch_resource(bare, resource_name) else {
        // Not a user entry at all; nothing to track.
        message.add_payload(ChatState::Active);
        return;
    };
    match resource.chat_states.support {
        ChatStateSupport::Unknown => {
            message.add_payload(ChatState::Active);
            resource.chat_states.support = ChatStateSupport::Probed;
            resource.chat_states.last_sent = Some(OutChatState::Active);
        }
        ChatStateSupport::Ok => {
            message.add_payload(ChatState::Active);
            resource.chat_states.last_sent = Some(OutChatState::Active);
        }
        ChatStateSupport::Probed | ChatStateSupport::Unsupported => {}
    }
}

/// Records the evidence carried by an inbound message: a chat state marks
/// the resource `ok`; a body without one downgrades a probed resource to
/// `unsupported`.
pub(crate) fn note_incoming(
    session: &mut Session,
    bare: &str,
    resource_name: &str,
    state: Option<&ChatState>,
    has_body: bool,
) {
    let Some(resource) = session.roster.touch_resource(bare, resource_name) else {
        return;
    };
    match state {
        Some(state) => {
            resource.chat_states.support = ChatStateSupport::Ok;
            resource.chat_states.last_rcvd = Some(format!("{:?}", state).to_lowercase());
        }
        None if has_body => {
            if matches!(
                resource.chat_states.support,
                ChatStateSupport::Probed | ChatStateSupport::Unknown
            ) {
                resource.chat_states.support = ChatStateSupport::Unsupported;
            }
        }
        None => {}
    }
}

/// Sends a standalone chat state to a contact.  The state goes to the
/// highest-priority resource with proven support; an `active` state is
/// also fanned out to other supporting resources which are not already
/// `active`.  A no-op for identical consecutive states.
pub(crate) fn send_chat_state(session: &mut Session, bare: &str, state: OutChatState) {
    if session.config.disable_chatstates || !session.is_online() {
        return;
    }
    let Some(key) = session.roster.find(bare) else { return };
    let Some(entry) = session.roster.get(key) else { return };
    if !matches!(entry.data, crate::roster::EntryData::User(_)) {
        return;
    }
    let current = entry
        .current_resource()
        .map(|resource| resource.name.clone());
    let targets: Vec<String> = entry
        .resources()
        .iter()
        .filter(|resource| resource.chat_states.support == ChatStateSupport::Ok)
        .filter(|resource| {
            let is_current = Some(&resource.name) == current.as_ref();
            if is_current {
                resource.chat_states.last_sent != Some(state)
            } else {
                // Secondary resources only get re-activated.
                state == OutChatState::Active
                    && resource.chat_states.last_sent != Some(OutChatState::Active)
            }
        })
        .map(|resource| resource.name.clone())
        .collect();
    for name in targets {
        let to = if name.is_empty() {
            bare.parse()
        } else {
            format!("{}/{}", bare, name).parse()
        };
        let Ok(to) = to else { continue };
        let mut message = Message::chat(to);
        message.add_payload(wire_state(state));
        session.send_element(message);
        if let Some(resource) = session.roster.resource_mut(bare, &name) {
            resource.chat_states.last_sent = Some(state);
        }
    }
}

/// Input-line hook: the user started or stopped composing to `bare`.
pub(crate) fn set_composing(session: &mut Session, bare: &str, typing: bool, now: i64) {
    if typing {
        let restart = match &session.compose {
            Some(compose) => !compose.jid.eq_ignore_ascii_case(bare) || compose.paused_sent,
            None => true,
        };
        if restart {
            if let Some(previous) = session.compose.take() {
                if !previous.jid.eq_ignore_ascii_case(bare) {
                    send_chat_state(session, &previous.jid.clone(), OutChatState::Active);
                }
            }
            send_chat_state(session, bare, OutChatState::Composing);
            session.compose = Some(ComposeState {
                jid: bare.to_owned(),
                since: now,
                paused_sent: false,
            });
        } else if let Some(compose) = &mut session.compose {
            compose.since = now;
        }
    } else if let Some(compose) = session.compose.take() {
        send_chat_state(session, &compose.jid.clone(), OutChatState::Active);
    }
}

/// Timer hook: composing for longer than the timeout sends `paused`.
pub(crate) fn compose_tick(session: &mut Session, now: i64) {
    let timeout = session.config.composing_timeout.max(1);
    let fire = match &session.compose {
        Some(compose) => !compose.paused_sent && now - compose.since >= timeout,
        None => false,
    };
    if fire {
        let jid = session
            .compose
            .as_ref()
            .map(|compose| compose.jid.clone())
            .unwrap_or_default();
        send_chat_state(session, &jid, OutChatState::Paused);
        if let Some(compose) = &mut session.compose {
            compose.paused_sent = true;
        }
    }
}
