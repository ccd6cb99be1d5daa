// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The message path: envelopes, receipts, buffers and history on both
//! directions.

use jid::Jid;

use causerie_stanza::chatstates::ChatState;
use causerie_stanza::delay::Delay;
use causerie_stanza::message::{Message, MessageType};
use causerie_stanza::pgp::Encrypted;
use causerie_stanza::receipts;
use causerie_stanza::ns;

use crate::config::ContactCrypto;
use crate::crypto::OtrOutgoing;
use crate::error::Error;
use crate::event::Event;
use crate::hbuf::LineFlags;
use crate::histolog::MessageKind;
use crate::muc;
use crate::roster::{EntryData, Subscription};
use crate::session::Session;

/// The fixed placeholder body accompanying an encrypted payload.
const PGP_NOTICE: &str = "This message is PGP-encrypted.";

/// Sends a one-to-one (or room) message; the `say`/`say_to` verbs.
pub(crate) fn say_to(session: &mut Session, to: Jid, text: &str, now: i64) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let bare = to.to_bare().to_string();

    // Room messages go out bare, with the groupchat type and none of the
    // one-to-one machinery.
    let is_room = session
        .roster
        .find(&bare)
        .and_then(|key| session.roster.get(key))
        .map(|entry| matches!(entry.data, EntryData::Room(_)))
        .unwrap_or(false);
    if is_room && to.resource().is_none() {
        return muc::send_room_message(session, &bare, text, now);
    }

    // OTR gets the plain text first and may swallow the send entirely.
    let otr_out = session
        .otr
        .outgoing(&bare, text)
        .map_err(|e| Error::Encryption(e.to_string()))?;
    let (body, otr_encrypted) = match otr_out {
        OtrOutgoing::Suppress => return Ok(()),
        OtrOutgoing::Send(body) => {
            let was_rewritten = body != text;
            (body, was_rewritten)
        }
    };

    let crypto = session
        .config
        .crypto
        .get(&bare)
        .cloned()
        .unwrap_or_else(ContactCrypto::default);

    let id = session.iq.next_id(Some("msg"));
    let mut message = Message::chat(to.clone()).with_id(id.clone());
    let mut flags = LineFlags::OUT;

    // PGP envelope.
    if let Some(key_id) = crypto.pgp_key_id.as_ref().filter(|_| {
        session.pgp.enabled() && !crypto.disabled && !otr_encrypted
    }) {
        match session.pgp.encrypt(key_id, &body) {
            Ok(armored) => {
                message.body = Some(PGP_NOTICE.to_owned());
                message.add_payload(Encrypted { data: armored });
                flags = flags | LineFlags::PGP_CRYPT;
            }
            Err(e) => {
                if crypto.force {
                    return Err(Error::Encryption(e.to_string()));
                }
                session.log_line(
                    LineFlags::ERR,
                    &format!("Warning: cannot encrypt to <{}>, sending in clear ({})", bare, e),
                    now,
                );
                message.body = Some(body.clone());
            }
        }
    } else {
        if crypto.force && !otr_encrypted {
            return Err(Error::Encryption(format!(
                "encryption is enforced for <{}> but no key is usable",
                bare
            )));
        }
        message.body = Some(body.clone());
    }
    if otr_encrypted {
        flags = flags | LineFlags::OTR_CRYPT;
    }

    let resource_name = to
        .resource()
        .map(|resource| resource.as_str().to_owned())
        .or_else(|| {
            session
                .roster
                .find(&bare)
                .and_then(|key| session.roster.get(key))
                .and_then(|entry| entry.current_resource())
                .map(|resource| resource.name.clone())
        })
        .unwrap_or_default();

    // Delivery receipt request, only for resources known to grok them.
    if session.config.request_receipts {
        let caps_ver = session
            .roster
            .resource_mut(&bare, &resource_name)
            .and_then(|resource| resource.caps_ver.clone());
        let supported = caps_ver
            .map(|ver| session.caps.has_feature(&ver, ns::RECEIPTS))
            .unwrap_or(false);
        if supported {
            message.add_payload(receipts::Request);
            session
                .pending_receipts
                .insert(id.clone(), bare.clone());
        }
    }

    crate::chatstates::decorate_outgoing(session, &bare, &resource_name, &mut message);

    session.send_element(message);
    session.last_use = now;

    // The local echo always shows the plaintext.
    session.write_buffer(&bare, text, now, flags, 0, now);
    session
        .histolog
        .write_message(&bare, now, MessageKind::Send, text);
    Ok(())
}

/// Inbound message dispatch.
pub(crate) fn handle_message(session: &mut Session, message: Message, now: i64) {
    let Some(from) = message.from.clone() else {
        log::debug!("dropping message without a sender");
        return;
    };
    let bare = from.to_bare().to_string();

    if message.type_ == MessageType::Error {
        let description = message
            .error()
            .map(|error| error.describe())
            .unwrap_or_else(|| "unknown error".to_owned());
        session.write_buffer(
            &bare,
            &format!("Error message received: {}", description),
            now,
            LineFlags::ERR,
            0,
            now,
        );
        return;
    }

    // Room traffic branches off early.
    let is_room = session
        .roster
        .find(&bare)
        .and_then(|key| session.roster.get(key))
        .map(|entry| matches!(entry.data, EntryData::Room(_)))
        .unwrap_or(false);
    if message.type_ == MessageType::Groupchat || is_room {
        muc::handle_room_message(session, message, now);
        return;
    }

    // A mediated invitation turns into a pending event.
    if let Some(user_elem) = message.get_payload("x", ns::MUC_USER) {
        if user_elem.has_child("invite", ns::MUC_USER) {
            if let Ok(user) = causerie_stanza::muc::MucUser::try_from(user_elem.clone()) {
                if user.invite.is_some() {
                    muc::handle_invite(session, &bare, user, now);
                    return;
                }
            }
        }
    }

    // Local policy: drop strangers when configured to, before they leave
    // any trace in our state.
    let subscription = session
        .roster
        .find(&bare)
        .and_then(|key| session.roster.get(key))
        .and_then(|entry| match &entry.data {
            EntryData::User(user) => Some(user.subscription),
            _ => None,
        });
    if session.config.block_unsubscribed
        && !matches!(subscription, Some(Subscription::From) | Some(Subscription::Both))
    {
        log::info!("dropped message from unsubscribed sender <{}>", bare);
        return;
    }

    // A sender we know nothing about gets a local placeholder entry so
    // the buffer has a roster line to hang off.
    if message.body.is_some() && session.roster.find(&bare).is_none() {
        session.roster.add_user(
            &from.to_bare(),
            None,
            "",
            EntryData::User(crate::roster::UserData::default()),
            false,
        );
        session.push_ui(Event::RosterUpdated);
    }

    let resource_name = from
        .resource()
        .map(|resource| resource.as_str().to_owned())
        .unwrap_or_default();

    // Chat-state evidence, whether or not a body follows.
    let chat_state = message
        .payloads
        .iter()
        .filter(|payload| payload.ns() == ns::CHATSTATES)
        .find_map(|payload| ChatState::try_from(payload.clone()).ok());
    crate::chatstates::note_incoming(
        session,
        &bare,
        &resource_name,
        chat_state.as_ref(),
        message.body.is_some(),
    );
    if chat_state.is_some() {
        session.push_ui(Event::BuddyChanged(bare.clone()));
    }

    // Receipt bookkeeping both ways.
    if let Some(received) = message.get_payload("received", ns::RECEIPTS) {
        if let Ok(received) = receipts::Received::try_from(received.clone()) {
            if session.pending_receipts.remove(&received.id).is_some() {
                session.push_ui(Event::ReceiptReceived {
                    id: received.id,
                    from: bare.clone(),
                });
            }
            return;
        }
    }
    let wants_receipt = message.get_payload("request", ns::RECEIPTS).is_some();

    let Some(body) = message.body.clone() else {
        return;
    };

    // Decrypt: OTR first, then the PGP envelope.
    let mut flags = LineFlags::IN;
    let mut text = body;
    match session.otr.incoming(&bare, &text) {
        Ok(incoming) => {
            if incoming.was_encrypted {
                flags = flags | LineFlags::OTR_CRYPT;
            }
            text = incoming.text;
        }
        Err(e) => {
            session.write_buffer(
                &bare,
                &format!("Failed to decrypt an OTR message: {}", e),
                now,
                LineFlags::ERR,
                0,
                now,
            );
            return;
        }
    }
    if let Some(enc_elem) = message.get_payload("x", ns::ENCRYPTED) {
        if let Ok(enc) = Encrypted::try_from(enc_elem.clone()) {
            match session.pgp.decrypt(&enc.data) {
                Ok(plain) => {
                    text = plain;
                    flags = flags | LineFlags::PGP_CRYPT;
                }
                Err(e) => {
                    session.write_buffer(
                        &bare,
                        &format!("Unable to decrypt a PGP message: {}", e),
                        now,
                        LineFlags::ERR,
                        0,
                        now,
                    );
                }
            }
        }
    }

    // An offline/archived message keeps its original timestamp.
    let timestamp = Delay::from_payloads(&message.payloads)
        .map(|delay| delay.stamp.timestamp())
        .unwrap_or(now);

    session.write_buffer(&bare, &text, timestamp, flags, 0, now);
    session
        .histolog
        .write_message(&bare, timestamp, MessageKind::Recv, &text);
    session.push_ui(Event::MessageIn {
        from: bare.clone(),
        highlight: false,
    });

    // Honour the receipt request only after accepting the message.
    if wants_receipt {
        if let Some(id) = message.id.clone() {
            let ack = Message {
                from: None,
                to: Some(from),
                id: None,
                type_: message.type_,
                body: None,
                subject: None,
                thread: None,
                payloads: vec![receipts::Received { id }.into()],
            };
            session.send_element(ack);
        }
    }
}
