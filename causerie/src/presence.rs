// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Own presence, autoaway, and inbound presence handling.

use jid::Jid;

use causerie_stanza::caps::Caps;
use causerie_stanza::pgp::Signed;
use causerie_stanza::presence::{Presence, Show, Type as PresenceType};
use causerie_stanza::ns;

use crate::event::Event;
use crate::events::{EventContext, EventPayload};
use crate::hbuf::LineFlags;
use crate::muc;
use crate::roster::{EntryData, Status, Subscription, UserData};
use crate::session::Session;

fn status_to_show(status: Status) -> Option<Show> {
    match status {
        Status::Available | Status::Offline | Status::Invisible => None,
        Status::FreeForChat => Some(Show::Chat),
        Status::DoNotDisturb => Some(Show::Dnd),
        Status::NotAvailable => Some(Show::Xa),
        Status::Away => Some(Show::Away),
    }
}

fn show_to_status(show: Option<Show>) -> Status {
    match show {
        None => Status::Available,
        Some(Show::Chat) => Status::FreeForChat,
        Some(Show::Dnd) => Status::DoNotDisturb,
        Some(Show::Xa) => Status::NotAvailable,
        Some(Show::Away) => Status::Away,
    }
}

fn build_own_presence(session: &mut Session, status: Status, msg: Option<&str>) -> Presence {
    let type_ = match status {
        Status::Offline => PresenceType::Unavailable,
        Status::Invisible => PresenceType::Invisible,
        _ => PresenceType::None,
    };
    let mut presence = Presence::new(type_).with_priority(session.config.priority);
    presence.show = status_to_show(status);
    if let Some(msg) = msg {
        presence.set_status(msg);
    }
    if status != Status::Offline {
        presence.add_payload(session.caps.own_caps());
        if session.pgp.enabled() {
            if let Some(signature) = session.pgp.sign(msg.unwrap_or("")) {
                presence.add_payload(Signed { data: signature });
            }
        }
    }
    presence
}

/// Broadcasts a status, updating both wanted and current.
pub(crate) fn set_status(session: &mut Session, status: Status, msg: Option<String>, now: i64) {
    session.wanted_status = (status, msg.clone());
    session.autoaway_saved = None;
    announce_status(session, status, msg, now);
}

/// Broadcasts `status` without touching the wanted pair (used by both the
/// user path and the autoaway path).
pub(crate) fn announce_status(
    session: &mut Session,
    status: Status,
    msg: Option<String>,
    now: i64,
) {
    if !session.is_online() {
        session.log_line(LineFlags::INFO, "You are not connected", now);
        return;
    }
    let presence = build_own_presence(session, status, msg.as_deref());
    session.send_element(presence);
    session.current_status = (status, msg.clone());
    session.last_use = now;
    session.push_ui(Event::StatusChanged(status, msg));
}

/// Sends a directed presence to one JID (the `status_to` verb).
pub(crate) fn send_status_to(
    session: &mut Session,
    to: Jid,
    status: Status,
    msg: Option<String>,
    now: i64,
) {
    if !session.is_online() {
        session.log_line(LineFlags::INFO, "You are not connected", now);
        return;
    }
    let mut presence = build_own_presence(session, status, msg.as_deref());
    presence.to = Some(to);
    session.send_element(presence);
}

/// Resets the idle clock; restores the pre-autoaway status on the first
/// activity after an automatic switch.
pub(crate) fn autoaway_activity(session: &mut Session, now: i64) {
    if let Some((status, msg)) = session.autoaway_saved.take() {
        announce_status(session, status, msg, now);
    }
}

/// Timer check: after the configured idle time, available-ish statuses
/// drop to away with the configured message.
pub(crate) fn autoaway_check(session: &mut Session, now: i64) {
    let timeout = session.config.autoaway;
    if timeout <= 0 || session.autoaway_saved.is_some() || !session.is_online() {
        return;
    }
    let (current, _) = session.current_status.clone();
    if !matches!(current, Status::Available | Status::FreeForChat) {
        return;
    }
    if now - session.last_activity < timeout {
        return;
    }
    session.autoaway_saved = Some(session.current_status.clone());
    let msg = session.config.message_autoaway.clone();
    announce_status(session, Status::Away, Some(msg), now);
}

/// Inbound presence dispatch.
pub(crate) fn handle_presence(session: &mut Session, presence: Presence, now: i64) {
    let Some(from) = presence.from.clone() else {
        log::debug!("dropping presence without a sender");
        return;
    };
    let bare = from.to_bare().to_string();

    // Room presences take a different path entirely.
    if let Some(key) = session.roster.find(&bare) {
        if matches!(
            session.roster.get(key).map(|entry| &entry.data),
            Some(EntryData::Room(_))
        ) {
            muc::handle_room_presence(session, presence, now);
            return;
        }
    }

    match presence.type_ {
        PresenceType::Subscribe => handle_subscribe_request(session, &from, now),
        PresenceType::Subscribed => {
            session.log_line(
                LineFlags::INFO,
                &format!("<{}> has accepted your subscription request", bare),
                now,
            );
        }
        PresenceType::Unsubscribed => {
            session.log_line(
                LineFlags::INFO,
                &format!("<{}> has cancelled your subscription", bare),
                now,
            );
        }
        PresenceType::Unsubscribe => {
            session.log_line(
                LineFlags::INFO,
                &format!("<{}> is unsubscribing from your presence", bare),
                now,
            );
        }
        PresenceType::Error => {
            let description = presence
                .error()
                .map(|error| error.describe())
                .unwrap_or_else(|| "unknown error".to_owned());
            session.log_line(
                LineFlags::ERR,
                &format!("Error presence from <{}>: {}", bare, description),
                now,
            );
        }
        PresenceType::Probe | PresenceType::Invisible => {}
        PresenceType::None | PresenceType::Unavailable => {
            handle_user_presence(session, &presence, &from, now)
        }
    }
}

fn handle_user_presence(session: &mut Session, presence: &Presence, from: &Jid, now: i64) {
    let bare = from.to_bare().to_string();
    let resource = from
        .resource()
        .map(|resource| resource.as_str().to_owned())
        .unwrap_or_default();

    if session.roster.find(&bare).is_none() {
        // Presence from somebody we don't track; mirror of how servers
        // push roster items late.  Keep a local placeholder.
        session.roster.add_user(
            &from.to_bare(),
            None,
            "",
            EntryData::User(UserData::default()),
            false,
        );
    }

    let status = match presence.type_ {
        PresenceType::Unavailable => Status::Offline,
        _ => show_to_status(presence.show),
    };
    session.roster.set_status(
        &bare,
        &resource,
        presence.priority,
        status,
        presence.status.clone(),
        now,
        causerie_stanza::muc::Role::None,
        causerie_stanza::muc::Affiliation::None,
        None,
    );

    if status != Status::Offline {
        // Capability advertisement: remember the hash and resolve it once.
        if let Some(caps_elem) = presence.get_payload("c", ns::CAPS) {
            if let Ok(caps) = Caps::try_from(caps_elem.clone()) {
                note_remote_caps(session, from.clone(), &caps, &bare, &resource, now);
            }
        }
        // Signed status: verify and attach to the resource.
        if let Some(signed) = presence.get_payload("x", ns::SIGNED) {
            if let Ok(signed) = Signed::try_from(signed.clone()) {
                let text = presence.status.clone().unwrap_or_default();
                let info = session.pgp.verify(&text, &signed.data);
                if let Some(resource) = session.roster.resource_mut(&bare, &resource) {
                    match info {
                        Some(info) => {
                            resource.pgp.sign_key_id = Some(info.key_id);
                            resource.pgp.last_sig_ok = Some(info.ok);
                        }
                        None => resource.pgp.last_sig_ok = Some(false),
                    }
                }
            }
        }
    }

    // Status change lands in the history file when enabled.
    session.histolog.write_status(
        &bare,
        now,
        status,
        presence.status.as_deref().unwrap_or(""),
    );

    session.push_ui(Event::BuddyChanged(bare));
    session.push_ui(Event::RosterUpdated);
}

fn note_remote_caps(
    session: &mut Session,
    from: Jid,
    caps: &Caps,
    bare: &str,
    resource: &str,
    now: i64,
) {
    let ver = caps.ver_string();
    if let Some(record) = session.roster.resource_mut(bare, resource) {
        record.caps_ver = Some(ver.clone());
    }
    if caps.hash != "sha-1" {
        // We only compute sha-1; never cache what we cannot verify.
        return;
    }
    if !session.caps.note_seen(&ver) {
        return;
    }
    let query = causerie_stanza::caps::query_caps(caps);
    let ver_for_store = ver.clone();
    session.send_query(
        "caps",
        move |id| {
            causerie_stanza::iq::Iq::from_get(id, query).with_to(from)
        },
        now,
        0,
        Box::new(move |session, context| {
            if let crate::iq::IqContext::Result(iq) = context {
                if let causerie_stanza::iq::IqType::Result(Some(payload)) = &iq.payload {
                    if let Ok(info) =
                        causerie_stanza::disco::DiscoInfoResult::try_from(payload.clone())
                    {
                        session.caps.store(&ver_for_store, info);
                    }
                }
            }
        }),
    );
}

fn handle_subscribe_request(session: &mut Session, from: &Jid, now: i64) {
    let bare = from.to_bare();
    let description = format!("<{}> wants to subscribe to your presence", bare);
    let jid_for_cb = bare.clone();
    let id = session.events.add(
        None,
        description.clone(),
        now,
        0,
        EventPayload::Subscription { jid: bare.clone() },
        Box::new(move |session, context| {
            let to = Jid::from(jid_for_cb.clone());
            match context {
                EventContext::Accept => {
                    let mut answer = Presence::new(PresenceType::Subscribed);
                    answer.to = Some(to);
                    session.send_element(answer);
                }
                EventContext::Reject => {
                    let mut answer = Presence::new(PresenceType::Unsubscribed);
                    answer.to = Some(to);
                    session.send_element(answer);
                }
                EventContext::Cancel | EventContext::Timeout => {}
            }
            true
        }),
    );
    if let Some(id) = id {
        session.log_line(
            LineFlags::INFO,
            &format!("{} (event #{})", description, id),
            now,
        );
        session.push_ui(Event::EventNew { id, description });
    }
}

/// The `authorization` verbs.
pub(crate) fn authorization(session: &mut Session, to: Jid, which: AuthVerb) {
    let type_ = match which {
        AuthVerb::Allow => PresenceType::Subscribed,
        AuthVerb::Cancel => PresenceType::Unsubscribed,
        AuthVerb::Request => PresenceType::Subscribe,
        AuthVerb::RequestUnsubscribe => PresenceType::Unsubscribe,
    };
    let mut presence = Presence::new(type_);
    presence.to = Some(to);
    session.send_element(presence);
}

/// What to do about a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerb {
    /// Accept the peer's subscription.
    Allow,
    /// Revoke the peer's subscription.
    Cancel,
    /// Ask for the peer's presence.
    Request,
    /// Stop receiving the peer's presence.
    RequestUnsubscribe,
}

/// Applies an inbound roster item's subscription to the local model.
pub(crate) fn apply_subscription(
    item: &causerie_stanza::roster::Item,
) -> (Subscription, bool) {
    use causerie_stanza::roster::Subscription as WireSub;
    let subscription = match item.subscription {
        WireSub::None | WireSub::Remove => Subscription::None,
        WireSub::From => Subscription::From,
        WireSub::To => Subscription::To,
        WireSub::Both => Subscription::Both,
    };
    let pending = item.ask.is_some();
    (subscription, pending)
}
