// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-user chat: membership, nick handling, topics, moderation.

use jid::{BareJid, Jid};

use causerie_stanza::iq::{Iq, IqType};
use causerie_stanza::message::{Message, MessageType};
use causerie_stanza::muc::{
    AdminItem, Affiliation, Muc, MucAdminQuery, MucUser, Role, Status as MucStatus,
};
use causerie_stanza::presence::{Presence, Type as PresenceType};
use causerie_stanza::stanza_error::DefinedCondition;
use causerie_stanza::{ns, Element};

use crate::error::Error;
use crate::event::Event;
use crate::events::{EventContext, EventPayload};
use crate::hbuf::LineFlags;
use crate::histolog::MessageKind;
use crate::iq::IqContext;
use crate::roster::{EntryData, RoomData, Status};
use crate::session::Session;

/// Whether joins and leaves are printed in the room buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintStatusPolicy {
    /// Print nothing.
    None,
    /// Print joins and leaves only.
    Joins,
    /// Print everything including status changes.
    All,
    /// Follow the global default.
    #[default]
    Default,
}

fn effective_policy(session: &Session, room: &RoomData) -> PrintStatusPolicy {
    match room.print_status {
        PrintStatusPolicy::Default => match session.config.muc_print_status {
            PrintStatusPolicy::Default => PrintStatusPolicy::Joins,
            other => other,
        },
        other => other,
    }
}

/// Picks the nickname for a join: explicit, stored, configured default,
/// then the local part of our own JID.
fn pick_nickname(session: &Session, room_key: Option<usize>, explicit: Option<&str>) -> String {
    if let Some(nick) = explicit {
        return nick.to_owned();
    }
    if let Some(key) = room_key {
        if let Some(EntryData::Room(room)) = session.roster.get(key).map(|entry| &entry.data) {
            if let Some(nick) = &room.nickname {
                return nick.clone();
            }
        }
    }
    if let Some(nick) = &session.config.default_nickname {
        return nick.clone();
    }
    session
        .config
        .jid
        .node()
        .map(|node| node.to_string())
        .unwrap_or_else(|| "causerie".to_owned())
}

/// Joins a room (the `room join` verb and the bookmark autojoin path).
pub(crate) fn join(
    session: &mut Session,
    room: &BareJid,
    nick: Option<&str>,
    password: Option<&str>,
    now: i64,
) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let bare = room.to_string();
    let existing = session.roster.find(&bare);
    let nickname = pick_nickname(session, existing, nick);

    let key = match existing {
        Some(key) => key,
        None => session.roster.add_user(
            room,
            None,
            "",
            EntryData::Room(RoomData::default()),
            false,
        ),
    };
    if let Some(entry) = session.roster.get_mut(key) {
        // A plain user entry the server told us about can become a room.
        if !matches!(entry.data, EntryData::Room(_)) {
            entry.data = EntryData::Room(RoomData::default());
        }
        if let EntryData::Room(room_data) = &mut entry.data {
            room_data.nickname = Some(nickname.clone());
        }
    }

    let mut muc = Muc::new();
    if let Some(password) = password {
        muc = muc.with_password(password);
    }
    let full = room
        .with_resource_str(&nickname)
        .map_err(Error::JidParse)?;
    let mut presence = Presence::new(PresenceType::None);
    presence.to = Some(Jid::from(full));
    presence.add_payload(muc);
    session.send_element(presence);
    session.ensure_buffer(&bare, now);
    Ok(())
}

/// Leaves a room: unavailable presence, resources cleared, entry kept.
pub(crate) fn leave(session: &mut Session, room: &str, message: Option<&str>, _now: i64) {
    let Some(key) = session.roster.find(room) else { return };
    let nickname = match session.roster.get(key).map(|entry| &entry.data) {
        Some(EntryData::Room(data)) => data.nickname.clone(),
        _ => None,
    };
    if let Some(nickname) = nickname {
        if let Ok(room_jid) = format!("{}/{}", room, nickname).parse::<Jid>() {
            let mut presence = Presence::new(PresenceType::Unavailable);
            presence.to = Some(room_jid);
            if let Some(message) = message {
                presence.set_status(message);
            }
            session.send_element(presence);
        }
    }
    session.roster.del_all_resources(room);
    session.push_ui(Event::RoomLeft(room.to_owned()));
}

/// Changes our nickname inside a room.
pub(crate) fn change_nick(session: &mut Session, room: &str, nick: &str, _now: i64) {
    let Some(key) = session.roster.find(room) else { return };
    if let Some(EntryData::Room(_)) = session.roster.get(key).map(|entry| &entry.data) {
        if let Ok(room_jid) = format!("{}/{}", room, nick).parse::<Jid>() {
            let mut presence = Presence::new(PresenceType::None);
            presence.to = Some(room_jid);
            session.send_element(presence);
            if let Some(entry) = session.roster.get_mut(key) {
                if let EntryData::Room(data) = &mut entry.data {
                    data.nickname = Some(nick.to_owned());
                }
            }
        }
    }
}

/// Sends a groupchat message to a joined room.
pub(crate) fn send_room_message(
    session: &mut Session,
    room: &str,
    text: &str,
    now: i64,
) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = room.parse().map_err(Error::JidParse)?;
    let message = Message::groupchat(to).with_body(text);
    session.send_element(message);
    session.last_use = now;
    // The room echoes our message back; nothing is written locally.
    Ok(())
}

/// Sets a room topic (empty clears it).
pub(crate) fn set_topic(session: &mut Session, room: &str, topic: &str, _now: i64) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = room.parse().map_err(Error::JidParse)?;
    let mut message = Message::groupchat(to);
    message.subject = Some(topic.to_owned());
    session.send_element(message);
    Ok(())
}

/// Sends a private message to one occupant.
pub(crate) fn send_private_message(
    session: &mut Session,
    room: &str,
    nick: &str,
    text: &str,
    now: i64,
) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = format!("{}/{}", room, nick).parse().map_err(Error::JidParse)?;
    let message = Message::chat(to).with_body(text);
    session.send_element(message);
    session.last_use = now;
    session.write_buffer(
        room,
        &format!("PM sent to {}: {}", nick, text),
        now,
        LineFlags::OUT,
        0,
        now,
    );
    Ok(())
}

/// Sends a mediated invitation.
pub(crate) fn invite(session: &mut Session, room: &str, who: Jid, reason: Option<&str>) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = room.parse().map_err(Error::JidParse)?;
    let mut user = MucUser::default();
    user.invite = Some(causerie_stanza::muc::Invite {
        from: None,
        to: Some(who),
        reason: reason.map(str::to_owned),
    });
    let message = Message {
        from: None,
        to: Some(to),
        id: None,
        type_: MessageType::Normal,
        body: None,
        subject: None,
        thread: None,
        payloads: vec![user.into()],
    };
    session.send_element(message);
    Ok(())
}

fn admin_request(
    session: &mut Session,
    room: &str,
    item: AdminItem,
    description: &'static str,
    now: i64,
) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = room.parse().map_err(Error::JidParse)?;
    let room_name = room.to_owned();
    session.send_query(
        "muc",
        move |id| Iq::from_set(id, MucAdminQuery::single(item)).with_to(to),
        now,
        0,
        Box::new(move |session, context| match context {
            IqContext::Result(_) => {}
            IqContext::Error(iq) => {
                let text = match &iq.payload {
                    IqType::Error(error) => error.describe(),
                    _ => "unknown error".to_owned(),
                };
                session.write_buffer(
                    &room_name,
                    &format!("{} failed: {}", description, text),
                    now,
                    LineFlags::ERR,
                    0,
                    now,
                );
            }
            IqContext::Timeout => {
                log::info!("{}: no answer from the room service", description);
            }
        }),
    );
    Ok(())
}

/// Kicks an occupant (role none).
pub(crate) fn kick(session: &mut Session, room: &str, nick: &str, reason: Option<&str>, now: i64) -> Result<(), Error> {
    admin_request(
        session,
        room,
        AdminItem {
            nick: Some(nick.to_owned()),
            role: Some(Role::None),
            reason: reason.map(str::to_owned),
            ..AdminItem::default()
        },
        "Kick",
        now,
    )
}

/// Bans a bare JID (affiliation outcast).
pub(crate) fn ban(session: &mut Session, room: &str, who: BareJid, reason: Option<&str>, now: i64) -> Result<(), Error> {
    admin_request(
        session,
        room,
        AdminItem {
            jid: Some(who),
            affiliation: Some(Affiliation::Outcast),
            reason: reason.map(str::to_owned),
            ..AdminItem::default()
        },
        "Ban",
        now,
    )
}

/// Grants a role to an occupant.
pub(crate) fn set_role(session: &mut Session, room: &str, nick: &str, role: Role, reason: Option<&str>, now: i64) -> Result<(), Error> {
    admin_request(
        session,
        room,
        AdminItem {
            nick: Some(nick.to_owned()),
            role: Some(role),
            reason: reason.map(str::to_owned),
            ..AdminItem::default()
        },
        "Role change",
        now,
    )
}

/// Grants an affiliation to a bare JID.
pub(crate) fn set_affiliation(session: &mut Session, room: &str, who: BareJid, affiliation: Affiliation, reason: Option<&str>, now: i64) -> Result<(), Error> {
    admin_request(
        session,
        room,
        AdminItem {
            jid: Some(who),
            affiliation: Some(affiliation),
            reason: reason.map(str::to_owned),
            ..AdminItem::default()
        },
        "Affiliation change",
        now,
    )
}

/// Destroys a room we own.
pub(crate) fn destroy(session: &mut Session, room: &str, reason: Option<&str>, now: i64) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = room.parse().map_err(Error::JidParse)?;
    let mut query = Element::bare("query", ns::MUC_OWNER);
    let destroy_elem = query.append_child(Element::bare("destroy", ns::MUC_OWNER));
    if let Some(reason) = reason {
        destroy_elem
            .append_child(Element::bare("reason", ns::MUC_OWNER))
            .append_text_node(reason);
    }
    let room_name = room.to_owned();
    let id = session.iq.next_id(Some("muc"));
    session.iq.register(
        id.clone(),
        now,
        0,
        Box::new(move |session, context| {
            if let IqContext::Error(iq) = context {
                let text = match &iq.payload {
                    IqType::Error(error) => error.describe(),
                    _ => "unknown error".to_owned(),
                };
                session.write_buffer(
                    &room_name,
                    &format!("Room destruction failed: {}", text),
                    now,
                    LineFlags::ERR,
                    0,
                    now,
                );
            }
        }),
    );
    let mut iq_elem = Element::builder("iq", ns::JABBER_CLIENT)
        .attr("id", id)
        .attr("type", "set")
        .attr("to", to)
        .build();
    iq_elem.append_child(query);
    session.send_element(iq_elem);
    Ok(())
}

/// Handles a presence addressed from a room occupant JID.
pub(crate) fn handle_room_presence(session: &mut Session, presence: Presence, now: i64) {
    let Some(from) = presence.from.clone() else { return };
    let room = from.to_bare().to_string();
    let nick = from
        .resource()
        .map(|resource| resource.as_str().to_owned())
        .unwrap_or_default();
    let Some(key) = session.roster.find(&room) else { return };

    let was_inside = session
        .roster
        .get(key)
        .map(|entry| entry.inside_room())
        .unwrap_or(false);

    if presence.type_ == PresenceType::Error {
        let error = presence.error();
        let conflict = error
            .as_ref()
            .map(|error| {
                error.defined_condition == DefinedCondition::Conflict
                    || error.code == Some(409)
            })
            .unwrap_or(false);
        if conflict && !was_inside {
            // The nickname never took; forget it so the next join asks.
            if let Some(entry) = session.roster.get_mut(key) {
                if let EntryData::Room(data) = &mut entry.data {
                    data.nickname = None;
                }
            }
            session.write_buffer(
                &room,
                &format!("Nickname <{}> is already in use in this room", nick),
                now,
                LineFlags::ERR,
                0,
                now,
            );
        } else {
            let description = error
                .map(|error| error.describe())
                .unwrap_or_else(|| "unknown error".to_owned());
            session.write_buffer(
                &room,
                &format!("Error presence from the room: {}", description),
                now,
                LineFlags::ERR,
                0,
                now,
            );
        }
        return;
    }

    let user = presence
        .get_payload("x", ns::MUC_USER)
        .cloned()
        .and_then(|elem| MucUser::try_from(elem).ok())
        .unwrap_or_default();
    let self_presence = user.has_status(MucStatus::SELF_PRESENCE)
        || session
            .roster
            .get(key)
            .and_then(|entry| match &entry.data {
                EntryData::Room(data) => data.nickname.clone(),
                _ => None,
            })
            .map(|own| own == nick)
            .unwrap_or(false);

    let policy = match session.roster.get(key).map(|entry| &entry.data) {
        Some(EntryData::Room(data)) => effective_policy(session, data),
        _ => PrintStatusPolicy::Joins,
    };

    if presence.type_ == PresenceType::Unavailable {
        let new_nick = user
            .items
            .first()
            .and_then(|item| item.nick.clone())
            .filter(|_| user.has_status(MucStatus::NEW_NICK));
        session.roster.set_status(
            &room,
            &nick,
            0,
            Status::Offline,
            None,
            now,
            Role::None,
            Affiliation::None,
            None,
        );
        if self_presence {
            if let Some(new_nick) = new_nick.clone() {
                // Our own rename: track the new name, stay joined.
                if let Some(entry) = session.roster.get_mut(key) {
                    if let EntryData::Room(data) = &mut entry.data {
                        data.nickname = Some(new_nick.clone());
                    }
                }
                session.write_buffer(
                    &room,
                    &format!("You are now known as {}", new_nick),
                    now,
                    LineFlags::INFO,
                    0,
                    now,
                );
            } else {
                let kicked = user.has_status(MucStatus::KICKED);
                let banned = user.has_status(MucStatus::BANNED);
                session.roster.del_all_resources(&room);
                let text = if banned {
                    "You have been banned from the room"
                } else if kicked {
                    "You have been kicked from the room"
                } else {
                    "You have left the room"
                };
                session.write_buffer(&room, text, now, LineFlags::INFO, 0, now);
                session.push_ui(Event::RoomLeft(room.clone()));
            }
        } else {
            let print = matches!(policy, PrintStatusPolicy::Joins | PrintStatusPolicy::All);
            if print {
                let text = match new_nick {
                    Some(new_nick) => format!("{} is now known as {}", nick, new_nick),
                    None => match presence.status.as_deref() {
                        Some(reason) if !reason.is_empty() => {
                            format!("{} has left: {}", nick, reason)
                        }
                        _ => format!("{} has left", nick),
                    },
                };
                session.write_buffer(&room, &text, now, LineFlags::INFO, 0, now);
            }
        }
        session.push_ui(Event::BuddyChanged(room));
        return;
    }

    // Available presence from an occupant.
    let item = user.item();
    let role = item.map(|item| item.role).unwrap_or_default();
    let affiliation = item.map(|item| item.affiliation).unwrap_or_default();
    let real_jid = item.and_then(|item| item.jid.clone());
    let newcomer = session
        .roster
        .get(key)
        .map(|entry| {
            !entry
                .resources()
                .iter()
                .any(|resource| resource.name == nick)
        })
        .unwrap_or(true);
    let status = presence
        .show
        .map(|show| match show {
            causerie_stanza::presence::Show::Chat => Status::FreeForChat,
            causerie_stanza::presence::Show::Away => Status::Away,
            causerie_stanza::presence::Show::Xa => Status::NotAvailable,
            causerie_stanza::presence::Show::Dnd => Status::DoNotDisturb,
        })
        .unwrap_or(Status::Available);
    session.roster.set_status(
        &room,
        &nick,
        presence.priority,
        status,
        presence.status.clone(),
        now,
        role,
        affiliation,
        real_jid,
    );

    if self_presence && !was_inside {
        session.write_buffer(
            &room,
            &format!("You have joined as {}", nick),
            now,
            LineFlags::INFO,
            0,
            now,
        );
        session.push_ui(Event::RoomJoined(room.clone()));
    } else if newcomer && !self_presence {
        if matches!(policy, PrintStatusPolicy::Joins | PrintStatusPolicy::All) {
            session.write_buffer(
                &room,
                &format!("{} has joined", nick),
                now,
                LineFlags::INFO,
                0,
                now,
            );
        }
    } else if !newcomer && policy == PrintStatusPolicy::All {
        let shown = match status {
            Status::Offline => "offline",
            Status::Available => "online",
            Status::FreeForChat => "free for chat",
            Status::DoNotDisturb => "busy",
            Status::NotAvailable => "not available",
            Status::Away => "away",
            Status::Invisible => "invisible",
        };
        session.write_buffer(
            &room,
            &format!("{} is now {}", nick, shown),
            now,
            LineFlags::INFO,
            0,
            now,
        );
    }
    session.push_ui(Event::BuddyChanged(room));
}

/// Handles a groupchat message (body, topic, history replay).
pub(crate) fn handle_room_message(session: &mut Session, message: Message, now: i64) {
    let Some(from) = message.from.clone() else { return };
    let room = from.to_bare().to_string();
    let nick = from
        .resource()
        .map(|resource| resource.as_str().to_owned())
        .unwrap_or_default();

    // A subject-only message is a topic change.
    if message.body.is_none() {
        if let Some(topic) = message.subject.clone() {
            let Some(key) = session.roster.find(&room) else { return };
            if let Some(entry) = session.roster.get_mut(key) {
                if let EntryData::Room(data) = &mut entry.data {
                    data.topic = if topic.is_empty() {
                        None
                    } else {
                        Some(topic.clone())
                    };
                }
            }
            let text = if nick.is_empty() {
                format!("The topic has been set to: {}", topic)
            } else {
                format!("{} has set the topic to: {}", nick, topic)
            };
            session.write_buffer(&room, &text, now, LineFlags::INFO, 0, now);
            session.push_ui(Event::TopicChanged {
                room,
                topic: if topic.is_empty() { None } else { Some(topic) },
            });
        }
        return;
    }

    let Some(body) = message.body.clone() else { return };

    // Replayed room history keeps its original timestamps.
    let timestamp = causerie_stanza::delay::Delay::from_payloads(&message.payloads)
        .map(|delay| delay.stamp.timestamp())
        .unwrap_or(now);

    let own_nick = session
        .roster
        .find(&room)
        .and_then(|key| session.roster.get(key))
        .and_then(|entry| match &entry.data {
            EntryData::Room(data) => data.nickname.clone(),
            _ => None,
        });
    let from_self = own_nick.as_deref() == Some(nick.as_str());
    let highlight = !from_self
        && own_nick
            .as_deref()
            .map(|own| !own.is_empty() && body.contains(own))
            .unwrap_or(false);

    let mut flags = if from_self {
        LineFlags::OUT
    } else {
        LineFlags::IN
    };
    if highlight {
        flags = flags | LineFlags::HIGHLIGHT;
    }
    let (text, nick_len) = if nick.is_empty() {
        (body.clone(), 0)
    } else {
        (format!("{}> {}", nick, body), nick.len() + 1)
    };
    session.write_buffer(&room, &text, timestamp, flags, nick_len, now);
    session
        .histolog
        .write_message(&room, timestamp, MessageKind::Recv, &text);
    if !from_self {
        session.push_ui(Event::MessageIn {
            from: room,
            highlight,
        });
    }
}

/// Handles a mediated invitation: registers a pending event whose accept
/// joins the room.
pub(crate) fn handle_invite(session: &mut Session, from_bare: &str, user: MucUser, now: i64) {
    let Some(invite) = user.invite else { return };
    let Ok(room) = from_bare.parse::<BareJid>() else { return };
    let inviter = invite.from.clone();
    let password = user.password.clone();
    let description = match &inviter {
        Some(inviter) => format!("<{}> invites you to room {}", inviter, room),
        None => format!("You are invited to room {}", room),
    };
    let room_for_cb = room.clone();
    let password_for_cb = password.clone();
    let id = session.events.add(
        None,
        description.clone(),
        now,
        0,
        EventPayload::RoomInvite {
            room,
            from: inviter,
            password,
        },
        Box::new(move |session, context| {
            if context == EventContext::Accept {
                if let Err(e) = join(
                    session,
                    &room_for_cb,
                    None,
                    password_for_cb.as_deref(),
                    now,
                ) {
                    log::error!("cannot join room: {}", e);
                }
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

/// Prints what is known about one occupant (the `room whois` verb).
pub(crate) fn whois(session: &mut Session, room: &str, nick: &str, now: i64) {
    let Some(key) = session.roster.find(room) else { return };
    let info = session.roster.get(key).and_then(|entry| {
        entry
            .resources()
            .iter()
            .find(|resource| resource.name == nick)
            .map(|resource| {
                (
                    resource.role,
                    resource.affiliation,
                    resource.real_jid.clone(),
                    resource.status,
                    resource.status_msg.clone(),
                )
            })
    });
    match info {
        Some((role, affiliation, real_jid, status, status_msg)) => {
            let jid_line = real_jid
                .map(|jid| jid.to_string())
                .unwrap_or_else(|| "hidden by the room".to_owned());
            session.write_buffer(
                room,
                &format!(
                    "{}: role {}, affiliation {}, jid {}",
                    nick, role, affiliation, jid_line
                ),
                now,
                LineFlags::INFO,
                0,
                now,
            );
            if let Some(message) = status_msg {
                session.write_buffer(
                    room,
                    &format!("{}: status [{}] {}", nick, status.to_char(), message),
                    now,
                    LineFlags::INFO,
                    0,
                    now,
                );
            }
        }
        None => {
            session.write_buffer(
                room,
                &format!("Nobody known as {} in here", nick),
                now,
                LineFlags::INFO,
                0,
                now,
            );
        }
    }
}

/// Accepts the default configuration of a freshly created room (the
/// `room unlock` verb): an instant-room submit to the owner service.
pub(crate) fn unlock(session: &mut Session, room: &str, now: i64) -> Result<(), Error> {
    if !session.is_online() {
        return Err(Error::NotConnected);
    }
    let to: Jid = room.parse().map_err(Error::JidParse)?;
    let mut query = Element::bare("query", ns::MUC_OWNER);
    query.append_child(
        Element::builder("x", ns::DATA_FORMS)
            .attr("type", "submit")
            .build(),
    );
    let room_name = room.to_owned();
    let id = session.iq.next_id(Some("muc"));
    session.iq.register(
        id.clone(),
        now,
        0,
        Box::new(move |session, context| {
            if let IqContext::Error(iq) = context {
                let text = match &iq.payload {
                    IqType::Error(error) => error.describe(),
                    _ => "unknown error".to_owned(),
                };
                session.write_buffer(
                    &room_name,
                    &format!("Room unlock failed: {}", text),
                    now,
                    LineFlags::ERR,
                    0,
                    now,
                );
            }
        }),
    );
    let mut iq_elem = Element::builder("iq", ns::JABBER_CLIENT)
        .attr("id", id)
        .attr("type", "set")
        .attr("to", to)
        .build();
    iq_elem.append_child(query);
    session.send_element(iq_elem);
    Ok(())
}

/// Lists the occupants into the room buffer (the `room names` verb).
pub(crate) fn names(session: &mut Session, room: &str, now: i64) {
    let Some(key) = session.roster.find(room) else { return };
    let lines: Vec<String> = session
        .roster
        .get(key)
        .map(|entry| {
            entry
                .resources()
                .iter()
                .map(|resource| {
                    format!(
                        "{} [{}/{}]",
                        resource.name, resource.role, resource.affiliation
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    session.write_buffer(room, "Room members:", now, LineFlags::INFO, 0, now);
    for line in lines {
        session.write_buffer(room, &line, now, LineFlags::INFO, 0, now);
    }
}
