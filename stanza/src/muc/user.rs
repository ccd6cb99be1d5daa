// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::{BareJid, FullJid, Jid};

use crate::element::Element;
use crate::error::Error;
use crate::ns;

generate_attribute!(
    /// A long-lived association with the room, stored by the service.
    Affiliation, "affiliation", {
        /// Owner of the room.
        Owner => "owner",

        /// Administrator of the room.
        Admin => "admin",

        /// Member of the room.
        Member => "member",

        /// Banned from the room.
        Outcast => "outcast",

        /// No affiliation.
        None => "none",
    }, Default = None
);

generate_attribute!(
    /// A temporary position within the room, lasting for the visit.
    Role, "role", {
        /// Can manage other participants.
        Moderator => "moderator",

        /// Can speak in the room.
        Participant => "participant",

        /// Can only observe.
        Visitor => "visitor",

        /// Not in the room.
        None => "none",
    }, Default = None
);

/// Who performed a moderation action, attributed either to a real JID or
/// to a room nick.
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    /// The full JID associated with this user.
    Jid(FullJid),
    /// The nickname of this user.
    Nick(String),
}

impl TryFrom<Element> for Actor {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Actor, Error> {
        let elem = crate::util::check_element(elem, "actor", ns::MUC_USER)?;
        let jid: Option<FullJid> = get_attr!(elem, "jid", Option);
        let nick = elem.attr("nick").map(String::from);
        match (jid, nick) {
            (Some(_), Some(_)) | (None, None) => Err(Error::ParseError(
                "Either 'jid' or 'nick' attribute is required.",
            )),
            (Some(jid), _) => Ok(Actor::Jid(jid)),
            (_, Some(nick)) => Ok(Actor::Nick(nick)),
        }
    }
}

impl From<Actor> for Element {
    fn from(actor: Actor) -> Element {
        let builder = Element::builder("actor", ns::MUC_USER);
        match actor {
            Actor::Jid(jid) => builder.attr("jid", jid.to_string()).build(),
            Actor::Nick(nick) => builder.attr("nick", nick).build(),
        }
    }
}

/// An occupant's state within the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// The occupant's affiliation.
    pub affiliation: Affiliation,
    /// The occupant's role.
    pub role: Role,
    /// The occupant's real JID, when the room discloses it.
    pub jid: Option<FullJid>,
    /// The occupant's nick, on items not addressed by nick.
    pub nick: Option<String>,
    /// Who performed the action carried by this item.
    pub actor: Option<Actor>,
    /// Why the action was performed.
    pub reason: Option<String>,
}

impl Item {
    /// Creates an item with the given affiliation and role.
    pub fn new(affiliation: Affiliation, role: Role) -> Item {
        Item {
            affiliation,
            role,
            jid: None,
            nick: None,
            actor: None,
            reason: None,
        }
    }
}

impl TryFrom<Element> for Item {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Item, Error> {
        let elem = crate::util::check_element(elem, "item", ns::MUC_USER)?;
        let affiliation = get_attr!(elem, "affiliation", Default);
        let role = get_attr!(elem, "role", Default);
        let jid = get_attr!(elem, "jid", Option);
        let nick = elem.attr("nick").map(String::from);
        let actor = elem
            .get_child("actor", ns::MUC_USER)
            .cloned()
            .map(Actor::try_from)
            .transpose()
            .map_err(Error::hide_type_mismatch)?;
        let reason = elem.get_child("reason", ns::MUC_USER).map(Element::text);
        Ok(Item {
            affiliation,
            role,
            jid,
            nick,
            actor,
            reason,
        })
    }
}

impl From<Item> for Element {
    fn from(item: Item) -> Element {
        let mut elem = Element::builder("item", ns::MUC_USER)
            .attr("affiliation", item.affiliation)
            .attr("role", item.role)
            .attr("jid", item.jid.map(|jid| jid.to_string()))
            .attr("nick", item.nick)
            .build();
        if let Some(actor) = item.actor {
            elem.append_child(actor.into());
        }
        if let Some(reason) = item.reason {
            elem.append_child(Element::bare("reason", ns::MUC_USER))
                .append_text_node(reason);
        }
        elem
    }
}

/// A mediated invitation to a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Invite {
    /// The inviter (inbound) or invitee (outbound).
    pub from: Option<Jid>,
    /// The invitee (outbound) or inviter (inbound).
    pub to: Option<Jid>,
    /// Optional reason text.
    pub reason: Option<String>,
}

impl TryFrom<Element> for Invite {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Invite, Error> {
        let elem = crate::util::check_element(elem, "invite", ns::MUC_USER)?;
        Ok(Invite {
            from: get_attr!(elem, "from", Option),
            to: get_attr!(elem, "to", Option),
            reason: elem.get_child("reason", ns::MUC_USER).map(Element::text),
        })
    }
}

impl From<Invite> for Element {
    fn from(invite: Invite) -> Element {
        let mut elem = Element::builder("invite", ns::MUC_USER)
            .attr("from", invite.from)
            .attr("to", invite.to)
            .build();
        if let Some(reason) = invite.reason {
            elem.append_child(Element::bare("reason", ns::MUC_USER))
                .append_text_node(reason);
        }
        elem
    }
}

/// Notification that the room was destroyed.
#[derive(Debug, Clone, PartialEq)]
pub struct Destroy {
    /// An alternate venue, if any.
    pub jid: Option<BareJid>,
    /// Why the room was destroyed.
    pub reason: Option<String>,
}

impl TryFrom<Element> for Destroy {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Destroy, Error> {
        let elem = crate::util::check_element(elem, "destroy", ns::MUC_USER)?;
        Ok(Destroy {
            jid: get_attr!(elem, "jid", Option),
            reason: elem.get_child("reason", ns::MUC_USER).map(Element::text),
        })
    }
}

impl From<Destroy> for Element {
    fn from(destroy: Destroy) -> Element {
        let mut elem = Element::builder("destroy", ns::MUC_USER)
            .attr("jid", destroy.jid)
            .build();
        if let Some(reason) = destroy.reason {
            elem.append_child(Element::bare("reason", ns::MUC_USER))
                .append_text_node(reason);
        }
        elem
    }
}

/// A numeric status code qualifying a MUC presence or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u16);

impl Status {
    /// 110: this presence refers to the receiving occupant itself.
    pub const SELF_PRESENCE: Status = Status(110);
    /// 201: a new room has been created.
    pub const ROOM_CREATED: Status = Status(201);
    /// 303: the occupant changed nickname.
    pub const NEW_NICK: Status = Status(303);
    /// 301: the occupant was banned.
    pub const BANNED: Status = Status(301);
    /// 307: the occupant was kicked.
    pub const KICKED: Status = Status(307);
}

/// The `<x xmlns='…muc#user'/>` payload found in room presences and some
/// room messages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MucUser {
    /// Occupant items.
    pub items: Vec<Item>,
    /// Status codes qualifying this stanza.
    pub status: Vec<Status>,
    /// A mediated invitation.
    pub invite: Option<Invite>,
    /// A destruction notice.
    pub destroy: Option<Destroy>,
    /// Password to use when joining via an invitation.
    pub password: Option<String>,
}

impl MucUser {
    /// Whether the given status code is present.
    pub fn has_status(&self, status: Status) -> bool {
        self.status.contains(&status)
    }

    /// The first item, which in presences describes the sender.
    pub fn item(&self) -> Option<&Item> {
        self.items.first()
    }
}

impl TryFrom<Element> for MucUser {
    type Error = Error;

    fn try_from(elem: Element) -> Result<MucUser, Error> {
        let elem = crate::util::check_element(elem, "x", ns::MUC_USER)?;
        let mut user = MucUser::default();
        for child in elem.children() {
            if child.is("item", ns::MUC_USER) {
                user.items
                    .push(Item::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            } else if child.is("status", ns::MUC_USER) {
                let code = match child.attr("code") {
                    Some(code) => code.parse()?,
                    None => return Err(Error::ParseError("Status missing a 'code' attribute.")),
                };
                user.status.push(Status(code));
            } else if child.is("invite", ns::MUC_USER) {
                user.invite =
                    Some(Invite::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            } else if child.is("destroy", ns::MUC_USER) {
                user.destroy =
                    Some(Destroy::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            } else if child.is("password", ns::MUC_USER) {
                user.password = Some(child.text());
            }
        }
        Ok(user)
    }
}

impl From<MucUser> for Element {
    fn from(user: MucUser) -> Element {
        let mut elem = Element::bare("x", ns::MUC_USER);
        for item in user.items {
            elem.append_child(item.into());
        }
        for status in user.status {
            elem.append_child(
                Element::builder("status", ns::MUC_USER)
                    .attr("code", status.0)
                    .build(),
            );
        }
        if let Some(invite) = user.invite {
            elem.append_child(invite.into());
        }
        if let Some(destroy) = user.destroy {
            elem.append_child(destroy.into());
        }
        if let Some(password) = user.password {
            elem.append_child(Element::bare("password", ns::MUC_USER))
                .append_text_node(password);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_payload() {
        let elem: Element = "<x xmlns='http://jabber.org/protocol/muc#user'>\
             <item affiliation='member' role='participant' jid='hag66@shakespeare.lit/pda'/>\
             <status code='110'/></x>"
            .parse()
            .unwrap();
        let user = MucUser::try_from(elem).unwrap();
        assert!(user.has_status(Status::SELF_PRESENCE));
        let item = user.item().unwrap();
        assert_eq!(item.affiliation, Affiliation::Member);
        assert_eq!(item.role, Role::Participant);
        assert_eq!(
            item.jid.as_ref().unwrap().to_string(),
            "hag66@shakespeare.lit/pda"
        );
    }

    #[test]
    fn test_kick_with_actor() {
        let elem: Element = "<x xmlns='http://jabber.org/protocol/muc#user'>\
             <item affiliation='none' role='none'>\
             <actor nick='Fluellen'/><reason>Avaunt, you cullion!</reason></item>\
             <status code='307'/></x>"
            .parse()
            .unwrap();
        let user = MucUser::try_from(elem).unwrap();
        assert!(user.has_status(Status::KICKED));
        let item = user.item().unwrap();
        assert_eq!(item.actor, Some(Actor::Nick("Fluellen".to_owned())));
        assert_eq!(item.reason.as_deref(), Some("Avaunt, you cullion!"));
    }

    #[test]
    fn test_invite() {
        let elem: Element = "<x xmlns='http://jabber.org/protocol/muc#user'>\
             <invite from='crone1@shakespeare.lit/desktop'>\
             <reason>Hey Hecate</reason></invite>\
             <password>cauldronburn</password></x>"
            .parse()
            .unwrap();
        let user = MucUser::try_from(elem).unwrap();
        let invite = user.invite.unwrap();
        assert_eq!(
            invite.from.unwrap().to_string(),
            "crone1@shakespeare.lit/desktop"
        );
        assert_eq!(invite.reason.as_deref(), Some("Hey Hecate"));
        assert_eq!(user.password.as_deref(), Some("cauldronburn"));
    }

    #[test]
    fn test_actor_requires_one_of() {
        let elem: Element = "<actor xmlns='http://jabber.org/protocol/muc#user'/>"
            .parse()
            .unwrap();
        assert!(Actor::try_from(elem).is_err());
    }
}
