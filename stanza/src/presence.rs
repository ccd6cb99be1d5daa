// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;

use crate::element::Element;
use crate::error::Error;
use crate::ns;
use crate::stanza_error::StanzaError;

/// The type of a presence stanza.  `None` is the absence of the attribute:
/// a normal "available" broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Type {
    /// Available presence (no `type` attribute on the wire).
    #[default]
    None,
    /// The sender is no longer available.
    Unavailable,
    /// A request to subscribe to the recipient's presence.
    Subscribe,
    /// The subscription request was accepted.
    Subscribed,
    /// A request to unsubscribe from the recipient's presence.
    Unsubscribe,
    /// The subscription was removed.
    Unsubscribed,
    /// A request for the recipient's current presence.
    Probe,
    /// Delivery of an earlier presence failed.
    Error,
    /// Legacy invisibility request.
    Invisible,
}

impl std::str::FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Type, Error> {
        Ok(match s {
            "unavailable" => Type::Unavailable,
            "subscribe" => Type::Subscribe,
            "subscribed" => Type::Subscribed,
            "unsubscribe" => Type::Unsubscribe,
            "unsubscribed" => Type::Unsubscribed,
            "probe" => Type::Probe,
            "error" => Type::Error,
            "invisible" => Type::Invisible,
            _ => return Err(Error::ParseError("Unknown value for 'type' attribute.")),
        })
    }
}

impl Type {
    fn attr(self) -> Option<&'static str> {
        match self {
            Type::None => None,
            Type::Unavailable => Some("unavailable"),
            Type::Subscribe => Some("subscribe"),
            Type::Subscribed => Some("subscribed"),
            Type::Unsubscribe => Some("unsubscribe"),
            Type::Unsubscribed => Some("unsubscribed"),
            Type::Probe => Some("probe"),
            Type::Error => Some("error"),
            Type::Invisible => Some("invisible"),
        }
    }
}

generate_attribute!(
    /// The `<show/>` value refining an available presence.
    Show, "show", {
        /// Free for chat.
        Chat => "chat",

        /// Away for a short time.
        Away => "away",

        /// Extended away.
        Xa => "xa",

        /// Do not disturb.
        Dnd => "dnd",
    }
);

/// A presence stanza.
#[derive(Debug, Clone)]
pub struct Presence {
    /// The sender.
    pub from: Option<Jid>,
    /// The recipient; absent means a broadcast through the server.
    pub to: Option<Jid>,
    /// Stanza id.
    pub id: Option<String>,
    /// The presence type.
    pub type_: Type,
    /// Availability refinement.
    pub show: Option<Show>,
    /// Free-text status message.
    pub status: Option<String>,
    /// Resource priority, `-128..=127`.
    pub priority: i8,
    /// Extension children (caps, MUC join/user data, signatures, delays).
    pub payloads: Vec<Element>,
}

impl Presence {
    /// Creates a presence of the given type.
    pub fn new(type_: Type) -> Presence {
        Presence {
            from: None,
            to: None,
            id: None,
            type_,
            show: None,
            status: None,
            priority: 0,
            payloads: Vec::new(),
        }
    }

    /// Sets the recipient.
    pub fn with_to(mut self, to: Jid) -> Presence {
        self.to = Some(to);
        self
    }

    /// Sets the `<show/>` value.
    pub fn with_show(mut self, show: Show) -> Presence {
        self.show = Some(show);
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i8) -> Presence {
        self.priority = priority;
        self
    }

    /// Sets the status message.
    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = Some(status.into());
    }

    /// Appends an extension payload.
    pub fn add_payload<P: Into<Element>>(&mut self, payload: P) {
        self.payloads.push(payload.into());
    }

    /// Finds a payload child by name and namespace.
    pub fn get_payload(&self, name: &str, namespace: &str) -> Option<&Element> {
        self.payloads.iter().find(|p| p.is(name, namespace))
    }

    /// The `<error/>` child, when `type_` is [`Type::Error`].
    pub fn error(&self) -> Option<StanzaError> {
        self.payloads
            .iter()
            .find(|p| p.is("error", ns::JABBER_CLIENT))
            .and_then(|elem| StanzaError::try_from(elem.clone()).ok())
    }
}

impl TryFrom<Element> for Presence {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Presence, Error> {
        let elem = crate::util::check_element(elem, "presence", ns::JABBER_CLIENT)?;
        let from = get_attr!(elem, "from", Option);
        let to = get_attr!(elem, "to", Option);
        let id = elem.attr("id").map(String::from);
        let type_ = get_attr!(elem, "type", Default);
        let mut show = None;
        let mut status = None;
        let mut priority = 0i8;
        let mut payloads = Vec::new();
        for child in elem.children() {
            if child.is("show", ns::JABBER_CLIENT) {
                show = Some(child.text().parse()?);
            } else if child.is("status", ns::JABBER_CLIENT) {
                status = Some(child.text());
            } else if child.is("priority", ns::JABBER_CLIENT) {
                priority = child.text().parse()?;
            } else {
                payloads.push(child.clone());
            }
        }
        Ok(Presence {
            from,
            to,
            id,
            type_,
            show,
            status,
            priority,
            payloads,
        })
    }
}

impl From<Presence> for Element {
    fn from(presence: Presence) -> Element {
        let mut elem = Element::builder("presence", ns::JABBER_CLIENT)
            .attr("from", presence.from)
            .attr("to", presence.to)
            .attr("id", presence.id)
            .attr("type", presence.type_.attr())
            .build();
        if let Some(show) = presence.show {
            let mut child = Element::bare("show", ns::JABBER_CLIENT);
            child.append_text_node(show.to_string());
            elem.append_child(child);
        }
        if let Some(status) = presence.status {
            let mut child = Element::bare("status", ns::JABBER_CLIENT);
            child.append_text_node(status);
            elem.append_child(child);
        }
        if presence.priority != 0 {
            let mut child = Element::bare("priority", ns::JABBER_CLIENT);
            child.append_text_node(presence.priority.to_string());
            elem.append_child(child);
        }
        for payload in presence.payloads {
            elem.append_child(payload);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_available() {
        let elem: Element = "<presence xmlns='jabber:client' from='alice@ex/desk'>\
             <show>dnd</show><status>working</status><priority>5</priority>\
             </presence>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.type_, Type::None);
        assert_eq!(presence.show, Some(Show::Dnd));
        assert_eq!(presence.status.as_deref(), Some("working"));
        assert_eq!(presence.priority, 5);
    }

    #[test]
    fn test_parse_subscribe() {
        let elem: Element = "<presence xmlns='jabber:client' from='bob@ex' type='subscribe'/>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.type_, Type::Subscribe);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut presence = Presence::new(Type::None)
            .with_show(Show::Away)
            .with_priority(-1);
        presence.set_status("afk");
        let elem: Element = presence.into();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.show, Some(Show::Away));
        assert_eq!(presence.priority, -1);
        assert_eq!(presence.status.as_deref(), Some("afk"));
    }

    #[test]
    fn test_negative_priority_wire() {
        let elem: Element = Presence::new(Type::None).with_priority(-128).into();
        assert_eq!(
            elem.get_child("priority", ns::JABBER_CLIENT).unwrap().text(),
            "-128"
        );
    }
}
