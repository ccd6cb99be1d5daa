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

generate_attribute!(
    /// The type of a message.
    MessageType, "type", {
        /// Standalone message.
        Normal => "normal",

        /// One-to-one conversation.
        Chat => "chat",

        /// Multi-user chat.
        Groupchat => "groupchat",

        /// Server or service announcement.
        Headline => "headline",

        /// Delivery failure bounce.
        Error => "error",
    }, Default = Normal
);

/// A message stanza.  Payload children which carry their own protocol
/// semantics (chat states, delays, receipts, encrypted bodies, MUC user
/// data) stay as [`Element`]s in `payloads` and are interpreted by their
/// own modules.
#[derive(Debug, Clone)]
pub struct Message {
    /// The sender.
    pub from: Option<Jid>,
    /// The recipient.
    pub to: Option<Jid>,
    /// Stanza id, mandatory for receipt tracking.
    pub id: Option<String>,
    /// The message type.
    pub type_: MessageType,
    /// `<body/>` text.
    pub body: Option<String>,
    /// `<subject/>` text: conversation subject or MUC topic.
    pub subject: Option<String>,
    /// `<thread/>` text.
    pub thread: Option<String>,
    /// Every other child, in document order.
    pub payloads: Vec<Element>,
}

impl Message {
    /// Creates a chat message to the given recipient.
    pub fn chat(to: Jid) -> Message {
        Message {
            from: None,
            to: Some(to),
            id: None,
            type_: MessageType::Chat,
            body: None,
            subject: None,
            thread: None,
            payloads: Vec::new(),
        }
    }

    /// Creates a groupchat message to the given room.
    pub fn groupchat(to: Jid) -> Message {
        Message {
            type_: MessageType::Groupchat,
            ..Message::chat(to)
        }
    }

    /// Sets the body.
    pub fn with_body<S: Into<String>>(mut self, body: S) -> Message {
        self.body = Some(body.into());
        self
    }

    /// Sets the id.
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Message {
        self.id = Some(id.into());
        self
    }

    /// Appends an extension payload.
    pub fn add_payload<P: Into<Element>>(&mut self, payload: P) {
        self.payloads.push(payload.into());
    }

    /// Finds a payload child by name and namespace.
    pub fn get_payload(&self, name: &str, namespace: &str) -> Option<&Element> {
        self.payloads.iter().find(|p| p.is(name, namespace))
    }

    /// The `<error/>` child, when `type_` is [`MessageType::Error`].
    pub fn error(&self) -> Option<StanzaError> {
        self.get_payload("error", ns::JABBER_CLIENT)
            .and_then(|elem| StanzaError::try_from(elem.clone()).ok())
    }
}

impl TryFrom<Element> for Message {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Message, Error> {
        let elem = crate::util::check_element(elem, "message", ns::JABBER_CLIENT)?;
        let from = get_attr!(elem, "from", Option);
        let to = get_attr!(elem, "to", Option);
        let id = elem.attr("id").map(String::from);
        let type_ = get_attr!(elem, "type", Default);
        let mut body = None;
        let mut subject = None;
        let mut thread = None;
        let mut payloads = Vec::new();
        for child in elem.children() {
            if child.is("body", ns::JABBER_CLIENT) {
                body = Some(child.text());
            } else if child.is("subject", ns::JABBER_CLIENT) {
                subject = Some(child.text());
            } else if child.is("thread", ns::JABBER_CLIENT) {
                thread = Some(child.text());
            } else {
                payloads.push(child.clone());
            }
        }
        Ok(Message {
            from,
            to,
            id,
            type_,
            body,
            subject,
            thread,
            payloads,
        })
    }
}

impl From<Message> for Element {
    fn from(message: Message) -> Element {
        let mut elem = Element::builder("message", ns::JABBER_CLIENT)
            .attr("from", message.from)
            .attr("to", message.to)
            .attr("id", message.id)
            .attr(
                "type",
                match message.type_ {
                    // The default on the wire; skip the attribute.
                    MessageType::Normal => None,
                    type_ => Some(type_.to_string()),
                },
            )
            .build();
        if let Some(subject) = message.subject {
            let mut child = Element::bare("subject", ns::JABBER_CLIENT);
            child.append_text_node(subject);
            elem.append_child(child);
        }
        if let Some(body) = message.body {
            let mut child = Element::bare("body", ns::JABBER_CLIENT);
            child.append_text_node(body);
            elem.append_child(child);
        }
        if let Some(thread) = message.thread {
            let mut child = Element::bare("thread", ns::JABBER_CLIENT);
            child.append_text_node(thread);
            elem.append_child(child);
        }
        for payload in message.payloads {
            elem.append_child(payload);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatstates::ChatState;

    #[test]
    fn test_parse_chat() {
        let elem: Element = "<message xmlns='jabber:client' from='alice@ex/desk' type='chat'>\
             <body>hi</body>\
             <active xmlns='http://jabber.org/protocol/chatstates'/>\
             </message>"
            .parse()
            .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.type_, MessageType::Chat);
        assert_eq!(message.body.as_deref(), Some("hi"));
        let state = message
            .get_payload("active", ns::CHATSTATES)
            .cloned()
            .map(ChatState::try_from)
            .unwrap()
            .unwrap();
        assert_eq!(state, ChatState::Active);
    }

    #[test]
    fn test_default_type_is_normal() {
        let elem: Element = "<message xmlns='jabber:client'><body>x</body></message>"
            .parse()
            .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.type_, MessageType::Normal);
    }

    #[test]
    fn test_serialize_skips_normal_type() {
        let elem: Element = Message::chat("a@b".parse().unwrap())
            .with_body("hello")
            .into();
        assert_eq!(elem.attr("type"), Some("chat"));
        let elem: Element = Message {
            type_: MessageType::Normal,
            ..Message::chat("a@b".parse().unwrap())
        }
        .into();
        assert_eq!(elem.attr("type"), None);
    }

    #[test]
    fn test_subject_roundtrip() {
        let mut message = Message::groupchat("room@muc.ex".parse().unwrap());
        message.subject = Some("today: hbuf internals".to_owned());
        let elem: Element = message.into();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.subject.as_deref(), Some("today: hbuf internals"));
        assert_eq!(message.body, None);
    }
}
