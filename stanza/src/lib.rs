//! Stanza codec for the causerie XMPP client.
//!
//! The [`Element`] type is a small namespace-aware XML tree; every protocol
//! module implements `TryFrom<Element>` to parse a received stanza (or a
//! payload of one) into a typed structure, and `From<T> for Element` to
//! serialise it back for the wire.  [`xmlstream::XmlStream`] frames a byte
//! transport into stream headers, stanza elements and the stream footer.

// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![warn(missing_docs)]

pub use jid;

pub use crate::element::{Element, Node};
pub use crate::error::Error;

/// XML namespace definitions used through XMPP.
pub mod ns;

#[macro_use]
mod util;

/// The XML tree the codec produces and consumes.
pub mod element;
/// Async framing of a byte transport into stanzas.
pub mod xmlstream;

mod error;

/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod bind;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod iq;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod message;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod presence;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod sasl;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod stanza_error;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod starttls;
/// RFC 6120: Extensible Messaging and Presence Protocol (XMPP): Core
pub mod stream_features;

/// RFC 6121: Extensible Messaging and Presence Protocol (XMPP): Instant Messaging and Presence
pub mod roster;

/// XEP-0004: Data Forms
pub mod data_forms;

/// XEP-0012: Last Activity
pub mod last;

/// XEP-0027: Current Jabber OpenPGP Usage
pub mod pgp;

/// XEP-0030: Service Discovery
pub mod disco;

/// XEP-0045: Multi-User Chat
pub mod muc;

/// XEP-0048: Bookmarks
pub mod bookmarks;

/// XEP-0049: Private XML storage
pub mod private;

/// XEP-0050: Ad-Hoc Commands
pub mod commands;

/// XEP-0085: Chat State Notifications
pub mod chatstates;

/// XEP-0092: Software Version
pub mod version;

/// XEP-0115: Entity Capabilities
pub mod caps;

/// XEP-0184: Message Delivery Receipts
pub mod receipts;

/// XEP-0199: XMPP Ping
pub mod ping;

/// XEP-0202: Entity Time
pub mod time;

/// XEP-0203: Delayed Delivery (and the legacy jabber:x:delay form)
pub mod delay;

use crate::iq::Iq;
use crate::message::Message;
use crate::presence::Presence;

/// A top-level stanza, dispatched on its element name.
#[derive(Debug, Clone)]
pub enum Stanza {
    /// A `<message/>` stanza.
    Message(Message),
    /// A `<presence/>` stanza.
    Presence(Presence),
    /// An `<iq/>` stanza.
    Iq(Iq),
}

impl TryFrom<Element> for Stanza {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Stanza, Error> {
        match elem.name() {
            "message" => Ok(Stanza::Message(Message::try_from(elem)?)),
            "presence" => Ok(Stanza::Presence(Presence::try_from(elem)?)),
            "iq" => Ok(Stanza::Iq(Iq::try_from(elem)?)),
            _ => Err(Error::ParseError("Not a stanza element.")),
        }
    }
}

impl From<Stanza> for Element {
    fn from(stanza: Stanza) -> Element {
        match stanza {
            Stanza::Message(m) => m.into(),
            Stanza::Presence(p) => p.into(),
            Stanza::Iq(i) => i.into(),
        }
    }
}
