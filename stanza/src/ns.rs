// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! XML namespace definitions used through XMPP.

/// RFC 6120: XML streams
pub const STREAM: &str = "http://etherx.jabber.org/streams";
/// RFC 6120: client namespace
pub const JABBER_CLIENT: &str = "jabber:client";
/// RFC 6120: stream errors
pub const XMPP_STREAMS: &str = "urn:ietf:params:xml:ns:xmpp-streams";
/// RFC 6120: stanza errors
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";
/// RFC 6120: TLS stream negotiation
pub const TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";
/// RFC 6120: SASL authentication
pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
/// RFC 6120: resource binding
pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";

/// RFC 6121: contact list
pub const ROSTER: &str = "jabber:iq:roster";

/// The xml: prefix namespace, always predeclared.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// XEP-0004: Data Forms
pub const DATA_FORMS: &str = "jabber:x:data";

/// XEP-0012: Last Activity
pub const LAST: &str = "jabber:iq:last";

/// XEP-0027: encrypted message bodies
pub const ENCRYPTED: &str = "jabber:x:encrypted";
/// XEP-0027: signed presence
pub const SIGNED: &str = "jabber:x:signed";

/// XEP-0030: Service Discovery
pub const DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";
/// XEP-0030: Service Discovery
pub const DISCO_ITEMS: &str = "http://jabber.org/protocol/disco#items";

/// XEP-0045: Multi-User Chat
pub const MUC: &str = "http://jabber.org/protocol/muc";
/// XEP-0045: Multi-User Chat occupant information
pub const MUC_USER: &str = "http://jabber.org/protocol/muc#user";
/// XEP-0045: Multi-User Chat admin queries
pub const MUC_ADMIN: &str = "http://jabber.org/protocol/muc#admin";
/// XEP-0045: Multi-User Chat owner queries
pub const MUC_OWNER: &str = "http://jabber.org/protocol/muc#owner";

/// XEP-0048: Bookmarks
pub const BOOKMARKS: &str = "storage:bookmarks";
/// Roster annotations stored in private XML storage.
pub const ROSTERNOTES: &str = "storage:rosternotes";

/// XEP-0049: Private XML storage
pub const PRIVATE: &str = "jabber:iq:private";

/// XEP-0050: Ad-Hoc Commands
pub const COMMANDS: &str = "http://jabber.org/protocol/commands";

/// XEP-0085: Chat State Notifications
pub const CHATSTATES: &str = "http://jabber.org/protocol/chatstates";

/// XEP-0090: legacy Entity Time
pub const TIME_OLD: &str = "jabber:iq:time";

/// XEP-0091: legacy Delayed Delivery
pub const DELAY_OLD: &str = "jabber:x:delay";

/// XEP-0092: Software Version
pub const VERSION: &str = "jabber:iq:version";

/// XEP-0115: Entity Capabilities
pub const CAPS: &str = "http://jabber.org/protocol/caps";

/// XEP-0146: remote controlling clients (ad-hoc command nodes)
pub const RC_SET_STATUS: &str = "http://jabber.org/protocol/rc#set-status";
/// XEP-0146: remote controlling clients (ad-hoc command nodes)
pub const RC_LEAVE_GROUPCHATS: &str = "http://jabber.org/protocol/rc#leave-groupchats";

/// XEP-0184: Message Delivery Receipts
pub const RECEIPTS: &str = "urn:xmpp:receipts";

/// XEP-0199: XMPP Ping
pub const PING: &str = "urn:xmpp:ping";

/// XEP-0202: Entity Time
pub const TIME: &str = "urn:xmpp:time";

/// XEP-0203: Delayed Delivery
pub const DELAY: &str = "urn:xmpp:delay";
