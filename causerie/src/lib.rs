//! causerie, a console-oriented XMPP client core.
//!
//! This crate is the engine of a terminal instant-messaging client: the
//! session state machine (connection lifecycle, stanza routing, IQ
//! correlation, roster, multi-user chat, presence and chat states) and
//! the scrollback buffers with their on-disk history.  Rendering, key
//! handling and command parsing are the embedder's business; the
//! [`Session`] exposes typed operations for every command verb and a
//! stream of [`Event`]s saying what turned stale.
//!
//! The [`Client`] drives exactly one logged-in identity over one socket
//! from a single task; all session state is owned, never shared.

// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![warn(missing_docs)]

pub use causerie_stanza as stanza;
pub use jid;

pub use crate::client::Client;
pub use crate::config::{ContactCrypto, SessionBuilder, SessionConfig, TlsMode};
pub use crate::error::{AuthError, Error, ProtocolError, TlsError};
pub use crate::event::Event;
pub use crate::events::EventContext;
pub use crate::muc::PrintStatusPolicy;
pub use crate::presence::AuthVerb;
pub use crate::roster::Status;
pub use crate::session::{ConnState, Session};

/// The scrollback data structure and its line flags.
pub mod hbuf;
/// The contact-list model.
pub mod roster;

/// PGP/OTR envelope hooks.
pub mod crypto;

mod bookmarks;
mod buffers;
mod caps;
mod chatstates;
mod client;
mod config;
mod connect;
mod error;
mod event;
mod events;
mod histolog;
mod iq;
mod login;
mod message;
mod muc;
mod presence;
mod session;
