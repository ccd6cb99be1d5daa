// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Server-side bookmarks and roster notes, via private XML storage.
//!
//! Both documents are fetched once per session, cached whole, and pushed
//! back whole on every mutation, so other clients' unknown children
//! survive our edits.  A missing document on the server is simply an
//! empty one.

use jid::BareJid;

use causerie_stanza::bookmarks::{Conference, Note, RosterNotes, Storage};
use causerie_stanza::iq::{Iq, IqType};
use causerie_stanza::private::PrivateQuery;
use causerie_stanza::stanza_error::DefinedCondition;
use causerie_stanza::{ns, Element};

use crate::hbuf::LineFlags;
use crate::iq::IqContext;
use crate::session::Session;

/// The cached private-storage documents.
#[derive(Default)]
pub struct BookmarksStore {
    /// `storage:bookmarks`, once fetched.
    pub storage: Option<Storage>,
    /// `storage:rosternotes`, once fetched.
    pub notes: Option<RosterNotes>,
}

impl BookmarksStore {
    /// Creates an empty cache.
    pub fn new() -> BookmarksStore {
        BookmarksStore::default()
    }

    /// The bookmark for a room, when one exists.
    pub fn conference(&self, room: &str) -> Option<&Conference> {
        self.storage
            .as_ref()?
            .conferences
            .iter()
            .find(|conference| conference.jid.to_string().eq_ignore_ascii_case(room))
    }

    /// The note attached to a JID, when one exists.
    pub fn note(&self, jid: &str) -> Option<&Note> {
        self.notes
            .as_ref()?
            .notes
            .iter()
            .find(|note| note.jid.eq_ignore_ascii_case(jid))
    }
}

fn is_item_not_found(iq: &Iq) -> bool {
    matches!(
        &iq.payload,
        IqType::Error(error) if error.defined_condition == DefinedCondition::ItemNotFound
    )
}

/// Fetches `storage:bookmarks` and schedules the autojoins.
pub(crate) fn request_bookmarks(session: &mut Session, now: i64) {
    let query = PrivateQuery::new(Element::bare("storage", ns::BOOKMARKS));
    session.send_query(
        "bookmarks",
        move |id| Iq::from_get(id, query),
        now,
        0,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                let storage = match &iq.payload {
                    IqType::Result(Some(payload)) => PrivateQuery::try_from(payload.clone())
                        .ok()
                        .and_then(|private| Storage::try_from(private.payload).ok()),
                    _ => None,
                };
                let storage = storage.unwrap_or_default();
                let autojoin: Vec<(BareJid, Option<String>, Option<String>)> = storage
                    .conferences
                    .iter()
                    .filter(|conference| conference.autojoin)
                    .map(|conference| {
                        (
                            conference.jid.clone(),
                            conference.nick.clone(),
                            conference.password.clone(),
                        )
                    })
                    .collect();
                session.bookmarks.storage = Some(storage);
                for (room, nick, password) in autojoin {
                    if let Err(e) = crate::muc::join(
                        session,
                        &room,
                        nick.as_deref(),
                        password.as_deref(),
                        now,
                    ) {
                        log::error!("bookmark autojoin of {} failed: {}", room, e);
                    }
                }
            }
            IqContext::Error(iq) => {
                if is_item_not_found(iq) {
                    // First run: the user has no stored bookmarks yet.
                    session.bookmarks.storage = Some(Storage::new());
                } else {
                    session.log_line(
                        LineFlags::ERR,
                        "Unable to retrieve the bookmark list",
                        now,
                    );
                }
            }
            IqContext::Timeout => {
                log::info!("bookmark request timed out");
            }
        }),
    );
}

/// Fetches `storage:rosternotes`.
pub(crate) fn request_rosternotes(session: &mut Session, now: i64) {
    let query = PrivateQuery::new(Element::bare("storage", ns::ROSTERNOTES));
    session.send_query(
        "rosternotes",
        move |id| Iq::from_get(id, query),
        now,
        0,
        Box::new(move |session, context| match context {
            IqContext::Result(iq) => {
                let notes = match &iq.payload {
                    IqType::Result(Some(payload)) => PrivateQuery::try_from(payload.clone())
                        .ok()
                        .and_then(|private| RosterNotes::try_from(private.payload).ok()),
                    _ => None,
                };
                session.bookmarks.notes = Some(notes.unwrap_or_default());
            }
            IqContext::Error(iq) => {
                if is_item_not_found(iq) {
                    session.bookmarks.notes = Some(RosterNotes::default());
                } else {
                    session.log_line(
                        LineFlags::ERR,
                        "Unable to retrieve the roster notes",
                        now,
                    );
                }
            }
            IqContext::Timeout => {
                log::info!("roster notes request timed out");
            }
        }),
    );
}

fn push_bookmarks(session: &mut Session, now: i64) {
    let Some(storage) = session.bookmarks.storage.clone() else { return };
    let query = PrivateQuery::new(storage.into());
    session.send_query(
        "bookmarks",
        move |id| Iq::from_set(id, query),
        now,
        0,
        Box::new(move |session, context| {
            if matches!(context, IqContext::Error(_)) {
                session.log_line(LineFlags::ERR, "Unable to store the bookmark list", now);
            }
        }),
    );
}

fn push_rosternotes(session: &mut Session, now: i64) {
    let Some(notes) = session.bookmarks.notes.clone() else { return };
    let query = PrivateQuery::new(notes.into());
    session.send_query(
        "rosternotes",
        move |id| Iq::from_set(id, query),
        now,
        0,
        Box::new(move |session, context| {
            if matches!(context, IqContext::Error(_)) {
                session.log_line(LineFlags::ERR, "Unable to store the roster notes", now);
            }
        }),
    );
}

/// Adds or replaces a conference bookmark and pushes the document.
pub(crate) fn set_bookmark(session: &mut Session, conference: Conference, now: i64) {
    let storage = session
        .bookmarks
        .storage
        .get_or_insert_with(Storage::new);
    storage
        .conferences
        .retain(|existing| existing.jid != conference.jid);
    storage.conferences.push(conference);
    push_bookmarks(session, now);
}

/// Removes a conference bookmark and pushes the document.
pub(crate) fn del_bookmark(session: &mut Session, room: &BareJid, now: i64) {
    let Some(storage) = session.bookmarks.storage.as_mut() else { return };
    let before = storage.conferences.len();
    storage.conferences.retain(|existing| &existing.jid != room);
    if storage.conferences.len() != before {
        push_bookmarks(session, now);
    }
}

/// Sets (or, with an empty text, deletes) a roster note.
pub(crate) fn set_note(session: &mut Session, jid: &str, text: &str, now: i64) {
    let notes = session
        .bookmarks
        .notes
        .get_or_insert_with(RosterNotes::default);
    notes.notes.retain(|note| !note.jid.eq_ignore_ascii_case(jid));
    if !text.is_empty() {
        notes.notes.push(Note {
            jid: jid.to_owned(),
            cdate: None,
            mdate: None,
            text: text.to_owned(),
        });
    }
    push_rosternotes(session, now);
}
