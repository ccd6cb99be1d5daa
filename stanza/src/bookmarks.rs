// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::BareJid;

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// A conference bookmark.
#[derive(Debug, Clone, PartialEq)]
pub struct Conference {
    /// Whether to join automatically at login.
    pub autojoin: bool,
    /// The room address.
    pub jid: BareJid,
    /// Display name.
    pub name: Option<String>,
    /// Preferred nickname in this room.
    pub nick: Option<String>,
    /// Room password.
    pub password: Option<String>,
}

impl Conference {
    /// Creates a bookmark for a room.
    pub fn new(jid: BareJid) -> Conference {
        Conference {
            autojoin: false,
            jid,
            name: None,
            nick: None,
            password: None,
        }
    }
}

impl TryFrom<Element> for Conference {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Conference, Error> {
        let elem = crate::util::check_element(elem, "conference", ns::BOOKMARKS)?;
        let autojoin = matches!(elem.attr("autojoin"), Some("1") | Some("true"));
        let jid = get_attr!(elem, "jid", Required);
        let name = elem.attr("name").map(String::from);
        let nick = elem.get_child("nick", ns::BOOKMARKS).map(Element::text);
        let password = elem.get_child("password", ns::BOOKMARKS).map(Element::text);
        Ok(Conference {
            autojoin,
            jid,
            name,
            nick,
            password,
        })
    }
}

impl From<Conference> for Element {
    fn from(conference: Conference) -> Element {
        let mut elem = Element::builder("conference", ns::BOOKMARKS)
            .attr("jid", conference.jid)
            .attr("name", conference.name)
            .attr(
                "autojoin",
                if conference.autojoin { Some("1") } else { None },
            )
            .build();
        if let Some(nick) = conference.nick {
            elem.append_child(Element::bare("nick", ns::BOOKMARKS))
                .append_text_node(nick);
        }
        if let Some(password) = conference.password {
            elem.append_child(Element::bare("password", ns::BOOKMARKS))
                .append_text_node(password);
        }
        elem
    }
}

/// The `storage:bookmarks` document kept in private XML storage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Storage {
    /// Conference bookmarks.
    pub conferences: Vec<Conference>,
    /// Children we don't model (urls, foreign extensions), kept verbatim
    /// so a round-trip never loses another client's data.
    pub extra: Vec<Element>,
}

impl Storage {
    /// Creates an empty bookmark storage.
    pub fn new() -> Storage {
        Storage::default()
    }
}

impl TryFrom<Element> for Storage {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Storage, Error> {
        let elem = crate::util::check_element(elem, "storage", ns::BOOKMARKS)?;
        let mut storage = Storage::new();
        for child in elem.children() {
            if child.is("conference", ns::BOOKMARKS) {
                storage.conferences.push(
                    Conference::try_from(child.clone()).map_err(Error::hide_type_mismatch)?,
                );
            } else {
                storage.extra.push(child.clone());
            }
        }
        Ok(storage)
    }
}

impl From<Storage> for Element {
    fn from(storage: Storage) -> Element {
        let mut elem = Element::bare("storage", ns::BOOKMARKS);
        for conference in storage.conferences {
            elem.append_child(conference.into());
        }
        for extra in storage.extra {
            elem.append_child(extra);
        }
        elem
    }
}

/// One annotation from `storage:rosternotes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// The contact the note is about.
    pub jid: String,
    /// Creation timestamp, kept verbatim.
    pub cdate: Option<String>,
    /// Modification timestamp, kept verbatim.
    pub mdate: Option<String>,
    /// The note text.
    pub text: String,
}

impl TryFrom<Element> for Note {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Note, Error> {
        let elem = crate::util::check_element(elem, "note", ns::ROSTERNOTES)?;
        let jid = match elem.attr("jid") {
            Some(jid) => jid.to_owned(),
            None => return Err(Error::ParseError("Required attribute 'jid' missing.")),
        };
        Ok(Note {
            jid,
            cdate: elem.attr("cdate").map(String::from),
            mdate: elem.attr("mdate").map(String::from),
            text: elem.text(),
        })
    }
}

impl From<Note> for Element {
    fn from(note: Note) -> Element {
        let mut elem = Element::builder("note", ns::ROSTERNOTES)
            .attr("jid", note.jid)
            .attr("cdate", note.cdate)
            .attr("mdate", note.mdate)
            .build();
        elem.append_text_node(note.text);
        elem
    }
}

/// The `storage:rosternotes` document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RosterNotes {
    /// The notes.
    pub notes: Vec<Note>,
}

impl TryFrom<Element> for RosterNotes {
    type Error = Error;

    fn try_from(elem: Element) -> Result<RosterNotes, Error> {
        let elem = crate::util::check_element(elem, "storage", ns::ROSTERNOTES)?;
        let mut notes = Vec::new();
        for child in elem.children() {
            if child.is("note", ns::ROSTERNOTES) {
                notes.push(Note::try_from(child.clone()).map_err(Error::hide_type_mismatch)?);
            }
        }
        Ok(RosterNotes { notes })
    }
}

impl From<RosterNotes> for Element {
    fn from(notes: RosterNotes) -> Element {
        let mut elem = Element::bare("storage", ns::ROSTERNOTES);
        for note in notes.notes {
            elem.append_child(note.into());
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_roundtrip() {
        let elem: Element = "<storage xmlns='storage:bookmarks'>\
             <conference jid='council@conference.underhill.org' name='Council of Oberon' autojoin='1'>\
             <nick>Puck</nick></conference></storage>"
            .parse()
            .unwrap();
        let storage = Storage::try_from(elem.clone()).unwrap();
        assert_eq!(storage.conferences.len(), 1);
        let conference = &storage.conferences[0];
        assert!(conference.autojoin);
        assert_eq!(conference.nick.as_deref(), Some("Puck"));
        let elem2: Element = storage.into();
        assert_eq!(elem, elem2);
    }

    #[test]
    fn test_unknown_children_survive() {
        let elem: Element = "<storage xmlns='storage:bookmarks'>\
             <url name='Admin' url='http://example.org/admin'/></storage>"
            .parse()
            .unwrap();
        let storage = Storage::try_from(elem).unwrap();
        assert!(storage.conferences.is_empty());
        assert_eq!(storage.extra.len(), 1);
        let elem: Element = storage.into();
        assert!(elem.has_child("url", ns::BOOKMARKS));
    }

    #[test]
    fn test_rosternotes() {
        let elem: Element = "<storage xmlns='storage:rosternotes'>\
             <note jid='hamlet@shakespeare.lit' cdate='2004-09-24T15:23:21Z'>Seems to be a good writer</note>\
             </storage>"
            .parse()
            .unwrap();
        let notes = RosterNotes::try_from(elem).unwrap();
        assert_eq!(notes.notes.len(), 1);
        assert_eq!(notes.notes[0].text, "Seems to be a good writer");
    }
}
