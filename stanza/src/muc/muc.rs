// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// How much room history to request on join.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct History {
    /// Maximum number of stanzas to replay.
    pub maxstanzas: Option<u32>,
    /// Only replay messages newer than this many seconds.
    pub seconds: Option<u32>,
}

impl From<History> for Element {
    fn from(history: History) -> Element {
        Element::builder("history", ns::MUC)
            .attr("maxstanzas", history.maxstanzas)
            .attr("seconds", history.seconds)
            .build()
    }
}

impl TryFrom<Element> for History {
    type Error = Error;

    fn try_from(elem: Element) -> Result<History, Error> {
        let elem = crate::util::check_element(elem, "history", ns::MUC)?;
        Ok(History {
            maxstanzas: get_attr!(elem, "maxstanzas", Option),
            seconds: get_attr!(elem, "seconds", Option),
        })
    }
}

/// The `<x/>` payload a client attaches to its join presence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Muc {
    /// Room password, for protected rooms.
    pub password: Option<String>,
    /// History replay request.
    pub history: Option<History>,
}

impl Muc {
    /// Creates an empty join payload.
    pub fn new() -> Muc {
        Muc::default()
    }

    /// Sets the password.
    pub fn with_password<S: Into<String>>(mut self, password: S) -> Muc {
        self.password = Some(password.into());
        self
    }

    /// Sets the history request.
    pub fn with_history(mut self, history: History) -> Muc {
        self.history = Some(history);
        self
    }
}

impl TryFrom<Element> for Muc {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Muc, Error> {
        let elem = crate::util::check_element(elem, "x", ns::MUC)?;
        let password = elem.get_child("password", ns::MUC).map(Element::text);
        let history = elem
            .get_child("history", ns::MUC)
            .cloned()
            .map(History::try_from)
            .transpose()
            .map_err(Error::hide_type_mismatch)?;
        Ok(Muc { password, history })
    }
}

impl From<Muc> for Element {
    fn from(muc: Muc) -> Element {
        let mut elem = Element::bare("x", ns::MUC);
        if let Some(password) = muc.password {
            elem.append_child(Element::bare("password", ns::MUC))
                .append_text_node(password);
        }
        if let Some(history) = muc.history {
            elem.append_child(history.into());
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_join() {
        let elem: Element = Muc::new().into();
        assert!(elem.is("x", ns::MUC));
        assert!(elem.nodes().next().is_none());
    }

    #[test]
    fn test_password_and_history() {
        let muc = Muc::new().with_password("s3kr3t").with_history(History {
            maxstanzas: Some(20),
            seconds: None,
        });
        let elem: Element = muc.clone().into();
        let reparsed = Muc::try_from(elem).unwrap();
        assert_eq!(reparsed, muc);
    }
}
