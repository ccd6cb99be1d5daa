// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload, IqSetPayload};
use crate::ns;

/// A `jabber:iq:private` query wrapping one stored document.  On a get,
/// the payload is an empty element naming what to fetch; on a set it is
/// the full document to store.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateQuery {
    /// The wrapped storage document.
    pub payload: Element,
}

impl PrivateQuery {
    /// Wraps a storage document.
    pub fn new(payload: Element) -> PrivateQuery {
        PrivateQuery { payload }
    }
}

impl IqGetPayload for PrivateQuery {}
impl IqSetPayload for PrivateQuery {}
impl IqResultPayload for PrivateQuery {}

impl TryFrom<Element> for PrivateQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<PrivateQuery, Error> {
        let elem = crate::util::check_element(elem, "query", ns::PRIVATE)?;
        let payload = elem
            .children()
            .next()
            .cloned()
            .ok_or(Error::ParseError("Empty private storage query."))?;
        Ok(PrivateQuery { payload })
    }
}

impl From<PrivateQuery> for Element {
    fn from(query: PrivateQuery) -> Element {
        let mut elem = Element::bare("query", ns::PRIVATE);
        elem.append_child(query.payload);
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let elem: Element = "<query xmlns='jabber:iq:private'>\
             <storage xmlns='storage:bookmarks'/></query>"
            .parse()
            .unwrap();
        let query = PrivateQuery::try_from(elem).unwrap();
        assert!(query.payload.is("storage", ns::BOOKMARKS));
    }

    #[test]
    fn test_empty_is_an_error() {
        let elem: Element = "<query xmlns='jabber:iq:private'/>".parse().unwrap();
        assert!(PrivateQuery::try_from(elem).is_err());
    }
}
