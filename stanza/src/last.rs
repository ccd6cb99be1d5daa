// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload};
use crate::ns;

/// A `jabber:iq:last` query or reply.  As a query both fields are unset;
/// as a reply `seconds` is the idle time (for an online resource) or the
/// time since last connection (for an account).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LastActivity {
    /// Seconds since last activity; absent on queries.
    pub seconds: Option<u64>,
    /// Status text an offline account left behind.
    pub status: Option<String>,
}

impl IqGetPayload for LastActivity {}
impl IqResultPayload for LastActivity {}

impl TryFrom<Element> for LastActivity {
    type Error = Error;

    fn try_from(elem: Element) -> Result<LastActivity, Error> {
        let elem = crate::util::check_element(elem, "query", ns::LAST)?;
        let seconds = get_attr!(elem, "seconds", Option);
        let text = elem.text();
        let status = if text.is_empty() { None } else { Some(text) };
        Ok(LastActivity { seconds, status })
    }
}

impl From<LastActivity> for Element {
    fn from(last: LastActivity) -> Element {
        let mut elem = Element::builder("query", ns::LAST)
            .attr("seconds", last.seconds)
            .build();
        if let Some(status) = last.status {
            elem.append_text_node(status);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query() {
        let elem: Element = LastActivity::default().into();
        assert_eq!(elem.attr("seconds"), None);
        let parsed = LastActivity::try_from(elem).unwrap();
        assert_eq!(parsed, LastActivity::default());
    }

    #[test]
    fn test_reply() {
        let elem: Element = "<query xmlns='jabber:iq:last' seconds='903'>Heading home</query>"
            .parse()
            .unwrap();
        let last = LastActivity::try_from(elem).unwrap();
        assert_eq!(last.seconds, Some(903));
        assert_eq!(last.status.as_deref(), Some("Heading home"));
    }
}
