// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload};
use crate::ns;

/// An empty `jabber:iq:version` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionQuery;

impl IqGetPayload for VersionQuery {}

impl TryFrom<Element> for VersionQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<VersionQuery, Error> {
        crate::util::check_element(elem, "query", ns::VERSION)?;
        Ok(VersionQuery)
    }
}

impl From<VersionQuery> for Element {
    fn from(_: VersionQuery) -> Element {
        Element::bare("query", ns::VERSION)
    }
}

/// A software version reply.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionResult {
    /// The natural-language name of the software.
    pub name: String,
    /// The software version.
    pub version: String,
    /// The operating system, hidden by privacy-conscious clients.
    pub os: Option<String>,
}

impl IqResultPayload for VersionResult {}

impl TryFrom<Element> for VersionResult {
    type Error = Error;

    fn try_from(elem: Element) -> Result<VersionResult, Error> {
        let elem = crate::util::check_element(elem, "query", ns::VERSION)?;
        let name = elem
            .get_child("name", ns::VERSION)
            .map(Element::text)
            .ok_or(Error::ParseError("Missing name in version reply."))?;
        let version = elem
            .get_child("version", ns::VERSION)
            .map(Element::text)
            .ok_or(Error::ParseError("Missing version in version reply."))?;
        let os = elem.get_child("os", ns::VERSION).map(Element::text);
        Ok(VersionResult { name, version, os })
    }
}

impl From<VersionResult> for Element {
    fn from(version: VersionResult) -> Element {
        let mut elem = Element::bare("query", ns::VERSION);
        elem.append_child(Element::bare("name", ns::VERSION))
            .append_text_node(version.name);
        elem.append_child(Element::bare("version", ns::VERSION))
            .append_text_node(version.version);
        if let Some(os) = version.os {
            elem.append_child(Element::bare("os", ns::VERSION))
                .append_text_node(os);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let result = VersionResult {
            name: "causerie".to_owned(),
            version: "0.1.0".to_owned(),
            os: Some("Linux".to_owned()),
        };
        let elem: Element = result.clone().into();
        assert_eq!(VersionResult::try_from(elem).unwrap(), result);
    }

    #[test]
    fn test_missing_version() {
        let elem: Element = "<query xmlns='jabber:iq:version'><name>x</name></query>"
            .parse()
            .unwrap();
        assert!(VersionResult::try_from(elem).is_err());
    }
}
