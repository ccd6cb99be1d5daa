// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, Utc};

use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqGetPayload, IqResultPayload};
use crate::ns;

/// An empty `urn:xmpp:time` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeQuery;

impl IqGetPayload for TimeQuery {}

impl TryFrom<Element> for TimeQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<TimeQuery, Error> {
        crate::util::check_element(elem, "time", ns::TIME)?;
        Ok(TimeQuery)
    }
}

impl From<TimeQuery> for Element {
    fn from(_: TimeQuery) -> Element {
        Element::bare("time", ns::TIME)
    }
}

/// An entity-time reply: the UTC instant plus the entity's numeric offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeResult {
    /// The entity's offset from UTC.
    pub tzo: FixedOffset,
    /// The current UTC time.
    pub utc: DateTime<Utc>,
}

impl IqResultPayload for TimeResult {}

impl TryFrom<Element> for TimeResult {
    type Error = Error;

    fn try_from(elem: Element) -> Result<TimeResult, Error> {
        let elem = crate::util::check_element(elem, "time", ns::TIME)?;
        let tzo = elem
            .get_child("tzo", ns::TIME)
            .map(Element::text)
            .ok_or(Error::ParseError("Missing tzo in time reply."))?;
        let tzo: FixedOffset = tzo.parse()?;
        let utc = elem
            .get_child("utc", ns::TIME)
            .map(Element::text)
            .ok_or(Error::ParseError("Missing utc in time reply."))?;
        let utc = DateTime::parse_from_rfc3339(&utc)?.with_timezone(&Utc);
        Ok(TimeResult { tzo, utc })
    }
}

impl From<TimeResult> for Element {
    fn from(time: TimeResult) -> Element {
        let mut elem = Element::bare("time", ns::TIME);
        elem.append_child(Element::bare("tzo", ns::TIME))
            .append_text_node(time.tzo.to_string());
        elem.append_child(Element::bare("utc", ns::TIME))
            .append_text_node(time.utc.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse() {
        let elem: Element =
            "<time xmlns='urn:xmpp:time'><tzo>-06:00</tzo><utc>2006-12-19T17:58:35Z</utc></time>"
                .parse()
                .unwrap();
        let time = TimeResult::try_from(elem).unwrap();
        assert_eq!(time.tzo, FixedOffset::west_opt(6 * 3600).unwrap());
        assert_eq!(
            time.utc,
            Utc.with_ymd_and_hms(2006, 12, 19, 17, 58, 35).unwrap()
        );
    }

    #[test]
    fn test_serialize() {
        let time = TimeResult {
            tzo: FixedOffset::east_opt(3600).unwrap(),
            utc: Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap(),
        };
        let elem: Element = time.into();
        assert_eq!(elem.get_child("tzo", ns::TIME).unwrap().text(), "+01:00");
        assert_eq!(
            elem.get_child("utc", ns::TIME).unwrap().text(),
            "2020-06-01T12:00:00Z"
        );
    }
}
