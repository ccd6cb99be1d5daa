// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{DateTime, NaiveDateTime, Utc};
use jid::Jid;

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// Timestamp attached to a stanza which was stored and forwarded, either in
/// the `urn:xmpp:delay` form or the legacy `jabber:x:delay` one.
#[derive(Debug, Clone, PartialEq)]
pub struct Delay {
    /// The entity which stored the stanza.
    pub from: Option<Jid>,
    /// When the stanza was originally sent.
    pub stamp: DateTime<Utc>,
    /// Optional reason for the delay.
    pub data: Option<String>,
}

// The legacy profile writes "CCYYMMDDThh:mm:ss" in UTC.
const LEGACY_FORMAT: &str = "%Y%m%dT%H:%M:%S";

fn parse_stamp(stamp: &str, legacy: bool) -> Result<DateTime<Utc>, Error> {
    if legacy {
        let naive = NaiveDateTime::parse_from_str(stamp, LEGACY_FORMAT)?;
        Ok(naive.and_utc())
    } else {
        Ok(DateTime::parse_from_rfc3339(stamp)?.with_timezone(&Utc))
    }
}

impl Delay {
    /// Extracts the delay timestamp from a stanza's payloads, trying the
    /// current namespace before the legacy one.
    pub fn from_payloads(payloads: &[Element]) -> Option<Delay> {
        for payload in payloads {
            if payload.is("delay", ns::DELAY) || payload.is("x", ns::DELAY_OLD) {
                if let Ok(delay) = Delay::try_from(payload.clone()) {
                    return Some(delay);
                }
            }
        }
        None
    }
}

impl TryFrom<Element> for Delay {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Delay, Error> {
        let legacy = if elem.is("delay", ns::DELAY) {
            false
        } else if elem.is("x", ns::DELAY_OLD) {
            true
        } else {
            return Err(Error::TypeMismatch(ns::DELAY, "delay", elem));
        };
        let from = get_attr!(elem, "from", Option);
        let stamp = match elem.attr("stamp") {
            Some(stamp) => parse_stamp(stamp, legacy)?,
            None => return Err(Error::ParseError("Required attribute 'stamp' missing.")),
        };
        let text = elem.text();
        let data = if text.is_empty() { None } else { Some(text) };
        Ok(Delay { from, stamp, data })
    }
}

impl From<Delay> for Element {
    fn from(delay: Delay) -> Element {
        let mut elem = Element::builder("delay", ns::DELAY)
            .attr("from", delay.from)
            .attr("stamp", delay.stamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .build();
        if let Some(data) = delay.data {
            elem.append_text_node(data);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_modern() {
        let elem: Element =
            "<delay xmlns='urn:xmpp:delay' from='ex.com' stamp='2006-07-11T16:43:12Z'/>"
                .parse()
                .unwrap();
        let delay = Delay::try_from(elem).unwrap();
        assert_eq!(delay.stamp, Utc.with_ymd_and_hms(2006, 7, 11, 16, 43, 12).unwrap());
    }

    #[test]
    fn test_parse_legacy() {
        let elem: Element = "<x xmlns='jabber:x:delay' stamp='20060711T16:43:12'/>"
            .parse()
            .unwrap();
        let delay = Delay::try_from(elem).unwrap();
        assert_eq!(delay.stamp, Utc.with_ymd_and_hms(2006, 7, 11, 16, 43, 12).unwrap());
    }

    #[test]
    fn test_from_payloads_prefers_any_valid() {
        let payloads = vec![
            Element::bare("other", "urn:example"),
            "<delay xmlns='urn:xmpp:delay' stamp='2020-01-02T03:04:05Z'/>"
                .parse()
                .unwrap(),
        ];
        let delay = Delay::from_payloads(&payloads).unwrap();
        assert_eq!(delay.stamp.timestamp(), 1577934245);
    }

    #[test]
    fn test_serialize() {
        let delay = Delay {
            from: None,
            stamp: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
            data: None,
        };
        let elem: Element = delay.into();
        assert_eq!(elem.attr("stamp"), Some("2020-01-02T03:04:05Z"));
    }
}
