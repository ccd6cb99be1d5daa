// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// Enum representing chatstate elements part of the
/// `http://jabber.org/protocol/chatstates` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    /// `<active xmlns='http://jabber.org/protocol/chatstates'/>`
    Active,

    /// `<composing xmlns='http://jabber.org/protocol/chatstates'/>`
    Composing,

    /// `<gone xmlns='http://jabber.org/protocol/chatstates'/>`
    Gone,

    /// `<inactive xmlns='http://jabber.org/protocol/chatstates'/>`
    Inactive,

    /// `<paused xmlns='http://jabber.org/protocol/chatstates'/>`
    Paused,
}

impl ChatState {
    fn name(self) -> &'static str {
        match self {
            ChatState::Active => "active",
            ChatState::Composing => "composing",
            ChatState::Gone => "gone",
            ChatState::Inactive => "inactive",
            ChatState::Paused => "paused",
        }
    }
}

impl TryFrom<Element> for ChatState {
    type Error = Error;

    fn try_from(elem: Element) -> Result<ChatState, Error> {
        if elem.ns() != ns::CHATSTATES {
            return Err(Error::ParseError("This is not a chatstate element."));
        }
        Ok(match elem.name() {
            "active" => ChatState::Active,
            "composing" => ChatState::Composing,
            "gone" => ChatState::Gone,
            "inactive" => ChatState::Inactive,
            "paused" => ChatState::Paused,
            _ => return Err(Error::ParseError("This is not a chatstate element.")),
        })
    }
}

impl From<ChatState> for Element {
    fn from(state: ChatState) -> Element {
        Element::bare(state.name(), ns::CHATSTATES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        let elem: Element = "<active xmlns='http://jabber.org/protocol/chatstates'/>"
            .parse()
            .unwrap();
        assert_eq!(ChatState::try_from(elem).unwrap(), ChatState::Active);
        let elem: Element = "<paused xmlns='http://jabber.org/protocol/chatstates'/>"
            .parse()
            .unwrap();
        assert_eq!(ChatState::try_from(elem).unwrap(), ChatState::Paused);
    }

    #[test]
    fn test_invalid() {
        let elem: Element = "<typing xmlns='http://jabber.org/protocol/chatstates'/>"
            .parse()
            .unwrap();
        assert!(ChatState::try_from(elem).is_err());
        let elem: Element = "<active xmlns='jabber:client'/>".parse().unwrap();
        assert!(ChatState::try_from(elem).is_err());
    }
}
