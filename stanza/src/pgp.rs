// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// An armored-PGP-encrypted message body, carried next to a placeholder
/// plaintext `<body/>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    /// The ASCII-armored ciphertext.
    pub data: String,
}

impl TryFrom<Element> for Encrypted {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Encrypted, Error> {
        let elem = crate::util::check_element(elem, "x", ns::ENCRYPTED)?;
        Ok(Encrypted { data: elem.text() })
    }
}

impl From<Encrypted> for Element {
    fn from(encrypted: Encrypted) -> Element {
        let mut elem = Element::bare("x", ns::ENCRYPTED);
        elem.append_text_node(encrypted.data);
        elem
    }
}

/// A detached signature over the `<status/>` text of a presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    /// The ASCII-armored signature.
    pub data: String,
}

impl TryFrom<Element> for Signed {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Signed, Error> {
        let elem = crate::util::check_element(elem, "x", ns::SIGNED)?;
        Ok(Signed { data: elem.text() })
    }
}

impl From<Signed> for Element {
    fn from(signed: Signed) -> Element {
        let mut elem = Element::bare("x", ns::SIGNED);
        elem.append_text_node(signed.data);
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let encrypted = Encrypted {
            data: "hQEMA5fake".to_owned(),
        };
        let elem: Element = encrypted.clone().into();
        assert!(elem.is("x", ns::ENCRYPTED));
        assert_eq!(Encrypted::try_from(elem).unwrap(), encrypted);
    }
}
