// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Generates an enum for a closed set of attribute values, with `FromStr`,
/// `Display` and `IntoAttributeValue` implementations.  An optional
/// `Default` arm names the variant an absent attribute maps to.
macro_rules! generate_attribute {
    ($(#[$meta:meta])* $elem:ident, $name:tt, {$($(#[$a_meta:meta])* $a:ident => $b:tt),+$(,)?}) => (
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $elem {
            $(
                $(#[$a_meta])*
                $a
            ),+
        }
        impl ::core::str::FromStr for $elem {
            type Err = crate::error::Error;
            fn from_str(s: &str) -> Result<$elem, crate::error::Error> {
                Ok(match s {
                    $($b => $elem::$a),+,
                    _ => return Err(crate::error::Error::ParseError(
                        concat!("Unknown value for '", $name, "' attribute.")
                    )),
                })
            }
        }
        impl ::core::fmt::Display for $elem {
            fn fmt(&self, fmt: &mut ::core::fmt::Formatter) -> Result<(), ::core::fmt::Error> {
                write!(fmt, "{}", match self {
                    $($elem::$a => $b),+
                })
            }
        }
        impl crate::element::IntoAttributeValue for $elem {
            fn into_attribute_value(self) -> Option<String> {
                Some(String::from(match self {
                    $($elem::$a => $b),+
                }))
            }
        }
    );
    ($(#[$meta:meta])* $elem:ident, $name:tt, {$($(#[$a_meta:meta])* $a:ident => $b:tt),+$(,)?}, Default = $default:ident) => (
        generate_attribute!($(#[$meta])* $elem, $name, {$($(#[$a_meta])* $a => $b),+});
        impl ::core::default::Default for $elem {
            fn default() -> $elem {
                $elem::$default
            }
        }
    );
}

/// Reads a required attribute from an element, parsing it with `FromStr`.
macro_rules! get_attr {
    ($elem:ident, $attr:tt, Required) => {
        match $elem.attr($attr) {
            Some(value) => value.parse()?,
            None => {
                return Err(crate::error::Error::ParseError(concat!(
                    "Required attribute '",
                    $attr,
                    "' missing."
                )));
            }
        }
    };
    ($elem:ident, $attr:tt, Option) => {
        match $elem.attr($attr) {
            Some(value) => Some(value.parse()?),
            None => None,
        }
    };
    ($elem:ident, $attr:tt, Default) => {
        match $elem.attr($attr) {
            Some(value) => value.parse()?,
            None => ::core::default::Default::default(),
        }
    };
}

/// Checks that the element is the expected one, moving it into the error
/// when it is not so callers can dispatch on something else.
pub(crate) fn check_element(
    elem: crate::Element,
    name: &'static str,
    ns: &'static str,
) -> Result<crate::Element, crate::error::Error> {
    if elem.is(name, ns) {
        Ok(elem)
    } else {
        Err(crate::error::Error::TypeMismatch(ns, name, elem))
    }
}
