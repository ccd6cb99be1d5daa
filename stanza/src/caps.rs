// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use base64::{engine::general_purpose::STANDARD as Base64, Engine};
use sha1::{Digest, Sha1};

use crate::data_forms::DataForm;
use crate::disco::{DiscoInfoQuery, DiscoInfoResult, Feature, Identity};
use crate::element::Element;
use crate::error::Error;
use crate::ns;

/// The `<c/>` presence payload advertising a capability hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caps {
    /// A URI identifying the application.
    pub node: String,
    /// The hash algorithm; only `sha-1` is generated, anything else is
    /// carried opaquely.
    pub hash: String,
    /// The raw hash over the application's disco#info.
    pub ver: Vec<u8>,
}

impl Caps {
    /// Creates a sha-1 caps advertisement.
    pub fn new<N: Into<String>>(node: N, ver: Vec<u8>) -> Caps {
        Caps {
            node: node.into(),
            hash: "sha-1".to_owned(),
            ver,
        }
    }

    /// The base64 form of the hash, used as a cache key.
    pub fn ver_string(&self) -> String {
        Base64.encode(&self.ver)
    }
}

impl TryFrom<Element> for Caps {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Caps, Error> {
        let elem = crate::util::check_element(elem, "c", ns::CAPS)?;
        let node = get_attr!(elem, "node", Required);
        let hash = get_attr!(elem, "hash", Required);
        let ver = match elem.attr("ver") {
            Some(ver) => Base64.decode(ver)?,
            None => return Err(Error::ParseError("Required attribute 'ver' missing.")),
        };
        Ok(Caps { node, hash, ver })
    }
}

impl From<Caps> for Element {
    fn from(caps: Caps) -> Element {
        Element::builder("c", ns::CAPS)
            .attr("node", caps.node)
            .attr("hash", caps.hash)
            .attr("ver", Base64.encode(&caps.ver))
            .build()
    }
}

fn compute_item(field: &str) -> Vec<u8> {
    let mut bytes = field.as_bytes().to_vec();
    bytes.push(b'<');
    bytes
}

fn compute_items<T, F: Fn(&T) -> Vec<u8>>(things: &[T], encode: F) -> Vec<u8> {
    let mut string: Vec<u8> = vec![];
    let mut accumulator: Vec<Vec<u8>> = vec![];
    for thing in things {
        accumulator.push(encode(thing));
    }
    // This works using the expected i;octet collation.
    accumulator.sort();
    for mut bytes in accumulator {
        string.append(&mut bytes);
    }
    string
}

fn compute_features(features: &[Feature]) -> Vec<u8> {
    compute_items(features, |feature| compute_item(&feature.var))
}

fn compute_identities(identities: &[Identity]) -> Vec<u8> {
    compute_items(identities, |identity| {
        let lang = identity.lang.clone().unwrap_or_default();
        let name = identity.name.clone().unwrap_or_default();
        let string = format!("{}/{}/{}/{}", identity.category, identity.type_, lang, name);
        let mut vec = string.as_bytes().to_vec();
        vec.push(b'<');
        vec
    })
}

fn compute_extensions(extensions: &[DataForm]) -> Vec<u8> {
    compute_items(extensions, |extension| {
        let mut bytes = match extension.form_type {
            Some(ref form_type) => form_type.as_bytes().to_vec(),
            None => vec![],
        };
        bytes.push(b'<');
        for field in &extension.fields {
            if let Some(ref var) = field.var {
                bytes.append(&mut compute_item(var));
            }
            bytes.append(&mut compute_items(&field.values, |value| {
                compute_item(value)
            }));
        }
        bytes
    })
}

/// Applies the capability-hash algorithm on the provided disco#info result,
/// to generate the hash input.
pub fn compute_disco(disco: &DiscoInfoResult) -> Vec<u8> {
    let identities_string = compute_identities(&disco.identities);
    let features_string = compute_features(&disco.features);
    let extensions_string = compute_extensions(&disco.extensions);

    let mut final_string = vec![];
    final_string.extend(identities_string);
    final_string.extend(features_string);
    final_string.extend(extensions_string);
    final_string
}

/// Hashes the result of [`compute_disco()`] with SHA-1.
pub fn hash_caps(data: &[u8]) -> Vec<u8> {
    Sha1::digest(data).to_vec()
}

/// Helper function to create the query for the disco#info corresponding to
/// a caps hash.
pub fn query_caps(caps: &Caps) -> DiscoInfoQuery {
    DiscoInfoQuery {
        node: Some(format!("{}#{}", caps.node, Base64.encode(&caps.ver))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let elem: Element = "<c xmlns='http://jabber.org/protocol/caps' hash='sha-1' \
             node='http://mcabber.com/caps' ver='QgayPKawpkPSDYmwT/WM94uAlu0='/>"
            .parse()
            .unwrap();
        let caps = Caps::try_from(elem).unwrap();
        assert_eq!(caps.node, "http://mcabber.com/caps");
        assert_eq!(caps.hash, "sha-1");
        assert_eq!(caps.ver_string(), "QgayPKawpkPSDYmwT/WM94uAlu0=");
    }

    #[test]
    fn test_xep_5_2() {
        let elem: Element = "<query xmlns='http://jabber.org/protocol/disco#info' \
               node='http://psi-im.org#q07IKJEyjvHSyhy//CH0CxmKi8w='>\
             <identity category='client' name='Exodus 0.9.1' type='pc'/>\
             <feature var='http://jabber.org/protocol/caps'/>\
             <feature var='http://jabber.org/protocol/disco#info'/>\
             <feature var='http://jabber.org/protocol/disco#items'/>\
             <feature var='http://jabber.org/protocol/muc'/>\
             </query>"
            .parse()
            .unwrap();

        let expected = b"client/pc//Exodus 0.9.1<http://jabber.org/protocol/caps<http://jabber.org/protocol/disco#info<http://jabber.org/protocol/disco#items<http://jabber.org/protocol/muc<".to_vec();
        let disco = DiscoInfoResult::try_from(elem).unwrap();
        let caps = compute_disco(&disco);
        assert_eq!(caps, expected);

        let sha_1 = hash_caps(&caps);
        assert_eq!(
            sha_1,
            Base64.decode("QgayPKawpkPSDYmwT/WM94uAlu0=").unwrap()
        );
    }

    #[test]
    fn test_xep_5_3() {
        let elem: Element = "<query xmlns='http://jabber.org/protocol/disco#info' \
               node='http://psi-im.org#q07IKJEyjvHSyhy//CH0CxmKi8w='>\
             <identity xml:lang='en' category='client' name='Psi 0.11' type='pc'/>\
             <identity xml:lang='el' category='client' name='\u{3a8} 0.11' type='pc'/>\
             <feature var='http://jabber.org/protocol/caps'/>\
             <feature var='http://jabber.org/protocol/disco#info'/>\
             <feature var='http://jabber.org/protocol/disco#items'/>\
             <feature var='http://jabber.org/protocol/muc'/>\
             <x xmlns='jabber:x:data' type='result'>\
             <field var='FORM_TYPE' type='hidden'><value>urn:xmpp:dataforms:softwareinfo</value></field>\
             <field var='ip_version'><value>ipv4</value><value>ipv6</value></field>\
             <field var='os'><value>Mac</value></field>\
             <field var='os_version'><value>10.5.1</value></field>\
             <field var='software'><value>Psi</value></field>\
             <field var='software_version'><value>0.11</value></field>\
             </x></query>"
            .parse()
            .unwrap();
        let disco = DiscoInfoResult::try_from(elem).unwrap();
        let caps = compute_disco(&disco);
        let sha_1 = hash_caps(&caps);
        assert_eq!(
            sha_1,
            Base64.decode("q07IKJEyjvHSyhy//CH0CxmKi8w=").unwrap()
        );
    }

    #[test]
    fn test_query_caps_node() {
        let caps = Caps::new(
            "http://psi-im.org",
            Base64.decode("q07IKJEyjvHSyhy//CH0CxmKi8w=").unwrap(),
        );
        let query = query_caps(&caps);
        assert_eq!(
            query.node.as_deref(),
            Some("http://psi-im.org#q07IKJEyjvHSyhy//CH0CxmKi8w=")
        );
    }
}
