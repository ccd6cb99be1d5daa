// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Framing of a byte transport into an XML stream.
//!
//! An [`XmlStream`] owns the transport and produces [`Packet`]s: the
//! `<stream:stream>` header, complete depth-one child elements, and the
//! stream footer.  Writing goes through the same object so that stream
//! restarts (STARTTLS, post-authentication) can reuse the transport with a
//! fresh parser state.

use std::collections::HashMap;
use std::future::poll_fn;
use std::pin::Pin;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use crate::element::{element_from_parts, Element};
use crate::error::Error;
use crate::ns;

/// A unit read from the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// The `<stream:stream>` opening tag, with its attributes keyed by
    /// local name (`id`, `from`, `version`, …).
    StreamStart(HashMap<String, String>),
    /// A complete stanza-level element.
    Stanza(Element),
    /// The `</stream:stream>` closing tag.
    StreamEnd,
}

/// XML stream framing over any buffered async transport.
pub struct XmlStream<Io> {
    reader: rxml::AsyncReader<Io>,
    stream_ns: &'static str,
    stack: Vec<Element>,
    header_seen: bool,
}

impl<Io: AsyncBufRead + AsyncWrite + Unpin> XmlStream<Io> {
    /// Wraps a transport.  Nothing is sent or awaited yet.
    pub fn new(io: Io) -> Self {
        XmlStream {
            reader: rxml::AsyncReader::wrap(io, rxml::Parser::default()),
            stream_ns: ns::JABBER_CLIENT,
            stack: Vec::new(),
            header_seen: false,
        }
    }

    /// Returns the transport, discarding parser state.
    pub fn into_inner(self) -> Io {
        self.reader.into_inner().0
    }

    /// Sends the `<stream:stream>` opening tag.
    pub async fn send_stream_header(&mut self, to: &str) -> Result<(), Error> {
        let header = format!(
            "<?xml version='1.0'?><stream:stream xmlns='{}' xmlns:stream='{}' to='{}' version='1.0'>",
            self.stream_ns,
            ns::STREAM,
            to
        );
        self.send_raw(header.as_bytes()).await
    }

    /// Serialises and sends one stanza-level element.
    pub async fn send_stanza(&mut self, elem: &Element) -> Result<(), Error> {
        let data = elem.serialize(Some(self.stream_ns));
        self.send_raw(data.as_bytes()).await
    }

    /// Sends raw bytes (stream headers, whitespace keep-alives).
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), Error> {
        let io = Pin::new(&mut self.reader).inner_pinned().get_mut();
        io.write_all(data).await?;
        io.flush().await?;
        Ok(())
    }

    /// Sends the stream footer.  The transport is left open; the caller
    /// decides when to drop it.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.send_raw(b"</stream:stream>").await
    }

    /// Reads the next packet.  `Ok(None)` means the transport reached EOF.
    pub async fn next_packet(&mut self) -> Result<Option<Packet>, Error> {
        loop {
            let event = {
                let reader = &mut self.reader;
                poll_fn(|cx| Pin::new(&mut *reader).poll_read(cx)).await?
            };
            let event = match event {
                Some(event) => event,
                None => return Ok(None),
            };
            match event {
                rxml::Event::XmlDeclaration(_, _) => (),
                rxml::Event::StartElement(_, (namespace, name), attrs) => {
                    if !self.header_seen {
                        if namespace != ns::STREAM || name != "stream" {
                            return Err(Error::ParseError("Unexpected stream root element."));
                        }
                        self.header_seen = true;
                        let mut map = HashMap::new();
                        for ((attr_ns, attr_name), value) in attrs.into_iter() {
                            if attr_ns.is_none() {
                                map.insert(attr_name.to_string(), value.to_string());
                            }
                        }
                        return Ok(Some(Packet::StreamStart(map)));
                    }
                    self.stack.push(element_from_parts(namespace, name, attrs));
                }
                rxml::Event::Text(_, text) => {
                    if let Some(elem) = self.stack.last_mut() {
                        elem.append_text_node(text.to_string());
                    }
                    // Text directly below the stream root is whitespace
                    // keep-alive; drop it.
                }
                rxml::Event::EndElement(_) => match self.stack.pop() {
                    None => return Ok(Some(Packet::StreamEnd)),
                    Some(elem) => match self.stack.last_mut() {
                        Some(parent) => {
                            parent.append_child(elem);
                        }
                        None => return Ok(Some(Packet::Stanza(elem))),
                    },
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    const HEADER: &[u8] = b"<?xml version='1.0'?><stream:stream xmlns='jabber:client' \
        xmlns:stream='http://etherx.jabber.org/streams' id='c2s-1' version='1.0'>";

    #[tokio::test]
    async fn test_reads_header_stanza_footer() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut stream = XmlStream::new(tokio::io::BufStream::new(client));

        server.write_all(HEADER).await.unwrap();
        match stream.next_packet().await.unwrap().unwrap() {
            Packet::StreamStart(attrs) => {
                assert_eq!(attrs.get("id").map(String::as_str), Some("c2s-1"));
                assert_eq!(attrs.get("version").map(String::as_str), Some("1.0"));
            }
            other => panic!("expected stream start, got {:?}", other),
        }

        server
            .write_all(b" <message from='juliet@example.com'><body>hi</body></message>")
            .await
            .unwrap();
        match stream.next_packet().await.unwrap().unwrap() {
            Packet::Stanza(elem) => {
                assert!(elem.is("message", "jabber:client"));
                assert_eq!(elem.attr("from"), Some("juliet@example.com"));
                assert_eq!(elem.get_child("body", "jabber:client").unwrap().text(), "hi");
            }
            other => panic!("expected stanza, got {:?}", other),
        }

        server.write_all(b"</stream:stream>").await.unwrap();
        assert_eq!(stream.next_packet().await.unwrap(), Some(Packet::StreamEnd));
    }

    #[tokio::test]
    async fn test_send_stanza_omits_default_ns() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut stream = XmlStream::new(tokio::io::BufStream::new(client));

        let mut elem = Element::bare("iq", ns::JABBER_CLIENT);
        elem.set_attr("type", "get");
        elem.append_child(Element::bare("ping", ns::PING));
        stream.send_stanza(&elem).await.unwrap();

        let mut buf = vec![0u8; 128];
        let n = server.read(&mut buf).await.unwrap();
        let written = std::str::from_utf8(&buf[..n]).unwrap();
        assert_eq!(written, "<iq type='get'><ping xmlns='urn:xmpp:ping'/></iq>");
    }

    #[tokio::test]
    async fn test_malformed_input_is_an_error() {
        let (client, mut server) = tokio::io::duplex(4096);
        let mut stream = XmlStream::new(tokio::io::BufStream::new(client));
        server.write_all(HEADER).await.unwrap();
        stream.next_packet().await.unwrap();
        server.write_all(b"<a><b></a></b>").await.unwrap();
        assert!(stream.next_packet().await.is_err());
    }
}
