// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Establishing the byte transport: TCP, legacy SSL, STARTTLS, and the
//! certificate fingerprint check.

use tokio::io::{AsyncBufRead, AsyncWrite, BufStream};
use tokio::net::TcpStream;

use causerie_stanza::xmlstream::{Packet, XmlStream};

use crate::config::{SessionConfig, TlsMode};
use crate::error::{Error, ProtocolError, TlsError};

/// Marker for the boxed transport.
pub trait ServerStream: AsyncBufRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncBufRead + AsyncWrite + Unpin + Send> ServerStream for T {}

/// The type-erased transport every later stage works with.
pub type Transport = Box<dyn ServerStream>;

fn ports(config: &SessionConfig) -> u16 {
    match config.port {
        Some(port) => port,
        None => match config.tls {
            TlsMode::LegacySsl => 5223,
            _ => 5222,
        },
    }
}

fn server_host(config: &SessionConfig) -> String {
    match &config.server {
        Some(server) => server.clone(),
        None => config.jid.domain().to_string(),
    }
}

#[cfg(feature = "tls-native")]
async fn tls_handshake(
    config: &SessionConfig,
    domain: &str,
    stream: TcpStream,
) -> Result<tokio_native_tls::TlsStream<TcpStream>, Error> {
    let mut builder = native_tls::TlsConnector::builder();
    if config.ssl_ignore_checks {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    let connector = builder.build().map_err(TlsError::from)?;
    let connector = tokio_native_tls::TlsConnector::from(connector);
    let tls_stream = connector
        .connect(domain, stream)
        .await
        .map_err(TlsError::from)?;
    check_fingerprint(config, &tls_stream)?;
    Ok(tls_stream)
}

/// Compares the peer certificate's SHA-1 against the pinned fingerprint.
#[cfg(feature = "tls-native")]
fn check_fingerprint(
    config: &SessionConfig,
    stream: &tokio_native_tls::TlsStream<TcpStream>,
) -> Result<(), Error> {
    let Some(expected) = &config.ssl_fingerprint else {
        return Ok(());
    };
    let cert = stream
        .get_ref()
        .peer_certificate()
        .map_err(TlsError::from)?;
    let Some(cert) = cert else {
        return Err(TlsError::FingerprintMismatch {
            got: "no certificate".to_owned(),
            expected: expected.clone(),
        }
        .into());
    };
    let der = cert.to_der().map_err(TlsError::from)?;
    let got = {
        use sha1::{Digest, Sha1};
        hex::encode(Sha1::digest(der))
    };
    let normalized: String = expected
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_ascii_lowercase();
    if got != normalized {
        if config.ssl_ignore_checks {
            log::warn!("certificate fingerprint mismatch overridden ({})", got);
            return Ok(());
        }
        return Err(TlsError::FingerprintMismatch {
            got,
            expected: normalized,
        }
        .into());
    }
    Ok(())
}

/// Opens the transport according to the configuration, running the
/// STARTTLS dance when asked to.  What comes back is ready for the
/// authentication stream.
pub(crate) async fn connect(config: &SessionConfig) -> Result<Transport, Error> {
    let host = server_host(config);
    let port = ports(config);
    let domain = config.jid.domain().to_string();
    log::info!("connecting to {}:{}", host, port);
    let tcp = TcpStream::connect((host.as_str(), port)).await?;

    match config.tls {
        TlsMode::Plaintext => Ok(Box::new(BufStream::new(tcp))),
        TlsMode::LegacySsl => {
            #[cfg(feature = "tls-native")]
            {
                let tls = tls_handshake(config, &domain, tcp).await?;
                Ok(Box::new(BufStream::new(tls)))
            }
            #[cfg(not(feature = "tls-native"))]
            {
                Err(TlsError::Unavailable.into())
            }
        }
        TlsMode::StartTls => {
            #[cfg(feature = "tls-native")]
            {
                let tcp = starttls_negotiate(&domain, tcp).await?;
                let tls = tls_handshake(config, &domain, tcp).await?;
                Ok(Box::new(BufStream::new(tls)))
            }
            #[cfg(not(feature = "tls-native"))]
            {
                Err(TlsError::Unavailable.into())
            }
        }
    }
}

/// Runs the plaintext prelude of STARTTLS: open a stream, read the
/// features, request the upgrade, wait for `<proceed/>`, and hand the
/// raw TCP stream back for the handshake.
#[cfg(feature = "tls-native")]
async fn starttls_negotiate(domain: &str, tcp: TcpStream) -> Result<TcpStream, Error> {
    use causerie_stanza::starttls::{Proceed, Request};
    use causerie_stanza::stream_features::StreamFeatures;

    let mut stream = XmlStream::new(BufStream::new(tcp));
    stream.send_stream_header(domain).await?;
    // Header, then features.
    loop {
        match stream.next_packet().await? {
            Some(Packet::StreamStart(_)) => break,
            Some(Packet::Stanza(_)) => continue,
            Some(Packet::StreamEnd) | None => return Err(Error::Disconnected),
        }
    }
    let features = loop {
        match stream.next_packet().await? {
            Some(Packet::Stanza(stanza)) => {
                if let Ok(features) = StreamFeatures::try_from(stanza) {
                    break features;
                }
            }
            Some(Packet::StreamStart(_)) => continue,
            Some(Packet::StreamEnd) | None => return Err(Error::Disconnected),
        }
    };
    if !features.can_starttls() {
        return Err(ProtocolError::NoTls.into());
    }
    stream.send_stanza(&Request.into()).await?;
    loop {
        match stream.next_packet().await? {
            Some(Packet::Stanza(stanza)) => {
                if Proceed::try_from(stanza).is_ok() {
                    break;
                }
            }
            Some(Packet::StreamStart(_)) => continue,
            Some(Packet::StreamEnd) | None => return Err(Error::Disconnected),
        }
    }
    Ok(stream.into_inner().into_inner())
}
