// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stream negotiation on an established transport: SASL authentication
//! and resource binding.

use jid::FullJid;

use sasl::client::mechanisms::{Anonymous, Plain, Scram};
use sasl::client::Mechanism;
use sasl::common::scram::{Sha1, Sha256};
use sasl::common::{ChannelBinding, Credentials};

use causerie_stanza::bind::{BindQuery, BindResponse};
use causerie_stanza::iq::{Iq, IqType};
use causerie_stanza::sasl::{Auth, Challenge, Failure, Response, Success};
use causerie_stanza::stream_features::StreamFeatures;
use causerie_stanza::xmlstream::{Packet, XmlStream};

use crate::config::SessionConfig;
use crate::connect::Transport;
use crate::error::{AuthError, Error, ProtocolError};

async fn stream_open(
    transport: Transport,
    domain: &str,
) -> Result<(XmlStream<Transport>, StreamFeatures), Error> {
    let mut stream = XmlStream::new(transport);
    stream.send_stream_header(domain).await?;
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
    Ok((stream, features))
}

/// Authenticates and binds on a fresh transport.  Returns the bound JID
/// and the stream ready for stanza traffic.
pub(crate) async fn login(
    transport: Transport,
    config: &SessionConfig,
) -> Result<(FullJid, XmlStream<Transport>), Error> {
    let domain = config.jid.domain().to_string();
    let (stream, features) = stream_open(transport, &domain).await?;

    // SASL, preferring the challenge-response mechanisms.
    let username = config
        .jid
        .node()
        .map(|node| node.to_string())
        .unwrap_or_default();
    let creds = Credentials::default()
        .with_username(username)
        .with_password(config.password.clone())
        .with_channel_binding(ChannelBinding::None);
    let local_mechs: Vec<Box<dyn Fn() -> Box<dyn Mechanism + Send + Sync> + Send>> = vec![
        Box::new({
            let creds = creds.clone();
            move || Box::new(Scram::<Sha256>::from_credentials(creds.clone()).unwrap())
        }),
        Box::new({
            let creds = creds.clone();
            move || Box::new(Scram::<Sha1>::from_credentials(creds.clone()).unwrap())
        }),
        Box::new({
            let creds = creds.clone();
            move || Box::new(Plain::from_credentials(creds.clone()).unwrap())
        }),
        Box::new(|| Box::new(Anonymous::new())),
    ];

    let mut selected = None;
    for local_mech in local_mechs {
        let mechanism = local_mech();
        if features
            .sasl_mechanisms
            .iter()
            .any(|offered| offered == mechanism.name())
        {
            selected = Some(mechanism);
            break;
        }
    }
    let mut mechanism = selected.ok_or(AuthError::NoMechanism)?;

    let initial = mechanism.initial();
    let mut stream = stream;
    stream
        .send_stanza(
            &Auth {
                mechanism: mechanism.name().to_owned(),
                data: initial,
            }
            .into(),
        )
        .await?;

    loop {
        match stream.next_packet().await? {
            Some(Packet::Stanza(stanza)) => {
                if let Ok(challenge) = Challenge::try_from(stanza.clone()) {
                    let response = mechanism
                        .response(&challenge.data)
                        .map_err(AuthError::Sasl)?;
                    stream.send_stanza(&Response { data: response }.into()).await?;
                } else if Success::try_from(stanza.clone()).is_ok() {
                    break;
                } else if let Ok(failure) = Failure::try_from(stanza) {
                    return Err(AuthError::Fail(failure.condition).into());
                }
            }
            Some(Packet::StreamStart(_)) => continue,
            Some(Packet::StreamEnd) | None => return Err(Error::Disconnected),
        }
    }

    // Authenticated: restart the stream and bind the resource.
    let (mut stream, features) = stream_open(stream.into_inner(), &domain).await?;
    if !features.bind {
        return Err(ProtocolError::InvalidBindResponse.into());
    }
    let bind = BindQuery::new(Some(config.resource.clone()));
    let iq: causerie_stanza::Element = Iq::from_set("bind-1", bind).into();
    stream.send_stanza(&iq).await?;
    loop {
        match stream.next_packet().await? {
            Some(Packet::Stanza(stanza)) => {
                let Ok(iq) = Iq::try_from(stanza) else { continue };
                if iq.id.as_deref() != Some("bind-1") {
                    continue;
                }
                match iq.payload {
                    IqType::Result(Some(payload)) => {
                        let response = BindResponse::try_from(payload)
                            .map_err(|_| ProtocolError::InvalidBindResponse)?;
                        return Ok((response.jid, stream));
                    }
                    _ => return Err(ProtocolError::InvalidBindResponse.into()),
                }
            }
            Some(Packet::StreamStart(_)) => continue,
            Some(Packet::StreamEnd) | None => return Err(Error::Disconnected),
        }
    }
}
