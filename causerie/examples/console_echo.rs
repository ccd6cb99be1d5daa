// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Minimal driver: connect, log every event, echo incoming messages.
//!
//! cargo run --example console_echo -- <jid> <password>

use chrono::Utc;

use causerie::{Client, Event, SessionBuilder};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let jid = args.next().expect("usage: console_echo <jid> <password>");
    let password = args.next().expect("usage: console_echo <jid> <password>");

    let config = SessionBuilder::new(jid.parse()?, password)
        .auto_connect(true)
        .build();
    let mut client = Client::new(config);
    client.connect().await?;

    loop {
        for event in client.wait_for_events().await {
            match event {
                Event::Online(jid) => println!("* online as {}", jid),
                Event::Disconnected(reason) => {
                    println!("* disconnected: {}", reason.unwrap_or_default())
                }
                Event::MessageIn { from, .. } => {
                    let text = client
                        .session_ref()
                        .buffer(&from)
                        .and_then(|buffer| buffer.get_lines(None, 1).pop())
                        .map(|line| line.text)
                        .unwrap_or_default();
                    println!("<{}> {}", from, text);
                    let now = Utc::now().timestamp();
                    client
                        .session()
                        .say_to(from.parse()?, &text, now)
                        .ok();
                }
                other => println!("* {:?}", other),
            }
        }
    }
}
