// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::data_forms::DataForm;
use crate::element::Element;
use crate::error::Error;
use crate::iq::{IqResultPayload, IqSetPayload};
use crate::ns;

generate_attribute!(
    /// The action requested by the command initiator.
    Action, "action", {
        /// Run the command, or advance to the next stage.
        Execute => "execute",

        /// Cancel the command session.
        Cancel => "cancel",

        /// Complete the command with the submitted form.
        Complete => "complete",
    }
);

generate_attribute!(
    /// Where a command session stands.
    CommandStatus, "status", {
        /// The command is being executed.
        Executing => "executing",

        /// The command has completed.
        Completed => "completed",

        /// The command was cancelled.
        Canceled => "canceled",
    }
);

/// An ad-hoc command request or response.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The command node, e.g. a `rc#` remote-control command.
    pub node: String,
    /// Session id allocated by the responder.
    pub sessionid: Option<String>,
    /// The requested action (requests only).
    pub action: Option<Action>,
    /// The session status (responses only).
    pub status: Option<CommandStatus>,
    /// An attached form.
    pub form: Option<DataForm>,
    /// A note shown to the user.
    pub note: Option<String>,
}

impl Command {
    /// Creates an execute request for the given node.
    pub fn execute<S: Into<String>>(node: S) -> Command {
        Command {
            node: node.into(),
            sessionid: None,
            action: Some(Action::Execute),
            status: None,
            form: None,
            note: None,
        }
    }
}

impl IqSetPayload for Command {}
impl IqResultPayload for Command {}

impl TryFrom<Element> for Command {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Command, Error> {
        let elem = crate::util::check_element(elem, "command", ns::COMMANDS)?;
        let node = get_attr!(elem, "node", Required);
        let sessionid = elem.attr("sessionid").map(String::from);
        let action = get_attr!(elem, "action", Option);
        let status = get_attr!(elem, "status", Option);
        let form = elem
            .get_child("x", ns::DATA_FORMS)
            .cloned()
            .map(DataForm::try_from)
            .transpose()
            .map_err(Error::hide_type_mismatch)?;
        let note = elem.get_child("note", ns::COMMANDS).map(Element::text);
        Ok(Command {
            node,
            sessionid,
            action,
            status,
            form,
            note,
        })
    }
}

impl From<Command> for Element {
    fn from(command: Command) -> Element {
        let mut elem = Element::builder("command", ns::COMMANDS)
            .attr("node", command.node)
            .attr("sessionid", command.sessionid)
            .attr("action", command.action)
            .attr("status", command.status)
            .build();
        if let Some(form) = command.form {
            elem.append_child(form.into());
        }
        if let Some(note) = command.note {
            elem.append_child(
                Element::builder("note", ns::COMMANDS)
                    .attr("type", "info")
                    .build(),
            )
            .append_text_node(note);
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_request() {
        let elem: Element = Command::execute("http://jabber.org/protocol/rc#set-status").into();
        assert_eq!(elem.attr("action"), Some("execute"));
        assert_eq!(
            elem.attr("node"),
            Some("http://jabber.org/protocol/rc#set-status")
        );
    }

    #[test]
    fn test_completed_response() {
        let elem: Element = "<command xmlns='http://jabber.org/protocol/commands' \
             node='http://jabber.org/protocol/rc#leave-groupchats' \
             sessionid='rc1' status='completed'><note type='info'>Done.</note></command>"
            .parse()
            .unwrap();
        let command = Command::try_from(elem).unwrap();
        assert_eq!(command.status, Some(CommandStatus::Completed));
        assert_eq!(command.note.as_deref(), Some("Done."));
    }
}
