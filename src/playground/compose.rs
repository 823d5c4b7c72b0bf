use crate::extract::CODE_FENCE_OPEN;
use crate::state::Role;
use crate::types::OutgoingMessage;

const USER_ROLE: &str = "user";

/// Build the messages of one send.
///
/// Local edits are shown to the model first so it answers against the code the
/// user actually has. Runtime error reports go out as an improvement request.
pub fn compose_messages(
    input: &str,
    role: Role,
    code: &str,
    code_has_changed: bool,
) -> Vec<OutgoingMessage> {
    let mut messages = Vec::with_capacity(2);

    if role == Role::User && code_has_changed {
        messages.push(OutgoingMessage::new(
            USER_ROLE,
            format!("I updated the code: {CODE_FENCE_OPEN}\n{code}\n```"),
        ));
    }

    if role == Role::System {
        messages.push(OutgoingMessage::new(
            USER_ROLE,
            format!("Runner report: {input}. Is it possible to improve this?"),
        ));
    } else {
        messages.push(OutgoingMessage::new(role.as_str(), input));
    }

    messages
}
