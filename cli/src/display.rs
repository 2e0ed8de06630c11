//! Plain-text rendering of daemon responses for the terminal.

use survbot_core::command::{Entry, Response};
use survbot_core::menu;
use survbot_core::types::protocol::{Effect, Menu, Reply};

/// Text to print for a response, or the error message.
pub fn response(resp: &Response) -> Result<String, String> {
    match resp {
        Response::Reply { reply } => Ok(self::reply(reply)),
        Response::Values { values } => Ok(entries(values)),
        Response::Ok => Ok(String::new()),
        Response::Error { message } => Err(message.clone()),
    }
}

pub fn reply(reply: &Reply) -> String {
    match reply {
        Reply::Handled { state, effects } => {
            let mut blocks: Vec<String> = effects.iter().map(effect).collect();
            blocks.push(format!("[state: {:?}]", state));
            blocks.join("\n\n")
        }
        Reply::Ignored { reason } => format!("(ignored: {})", reason),
    }
}

fn effect(effect: &Effect) -> String {
    match effect {
        Effect::Menu { menu, .. } => menu_text(menu),
        Effect::Message { text, .. } => menu::to_plain(text),
    }
}

/// Menu body followed by numbered buttons with their action tokens.
pub fn menu_text(menu: &Menu) -> String {
    let mut out = menu::to_plain(&menu.text);
    for (i, button) in menu.buttons().enumerate() {
        out.push_str(&format!("\n  [{}] {} ({})", i + 1, button.label, button.action));
    }
    out
}

pub fn entries(values: &[Entry]) -> String {
    values
        .iter()
        .map(|e| format!("{} = {}", e.name, e.value))
        .collect::<Vec<_>>()
        .join("\n")
}
