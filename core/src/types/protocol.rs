use serde::{Deserialize, Serialize};

use crate::types::action::Action;
use crate::types::session::{MenuState, UserId};

/// An inbound event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The configuration entry command (`/config`).
    Start { user: UserId },
    /// The global cancel command (`/stop_config`).
    Cancel { user: UserId },
    /// A button press carrying an opaque action token.
    Press { user: UserId, token: String },
    /// A typed text message.
    Text { user: UserId, text: String },
}

impl Event {
    pub fn user(&self) -> UserId {
        match self {
            Event::Start { user }
            | Event::Cancel { user }
            | Event::Press { user, .. }
            | Event::Text { user, .. } => *user,
        }
    }

    /// Button presses edit the message that carried the button; commands
    /// and typed text get a fresh message.
    pub fn render_mode(&self) -> RenderMode {
        match self {
            Event::Press { .. } => RenderMode::Edit,
            _ => RenderMode::Send,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Send,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: &str, action: Action) -> Self {
        Button {
            label: label.to_string(),
            action,
        }
    }
}

/// Rendered menu: MarkdownV2 body plus rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub text: String,
    #[serde(default)]
    pub rows: Vec<Vec<Button>>,
}

impl Menu {
    /// All buttons in row-major order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// An outbound effect for the chat transport to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Menu { mode: RenderMode, menu: Menu },
    Message { mode: RenderMode, text: String },
}

/// Engine answer to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reply {
    Handled {
        state: MenuState,
        effects: Vec<Effect>,
    },
    /// No transition matched; nothing changed.
    Ignored { reason: String },
}

impl Reply {
    pub fn handled(state: MenuState, effect: Effect) -> Self {
        Reply::Handled {
            state,
            effects: vec![effect],
        }
    }

    pub fn ignored(reason: impl Into<String>) -> Self {
        Reply::Ignored {
            reason: reason.into(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Reply::Ignored { .. })
    }

    pub fn state(&self) -> Option<MenuState> {
        match self {
            Reply::Handled { state, .. } => Some(*state),
            Reply::Ignored { .. } => None,
        }
    }

    pub fn effects(&self) -> &[Effect] {
        match self {
            Reply::Handled { effects, .. } => effects,
            Reply::Ignored { .. } => &[],
        }
    }

    /// The last menu rendered by this reply, if any.
    pub fn menu(&self) -> Option<&Menu> {
        self.effects().iter().rev().find_map(|e| match e {
            Effect::Menu { menu, .. } => Some(menu),
            Effect::Message { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_tagged_json() {
        let ev = Event::Press {
            user: UserId(7),
            token: "general".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"event":"press","user":7,"token":"general"}"#);
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn render_mode_follows_event_origin() {
        let user = UserId(1);
        assert_eq!(Event::Start { user }.render_mode(), RenderMode::Send);
        assert_eq!(
            Event::Text { user, text: "5".into() }.render_mode(),
            RenderMode::Send
        );
        assert_eq!(
            Event::Press { user, token: "back".into() }.render_mode(),
            RenderMode::Edit
        );
    }

    #[test]
    fn effect_menu_round_trip() {
        let effect = Effect::Menu {
            mode: RenderMode::Edit,
            menu: Menu {
                text: "*Title*".into(),
                rows: vec![vec![Button::new("Back", Action::Back)]],
            },
        };
        let json = serde_json::to_string(&effect).unwrap();
        assert!(json.contains("\"effect\":\"menu\""));
        assert!(json.contains("\"action\":\"back\""));
        let back: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, effect);
    }

    #[test]
    fn ignored_reply_has_no_effects() {
        let reply = Reply::ignored("no active session");
        assert!(reply.is_ignored());
        assert!(reply.effects().is_empty());
        assert_eq!(reply.state(), None);
        assert!(reply.menu().is_none());
    }
}
