//! Menu renderer — text and buttons for every conversation screen.
//!
//! Rendering is a pure function of a `View` and a config snapshot. Text is
//! Telegram MarkdownV2: formatting markers are emitted by the helpers below
//! and every piece of plain text goes through `escape()`.

use crate::error::StoreError;
use crate::params::{parameters_in, ParamKind, ParamName, Parameter};
use crate::store::ConfigValues;
use crate::types::action::Action;
use crate::types::protocol::{Button, Menu};
use crate::types::session::{MenuState, ReturnTo};
use crate::types::value::Value;

/// A renderable screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Main,
    Section(ReturnTo),
    Prompt(ParamName),
}

impl View {
    /// The screen shown for a menu state. Input states need the pending
    /// parameter to know which prompt to show.
    pub fn for_state(state: MenuState, pending: Option<ParamName>) -> Option<View> {
        match state {
            MenuState::Main => Some(View::Main),
            MenuState::GeneralMenu => Some(View::Section(ReturnTo::General)),
            MenuState::SurveillanceMenu => Some(View::Section(ReturnTo::Surveillance)),
            MenuState::BooleanInput | MenuState::IntegerInput | MenuState::FloatInput => {
                pending.map(View::Prompt)
            }
            MenuState::Terminal => None,
        }
    }
}

pub fn render(view: View, snapshot: &ConfigValues) -> Result<Menu, StoreError> {
    match view {
        View::Main => Ok(main_menu()),
        View::Section(section) => section_menu(section, snapshot),
        View::Prompt(name) => prompt(name.descriptor(), snapshot),
    }
}

fn main_menu() -> Menu {
    let text = [
        bold("Surveillance Bot Configuration"),
        escape("Here you can modify some bot behavior parameters."),
        escape("While the mode is running it does not allow you any change unless you restart it."),
        escape("To abort type /stop_config."),
        escape("Select section:"),
    ]
    .join("\n\n");

    Menu {
        text,
        rows: vec![
            vec![Button::new("General configuration", Action::OpenGeneral)],
            vec![Button::new("Surveillance mode configuration", Action::OpenSurveillance)],
            vec![Button::new("Done", Action::Done)],
        ],
    }
}

fn section_title(section: ReturnTo) -> &'static str {
    match section {
        ReturnTo::General => "General configuration",
        ReturnTo::Surveillance => "Surveillance Mode configuration",
    }
}

fn section_menu(section: ReturnTo, snapshot: &ConfigValues) -> Result<Menu, StoreError> {
    let mut blocks = vec![bold(section_title(section))];
    let mut rows = Vec::new();

    for param in parameters_in(section) {
        let value = snapshot.get(param.name)?;
        blocks.push(format!(
            "{}:\n {} {}: {}\n {} {}: {}",
            underline(param.label),
            escape("-"),
            italic("Description"),
            escape(param.description),
            escape("-"),
            italic("Current value"),
            bold(&display_value(param, value)),
        ));
        rows.push(vec![Button::new(param.label, Action::Edit(param.name))]);
    }
    rows.push(vec![Button::new("Back", Action::Back)]);

    Ok(Menu {
        text: blocks.join("\n\n"),
        rows,
    })
}

fn prompt(param: &Parameter, snapshot: &ConfigValues) -> Result<Menu, StoreError> {
    let value = snapshot.get(param.name)?;
    let current = match param.kind {
        ParamKind::Boolean => "Current state",
        ParamKind::Integer | ParamKind::Float => "Current value",
    };
    // Prompts show the bare number; units only appear in section menus.
    let shown = match value {
        Value::Bool(_) => display_value(param, value),
        Value::Int(_) | Value::Float(_) => value.to_string(),
    };
    let text = [
        bold(param.title),
        format!("{}: {}", escape(current), bold(&shown)),
        escape(param.prompt),
    ]
    .join("\n\n");

    let rows = match param.kind {
        ParamKind::Boolean => vec![vec![
            Button::new("Enable", Action::Enable),
            Button::new("Disable", Action::Disable),
        ]],
        ParamKind::Integer | ParamKind::Float => Vec::new(),
    };
    Ok(Menu { text, rows })
}

/// Human form of a value: Enabled/Disabled for flags, unit appended to
/// numbers that have one.
pub fn display_value(param: &Parameter, value: Value) -> String {
    match (value, param.unit) {
        (Value::Bool(true), _) => "Enabled".to_string(),
        (Value::Bool(false), _) => "Disabled".to_string(),
        (v, Some(unit)) => format!("{} {}", v, unit),
        (v, None) => v.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MarkdownV2
// ---------------------------------------------------------------------------

const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escape every MarkdownV2 reserved character.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn bold(text: &str) -> String {
    format!("*{}*", escape(text))
}

pub fn italic(text: &str) -> String {
    format!("_{}_", escape(text))
}

pub fn underline(text: &str) -> String {
    format!("__{}__", escape(text))
}

/// Strip MarkdownV2 markers and escapes, for plain-text displays.
pub fn to_plain(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut chars = markdown.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '_' | '~' => {}
            other => out.push(other),
        }
    }
    out
}
