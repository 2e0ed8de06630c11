//! Interactive console that stands in for the chat client.
//!
//! | Input | Event |
//! |-------|-------|
//! | `/config` | start |
//! | `/stop_config` | cancel |
//! | `1`..`n` | press the n-th button of the last menu |
//! | anything else | typed text |
//!
//! `/show` prints the store, `/quit` leaves.

use std::io::{self, BufRead, Write};

use tracing::error;

use survbot_core::engine::Engine;
use survbot_core::types::protocol::{Button, Event, Reply};
use survbot_core::types::session::UserId;

use crate::display;

const GREETING: &str = "Type /config to open the configuration menu, /quit to leave.";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    Event(Event),
    Show,
    Quit,
    Empty,
}

pub fn parse_line(line: &str, user: UserId, buttons: &[Button]) -> ChatInput {
    let line = line.trim();
    match line {
        "" => ChatInput::Empty,
        "/quit" | "/exit" => ChatInput::Quit,
        "/show" => ChatInput::Show,
        "/config" => ChatInput::Event(Event::Start { user }),
        "/stop_config" => ChatInput::Event(Event::Cancel { user }),
        _ => match line.parse::<usize>() {
            Ok(n) if (1..=buttons.len()).contains(&n) => ChatInput::Event(Event::Press {
                user,
                token: buttons[n - 1].action.token(),
            }),
            _ => ChatInput::Event(Event::Text {
                user,
                text: line.to_string(),
            }),
        },
    }
}

/// Run the console until `/quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    engine: &Engine,
    user: UserId,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "{}", GREETING)?;
    let mut buttons: Vec<Button> = Vec::new();

    for line in input.lines() {
        let event = match parse_line(&line?, user, &buttons) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Show => {
                let values = engine.store().snapshot().entries();
                for (name, value) in values {
                    writeln!(out, "{} = {}", name, value)?;
                }
                continue;
            }
            ChatInput::Event(event) => event,
        };

        match engine.handle(event) {
            // Chat clients stay silent on unmatched input.
            Ok(Reply::Ignored { .. }) => {}
            Ok(reply) => {
                if let Some(menu) = reply.menu() {
                    buttons = menu.buttons().cloned().collect();
                } else if !reply.state().is_some_and(|s| s.is_input()) {
                    buttons.clear();
                }
                writeln!(out, "{}", display::reply(&reply))?;
            }
            Err(e) => {
                error!(error = %e, "engine fault");
                writeln!(out, "error: {}", e)?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use survbot_core::params::ParamName;
    use survbot_core::store::ConfigStore;
    use survbot_core::types::action::Action;
    use survbot_core::types::value::Value;

    const USER: UserId = UserId(1);

    fn chat(script: &str) -> (Engine, String) {
        let engine = Engine::new(Arc::new(ConfigStore::new()));
        let mut out = Vec::new();
        run(&engine, USER, script.as_bytes(), &mut out).unwrap();
        (engine, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parse_commands() {
        assert_eq!(parse_line("/config", USER, &[]), ChatInput::Event(Event::Start { user: USER }));
        assert_eq!(
            parse_line(" /stop_config ", USER, &[]),
            ChatInput::Event(Event::Cancel { user: USER })
        );
        assert_eq!(parse_line("/quit", USER, &[]), ChatInput::Quit);
        assert_eq!(parse_line("   ", USER, &[]), ChatInput::Empty);
    }

    #[test]
    fn numbers_press_buttons_in_range() {
        let buttons = vec![
            Button::new("Enable", Action::Enable),
            Button::new("Disable", Action::Disable),
        ];
        assert_eq!(
            parse_line("2", USER, &buttons),
            ChatInput::Event(Event::Press { user: USER, token: "disable".into() })
        );
        assert_eq!(
            parse_line("3", USER, &buttons),
            ChatInput::Event(Event::Text { user: USER, text: "3".into() })
        );
        assert_eq!(
            parse_line("0", USER, &buttons),
            ChatInput::Event(Event::Text { user: USER, text: "0".into() })
        );
    }

    #[test]
    fn scripted_float_edit() {
        // Main: [1] general [2] surveillance [3] done.
        // Surveillance: six edit buttons, the audio threshold is sixth.
        let (engine, out) = chat("/config\n2\n6\n0.25\n/quit\n");
        assert!(out.starts_with(GREETING));
        assert!(out.contains("Surveillance Bot Configuration"));
        assert!(out.contains("Audio threshold"));
        assert_eq!(engine.store().get(ParamName::SrvAudioThreshold), Ok(Value::Float(0.25)));
        assert!(out.ends_with("[state: SurveillanceMenu]\n"));
    }

    #[test]
    fn typed_number_in_integer_prompt_is_text() {
        // Surveillance > Video duration prompt has no buttons, so "1" is a value.
        let (engine, _) = chat("/config\n2\n1\n1\n");
        assert_eq!(engine.store().get(ParamName::SrvVideoDuration), Ok(Value::Int(1)));
    }

    #[test]
    fn invalid_value_keeps_prompt() {
        let (engine, out) = chat("/config\n1\n2\n999\n");
        assert!(out.contains("Invalid value, insert an integer number between 0 and 255"));
        assert_eq!(engine.store().get(ParamName::OdVideoDuration), Ok(Value::Int(5)));
        assert!(engine.session(USER).is_some());
    }

    #[test]
    fn stop_config_cancels() {
        let (engine, out) = chat("/config\n1\n/stop_config\n");
        assert!(out.contains("Configuration canceled."));
        assert!(engine.session(USER).is_none());
    }

    #[test]
    fn show_prints_store() {
        let (_, out) = chat("/show\n");
        assert!(out.contains("srv_video_threshold = 5"));
        assert!(out.contains("timestamp = true"));
    }

    #[test]
    fn unmatched_input_is_silent() {
        let (_, out) = chat("hello\n");
        assert_eq!(out, format!("{}\n", GREETING));
    }
}
