//! Conversation engine — the configuration state machine.
//!
//! The engine owns the per-user session table and a handle to the shared
//! config store. Each inbound `Event` is routed by (session state, action) to
//! a handler that renders a menu, diverts into one of the three generic
//! input states, or commits a validated value and resumes the menu recorded
//! in the session's continuation.
//!
//! # Concurrency
//!
//! Every session sits behind its own mutex, held for the whole handling of
//! an event, so one user's events are processed strictly in order while
//! other users proceed in parallel. The table lock is only held to look up,
//! insert or remove entries and is never held while waiting on a session
//! lock.
//!
//! # Unknown actions
//!
//! An event with no matching transition is answered with `Reply::Ignored`
//! and logged at debug level. The session is left untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::menu::{self, View};
use crate::params::{ParamKind, ParamName};
use crate::store::ConfigStore;
use crate::types::action::Action;
use crate::types::protocol::{Effect, Event, RenderMode, Reply};
use crate::types::session::{MenuState, ReturnTo, Session, UserId};
use crate::types::value::Value;
use crate::validate;


const DONE_TEXT: &str = "Configuration done.";
const CANCELED_TEXT: &str = "Configuration canceled.";

type SessionSlot = Arc<Mutex<Session>>;


pub struct Engine {
    store: Arc<ConfigStore>,
    sessions: Mutex<HashMap<UserId, SessionSlot>>,
}


fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}


impl Engine {
    /// Build an engine over `store`, populating missing defaults first so
    /// no menu can ever read an empty slot.
    pub fn new(store: Arc<ConfigStore>) -> Engine {
        store.ensure_defaults();
        Engine {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Copy of a user's live session, if any.
    pub fn session(&self, user: UserId) -> Option<Session> {
        let slot = lock(&self.sessions).get(&user).cloned()?;
        let session = lock(&slot).clone();
        session.is_active().then_some(session)
    }

    pub fn active_sessions(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Process one inbound event.
    pub fn handle(&self, event: Event) -> Result<Reply, EngineError> {
        let user = event.user();
        let mode = event.render_mode();
        let reply = match event {
            Event::Start { .. } => self.start(user, mode)?,
            Event::Cancel { .. } => self.cancel(user, mode),
            Event::Press { token, .. } => match token.parse::<Action>() {
                Ok(action) => self.with_session(user, |s| self.press(s, action, mode))?,
                Err(err) => Reply::ignored(err.to_string()),
            },
            Event::Text { text, .. } => self.with_session(user, |s| self.text(s, &text, mode))?,
        };
        if let Reply::Ignored { reason } = &reply {
            debug!(%user, reason = %reason, "event ignored");
        }
        Ok(reply)
    }

    // -----------------------------------------------------------------
    // Session table
    // -----------------------------------------------------------------

    fn slot(&self, user: UserId) -> Option<SessionSlot> {
        lock(&self.sessions).get(&user).cloned()
    }

    /// Run `f` on the user's live session, tearing the entry down if the
    /// handler reached `Terminal`.
    fn with_session<F>(&self, user: UserId, f: F) -> Result<Reply, EngineError>
    where
        F: FnOnce(&mut Session) -> Result<Reply, EngineError>,
    {
        let Some(slot) = self.slot(user) else {
            return Ok(Reply::ignored("no active session"));
        };
        let mut session = lock(&slot);
        if !session.is_active() {
            return Ok(Reply::ignored("no active session"));
        }
        let reply = f(&mut *session)?;
        if !session.is_active() {
            self.remove(user, &slot);
        }
        Ok(reply)
    }

    fn remove(&self, user: UserId, slot: &SessionSlot) {
        let mut sessions = lock(&self.sessions);
        if sessions.get(&user).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            sessions.remove(&user);
            info!(%user, "config session closed");
        }
    }

    // -----------------------------------------------------------------
    // Entry and cancel
    // -----------------------------------------------------------------

    fn start(&self, user: UserId, mode: RenderMode) -> Result<Reply, EngineError> {
        let (slot, fresh) = {
            let mut sessions = lock(&self.sessions);
            match sessions.get(&user) {
                Some(slot) => (Arc::clone(slot), false),
                None => {
                    let slot = Arc::new(Mutex::new(Session::new()));
                    sessions.insert(user, Arc::clone(&slot));
                    (slot, true)
                }
            }
        };
        let mut session = lock(&slot);
        if !fresh && session.is_active() {
            return Ok(Reply::ignored("session already active"));
        }
        *session = Session::new();
        // A concurrent teardown may have dropped the entry while we waited.
        lock(&self.sessions)
            .entry(user)
            .or_insert_with(|| Arc::clone(&slot));
        info!(%user, "config session started");
        self.show(&mut *session, View::Main, MenuState::Main, mode)
    }

    fn cancel(&self, user: UserId, mode: RenderMode) -> Reply {
        let Some(slot) = self.slot(user) else {
            return Reply::ignored("no active session");
        };
        let mut session = lock(&slot);
        let was = session.state();
        session.clear();
        self.remove(user, &slot);
        if was == MenuState::Terminal {
            return Reply::ignored("no active session");
        }
        info!(%user, from = ?was, "config session canceled");
        Reply::handled(
            MenuState::Terminal,
            Effect::Message {
                mode,
                text: CANCELED_TEXT.to_string(),
            },
        )
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    fn press(
        &self,
        session: &mut Session,
        action: Action,
        mode: RenderMode,
    ) -> Result<Reply, EngineError> {
        match (session.state(), action) {
            // --- Main ---
            (MenuState::Main, Action::OpenGeneral) => self.resume(session, ReturnTo::General, mode),
            (MenuState::Main, Action::OpenSurveillance) => {
                self.resume(session, ReturnTo::Surveillance, mode)
            }
            (MenuState::Main, Action::Done) => {
                session.clear();
                Ok(Reply::handled(
                    MenuState::Terminal,
                    Effect::Message {
                        mode,
                        text: DONE_TEXT.to_string(),
                    },
                ))
            }

            // --- Section menus ---
            (MenuState::GeneralMenu | MenuState::SurveillanceMenu, Action::Back) => {
                self.show(session, View::Main, MenuState::Main, mode)
            }
            (state @ (MenuState::GeneralMenu | MenuState::SurveillanceMenu), Action::Edit(param))
                if state.section() == Some(param.descriptor().menu) =>
            {
                self.ask(session, param, param.descriptor().menu, mode)
            }

            // --- Boolean input ---
            (MenuState::BooleanInput, Action::Enable | Action::Disable) => {
                match validate::boolean(action) {
                    Some(flag) => self.commit(session, Value::Bool(flag), mode),
                    None => Ok(Reply::ignored("not a boolean answer")),
                }
            }

            (state, action) => Ok(Reply::ignored(format!(
                "action '{}' has no transition from {:?}",
                action, state
            ))),
        }
    }

    fn text(&self, session: &mut Session, raw: &str, mode: RenderMode) -> Result<Reply, EngineError> {
        let state = session.state();
        if !matches!(state, MenuState::IntegerInput | MenuState::FloatInput) {
            return Ok(Reply::ignored(format!("free text has no transition from {:?}", state)));
        }
        let Some(param) = session.pending_param() else {
            return Ok(Reply::ignored("input state without a pending parameter"));
        };

        match validate::text_for(param.descriptor(), raw) {
            Ok(value) => self.commit(session, value, mode),
            Err(err) => {
                warn!(param = %param, input = raw, error = %err, "rejected config value");
                Ok(Reply::handled(
                    state,
                    Effect::Message {
                        mode,
                        text: err.user_message().to_string(),
                    },
                ))
            }
        }
    }

    /// Divert into the generic input state for `param`'s kind.
    fn ask(
        &self,
        session: &mut Session,
        param: ParamName,
        return_to: ReturnTo,
        mode: RenderMode,
    ) -> Result<Reply, EngineError> {
        let state = match param.kind() {
            ParamKind::Boolean => MenuState::BooleanInput,
            ParamKind::Integer => MenuState::IntegerInput,
            ParamKind::Float => MenuState::FloatInput,
        };
        let menu = menu::render(View::Prompt(param), &self.store.snapshot())?;
        session.enter_input(state, param, return_to);
        debug!(param = %param, ?state, ?return_to, "awaiting input");
        Ok(Reply::handled(state, Effect::Menu { mode, menu }))
    }

    /// Store a validated value for the pending parameter, then run the
    /// continuation.
    fn commit(
        &self,
        session: &mut Session,
        value: Value,
        mode: RenderMode,
    ) -> Result<Reply, EngineError> {
        let Some(pending) = session.pending() else {
            return Ok(Reply::ignored("input state without a pending parameter"));
        };
        self.store.set(pending.param, value)?;
        info!(param = %pending.param, %value, "config value updated");
        self.resume(session, pending.return_to, mode)
    }

    /// The continuation table: a `ReturnTo` tag resumes its section menu.
    fn resume(
        &self,
        session: &mut Session,
        to: ReturnTo,
        mode: RenderMode,
    ) -> Result<Reply, EngineError> {
        self.show(session, View::Section(to), to.state(), mode)
    }

    fn show(
        &self,
        session: &mut Session,
        view: View,
        state: MenuState,
        mode: RenderMode,
    ) -> Result<Reply, EngineError> {
        let menu = menu::render(view, &self.store.snapshot())?;
        session.show(state);
        Ok(Reply::handled(state, Effect::Menu { mode, menu }))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(42);

    fn engine() -> Engine {
        Engine::new(Arc::new(ConfigStore::new()))
    }

    fn press(engine: &Engine, token: &str) -> Reply {
        engine
            .handle(Event::Press {
                user: USER,
                token: token.into(),
            })
            .unwrap()
    }

    fn text(engine: &Engine, text: &str) -> Reply {
        engine
            .handle(Event::Text {
                user: USER,
                text: text.into(),
            })
            .unwrap()
    }

    fn start(engine: &Engine) -> Reply {
        engine.handle(Event::Start { user: USER }).unwrap()
    }

    fn state(engine: &Engine) -> Option<MenuState> {
        engine.session(USER).map(|s| s.state())
    }

    #[test]
    fn new_engine_populates_defaults() {
        let engine = engine();
        assert_eq!(engine.store().get(ParamName::SrvVideoThreshold), Ok(Value::Int(5)));
    }

    #[test]
    fn start_sends_main_menu() {
        let engine = engine();
        let reply = start(&engine);
        assert_eq!(reply.state(), Some(MenuState::Main));
        match &reply.effects()[0] {
            Effect::Menu { mode, menu } => {
                assert_eq!(*mode, RenderMode::Send);
                assert_eq!(menu.rows.len(), 3);
            }
            other => panic!("unexpected effect: {:?}", other),
        }
        assert_eq!(state(&engine), Some(MenuState::Main));
    }

    #[test]
    fn main_to_sections_and_back() {
        let engine = engine();
        start(&engine);
        let reply = press(&engine, "general");
        assert_eq!(reply.state(), Some(MenuState::GeneralMenu));
        assert!(matches!(reply.effects()[0], Effect::Menu { mode: RenderMode::Edit, .. }));

        assert_eq!(press(&engine, "back").state(), Some(MenuState::Main));
        assert_eq!(press(&engine, "surveillance").state(), Some(MenuState::SurveillanceMenu));
        assert_eq!(press(&engine, "back").state(), Some(MenuState::Main));
    }

    #[test]
    fn done_tears_session_down() {
        let engine = engine();
        start(&engine);
        let reply = press(&engine, "done");
        assert_eq!(reply.state(), Some(MenuState::Terminal));
        assert_eq!(
            reply.effects(),
            &[Effect::Message {
                mode: RenderMode::Edit,
                text: "Configuration done.".into()
            }]
        );
        assert!(engine.session(USER).is_none());
        assert_eq!(engine.active_sessions(), 0);
    }

    #[test]
    fn boolean_edit_resumes_general() {
        let engine = engine();
        start(&engine);
        press(&engine, "general");
        let reply = press(&engine, "edit:timestamp");
        assert_eq!(reply.state(), Some(MenuState::BooleanInput));
        let session = engine.session(USER).unwrap();
        assert_eq!(session.pending_param(), Some(ParamName::Timestamp));
        assert_eq!(session.return_to(), Some(ReturnTo::General));

        let reply = press(&engine, "disable");
        assert_eq!(reply.state(), Some(MenuState::GeneralMenu));
        assert_eq!(engine.store().get(ParamName::Timestamp), Ok(Value::Bool(false)));
        assert!(reply.menu().unwrap().text.contains("*Disabled*"));
        assert!(engine.session(USER).unwrap().pending().is_none());
    }

    #[test]
    fn float_edit_scenario() {
        let engine = engine();
        start(&engine);
        press(&engine, "surveillance");
        let reply = press(&engine, "edit:srv_audio_threshold");
        assert_eq!(reply.state(), Some(MenuState::FloatInput));
        let session = engine.session(USER).unwrap();
        assert_eq!(session.pending_param(), Some(ParamName::SrvAudioThreshold));
        assert_eq!(session.return_to(), Some(ReturnTo::Surveillance));

        let reply = text(&engine, "0.2");
        assert_eq!(reply.state(), Some(MenuState::SurveillanceMenu));
        assert_eq!(engine.store().get(ParamName::SrvAudioThreshold), Ok(Value::Float(0.2)));
        let session = engine.session(USER).unwrap();
        assert_eq!(session.state(), MenuState::SurveillanceMenu);
        assert!(session.pending().is_none());
        // Typed input gets a fresh menu message.
        assert!(matches!(reply.effects()[0], Effect::Menu { mode: RenderMode::Send, .. }));
    }

    #[test]
    fn integer_out_of_range_keeps_pending() {
        let engine = engine();
        start(&engine);
        press(&engine, "surveillance");
        press(&engine, "edit:srv_picture_interval");

        let reply = text(&engine, "300");
        assert_eq!(reply.state(), Some(MenuState::IntegerInput));
        assert_eq!(
            reply.effects(),
            &[Effect::Message {
                mode: RenderMode::Send,
                text: "Invalid value, insert an integer number between 0 and 255".into()
            }]
        );
        assert_eq!(engine.store().get(ParamName::SrvPictureInterval), Ok(Value::Int(5)));
        let session = engine.session(USER).unwrap();
        assert_eq!(session.state(), MenuState::IntegerInput);
        assert_eq!(session.pending_param(), Some(ParamName::SrvPictureInterval));
        assert_eq!(session.return_to(), Some(ReturnTo::Surveillance));

        // Recovers on the next valid value.
        assert_eq!(text(&engine, "10").state(), Some(MenuState::SurveillanceMenu));
        assert_eq!(engine.store().get(ParamName::SrvPictureInterval), Ok(Value::Int(10)));
    }

    #[test]
    fn float_rejects_text() {
        let engine = engine();
        start(&engine);
        press(&engine, "surveillance");
        press(&engine, "edit:srv_audio_threshold");
        let reply = text(&engine, "abc");
        assert_eq!(reply.state(), Some(MenuState::FloatInput));
        assert_eq!(engine.store().get(ParamName::SrvAudioThreshold), Ok(Value::Float(0.1)));
    }

    #[test]
    fn cancel_from_input_state() {
        let engine = engine();
        start(&engine);
        press(&engine, "general");
        press(&engine, "edit:od_video_duration");
        let reply = engine.handle(Event::Cancel { user: USER }).unwrap();
        assert_eq!(reply.state(), Some(MenuState::Terminal));
        assert_eq!(
            reply.effects(),
            &[Effect::Message {
                mode: RenderMode::Send,
                text: "Configuration canceled.".into()
            }]
        );
        assert!(engine.session(USER).is_none());
        // The abandoned edit never reached the store.
        assert_eq!(engine.store().get(ParamName::OdVideoDuration), Ok(Value::Int(5)));
    }

    #[test]
    fn cancel_without_session_is_ignored() {
        let engine = engine();
        assert!(engine.handle(Event::Cancel { user: USER }).unwrap().is_ignored());
    }

    #[test]
    fn unknown_and_misplaced_actions_are_ignored() {
        let engine = engine();
        assert!(press(&engine, "general").is_ignored());

        start(&engine);
        assert!(press(&engine, "reboot").is_ignored());
        assert!(press(&engine, "back").is_ignored());
        assert!(text(&engine, "hello").is_ignored());
        assert_eq!(state(&engine), Some(MenuState::Main));

        press(&engine, "general");
        // Surveillance parameters are not editable from the General menu.
        assert!(press(&engine, "edit:srv_audio_threshold").is_ignored());
        assert_eq!(state(&engine), Some(MenuState::GeneralMenu));

        press(&engine, "edit:od_video_duration");
        assert!(press(&engine, "enable").is_ignored());
        assert_eq!(state(&engine), Some(MenuState::IntegerInput));
    }

    #[test]
    fn restart_while_active_is_ignored() {
        let engine = engine();
        start(&engine);
        press(&engine, "surveillance");
        assert!(start(&engine).is_ignored());
        assert_eq!(state(&engine), Some(MenuState::SurveillanceMenu));
    }

    #[test]
    fn restart_after_done_opens_new_session() {
        let engine = engine();
        start(&engine);
        press(&engine, "done");
        assert_eq!(start(&engine).state(), Some(MenuState::Main));
        assert_eq!(engine.active_sessions(), 1);
    }

    #[test]
    fn sessions_are_isolated_per_user() {
        let engine = engine();
        let other = UserId(7);
        start(&engine);
        engine.handle(Event::Start { user: other }).unwrap();
        press(&engine, "surveillance");
        press(&engine, "edit:srv_video_threshold");

        assert_eq!(engine.session(other).unwrap().state(), MenuState::Main);
        assert!(engine
            .handle(Event::Text { user: other, text: "9".into() })
            .unwrap()
            .is_ignored());
        assert_eq!(engine.store().get(ParamName::SrvVideoThreshold), Ok(Value::Int(5)));
    }
}
