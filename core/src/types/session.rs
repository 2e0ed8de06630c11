use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ParamName;

/// Chat identity of the user driving a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation state of a session.
///
/// ```text
/// Main -> GeneralMenu      -> BooleanInput | IntegerInput              -> GeneralMenu
///      -> SurveillanceMenu -> BooleanInput | IntegerInput | FloatInput -> SurveillanceMenu
///      -> Terminal
/// any  -> Terminal (cancel)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuState {
    Main,
    GeneralMenu,
    SurveillanceMenu,
    BooleanInput,
    IntegerInput,
    FloatInput,
    Terminal,
}

impl MenuState {
    pub fn is_input(self) -> bool {
        matches!(
            self,
            MenuState::BooleanInput | MenuState::IntegerInput | MenuState::FloatInput
        )
    }

    /// The section menu this state displays, if it is one.
    pub fn section(self) -> Option<ReturnTo> {
        match self {
            MenuState::GeneralMenu => Some(ReturnTo::General),
            MenuState::SurveillanceMenu => Some(ReturnTo::Surveillance),
            _ => None,
        }
    }
}

/// Continuation tag: which section menu to resume once an input completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnTo {
    General,
    Surveillance,
}

impl ReturnTo {
    pub fn state(self) -> MenuState {
        match self {
            ReturnTo::General => MenuState::GeneralMenu,
            ReturnTo::Surveillance => MenuState::SurveillanceMenu,
        }
    }
}

/// The parameter being edited and where to go afterwards. The two are only
/// ever set and cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pending {
    pub param: ParamName,
    pub return_to: ReturnTo,
}

/// Per-user ephemeral conversation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    state: MenuState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending: Option<Pending>,
}

impl Session {
    /// A session freshly opened by the entry command.
    pub fn new() -> Self {
        Session {
            state: MenuState::Main,
            pending: None,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn pending_param(&self) -> Option<ParamName> {
        self.pending.map(|p| p.param)
    }

    pub fn return_to(&self) -> Option<ReturnTo> {
        self.pending.map(|p| p.return_to)
    }

    pub fn is_active(&self) -> bool {
        self.state != MenuState::Terminal
    }

    /// Move to a menu state. Leaving an input state drops the pending edit.
    pub fn show(&mut self, state: MenuState) {
        if !state.is_input() {
            self.pending = None;
        }
        self.state = state;
    }

    /// Divert into a generic input state for `param`, remembering the menu
    /// to resume afterwards.
    pub fn enter_input(&mut self, state: MenuState, param: ParamName, return_to: ReturnTo) {
        debug_assert!(state.is_input());
        self.pending = Some(Pending { param, return_to });
        self.state = state;
    }

    /// Teardown on done/cancel.
    pub fn clear(&mut self) {
        self.pending = None;
        self.state = MenuState::Terminal;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
