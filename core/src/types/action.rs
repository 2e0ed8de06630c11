use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownAction;
use crate::params::ParamName;

/// A discrete user choice attached to a menu button.
///
/// On the wire an action is its token string: `general`, `surveillance`,
/// `done`, `back`, `enable`, `disable`, or `edit:<parameter>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Action {
    OpenGeneral,
    OpenSurveillance,
    Done,
    Back,
    Edit(ParamName),
    Enable,
    Disable,
}

const EDIT_PREFIX: &str = "edit:";

impl Action {
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::OpenGeneral => f.write_str("general"),
            Action::OpenSurveillance => f.write_str("surveillance"),
            Action::Done => f.write_str("done"),
            Action::Back => f.write_str("back"),
            Action::Edit(name) => write!(f, "{}{}", EDIT_PREFIX, name),
            Action::Enable => f.write_str("enable"),
            Action::Disable => f.write_str("disable"),
        }
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "general" => Action::OpenGeneral,
            "surveillance" => Action::OpenSurveillance,
            "done" => Action::Done,
            "back" => Action::Back,
            "enable" => Action::Enable,
            "disable" => Action::Disable,
            other => {
                let name = other
                    .strip_prefix(EDIT_PREFIX)
                    .and_then(|name| name.parse::<ParamName>().ok())
                    .ok_or_else(|| UnknownAction(other.to_string()))?;
                Action::Edit(name)
            }
        };
        Ok(action)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> String {
        action.to_string()
    }
}

impl TryFrom<String> for Action {
    type Error = UnknownAction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
