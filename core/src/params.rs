//! Parameter registry — the static catalog of configurable parameters.
//!
//! Every parameter the surveillance engine reads has exactly one descriptor
//! here. The registry is immutable; the config store and the menu renderer
//! both derive their behavior from it.
//!
//! | name | kind | default | menu |
//! |------|------|---------|------|
//! | `timestamp` | boolean | true | General |
//! | `od_video_duration` | integer | 5 | General |
//! | `srv_video_duration` | integer | 30 | Surveillance |
//! | `srv_audio_duration` | integer | 5 | Surveillance |
//! | `srv_picture_interval` | integer | 5 | Surveillance |
//! | `srv_motion_contours` | boolean | true | Surveillance |
//! | `srv_video_threshold` | integer | 5 | Surveillance |
//! | `srv_audio_threshold` | float | 0.1 | Surveillance |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::types::session::ReturnTo;
use crate::types::value::Value;


/// Stable identity of a parameter. Serializes as its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    Timestamp,
    OdVideoDuration,
    SrvVideoDuration,
    SrvAudioDuration,
    SrvPictureInterval,
    SrvMotionContours,
    SrvVideoThreshold,
    SrvAudioThreshold,
}


/// Value type of a parameter. Selects which input state collects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Boolean,
    Integer,
    Float,
}


/// Inclusive integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub const fn new(min: i64, max: i64) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Range accepted for every bounded-integer parameter.
pub const INTEGER_BOUNDS: Bounds = Bounds::new(0, 255);


/// Immutable descriptor of one configurable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: ParamName,
    pub kind: ParamKind,
    pub default: Value,
    /// Present only for bounded integers.
    pub bounds: Option<Bounds>,
    /// Button label and heading in the section menu.
    pub label: &'static str,
    pub description: &'static str,
    /// The menu listing this parameter, and the menu resumed after editing it.
    pub menu: ReturnTo,
    /// Unit printed after the current value, if any.
    pub unit: Option<&'static str>,
    /// Heading of the input prompt.
    pub title: &'static str,
    /// Instruction line at the bottom of the input prompt.
    pub prompt: &'static str,
}


/// The registry, in display order. Indexed by `ParamName as usize`.
pub static PARAMETERS: [Parameter; 8] = [
    Parameter {
        name: ParamName::Timestamp,
        kind: ParamKind::Boolean,
        default: Value::Bool(true),
        bounds: None,
        label: "Timestamp",
        description: "Print a timestamp on every photo or video taken.",
        menu: ReturnTo::General,
        unit: None,
        title: "Timestamp",
        prompt: "Select state for time stamping:",
    },
    Parameter {
        name: ParamName::OdVideoDuration,
        kind: ParamKind::Integer,
        default: Value::Int(5),
        bounds: Some(INTEGER_BOUNDS),
        label: "On Demand video duration",
        description: "Duration of the video taken with /get_video command.",
        menu: ReturnTo::General,
        unit: Some("seconds"),
        title: "On Demand video duration",
        prompt: "Type value for video duration:",
    },
    Parameter {
        name: ParamName::SrvVideoDuration,
        kind: ParamKind::Integer,
        default: Value::Int(30),
        bounds: Some(INTEGER_BOUNDS),
        label: "Video duration",
        description: "Duration of the video taken when motion or sound is detected.",
        menu: ReturnTo::Surveillance,
        unit: Some("seconds"),
        title: "Surveillance video duration",
        prompt: "Type value for video duration:",
    },
    Parameter {
        name: ParamName::SrvAudioDuration,
        kind: ParamKind::Integer,
        default: Value::Int(5),
        bounds: Some(INTEGER_BOUNDS),
        label: "Audio duration",
        description: "Duration of the audio recorded when motion or sound is detected.",
        menu: ReturnTo::Surveillance,
        unit: Some("seconds"),
        title: "Surveillance audio duration",
        prompt: "Type value for audio duration:",
    },
    Parameter {
        name: ParamName::SrvPictureInterval,
        kind: ParamKind::Integer,
        default: Value::Int(5),
        bounds: Some(INTEGER_BOUNDS),
        label: "Picture Interval",
        description: "Interval between photos taken after motion is detected.",
        menu: ReturnTo::Surveillance,
        unit: Some("seconds"),
        title: "Surveillance picture interval",
        prompt: "Type value for picture interval:",
    },
    Parameter {
        name: ParamName::SrvMotionContours,
        kind: ParamKind::Boolean,
        default: Value::Bool(true),
        bounds: None,
        label: "Draw motion contours",
        description: "Draws a rectangle around the objects in motion.",
        menu: ReturnTo::Surveillance,
        unit: None,
        title: "Motion contours",
        prompt: "Select state for motion contours:",
    },
    Parameter {
        name: ParamName::SrvVideoThreshold,
        kind: ParamKind::Integer,
        default: Value::Int(5),
        bounds: Some(INTEGER_BOUNDS),
        label: "Video threshold",
        description: "Sensitivity of motion detection.",
        menu: ReturnTo::Surveillance,
        unit: None,
        title: "Video threshold",
        prompt: "Type value for video threshold (e.g., 5):",
    },
    Parameter {
        name: ParamName::SrvAudioThreshold,
        kind: ParamKind::Float,
        default: Value::Float(0.1),
        bounds: None,
        label: "Audio threshold",
        description: "Sensitivity of sound detection.",
        menu: ReturnTo::Surveillance,
        unit: None,
        title: "Audio threshold",
        prompt: "Type value for audio threshold (e.g., 0.1):",
    },
];


impl ParamName {
    pub const ALL: [ParamName; 8] = [
        ParamName::Timestamp,
        ParamName::OdVideoDuration,
        ParamName::SrvVideoDuration,
        ParamName::SrvAudioDuration,
        ParamName::SrvPictureInterval,
        ParamName::SrvMotionContours,
        ParamName::SrvVideoThreshold,
        ParamName::SrvAudioThreshold,
    ];

    pub fn descriptor(self) -> &'static Parameter {
        &PARAMETERS[self as usize]
    }

    pub fn kind(self) -> ParamKind {
        self.descriptor().kind
    }

    /// Wire name, also the config store key.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Timestamp => "timestamp",
            ParamName::OdVideoDuration => "od_video_duration",
            ParamName::SrvVideoDuration => "srv_video_duration",
            ParamName::SrvAudioDuration => "srv_audio_duration",
            ParamName::SrvPictureInterval => "srv_picture_interval",
            ParamName::SrvMotionContours => "srv_motion_contours",
            ParamName::SrvVideoThreshold => "srv_video_threshold",
            ParamName::SrvAudioThreshold => "srv_audio_threshold",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RegistryError::NotFound(s.to_string()))
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Boolean => f.write_str("boolean"),
            ParamKind::Integer => f.write_str("integer"),
            ParamKind::Float => f.write_str("float"),
        }
    }
}


/// Look up a parameter descriptor by its wire name.
pub fn describe(name: &str) -> Result<&'static Parameter, RegistryError> {
    name.parse::<ParamName>().map(ParamName::descriptor)
}

/// Parameters listed by the given menu, in display order.
pub fn parameters_in(menu: ReturnTo) -> impl Iterator<Item = &'static Parameter> {
    PARAMETERS.iter().filter(move |p| p.menu == menu)
}
