//! Config store — the shared, process-lifetime parameter values.
//!
//! One typed slot per registry parameter, all behind a single mutex. Writes
//! are mutually exclusive and readers take a consistent `snapshot()`, so a
//! menu never shows a half-applied edit. The surveillance engine reads the
//! same store through `get()` or `surveillance_settings()`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::params::{ParamName, PARAMETERS};
use crate::types::value::Value;


/// Plain copy of the store contents. `None` means "never populated".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigValues {
    pub timestamp: Option<bool>,
    pub od_video_duration: Option<u8>,
    pub srv_video_duration: Option<u8>,
    pub srv_audio_duration: Option<u8>,
    pub srv_picture_interval: Option<u8>,
    pub srv_motion_contours: Option<bool>,
    pub srv_video_threshold: Option<u8>,
    pub srv_audio_threshold: Option<f64>,
}

impl ConfigValues {
    pub fn get(&self, name: ParamName) -> Result<Value, StoreError> {
        let value = match name {
            ParamName::Timestamp => self.timestamp.map(Value::Bool),
            ParamName::OdVideoDuration => self.od_video_duration.map(Value::Int),
            ParamName::SrvVideoDuration => self.srv_video_duration.map(Value::Int),
            ParamName::SrvAudioDuration => self.srv_audio_duration.map(Value::Int),
            ParamName::SrvPictureInterval => self.srv_picture_interval.map(Value::Int),
            ParamName::SrvMotionContours => self.srv_motion_contours.map(Value::Bool),
            ParamName::SrvVideoThreshold => self.srv_video_threshold.map(Value::Int),
            ParamName::SrvAudioThreshold => self.srv_audio_threshold.map(Value::Float),
        };
        value.ok_or(StoreError::KeyMissing(name))
    }

    pub fn contains(&self, name: ParamName) -> bool {
        self.get(name).is_ok()
    }

    /// Overwrite one slot. Only the value's type is checked.
    pub fn set(&mut self, name: ParamName, value: Value) -> Result<(), StoreError> {
        match (name, value) {
            (ParamName::Timestamp, Value::Bool(b)) => self.timestamp = Some(b),
            (ParamName::OdVideoDuration, Value::Int(n)) => self.od_video_duration = Some(n),
            (ParamName::SrvVideoDuration, Value::Int(n)) => self.srv_video_duration = Some(n),
            (ParamName::SrvAudioDuration, Value::Int(n)) => self.srv_audio_duration = Some(n),
            (ParamName::SrvPictureInterval, Value::Int(n)) => self.srv_picture_interval = Some(n),
            (ParamName::SrvMotionContours, Value::Bool(b)) => self.srv_motion_contours = Some(b),
            (ParamName::SrvVideoThreshold, Value::Int(n)) => self.srv_video_threshold = Some(n),
            (ParamName::SrvAudioThreshold, Value::Float(x)) => self.srv_audio_threshold = Some(x),
            (name, got) => {
                return Err(StoreError::TypeMismatch {
                    name,
                    expected: name.kind(),
                    got,
                })
            }
        }
        Ok(())
    }

    /// Populated entries in registry order.
    pub fn entries(&self) -> Vec<(ParamName, Value)> {
        ParamName::ALL
            .iter()
            .filter_map(|name| self.get(*name).ok().map(|v| (*name, v)))
            .collect()
    }

    /// Insert registry defaults into empty slots. Returns how many were filled.
    fn fill_defaults(&mut self) -> usize {
        let mut inserted = 0;
        for param in PARAMETERS.iter() {
            if self.contains(param.name) {
                continue;
            }
            // Registry defaults always match their declared kind.
            if self.set(param.name, param.default).is_ok() {
                inserted += 1;
            }
        }
        inserted
    }
}


/// Fully resolved, typed view for the surveillance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceSettings {
    pub timestamp: bool,
    pub od_video_duration: u8,
    pub srv_video_duration: u8,
    pub srv_audio_duration: u8,
    pub srv_picture_interval: u8,
    pub srv_motion_contours: bool,
    pub srv_video_threshold: u8,
    pub srv_audio_threshold: f64,
}

impl TryFrom<&ConfigValues> for SurveillanceSettings {
    type Error = StoreError;

    fn try_from(v: &ConfigValues) -> Result<Self, Self::Error> {
        let missing = StoreError::KeyMissing;
        Ok(SurveillanceSettings {
            timestamp: v.timestamp.ok_or(missing(ParamName::Timestamp))?,
            od_video_duration: v.od_video_duration.ok_or(missing(ParamName::OdVideoDuration))?,
            srv_video_duration: v.srv_video_duration.ok_or(missing(ParamName::SrvVideoDuration))?,
            srv_audio_duration: v.srv_audio_duration.ok_or(missing(ParamName::SrvAudioDuration))?,
            srv_picture_interval: v
                .srv_picture_interval
                .ok_or(missing(ParamName::SrvPictureInterval))?,
            srv_motion_contours: v
                .srv_motion_contours
                .ok_or(missing(ParamName::SrvMotionContours))?,
            srv_video_threshold: v
                .srv_video_threshold
                .ok_or(missing(ParamName::SrvVideoThreshold))?,
            srv_audio_threshold: v
                .srv_audio_threshold
                .ok_or(missing(ParamName::SrvAudioThreshold))?,
        })
    }
}


/// The shared store. Wrap in an `Arc` to share between sessions and the
/// surveillance engine.
#[derive(Debug, Default)]
pub struct ConfigStore {
    values: Mutex<ConfigValues>,
}

impl ConfigStore {
    /// An empty store. Reads fail until `ensure_defaults()` runs.
    pub fn new() -> Self {
        ConfigStore::default()
    }

    /// A store seeded with existing values (missing entries stay missing).
    pub fn from_values(values: ConfigValues) -> Self {
        ConfigStore {
            values: Mutex::new(values),
        }
    }

    // Every write is a single slot assignment, so a poisoned lock still
    // guards a consistent value set.
    fn lock(&self) -> MutexGuard<'_, ConfigValues> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: ParamName) -> Result<Value, StoreError> {
        self.lock().get(name)
    }

    pub fn set(&self, name: ParamName, value: Value) -> Result<(), StoreError> {
        self.lock().set(name, value)?;
        debug!(param = %name, %value, "config value set");
        Ok(())
    }

    /// Populate every missing entry with its registry default. Never
    /// overwrites an existing value; repeated calls are no-ops.
    pub fn ensure_defaults(&self) -> usize {
        let inserted = self.lock().fill_defaults();
        if inserted > 0 {
            info!(inserted, "config defaults populated");
        }
        inserted
    }

    pub fn snapshot(&self) -> ConfigValues {
        self.lock().clone()
    }

    pub fn surveillance_settings(&self) -> Result<SurveillanceSettings, StoreError> {
        SurveillanceSettings::try_from(&*self.lock())
    }
}
