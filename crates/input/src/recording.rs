use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::key::LogicalKey;
use crate::sampler::InputState;

/// One sampled frame: the frame delta and the keys held during it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub dt: f32,
    pub input: InputState,
}

/// Errors from recording and script handling.
#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad script segment {segment:?}: {reason}")]
    Script { segment: String, reason: String },
}

/// Per-frame input history. Integration is deterministic, so replaying a
/// recording through a fresh scene reproduces the same avatar position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRecording {
    pub frames: Vec<RecordedFrame>,
}

impl InputRecording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, dt: f32, input: InputState) {
        self.frames.push(RecordedFrame { dt, input });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total simulated time.
    pub fn duration(&self) -> f32 {
        self.frames.iter().map(|f| f.dt).sum()
    }

    /// Expand a compact script into frames of fixed `dt`.
    ///
    /// Segments are `keys:frames` separated by commas, keys joined with `+`,
    /// e.g. `forward:60,forward+right+run:30,none:45`.
    pub fn from_script(script: &str, dt: f32) -> Result<Self, RecordingError> {
        let mut recording = Self::new();
        for segment in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let bad = |reason: &str| RecordingError::Script {
                segment: segment.to_string(),
                reason: reason.to_string(),
            };
            let (keys, count) = segment
                .split_once(':')
                .ok_or_else(|| bad("expected keys:frames"))?;
            let count: usize = count
                .trim()
                .parse()
                .map_err(|_| bad("frame count is not a number"))?;

            let mut input = InputState::default();
            if keys.trim() != "none" {
                for word in keys.split('+') {
                    let key = LogicalKey::from_word(word).ok_or_else(|| bad("unknown key"))?;
                    input.set(key, true);
                }
            }
            for _ in 0..count {
                recording.push(dt, input);
            }
        }
        Ok(recording)
    }

    /// Save the recording as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let file = std::fs::File::open(path)?;
        let recording: Self = serde_json::from_reader(file)?;
        Ok(recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_expands_segments() {
        let r = InputRecording::from_script("forward:3, forward+right+run:2,none:1", 0.5).unwrap();
        assert_eq!(r.len(), 6);
        assert!(r.frames[0].input.forward);
        assert!(!r.frames[0].input.run);
        assert!(r.frames[3].input.right && r.frames[3].input.run);
        assert_eq!(r.frames[5].input, InputState::default());
        assert!((r.duration() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn script_rejects_unknown_key() {
        let err = InputRecording::from_script("jump:3", 0.1).unwrap_err();
        assert!(matches!(err, RecordingError::Script { .. }));
    }

    #[test]
    fn script_rejects_missing_count() {
        assert!(InputRecording::from_script("forward", 0.1).is_err());
        assert!(InputRecording::from_script("forward:x", 0.1).is_err());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let r = InputRecording::from_script("left:4,none:2", 1.0 / 60.0).unwrap();
        r.save(tmp.path()).unwrap();
        let loaded = InputRecording::load(tmp.path()).unwrap();
        assert_eq!(loaded, r);
    }
}
