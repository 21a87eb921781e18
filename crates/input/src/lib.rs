//! Input sampling: host key events mapped to logical movement keys.
//!
//! # Invariants
//! - Key listeners only mutate held-key state; they never step the simulation.
//! - A detached sampler ignores events and reports no held keys.
//! - Direction vectors are unit length or zero.

pub mod key;
pub mod recording;
pub mod sampler;

pub use key::LogicalKey;
pub use recording::{InputRecording, RecordedFrame, RecordingError};
pub use sampler::{InputSampler, InputState};
