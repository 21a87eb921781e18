use serde::{Deserialize, Serialize};

/// A logical movement key. Hosts (desktop window, scripted CLI, tests) produce
/// key names; the sampler only ever sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalKey {
    Forward,
    Backward,
    Left,
    Right,
    /// Run modifier (Shift).
    Run,
}

impl LogicalKey {
    /// Map a host key name to a logical key. Matching is case-insensitive.
    ///
    /// Accepts the WASD letters, arrow key names and the Shift variants.
    /// Anything else returns `None`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "w" | "keyw" | "arrowup" => Some(Self::Forward),
            "s" | "keys" | "arrowdown" => Some(Self::Backward),
            "a" | "keya" | "arrowleft" => Some(Self::Left),
            "d" | "keyd" | "arrowright" => Some(Self::Right),
            "shift" | "shiftleft" | "shiftright" => Some(Self::Run),
            _ => None,
        }
    }

    /// Parse the word form used by input scripts ("forward", "run", ...).
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" => Some(Self::Forward),
            "backward" | "back" => Some(Self::Backward),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "run" => Some(Self::Run),
            _ => None,
        }
    }
}
