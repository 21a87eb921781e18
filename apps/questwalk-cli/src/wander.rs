use questwalk_common::splitmix64;
use questwalk_input::{InputRecording, InputState, LogicalKey};

const DIRECTIONS: [&[LogicalKey]; 9] = [
    &[],
    &[LogicalKey::Forward],
    &[LogicalKey::Backward],
    &[LogicalKey::Left],
    &[LogicalKey::Right],
    &[LogicalKey::Forward, LogicalKey::Left],
    &[LogicalKey::Forward, LogicalKey::Right],
    &[LogicalKey::Backward, LogicalKey::Left],
    &[LogicalKey::Backward, LogicalKey::Right],
];

/// Pseudo-random walk: `segments` runs of held keys, each 10..=90 frames,
/// fully determined by `seed`.
pub fn wander(seed: u64, segments: usize, dt: f32) -> InputRecording {
    let mut recording = InputRecording::new();
    for i in 0..segments {
        let r = splitmix64(seed.wrapping_add(i as u64));
        let keys = DIRECTIONS[(r % DIRECTIONS.len() as u64) as usize];
        let mut input = InputState::with_keys(keys);
        input.set(LogicalKey::Run, (r >> 8) % 4 == 0);
        let frames = 10 + (r >> 16) % 81;
        for _ in 0..frames {
            recording.push(dt, input);
        }
    }
    recording
}
