/// Splitmix64 finalizer: maps a counter or seed to a well-mixed 64-bit value.
///
/// Feed it `seed + i` for a reproducible stream (wandering input scripts,
/// randomized test sequences).
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
