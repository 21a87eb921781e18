use winit::keyboard::KeyCode;

/// Host key name for a physical key, in the form the input sampler accepts.
/// Keys with no movement meaning map to `None`.
pub fn key_name(code: KeyCode) -> Option<&'static str> {
    let name = match code {
        KeyCode::KeyW => "KeyW",
        KeyCode::KeyA => "KeyA",
        KeyCode::KeyS => "KeyS",
        KeyCode::KeyD => "KeyD",
        KeyCode::ArrowUp => "ArrowUp",
        KeyCode::ArrowDown => "ArrowDown",
        KeyCode::ArrowLeft => "ArrowLeft",
        KeyCode::ArrowRight => "ArrowRight",
        KeyCode::ShiftLeft => "ShiftLeft",
        KeyCode::ShiftRight => "ShiftRight",
        _ => return None,
    };
    Some(name)
}

/// Whether a keyboard event reaches the scene after the HUD has seen it.
/// Presses the HUD consumed stay with the HUD; releases always go through so
/// a movement key can never stick down.
pub fn forward_to_scene(consumed_by_hud: bool, pressed: bool) -> bool {
    !(consumed_by_hud && pressed)
}
