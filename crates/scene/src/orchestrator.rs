use glam::Mat4;
use questwalk_anim::{AnimationPath, AnimationSelection, PathKind};
use questwalk_assets::{AvatarAsset, AvatarResolver, ModelLoader, loading_marker};
use questwalk_camera::{CameraRig, CameraState};
use questwalk_common::{AvatarId, SceneGraph};
use questwalk_input::{InputRecording, InputSampler, InputState};
use questwalk_motion::{MotionIntegrator, MotionState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SceneConfig;
use crate::hud::HudReadout;
use crate::throttle::ScrollThrottle;

/// Host callback receiving the avatar position once per frame.
pub type MovementCallback = Box<dyn FnMut([f32; 3])>;

/// Coarse scene state, driven only by `MotionState::is_moving`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenePhase {
    Idle,
    Moving,
}

/// Everything one frame produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: f32,
    pub motion: MotionState,
    pub camera: CameraState,
    pub phase: ScenePhase,
    /// `None` while the avatar is still loading.
    pub path: Option<PathKind>,
    /// Clip selection on the rigged path.
    pub selection: Option<AnimationSelection>,
    /// Whether animation work ran this frame.
    pub animated: bool,
    pub degraded: bool,
    pub render_scale: f32,
}

enum AvatarSlot {
    Loading {
        marker: SceneGraph,
    },
    Ready {
        asset: AvatarAsset,
        scene: SceneGraph,
        path: AnimationPath,
    },
}

/// Owns the avatar scene and runs its per-frame update.
pub struct SceneOrchestrator {
    id: AvatarId,
    config: SceneConfig,
    input: InputSampler,
    motion: MotionIntegrator,
    camera: CameraRig,
    throttle: ScrollThrottle,
    resolver: AvatarResolver,
    slot: AvatarSlot,
    phase: ScenePhase,
    elapsed: f32,
    frame: u64,
    on_movement: Option<MovementCallback>,
    running: bool,
}

impl SceneOrchestrator {
    /// Mount a scene, starting avatar resolution through `loader`.
    pub fn new(config: SceneConfig, loader: Arc<dyn ModelLoader>) -> Self {
        let resolver = AvatarResolver::spawn(loader, config.avatar_url.clone());
        Self::with_resolver(config, resolver)
    }

    /// Mount a scene around an existing resolver.
    pub fn with_resolver(config: SceneConfig, resolver: AvatarResolver) -> Self {
        let motion = MotionIntegrator::new(config.motion.clone());
        let camera = CameraRig::new(config.camera.clone(), motion.state().position);
        let throttle = ScrollThrottle::new(config.throttle.clone());
        let mut input = InputSampler::new();
        input.attach();

        let mut scene = Self {
            id: AvatarId::new(),
            config,
            input,
            motion,
            camera,
            throttle,
            resolver,
            slot: AvatarSlot::Loading {
                marker: loading_marker(),
            },
            phase: ScenePhase::Idle,
            elapsed: 0.0,
            frame: 0,
            on_movement: None,
            running: true,
        };
        // No-URL and failed-spawn cases resolve synchronously.
        if let Some(asset) = scene.resolver.poll() {
            scene.install(asset);
        }
        tracing::info!(avatar = %scene.id.0, "scene mounted");
        scene
    }

    pub fn set_on_movement(&mut self, callback: impl FnMut([f32; 3]) + 'static) {
        self.on_movement = Some(Box::new(callback));
    }

    pub fn on_key_down(&mut self, key: &str) {
        self.input.on_key_down(key);
    }

    pub fn on_key_up(&mut self, key: &str) {
        self.input.on_key_up(key);
    }

    /// Replace the held-key state wholesale (scripted hosts, replays).
    pub fn set_input_state(&mut self, state: InputState) {
        self.input.set_state(state);
    }

    /// Host scroll-activity signal.
    pub fn on_scroll(&mut self) {
        if self.running {
            self.throttle.on_scroll(self.elapsed);
        }
    }

    /// Run one frame. Returns `None` once the scene has been torn down.
    pub fn frame(&mut self, dt: f32) -> Option<FrameReport> {
        if !self.running {
            return None;
        }
        let _span = tracing::info_span!("scene_frame", frame = self.frame).entered();
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.frame += 1;

        if let Some(asset) = self.resolver.poll() {
            self.install(asset);
        }

        let motion = self.motion.tick(
            dt,
            self.input.current_direction(),
            self.input.is_run_modifier_held(),
        );
        self.update_phase(&motion);

        let degraded = self.throttle.update(self.elapsed);
        let elapsed = self.elapsed;
        let (path, selection, animated) = match &mut self.slot {
            AvatarSlot::Loading { .. } => (None, None, false),
            AvatarSlot::Ready { path, .. } if degraded => {
                (Some(path.kind()), path.selection(), false)
            }
            AvatarSlot::Ready { asset, scene, path } => {
                let selection = path.advance(scene, asset.node_roles(), &motion, dt, elapsed);
                (Some(path.kind()), selection, true)
            }
        };

        let camera = self.camera.tick(dt, motion.position);

        if let Some(callback) = self.on_movement.as_mut() {
            callback(motion.position.to_array());
        }

        Some(FrameReport {
            frame: self.frame,
            elapsed,
            motion,
            camera,
            phase: self.phase,
            path,
            selection,
            animated,
            degraded,
            render_scale: self.throttle.render_scale(),
        })
    }

    /// Feed a recording through the frame loop. Returns the last report.
    pub fn play(&mut self, recording: &InputRecording) -> Option<FrameReport> {
        let mut last = None;
        for frame in &recording.frames {
            self.set_input_state(frame.input);
            last = self.frame(frame.dt).or(last);
        }
        last
    }

    /// Stop the scene: release listeners, cancel timers and pending loads.
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.input.detach();
        self.throttle.cancel();
        self.resolver.cancel();
        self.on_movement = None;
        self.running = false;
        tracing::info!(avatar = %self.id.0, frames = self.frame, "scene torn down");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn id(&self) -> AvatarId {
        self.id
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn motion(&self) -> &MotionState {
        self.motion.state()
    }

    pub fn input(&self) -> InputState {
        self.input.snapshot()
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn is_avatar_ready(&self) -> bool {
        matches!(self.slot, AvatarSlot::Ready { .. })
    }

    pub fn path_kind(&self) -> Option<PathKind> {
        match &self.slot {
            AvatarSlot::Loading { .. } => None,
            AvatarSlot::Ready { path, .. } => Some(path.kind()),
        }
    }

    /// The resolved asset, once available.
    pub fn asset(&self) -> Option<&AvatarAsset> {
        match &self.slot {
            AvatarSlot::Loading { .. } => None,
            AvatarSlot::Ready { asset, .. } => Some(asset),
        }
    }

    /// Scene graph to draw: the live avatar, or the loading marker.
    pub fn avatar_scene(&self) -> &SceneGraph {
        match &self.slot {
            AvatarSlot::Loading { marker } => marker,
            AvatarSlot::Ready { scene, .. } => scene,
        }
    }

    /// World matrix of the avatar root (position and heading).
    pub fn avatar_world(&self) -> Mat4 {
        self.motion.state().transform().to_matrix()
    }

    pub fn hud(&self) -> HudReadout {
        HudReadout::from_motion(self.motion.state(), self.input.is_run_modifier_held())
    }

    fn install(&mut self, asset: AvatarAsset) {
        let scene = asset.scene().clone();
        let path = AnimationPath::for_asset(&asset, &scene, &self.config.animation);
        tracing::info!(
            avatar = %self.id.0,
            kind = ?path.kind(),
            nodes = scene.len(),
            "avatar installed"
        );
        self.slot = AvatarSlot::Ready { asset, scene, path };
    }

    fn update_phase(&mut self, motion: &MotionState) {
        let next = if motion.is_moving {
            ScenePhase::Moving
        } else {
            ScenePhase::Idle
        };
        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, speed = motion.speed, "phase change");
            self.phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questwalk_assets::{AssetError, LoadedModel};
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn placeholder_scene() -> SceneOrchestrator {
        SceneOrchestrator::with_resolver(
            SceneConfig::default(),
            AvatarResolver::immediate(Err(AssetError::UnsupportedUrl("none".into()))),
        )
    }

    #[test]
    fn mounts_ready_with_placeholder() {
        let s = placeholder_scene();
        assert!(s.is_avatar_ready());
        assert_eq!(s.path_kind(), Some(PathKind::Procedural));
        assert_eq!(s.phase(), ScenePhase::Idle);
    }

    #[test]
    fn callback_fires_once_per_frame() {
        let mut s = placeholder_scene();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.set_on_movement(move |p| sink.borrow_mut().push(p));
        s.on_key_down("w");
        for _ in 0..5 {
            s.frame(DT);
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 5);
        assert!(seen[4][2] < seen[0][2]);
        assert_eq!(seen[4], s.motion().position.to_array());
    }

    #[test]
    fn phase_follows_motion() {
        let mut s = placeholder_scene();
        s.on_key_down("w");
        for _ in 0..10 {
            s.frame(DT);
        }
        assert_eq!(s.phase(), ScenePhase::Moving);
        s.on_key_up("w");
        for _ in 0..60 {
            s.frame(DT);
        }
        assert_eq!(s.phase(), ScenePhase::Idle);
    }

    #[test]
    fn teardown_stops_frames_and_callbacks() {
        let mut s = placeholder_scene();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        s.set_on_movement(move |_| *sink.borrow_mut() += 1);
        s.frame(DT);
        s.teardown();
        assert!(!s.is_running());
        assert!(s.frame(DT).is_none());
        s.on_key_down("w");
        assert_eq!(s.input(), InputState::default());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn play_replays_deterministically() {
        let recording =
            InputRecording::from_script("forward:30,forward+right+run:30,none:30", DT).unwrap();
        let mut a = placeholder_scene();
        let mut b = placeholder_scene();
        let ra = a.play(&recording).unwrap();
        let rb = b.play(&recording).unwrap();
        assert_eq!(ra.frame, 90);
        assert_eq!(ra.motion, rb.motion);
    }

    #[test]
    fn rigged_model_reports_selection() {
        let model = LoadedModel {
            scene: SceneGraph::new("rig"),
            clips: vec![questwalk_assets::AnimationClip {
                name: "Idle".into(),
                duration: 1.0,
            }],
            source: questwalk_assets::AssetId(1),
        };
        let mut s =
            SceneOrchestrator::with_resolver(SceneConfig::default(), AvatarResolver::immediate(Ok(model)));
        let report = s.frame(DT).unwrap();
        assert_eq!(report.path, Some(PathKind::Rigged));
        assert_eq!(
            report.selection.unwrap().active_clip.as_deref(),
            Some("Idle")
        );
    }

    #[test]
    fn hud_reports_running() {
        let mut s = placeholder_scene();
        s.on_key_down("w");
        s.on_key_down("Shift");
        s.frame(DT);
        assert_eq!(s.hud().status, crate::hud::MovementStatus::Running);
    }
}
