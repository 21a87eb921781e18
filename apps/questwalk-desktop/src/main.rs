mod keys;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use questwalk_assets::GltfLoader;
use questwalk_input::InputState;
use questwalk_motion::SmoothingMode;
use questwalk_render_wgpu::{RenderFrame, WgpuRenderer, avatar_blocks};
use questwalk_scene::{FrameReport, SceneConfig, SceneOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "questwalk-desktop", about = "Walk the training avatar around")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Avatar model to load (.gltf or .glb); overrides the config file
    #[arg(long)]
    avatar: Option<String>,

    /// Scale smoothing by frame duration instead of applying it once per frame
    #[arg(long)]
    frame_rate_independent: bool,
}

impl Cli {
    fn scene_config(&self) -> Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("loading scene config {}", path.display()))?,
            None => SceneConfig::default(),
        };
        if let Some(url) = &self.avatar {
            config.avatar_url = Some(url.clone());
        }
        if self.frame_rate_independent {
            config.motion.smoothing = SmoothingMode::FrameRateIndependent;
        }
        Ok(config)
    }
}

/// Window, device and everything drawn into them.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Questwalk")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no GPU adapter compatible with the window surface"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("questwalk_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no texture formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, format, config.width, config.height);
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            "GPU initialized"
        );
        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer.resize(self.config.width, self.config.height);
    }

    /// Draw the avatar view (at reduced resolution while degraded), then the
    /// HUD on top at full resolution.
    fn draw(
        &mut self,
        egui_ctx: &EguiContext,
        scene: &SceneOrchestrator,
        report: Option<&FrameReport>,
        show_hud: bool,
    ) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let blocks = avatar_blocks(scene.avatar_scene(), scene.avatar_world());
        let degraded = report.is_some_and(|r| r.degraded);
        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &RenderFrame {
                view_proj: scene.camera().view_projection(),
                eye: scene.camera().state().position,
                avatar: scene.motion().position,
                time: scene.elapsed(),
                blocks: &blocks,
                draw_ground: !degraded,
                render_scale: report.map_or(1.0, |r| r.render_scale),
            },
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            if show_hud {
                draw_hud(ctx, scene, report);
            }
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("hud_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hud_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer.render(&mut pass, &paint_jobs, &screen);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

fn draw_hud(ctx: &EguiContext, scene: &SceneOrchestrator, report: Option<&FrameReport>) {
    egui::Window::new("Trainee")
        .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.monospace(scene.hud().to_string());
            ui.separator();
            match scene.path_kind() {
                Some(kind) => ui.label(format!("Animation: {kind:?}")),
                None => ui.label("Avatar loading..."),
            };
            if let Some(clip) = report
                .and_then(|r| r.selection.as_ref())
                .and_then(|s| s.active_clip.as_deref())
            {
                ui.label(format!("Clip: {clip}"));
            }
            if let Some(r) = report {
                if r.degraded {
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("Scrolling: reduced detail ({:.0}%)", r.render_scale * 100.0),
                    );
                }
            }
            ui.separator();
            ui.small("WASD / arrows: move | Shift: run | F1: toggle HUD");
        });
}

struct GpuApp {
    scene: SceneOrchestrator,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    last_frame: Instant,
    last_report: Option<FrameReport>,
    show_hud: bool,
    init_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: SceneConfig) -> Self {
        let scene = SceneOrchestrator::new(config, Arc::new(GltfLoader::new()));
        Self {
            scene,
            gpu: None,
            egui_ctx: EguiContext::default(),
            last_frame: Instant::now(),
            last_report: None,
            show_hud: true,
            init_error: None,
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed && code == KeyCode::F1 {
            self.show_hud = !self.show_hud;
            return;
        }
        let Some(name) = keys::key_name(code) else {
            return;
        };
        if pressed {
            self.scene.on_key_down(name);
        } else {
            self.scene.on_key_up(name);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                self.scene.camera_mut().set_aspect(gpu.aspect());
                self.last_frame = Instant::now();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let consumed = gpu.egui_winit.on_window_event(&gpu.window, &event).consumed;
        if consumed && !matches!(event, WindowEvent::KeyboardInput { .. }) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.scene.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size);
                let aspect = gpu.aspect();
                self.scene.camera_mut().set_aspect(aspect);
            }
            WindowEvent::Focused(false) => {
                // Key-up events are lost while unfocused.
                self.scene.set_input_state(InputState::default());
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                if keys::forward_to_scene(consumed, pressed) {
                    self.handle_key(code, pressed);
                }
            }
            WindowEvent::MouseWheel { .. } => {
                self.scene.on_scroll();
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32().min(0.1);
                self.last_frame = now;

                if let Some(report) = self.scene.frame(dt) {
                    self.last_report = Some(report);
                }
                gpu.draw(
                    &self.egui_ctx,
                    &self.scene,
                    self.last_report.as_ref(),
                    self.show_hud,
                );
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.scene_config()?;
    tracing::info!(avatar = ?config.avatar_url, "questwalk-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
