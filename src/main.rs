//! Quad batching demo
//!
//! Bouncing, spinning sprites, a nine-slice panel that changes size every
//! frame and a text label, all drawn through quadbatch on wgpu.

use glam::Vec2;
use image::{Rgba, RgbaImage};
use quadbatch::{
    mocha, BatchConfig, Color, GpuContext, NineSliceBatch, NineSliceSprite, Rect, Sprite,
    SpriteBatch, Texture, Transform2D,
};
use quadbatch_text::cosmic::CosmicRasterizer;
use quadbatch_text::{AtlasConfig, GlyphAtlas, GlyphAtlasBuilder, LayoutOptions, CHARSET_ASCII};
use quadbatch_wgpu::WgpuBackend;
use rand::Rng;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const SPRITE_COUNT: usize = 3000;
const TILE_SIZE: u32 = 32;
const PANEL_SIZE: u32 = 48;
const PANEL_BORDER: f32 = 12.0;
const FONT_PX: f32 = 22.0;
const STATS_INTERVAL: u64 = 240;

const TINTS: [Color; 5] = [
    mocha::ROSEWATER,
    mocha::MAUVE,
    mocha::PEACH,
    mocha::GREEN,
    mocha::SKY,
];

/// Two white tiles side by side, a disc and a diamond, so the tint colors them.
fn sprite_sheet() -> RgbaImage {
    let half = TILE_SIZE as f32 / 2.0;

    RgbaImage::from_fn(TILE_SIZE * 2, TILE_SIZE, |x, y| {
        let local = Vec2::new((x % TILE_SIZE) as f32 + 0.5, y as f32 + 0.5) - half;
        let distance = if x < TILE_SIZE {
            local.length()
        } else {
            local.x.abs() + local.y.abs()
        };

        // One pixel of anti-aliasing at the edge, alpha premultiplied.
        let coverage = (half - distance).clamp(0.0, 1.0);
        let value = (coverage * 255.0).round() as u8;
        Rgba([value, value, value, value])
    })
}

/// A framed panel: bright rim, darker translucent body. Premultiplied alpha.
fn panel_texture() -> RgbaImage {
    let rim = 3;
    let last = PANEL_SIZE - 1;

    RgbaImage::from_fn(PANEL_SIZE, PANEL_SIZE, |x, y| {
        let edge = x.min(y).min(last - x).min(last - y);
        match edge {
            0 => Rgba([0, 0, 0, 0]),
            e if e <= rim => Rgba([230, 230, 240, 255]),
            _ => Rgba([64, 64, 80, 216]),
        }
    })
}

struct Bouncer {
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
    spin: f32,
    tile: usize,
    color: Color,
}

fn spawn_bouncers(bounds: Vec2) -> Vec<Bouncer> {
    let mut rng = rand::rng();

    (0..SPRITE_COUNT)
        .map(|_| {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = rng.random_range(40.0..220.0);
            Bouncer {
                position: Vec2::new(
                    rng.random::<f32>() * bounds.x,
                    rng.random::<f32>() * bounds.y,
                ),
                velocity: Vec2::from_angle(angle) * speed,
                rotation: rng.random::<f32>() * 360.0,
                spin: rng.random_range(-180.0..180.0),
                tile: rng.random_range(0..2),
                color: TINTS[rng.random_range(0..TINTS.len())].with_alpha(0.9),
            }
        })
        .collect()
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,

    ctx: GpuContext<WgpuBackend>,
    sprites: SpriteBatch<WgpuBackend>,
    panels: NineSliceBatch<WgpuBackend>,

    tiles: [Sprite; 2],
    panel: NineSliceSprite,
    font: Option<GlyphAtlas>,
    bouncers: Vec<Bouncer>,

    start: Instant,
    last_frame: Instant,
    frame_times: VecDeque<f32>,
    frame_count: u64,
}

impl GpuState {
    async fn new(window: Arc<Window>) -> Result<Self, Box<dyn Error>> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        // Tints and textures are blended as stored, so skip the sRGB encode.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let ctx = GpuContext::new(WgpuBackend::new(&device, &queue, surface_format));

        let batch_config =
            BatchConfig::default().with_viewport(config.width as f32, config.height as f32);
        let sprites = SpriteBatch::new(ctx.clone(), &batch_config)?;
        let panels = NineSliceBatch::new(ctx.clone(), &batch_config)?;
        log::info!("✓ Batches initialized ({} quads each)", batch_config.capacity);

        let sheet = sprite_sheet();
        let sheet = Texture::upload(&ctx, sheet.width(), sheet.height(), sheet.as_raw())?;
        let tile = TILE_SIZE as f32;
        let tiles = [
            sheet.sprite(Rect::from_xywh(0.0, 0.0, tile, tile)),
            sheet.sprite(Rect::from_xywh(tile, 0.0, tile, tile)),
        ];

        let panel = panel_texture();
        let panel = Texture::upload(&ctx, panel.width(), panel.height(), panel.as_raw())?;
        let panel = NineSliceSprite::new(Sprite::full(panel), Vec2::splat(PANEL_BORDER))?;

        let mut rasterizer = CosmicRasterizer::with_system_fonts(FONT_PX);
        let font = match GlyphAtlasBuilder::new(AtlasConfig::default()).build(
            &ctx,
            &mut rasterizer,
            CHARSET_ASCII,
        ) {
            Ok(atlas) => {
                log::info!("✓ Font atlas built ({} glyphs)", atlas.glyphs().len());
                Some(atlas)
            }
            Err(err) => {
                log::warn!("Font atlas unavailable, text disabled: {err}");
                None
            }
        };

        let bounds = Vec2::new(config.width as f32, config.height as f32);
        let now = Instant::now();

        Ok(Self {
            surface,
            device,
            config,
            ctx,
            sprites,
            panels,
            tiles,
            panel,
            font,
            bouncers: spawn_bouncers(bounds),
            start: now,
            last_frame: now,
            frame_times: VecDeque::with_capacity(120),
            frame_count: 0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        let (width, height) = (new_size.width as f32, new_size.height as f32);
        self.sprites.set_viewport(width, height);
        self.panels.set_viewport(width, height);
    }

    fn update(&mut self, dt: f32) {
        let bounds = Vec2::new(self.config.width as f32, self.config.height as f32);

        for bouncer in &mut self.bouncers {
            bouncer.position += bouncer.velocity * dt;
            bouncer.rotation = (bouncer.rotation + bouncer.spin * dt) % 360.0;

            if bouncer.position.x < 0.0 || bouncer.position.x > bounds.x {
                bouncer.velocity.x = -bouncer.velocity.x;
            }
            if bouncer.position.y < 0.0 || bouncer.position.y > bounds.y {
                bouncer.velocity.y = -bouncer.velocity.y;
            }
            bouncer.position = bouncer.position.clamp(Vec2::ZERO, bounds);
        }
    }

    fn render(&mut self) -> Result<f32, wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.frame_times.len() == 120 {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt);
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = if avg_frame_time > 0.0 {
            1.0 / avg_frame_time
        } else {
            0.0
        };

        // Clamp so a stalled frame does not launch everything off screen.
        self.update(dt.min(0.1));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ctx.with(|gpu| {
            gpu.begin_frame(view);
            gpu.clear(mocha::CRUST);
        });

        // Sprites
        self.sprites.begin();
        let center = Vec2::splat(0.5);
        for bouncer in &self.bouncers {
            let transform = Transform2D::new(bouncer.position, bouncer.rotation, Vec2::ONE);
            self.sprites
                .draw_color(&self.tiles[bouncer.tile], center, &transform, bouncer.color);
        }
        self.sprites.end();
        let sprite_stats = self.sprites.stats();

        // Panel, resized every frame
        let t = self.start.elapsed().as_secs_f32();
        let panel_size = Vec2::new(280.0 + 80.0 * t.sin(), 72.0 + 24.0 * (t * 1.3).cos());
        let panel_rect = Rect::from_min_size([16.0, 16.0], panel_size.into());

        self.panels.begin();
        self.panels.set_sprite(&self.panel);
        self.panels.draw(panel_rect, Color::WHITE);
        let corner = self.panels.ui_size() - Vec2::new(96.0, 96.0);
        self.panels.draw(
            Rect::from_min_size(corner.into(), [80.0, 80.0]),
            mocha::MAUVE,
        );
        self.panels.end();
        let panel_stats = self.panels.stats();

        // Label
        if let Some(font) = &self.font {
            let message = format!("{SPRITE_COUNT} sprites  {fps:.0} fps");
            let layout = font.layout(&message, &LayoutOptions::default());
            let baseline = Vec2::new(
                panel_rect.x() + 16.0,
                panel_rect.y() + 16.0 + layout.line_height,
            );

            self.sprites.begin();
            layout.draw_sprites(&mut self.sprites, baseline, 1.0, mocha::TEXT);
            self.sprites.end();
        }

        self.ctx.with(|gpu| gpu.end_frame());
        output.present();

        self.frame_count += 1;
        if self.frame_count % STATS_INTERVAL == 0 {
            log::debug!(
                "sprites: {} draw calls / {} quads, panels: {} draw calls / {} quads, {:.2}ms",
                sprite_stats.draw_calls,
                sprite_stats.quads,
                panel_stats.draw_calls,
                panel_stats.quads,
                avg_frame_time * 1000.0
            );
        }

        Ok(fps)
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Quad Batching")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone())) {
            Ok(gpu_state) => {
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
            }
            Err(err) => {
                log::error!("Failed to initialize rendering: {err}");
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
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    match gpu_state.render() {
                        Ok(fps) => {
                            window.set_title(&format!(
                                "Quad Batching - {:.0} FPS - {} sprites",
                                fps, SPRITE_COUNT
                            ));
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(window.inner_size())
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::warn!("Render error: {e:?}"),
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger (RUST_LOG=debug for batch statistics)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting quad batching demo...");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        gpu_state: None,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}
