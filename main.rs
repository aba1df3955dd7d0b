//! main.rs - Desktop simulator for the particle field
//! Handles the window, frame loop, pointer/resize events and CLI options

use anyhow::Result;
use clap::Parser;
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Triangle},
};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use std::thread;
use std::time::{Duration, Instant};

use particle_field::{
    EmberField, EmberSettings, FieldSettings, ParticleField, Point as FieldPoint, Rgb,
    Surface,
};

const TITLE: &str = "Particle Field";
const MAX_PARTICLES: usize = 256;
const MAX_EMBERS: usize = 128;
const TARGET_FPS: u32 = 60;

#[derive(Parser, Debug)]
#[command(name = "particle-field", version, about = "Ambient particle field simulator")]
struct Cli {
    /// Target number of particles (halved below 768 px width)
    #[arg(long, default_value_t = 50)]
    count: usize,

    /// Comma-separated palette, e.g. "#6366f1,#8b5cf6"
    #[arg(long, value_delimiter = ',', value_parser = Rgb::from_hex, default_values = ["#6366f1", "#8b5cf6"])]
    colors: Vec<Rgb>,

    /// Scales the random initial velocity
    #[arg(long, default_value_t = 0.5)]
    max_speed: f32,

    /// Disable pointer repulsion
    #[arg(long = "static")]
    no_interactive: bool,

    /// Disable sparks, rising embers and debris
    #[arg(long)]
    no_embers: bool,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Window pixel scale
    #[arg(long, default_value_t = 1)]
    scale: u32,

    /// RNG seed for reproducible fields
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn field_settings(&self) -> Result<FieldSettings> {
        let mut settings = FieldSettings {
            particle_count: self.count,
            max_speed: self.max_speed,
            interactive: !self.no_interactive,
            ..FieldSettings::default()
        }
        .with_colors(&self.colors)?;
        if let Some(seed) = self.seed {
            settings.rng_seed = seed;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn ember_settings(&self) -> EmberSettings {
        let mut settings = EmberSettings::default();
        if let Some(seed) = self.seed {
            settings.rng_seed = seed.rotate_left(17);
        }
        settings
    }
}

// Alpha is emulated by blending against the fixed background colour.
struct SimulatorSurface {
    display: SimulatorDisplay<Rgb888>,
    background: Rgb,
}

impl SimulatorSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            display: SimulatorDisplay::new(Size::new(width, height)),
            background: Rgb::new(10, 10, 20),
        }
    }

    fn shade(&self, color: Rgb, alpha: f32) -> Rgb888 {
        let c = color.blend_over(self.background, alpha);
        Rgb888::new(c.r, c.g, c.b)
    }
}

fn to_display(p: FieldPoint) -> Point {
    Point::new(p.x.round() as i32, p.y.round() as i32)
}

impl Surface for SimulatorSurface {
    fn size(&self) -> (u32, u32) {
        let size = self.display.size();
        (size.width, size.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.display = SimulatorDisplay::new(Size::new(width, height));
    }

    fn clear(&mut self) {
        let bg = self.background;
        let _ = self.display.clear(Rgb888::new(bg.r, bg.g, bg.b));
    }

    fn fill_disc(&mut self, center: FieldPoint, radius: f32, color: Rgb, alpha: f32) {
        let diameter = (radius * 2.0).round().max(1.0) as u32;
        let fill = self.shade(color, alpha);
        let _ = Circle::with_center(to_display(center), diameter)
            .into_styled(PrimitiveStyle::with_fill(fill))
            .draw(&mut self.display);
    }

    fn stroke_line(&mut self, from: FieldPoint, to: FieldPoint, width: f32, color: Rgb, alpha: f32) {
        let stroke = self.shade(color, alpha);
        let width = width.round().max(1.0) as u32;
        let _ = Line::new(to_display(from), to_display(to))
            .into_styled(PrimitiveStyle::with_stroke(stroke, width))
            .draw(&mut self.display);
    }

    fn fill_triangle(&mut self, corners: [FieldPoint; 3], color: Rgb, alpha: f32) {
        let fill = self.shade(color, alpha);
        let [a, b, c] = corners.map(to_display);
        let _ = Triangle::new(a, b, c)
            .into_styled(PrimitiveStyle::with_fill(fill))
            .draw(&mut self.display);
    }
}

fn scaled(size: (u32, u32), factor: f32) -> (u32, u32) {
    let w = ((size.0 as f32 * factor) as u32).max(64);
    let h = ((size.1 as f32 * factor) as u32).max(64);
    (w, h)
}

fn verbosity_filter(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // -v replaces the default level, per-module RUST_LOG directives still apply
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose > 0 {
        logger.filter_level(verbosity_filter(cli.verbose));
    }
    logger.init();

    let settings = cli.field_settings()?;
    let mut field: ParticleField<SimulatorSurface, MAX_PARTICLES> =
        ParticleField::mount(settings, Some(SimulatorSurface::new(cli.width, cli.height)))?;
    let mut embers: EmberField<MAX_EMBERS> =
        EmberField::new(cli.ember_settings(), cli.width, cli.height)?;
    let mut embers_on = !cli.no_embers;

    let output_settings = OutputSettingsBuilder::new().scale(cli.scale).build();
    let mut window = Window::new(TITLE, &output_settings);

    let frame_duration = Duration::from_secs_f32(1.0 / TARGET_FPS as f32);
    let mut next_frame = field.request_frame();

    println!("=== Particle Field ===");
    println!("Controls:");
    println!("  R: Regenerate particles");
    println!("  I: Toggle pointer repulsion");
    println!("  E: Toggle embers");
    println!("  +/-: Resize surface");
    println!("  Q: Quit");

    'main_loop: loop {
        let now = Instant::now();

        let Some(token) = next_frame else {
            log::warn!("frame loop stopped, no surface to draw on");
            break;
        };
        next_frame = field.run_frame(token);

        if embers_on {
            embers.update();
            if let Some(surface) = field.surface_mut() {
                embers.draw(surface);
            }
        }

        if let Some(surface) = field.surface() {
            window.update(&surface.display);
        }

        let events: Vec<SimulatorEvent> = window.events().collect();
        for event in events {
            match event {
                SimulatorEvent::Quit => break 'main_loop,
                SimulatorEvent::MouseMove { point } => {
                    field.on_pointer_move(point.x as f32, point.y as f32);
                    if embers_on {
                        embers.on_pointer_move(point.x as f32, point.y as f32);
                    }
                }
                SimulatorEvent::KeyDown { keycode, .. } => {
                    let key = format!("{:?}", keycode).to_lowercase();
                    match key.as_str() {
                        "r" => {
                            if let Some((w, h)) = field.surface().map(|s| s.size()) {
                                field.initialize(w, h);
                            }
                        }
                        "i" => {
                            let mut updated = field.settings().clone();
                            updated.interactive = !updated.interactive;
                            println!("Pointer repulsion: {}", if updated.interactive { "ON" } else { "OFF" });
                            field.update_settings(updated)?;
                        }
                        "e" => {
                            embers_on = !embers_on;
                            println!("Embers: {}", if embers_on { "ON" } else { "OFF" });
                        }
                        "equals" | "plus" | "kpplus" | "minus" | "kpminus" => {
                            let factor = if key.ends_with("minus") { 0.9 } else { 1.1 };
                            let Some(current) = field.surface().map(|s| s.size()) else {
                                continue;
                            };
                            let (w, h) = scaled(current, factor);

                            // Stale frame is cancelled, the loop resumes on the new token
                            next_frame = field.on_resize(w, h);
                            embers.resize(w, h);
                            window = Window::new(TITLE, &output_settings);
                            log::info!("surface resized to {}x{}", w, h);
                        }
                        "q" => break 'main_loop,
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // Frame rate limiting
        let elapsed = now.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
    }

    embers.dispose();
    let _ = field.dispose();
    println!("Bye.");
    Ok(())
}
