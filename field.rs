//! Ambient particle field: a fixed pool of drifting discs that bounce off the
//! surface edges, shy away from the pointer and link up with faint lines when
//! close to each other.

use heapless::Vec;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::error::Result;
use crate::settings::FieldSettings;
use crate::surface::{Point, Surface};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Disc radius in pixels.
    pub size: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub color: Rgb,
    pub alpha: f32,
}

impl Particle {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn speed(&self) -> f32 {
        libm::sqrtf(self.speed_x * self.speed_x + self.speed_y * self.speed_y)
    }

    // Advance one frame and bounce off the edges. Velocity only flips while
    // it still points outward, so a particle left outside never jitters.
    fn step(&mut self, width: f32, height: f32) {
        self.x += self.speed_x;
        self.y += self.speed_y;

        if (self.x > width && self.speed_x > 0.0) || (self.x < 0.0 && self.speed_x < 0.0) {
            self.speed_x = -self.speed_x;
        }
        if (self.y > height && self.speed_y > 0.0) || (self.y < 0.0 && self.speed_y < 0.0) {
            self.speed_y = -self.speed_y;
        }
    }
}

/// Handle for one requested animation frame. Only the most recently issued
/// token is honoured by [`ParticleField::run_frame`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameToken(u32);

/// Force pushing a particle at `at` away from `pointer`, or `None` outside
/// `radius`. Magnitude is `(radius - d) / radius`.
pub fn repulsion_force(pointer: Point, at: Point, radius: f32) -> Option<(f32, f32)> {
    let dx = at.x - pointer.x;
    let dy = at.y - pointer.y;
    let distance = libm::sqrtf(dx * dx + dy * dy);

    // No defined direction when sitting exactly on the pointer.
    if distance >= radius || distance <= f32::EPSILON {
        return None;
    }

    let force = (radius - distance) / radius;
    Some((dx / distance * force, dy / distance * force))
}

/// Opacity of the connective line between two particles `distance` apart,
/// or `None` when they are too far apart to be linked.
pub fn line_opacity(distance: f32, settings: &FieldSettings) -> Option<f32> {
    if distance >= settings.link_distance {
        return None;
    }
    Some((settings.link_distance - distance) / settings.link_distance * settings.link_opacity)
}

/// Particle field renderer.
///
/// `MAX` is the pool capacity; a configured count above it is clamped.
/// Without a surface every operation is a no-op.
pub struct ParticleField<S: Surface, const MAX: usize> {
    pool: Vec<Particle, MAX>,
    surface: Option<S>,
    pointer: Option<Point>,
    width: f32,
    height: f32,

    // Frame scheduling
    pending_frame: Option<FrameToken>,
    next_token: u32,
    disposed: bool,

    rng: SmallRng,
    settings: FieldSettings,
}

impl<S: Surface, const MAX: usize> ParticleField<S, MAX> {
    pub fn new(settings: FieldSettings, surface: Option<S>) -> Result<Self> {
        settings.validate()?;

        if surface.is_none() {
            log::debug!("particle field created without a surface, rendering disabled");
        }

        Ok(Self {
            pool: Vec::new(),
            surface,
            pointer: None,
            width: 0.0,
            height: 0.0,
            pending_frame: None,
            next_token: 0,
            disposed: false,
            rng: SmallRng::seed_from_u64(settings.rng_seed),
            settings,
        })
    }

    /// Creates the field on `surface` and fills it at the surface's size.
    pub fn mount(settings: FieldSettings, surface: Option<S>) -> Result<Self> {
        let mut field = Self::new(settings, surface)?;
        if let Some((width, height)) = field.surface.as_ref().map(|s| s.size()) {
            field.initialize(width, height);
        }
        Ok(field)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.pool
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn is_live(&self) -> bool {
        !self.disposed && self.surface.is_some()
    }

    /// Applies new settings. Pool-shaping values take effect on the next
    /// `initialize`; interactivity and line styling apply immediately.
    pub fn update_settings(&mut self, settings: FieldSettings) -> Result<()> {
        settings.validate()?;
        if !settings.interactive {
            self.pointer = None;
        }
        self.settings = settings;
        Ok(())
    }

    /// Replaces the whole pool with freshly randomized particles.
    pub fn initialize(&mut self, width: u32, height: u32) {
        if !self.is_live() {
            return;
        }

        let requested = self.settings.effective_count(width);
        let count = requested.min(MAX);
        if count < requested {
            log::warn!("particle count {} exceeds pool capacity {}, clamping", requested, MAX);
        }

        let (w, h) = (width as f32, height as f32);
        let max_speed = self.settings.max_speed;

        // Built aside and swapped in, so the pool is never half-filled.
        let mut pool: Vec<Particle, MAX> = Vec::new();
        for _ in 0..count {
            let size = self.rng.random::<f32>() * 3.0 + 1.0;
            let x = self.rng.random::<f32>() * w;
            let y = self.rng.random::<f32>() * h;
            let direction_x = self.rng.random::<f32>() * 0.2 - 0.1;
            let direction_y = self.rng.random::<f32>() * 0.2 - 0.1;
            let color = self
                .settings
                .particle_colors
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Rgb::INDIGO);
            let alpha = self.rng.random::<f32>() * 0.5 + 0.1;

            let _ = pool.push(Particle {
                x,
                y,
                size,
                speed_x: direction_x * max_speed,
                speed_y: direction_y * max_speed,
                color,
                alpha,
            });
        }

        self.pool = pool;
        self.width = w;
        self.height = h;
        log::debug!("particle pool regenerated: {} particles on {}x{}", count, width, height);
    }

    /// Resizes the surface and regenerates the pool. Any outstanding frame
    /// is cancelled; if the loop was running a fresh token is returned.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Option<FrameToken> {
        if !self.is_live() {
            return None;
        }

        let was_running = self.pending_frame.take().is_some();
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(width, height);
        }
        self.initialize(width, height);

        if was_running {
            self.request_frame()
        } else {
            None
        }
    }

    /// Latest pointer position wins.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.disposed || !self.settings.interactive {
            return;
        }
        self.pointer = Some(Point::new(x, y));
    }

    pub fn request_frame(&mut self) -> Option<FrameToken> {
        if !self.is_live() {
            return None;
        }
        self.next_token = self.next_token.wrapping_add(1);
        let token = FrameToken(self.next_token);
        self.pending_frame = Some(token);
        Some(token)
    }

    pub fn cancel_frame(&mut self) {
        self.pending_frame = None;
    }

    /// Runs the frame for `token` and schedules the next one. Stale or
    /// cancelled tokens draw nothing and end that chain.
    pub fn run_frame(&mut self, token: FrameToken) -> Option<FrameToken> {
        if self.pending_frame != Some(token) {
            log::trace!("dropping stale frame {:?}", token);
            return None;
        }
        self.pending_frame = None;
        self.tick();
        self.request_frame()
    }

    /// Advances and draws one frame.
    pub fn tick(&mut self) {
        if self.disposed {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let settings = &self.settings;
        let (width, height) = (self.width, self.height);
        let pointer = if settings.interactive { self.pointer } else { None };

        surface.clear();

        for i in 0..self.pool.len() {
            let particle = &mut self.pool[i];
            particle.step(width, height);

            if let Some(pointer) = pointer {
                if let Some((fx, fy)) =
                    repulsion_force(pointer, particle.position(), settings.pointer_radius)
                {
                    let margin = particle.size;
                    particle.x = (particle.x + fx * settings.repulsion_strength)
                        .clamp(-margin, width + margin);
                    particle.y = (particle.y + fy * settings.repulsion_strength)
                        .clamp(-margin, height + margin);
                }
            }

            let particle = self.pool[i];
            surface.fill_disc(particle.position(), particle.size, particle.color, particle.alpha);

            // Later particles have not moved yet this frame.
            for other in &self.pool[i + 1..] {
                let distance = particle.position().distance(other.position());
                if let Some(opacity) = line_opacity(distance, settings) {
                    surface.stroke_line(
                        particle.position(),
                        other.position(),
                        settings.link_width,
                        settings.link_color,
                        opacity,
                    );
                }
            }
        }
    }

    /// Stops the loop and detaches surface and pointer. The surface is handed
    /// back; the field ignores every later call.
    pub fn dispose(&mut self) -> Option<S> {
        self.pending_frame = None;
        self.pointer = None;
        self.disposed = true;
        self.pool.clear();
        log::debug!("particle field disposed");
        self.surface.take()
    }
}
