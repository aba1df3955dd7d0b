//! One-shot emitters that live next to the ambient field: a spark trail that
//! follows the pointer, bursts of embers and ash rising from the bottom edge,
//! and slowly spinning debris. Unlike the field, these particles fade, shrink
//! and retire on their own.

use core::f32::consts::PI;

use heapless::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;
use crate::error::Result;
use crate::settings::EmberSettings;
use crate::surface::{Point, Surface};

/// Upper bound on scheduled-but-not-yet-spawned embers and debris.
const MAX_PENDING: usize = 64;

// Rising particles retire once they drift this far past an edge.
const EDGE_MARGIN: f32 = 20.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmberKind {
    /// Pointer trail spark
    Spark,
    /// Glowing rising ember
    Ember,
    /// Dim rising ash
    Ash,
    /// Spinning square fleck
    Debris,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Burst {
    Embers,
    Debris,
}

#[derive(Copy, Clone, Debug)]
pub struct Ember {
    pub x: f32,
    pub y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    /// Diameter (side length for debris) in pixels.
    pub size: f32,
    pub opacity: f32,
    pub wobble_phase: f32,
    pub wobble_frequency: f32,
    pub wobble_amplitude: f32,
    /// Degrees
    pub rotation: f32,
    pub rotation_speed: f32,
    pub age: u32,
    pub kind: EmberKind,
    pub active: bool,
}

impl Default for Ember {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            speed_x: 0.0,
            speed_y: 0.0,
            size: 0.0,
            opacity: 0.0,
            wobble_phase: 0.0,
            wobble_frequency: 0.0,
            wobble_amplitude: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            age: 0,
            kind: EmberKind::Ash,
            active: false,
        }
    }
}

impl Ember {
    fn color(&self) -> (Rgb, f32) {
        match self.kind {
            EmberKind::Spark => (Rgb::ORANGE, self.opacity * 0.7),
            EmberKind::Ember => (Rgb::ORANGE, self.opacity),
            EmberKind::Ash => (Rgb::ASH, self.opacity * 0.2),
            EmberKind::Debris => (Rgb::GRAY, self.opacity * 0.1),
        }
    }

    // Corners of the rotated square, clockwise from top-left.
    fn square_corners(&self) -> [Point; 4] {
        let half = self.size / 2.0;
        let angle = self.rotation * PI / 180.0;
        let (sin, cos) = (libm::sinf(angle), libm::cosf(angle));
        let corner = |dx: f32, dy: f32| {
            Point::new(self.x + dx * cos - dy * sin, self.y + dx * sin + dy * cos)
        };
        [
            corner(-half, -half),
            corner(half, -half),
            corner(half, half),
            corner(-half, half),
        ]
    }
}

pub struct EmberField<const N: usize> {
    pub pool: [Ember; N],
    pub active: usize,

    // Frame numbers at which a scheduled spawn is due
    pending: Vec<(u32, Burst), MAX_PENDING>,
    frame: u32,
    spawned: u32,
    debris_spawned: u32,

    width: f32,
    height: f32,
    disposed: bool,

    rng: SmallRng,
    settings: EmberSettings,
}

impl<const N: usize> EmberField<N> {
    pub fn new(settings: EmberSettings, width: u32, height: u32) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            pool: [Ember::default(); N],
            active: 0,
            pending: Vec::new(),
            frame: 0,
            spawned: 0,
            debris_spawned: 0,
            width: width as f32,
            height: height as f32,
            disposed: false,
            rng: SmallRng::seed_from_u64(settings.rng_seed),
            settings,
        })
    }

    /// Embers and ash spawned since creation.
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn debris_spawned(&self) -> u32 {
        self.debris_spawned
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
    }

    fn free_slot(&self) -> Option<usize> {
        self.pool.iter().position(|e| !e.active)
    }

    /// Rolls for a spark at the pointer.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.disposed {
            return;
        }
        if self.rng.random::<f32>() < self.settings.spark_chance {
            self.emit_spark(x, y);
        }
    }

    /// Emits a spark at `(x, y)` unconditionally. Dropped when the pool is full.
    pub fn emit_spark(&mut self, x: f32, y: f32) {
        let Some(idx) = self.free_slot() else {
            return;
        };

        // Generate random values before mutating the slot
        let angle = self.rng.random::<f32>() * PI * 2.0;
        let speed = self.rng.random::<f32>() * 2.0 + 1.0;
        let size = self.rng.random::<f32>() * 2.0 + 1.0;

        self.pool[idx] = Ember {
            x,
            y,
            speed_x: libm::cosf(angle) * speed,
            speed_y: libm::sinf(angle) * speed,
            size,
            opacity: 1.0,
            kind: EmberKind::Spark,
            active: true,
            ..Ember::default()
        };
        self.active += 1;
    }

    fn emit_rising(&mut self) {
        let Some(idx) = self.free_slot() else {
            log::trace!("ember pool full, dropping spawn");
            return;
        };

        let size = self.rng.random::<f32>() * 3.0 + 1.0;
        let kind = if self.rng.random::<f32>() < self.settings.ember_chance {
            EmberKind::Ember
        } else {
            EmberKind::Ash
        };
        let x = self.rng.random::<f32>() * self.width;
        let opacity = self.rng.random::<f32>() * 0.5 + 0.2;
        let speed_x = (self.rng.random::<f32>() - 0.5) * 1.5;
        let speed_y = -(self.rng.random::<f32>() * 2.0 + 1.0);
        let wobble_phase = self.rng.random::<f32>() * PI * 2.0;
        let wobble_frequency = self.rng.random::<f32>() * 0.02 + 0.01;
        let wobble_amplitude = self.rng.random::<f32>() * 2.0 + 1.0;

        self.pool[idx] = Ember {
            x,
            y: self.height + 10.0,
            speed_x,
            speed_y,
            size,
            opacity,
            wobble_phase,
            wobble_frequency,
            wobble_amplitude,
            kind,
            active: true,
            ..Ember::default()
        };
        self.active += 1;
        self.spawned += 1;
    }

    fn emit_debris(&mut self) {
        let Some(idx) = self.free_slot() else {
            log::trace!("ember pool full, dropping debris");
            return;
        };

        let size = self.rng.random::<f32>() * 4.0 + 1.0;
        let x = self.rng.random::<f32>() * self.width;
        let opacity = self.rng.random::<f32>() * 0.3 + 0.1;
        let speed_x = self.rng.random::<f32>() - 0.5;
        let speed_y = -(self.rng.random::<f32>() * 1.5 + 0.5);
        let rotation_speed = (self.rng.random::<f32>() - 0.5) * 2.0;
        let rotation = self.rng.random::<f32>() * 360.0;

        self.pool[idx] = Ember {
            x,
            y: self.height + 5.0,
            speed_x,
            speed_y,
            size,
            opacity,
            rotation,
            rotation_speed,
            kind: EmberKind::Debris,
            active: true,
            ..Ember::default()
        };
        self.active += 1;
        self.debris_spawned += 1;
    }

    fn schedule(&mut self, burst: Burst) {
        let (count, stagger) = match burst {
            Burst::Embers => (self.settings.burst_size, self.settings.burst_stagger),
            Burst::Debris => (self.settings.debris_burst_size, self.settings.debris_stagger),
        };
        for _ in 0..count {
            let delay = (self.rng.random::<f32>() * stagger as f32) as u32;
            if self.pending.push((self.frame.wrapping_add(delay), burst)).is_err() {
                log::debug!("ember schedule full, {:?} burst truncated", burst);
                break;
            }
        }
    }

    // Due frames may sit on either side of a counter wrap.
    fn is_due(&self, at: u32) -> bool {
        (self.frame.wrapping_sub(at) as i32) >= 0
    }

    fn retire(&mut self, idx: usize) {
        self.pool[idx].active = false;
        self.active -= 1;
    }

    /// Advances every live particle by one frame, then spawns what is due.
    pub fn update(&mut self) {
        if self.disposed {
            return;
        }

        for i in 0..N {
            if !self.pool[i].active {
                continue;
            }

            let expired = {
                let e = &self.pool[i];
                let off_screen = e.y < -EDGE_MARGIN
                    || e.x < -EDGE_MARGIN
                    || e.x > self.width + EDGE_MARGIN;
                match e.kind {
                    // Fading ends a spark long before the lifetime cap does;
                    // the cap only guards sparks that somehow stop fading.
                    EmberKind::Spark => {
                        e.opacity <= 0.1 || e.size <= 0.2 || e.age > self.settings.spark_lifetime
                    }
                    EmberKind::Ember | EmberKind::Ash => {
                        off_screen || e.age > self.settings.ember_lifetime
                    }
                    EmberKind::Debris => off_screen || e.age > self.settings.debris_lifetime,
                }
            };
            if expired {
                self.retire(i);
                continue;
            }

            // Roll before borrowing the slot
            let pulse = if self.pool[i].kind == EmberKind::Ember && self.rng.random::<f32>() < 0.1 {
                Some(self.rng.random::<f32>() * 0.3 + 0.85)
            } else {
                None
            };

            let e = &mut self.pool[i];
            e.age += 1;
            match e.kind {
                EmberKind::Spark => {
                    e.size -= 0.05;
                    e.opacity -= 0.02;
                    e.x += e.speed_x;
                    // Sparks drift upward
                    e.y += e.speed_y - 1.0;
                }
                EmberKind::Ember | EmberKind::Ash => {
                    e.wobble_phase += e.wobble_frequency;
                    e.x += e.speed_x + libm::sinf(e.wobble_phase) * e.wobble_amplitude;
                    e.y += e.speed_y;
                    if let Some(factor) = pulse {
                        e.opacity = (e.opacity * factor).min(1.0);
                    }
                }
                EmberKind::Debris => {
                    e.x += e.speed_x;
                    e.y += e.speed_y;
                    e.rotation += e.rotation_speed;
                }
            }
        }

        if self.frame % self.settings.burst_interval == 0 {
            self.schedule(Burst::Embers);
        }
        if self.frame % self.settings.debris_interval == 0 {
            self.schedule(Burst::Debris);
        }

        let mut due: Vec<Burst, MAX_PENDING> = Vec::new();
        for &(at, burst) in self.pending.iter() {
            if self.is_due(at) {
                let _ = due.push(burst);
            }
        }
        let frame = self.frame;
        self.pending.retain(|&(at, _)| (frame.wrapping_sub(at) as i32) < 0);
        for burst in due {
            match burst {
                Burst::Embers => self.emit_rising(),
                Burst::Debris => self.emit_debris(),
            }
        }

        self.frame = self.frame.wrapping_add(1);
    }

    pub fn draw<S: Surface>(&self, surface: &mut S) {
        if self.disposed {
            return;
        }
        for e in self.pool.iter().filter(|e| e.active) {
            let (color, alpha) = e.color();
            match e.kind {
                EmberKind::Debris => {
                    let [a, b, c, d] = e.square_corners();
                    surface.fill_triangle([a, b, c], color, alpha);
                    surface.fill_triangle([a, c, d], color, alpha);
                }
                _ => surface.fill_disc(Point::new(e.x, e.y), e.size / 2.0, color, alpha),
            }
        }
    }

    pub fn dispose(&mut self) {
        for e in &mut self.pool {
            e.active = false;
        }
        self.active = 0;
        self.pending.clear();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;

    fn quiet() -> EmberSettings {
        // No periodic bursts within a test run
        EmberSettings { burst_size: 0, debris_burst_size: 0, ..EmberSettings::default() }
    }

    fn single_ember() -> EmberSettings {
        EmberSettings {
            burst_size: 1,
            burst_stagger: 0,
            burst_interval: 10_000,
            debris_burst_size: 0,
            ..EmberSettings::default()
        }
    }

    // Drops a motionless rising particle into the pool.
    fn place<const N: usize>(embers: &mut EmberField<N>, kind: EmberKind, x: f32, y: f32) {
        let idx = embers.free_slot().unwrap();
        embers.pool[idx] = Ember {
            x,
            y,
            size: 2.0,
            opacity: 0.5,
            kind,
            active: true,
            ..Ember::default()
        };
        embers.active += 1;
    }

    #[test]
    fn spark_fades_out() {
        let mut embers: EmberField<16> = EmberField::new(quiet(), 800, 600).unwrap();
        embers.emit_spark(100.0, 100.0);
        assert_eq!(embers.active, 1);

        embers.update();
        let spark = embers.pool.iter().find(|e| e.active).unwrap();
        assert!((spark.opacity - 0.98).abs() < 1e-6);
        assert_eq!(spark.kind, EmberKind::Spark);

        for _ in 0..60 {
            embers.update();
        }
        assert_eq!(embers.active, 0);
    }

    #[test]
    fn spark_lifetime_caps_age() {
        let settings = EmberSettings { spark_lifetime: 3, ..quiet() };
        let mut embers: EmberField<4> = EmberField::new(settings, 800, 600).unwrap();
        embers.emit_spark(400.0, 300.0);

        for _ in 0..4 {
            embers.update();
        }
        // Still bright and large, only the age check applies
        assert_eq!(embers.active, 1);

        embers.update();
        assert_eq!(embers.active, 0);
    }

    #[test]
    fn pointer_spark_chance_bounds() {
        let never = EmberSettings { spark_chance: 0.0, ..quiet() };
        let mut embers: EmberField<16> = EmberField::new(never, 800, 600).unwrap();
        for _ in 0..100 {
            embers.on_pointer_move(10.0, 10.0);
        }
        assert_eq!(embers.active, 0);

        let always = EmberSettings { spark_chance: 1.0, ..quiet() };
        let mut embers: EmberField<16> = EmberField::new(always, 800, 600).unwrap();
        for _ in 0..5 {
            embers.on_pointer_move(10.0, 10.0);
        }
        assert_eq!(embers.active, 5);
    }

    #[test]
    fn burst_spawns_over_stagger_window() {
        let settings = EmberSettings {
            burst_interval: 1000,
            debris_burst_size: 0,
            ..EmberSettings::default()
        };
        let mut embers: EmberField<64> = EmberField::new(settings, 800, 600).unwrap();

        embers.update();
        assert_eq!(embers.spawned() as usize + embers.pending(), 20);

        for _ in 0..settings.burst_stagger {
            embers.update();
        }
        assert_eq!(embers.spawned(), 20);
        assert_eq!(embers.pending(), 0);
    }

    #[test]
    fn full_pool_drops_spawns() {
        let settings = EmberSettings { burst_stagger: 0, ..EmberSettings::default() };
        let mut embers: EmberField<4> = EmberField::new(settings, 800, 600).unwrap();
        embers.update();
        assert_eq!(embers.active, 4);
        assert_eq!(embers.spawned(), 4);
        embers.emit_spark(1.0, 1.0);
        assert_eq!(embers.active, 4);
    }

    #[test]
    fn rising_ember_retires_past_top() {
        let mut embers: EmberField<4> = EmberField::new(single_ember(), 800, 0).unwrap();
        embers.update();
        assert_eq!(embers.active, 1);
        let e = embers.pool.iter().find(|e| e.active).unwrap();
        assert_eq!(e.y, 10.0);
        assert!(e.speed_y <= -1.0);

        for _ in 0..60 {
            embers.update();
        }
        assert_eq!(embers.active, 0);
    }

    #[test]
    fn rising_particles_retire_past_side_margins() {
        let mut embers: EmberField<4> = EmberField::new(quiet(), 800, 10_000).unwrap();
        place(&mut embers, EmberKind::Ash, -19.0, 5000.0);
        place(&mut embers, EmberKind::Ash, 819.0, 5000.0);
        embers.pool[0].speed_x = -2.0;
        embers.pool[1].speed_x = 2.0;

        embers.update();
        assert_eq!(embers.active, 2);
        assert_eq!(embers.pool[0].x, -21.0);
        assert_eq!(embers.pool[1].x, 821.0);

        embers.update();
        assert_eq!(embers.active, 0);
    }

    #[test]
    fn ember_lifetime_caps_age() {
        let mut embers: EmberField<4> = EmberField::new(quiet(), 800, 10_000).unwrap();
        place(&mut embers, EmberKind::Ash, 400.0, 5000.0);
        embers.pool[0].speed_y = -1.0;

        for _ in 0..601 {
            embers.update();
        }
        assert_eq!(embers.active, 1);
        assert_eq!(embers.pool[0].age, 601);

        embers.update();
        assert_eq!(embers.active, 0);
    }

    #[test]
    fn only_glowing_embers_pulse() {
        let mut embers: EmberField<4> = EmberField::new(quiet(), 800, 10_000).unwrap();
        place(&mut embers, EmberKind::Ember, 400.0, 5000.0);
        place(&mut embers, EmberKind::Ash, 400.0, 5000.0);

        let mut pulses = 0;
        let mut previous = embers.pool[0].opacity;
        for _ in 0..200 {
            embers.update();

            let current = embers.pool[0].opacity;
            if current != previous {
                pulses += 1;
                let ratio = current / previous;
                assert!((0.85..=1.15).contains(&ratio), "pulse ratio {}", ratio);
            }
            previous = current;

            assert_eq!(embers.pool[1].opacity, 0.5);
        }
        assert!(pulses > 0);
    }

    #[test]
    fn debris_rises_and_spins() {
        let settings = EmberSettings {
            burst_size: 0,
            debris_burst_size: 1,
            debris_stagger: 0,
            ..EmberSettings::default()
        };
        let mut embers: EmberField<8> = EmberField::new(settings, 800, 600).unwrap();

        embers.update();
        assert_eq!(embers.debris_spawned(), 1);
        assert_eq!(embers.spawned(), 0);
        let before = *embers.pool.iter().find(|e| e.active).unwrap();
        assert_eq!(before.kind, EmberKind::Debris);
        assert_eq!(before.y, 605.0);
        assert!((1.0..5.0).contains(&before.size));
        assert!((0.1..0.4).contains(&before.opacity));
        assert!(before.speed_y <= -0.5 && before.speed_y > -2.0);
        assert!(before.rotation_speed.abs() <= 1.0);

        embers.update();
        let after = embers.pool.iter().find(|e| e.active).unwrap();
        assert!((after.x - (before.x + before.speed_x)).abs() < 1e-4);
        assert!((after.y - (before.y + before.speed_y)).abs() < 1e-4);
        assert!((after.rotation - (before.rotation + before.rotation_speed)).abs() < 1e-3);

        let mut surface = RecordingSurface::new(800, 600);
        embers.draw(&mut surface);
        assert_eq!(surface.triangles(), 2);
        assert_eq!(surface.discs(), 0);
    }

    #[test]
    fn debris_bursts_follow_own_interval() {
        let settings = EmberSettings {
            burst_size: 0,
            debris_burst_size: 1,
            debris_stagger: 0,
            ..EmberSettings::default()
        };
        let mut embers: EmberField<8> = EmberField::new(settings, 800, 10_000).unwrap();

        for _ in 0..240 {
            embers.update();
        }
        assert_eq!(embers.debris_spawned(), 1);

        embers.update();
        assert_eq!(embers.debris_spawned(), 2);
    }

    #[test]
    fn draws_live_embers_only() {
        let mut embers: EmberField<8> = EmberField::new(quiet(), 800, 600).unwrap();
        embers.emit_spark(5.0, 5.0);
        embers.emit_spark(6.0, 6.0);

        let mut surface = RecordingSurface::new(800, 600);
        embers.draw(&mut surface);
        assert_eq!(surface.discs(), 2);

        embers.dispose();
        surface.calls.clear();
        embers.update();
        embers.draw(&mut surface);
        assert_eq!(surface.discs(), 0);
        assert_eq!(embers.active, 0);
    }
}
