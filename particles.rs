//! particle-field - ambient particle background
//! No heap allocation, no_std compatible
//!
//! The core is [`ParticleField`]: a fixed-capacity pool of drifting discs that
//! bounce off the surface edges, are pushed away by the pointer and get linked
//! by faint lines when close. [`EmberField`] adds the short-lived spark trail
//! and rising embers drawn on top of it. Both paint through the [`Surface`]
//! trait; the desktop simulator in `main.rs` backs it with embedded-graphics.

#![cfg_attr(not(test), no_std)]

pub mod color;
pub mod embers;
pub mod error;
pub mod field;
pub mod settings;
pub mod surface;

pub use color::Rgb;
pub use embers::{Ember, EmberField, EmberKind};
pub use error::SettingsError;
pub use field::{line_opacity, repulsion_force, FrameToken, Particle, ParticleField};
pub use settings::{EmberSettings, FieldSettings, Palette, MAX_PALETTE};
pub use surface::{Point, Surface};
