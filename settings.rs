//! Configuration records for the particle field and the ember emitters.

use heapless::Vec;

use crate::color::Rgb;
use crate::error::{Result, SettingsError};

/// Maximum number of palette entries.
pub const MAX_PALETTE: usize = 8;

pub type Palette = Vec<Rgb, MAX_PALETTE>;

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSettings {
    // Pool
    pub particle_count: usize,
    pub particle_colors: Palette,
    pub mobile_breakpoint: u32,

    // Motion
    pub max_speed: f32,
    pub interactive: bool,
    pub pointer_radius: f32,
    pub repulsion_strength: f32,

    // Connective lines
    pub link_distance: f32,
    pub link_opacity: f32,
    pub link_color: Rgb,
    pub link_width: f32,

    // RNG seed
    pub rng_seed: u64,
}

impl Default for FieldSettings {
    fn default() -> Self {
        let mut particle_colors = Palette::new();
        // Capacity is well above two.
        let _ = particle_colors.push(Rgb::INDIGO);
        let _ = particle_colors.push(Rgb::VIOLET);

        Self {
            particle_count: 50,
            particle_colors,
            mobile_breakpoint: 768,
            max_speed: 0.5,
            interactive: true,
            pointer_radius: 120.0,
            repulsion_strength: 1.5,
            link_distance: 100.0,
            link_opacity: 0.3,
            link_color: Rgb::new(99, 102, 241),
            link_width: 0.5,
            rng_seed: 0x1234_5678,
        }
    }
}

impl FieldSettings {
    /// Replaces the palette, keeping at most [`MAX_PALETTE`] colours.
    pub fn with_colors(mut self, colors: &[Rgb]) -> Result<Self> {
        if colors.is_empty() {
            return Err(SettingsError::EmptyPalette);
        }
        self.particle_colors =
            Palette::from_slice(colors).map_err(|_| SettingsError::PaletteFull(MAX_PALETTE))?;
        Ok(self)
    }

    /// Pool size for a surface of the given width.
    pub fn effective_count(&self, width: u32) -> usize {
        if width < self.mobile_breakpoint {
            self.particle_count / 2
        } else {
            self.particle_count
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.particle_colors.is_empty() {
            return Err(SettingsError::EmptyPalette);
        }
        non_negative("max_speed", self.max_speed)?;
        non_negative("repulsion_strength", self.repulsion_strength)?;
        non_negative("link_opacity", self.link_opacity)?;
        non_negative("link_width", self.link_width)?;
        positive("pointer_radius", self.pointer_radius)?;
        positive("link_distance", self.link_distance)?;
        Ok(())
    }
}

/// Timing and probabilities for the spark trail and rising embers.
/// Durations are in frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EmberSettings {
    pub burst_size: usize,
    pub burst_interval: u32,
    pub burst_stagger: u32,
    pub ember_chance: f32,
    pub ember_lifetime: u32,
    pub spark_chance: f32,
    pub spark_lifetime: u32,
    pub debris_burst_size: usize,
    pub debris_interval: u32,
    pub debris_stagger: u32,
    pub debris_lifetime: u32,
    pub rng_seed: u64,
}

impl Default for EmberSettings {
    fn default() -> Self {
        Self {
            burst_size: 20,
            burst_interval: 180,
            burst_stagger: 120,
            ember_chance: 0.3,
            ember_lifetime: 600,
            spark_chance: 0.3,
            spark_lifetime: 120,
            debris_burst_size: 5,
            debris_interval: 240,
            debris_stagger: 120,
            debris_lifetime: 900,
            rng_seed: 0x8765_4321,
        }
    }
}

impl EmberSettings {
    pub fn validate(&self) -> Result<()> {
        unit("ember_chance", self.ember_chance)?;
        unit("spark_chance", self.spark_chance)?;
        if self.burst_interval == 0 {
            return Err(SettingsError::ZeroDistance("burst_interval"));
        }
        if self.debris_interval == 0 {
            return Err(SettingsError::ZeroDistance("debris_interval"));
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidNumber(name))
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    non_negative(name, value)?;
    if value == 0.0 {
        return Err(SettingsError::ZeroDistance(name));
    }
    Ok(())
}

fn unit(name: &'static str, value: f32) -> Result<()> {
    non_negative(name, value)?;
    if value > 1.0 {
        return Err(SettingsError::InvalidNumber(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(FieldSettings::default().validate(), Ok(()));
        assert_eq!(EmberSettings::default().validate(), Ok(()));
    }

    #[test]
    fn mobile_width_halves_count() {
        let settings = FieldSettings::default();
        assert_eq!(settings.effective_count(767), 25);
        assert_eq!(settings.effective_count(768), 50);

        let odd = FieldSettings { particle_count: 51, ..FieldSettings::default() };
        assert_eq!(odd.effective_count(320), 25);
    }

    #[test]
    fn rejects_bad_numbers() {
        let settings = FieldSettings { max_speed: f32::NAN, ..FieldSettings::default() };
        assert_eq!(settings.validate(), Err(SettingsError::InvalidNumber("max_speed")));

        let settings = FieldSettings { link_distance: 0.0, ..FieldSettings::default() };
        assert_eq!(settings.validate(), Err(SettingsError::ZeroDistance("link_distance")));
    }

    #[test]
    fn rejects_zero_debris_interval() {
        let settings = EmberSettings { debris_interval: 0, ..EmberSettings::default() };
        assert_eq!(settings.validate(), Err(SettingsError::ZeroDistance("debris_interval")));
    }

    #[test]
    fn palette_replacement() {
        assert_eq!(
            FieldSettings::default().with_colors(&[]),
            Err(SettingsError::EmptyPalette)
        );
        let many = [Rgb::BLACK; MAX_PALETTE + 1];
        assert_eq!(
            FieldSettings::default().with_colors(&many),
            Err(SettingsError::PaletteFull(MAX_PALETTE))
        );
        let one = FieldSettings::default().with_colors(&[Rgb::ORANGE]).unwrap();
        assert_eq!(one.particle_colors.as_slice(), &[Rgb::ORANGE]);
    }
}
