// Litter Gauge - Unit Converter
//
// Weight in kilograms to litres of litter through a fixed bulk density.

use crate::config::{DENSITY_LITRES_PER_KG, MAX_CAPACITY_LITRES};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeConverter {
    density: f32,
    max_capacity: f32,
}

impl VolumeConverter {
    pub const fn new(density: f32, max_capacity: f32) -> Self {
        Self {
            density,
            max_capacity,
        }
    }

    /// Above capacity reads as exactly `max_capacity`. Negative weights are
    /// passed through: they mean the tare is off and must stay visible.
    pub fn to_volume(&self, weight_kg: f32) -> f32 {
        let volume = weight_kg * self.density;
        if volume > self.max_capacity {
            self.max_capacity
        } else {
            volume
        }
    }
}

impl Default for VolumeConverter {
    fn default() -> Self {
        Self::new(DENSITY_LITRES_PER_KG, MAX_CAPACITY_LITRES)
    }
}
