use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::models::{celsius_to_fahrenheit, round_to, ReadingBase, SensorKind, SensorReading};

pub const INTERIOR_DEVICES: [&str; 3] = ["sensor_01", "sensor_03", "sensor_05"];
pub const EXTERIOR_DEVICES: [&str; 3] = ["sensor_02", "sensor_04", "sensor_06"];

pub const INTERIOR_LOCATIONS: [&str; 4] = ["Sala 1", "Sala 2", "Oficina A", "Oficina B"];
pub const EXTERIOR_LOCATIONS: [&str; 4] = ["Patio", "Jardín", "Terraza", "Entrada"];

/// Produces synthetic readings for both sensor families
pub struct ReadingGenerator<R: Rng = StdRng> {
    rng: R,
}

impl ReadingGenerator<StdRng> {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for ReadingGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ReadingGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a reading of the given kind, or of a uniformly chosen kind
    pub fn generate(&mut self, kind: Option<SensorKind>) -> SensorReading {
        let kind = kind.unwrap_or_else(|| {
            if self.rng.gen_bool(0.5) {
                SensorKind::Interior
            } else {
                SensorKind::Exterior
            }
        });

        match kind {
            SensorKind::Interior => self.generate_interior(None),
            SensorKind::Exterior => self.generate_exterior(None),
        }
    }

    pub fn generate_interior(&mut self, device_id: Option<&str>) -> SensorReading {
        let device_id = device_id
            .map(str::to_string)
            .unwrap_or_else(|| self.pick(&INTERIOR_DEVICES));
        let location = self.pick(&INTERIOR_LOCATIONS);

        SensorReading::Interior {
            base: ReadingBase::now(device_id, location),
            temperature: round_to(self.rng.gen_range(18.0..=28.0), 1),
            humidity: self.rng.gen_range(30..=70),
            light: self.rng.gen_range(100..=500),
        }
    }

    pub fn generate_exterior(&mut self, device_id: Option<&str>) -> SensorReading {
        let device_id = device_id
            .map(str::to_string)
            .unwrap_or_else(|| self.pick(&EXTERIOR_DEVICES));
        let location = self.pick(&EXTERIOR_LOCATIONS);
        let celsius: f64 = self.rng.gen_range(5.0..=35.0);

        SensorReading::Exterior {
            base: ReadingBase::now(device_id, location),
            temperature: celsius_to_fahrenheit(celsius),
            light: self.rng.gen_range(200..=1000),
            uv_index: round_to(self.rng.gen_range(0.0..=11.0), 1),
        }
    }

    /// Generate `count` readings of random kinds
    pub fn generate_batch(&mut self, count: usize) -> Vec<SensorReading> {
        (0..count).map(|_| self.generate(None)).collect()
    }

    fn pick(&mut self, pool: &[&str]) -> String {
        pool.choose(&mut self.rng).copied().unwrap_or_default().to_string()
    }
}

/// Pretty-printed JSON for display, non-ASCII characters kept as is
pub fn reading_to_json(reading: &SensorReading) -> Result<String> {
    Ok(serde_json::to_string_pretty(reading)?)
}
