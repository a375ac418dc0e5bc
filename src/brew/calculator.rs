use serde::{Deserialize, Serialize};

const ML_PER_FL_OZ: f64 = 29.5735;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VolumeUnit {
    Ml,
    FlOz,
}

impl Default for VolumeUnit {
    fn default() -> Self {
        VolumeUnit::Ml
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioPreset {
    pub label: &'static str,
    pub ratio: f64,
}

pub const RATIO_PRESETS: [RatioPreset; 4] = [
    RatioPreset { label: "Strong (1:12)", ratio: 12.0 },
    RatioPreset { label: "Balanced (1:15)", ratio: 15.0 },
    RatioPreset { label: "Classic (1:16)", ratio: 16.0 },
    RatioPreset { label: "Light (1:18)", ratio: 18.0 },
];

/// Free-form brew ratio calculator, independent of any recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewRatio {
    pub coffee_grams: f64,
    /// Water parts per part coffee.
    pub ratio: f64,
    pub unit: VolumeUnit,
}

impl Default for BrewRatio {
    fn default() -> Self {
        Self {
            coffee_grams: 15.0,
            ratio: 16.0,
            unit: VolumeUnit::Ml,
        }
    }
}

impl BrewRatio {
    pub fn new(coffee_grams: f64, ratio: f64) -> Self {
        Self {
            coffee_grams,
            ratio,
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, unit: VolumeUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn apply_preset(&mut self, preset: &RatioPreset) {
        self.ratio = preset.ratio;
    }

    pub fn water_ml(&self) -> f64 {
        self.coffee_grams * self.ratio
    }

    pub fn water_display(&self) -> String {
        match self.unit {
            VolumeUnit::Ml => format!("{:.0} ml", self.water_ml()),
            VolumeUnit::FlOz => format!("{:.1} fl oz", self.water_ml() / ML_PER_FL_OZ),
        }
    }

    pub fn coffee_display(&self) -> String {
        format!("{:.1} g", self.coffee_grams)
    }

    pub fn ratio_display(&self) -> String {
        format!("1 : {:.1}", self.ratio)
    }
}
