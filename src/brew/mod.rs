pub mod caffeine;
pub mod calculator;
pub mod scaler;

pub use caffeine::{estimate_mg, estimate_mg_for_label, DailyCaffeineSummary};
pub use calculator::{BrewRatio, VolumeUnit, RATIO_PRESETS};
pub use scaler::{scale, scaled_recipe, ScaledStep};
