use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BrewMethod {
    PourOver,
    ImmersionPress,
    FullImmersionPress,
}

impl BrewMethod {
    pub const ALL: [BrewMethod; 3] = [
        BrewMethod::PourOver,
        BrewMethod::ImmersionPress,
        BrewMethod::FullImmersionPress,
    ];

    /// Label stored on brew log entries.
    pub fn label(&self) -> &'static str {
        match self {
            BrewMethod::PourOver => "V60",
            BrewMethod::ImmersionPress => "AeroPress",
            BrewMethod::FullImmersionPress => "French Press",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BrewMethod::PourOver => "Pour-over brewing with nuanced flavor clarity",
            BrewMethod::ImmersionPress => "Versatile immersion brewing, rich and smooth",
            BrewMethod::FullImmersionPress => "Full immersion brewing for rich, textured results",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.label().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

/// One step of a recipe as authored, before any dose scaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepTemplate {
    pub name: String,
    pub instruction: String,
    /// 0 means open-ended: only an explicit advance moves past it.
    pub duration_seconds: u32,
    #[serde(default)]
    pub pour_amount_ml: Option<f64>,
}

impl StepTemplate {
    pub fn is_open_ended(&self) -> bool {
        self.duration_seconds == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub method: BrewMethod,
    pub steps: Vec<StepTemplate>,
    pub default_coffee_grams: f64,
    pub default_water_ml: f64,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub water_temperature_celsius: Option<u8>,
}

impl Recipe {
    /// Water-to-coffee ratio the recipe was written for.
    pub fn default_ratio(&self) -> f64 {
        self.default_water_ml / self.default_coffee_grams
    }

    pub fn water_for(&self, coffee_grams: f64) -> f64 {
        coffee_grams * self.default_ratio()
    }

    /// Same recipe with a different step list.
    pub fn with_steps(&self, steps: Vec<StepTemplate>) -> Recipe {
        Recipe {
            steps,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_labels_round_trip() {
        for method in BrewMethod::ALL {
            assert_eq!(BrewMethod::from_label(method.label()), Some(method));
        }
        assert_eq!(BrewMethod::from_label("french press"), Some(BrewMethod::FullImmersionPress));
        assert_eq!(BrewMethod::from_label("Moka Pot"), None);
    }

    #[test]
    fn ratio_and_water_follow_defaults() {
        let recipe = Recipe {
            id: Uuid::nil(),
            name: "Test".into(),
            method: BrewMethod::PourOver,
            steps: vec![StepTemplate {
                name: "Bloom".into(),
                instruction: "Pour 50ml".into(),
                duration_seconds: 45,
                pour_amount_ml: Some(50.0),
            }],
            default_coffee_grams: 15.0,
            default_water_ml: 250.0,
            difficulty: Difficulty::Easy,
            water_temperature_celsius: Some(93),
        };

        assert!((recipe.default_ratio() - 16.666).abs() < 0.001);
        assert!((recipe.water_for(30.0) - 500.0).abs() < 1e-9);
    }
}
