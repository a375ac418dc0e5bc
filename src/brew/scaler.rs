//! Dose scaling for recipe steps.
//!
//! Pour volumes scale linearly with the coffee dose; durations never do. When a
//! step's instruction mentions its pour volume literally (e.g. "Pour 50ml"),
//! the first such figure is rewritten to the scaled amount.

use serde::{Deserialize, Serialize};

use crate::models::{Recipe, StepTemplate};

/// Factors closer to 1 than this leave instruction text untouched.
const REWRITE_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScaledStep {
    pub name: String,
    pub instruction: String,
    pub duration_seconds: u32,
    pub pour_amount_ml: Option<f64>,
}

impl ScaledStep {
    pub fn is_open_ended(&self) -> bool {
        self.duration_seconds == 0
    }

    pub fn as_template(&self) -> StepTemplate {
        StepTemplate {
            name: self.name.clone(),
            instruction: self.instruction.clone(),
            duration_seconds: self.duration_seconds,
            pour_amount_ml: self.pour_amount_ml,
        }
    }
}

pub fn scale_factor(recipe: &Recipe, target_coffee_grams: f64) -> f64 {
    target_coffee_grams / recipe.default_coffee_grams
}

/// Scales every step of `recipe` to `target_coffee_grams`.
///
/// `target_coffee_grams` must be positive; callers clamp user input first.
pub fn scale(recipe: &Recipe, target_coffee_grams: f64) -> Vec<ScaledStep> {
    debug_assert!(
        target_coffee_grams > 0.0,
        "target coffee mass must be positive, got {target_coffee_grams}"
    );

    let factor = scale_factor(recipe, target_coffee_grams);
    recipe
        .steps
        .iter()
        .map(|step| scale_step(step, factor))
        .collect()
}

fn scale_step(step: &StepTemplate, factor: f64) -> ScaledStep {
    let scaled_pour = step.pour_amount_ml.map(|ml| ml * factor);

    let instruction = match (step.pour_amount_ml, scaled_pour) {
        (Some(original), Some(scaled)) if (factor - 1.0).abs() > REWRITE_EPSILON => {
            rewrite_first_figure(&step.instruction, original, scaled)
        }
        _ => step.instruction.clone(),
    };

    ScaledStep {
        name: step.name.clone(),
        instruction,
        duration_seconds: step.duration_seconds,
        pour_amount_ml: scaled_pour,
    }
}

/// The recipe as it reads at `target_coffee_grams`: scaled steps, with the
/// default dose and water moved to the new amounts.
pub fn scaled_recipe(recipe: &Recipe, target_coffee_grams: f64) -> Recipe {
    let steps = scale(recipe, target_coffee_grams)
        .iter()
        .map(ScaledStep::as_template)
        .collect();

    Recipe {
        default_coffee_grams: target_coffee_grams,
        default_water_ml: recipe.water_for(target_coffee_grams),
        ..recipe.with_steps(steps)
    }
}

pub fn format_ml(value: f64) -> String {
    format!("{value:.0}ml")
}

fn rewrite_first_figure(text: &str, original: f64, scaled: f64) -> String {
    text.replacen(&format_ml(original), &format_ml(scaled), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrewMethod, Difficulty};
    use uuid::Uuid;

    fn step(name: &str, instruction: &str, duration: u32, pour: Option<f64>) -> StepTemplate {
        StepTemplate {
            name: name.into(),
            instruction: instruction.into(),
            duration_seconds: duration,
            pour_amount_ml: pour,
        }
    }

    fn two_pour_recipe() -> Recipe {
        Recipe {
            id: Uuid::nil(),
            name: "Two Pour".into(),
            method: BrewMethod::PourOver,
            steps: vec![
                step("Bloom", "Pour 50ml of water in a spiral.", 45, Some(50.0)),
                step("Pour", "Pour 100ml of water in slow circles.", 30, Some(100.0)),
            ],
            default_coffee_grams: 15.0,
            default_water_ml: 250.0,
            difficulty: Difficulty::Easy,
            water_temperature_celsius: None,
        }
    }

    #[test]
    fn doubling_dose_doubles_pours_but_not_durations() {
        let scaled = scale(&two_pour_recipe(), 30.0);

        assert_eq!(scaled[0].pour_amount_ml, Some(100.0));
        assert_eq!(scaled[1].pour_amount_ml, Some(200.0));
        assert_eq!(scaled[0].duration_seconds, 45);
        assert_eq!(scaled[1].duration_seconds, 30);
        assert_eq!(scaled[0].instruction, "Pour 100ml of water in a spiral.");
        assert_eq!(scaled[1].instruction, "Pour 200ml of water in slow circles.");
    }

    #[test]
    fn pours_are_proportional_for_arbitrary_doses() {
        let recipe = two_pour_recipe();
        for grams in [0.5, 8.0, 12.5, 17.0, 22.25, 30.0, 120.0] {
            let scaled = scale(&recipe, grams);
            for (template, scaled_step) in recipe.steps.iter().zip(&scaled) {
                let expected = template.pour_amount_ml.map(|ml| ml * (grams / 15.0));
                assert_eq!(scaled_step.pour_amount_ml, expected);
            }
        }
    }

    #[test]
    fn default_dose_keeps_text_verbatim() {
        let recipe = two_pour_recipe();
        let scaled = scale(&recipe, recipe.default_coffee_grams);

        for (template, scaled_step) in recipe.steps.iter().zip(&scaled) {
            assert_eq!(scaled_step.as_template(), *template);
        }
    }

    #[test]
    fn factor_within_epsilon_does_not_rewrite() {
        let recipe = two_pour_recipe();
        let scaled = scale(&recipe, 15.01);
        assert_eq!(scaled[0].instruction, recipe.steps[0].instruction);
    }

    #[test]
    fn only_first_occurrence_is_rewritten() {
        let mut recipe = two_pour_recipe();
        recipe.steps[0].instruction = "Pour 50ml, then another 50ml.".into();

        let scaled = scale(&recipe, 30.0);
        assert_eq!(scaled[0].instruction, "Pour 100ml, then another 50ml.");
    }

    #[test]
    fn missing_literal_leaves_text_alone() {
        let mut recipe = two_pour_recipe();
        recipe.steps[1].instruction = "Bring the total to 150ml.".into();

        let scaled = scale(&recipe, 30.0);
        assert_eq!(scaled[1].instruction, "Bring the total to 150ml.");
        assert_eq!(scaled[1].pour_amount_ml, Some(200.0));
    }

    #[test]
    fn steps_without_pour_are_untouched() {
        let mut recipe = two_pour_recipe();
        recipe
            .steps
            .insert(0, step("Rinse", "Rinse the 50ml filter.", 0, None));

        let scaled = scale(&recipe, 30.0);
        assert_eq!(scaled[0].instruction, "Rinse the 50ml filter.");
        assert_eq!(scaled[0].pour_amount_ml, None);
        assert!(scaled[0].is_open_ended());
    }

    #[test]
    fn rescaling_from_the_unscaled_recipe_is_stable() {
        let recipe = two_pour_recipe();
        let first = scale(&recipe, 22.0);
        let second = scale(&recipe, 22.0);
        assert_eq!(first, second);

        let as_recipe = scaled_recipe(&recipe, 22.0);
        assert_eq!(scale(&as_recipe, 22.0), first);
        assert!((as_recipe.default_ratio() - recipe.default_ratio()).abs() < 1e-9);
    }
}
