//! Read-only recipe table.
//!
//! Recipes are loaded once, either from the table compiled into the binary or
//! from a JSON file with the same shape, and never change afterwards.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use crate::models::{BrewMethod, Recipe};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

const BUILTIN_RECIPES: &str = include_str!("recipes.json");

#[derive(Debug, Clone)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    index: HashMap<Uuid, usize>,
}

impl RecipeCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_RECIPES).context("built-in recipe table is invalid")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read recipes from {}", path.display()))?;
        let catalog = Self::from_json(&contents)
            .with_context(|| format!("invalid recipe table in {}", path.display()))?;

        log_info!("loaded {} recipes from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Uses `path` when given, otherwise the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let recipes: Vec<Recipe> =
            serde_json::from_str(contents).context("failed to parse recipe JSON")?;
        Self::new(recipes)
    }

    pub fn new(recipes: Vec<Recipe>) -> Result<Self> {
        let mut index = HashMap::with_capacity(recipes.len());
        for (position, recipe) in recipes.iter().enumerate() {
            validate(recipe)?;
            if index.insert(recipe.id, position).is_some() {
                bail!("duplicate recipe id {}", recipe.id);
            }
        }
        Ok(Self { recipes, index })
    }

    pub fn list_all(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn by_method(&self, method: BrewMethod) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .filter(|recipe| recipe.method == method)
            .collect()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Recipe> {
        self.index.get(id).map(|&position| &self.recipes[position])
    }

    /// Looks a recipe up by full id or by case-insensitive name.
    pub fn find(&self, key: &str) -> Option<&Recipe> {
        if let Ok(id) = Uuid::parse_str(key.trim()) {
            return self.get(&id);
        }
        self.recipes
            .iter()
            .find(|recipe| recipe.name.eq_ignore_ascii_case(key.trim()))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

fn validate(recipe: &Recipe) -> Result<()> {
    if recipe.steps.is_empty() {
        bail!("recipe '{}' has no steps", recipe.name);
    }
    if !(recipe.default_coffee_grams > 0.0) {
        bail!(
            "recipe '{}' has non-positive default coffee mass {}",
            recipe.name,
            recipe.default_coffee_grams
        );
    }
    if !(recipe.default_water_ml > 0.0) {
        bail!(
            "recipe '{}' has non-positive default water volume {}",
            recipe.name,
            recipe.default_water_ml
        );
    }
    for step in &recipe.steps {
        if let Some(pour) = step.pour_amount_ml {
            if !(pour > 0.0) {
                bail!(
                    "step '{}' of recipe '{}' has non-positive pour {}",
                    step.name,
                    recipe.name,
                    pour
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brew::scale;

    #[test]
    fn builtin_table_loads() {
        let catalog = RecipeCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.by_method(BrewMethod::PourOver).len(), 4);
        assert_eq!(catalog.by_method(BrewMethod::ImmersionPress).len(), 3);
        assert_eq!(catalog.by_method(BrewMethod::FullImmersionPress).len(), 1);

        let classic = catalog.find("classic v60").unwrap();
        assert_eq!(classic.steps.len(), 6);
        assert_eq!(classic.water_temperature_celsius, Some(93));
        assert_eq!(catalog.get(&classic.id).map(|r| r.name.as_str()), Some("Classic V60"));
        assert!(catalog.find(&classic.id.to_string()).is_some());
    }

    #[test]
    fn builtin_recipes_scale_with_text() {
        let catalog = RecipeCatalog::builtin().unwrap();
        let classic = catalog.find("Classic V60").unwrap();

        let steps = scale(classic, 30.0);
        assert_eq!(steps[2].pour_amount_ml, Some(100.0));
        assert!(steps[2].instruction.contains("Pour 100ml of water"));
        // Both pours mention 100ml; each rewrites its own figure.
        assert!(steps[3].instruction.starts_with("Pour 200ml"));
        assert!(steps[4].instruction.contains("remaining 200ml"));

        // "bringing the total to 150ml" does not match the 120ml pour.
        let hoffmann = catalog.find("Hoffmann V60").unwrap();
        let steps = scale(hoffmann, 30.0);
        assert_eq!(steps[3].pour_amount_ml, Some(240.0));
        assert_eq!(steps[3].instruction, hoffmann.steps[3].instruction);
    }

    #[test]
    fn rejects_invalid_tables() {
        let empty_steps = r#"[{
            "id": "00000000-0000-0000-0000-000000000009",
            "name": "Nothing",
            "method": "pourOver",
            "difficulty": "easy",
            "defaultCoffeeGrams": 15.0,
            "defaultWaterMl": 250.0,
            "steps": []
        }]"#;
        assert!(RecipeCatalog::from_json(empty_steps).is_err());

        let builtin: Vec<Recipe> = serde_json::from_str(BUILTIN_RECIPES).unwrap();
        let mut duplicated = builtin.clone();
        duplicated.push(builtin[0].clone());
        assert!(RecipeCatalog::new(duplicated).is_err());

        let mut zero_dose = builtin;
        zero_dose[0].default_coffee_grams = 0.0;
        assert!(RecipeCatalog::new(zero_dose).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        std::fs::write(&path, BUILTIN_RECIPES).unwrap();

        let catalog = RecipeCatalog::load_or_builtin(Some(&path)).unwrap();
        assert_eq!(catalog.len(), 8);
        assert!(RecipeCatalog::load(&dir.path().join("missing.json")).is_err());
    }
}
