pub mod recipe;

pub use recipe::{BrewMethod, Difficulty, Recipe, StepTemplate};
