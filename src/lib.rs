pub mod brew;
pub mod catalog;
pub mod cli;
pub mod db;
pub mod models;
pub mod settings;
pub mod timer;
pub mod utils;

pub use catalog::RecipeCatalog;
pub use db::{BrewLogEntry, Database, NewBrewLog};
pub use models::{BrewMethod, Recipe};
pub use timer::{BrewSessionController, BrewSessionRunner};
