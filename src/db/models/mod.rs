pub mod brew_log;

pub use brew_log::{BrewLogEntry, NewBrewLog, CUSTOM_RECIPE_NAME, MAX_RATING, MIN_RATING};
