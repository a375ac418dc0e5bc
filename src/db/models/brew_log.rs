//! Brew journal records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::BrewMethod;

pub const CUSTOM_RECIPE_NAME: &str = "Custom";
pub const DEFAULT_RATING: u8 = 3;
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A saved brew. Immutable once stored; removed only by an explicit delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewLogEntry {
    pub id: String,
    pub brewed_at: DateTime<Utc>,
    pub recipe_name: String,
    pub method_label: String,
    pub coffee_grams: f64,
    pub water_ml: f64,
    pub bean_name: Option<String>,
    pub grind_size: Option<String>,
    pub notes: Option<String>,
    pub rating: u8,
}

impl BrewLogEntry {
    pub fn method(&self) -> Option<BrewMethod> {
        BrewMethod::from_label(&self.method_label)
    }

    /// Water to coffee ratio as shown in the journal, e.g. "1:16.7".
    pub fn ratio_label(&self) -> String {
        if self.coffee_grams <= 0.0 {
            return "—".to_string();
        }
        format!("1:{:.1}", self.water_ml / self.coffee_grams)
    }
}

/// Input for appending a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBrewLog {
    pub brewed_at: DateTime<Utc>,
    pub recipe_name: String,
    pub method_label: String,
    pub coffee_grams: f64,
    pub water_ml: f64,
    pub bean_name: Option<String>,
    pub grind_size: Option<String>,
    pub notes: Option<String>,
    pub rating: u8,
}

impl NewBrewLog {
    pub fn new(
        recipe_name: impl Into<String>,
        method_label: impl Into<String>,
        coffee_grams: f64,
        water_ml: f64,
    ) -> Self {
        Self {
            brewed_at: Utc::now(),
            recipe_name: recipe_name.into(),
            method_label: method_label.into(),
            coffee_grams,
            water_ml,
            bean_name: None,
            grind_size: None,
            notes: None,
            rating: DEFAULT_RATING,
        }
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_bean(mut self, bean_name: impl Into<String>) -> Self {
        self.bean_name = non_empty(bean_name.into());
        self
    }

    pub fn with_grind(mut self, grind_size: impl Into<String>) -> Self {
        self.grind_size = non_empty(grind_size.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_empty(notes.into());
        self
    }

    /// Blank recipe names are stored as "Custom"; blank optional text as absent.
    pub fn normalized(mut self) -> Self {
        if self.recipe_name.trim().is_empty() {
            self.recipe_name = CUSTOM_RECIPE_NAME.to_string();
        }
        self.bean_name = self.bean_name.and_then(non_empty);
        self.grind_size = self.grind_size.and_then(non_empty);
        self.notes = self.notes.and_then(non_empty);
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_recipe_name_becomes_custom() {
        let draft = NewBrewLog::new("  ", "V60", 15.0, 250.0)
            .with_notes("")
            .normalized();
        assert_eq!(draft.recipe_name, CUSTOM_RECIPE_NAME);
        assert_eq!(draft.notes, None);
        assert_eq!(draft.rating, DEFAULT_RATING);
    }

    #[test]
    fn ratio_label_handles_zero_coffee() {
        let mut entry = BrewLogEntry {
            id: "a".into(),
            brewed_at: Utc::now(),
            recipe_name: "Classic V60".into(),
            method_label: "V60".into(),
            coffee_grams: 15.0,
            water_ml: 250.0,
            bean_name: None,
            grind_size: None,
            notes: None,
            rating: 4,
        };
        assert_eq!(entry.ratio_label(), "1:16.7");
        assert_eq!(entry.method(), Some(BrewMethod::PourOver));

        entry.coffee_grams = 0.0;
        assert_eq!(entry.ratio_label(), "—");
    }
}
