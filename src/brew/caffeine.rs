use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::BrewLogEntry;
use crate::models::BrewMethod;

pub const DEFAULT_DAILY_LIMIT_MG: f64 = 400.0;

const POUR_OVER_MG_PER_GRAM: f64 = 12.0;
const IMMERSION_PRESS_MG_PER_GRAM: f64 = 15.0;
const FULL_IMMERSION_MG_PER_GRAM: f64 = 10.0;
const FALLBACK_MG_PER_GRAM: f64 = POUR_OVER_MG_PER_GRAM;

/// Approximate caffeine yield per gram of coffee.
pub fn mg_per_gram(method: Option<BrewMethod>) -> f64 {
    match method {
        Some(BrewMethod::PourOver) => POUR_OVER_MG_PER_GRAM,
        Some(BrewMethod::ImmersionPress) => IMMERSION_PRESS_MG_PER_GRAM,
        Some(BrewMethod::FullImmersionPress) => FULL_IMMERSION_MG_PER_GRAM,
        None => FALLBACK_MG_PER_GRAM,
    }
}

pub fn estimate_mg(coffee_grams: f64, method: BrewMethod) -> f64 {
    coffee_grams * mg_per_gram(Some(method))
}

/// Same as [`estimate_mg`] for a stored method label; unknown labels use the
/// pour-over yield.
pub fn estimate_mg_for_label(coffee_grams: f64, method_label: &str) -> f64 {
    coffee_grams * mg_per_gram(BrewMethod::from_label(method_label))
}

pub fn estimate_entry_mg(entry: &BrewLogEntry) -> f64 {
    estimate_mg_for_label(entry.coffee_grams, &entry.method_label)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyCaffeineSummary {
    pub day: NaiveDate,
    pub brew_count: usize,
    pub total_coffee_grams: f64,
    pub total_caffeine_mg: f64,
    pub limit_mg: f64,
}

impl DailyCaffeineSummary {
    /// Totals the entries brewed on `day` (UTC calendar day).
    pub fn for_day(entries: &[BrewLogEntry], day: NaiveDate, limit_mg: f64) -> Self {
        let todays = entries
            .iter()
            .filter(|entry| entry.brewed_at.date_naive() == day);

        let mut summary = Self {
            day,
            brew_count: 0,
            total_coffee_grams: 0.0,
            total_caffeine_mg: 0.0,
            limit_mg,
        };

        for entry in todays {
            summary.brew_count += 1;
            summary.total_coffee_grams += entry.coffee_grams;
            summary.total_caffeine_mg += estimate_entry_mg(entry);
        }

        summary
    }

    /// Share of the daily limit consumed, capped at 1.
    pub fn limit_fraction(&self) -> f64 {
        if self.limit_mg <= 0.0 {
            return 1.0;
        }
        (self.total_caffeine_mg / self.limit_mg).min(1.0)
    }

    pub fn is_over_limit(&self) -> bool {
        self.total_caffeine_mg > self.limit_mg
    }

    pub fn describe(&self) -> String {
        let plural = if self.brew_count == 1 { "" } else { "s" };
        format!(
            "~{}mg of {}mg · {} brew{} · {}g coffee",
            self.total_caffeine_mg as i64,
            self.limit_mg as i64,
            self.brew_count,
            plural,
            self.total_coffee_grams as i64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(day: u32, hour: u32, grams: f64, label: &str) -> BrewLogEntry {
        BrewLogEntry {
            id: format!("{day}-{hour}"),
            brewed_at: Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap(),
            recipe_name: "Custom".into(),
            method_label: label.into(),
            coffee_grams: grams,
            water_ml: grams * 16.0,
            bean_name: None,
            grind_size: None,
            notes: None,
            rating: 3,
        }
    }

    #[test]
    fn yields_match_method() {
        assert_eq!(estimate_mg(15.0, BrewMethod::PourOver), 180.0);
        assert_eq!(estimate_mg(15.0, BrewMethod::ImmersionPress), 225.0);
        assert_eq!(estimate_mg(15.0, BrewMethod::FullImmersionPress), 150.0);
        assert_eq!(estimate_mg_for_label(15.0, "Chemex"), 180.0);
        assert_eq!(estimate_mg_for_label(10.0, "AeroPress"), 150.0);
    }

    #[test]
    fn daily_summary_only_counts_that_day() {
        let entries = vec![
            entry(4, 8, 15.0, "V60"),
            entry(4, 14, 17.0, "AeroPress"),
            entry(3, 23, 30.0, "French Press"),
        ];
        let day = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();

        let summary = DailyCaffeineSummary::for_day(&entries, day, DEFAULT_DAILY_LIMIT_MG);
        assert_eq!(summary.brew_count, 2);
        assert_eq!(summary.total_coffee_grams, 32.0);
        assert_eq!(summary.total_caffeine_mg, 180.0 + 255.0);
        assert!(summary.is_over_limit());
        assert_eq!(summary.limit_fraction(), 1.0);
        assert_eq!(summary.describe(), "~435mg of 400mg · 2 brews · 32g coffee");
    }

    #[test]
    fn empty_day_is_zero() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let summary = DailyCaffeineSummary::for_day(&[], day, DEFAULT_DAILY_LIMIT_MG);
        assert_eq!(summary.brew_count, 0);
        assert_eq!(summary.limit_fraction(), 0.0);
        assert!(!summary.is_over_limit());
    }
}
