use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Subcommand;

use super::{ensure_positive_amount, progress_bar, AppContext, MethodArg};
use crate::{
    brew::{caffeine::estimate_entry_mg, DailyCaffeineSummary},
    db::{BrewLogEntry, NewBrewLog},
    models::BrewMethod,
};

const LIMIT_BAR_WIDTH: usize = 20;

#[derive(Debug, Subcommand)]
pub enum JournalAction {
    /// Show saved brews, newest first
    List {
        /// Only show the most recent entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record a brew made without the timer
    Add {
        /// Brew method
        #[arg(long, value_enum)]
        method: MethodArg,
        /// Coffee dose in grams
        #[arg(long)]
        coffee: f64,
        /// Water in ml
        #[arg(long)]
        water: f64,
        /// Recipe name (stored as "Custom" when omitted)
        #[arg(long, default_value = "")]
        recipe: String,
        /// Rating from 1 to 5
        #[arg(long, default_value_t = 3)]
        rating: u8,
        #[arg(long)]
        bean: Option<String>,
        #[arg(long)]
        grind: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete one entry by id
    Delete { id: String },
}

pub(super) async fn run(ctx: &AppContext, action: JournalAction) -> Result<()> {
    let db = ctx.open_database()?;

    match action {
        JournalAction::List { limit } => {
            let entries = db.list_brew_logs().await?;
            if entries.is_empty() {
                println!("The journal at {} is empty.", db.path().display());
                return Ok(());
            }
            let shown = limit.unwrap_or(entries.len());
            for entry in entries.iter().take(shown) {
                print_entry(entry);
            }
            Ok(())
        }
        JournalAction::Add {
            method,
            coffee,
            water,
            recipe,
            rating,
            bean,
            grind,
            notes,
        } => {
            ensure_positive_amount("coffee", coffee)?;
            ensure_positive_amount("water", water)?;
            let method = BrewMethod::from(method);
            let mut draft =
                NewBrewLog::new(recipe, method.label(), coffee, water).with_rating(rating);
            draft.bean_name = bean;
            draft.grind_size = grind;
            draft.notes = notes;

            let entry = db.append_brew_log(draft).await?;
            print_entry(&entry);
            Ok(())
        }
        JournalAction::Delete { id } => {
            db.delete_brew_log(&id).await?;
            println!("Deleted {id}.");
            Ok(())
        }
    }
}

pub(super) async fn caffeine(ctx: &AppContext) -> Result<()> {
    let db = ctx.open_database()?;
    let today = Utc::now().date_naive();
    let (from, to) = day_bounds(today);

    let entries = db.list_brew_logs_between(from, to).await?;
    let limit = ctx.settings.current().daily_caffeine_limit_mg;
    let summary = DailyCaffeineSummary::for_day(&entries, today, limit);

    println!("Caffeine today ({today}): {}", summary.describe());
    println!(
        "  {} {:.0}% of daily limit",
        progress_bar(summary.limit_fraction(), LIMIT_BAR_WIDTH),
        summary.limit_fraction() * 100.0
    );
    if summary.is_over_limit() {
        println!("Over the daily limit of {limit:.0}mg.");
    }
    for entry in &entries {
        println!(
            "  {}  {} · {:.0}g · ~{:.0}mg",
            entry.brewed_at.format("%H:%M"),
            entry.recipe_name,
            entry.coffee_grams,
            estimate_entry_mg(entry)
        );
    }
    Ok(())
}

fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

fn print_entry(entry: &BrewLogEntry) {
    println!(
        "{}  {} ({})  {}",
        entry.brewed_at.format("%Y-%m-%d %H:%M"),
        entry.recipe_name,
        entry.method_label,
        stars(entry.rating)
    );
    println!(
        "    {:.0}g coffee · {:.0}ml water · {} · ~{:.0}mg caffeine",
        entry.coffee_grams,
        entry.water_ml,
        entry.ratio_label(),
        estimate_entry_mg(entry)
    );
    let details: Vec<String> = [
        entry.bean_name.as_ref().map(|bean| format!("bean: {bean}")),
        entry.grind_size.as_ref().map(|grind| format!("grind: {grind}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        println!("    {}", details.join(" · "));
    }
    if let Some(notes) = &entry.notes {
        println!("    \"{notes}\"");
    }
    println!("    id {}", entry.id);
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn day_bounds_cover_one_utc_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let (from, to) = day_bounds(day);
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn add_rejects_unusable_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::load(dir.path().to_path_buf()).unwrap();

        for (coffee, water) in [(f64::NAN, 250.0), (15.0, f64::INFINITY), (0.0, 250.0)] {
            let action = JournalAction::Add {
                method: MethodArg::V60,
                coffee,
                water,
                recipe: String::new(),
                rating: 4,
                bean: None,
                grind: None,
                notes: None,
            };
            assert!(run(&ctx, action).await.is_err(), "accepted {coffee}g / {water}ml");
        }
        assert!(ctx.open_database().unwrap().list_brew_logs().await.unwrap().is_empty());
    }

    #[test]
    fn stars_show_rating() {
        assert_eq!(stars(4), "★★★★☆");
        assert_eq!(stars(1), "★☆☆☆☆");
    }
}
