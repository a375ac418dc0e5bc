//! `brewguide` command line.

mod brew;
mod journal;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::{
    brew::{scale, BrewRatio, VolumeUnit, RATIO_PRESETS},
    catalog::RecipeCatalog,
    db::Database,
    models::{BrewMethod, Recipe},
    settings::{self, SettingsStore},
    utils::logging,
};

pub use journal::JournalAction;

const DATABASE_FILE: &str = "brewguide.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Parser, Debug)]
#[command(name = "brewguide")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Guided coffee brewing timer and journal", long_about = None)]
pub struct Cli {
    /// Directory for the journal database and settings
    #[arg(long, global = true, env = settings::DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available recipes
    Recipes {
        /// Only show recipes for one brew method
        #[arg(long, value_enum)]
        method: Option<MethodArg>,
    },
    /// Show a recipe's steps scaled to a dose
    Show {
        /// Recipe id or name
        recipe: String,
        /// Coffee dose in grams (defaults to the recipe's own)
        #[arg(long)]
        coffee: Option<f64>,
    },
    /// Brew a recipe step by step
    Brew {
        /// Recipe id or name
        recipe: String,
        /// Coffee dose in grams (defaults to the recipe's own)
        #[arg(long)]
        coffee: Option<f64>,
    },
    /// Inspect or edit the brew journal
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
    /// Today's caffeine estimate from the journal
    Caffeine,
    /// Show or change settings
    Settings {
        /// Daily caffeine limit in mg
        #[arg(long)]
        daily_limit: Option<f64>,
        /// Smallest dose accepted for a brew, in grams
        #[arg(long)]
        min_coffee: Option<f64>,
        /// Largest dose accepted for a brew, in grams
        #[arg(long)]
        max_coffee: Option<f64>,
    },
    /// Work out water for a dose and ratio
    Calc {
        /// Coffee dose in grams
        #[arg(long, default_value_t = 15.0)]
        coffee: f64,
        /// Water per gram of coffee (16 means 1:16)
        #[arg(long, default_value_t = 16.0)]
        ratio: f64,
        /// Show water in fluid ounces
        #[arg(long)]
        oz: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    V60,
    Aeropress,
    FrenchPress,
}

impl From<MethodArg> for BrewMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::V60 => BrewMethod::PourOver,
            MethodArg::Aeropress => BrewMethod::ImmersionPress,
            MethodArg::FrenchPress => BrewMethod::FullImmersionPress,
        }
    }
}

/// Everything a command may need, loaded once per invocation.
pub struct AppContext {
    pub data_dir: PathBuf,
    pub settings: SettingsStore,
    pub catalog: RecipeCatalog,
}

impl AppContext {
    pub fn load(data_dir: PathBuf) -> Result<Self> {
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;
        let catalog = RecipeCatalog::load_or_builtin(settings.current().recipes_path.as_deref())?;
        Ok(Self {
            data_dir,
            settings,
            catalog,
        })
    }

    pub fn open_database(&self) -> Result<Database> {
        Database::new(self.data_dir.join(DATABASE_FILE))
    }

    pub fn recipe(&self, key: &str) -> Result<&Recipe> {
        self.catalog
            .find(key)
            .ok_or_else(|| anyhow!("no recipe matches '{key}' (see `brewguide recipes`)"))
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LevelFilter::Info);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => settings::data_dir()?,
    };
    let ctx = AppContext::load(data_dir)?;

    match cli.command {
        Command::Recipes { method } => {
            list_recipes(&ctx, method.map(BrewMethod::from));
            Ok(())
        }
        Command::Show { recipe, coffee } => show_recipe(&ctx, &recipe, coffee),
        Command::Brew { recipe, coffee } => brew::run(&ctx, &recipe, coffee).await,
        Command::Journal { action } => journal::run(&ctx, action).await,
        Command::Caffeine => journal::caffeine(&ctx).await,
        Command::Settings {
            daily_limit,
            min_coffee,
            max_coffee,
        } => update_settings(&ctx, daily_limit, min_coffee, max_coffee),
        Command::Calc { coffee, ratio, oz } => {
            let unit = if oz { VolumeUnit::FlOz } else { VolumeUnit::Ml };
            print_ratio(&BrewRatio::new(coffee, ratio).with_unit(unit));
            Ok(())
        }
    }
}

fn list_recipes(ctx: &AppContext, method: Option<BrewMethod>) {
    let recipes: Vec<&Recipe> = match method {
        Some(method) => {
            println!("{}: {}", method.label(), method.description());
            ctx.catalog.by_method(method)
        }
        None => ctx.catalog.list_all().iter().collect(),
    };

    if recipes.is_empty() {
        println!("No recipes.");
        return;
    }

    for recipe in recipes {
        println!(
            "{}  [{} · {}]",
            recipe.name,
            recipe.method.label(),
            recipe.difficulty.as_str()
        );
        println!(
            "    {:.0}g coffee · {:.0}ml water · 1:{:.1} · {} steps · {}{}",
            recipe.default_coffee_grams,
            recipe.default_water_ml,
            recipe.default_ratio(),
            recipe.steps.len(),
            format_clock(timed_seconds(recipe)),
            recipe
                .water_temperature_celsius
                .map(|t| format!(" · {t}°C"))
                .unwrap_or_default()
        );
        println!("    id {}", recipe.id);
    }
}

fn show_recipe(ctx: &AppContext, key: &str, coffee: Option<f64>) -> Result<()> {
    let recipe = ctx.recipe(key)?;
    let grams = resolve_dose(ctx, recipe, coffee)?;

    println!("{} ({})", recipe.name, recipe.method.label());
    println!(
        "{:.0}g coffee · {:.0}ml water",
        grams,
        recipe.water_for(grams)
    );
    for (index, step) in scale(recipe, grams).iter().enumerate() {
        let timing = if step.is_open_ended() {
            "no timer".to_string()
        } else {
            format_clock(step.duration_seconds)
        };
        println!("{:>2}. {} ({})", index + 1, step.name, timing);
        println!("    {}", step.instruction);
    }
    Ok(())
}

fn update_settings(
    ctx: &AppContext,
    daily_limit: Option<f64>,
    min_coffee: Option<f64>,
    max_coffee: Option<f64>,
) -> Result<()> {
    let settings = if daily_limit.is_some() || min_coffee.is_some() || max_coffee.is_some() {
        let updated = ctx.settings.update(|settings| {
            if let Some(limit) = daily_limit {
                settings.daily_caffeine_limit_mg = limit;
            }
            if let Some(min) = min_coffee {
                settings.min_coffee_grams = min;
            }
            if let Some(max) = max_coffee {
                settings.max_coffee_grams = max;
            }
        })?;
        println!("Saved {}", ctx.settings.path().display());
        updated
    } else {
        ctx.settings.current()
    };

    println!("Daily caffeine limit: {:.0}mg", settings.daily_caffeine_limit_mg);
    println!(
        "Coffee dose range:    {}g to {}g",
        settings.min_coffee_grams, settings.max_coffee_grams
    );
    println!("Tick interval:        {}ms", settings.tick_interval_ms);
    if let Some(path) = &settings.recipes_path {
        println!("Recipes file:         {}", path.display());
    }
    Ok(())
}

fn print_ratio(ratio: &BrewRatio) {
    println!(
        "{} coffee at {} → {} water",
        ratio.coffee_display(),
        ratio.ratio_display(),
        ratio.water_display()
    );

    let mut preset_ratio = ratio.clone();
    for preset in &RATIO_PRESETS {
        preset_ratio.apply_preset(preset);
        println!("  {:<16} {}", preset.label, preset_ratio.water_display());
    }
}

/// Requested dose clamped to the configured range, or the recipe default.
fn resolve_dose(ctx: &AppContext, recipe: &Recipe, coffee: Option<f64>) -> Result<f64> {
    let requested = coffee.unwrap_or(recipe.default_coffee_grams);
    ensure_positive_amount("coffee dose", requested)?;

    let grams = ctx.settings.current().clamp_coffee_grams(requested);
    if (grams - requested).abs() > f64::EPSILON {
        println!("Dose {requested}g is out of range; using {grams}g.");
    }
    Ok(grams)
}

pub(crate) fn ensure_positive_amount(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        bail!("{what} must be a positive number, got {value}");
    }
    Ok(())
}

fn timed_seconds(recipe: &Recipe) -> u32 {
    recipe.steps.iter().map(|step| step.duration_seconds).sum()
}

pub(crate) fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub(crate) fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
