use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use crate::brew::caffeine::DEFAULT_DAILY_LIMIT_MG;

pub const DATA_DIR_ENV: &str = "BREWGUIDE_DATA_DIR";
pub const DEBUG_ENV: &str = "BREWGUIDE_DEBUG";

const DEBUG_TICK_INTERVAL_MS: u64 = 100;
const APP_DIR_NAME: &str = "brewguide";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BrewSettings {
    pub daily_caffeine_limit_mg: f64,
    /// Dose range offered when starting a recipe.
    pub min_coffee_grams: f64,
    pub max_coffee_grams: f64,
    pub tick_interval_ms: u64,
    /// Replaces the built-in recipe table when set.
    pub recipes_path: Option<PathBuf>,
}

impl Default for BrewSettings {
    fn default() -> Self {
        Self {
            daily_caffeine_limit_mg: DEFAULT_DAILY_LIMIT_MG,
            min_coffee_grams: 8.0,
            max_coffee_grams: 30.0,
            tick_interval_ms: 1_000,
            recipes_path: None,
        }
    }
}

impl BrewSettings {
    /// Rejects values that would make dose clamping or the caffeine limit
    /// meaningless.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_coffee_grams, self.max_coffee_grams);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
            bail!(
                "coffee range must satisfy 0 < minCoffeeGrams <= maxCoffeeGrams, got {min}..{max}"
            );
        }
        if !self.daily_caffeine_limit_mg.is_finite() || self.daily_caffeine_limit_mg < 0.0 {
            bail!(
                "dailyCaffeineLimitMg must be a non-negative number, got {}",
                self.daily_caffeine_limit_mg
            );
        }
        Ok(())
    }

    /// Only meaningful on settings that passed [`BrewSettings::validate`].
    pub fn clamp_coffee_grams(&self, grams: f64) -> f64 {
        grams.clamp(self.min_coffee_grams, self.max_coffee_grams)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<BrewSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            BrewSettings::default()
        };
        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective settings, environment overrides included.
    pub fn current(&self) -> BrewSettings {
        let stored = match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        apply_env_overrides(stored)
    }

    /// Edits the stored settings and writes them back. Environment overrides
    /// are never persisted.
    pub fn update(&self, edit: impl FnOnce(&mut BrewSettings)) -> Result<BrewSettings> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut edited = guard.clone();
        edit(&mut edited);
        edited.validate()?;

        self.persist(&edited)?;
        *guard = edited.clone();
        Ok(apply_env_overrides(edited))
    }

    fn persist(&self, data: &BrewSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn apply_env_overrides(mut settings: BrewSettings) -> BrewSettings {
    let debug_mode = std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if debug_mode {
        settings.tick_interval_ms = DEBUG_TICK_INTERVAL_MS;
    }
    settings
}

/// Directory holding the journal database and settings file:
/// `BREWGUIDE_DATA_DIR` when set, otherwise the platform data directory.
pub fn data_dir() -> Result<PathBuf> {
    resolve_data_dir(std::env::var(DATA_DIR_ENV).ok(), dirs::data_dir())
}

fn resolve_data_dir(env_dir: Option<String>, platform_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = env_dir.filter(|dir| !dir.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    platform_dir
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            anyhow!("could not determine a data directory; set {DATA_DIR_ENV} or pass --data-dir")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.current();
        assert_eq!(settings.daily_caffeine_limit_mg, 400.0);
        assert_eq!(settings.clamp_coffee_grams(50.0), 30.0);
        assert_eq!(settings.clamp_coffee_grams(2.0), 8.0);
        assert_eq!(settings.clamp_coffee_grams(17.5), 17.5);
    }

    #[test]
    fn updates_persist_and_partial_files_fill_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        let updated = store
            .update(|settings| settings.daily_caffeine_limit_mg = 300.0)
            .unwrap();
        assert_eq!(updated.daily_caffeine_limit_mg, 300.0);
        assert_eq!(store.path(), path.as_path());

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.current().daily_caffeine_limit_mg, 300.0);

        fs::write(&path, r#"{ "maxCoffeeGrams": 40.0 }"#).unwrap();
        let partial = SettingsStore::new(path).unwrap().current();
        assert_eq!(partial.max_coffee_grams, 40.0);
        assert_eq!(partial.min_coffee_grams, 8.0);
    }

    #[test]
    fn rejects_unusable_coffee_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        for contents in [
            r#"{ "minCoffeeGrams": 30.0, "maxCoffeeGrams": 8.0 }"#,
            r#"{ "minCoffeeGrams": 0.0 }"#,
            r#"{ "minCoffeeGrams": -5.0 }"#,
            r#"{ "dailyCaffeineLimitMg": -1.0 }"#,
        ] {
            fs::write(&path, contents).unwrap();
            assert!(SettingsStore::new(path.clone()).is_err(), "accepted {contents}");
        }

        fs::write(&path, r#"{ "minCoffeeGrams": 12.0, "maxCoffeeGrams": 12.0 }"#).unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.current().clamp_coffee_grams(20.0), 12.0);

        assert!(store.update(|settings| settings.min_coffee_grams = 40.0).is_err());
        assert_eq!(store.current().min_coffee_grams, 12.0);

        let mut not_a_number = store.current();
        not_a_number.max_coffee_grams = f64::NAN;
        assert!(not_a_number.validate().is_err());
    }

    #[test]
    fn data_dir_prefers_override_then_platform_dir() {
        let platform = PathBuf::from("/home/ana/.local/share");

        let chosen = resolve_data_dir(Some("/srv/brew".into()), Some(platform.clone())).unwrap();
        assert_eq!(chosen, PathBuf::from("/srv/brew"));

        let chosen = resolve_data_dir(Some("  ".into()), Some(platform.clone())).unwrap();
        assert_eq!(chosen, platform.join("brewguide"));

        assert!(resolve_data_dir(None, None).is_err());
    }
}
