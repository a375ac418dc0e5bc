use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_rating},
    models::{BrewLogEntry, NewBrewLog, MAX_RATING, MIN_RATING},
};

const SELECT_COLUMNS: &str = "SELECT id, brewed_at, recipe_name, method_label, coffee_grams, water_ml,
        bean_name, grind_size, notes, rating
 FROM brew_logs";

// Fixed-width UTC timestamps keep lexical order equal to time order.
fn to_db_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_brew_log(row: &Row) -> Result<BrewLogEntry> {
    let brewed_at: String = row.get("brewed_at")?;

    Ok(BrewLogEntry {
        id: row.get("id")?,
        brewed_at: parse_datetime(&brewed_at, "brewed_at")?,
        recipe_name: row.get("recipe_name")?,
        method_label: row.get("method_label")?,
        coffee_grams: row.get("coffee_grams")?,
        water_ml: row.get("water_ml")?,
        bean_name: row.get("bean_name")?,
        grind_size: row.get("grind_size")?,
        notes: row.get("notes")?,
        rating: to_rating(row.get("rating")?)?,
    })
}

fn validate(draft: &NewBrewLog) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&draft.rating) {
        bail!(
            "rating must be between {} and {}, got {}",
            MIN_RATING,
            MAX_RATING,
            draft.rating
        );
    }
    if !draft.coffee_grams.is_finite() || draft.coffee_grams < 0.0 {
        bail!("invalid coffee mass {}", draft.coffee_grams);
    }
    if !draft.water_ml.is_finite() || draft.water_ml < 0.0 {
        bail!("invalid water volume {}", draft.water_ml);
    }
    Ok(())
}

impl Database {
    /// Stores a brew and returns it as saved, with its new id.
    pub async fn append_brew_log(&self, draft: NewBrewLog) -> Result<BrewLogEntry> {
        let draft = draft.normalized();
        validate(&draft)?;

        self.execute(move |conn| {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO brew_logs (id, brewed_at, recipe_name, method_label, coffee_grams,
                    water_ml, bean_name, grind_size, notes, rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    id,
                    to_db_time(&draft.brewed_at),
                    draft.recipe_name,
                    draft.method_label,
                    draft.coffee_grams,
                    draft.water_ml,
                    draft.bean_name,
                    draft.grind_size,
                    draft.notes,
                    draft.rating,
                    to_db_time(&Utc::now()),
                ],
            )
            .context("failed to insert brew log")?;

            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => row_to_brew_log(row),
                None => Err(anyhow!("brew log not found after insert")),
            }
        })
        .await
    }

    /// Removes one entry. Fails when no entry has `id`.
    pub async fn delete_brew_log(&self, id: &str) -> Result<()> {
        let id = id.trim().to_string();
        self.execute(move |conn| {
            let affected = conn
                .execute("DELETE FROM brew_logs WHERE id = ?1", params![id])
                .context("failed to delete brew log")?;
            if affected == 0 {
                bail!("no brew log with id {id}");
            }
            Ok(())
        })
        .await
    }

    /// All entries, newest first.
    pub async fn list_brew_logs(&self) -> Result<Vec<BrewLogEntry>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY brewed_at DESC, created_at DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_brew_log(row)?);
            }

            Ok(entries)
        })
        .await
    }

    /// Entries brewed in `[from, to)`, newest first.
    pub async fn list_brew_logs_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BrewLogEntry>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE brewed_at >= ?1 AND brewed_at < ?2
                 ORDER BY brewed_at DESC, created_at DESC"
            ))?;

            let mut rows = stmt.query(params![to_db_time(&from), to_db_time(&to)])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_brew_log(row)?);
            }

            Ok(entries)
        })
        .await
    }
}
