//! Interactive brew: drives a session from stdin and offers to log it.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{format_clock, progress_bar, resolve_dose, AppContext};
use crate::{
    brew::ScaledStep,
    db::models::{MAX_RATING, MIN_RATING},
    timer::{
        BrewSessionController, BrewSessionRunner, BrewSummary, IntervalClock, SessionEvent,
        SessionSnapshot,
    },
};

const BAR_WIDTH: usize = 24;
const HELP: &str = "Commands: n = next step, p = pause, r = resume, e = end brew";

pub(super) async fn run(ctx: &AppContext, key: &str, coffee: Option<f64>) -> Result<()> {
    let recipe = ctx.recipe(key)?.clone();
    let grams = resolve_dose(ctx, &recipe, coffee)?;
    let settings = ctx.settings.current();

    let (clock, ticks) = IntervalClock::channel(settings.tick_interval());
    let controller = BrewSessionController::new(recipe, grams, clock);

    let snapshot = controller.snapshot();
    println!("{}", snapshot.recipe_name);
    println!(
        "{:.0}g coffee · {:.0}ml water{}",
        snapshot.coffee_grams,
        snapshot.water_ml,
        snapshot
            .water_temperature_celsius
            .map(|t| format!(" · {t}°C"))
            .unwrap_or_default()
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handle = BrewSessionRunner::spawn(controller, ticks);
    let mut progress = handle.subscribe();
    let mut stdin_open = true;

    let summary = loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(SessionEvent::StepStarted { index, step }) => {
                    print_step(index, handle.snapshot().position.total, &step);
                }
                Some(SessionEvent::StepTimedOut { .. }) => {
                    println!();
                    println!("  Time's up. Press n for the next step.");
                }
                Some(SessionEvent::Completed(summary)) => break Some(summary),
                None => break None,
            },
            changed = progress.changed() => {
                if changed.is_err() {
                    break None;
                }
                let snapshot = progress.borrow_and_update().clone();
                render_progress(&snapshot);
            }
            line = lines.next_line(), if stdin_open => match line.context("failed to read stdin")? {
                Some(input) => match input.trim() {
                    "n" => { handle.advance().await?; }
                    "p" => { handle.pause().await?; }
                    "r" => { handle.resume().await?; }
                    "e" => { handle.end().await?; }
                    "" => {}
                    _ => println!("{HELP}"),
                },
                None => {
                    stdin_open = false;
                    handle.end().await?;
                }
            },
        }
    };

    handle.shutdown().await?;

    let Some(summary) = summary else {
        return Ok(());
    };
    print_summary(&summary);

    if stdin_open {
        offer_to_log(ctx, &summary, &mut lines).await?;
    }
    Ok(())
}

fn print_step(index: usize, total: usize, step: &ScaledStep) {
    println!();
    println!("Step {} of {}: {}", index + 1, total, step.name);
    println!("  {}", step.instruction);
    if step.is_open_ended() {
        println!("  No timer. Press n when ready.");
    }
}

fn render_progress(snapshot: &SessionSnapshot) {
    let Some(step) = &snapshot.step else {
        return;
    };
    if step.is_open_ended() || snapshot.is_complete {
        return;
    }

    let state = if snapshot.is_paused { " paused" } else { "" };
    print!(
        "\r  {} {} / {}  {} left{}   ",
        progress_bar(snapshot.progress_fraction, BAR_WIDTH),
        format_clock(snapshot.elapsed_seconds),
        format_clock(step.duration_seconds),
        format_clock(snapshot.remaining_seconds),
        state
    );
    // A failed flush only delays the redraw.
    let _ = std::io::stdout().flush();
}

fn print_summary(summary: &BrewSummary) {
    println!();
    let outcome = if summary.ended_early {
        "Brew ended early"
    } else {
        "Brew complete"
    };
    println!(
        "{outcome}: {} · {:.0}g coffee · {:.0}ml water · {} total",
        summary.recipe_name,
        summary.coffee_grams,
        summary.water_ml,
        format_clock(u32::try_from(summary.total_elapsed_seconds).unwrap_or(u32::MAX))
    );
}

async fn offer_to_log(
    ctx: &AppContext,
    summary: &BrewSummary,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    println!("Rate this brew {MIN_RATING}-{MAX_RATING} to save it to the journal (Enter to skip):");
    let Some(answer) = lines.next_line().await? else {
        return Ok(());
    };
    let rating = match answer.trim().parse::<u8>() {
        Ok(rating) if (MIN_RATING..=MAX_RATING).contains(&rating) => rating,
        _ => {
            println!("Not saved.");
            return Ok(());
        }
    };

    println!("Notes (optional):");
    let notes = lines.next_line().await?.unwrap_or_default();

    let db = ctx.open_database()?;
    let entry = db
        .append_brew_log(summary.log_draft().with_rating(rating).with_notes(notes))
        .await?;
    println!("Saved as {}.", entry.id);
    Ok(())
}
