//! Interactive meal-logging session.
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;

use mealscan_core::session::SessionContext;
use mealscan_core::types::MealType;
use mealscan_pipeline::MealPipeline;

use crate::render;
use crate::spinner;

fn show_help() {
    println!("Commands:");
    println!("  /detect <image>        Analyze a photo and propose foods");
    println!("  /options [category..]  List foods for manual selection");
    println!("  /select a,b,...        Choose foods (empty keeps the detected ones)");
    println!("  /calc <meal>           Calculate the selection (朝食/昼食/夕食/おやつ)");
    println!("  /save                  Save the last calculated meal");
    println!("  /toggle                Switch daily / last-meal view");
    println!("  /report                Show progress against the target");
    println!("  /reset                 Reset today's totals");
    println!("  /history               Latest saved meal per meal type");
    println!("  /help, /h              Show this help");
    println!("  /quit, /q              Exit");
}

/// Split a selection on ASCII or ideographic commas.
fn parse_selection(arg: &str) -> Vec<String> {
    arg.split([',', '、']).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

pub async fn run_session(pipeline: &MealPipeline, user_id: String) -> Result<()> {
    let today = chrono::Utc::now().date_naive();
    let (mut session, restored) = pipeline.restore_day(SessionContext::new(user_id), today).await;
    let store = if pipeline.is_connected() { "connected" } else { "disconnected" };
    println!("user: {}  analyzer: {}  store: {store}", session.user_id, pipeline.analyzer_name().unwrap_or("none"));
    println!("{}", render::history(&restored));
    println!("Type /help for commands.\n");

    let mut selection: Vec<String> = Vec::new();
    loop {
        print!("meal> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 { break; }
        let input = input.trim();
        if input.is_empty() { continue; }

        let (command, arg) = input.split_once(' ').map_or((input, ""), |(c, a)| (c, a.trim()));
        match command {
            "/detect" | "/d" => {
                if arg.is_empty() { println!("Usage: /detect <image>"); continue; }
                let bytes = match std::fs::read(Path::new(arg)).with_context(|| format!("reading {arg}")) {
                    Ok(b) => b,
                    Err(e) => { println!("{e:#}"); continue; }
                };
                let pb = spinner("Analyzing image...");
                let (next, outcome) = pipeline.detect(session, &bytes).await;
                pb.finish_and_clear();
                session = next;
                selection = session.detected.foods().to_vec();
                println!("{}", render::detection(&outcome));
            }
            "/options" | "/o" => {
                let categories: Vec<&str> = arg.split_whitespace().collect();
                println!("{}", pipeline.manual_options(&categories).join(", "));
            }
            "/select" | "/s" => {
                if !arg.is_empty() { selection = parse_selection(arg); }
                let unknown: Vec<&String> = selection.iter().filter(|f| !pipeline.catalog().contains(f)).collect();
                println!("selected: {}", selection.join(", "));
                if !unknown.is_empty() {
                    println!("not in catalog (ignored): {}", unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "));
                }
            }
            "/calc" | "/c" => {
                let meal_type = match arg.parse::<MealType>() {
                    Ok(m) => m,
                    Err(e) => { println!("{e}"); continue; }
                };
                if selection.is_empty() { println!("Nothing selected. Use /detect or /select first."); continue; }
                let (next, meal) = pipeline.calculate(session, &selection, meal_type);
                session = next;
                let Some(meal) = meal else { println!("{}", render::NO_CATALOG_FOODS); continue; };
                println!("{meal_type}: {}", render::metrics_line(&meal));
                println!("{}", render::report(&pipeline.report(&session)));
            }
            "/save" => {
                let (next, outcome) = pipeline.save(session).await;
                session = next;
                println!("{}", render::save(&outcome));
                if matches!(outcome, mealscan_pipeline::SaveOutcome::Saved(_)) {
                    println!("{}", render::history(&pipeline.history(&session).await));
                }
            }
            "/toggle" | "/t" => {
                session = pipeline.toggle_view(session);
                println!("{}", render::report(&pipeline.report(&session)));
            }
            "/report" | "/r" => println!("{}", render::report(&pipeline.report(&session))),
            "/reset" => {
                session = pipeline.reset_day(session);
                selection.clear();
                println!("Today's totals were reset.");
            }
            "/history" => println!("{}", render::history(&pipeline.history(&session).await)),
            "/help" | "/h" => show_help(),
            "/quit" | "/q" | "quit" | "exit" => break,
            _ => println!("Unknown command '{command}'. Type /help for commands."),
        }
    }
    if session.pending_meal().is_some() {
        println!("Note: the last calculated meal was not saved.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_selection;

    #[test]
    fn selection_accepts_both_comma_styles() {
        assert_eq!(parse_selection("ごはん, 味噌汁、 鮭 ,"), vec!["ごはん", "味噌汁", "鮭"]);
    }
}
