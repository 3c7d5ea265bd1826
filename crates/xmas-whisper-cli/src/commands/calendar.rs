use xmas_whisper_core::{clock, CalendarError, CardContent, DayStatus};

use crate::app::{runtime, App};

pub fn show(debug_day: Option<i64>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let calendar = app.calendar(debug_day)?;
    let unlocked = calendar.unlocked_day();
    let tiles = calendar.tiles();

    if json {
        let out = serde_json::json!({
            "unlocked_day": unlocked,
            "progress": clock::workshop_progress(unlocked),
            "days": tiles,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let progress = clock::workshop_progress(unlocked);
    println!("DECEMBER  santa's workshop {progress:.0}% ready");
    if clock::is_christmas(unlocked) {
        println!("配送完了！メリークリスマス！");
    }
    for row in tiles.chunks(5) {
        let line: Vec<String> = row
            .iter()
            .map(|t| {
                let label = match t.status {
                    DayStatus::Locked => "LOCKED",
                    DayStatus::Open => "OPEN",
                    DayStatus::Opened => "OPENED",
                };
                let marker = if t.is_today { '*' } else { ' ' };
                format!("{marker}{:>2} {label:<6}", t.day)
            })
            .collect();
        println!("{}", line.join("  "));
    }
    Ok(())
}

pub fn open(debug_day: Option<i64>, day: i64, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let calendar = app.calendar(debug_day)?;
    if !calendar.profile().is_onboarded() {
        return Err(CalendarError::MissingProfile.into());
    }

    let card = runtime()?.block_on(calendar.open_day(day))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        print_card(day, &card);
    }
    Ok(())
}

fn print_card(day: i64, card: &CardContent) {
    println!("Day {day}");
    println!();
    println!("  {}", card.quote_original);
    println!("  {}", card.quote_translated);
    println!();
    println!("  -- {}, {}", card.source, card.work_title);
    if card.image_url.starts_with("data:") {
        println!("  [embedded image, {} bytes]", card.image_url.len());
    } else {
        println!("  {}", card.image_url);
    }
}
