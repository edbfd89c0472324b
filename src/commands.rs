use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::booking::BookingService;
use crate::ledger::Ledger;
use crate::models::{Appointment, Config};
use crate::notify::LogNotifier;
use crate::settings::JsonFileSettings;

async fn open_service(cfg: &Config) -> Result<BookingService> {
    let ledger = Ledger::connect(&cfg.storage.database_url)
        .await
        .with_context(|| format!("Failed to open {}", cfg.storage.database_url))?;
    let settings = Arc::new(JsonFileSettings::new(&cfg.storage.settings_path));
    Ok(BookingService::new(
        ledger,
        settings,
        Arc::new(LogNotifier),
        cfg.booking.slot_minutes,
    ))
}

/// Print the free slots for a date, or why the business is closed.
pub async fn run_slots(cfg: &Config, date: &str, verbose: bool) -> Result<()> {
    let service = open_service(cfg).await?;
    let day = service.free_slots(date).await?;

    if verbose {
        let settings = service.settings().await?;
        println!("{}", serde_json::to_string_pretty(&settings)?);
    }

    match day.closure {
        Some(closure) => println!("{}: {}", date, closure.reason()),
        None if day.slots.is_empty() => println!("{}: nessun orario disponibile", date),
        None => {
            println!("Orari disponibili per {}:\n", date);
            for slot in &day.slots {
                println!("  {}", slot);
            }
        }
    }
    Ok(())
}

fn print_appointment(a: &Appointment) {
    print!(
        "  #{:<4} {} {}  {} — {}",
        a.id, a.date, a.time, a.client, a.service
    );
    if !a.phone.is_empty() {
        print!(" ({})", a.phone);
    }
    if let Some(note) = &a.note {
        print!(" [{}]", note);
    }
    println!();
}

/// Print every stored appointment in (date, time) order.
pub async fn run_appointments(cfg: &Config, verbose: bool) -> Result<()> {
    let service = open_service(cfg).await?;
    let appointments = service.list().await?;

    if verbose {
        println!("{}", serde_json::to_string_pretty(&appointments)?);
        return Ok(());
    }

    if appointments.is_empty() {
        println!("Nessun appuntamento.");
        return Ok(());
    }

    info!("{} appointments", appointments.len());
    println!("Appuntamenti:\n");
    for a in &appointments {
        print_appointment(a);
    }
    Ok(())
}
