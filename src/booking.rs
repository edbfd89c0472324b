use std::sync::Arc;

use tracing::info;

use crate::availability::{self, DaySlots};
use crate::error::{BookingError, Result};
use crate::ledger::{Changes, Ledger, NewAppointment};
use crate::models::{Appointment, AppointmentUpdate, BookingRequest, Settings};
use crate::notify::{self, Event, Notifier};
use crate::settings::{self, SettingsStore};

/// Orchestrates availability, validation and the ledger for each request.
/// Settings are loaded inside every call, never cached across calls.
#[derive(Clone)]
pub struct BookingService {
    ledger: Ledger,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    slot_minutes: u32,
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BookingError::invalid(format!("Campo obbligatorio: {field}")));
    }
    Ok(value.to_string())
}

fn optional_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl BookingService {
    pub fn new(
        ledger: Ledger,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
        slot_minutes: u32,
    ) -> Self {
        Self {
            ledger,
            settings,
            notifier,
            slot_minutes,
        }
    }

    pub async fn free_slots(&self, date: &str) -> Result<DaySlots> {
        let (_, date) = availability::parse_date(date)?;
        let settings = self.settings.load().await?;
        let booked = self.ledger.booked_times(&date).await?;
        availability::compute_free_slots(&date, &settings, &booked, self.slot_minutes)
    }

    /// Check a canonical (date, time) against the current opening hours.
    fn check_open(&self, settings: &Settings, date: &str, time: &str) -> Result<()> {
        let hours = availability::hours_for(date, settings)?.map_err(BookingError::ClosedDay)?;
        if !availability::day_slots(hours, self.slot_minutes)
            .iter()
            .any(|s| s == time)
        {
            return Err(BookingError::invalid(format!(
                "Orario fuori dall'orario di apertura: {time}"
            )));
        }
        Ok(())
    }

    pub async fn book(&self, req: BookingRequest) -> Result<Appointment> {
        let client = required("nome", &req.nome)?;
        let service = required("servizio", &req.servizio)?;
        let (_, date) = availability::parse_date(&req.data)?;
        let time = availability::normalize_time(&req.ora)?;

        let settings = self.settings.load().await?;
        self.check_open(&settings, &date, &time)?;

        let appt = self
            .ledger
            .try_book(NewAppointment {
                client,
                phone: req.telefono.trim().to_string(),
                service,
                date,
                time,
                note: optional_note(req.note),
            })
            .await?;

        info!(
            "Booked #{} for {} on {} at {} ({})",
            appt.id, appt.client, appt.date, appt.time, appt.service
        );
        notify::dispatch(Arc::clone(&self.notifier), Event::Booked(appt.clone()));
        Ok(appt)
    }

    pub async fn update(&self, id: i64, upd: AppointmentUpdate) -> Result<Appointment> {
        let date = upd
            .data
            .as_deref()
            .map(availability::parse_date)
            .transpose()?
            .map(|(_, d)| d);
        let time = upd
            .ora
            .as_deref()
            .map(availability::normalize_time)
            .transpose()?;

        let current = self.ledger.get(id).await?;
        let moved = date.as_ref().is_some_and(|d| *d != current.date)
            || time.as_ref().is_some_and(|t| *t != current.time);
        if moved {
            let settings = self.settings.load().await?;
            let target_date = date.as_deref().unwrap_or(&current.date);
            let target_time = time.as_deref().unwrap_or(&current.time);
            self.check_open(&settings, target_date, target_time)?;
        }

        let changes = Changes {
            client: upd.nome.as_deref().map(|v| required("nome", v)).transpose()?,
            phone: upd.telefono.map(|p| p.trim().to_string()),
            service: upd
                .servizio
                .as_deref()
                .map(|v| required("servizio", v))
                .transpose()?,
            date,
            time,
            note: upd.note.map(|n| optional_note(Some(n))),
        };

        let appt = self.ledger.update(id, changes).await?;
        info!(
            "Updated #{}: {} on {} at {}",
            appt.id, appt.client, appt.date, appt.time
        );
        Ok(appt)
    }

    pub async fn cancel(&self, id: i64) -> Result<Appointment> {
        let appt = self.ledger.delete(id).await?;
        info!("Cancelled #{} ({} on {} at {})", appt.id, appt.client, appt.date, appt.time);
        notify::dispatch(Arc::clone(&self.notifier), Event::Cancelled(appt.clone()));
        Ok(appt)
    }

    pub async fn list(&self) -> Result<Vec<Appointment>> {
        self.ledger.list_all().await
    }

    pub async fn settings(&self) -> Result<Settings> {
        Ok(self.settings.load().await?)
    }

    pub async fn replace_settings(&self, new: Settings) -> Result<Settings> {
        let new = settings::sanitize(new)?;
        self.settings.save(&new).await?;
        info!("Settings updated ({} holidays)", new.holidays.len());
        Ok(new)
    }
}
