use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub admin: AdminConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
    pub settings_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://prenotazioni.db".into(),
            settings_path: "settings.json".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BookingConfig {
    pub slot_minutes: u32,
    pub business_name: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            business_name: "Salone".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Opening hours for one weekday. `start`/`end` are ignored when `open` is false.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DayHours {
    pub open: bool,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl DayHours {
    pub fn open(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            open: true,
            start,
            end,
        }
    }

    pub fn closed() -> Self {
        Self {
            open: false,
            start: NaiveTime::default(),
            end: NaiveTime::default(),
        }
    }
}

/// Keyed by lowercase English weekday name ("monday" .. "sunday").
pub type WeeklyHours = BTreeMap<String, DayHours>;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    pub weekly: WeeklyHours,
    #[serde(default)]
    pub holidays: Vec<String>,
}

impl Settings {
    pub fn is_holiday(&self, date: &str) -> bool {
        self.holidays.iter().any(|h| h == date)
    }
}

impl Default for Settings {
    fn default() -> Self {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::default());
        let seven_pm = NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::default());
        let mut weekly = WeeklyHours::new();
        weekly.insert("monday".into(), DayHours::closed());
        for day in ["tuesday", "wednesday", "thursday", "friday", "saturday"] {
            weekly.insert(day.into(), DayHours::open(nine, seven_pm));
        }
        weekly.insert("sunday".into(), DayHours::closed());
        Self {
            weekly,
            holidays: Vec::new(),
        }
    }
}

/// A stored appointment. JSON field names follow the public API.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, sqlx::FromRow)]
pub struct Appointment {
    pub id: i64,
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "servizio")]
    pub service: String,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "ora")]
    pub time: String,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: String,
}

/// Incoming booking from the public page.
#[derive(Debug, Deserialize, Clone)]
pub struct BookingRequest {
    pub nome: String,
    #[serde(default)]
    pub telefono: String,
    pub servizio: String,
    pub data: String,
    pub ora: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Partial update from the admin panel; absent fields keep their value.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppointmentUpdate {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub servizio: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub ora: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Accepts "HH:MM" or "HH:MM:SS", always writes "HH:MM".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Option<NaiveTime> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(de)?;
        parse(&s).ok_or_else(|| de::Error::custom(format!("invalid time '{s}', expected HH:MM")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_hours_round_trip_as_hhmm() {
        let json = r#"{"open":true,"start":"9:00","end":"19:00:00"}"#;
        let day: DayHours = serde_json::from_str(json).unwrap();
        assert_eq!(day.start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let out = serde_json::to_string(&day).unwrap();
        assert_eq!(out, r#"{"open":true,"start":"09:00","end":"19:00"}"#);
    }

    #[test]
    fn day_hours_rejects_garbage_time() {
        let json = r#"{"open":true,"start":"nine","end":"19:00"}"#;
        assert!(serde_json::from_str::<DayHours>(json).is_err());
    }

    #[test]
    fn default_settings_close_monday_and_sunday() {
        let s = Settings::default();
        assert!(!s.weekly["monday"].open);
        assert!(!s.weekly["sunday"].open);
        assert!(s.weekly["tuesday"].open);
        assert_eq!(s.weekly.len(), 7);
        assert!(s.holidays.is_empty());
    }

    #[test]
    fn appointment_serializes_with_api_names() {
        let appt = Appointment {
            id: 1,
            client: "Anna".into(),
            phone: "333".into(),
            service: "Taglio".into(),
            date: "2024-06-04".into(),
            time: "10:00".into(),
            note: None,
            created_at: "2024-06-01T10:00:00+00:00".into(),
        };
        let v = serde_json::to_value(&appt).unwrap();
        assert_eq!(v["cliente"], "Anna");
        assert_eq!(v["ora"], "10:00");
        assert_eq!(v["data"], "2024-06-04");
    }

    #[test]
    fn config_sections_default_when_missing() {
        let cfg: Config = toml::from_str(
            r#"
            [admin]
            username = "admin"
            password = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.booking.slot_minutes, 30);
        assert_eq!(cfg.storage.settings_path, "settings.json");
        assert!(cfg.telegram.is_none());
    }
}
