use leptos::prelude::*;

use crate::availability::weekday_key;
use crate::models::{Appointment, DayHours, Settings};

const STYLE: &str = include_str!("../style.css");
const BOOKING_JS: &str = include_str!("booking.js");
const ADMIN_JS: &str = include_str!("admin.js");

const DAYS: [(chrono::Weekday, &str); 7] = [
    (chrono::Weekday::Mon, "Lunedì"),
    (chrono::Weekday::Tue, "Martedì"),
    (chrono::Weekday::Wed, "Mercoledì"),
    (chrono::Weekday::Thu, "Giovedì"),
    (chrono::Weekday::Fri, "Venerdì"),
    (chrono::Weekday::Sat, "Sabato"),
    (chrono::Weekday::Sun, "Domenica"),
];

pub(super) fn render_booking_page(business_name: &str) -> String {
    let title = business_name.to_string();
    let heading = business_name.to_string();

    view! {
        <html lang="it">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>{title}</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <h1>{heading}</h1>
                <section>
                    <h2>"Prenota un appuntamento"</h2>
                    <form id="booking">
                        <label>"Nome" <input type="text" name="nome" /></label>
                        <label>"Telefono" <input type="tel" name="telefono" /></label>
                        <label>"Servizio" <input type="text" name="servizio" /></label>
                        <label>"Data" <input type="date" name="data" /></label>
                        <label>"Orario" <select name="ora"></select></label>
                        <p class="empty" id="slots-message"></p>
                        <label>"Note" <textarea name="note"></textarea></label>
                        <button type="submit">"Prenota"</button>
                    </form>
                    <p id="result"></p>
                </section>
                <script inner_html=BOOKING_JS></script>
            </body>
        </html>
    }
    .to_html()
}

pub(super) fn render_admin_page(
    business_name: &str,
    appointments: &[Appointment],
    settings: &Settings,
) -> String {
    let title = format!("{business_name} - Amministrazione");
    let heading = title.clone();
    let appointments_html = render_appointments_table(appointments);
    let hours_html = render_hours_table(settings);
    let holidays = settings.holidays.join("\n");
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    view! {
        <html lang="it">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>{title}</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <h1>{heading}</h1>
                <p class="timestamp">"Aggiornato: " {now}</p>
                <section>
                    <h2>"Appuntamenti"</h2>
                    <div inner_html=appointments_html />
                </section>
                <section>
                    <h2>"Orari settimanali"</h2>
                    <form id="settings">
                        <div inner_html=hours_html />
                        <h3>"Ferie (una data per riga, AAAA-MM-GG)"</h3>
                        <textarea name="holidays" rows="6">{holidays}</textarea>
                        <button type="submit">"Salva impostazioni"</button>
                    </form>
                    <p id="settings-result"></p>
                </section>
                <script inner_html=ADMIN_JS></script>
            </body>
        </html>
    }
    .to_html()
}

fn render_appointments_table(appointments: &[Appointment]) -> String {
    if appointments.is_empty() {
        return view! { <p class="empty">"Nessun appuntamento."</p> }.to_html();
    }

    let rows_html: String = appointments
        .iter()
        .map(|a| {
            let id = a.id.to_string();
            let date = a.date.clone();
            let time = a.time.clone();
            let client = a.client.clone();
            let phone = a.phone.clone();
            let service = a.service.clone();
            let note = a.note.clone().unwrap_or_default();

            view! {
                <tr>
                    <td>{date}</td>
                    <td>{time}</td>
                    <td>{client}</td>
                    <td>{phone}</td>
                    <td>{service}</td>
                    <td>{note}</td>
                    <td><button class="delete" value=id>"Cancella"</button></td>
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <table>
            <thead>
                <tr>
                    <th>"Data"</th>
                    <th>"Ora"</th>
                    <th>"Cliente"</th>
                    <th>"Telefono"</th>
                    <th>"Servizio"</th>
                    <th>"Note"</th>
                    <th></th>
                </tr>
            </thead>
            <tbody inner_html=rows_html />
        </table>
    }
    .to_html()
}

fn render_hours_table(settings: &Settings) -> String {
    let rows_html: String = DAYS
        .iter()
        .map(|(weekday, label)| {
            let key = weekday_key(*weekday).to_string();
            let hours = settings
                .weekly
                .get(&key)
                .cloned()
                .unwrap_or_else(DayHours::closed);
            let label = label.to_string();
            let start = hours.start.format("%H:%M").to_string();
            let end = hours.end.format("%H:%M").to_string();
            let open_name = format!("{key}-open");
            let start_name = format!("{key}-start");
            let end_name = format!("{key}-end");
            let open = hours.open;
            let css = if open { "status-booked" } else { "status-pending" }.to_string();

            view! {
                <tr class=css>
                    <td>{label}</td>
                    <td><input type="checkbox" name=open_name checked=open /></td>
                    <td><input type="time" name=start_name value=start /></td>
                    <td><input type="time" name=end_name value=end /></td>
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <table>
            <thead>
                <tr><th>"Giorno"</th><th>"Aperto"</th><th>"Apertura"</th><th>"Chiusura"</th></tr>
            </thead>
            <tbody inner_html=rows_html />
        </table>
    }
    .to_html()
}
