use chrono::{DateTime, Locale, Utc};

const LOCALE: Locale = Locale::pt_BR;

/// `dd MMM yyyy` with pt-BR month abbreviations, e.g. `15 mar 2021`.
pub fn publication_date(date: &DateTime<Utc>) -> String {
    date.format_localized("%d %b %Y", LOCALE).to_string()
}

/// Edit stamp shown under the article header.
pub fn edited_stamp(date: &DateTime<Utc>) -> String {
    format!(
        "* editado em {}, às {}",
        publication_date(date),
        date.format_localized("%H:%M", LOCALE)
    )
}
