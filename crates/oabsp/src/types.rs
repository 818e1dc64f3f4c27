use std::fmt::Display;

use serde::Serialize;

/// Separator used when a multi-valued field is flattened into one cell.
pub const FIELD_SEPARATOR: &str = "; ";

/// Column headers, in export order. The last one is only emitted when at
/// least one row carries an error.
pub static COLUMNS: [&str; 8] = [
    "Subseção",
    "Cidade",
    "Telefone",
    "Whatsapp",
    "E-mail",
    "Endereço",
    "URL",
    "Erro",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub chapter_name: String,
    pub city: String,
    pub phones: Vec<String>,
    pub whatsapp: Vec<String>,
    pub emails: Vec<String>,
    pub address: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactRecord {
    /// Placeholder row for a page that could not be fetched or parsed.
    pub fn failed(url: impl Into<String>, error: impl Display) -> Self {
        Self {
            url: url.into(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn phones_joined(&self) -> String {
        self.phones.join(FIELD_SEPARATOR)
    }

    pub fn whatsapp_joined(&self) -> String {
        self.whatsapp.join(FIELD_SEPARATOR)
    }

    pub fn emails_joined(&self) -> String {
        self.emails.join(FIELD_SEPARATOR)
    }

    /// Cell values in [`COLUMNS`] order.
    pub fn row(&self, include_error: bool) -> Vec<String> {
        let mut row = vec![
            self.chapter_name.clone(),
            self.city.clone(),
            self.phones_joined(),
            self.whatsapp_joined(),
            self.emails_joined(),
            self.address.clone(),
            self.url.clone(),
        ];
        if include_error {
            row.push(self.error.clone().unwrap_or_default());
        }
        row
    }
}

impl Display for ContactRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "{} (error: {})", self.url, error);
        }
        write!(f, "{}", self.chapter_name)?;
        if !self.city.is_empty() {
            write!(f, " [{}]", self.city)?;
        }
        write!(f, " - {}", self.url)
    }
}

/// Headers for a table holding `records`.
pub fn columns_for(records: &[ContactRecord]) -> &'static [&'static str] {
    if records.iter().any(ContactRecord::is_failed) {
        &COLUMNS
    } else {
        &COLUMNS[..COLUMNS.len() - 1]
    }
}
