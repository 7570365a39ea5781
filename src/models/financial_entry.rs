use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub id: String,
    pub tenant_id: String,
    pub entry_type: EntryType,
    pub description: String,
    pub amount_cents: i64,
    pub entry_date: NaiveDate,
    pub appointment_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "expense" => EntryType::Expense,
            _ => EntryType::Income,
        }
    }
}
