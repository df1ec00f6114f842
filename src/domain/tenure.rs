//! Contract tenure: a duration such as "12 months" and the expiry it implies.

use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"\d+").unwrap();
    static ref NUMBER_WORD: Regex = Regex::new(
        r"\b(one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|eighteen|twenty[- ]four|thirty[- ]six|thirty|sixty|ninety)\b"
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenureUnit {
    Day,
    Week,
    Month,
    Year,
}

impl TenureUnit {
    fn noun(&self) -> &'static str {
        match self {
            TenureUnit::Day => "day",
            TenureUnit::Week => "week",
            TenureUnit::Month => "month",
            TenureUnit::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenure {
    pub amount: u32,
    pub unit: TenureUnit,
}

pub fn number_word_value(word: &str) -> Option<u32> {
    let value = match word.replace(' ', "-").as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "eighteen" => 18,
        "twenty-four" => 24,
        "thirty" => 30,
        "thirty-six" => 36,
        "sixty" => 60,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

impl Tenure {
    pub fn new(amount: u32, unit: TenureUnit) -> Self {
        Self { amount, unit }
    }

    /// Parse free-form tenure text ("12 months", "1 Year", "a term of two years").
    ///
    /// The unit is chosen by the first of year, month, week, day found in
    /// the text, in that order; the amount is the first integer, or the
    /// first number word when no digits are present.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let unit = [
            TenureUnit::Year,
            TenureUnit::Month,
            TenureUnit::Week,
            TenureUnit::Day,
        ]
        .into_iter()
        .find(|unit| lower.contains(unit.noun()))?;

        let amount = match FIRST_NUMBER.find(&lower) {
            Some(m) => m.as_str().parse().ok()?,
            None => NUMBER_WORD
                .captures(&lower)
                .and_then(|c| number_word_value(&c[1]))?,
        };
        if amount == 0 {
            return None;
        }
        Some(Self { amount, unit })
    }

    /// Date the contract lapses when it starts on `start`.
    ///
    /// Month and year arithmetic clamps to the last day of a shorter month.
    pub fn expiry_from(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            TenureUnit::Day => start.checked_add_days(Days::new(u64::from(self.amount))),
            TenureUnit::Week => start.checked_add_days(Days::new(u64::from(self.amount) * 7)),
            TenureUnit::Month => start.checked_add_months(Months::new(self.amount)),
            TenureUnit::Year => start.checked_add_months(Months::new(self.amount.checked_mul(12)?)),
        }
    }
}

impl std::fmt::Display for Tenure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plural = if self.amount == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.amount, self.unit.noun(), plural)
    }
}

/// Calendar date of an ISO date or date-time (`2024-02-10`, `2024-02-10T00:00:00`,
/// `2024-02-10T09:30:00+02:00`).
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Start date plus tenure text, both as strings, to an ISO expiry date.
pub fn calculate_expiry_date(start_date: &str, tenure: &str) -> Option<String> {
    let start = parse_iso_date(start_date)?;
    let expiry = Tenure::parse(tenure)?.expiry_from(start)?;
    Some(expiry.format("%Y-%m-%d").to_string())
}
