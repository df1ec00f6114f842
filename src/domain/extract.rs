//! Rule-based extraction of a contract start date and tenure from free text.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::tenure::{number_word_value, Tenure, TenureUnit};

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Characters after a keyword within which a date or tenure counts as "near" it.
const KEYWORD_REACH: usize = 80;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static MONTH_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
    ))
    .unwrap()
});

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:day\s+of\s+)?({MONTHS})\.?,?\s+(\d{{4}})\b"
    ))
    .unwrap()
});

static SLASHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b").unwrap());

static START_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:effective|commenc\w*|made\s+on|dated|entered\s+into|start\w*)\b").unwrap()
});

static TERM_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:term|period|duration|tenure|for\s+a)\b").unwrap());

static TENURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,3}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|eighteen|twenty[- ]four|thirty[- ]six|thirty|sixty|ninety)\s*(?:\((\d{1,3})\)\s*)?-?\s*(year|month|week|day)s?\b",
    )
    .unwrap()
});

/// What could be recovered from a document. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub contract_date: Option<NaiveDate>,
    pub tenure: Option<Tenure>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.contract_date.is_none() && self.tenure.is_none()
    }
}

fn month_number(name: &str) -> Option<u32> {
    let key: String = name.to_lowercase().chars().take(3).collect();
    let month = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Every valid calendar date in `text`, with its byte offset, in text order.
pub fn find_dates(text: &str) -> Vec<(usize, NaiveDate)> {
    let mut found = Vec::new();

    for c in ISO_DATE.captures_iter(text) {
        let month = c[2].parse().unwrap_or(0);
        if let Some(date) = ymd(&c[1], month, &c[3]) {
            found.push((c.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for c in MONTH_FIRST.captures_iter(text) {
        if let Some(date) = month_number(&c[1]).and_then(|m| ymd(&c[3], m, &c[2])) {
            found.push((c.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for c in DAY_FIRST.captures_iter(text) {
        if let Some(date) = month_number(&c[2]).and_then(|m| ymd(&c[3], m, &c[1])) {
            found.push((c.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for c in SLASHED.captures_iter(text) {
        let first: u32 = c[1].parse().unwrap_or(0);
        let second: u32 = c[2].parse().unwrap_or(0);
        // Month first unless that cannot be a month
        let (month, day) = if first > 12 { (second, first) } else { (first, second) };
        if let Some(date) = c[3]
            .parse()
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        {
            found.push((c.get(0).map_or(0, |m| m.start()), date));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found
}

/// Every tenure phrase in `text`, with its byte offset, in text order.
pub fn find_tenures(text: &str) -> Vec<(usize, Tenure)> {
    TENURE
        .captures_iter(text)
        .filter_map(|c| {
            let amount = match c.get(2) {
                Some(paren) => paren.as_str().parse().ok()?,
                None => {
                    let raw = c[1].to_lowercase();
                    raw.parse().ok().or_else(|| number_word_value(&raw))?
                }
            };
            if amount == 0 {
                return None;
            }
            let unit = match c[3].to_lowercase().as_str() {
                "year" => TenureUnit::Year,
                "month" => TenureUnit::Month,
                "week" => TenureUnit::Week,
                _ => TenureUnit::Day,
            };
            Some((c.get(0).map_or(0, |m| m.start()), Tenure::new(amount, unit)))
        })
        .collect()
}

/// First candidate that starts within reach after any keyword match,
/// else the first candidate overall.
fn pick_near<T: Copy>(text: &str, keyword: &Regex, candidates: &[(usize, T)]) -> Option<T> {
    for kw in keyword.find_iter(text) {
        if let Some((_, value)) = candidates
            .iter()
            .find(|(pos, _)| *pos >= kw.end() && *pos - kw.end() <= KEYWORD_REACH)
        {
            return Some(*value);
        }
    }
    candidates.first().map(|(_, value)| *value)
}

pub fn extract(text: &str) -> Extraction {
    let dates = find_dates(text);
    let tenures = find_tenures(text);
    Extraction {
        contract_date: pick_near(text, &START_KEYWORD, &dates),
        tenure: pick_near(text, &TERM_KEYWORD, &tenures),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const SERVICE_AGREEMENT: &str = "Service Agreement - This agreement is made on February 10, 2024, \
        between Global Corp and Tech Innovations LLC. The contract term is 12 months from the \
        effective date. Services include software development and maintenance as detailed in Schedule A.";

    #[test]
    fn test_service_agreement() {
        let ex = extract(SERVICE_AGREEMENT);
        assert_eq!(ex.contract_date, Some(d("2024-02-10")));
        assert_eq!(ex.tenure, Some(Tenure::new(12, TenureUnit::Month)));
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(find_dates("signed 2023-07-01")[0].1, d("2023-07-01"));
        assert_eq!(find_dates("on Sept. 3rd, 2022")[0].1, d("2022-09-03"));
        assert_eq!(find_dates("this 5th day of March, 2021")[0].1, d("2021-03-05"));
        assert_eq!(find_dates("1 Jan 2020")[0].1, d("2020-01-01"));
        assert_eq!(find_dates("on 04/15/2024")[0].1, d("2024-04-15"));
        assert_eq!(find_dates("on 25/12/2024")[0].1, d("2024-12-25"));
    }

    #[test]
    fn test_invalid_calendar_dates_skipped() {
        assert!(find_dates("February 30, 2024 and 2023-13-01").is_empty());
    }

    #[test]
    fn test_start_keyword_preferred_over_first_date() {
        let text = "Signed January 2, 2024. This agreement shall commence on March 1, 2024.";
        assert_eq!(extract(text).contract_date, Some(d("2024-03-01")));
    }

    #[test]
    fn test_first_date_when_no_keyword() {
        let text = "Acme / Globex, 2024-05-06. Renewal reviewed 2024-06-01.";
        assert_eq!(extract(text).contract_date, Some(d("2024-05-06")));
    }

    #[test]
    fn test_tenure_forms() {
        let t = find_tenures("for a period of two (2) years");
        assert_eq!(t[0].1, Tenure::new(2, TenureUnit::Year));
        let t = find_tenures("a 24-month engagement");
        assert_eq!(t[0].1, Tenure::new(24, TenureUnit::Month));
        let t = find_tenures("thirty (30) days");
        assert_eq!(t[0].1, Tenure::new(30, TenureUnit::Day));
    }

    #[test]
    fn test_term_keyword_preferred_over_notice_period() {
        let text = "Either party may terminate with 30 days notice. The term of this agreement is 3 years.";
        // "term" in "terminate" is not a word match; the keyword is the later "term"
        assert_eq!(extract(text).tenure, Some(Tenure::new(3, TenureUnit::Year)));
    }

    #[test]
    fn test_nothing_found() {
        let ex = extract("Lorem ipsum dolor sit amet.");
        assert!(ex.is_empty());
    }
}
