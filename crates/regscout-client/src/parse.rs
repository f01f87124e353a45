//! Detail-page parsing into structured records.
//!
//! Detail pages lay most fields out as `.section-row` pairs of
//! `.field-title` / `.field-entry`; the name, profession, registration
//! number and divisions have dedicated elements. Parsing is lenient:
//! anything that can't be found stays `None`, and each extractor carries
//! the fallbacks the live pages have needed.

use crate::record::PractitionerRecord;
use crate::traits::RecordParser;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;

static SECTION_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".section-row").expect("valid selector"));
static FIELD_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".field-title").expect("valid selector"));
static FIELD_ENTRY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".field-entry").expect("valid selector"));
static PRACTITIONER_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.practitioner-name").expect("valid selector"));
static PAGE_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static REG_NUMBER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.reg-number").expect("valid selector"));
static PROFESSION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.practitioner-profession").expect("valid selector"));
static REG_TYPES: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".reg-types span[class^=\"reg-type\"]").expect("valid selector"));

static REG_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]{3}\d{10})").expect("valid regex"));
static EXPIRY_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").expect("valid regex"));
static STATUS_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    ["Registered", "Suspended", "Cancelled", "Non-practising"]
        .into_iter()
        .map(|status| {
            let pattern =
                Regex::new(&format!(r"(?i)\b{status}\b")).expect("valid regex");
            (status, pattern)
        })
        .collect()
});

/// Honorifics stripped off the front of the display name, checked in order.
const NAME_TITLES: [&str; 8] = [
    "Dr",
    "Mr",
    "Mrs",
    "Ms",
    "Miss",
    "Prof",
    "Professor",
    "Associate Professor",
];

/// CSS-selector parser for registry detail pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailPageParser;

impl DetailPageParser {
    /// Create a parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for DetailPageParser {
    fn parse(&self, html: &str) -> PractitionerRecord {
        let document = Html::parse_document(html);
        let fields = build_field_map(&document);
        let mut record = PractitionerRecord::default();

        extract_name(&document, &mut record);
        extract_reg_id(&document, &fields, &mut record);
        extract_profession(&document, &fields, &mut record);
        extract_divisions(&document, &fields, &mut record);
        extract_status(&document, &fields, &mut record);
        extract_dates(&fields, &mut record);
        extract_endorsement(&fields, &mut record);
        extract_location(&fields, &mut record);
        extract_sex(&fields, &mut record);

        record
    }
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Map lowercased `.field-title` text to the paired `.field-entry` value.
fn build_field_map(document: &Html) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for row in document.select(&SECTION_ROW) {
        let title = row.select(&FIELD_TITLE).next().map(element_text);
        let entry = row.select(&FIELD_ENTRY).next().map(element_text);
        if let (Some(title), Some(entry)) = (title, entry) {
            if !title.is_empty() && !entry.is_empty() {
                map.insert(title.to_lowercase(), entry);
            }
        }
    }
    map
}

/// Look a field up by any of several label variants (substring match,
/// the labels drift between page versions).
fn get_field(fields: &HashMap<String, String>, names: &[&str]) -> Option<String> {
    for name in names {
        let name_lower = name.to_lowercase();
        for (key, value) in fields {
            if key.contains(&name_lower) {
                return Some(value.clone());
            }
        }
    }
    None
}

fn extract_name(document: &Html, record: &mut PractitionerRecord) {
    let full_name = document
        .select(&PRACTITIONER_NAME)
        .next()
        .map(element_text)
        .or_else(|| {
            // Fallback: page title, minus the registry suffix
            document.select(&PAGE_TITLE).next().map(|t| {
                static TITLE_SUFFIX: Lazy<Regex> =
                    Lazy::new(|| Regex::new(r"\s*[-|].*$").expect("valid regex"));
                TITLE_SUFFIX.replace(&element_text(t), "").trim().to_string()
            })
        })
        .filter(|name| !name.is_empty());

    if let Some(full_name) = full_name {
        split_name_parts(&full_name, record);
        record.name = Some(full_name);
    }
}

/// Split a display name into title, first, middle and last parts.
fn split_name_parts(full_name: &str, record: &mut PractitionerRecord) {
    let mut name = full_name.trim();

    for title in NAME_TITLES {
        let with_space = format!("{title} ");
        let with_dot = format!("{title}.");
        if name.starts_with(&with_space) || name.starts_with(&with_dot) {
            record.name_title = Some(title.to_string());
            name = name[title.len()..].trim_matches(|c| c == ' ' || c == '.');
            break;
        }
    }

    let parts: Vec<&str> = name.split_whitespace().collect();
    if let Some(first) = parts.first() {
        record.first_name = Some((*first).to_string());
    }
    if parts.len() >= 2 {
        record.last_name = Some((*parts.last().expect("len checked")).to_string());
    }
    if parts.len() >= 3 {
        record.middle_name = Some(parts[1..parts.len() - 1].join(" "));
    }
}

fn extract_reg_id(
    document: &Html,
    fields: &HashMap<String, String>,
    record: &mut PractitionerRecord,
) {
    let candidates = [
        document.select(&REG_NUMBER).next().map(element_text),
        get_field(fields, &["registration number"]),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(m) = REG_ID_PATTERN.captures(&candidate) {
            record.reg_id = Some(m[1].to_string());
            return;
        }
    }

    // Last resort: anywhere in the page text
    let page_text: String = document.root_element().text().collect();
    if let Some(m) = REG_ID_PATTERN.captures(&page_text) {
        record.reg_id = Some(m[1].to_string());
    }
}

fn extract_profession(
    document: &Html,
    fields: &HashMap<String, String>,
    record: &mut PractitionerRecord,
) {
    record.profession = document
        .select(&PROFESSION)
        .next()
        .map(element_text)
        .filter(|p| !p.is_empty())
        .or_else(|| get_field(fields, &["profession"]));
}

fn extract_divisions(
    document: &Html,
    fields: &HashMap<String, String>,
    record: &mut PractitionerRecord,
) {
    let divisions: Vec<String> = document.select(&REG_TYPES).map(element_text).collect();
    if !divisions.is_empty() {
        record.divisions = Some(divisions.join("; "));
        return;
    }
    record.divisions = get_field(fields, &["division", "divisions"]);
}

fn extract_status(
    document: &Html,
    fields: &HashMap<String, String>,
    record: &mut PractitionerRecord,
) {
    if let Some(status) = get_field(fields, &["registration status"]) {
        record.registration_status = Some(status);
        return;
    }

    let page_text: String = document.root_element().text().collect();
    for (status, pattern) in STATUS_PATTERNS.iter() {
        if pattern.is_match(&page_text) {
            record.registration_status = Some((*status).to_string());
            return;
        }
    }
}

fn extract_dates(fields: &HashMap<String, String>, record: &mut PractitionerRecord) {
    if let Some(first_reg) = get_field(fields, &["date of first registration", "first registered"])
    {
        record.first_reg_date = Some(normalize_date(&first_reg));
    }

    if let Some(expiry) = get_field(fields, &["registration expiry date", "expiry date"]) {
        // Expiry entries often carry explanatory text after the date
        let expiry = expiry.split('.').next().unwrap_or(&expiry).to_string();
        if let Some(m) = EXPIRY_DATE_PATTERN.captures(&expiry) {
            record.reg_expiry = Some(normalize_date(&m[1]));
        } else {
            record.reg_expiry = Some(normalize_date(&expiry));
        }
    }
}

/// Normalize a date string to DD/MM/YYYY; unparseable input passes through.
fn normalize_date(date_str: &str) -> String {
    let cleaned = date_str.split_whitespace().collect::<Vec<_>>().join(" ");

    const FORMATS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%d %B %Y", "%d %b %Y", "%Y-%m-%d"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return date.format("%d/%m/%Y").to_string();
        }
    }
    cleaned
}

fn extract_endorsement(fields: &HashMap<String, String>, record: &mut PractitionerRecord) {
    if let Some(endorsement) = get_field(fields, &["endorsement", "endorsements"]) {
        if endorsement.to_lowercase() != "none" {
            record.endorsement = Some(endorsement);
        }
    }
}

fn extract_location(fields: &HashMap<String, String>, record: &mut PractitionerRecord) {
    record.suburb = get_field(fields, &["suburb"]);
    record.state = get_field(fields, &["state"]);
    record.postcode = get_field(fields, &["postcode"]);
}

fn extract_sex(fields: &HashMap<String, String>, record: &mut PractitionerRecord) {
    if let Some(sex) = get_field(fields, &["sex", "gender"]) {
        let mut chars = sex.chars();
        record.sex = chars.next().map(|first| {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html>
        <head><title>Dr Jane Maree Doe - Register of Practitioners</title></head>
        <body>
            <h2 class="practitioner-name">Dr Jane Maree Doe</h2>
            <h3 class="practitioner-profession">Medical Practitioner</h3>
            <span class="reg-number">Registration number: MED0001234567</span>
            <div class="reg-types">
                <span class="reg-type-1">General</span>
                <span class="reg-type-2">Specialist</span>
            </div>
            <div class="section-row">
                <div class="field-title">Registration status</div>
                <div class="field-entry">Registered</div>
            </div>
            <div class="section-row">
                <div class="field-title">Date of first registration</div>
                <div class="field-entry">14 March 2011</div>
            </div>
            <div class="section-row">
                <div class="field-title">Registration expiry date</div>
                <div class="field-entry">30/09/2026. Subject to annual renewal</div>
            </div>
            <div class="section-row">
                <div class="field-title">Endorsements</div>
                <div class="field-entry">None</div>
            </div>
            <div class="section-row">
                <div class="field-title">Suburb</div>
                <div class="field-entry">Carlton</div>
            </div>
            <div class="section-row">
                <div class="field-title">State</div>
                <div class="field-entry">VIC</div>
            </div>
            <div class="section-row">
                <div class="field-title">Postcode</div>
                <div class="field-entry">3053</div>
            </div>
            <div class="section-row">
                <div class="field-title">Sex</div>
                <div class="field-entry">female</div>
            </div>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_full_detail_page() {
        let record = DetailPageParser::new().parse(DETAIL_PAGE);

        assert_eq!(record.name.as_deref(), Some("Dr Jane Maree Doe"));
        assert_eq!(record.name_title.as_deref(), Some("Dr"));
        assert_eq!(record.first_name.as_deref(), Some("Jane"));
        assert_eq!(record.middle_name.as_deref(), Some("Maree"));
        assert_eq!(record.last_name.as_deref(), Some("Doe"));
        assert_eq!(record.reg_id.as_deref(), Some("MED0001234567"));
        assert_eq!(record.profession.as_deref(), Some("Medical Practitioner"));
        assert_eq!(record.divisions.as_deref(), Some("General; Specialist"));
        assert_eq!(record.registration_status.as_deref(), Some("Registered"));
        assert_eq!(record.first_reg_date.as_deref(), Some("14/03/2011"));
        assert_eq!(record.reg_expiry.as_deref(), Some("30/09/2026"));
        // "None" endorsement stays empty
        assert_eq!(record.endorsement, None);
        assert_eq!(record.suburb.as_deref(), Some("Carlton"));
        assert_eq!(record.state.as_deref(), Some("VIC"));
        assert_eq!(record.postcode.as_deref(), Some("3053"));
        assert_eq!(record.sex.as_deref(), Some("Female"));
        assert!(record.populated_fields() >= 14);
    }

    #[test]
    fn test_parse_name_from_title_fallback() {
        let html = r#"
            <html>
            <head><title>John Roe - Register of Practitioners</title></head>
            <body><p>No structured content.</p></body>
            </html>
        "#;
        let record = DetailPageParser::new().parse(html);
        assert_eq!(record.name.as_deref(), Some("John Roe"));
        assert_eq!(record.first_name.as_deref(), Some("John"));
        assert_eq!(record.last_name.as_deref(), Some("Roe"));
        assert_eq!(record.name_title, None);
    }

    #[test]
    fn test_parse_reg_id_from_page_text() {
        let html = r#"<html><body><p>Record NMW0009876543 found.</p></body></html>"#;
        let record = DetailPageParser::new().parse(html);
        assert_eq!(record.reg_id.as_deref(), Some("NMW0009876543"));
    }

    #[test]
    fn test_parse_empty_page() {
        let record = DetailPageParser::new().parse("<html><body></body></html>");
        assert_eq!(record.populated_fields(), 0);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("14/03/2011"), "14/03/2011");
        assert_eq!(normalize_date("14-03-2011"), "14/03/2011");
        assert_eq!(normalize_date("14 March 2011"), "14/03/2011");
        assert_eq!(normalize_date("14 Mar 2011"), "14/03/2011");
        assert_eq!(normalize_date("2011-03-14"), "14/03/2011");
        // Unparseable input passes through
        assert_eq!(normalize_date("sometime in 2011"), "sometime in 2011");
    }

    #[test]
    fn test_split_name_single_part() {
        let mut record = PractitionerRecord::default();
        split_name_parts("Cher", &mut record);
        assert_eq!(record.first_name.as_deref(), Some("Cher"));
        assert_eq!(record.last_name, None);
        assert_eq!(record.middle_name, None);
    }

    #[test]
    fn test_split_name_professor_title() {
        // "Prof" only matches with a trailing space or dot, so the longer
        // "Professor" wins here.
        let mut record = PractitionerRecord::default();
        split_name_parts("Professor Ada King", &mut record);
        assert_eq!(record.name_title.as_deref(), Some("Professor"));
        assert_eq!(record.first_name.as_deref(), Some("Ada"));
        assert_eq!(record.last_name.as_deref(), Some("King"));
    }
}
