//! The extracted practitioner record.

use serde::{Deserialize, Serialize};

/// One fully-extracted registry record: the sixteen fields the detail page
/// carries. Every field is optional; how many are populated decides whether
/// an extraction attempt counts as parsed (see the engine's
/// `min_populated_fields`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PractitionerRecord {
    /// Full display name.
    pub name: Option<String>,
    /// Honorific (Dr, Ms, Prof, ...).
    pub name_title: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Middle name(s).
    pub middle_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Registration ID.
    pub reg_id: Option<String>,
    /// Profession.
    pub profession: Option<String>,
    /// Registration status (Registered, Suspended, ...).
    pub registration_status: Option<String>,
    /// Date of first registration, DD/MM/YYYY.
    pub first_reg_date: Option<String>,
    /// Registration expiry date, DD/MM/YYYY.
    pub reg_expiry: Option<String>,
    /// Endorsements, if any.
    pub endorsement: Option<String>,
    /// Sex.
    pub sex: Option<String>,
    /// Practice location suburb.
    pub suburb: Option<String>,
    /// Practice location state.
    pub state: Option<String>,
    /// Practice location postcode.
    pub postcode: Option<String>,
    /// Professional divisions, `; `-joined.
    pub divisions: Option<String>,
}

impl PractitionerRecord {
    /// Field names in output order (CSV header / JSONL key order).
    pub const FIELD_NAMES: [&'static str; 16] = [
        "name",
        "name_title",
        "first_name",
        "middle_name",
        "last_name",
        "reg_id",
        "profession",
        "registration_status",
        "first_reg_date",
        "reg_expiry",
        "endorsement",
        "sex",
        "suburb",
        "state",
        "postcode",
        "divisions",
    ];

    /// Field values in [`Self::FIELD_NAMES`] order.
    #[must_use]
    pub fn field_values(&self) -> [Option<&str>; 16] {
        [
            self.name.as_deref(),
            self.name_title.as_deref(),
            self.first_name.as_deref(),
            self.middle_name.as_deref(),
            self.last_name.as_deref(),
            self.reg_id.as_deref(),
            self.profession.as_deref(),
            self.registration_status.as_deref(),
            self.first_reg_date.as_deref(),
            self.reg_expiry.as_deref(),
            self.endorsement.as_deref(),
            self.sex.as_deref(),
            self.suburb.as_deref(),
            self.state.as_deref(),
            self.postcode.as_deref(),
            self.divisions.as_deref(),
        ]
    }

    /// Number of populated fields.
    #[must_use]
    pub fn populated_fields(&self) -> usize {
        self.field_values().iter().filter(|v| v.is_some()).count()
    }
}
