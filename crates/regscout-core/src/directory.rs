//! Static directory data for the target registry.
//!
//! The registry indexes practitioners by profession, state and locality.
//! These sets are fixed by the registry itself; they seed the
//! multi-dimensional search space and the adaptive-search allow-list.

/// The sixteen registered health professions.
pub const PROFESSIONS: [&str; 16] = [
    "Aboriginal and Torres Strait Islander Health Practitioner",
    "Chinese Medicine Practitioner",
    "Chiropractor",
    "Dental Practitioner",
    "Medical Practitioner",
    "Medical Radiation Practitioner",
    "Midwife",
    "Nurse",
    "Occupational Therapist",
    "Optometrist",
    "Osteopath",
    "Paramedic",
    "Pharmacist",
    "Physiotherapist",
    "Podiatrist",
    "Psychologist",
];

/// The eight states and territories.
pub const STATES: [&str; 8] = [
    "Australian Capital Territory",
    "New South Wales",
    "Northern Territory",
    "Queensland",
    "South Australia",
    "Tasmania",
    "Victoria",
    "Western Australia",
];

/// Alphabet used for name-prefix enumeration.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// States with enough registrants to warrant suburb-level search refinement.
pub const HIGH_VOLUME_STATES: [&str; 3] = ["New South Wales", "Victoria", "Queensland"];

/// Name prefixes known to hide large result sets behind the page limit
/// (common surname stems). The adaptive strategy always expands these.
pub const HIGH_VOLUME_PREFIXES: [&str; 19] = [
    "SM", // Smith
    "JO", // Jones, Johnson
    "WI", // Williams, Wilson
    "BR", // Brown
    "TA", // Taylor
    "AN", // Anderson
    "TH", // Thomas, Thompson
    "JA", // Jackson, James
    "WH", // White
    "HA", // Harris
    "MA", // Martin
    "GA", // Garcia
    "CL", // Clark
    "RO", // Robinson
    "LE", // Lee, Lewis
    "WA", // Walker, Wang
    "NG", // Nguyen
    "CH", // Chen, Chang
    "KI", // King, Kim
];

/// Map a full state name to the abbreviation the registry UI uses.
#[must_use]
pub fn state_abbreviation(state: &str) -> &str {
    match state {
        "Australian Capital Territory" => "ACT",
        "New South Wales" => "NSW",
        "Northern Territory" => "NT",
        "Queensland" => "QLD",
        "South Australia" => "SA",
        "Tasmania" => "TAS",
        "Victoria" => "VIC",
        "Western Australia" => "WA",
        other => other,
    }
}

/// Major suburbs/localities for a state, used by suburb-mode discovery.
///
/// Only the high-volume states carry suburb lists; everywhere else the
/// state-level search is fine-grained enough.
#[must_use]
pub fn major_suburbs(state: &str) -> &'static [&'static str] {
    match state {
        "New South Wales" => &[
            "Sydney",
            "Parramatta",
            "Newcastle",
            "Wollongong",
            "Penrith",
            "Liverpool",
            "Blacktown",
            "Chatswood",
            "Hornsby",
            "Gosford",
            "Maitland",
            "Wagga Wagga",
        ],
        "Victoria" => &[
            "Melbourne",
            "Geelong",
            "Ballarat",
            "Bendigo",
            "Frankston",
            "Dandenong",
            "Box Hill",
            "Footscray",
            "Glen Waverley",
            "Werribee",
            "Shepparton",
            "Mildura",
        ],
        "Queensland" => &[
            "Brisbane",
            "Gold Coast",
            "Sunshine Coast",
            "Townsville",
            "Cairns",
            "Toowoomba",
            "Mackay",
            "Rockhampton",
            "Ipswich",
            "Logan",
            "Bundaberg",
            "Hervey Bay",
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_cardinality() {
        assert_eq!(PROFESSIONS.len(), 16);
        assert_eq!(STATES.len(), 8);
        assert_eq!(ALPHABET.len(), 26);
    }

    #[test]
    fn test_state_abbreviations() {
        assert_eq!(state_abbreviation("Victoria"), "VIC");
        assert_eq!(state_abbreviation("New South Wales"), "NSW");
        // Unknown names pass through unchanged
        assert_eq!(state_abbreviation("VIC"), "VIC");
    }

    #[test]
    fn test_suburbs_only_for_high_volume_states() {
        for state in HIGH_VOLUME_STATES {
            assert!(!major_suburbs(state).is_empty(), "no suburbs for {state}");
        }
        assert!(major_suburbs("Tasmania").is_empty());
        assert!(major_suburbs("Northern Territory").is_empty());
    }

    #[test]
    fn test_high_volume_prefixes_within_alphabet() {
        for prefix in HIGH_VOLUME_PREFIXES {
            assert!(prefix.chars().all(|c| ALPHABET.contains(c)));
        }
    }
}
