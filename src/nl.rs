//! Natural-language slot extraction for mock mode
//!
//! A small deterministic parser that pulls shipping details (weight,
//! destination, service level) out of free text. Only the mock provider
//! uses it; the live model does its own extraction. Kept deliberately
//! simple: keyword tables and a handful of regexes, no NLP.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

/// US state names and abbreviations, mapped to the two-letter code.
/// Full names come first so they win over their embedded abbreviations.
static STATES: &[(&str, &str)] = &[
    ("alabama", "AL"), ("alaska", "AK"), ("arizona", "AZ"), ("arkansas", "AR"),
    ("california", "CA"), ("colorado", "CO"), ("connecticut", "CT"), ("delaware", "DE"),
    ("florida", "FL"), ("georgia", "GA"), ("hawaii", "HI"), ("idaho", "ID"),
    ("illinois", "IL"), ("indiana", "IN"), ("iowa", "IA"), ("kansas", "KS"),
    ("kentucky", "KY"), ("louisiana", "LA"), ("maine", "ME"), ("maryland", "MD"),
    ("massachusetts", "MA"), ("michigan", "MI"), ("minnesota", "MN"), ("mississippi", "MS"),
    ("missouri", "MO"), ("montana", "MT"), ("nebraska", "NE"), ("nevada", "NV"),
    ("new hampshire", "NH"), ("new jersey", "NJ"), ("new mexico", "NM"), ("new york", "NY"),
    ("north carolina", "NC"), ("north dakota", "ND"), ("ohio", "OH"), ("oklahoma", "OK"),
    ("oregon", "OR"), ("pennsylvania", "PA"), ("rhode island", "RI"), ("south carolina", "SC"),
    ("south dakota", "SD"), ("tennessee", "TN"), ("texas", "TX"), ("utah", "UT"),
    ("vermont", "VT"), ("virginia", "VA"), ("washington", "WA"), ("west virginia", "WV"),
    ("wisconsin", "WI"), ("wyoming", "WY"), ("district of columbia", "DC"),
    ("al", "AL"), ("ak", "AK"), ("az", "AZ"), ("ar", "AR"), ("ca", "CA"), ("co", "CO"),
    ("ct", "CT"), ("de", "DE"), ("fl", "FL"), ("ga", "GA"), ("hi", "HI"), ("id", "ID"),
    ("il", "IL"), ("in", "IN"), ("ia", "IA"), ("ks", "KS"), ("ky", "KY"), ("la", "LA"),
    ("me", "ME"), ("md", "MD"), ("ma", "MA"), ("mi", "MI"), ("mn", "MN"), ("ms", "MS"),
    ("mo", "MO"), ("mt", "MT"), ("ne", "NE"), ("nv", "NV"), ("nh", "NH"), ("nj", "NJ"),
    ("nm", "NM"), ("ny", "NY"), ("nc", "NC"), ("nd", "ND"), ("oh", "OH"), ("ok", "OK"),
    ("or", "OR"), ("pa", "PA"), ("ri", "RI"), ("sc", "SC"), ("sd", "SD"), ("tn", "TN"),
    ("tx", "TX"), ("ut", "UT"), ("vt", "VT"), ("va", "VA"), ("wa", "WA"), ("wv", "WV"),
    ("wi", "WI"), ("wy", "WY"), ("dc", "DC"),
];

/// Common city aliases.
static CITIES: &[(&str, &str)] = &[
    ("la", "Los Angeles"), ("los angeles", "Los Angeles"),
    ("nyc", "New York"), ("new york", "New York"), ("new york city", "New York"),
    ("sf", "San Francisco"), ("san francisco", "San Francisco"),
    ("chicago", "Chicago"), ("chi", "Chicago"),
    ("houston", "Houston"),
    ("phoenix", "Phoenix"),
    ("philly", "Philadelphia"), ("philadelphia", "Philadelphia"),
    ("san antonio", "San Antonio"),
    ("san diego", "San Diego"),
    ("dallas", "Dallas"),
    ("austin", "Austin"),
    ("seattle", "Seattle"),
    ("denver", "Denver"),
    ("boston", "Boston"),
    ("vegas", "Las Vegas"), ("las vegas", "Las Vegas"),
    ("miami", "Miami"),
    ("atlanta", "Atlanta"), ("atl", "Atlanta"),
    ("portland", "Portland"),
    ("detroit", "Detroit"),
];

/// Home state for the known cities.
static CITY_STATES: &[(&str, &str)] = &[
    ("los angeles", "CA"), ("san francisco", "CA"), ("san diego", "CA"),
    ("new york", "NY"), ("chicago", "IL"), ("houston", "TX"), ("dallas", "TX"),
    ("austin", "TX"), ("san antonio", "TX"), ("phoenix", "AZ"), ("philadelphia", "PA"),
    ("seattle", "WA"), ("denver", "CO"), ("boston", "MA"), ("las vegas", "NV"),
    ("miami", "FL"), ("atlanta", "GA"), ("portland", "OR"), ("detroit", "MI"),
];

static WEIGHT_PATTERNS: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    [
        (r"(\d+(?:\.\d+)?)\s*(?:lb|lbs|pound|pounds)\b", 16.0),
        (r"(\d+(?:\.\d+)?)\s*(?:oz|ounce|ounces)\b", 1.0),
        (r"(\d+(?:\.\d+)?)\s*(?:kg|kilo|kilogram)\b", 35.274),
        (r"(\d+(?:\.\d+)?)\s*(?:g|gram|grams)\b", 0.035274),
    ]
    .iter()
    .filter_map(|(p, m)| Regex::new(p).ok().map(|r| (r, *m)))
    .collect()
});

static ZIP_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").ok());

static TO_CITY_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"to\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").ok());

/// Shipping details extracted from one user message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedShippingInfo {
    pub city: Option<String>,
    pub state: Option<&'static str>,
    pub zip_code: Option<String>,
    pub weight_oz: Option<f64>,
    pub service_level: Option<&'static str>,
}

impl ParsedShippingInfo {
    /// Whether we have enough to identify a destination.
    pub fn has_destination(&self) -> bool {
        self.zip_code.is_some() || (self.city.is_some() && self.state.is_some())
    }

    pub fn has_weight(&self) -> bool {
        self.weight_oz.is_some()
    }

    /// The parsed slots as a `get_shipping_rates` input, with defaults
    /// filled in for anything missing.
    pub fn to_rates_input(&self) -> Value {
        json!({
            "to_city": self.city.as_deref().unwrap_or("Los Angeles"),
            "to_state": self.state.unwrap_or("CA"),
            "to_zip": self.zip_code.as_deref().unwrap_or("90001"),
            "weight_oz": self.weight_oz.unwrap_or(32.0),
        })
    }
}

/// True when `needle` appears in `haystack` bounded by non-alphanumeric
/// characters on both sides.
fn word_match(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before_ok = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = !haystack[start + needle.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Extract a weight from text, normalized to ounces.
pub fn parse_weight(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    for (pattern, multiplier) in WEIGHT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Some(value * multiplier);
            }
        }
    }
    None
}

/// Extract a five-digit ZIP (ZIP+4 is normalized to five digits).
pub fn parse_zip(text: &str) -> Option<String> {
    ZIP_RE
        .as_ref()
        .and_then(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
}

/// Extract a state code from a name or abbreviation.
pub fn parse_state(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    STATES
        .iter()
        .find(|(name, _)| word_match(&lower, name))
        .map(|(_, abbrev)| *abbrev)
}

/// Extract a city, with its home state when the city is well known.
pub fn parse_city(text: &str) -> (Option<String>, Option<&'static str>) {
    let lower = text.to_lowercase();
    for (alias, city) in CITIES {
        if word_match(&lower, alias) {
            let state = CITY_STATES
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(city))
                .map(|(_, s)| *s);
            return (Some((*city).to_string()), state);
        }
    }

    // "to Chicago" / "to Los Angeles" with a capitalized city we don't
    // know; reject state names.
    if let Some(caps) = TO_CITY_RE.as_ref().and_then(|re| re.captures(text)) {
        let candidate = caps[1].to_string();
        let candidate_lower = candidate.to_lowercase();
        if !STATES.iter().any(|(name, _)| *name == candidate_lower) {
            return (Some(candidate), None);
        }
    }

    (None, None)
}

/// Extract a service-level preference: ground, express, or overnight.
pub fn parse_service_level(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if ["overnight", "next day", "rush"].iter().any(|w| lower.contains(w)) {
        Some("overnight")
    } else if ["express", "fast", "quick", "2 day", "two day"]
        .iter()
        .any(|w| lower.contains(w))
    {
        Some("express")
    } else if ["ground", "cheap", "cheapest", "economy", "standard"]
        .iter()
        .any(|w| lower.contains(w))
    {
        Some("ground")
    } else {
        None
    }
}

/// Parse one user message into structured shipping slots.
pub fn parse_shipping_input(text: &str) -> ParsedShippingInfo {
    let mut info = ParsedShippingInfo {
        weight_oz: parse_weight(text),
        zip_code: parse_zip(text),
        state: parse_state(text),
        service_level: parse_service_level(text),
        ..Default::default()
    };

    let (city, city_state) = parse_city(text);
    if let Some(city) = city {
        info.city = Some(city);
        if info.state.is_none() {
            info.state = city_state;
        }
    }

    info
}

/// Human-readable echo of what was parsed.
pub fn describe_parsed(info: &ParsedShippingInfo) -> String {
    let mut parts = Vec::new();

    if let Some(weight) = info.weight_oz {
        if weight >= 16.0 {
            parts.push(format!("{:.1} lb package", weight / 16.0));
        } else {
            parts.push(format!("{:.0} oz package", weight));
        }
    }

    let mut dest = Vec::new();
    if let Some(city) = &info.city {
        dest.push(city.clone());
    }
    if let Some(state) = info.state {
        dest.push(state.to_string());
    }
    if let Some(zip) = &info.zip_code {
        dest.push(zip.clone());
    }
    if !dest.is_empty() {
        parts.push(format!("to {}", dest.join(", ")));
    }

    if let Some(level) = info.service_level {
        parts.push(format!("({})", level));
    }

    if parts.is_empty() {
        "No shipping details detected".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_units_normalize_to_ounces() {
        assert_eq!(parse_weight("ship a 2lb package"), Some(32.0));
        assert_eq!(parse_weight("2 lbs please"), Some(32.0));
        assert_eq!(parse_weight("about 12 oz"), Some(12.0));
        assert_eq!(parse_weight("1.5 pounds"), Some(24.0));
        assert_eq!(parse_weight("1 kg box"), Some(35.274));
        assert_eq!(parse_weight("no weight here"), None);
    }

    #[test]
    fn zip_extraction() {
        assert_eq!(parse_zip("send to 90001").as_deref(), Some("90001"));
        assert_eq!(parse_zip("zip is 90001-1234").as_deref(), Some("90001"));
        assert_eq!(parse_zip("order #1234"), None);
    }

    #[test]
    fn state_names_and_abbreviations() {
        assert_eq!(parse_state("ship to California"), Some("CA"));
        assert_eq!(parse_state("going to TX"), Some("TX"));
        assert_eq!(parse_state("new york please"), Some("NY"));
        assert_eq!(parse_state("nothing here"), None);
    }

    #[test]
    fn city_aliases_infer_state() {
        let (city, state) = parse_city("rates to LA please");
        assert_eq!(city.as_deref(), Some("Los Angeles"));
        assert_eq!(state, Some("CA"));

        let (city, state) = parse_city("ship to nyc");
        assert_eq!(city.as_deref(), Some("New York"));
        assert_eq!(state, Some("NY"));
    }

    #[test]
    fn unknown_capitalized_city_after_to() {
        let (city, state) = parse_city("send it to Tulsa");
        assert_eq!(city.as_deref(), Some("Tulsa"));
        assert_eq!(state, None);
    }

    #[test]
    fn service_level_keywords() {
        assert_eq!(parse_service_level("I need it overnight"), Some("overnight"));
        assert_eq!(parse_service_level("something fast"), Some("express"));
        assert_eq!(parse_service_level("cheapest option"), Some("ground"));
        assert_eq!(parse_service_level("whenever"), None);
    }

    #[test]
    fn full_parse_combines_slots() {
        let info = parse_shipping_input("get rates for a 2lb package to San Francisco, cheapest");
        assert_eq!(info.weight_oz, Some(32.0));
        assert_eq!(info.city.as_deref(), Some("San Francisco"));
        assert_eq!(info.state, Some("CA"));
        assert_eq!(info.service_level, Some("ground"));
        assert!(info.has_destination());
        assert!(info.has_weight());
    }

    #[test]
    fn explicit_state_wins_over_city_inference() {
        // An explicit state in the text beats the city's home state.
        let info = parse_shipping_input("2lb to Chicago, TX");
        assert_eq!(info.city.as_deref(), Some("Chicago"));
        assert_eq!(info.state, Some("TX"));
        assert_eq!(info.to_rates_input()["to_state"], "TX");

        // No explicit state: fall back to the city's home state.
        let info = parse_shipping_input("2lb to Chicago");
        assert_eq!(info.state, Some("IL"));
    }

    #[test]
    fn describe_renders_pounds_and_destination() {
        let info = parse_shipping_input("ship 32oz to Seattle");
        assert_eq!(describe_parsed(&info), "2.0 lb package to Seattle, WA");

        let info = ParsedShippingInfo::default();
        assert_eq!(describe_parsed(&info), "No shipping details detected");
    }

    #[test]
    fn rates_input_fills_defaults() {
        let info = parse_shipping_input("how much to ship?");
        let input = info.to_rates_input();
        assert_eq!(input["to_city"], "Los Angeles");
        assert_eq!(input["to_state"], "CA");
        assert_eq!(input["to_zip"], "90001");
        assert_eq!(input["weight_oz"], 32.0);
    }
}
