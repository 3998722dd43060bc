//! Picks the template for a statement: filename first, then first-page text,
//! then the generic fallback.

use crate::carriers::Carrier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Carrier(Carrier),
    /// No keyword matched; hand the text to the fallback extractor.
    Fallback,
}

/// Checked in order against the lowercased file stem. `cal choice` must
/// precede the bare `choice`.
const FILENAME_KEYWORDS: &[(&str, Carrier)] = &[
    ("allied", Carrier::Allied),
    ("beam", Carrier::Beam),
    ("guardian", Carrier::Guardian),
    ("cal choice", Carrier::CalChoice),
    ("calchoice", Carrier::CalChoice),
    ("choice", Carrier::ChoiceBuilder),
    ("american heritage", Carrier::AmericanHeritage),
    ("vsp", Carrier::VspVision),
    ("vision", Carrier::VspVision),
];

/// Checked in order against the lowercased first page. Only full phrases
/// here; words like "choice" or "vision" show up in other carriers' product
/// names.
const CONTENT_KEYWORDS: &[(&str, Carrier)] = &[
    ("allied", Carrier::Allied),
    ("beam", Carrier::Beam),
    ("guardian", Carrier::Guardian),
    ("calchoice", Carrier::CalChoice),
    ("cal choice", Carrier::CalChoice),
    ("choice builder", Carrier::ChoiceBuilder),
    ("american heritage", Carrier::AmericanHeritage),
    ("earned commission statement", Carrier::AmericanHeritage),
    ("vsp vision", Carrier::VspVision),
];

pub fn route_by_filename(stem: &str) -> Option<Carrier> {
    let stem = stem.to_lowercase();
    FILENAME_KEYWORDS
        .iter()
        .find(|(kw, _)| stem.contains(kw))
        .map(|(_, carrier)| *carrier)
}

pub fn route_by_content(first_page: &str) -> Option<Carrier> {
    let text = first_page.to_lowercase();
    CONTENT_KEYWORDS
        .iter()
        .find(|(kw, _)| text.contains(kw))
        .map(|(_, carrier)| *carrier)
}

/// Route a statement given its file stem and first page.
pub fn route(stem: &str, first_page: &str) -> Route {
    route_by_filename(stem)
        .or_else(|| route_by_content(first_page))
        .map_or(Route::Fallback, Route::Carrier)
}
