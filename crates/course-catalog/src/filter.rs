/// Catalog filtering.
///
/// A course is kept when every predicate holds; each unset criterion matches everything.
/// The filter is stable (input order is preserved) and never sorts.
use std::collections::BTreeSet;

use crate::model::{Course, FilterCriteria, Shift, REMOTE_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Online,
    InPerson,
}

impl Modality {
    pub const ALL: [Modality; 2] = [Modality::Online, Modality::InPerson];

    /// `None` for empty or unrecognized values, which match every course.
    pub fn from_filter_value(value: &str) -> Option<Self> {
        match value {
            "online" => Some(Modality::Online),
            "presencial" => Some(Modality::InPerson),
            _ => None,
        }
    }

    pub fn filter_value(self) -> &'static str {
        match self {
            Modality::Online => "online",
            Modality::InPerson => "presencial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBracket {
    Free,
    UpTo500,
    From500To1000,
    Over1000,
}

impl PriceBracket {
    pub const ALL: [PriceBracket; 4] = [
        PriceBracket::Free,
        PriceBracket::UpTo500,
        PriceBracket::From500To1000,
        PriceBracket::Over1000,
    ];

    /// `None` for empty or unrecognized values, which match every course.
    pub fn from_filter_value(value: &str) -> Option<Self> {
        match value {
            "free" => Some(PriceBracket::Free),
            "up_to_500" => Some(PriceBracket::UpTo500),
            "500_1000" => Some(PriceBracket::From500To1000),
            "over_1000" => Some(PriceBracket::Over1000),
            _ => None,
        }
    }

    pub fn filter_value(self) -> &'static str {
        match self {
            PriceBracket::Free => "free",
            PriceBracket::UpTo500 => "up_to_500",
            PriceBracket::From500To1000 => "500_1000",
            PriceBracket::Over1000 => "over_1000",
        }
    }

    pub fn contains(self, total: f64) -> bool {
        match self {
            PriceBracket::Free => total == 0.0,
            PriceBracket::UpTo500 => total > 0.0 && total <= 500.0,
            PriceBracket::From500To1000 => total > 500.0 && total <= 1000.0,
            PriceBracket::Over1000 => total > 1000.0,
        }
    }
}

/// Remote when the shift is the remote marker, the unit name mentions it, or the category is it.
pub fn is_online(course: &Course) -> bool {
    course.shift == Shift::Remote
        || course.unit.contains(REMOTE_MARKER)
        || course.category == REMOTE_MARKER
}

pub fn matches(course: &Course, criteria: &FilterCriteria) -> bool {
    matches_search(course, &criteria.search)
        && matches_category(course, &criteria.category)
        && matches_modality(course, &criteria.modality)
        && matches_shift(course, &criteria.shift)
        && matches_price(course, &criteria.price_range)
}

/// Stable subset of `courses` that satisfies `criteria`.
pub fn apply_filters(courses: &[Course], criteria: &FilterCriteria) -> Vec<Course> {
    courses
        .iter()
        .filter(|c| matches(c, criteria))
        .cloned()
        .collect()
}

/// Distinct categories in ascending order.
pub fn categories(courses: &[Course]) -> Vec<String> {
    courses
        .iter()
        .map(|c| c.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn matches_search(course: &Course, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    [&course.name, &course.unit, &course.category]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_category(course: &Course, category: &str) -> bool {
    category.is_empty() || course.category == category
}

fn matches_modality(course: &Course, modality: &str) -> bool {
    match Modality::from_filter_value(modality) {
        Some(Modality::Online) => is_online(course),
        Some(Modality::InPerson) => !is_online(course),
        None => true,
    }
}

// Independent of modality: a remote course with an explicit shift is judged by its shift alone.
fn matches_shift(course: &Course, shift: &str) -> bool {
    shift.is_empty() || course.shift.label() == shift
}

fn matches_price(course: &Course, price_range: &str) -> bool {
    PriceBracket::from_filter_value(price_range)
        .map_or(true, |bracket| bracket.contains(course.total_value))
}
