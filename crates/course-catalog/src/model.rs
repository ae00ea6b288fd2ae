use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Substring that marks a course as remote when found in shift, unit or category.
pub const REMOTE_MARKER: &str = "EAD";

/// Time-of-day track. Serialized as its label; unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
    FullDay,
    Remote,
    Other(String),
}

impl Shift {
    pub const CANONICAL: [Shift; 5] = [
        Shift::Morning,
        Shift::Afternoon,
        Shift::Evening,
        Shift::FullDay,
        Shift::Remote,
    ];

    pub fn parse(label: &str) -> Self {
        match label {
            "Manhã" => Shift::Morning,
            "Tarde" => Shift::Afternoon,
            "Noite" => Shift::Evening,
            "Integral" => Shift::FullDay,
            REMOTE_MARKER => Shift::Remote,
            other => Shift::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Shift::Morning => "Manhã",
            Shift::Afternoon => "Tarde",
            Shift::Evening => "Noite",
            Shift::FullDay => "Integral",
            Shift::Remote => REMOTE_MARKER,
            Shift::Other(label) => label,
        }
    }
}

impl Default for Shift {
    fn default() -> Self {
        Shift::Other(String::new())
    }
}

impl From<String> for Shift {
    fn from(label: String) -> Self {
        Shift::parse(&label)
    }
}

impl From<Shift> for String {
    fn from(shift: Shift) -> Self {
        match shift {
            Shift::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One catalog entry. Field names on the wire match the extraction response shape so that
/// snapshots and extracted records share one format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Course {
    pub id: String,
    #[serde(rename = "nome_curso")]
    pub name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    /// Course-hours label such as "380h".
    #[serde(rename = "carga_horaria", default)]
    pub hours: String,
    #[serde(rename = "numero_de_parcelas", default)]
    pub installments: u32,
    #[serde(rename = "valor_parcela", default)]
    pub installment_value: f64,
    #[serde(rename = "valor_total")]
    pub total_value: f64,
    /// Date-range label such as "15/03 a 20/07".
    #[serde(rename = "datas", default)]
    pub dates: String,
    #[serde(rename = "turno", default)]
    #[schemars(with = "String")]
    pub shift: Shift,
    #[serde(rename = "unidade", default)]
    pub unit: String,
    /// Set on records that came from the most recent import.
    #[serde(rename = "isNew", default, skip_serializing_if = "is_false")]
    pub is_new: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Course {
    /// Promote an extracted record: fresh random id, marked new.
    pub fn from_extracted(raw: RawCourse) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: raw.name,
            category: raw.category,
            hours: raw.hours,
            installments: raw.installments.max(0.0).round() as u32,
            installment_value: raw.installment_value,
            total_value: raw.total_value,
            dates: raw.dates,
            shift: Shift::parse(&raw.shift),
            unit: raw.unit,
            is_new: true,
        }
    }
}

/// One record as returned by the extraction service. Name, category and total are required;
/// the rest default when absent or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCourse {
    #[serde(rename = "nome_curso")]
    pub name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "valor_total", deserialize_with = "lenient_number")]
    pub total_value: f64,
    #[serde(rename = "carga_horaria", default, deserialize_with = "null_as_empty")]
    pub hours: String,
    #[serde(rename = "numero_de_parcelas", default, deserialize_with = "lenient_optional_number")]
    pub installments: f64,
    #[serde(rename = "valor_parcela", default, deserialize_with = "lenient_optional_number")]
    pub installment_value: f64,
    #[serde(rename = "datas", default, deserialize_with = "null_as_empty")]
    pub dates: String,
    #[serde(rename = "turno", default, deserialize_with = "null_as_empty")]
    pub shift: String,
    #[serde(rename = "unidade", default, deserialize_with = "null_as_empty")]
    pub unit: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_number<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Number(n) if n >= 0.0 => Ok(n),
            NumberOrText::Number(n) => Err(E::custom(format!("negative monetary value: {n}"))),
            NumberOrText::Text(t) => {
                parse_money(&t).ok_or_else(|| E::custom(format!("not a monetary value: {t:?}")))
            }
        }
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    NumberOrText::deserialize(d)?.into_number()
}

fn lenient_optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Option::<NumberOrText>::deserialize(d)? {
        Some(v) => v.into_number(),
        None => Ok(0.0),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

static MONEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid regex"));

/// Parse a monetary label such as "R$ 1.899,00", "240" or "Gratuito" into a plain number.
///
/// A comma is the decimal separator when present; otherwise a lone dot followed by exactly three
/// digits is read as a thousands separator. Negative amounts are rejected.
pub fn parse_money(text: &str) -> Option<f64> {
    let lowered = text.trim().to_lowercase();
    if lowered.contains("gratuito") || lowered.contains("grátis") {
        return Some(0.0);
    }

    let found = MONEY_RE.find(&lowered)?;
    if lowered[..found.start()].contains('-') {
        return None;
    }
    let digits = found.as_str().trim_end_matches(['.', ',']);
    let normalized = if digits.contains(',') {
        digits.replace('.', "").replace(',', ".")
    } else if digits.matches('.').count() > 1 {
        digits.replace('.', "")
    } else if let Some((_, frac)) = digits.split_once('.') {
        if frac.len() == 3 {
            digits.replace('.', "")
        } else {
            digits.to_string()
        }
    } else {
        digits.to_string()
    };
    normalized.parse::<f64>().ok()
}

/// The five user-controlled filter fields. Empty means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Case-insensitive text matched against name, unit and category.
    pub search: String,
    /// Exact category name.
    pub category: String,
    /// Exact shift label ("Manhã", "Tarde", "Noite", "Integral", "EAD" or free text).
    pub shift: String,
    /// "online" or "presencial".
    pub modality: String,
    /// "free", "up_to_500", "500_1000" or "over_1000".
    pub price_range: String,
}

impl FilterCriteria {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Number of selector filters in use. The free-text search is not counted.
    pub fn active_count(&self) -> usize {
        [
            &self.category,
            &self.modality,
            &self.shift,
            &self.price_range,
        ]
        .iter()
        .filter(|v| !v.is_empty())
        .count()
    }
}

/// State of the upload panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionStatus {
    pub loading: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shift_labels_round_trip() {
        for shift in Shift::CANONICAL {
            assert_eq!(Shift::parse(shift.label()), shift);
        }
        assert_eq!(Shift::parse("Sábado"), Shift::Other("Sábado".to_string()));
        assert_eq!(String::from(Shift::Other("Sábado".to_string())), "Sábado");
        assert_eq!(serde_json::to_value(Shift::Evening).unwrap(), json!("Noite"));
    }

    #[test]
    fn raw_course_requires_name_category_total() {
        let ok: RawCourse = serde_json::from_value(json!({
            "nome_curso": "Soldador",
            "categoria": "Metalurgia",
            "valor_total": 0
        }))
        .unwrap();
        assert_eq!(ok.total_value, 0.0);
        assert_eq!(ok.hours, "");
        assert_eq!(ok.installments, 0.0);

        let missing_total = serde_json::from_value::<RawCourse>(json!({
            "nome_curso": "Soldador",
            "categoria": "Metalurgia"
        }));
        assert!(missing_total.is_err());
    }

    #[test]
    fn raw_course_accepts_currency_strings_and_nulls() {
        let raw: RawCourse = serde_json::from_value(json!({
            "nome_curso": "Eletricista Industrial",
            "categoria": "Eletroeletrônica",
            "valor_total": "R$ 1.899,00",
            "valor_parcela": "189,90",
            "numero_de_parcelas": 10.0,
            "turno": null,
            "unidade": null
        }))
        .unwrap();
        assert_eq!(raw.total_value, 1899.0);
        assert!((raw.installment_value - 189.9).abs() < 1e-9);
        assert_eq!(raw.shift, "");

        let bad = serde_json::from_value::<RawCourse>(json!({
            "nome_curso": "X",
            "categoria": "Y",
            "valor_total": "a consultar"
        }));
        assert!(bad.is_err());

        for total in [json!(-50), json!("-50")] {
            let negative = serde_json::from_value::<RawCourse>(json!({
                "nome_curso": "X",
                "categoria": "Y",
                "valor_total": total
            }));
            assert!(negative.is_err());
        }
    }

    #[test]
    fn money_labels() {
        assert_eq!(parse_money("R$ 1.899,00"), Some(1899.0));
        assert_eq!(parse_money("1.899"), Some(1899.0));
        assert_eq!(parse_money("189.90"), Some(189.9));
        assert_eq!(parse_money("1.234.567"), Some(1234567.0));
        assert_eq!(parse_money("Gratuito"), Some(0.0));
        assert_eq!(parse_money("240"), Some(240.0));
        assert_eq!(parse_money("sem valor"), None);
        assert_eq!(parse_money("-50"), None);
        assert_eq!(parse_money("R$ -1.899,00"), None);
        assert_eq!(parse_money("10-12"), Some(10.0));
    }

    #[test]
    fn extracted_courses_get_fresh_ids_and_new_flag() {
        let raw: RawCourse = serde_json::from_value(json!({
            "nome_curso": "Excel Avançado",
            "categoria": "Tecnologia da Informação",
            "valor_total": 240,
            "numero_de_parcelas": 2,
            "turno": "EAD"
        }))
        .unwrap();

        let a = Course::from_extracted(raw.clone());
        let b = Course::from_extracted(raw);
        assert_ne!(a.id, b.id);
        assert!(a.is_new && b.is_new);
        assert_eq!(a.shift, Shift::Remote);
        assert_eq!(a.installments, 2);
    }

    #[test]
    fn course_uses_extraction_field_names() {
        let course = Course::from_extracted(RawCourse {
            name: "Soldador".to_string(),
            category: "Metalurgia".to_string(),
            total_value: 0.0,
            hours: "160h".to_string(),
            installments: 0.0,
            installment_value: 0.0,
            dates: "01/02 a 01/03".to_string(),
            shift: "Manhã".to_string(),
            unit: "Escola SENAI".to_string(),
        });
        let value = serde_json::to_value(&course).unwrap();
        assert_eq!(value["nome_curso"], "Soldador");
        assert_eq!(value["turno"], "Manhã");
        assert_eq!(value["isNew"], true);

        let mut seeded = course.clone();
        seeded.is_new = false;
        let value = serde_json::to_value(&seeded).unwrap();
        assert!(value.get("isNew").is_none());
    }

    #[test]
    fn criteria_counts_and_clears() {
        let mut criteria = FilterCriteria {
            search: "excel".to_string(),
            modality: "online".to_string(),
            price_range: "up_to_500".to_string(),
            ..Default::default()
        };
        assert_eq!(criteria.active_count(), 2);
        assert!(!criteria.is_empty());

        criteria.clear();
        assert!(criteria.is_empty());
        assert_eq!(criteria.active_count(), 0);
    }

    #[test]
    fn criteria_reads_camel_case_query_fields() {
        let criteria: FilterCriteria =
            serde_json::from_value(json!({"priceRange": "free", "shift": "Noite"})).unwrap();
        assert_eq!(criteria.price_range, "free");
        assert_eq!(criteria.shift, "Noite");
        assert_eq!(criteria.search, "");
    }
}
