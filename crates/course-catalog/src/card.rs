/// Course card view models: the priced, linkable form of a course that clients render.
use schemars::JsonSchema;
use serde::Serialize;
use url::form_urlencoded;

use crate::filter::is_online;
use crate::model::Course;

pub const DEFAULT_WHATSAPP_NUMBER: &str = "559231829925";

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CourseCard {
    pub id: String,
    pub name: String,
    pub category: String,
    pub hours: String,
    pub shift: String,
    pub dates: String,
    pub unit: String,
    pub online: bool,
    /// Rendered as the "NOVO" badge.
    pub is_new: bool,
    pub price: PriceDisplay,
    pub enroll_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PriceDisplay {
    pub free: bool,
    /// "GRATUITO" or "10x de R$ 189,90".
    pub headline: String,
    /// "Valor total: R$ 1.899,00"; absent for free courses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CardBuilder {
    whatsapp_number: String,
}

impl CardBuilder {
    pub fn new(whatsapp_number: impl Into<String>) -> Self {
        Self {
            whatsapp_number: whatsapp_number.into(),
        }
    }

    pub fn build(&self, course: &Course) -> CourseCard {
        CourseCard {
            id: course.id.clone(),
            name: course.name.clone(),
            category: course.category.clone(),
            hours: course.hours.clone(),
            shift: course.shift.label().to_string(),
            dates: course.dates.clone(),
            unit: course.unit.clone(),
            online: is_online(course),
            is_new: course.is_new,
            price: price_display(course),
            enroll_url: self.enroll_url(course),
        }
    }

    pub fn build_all(&self, courses: &[Course]) -> Vec<CourseCard> {
        courses.iter().map(|c| self.build(c)).collect()
    }

    /// WhatsApp deep link carrying a prefilled enrollment message.
    pub fn enroll_url(&self, course: &Course) -> String {
        let message = format!(
            "Tenho interesse no curso {} ({}). Gostaria de mais informações.",
            course.name,
            course.shift.label()
        );
        format!(
            "https://wa.me/{}?text={}",
            self.whatsapp_number,
            encode_uri_component(&message)
        )
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, with spaces as `%20`.
fn encode_uri_component(text: &str) -> String {
    // Form encoding differs only in `+` for spaces and in escaping `! ' ( ) ~`.
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%7E", "~")
}

fn price_display(course: &Course) -> PriceDisplay {
    if course.total_value == 0.0 {
        return PriceDisplay {
            free: true,
            headline: "GRATUITO".to_string(),
            total_label: None,
        };
    }
    PriceDisplay {
        free: false,
        headline: format!(
            "{}x de {}",
            course.installments,
            format_brl(course.installment_value)
        ),
        total_label: Some(format!("Valor total: {}", format_brl(course.total_value))),
    }
}

/// Brazilian currency format: "R$ 1.899,00".
pub fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let units = (cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shift;
    use crate::seed::seed_courses;

    #[test]
    fn brl_formatting() {
        assert_eq!(format_brl(1899.0), "R$ 1.899,00");
        assert_eq!(format_brl(189.9), "R$ 189,90");
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(-5.5), "-R$ 5,50");
    }

    #[test]
    fn paid_course_card() {
        let builder = CardBuilder::new(DEFAULT_WHATSAPP_NUMBER);
        let card = builder.build(&seed_courses()[0]);
        assert_eq!(card.price.headline, "10x de R$ 189,90");
        assert_eq!(card.price.total_label.as_deref(), Some("Valor total: R$ 1.899,00"));
        assert!(!card.price.free);
        assert!(!card.online);
        assert_eq!(card.shift, "Noite");
    }

    #[test]
    fn free_course_card_has_no_installments() {
        let mut course = seed_courses().remove(2);
        course.total_value = 0.0;
        course.shift = Shift::Remote;
        let card = CardBuilder::new("5511999999999").build(&course);
        assert!(card.price.free);
        assert_eq!(card.price.headline, "GRATUITO");
        assert!(card.price.total_label.is_none());
        assert!(card.online);
    }

    #[test]
    fn enroll_url_encodes_message() {
        let builder = CardBuilder::new("559231829925");
        let url = builder.enroll_url(&seed_courses()[2]);
        assert!(url.starts_with("https://wa.me/559231829925?text="));

        assert_eq!(
            url,
            "https://wa.me/559231829925?text=Tenho%20interesse%20no%20curso%20Excel%20Avan%C3%A7ado%20(Noite).%20Gostaria%20de%20mais%20informa%C3%A7%C3%B5es."
        );

        let parsed = url::Url::parse(&url).unwrap();
        let (_, text) = parsed.query_pairs().next().unwrap();
        assert_eq!(
            text,
            "Tenho interesse no curso Excel Avançado (Noite). Gostaria de mais informações."
        );
    }

    #[test]
    fn uri_component_encoding() {
        assert_eq!(encode_uri_component("a b+c"), "a%20b%2Bc");
        assert_eq!(encode_uri_component("(x)!~*'-_."), "(x)!~*'-_.");
        assert_eq!(encode_uri_component("R$ 10/h & 50%"), "R%24%2010%2Fh%20%26%2050%25");
    }
}
