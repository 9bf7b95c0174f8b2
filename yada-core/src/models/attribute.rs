use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between triples in a food's extra info string.
pub const SEPARATOR: char = '|';

/// One `field=value:unit` triple from a food's extra info, e.g. `protein=5:g`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    pub field: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("Malformed attribute '{0}': expected field=value:unit")]
    Malformed(String),
}

impl Attribute {
    pub fn new(field: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value,
            unit: unit.into(),
        }
    }
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AttributeError::Malformed(s.trim().to_string());

        let (field, rest) = s.split_once('=').ok_or_else(malformed)?;
        let (value, unit) = rest.split_once(':').ok_or_else(malformed)?;
        if rest.contains('=') || unit.contains(':') {
            return Err(malformed());
        }

        let field = field.trim();
        if field.is_empty() {
            return Err(malformed());
        }
        let value: f64 = value.trim().parse().map_err(|_| malformed())?;
        if !value.is_finite() {
            return Err(malformed());
        }

        Ok(Attribute::new(field, value, unit.trim()))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}:{}", self.field, format_amount(self.value), self.unit)
    }
}

/// Formats a quantity without a trailing `.0` for whole numbers.
pub fn format_amount(value: f64) -> String {
    format!("{}", value)
}

/// Parses every non-empty triple of an extra info string.
pub fn parse_extra_info(info: &str) -> impl Iterator<Item = Result<Attribute, AttributeError>> + '_ {
    info.split(SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<Attribute>())
}

/// Joins triples back into an extra info string.
pub fn join_attributes<'a>(attributes: impl IntoIterator<Item = &'a Attribute>) -> String {
    attributes
        .into_iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_parse() {
        let attr: Attribute = "protein=5:g".parse().unwrap();
        assert_eq!(attr, Attribute::new("protein", 5.0, "g"));
    }

    #[test]
    fn test_attribute_parse_trims() {
        let attr: Attribute = " fiber = 2.5 : g ".parse().unwrap();
        assert_eq!(attr, Attribute::new("fiber", 2.5, "g"));
    }

    #[test]
    fn test_attribute_parse_malformed() {
        assert!("protein".parse::<Attribute>().is_err());
        assert!("protein=5".parse::<Attribute>().is_err());
        assert!("protein=five:g".parse::<Attribute>().is_err());
        assert!("=5:g".parse::<Attribute>().is_err());
        assert!("a=b=5:g".parse::<Attribute>().is_err());
        assert!("protein=5:g:x".parse::<Attribute>().is_err());
        assert!("protein=NaN:g".parse::<Attribute>().is_err());
    }

    #[test]
    fn test_attribute_display_strips_whole_fraction() {
        assert_eq!(Attribute::new("protein", 13.0, "g").to_string(), "protein=13:g");
        assert_eq!(Attribute::new("fat", 1.5, "g").to_string(), "fat=1.5:g");
    }

    #[test]
    fn test_parse_extra_info_skips_empty_parts() {
        let parsed: Vec<_> = parse_extra_info("protein=5:g | | sodium=10:mg|").collect();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(Result::is_ok));
    }

    #[test]
    fn test_parse_extra_info_reports_malformed() {
        let parsed: Vec<_> = parse_extra_info("protein=5:g|junk").collect();
        assert!(parsed[0].is_ok());
        assert_eq!(
            parsed[1],
            Err(AttributeError::Malformed("junk".to_string()))
        );
    }

    #[test]
    fn test_join_attributes() {
        let attrs = vec![
            Attribute::new("protein", 5.0, "g"),
            Attribute::new("sodium", 0.2, "mg"),
        ];
        assert_eq!(join_attributes(&attrs), "protein=5:g|sodium=0.2:mg");
    }
}
