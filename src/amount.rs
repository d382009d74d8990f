use regex::Regex;

use crate::error::{BsmapError, Result};

/// Pulls numeric tokens and footnote markers out of raw value strings.
///
/// Statements mark negatives with a glyph such as `△` and attach footnote
/// references such as `※6`; both markers are configurable.
#[derive(Debug, Clone)]
pub struct AmountParser {
    number: Regex,
    annotation: Regex,
    negative_marker: String,
}

impl AmountParser {
    pub fn new(negative_marker: &str, annotation_marker: &str) -> Result<Self> {
        if annotation_marker.is_empty() {
            return Err(BsmapError::Config(
                "annotation_marker must not be empty".to_string(),
            ));
        }
        let sign = if negative_marker.is_empty() {
            "-?".to_string()
        } else {
            format!("(?:{}|-)?", regex::escape(negative_marker))
        };
        // At least one digit: a lone "," is not an amount.
        let number = Regex::new(&format!(r"{sign}[\d,]*\d[\d,]*"))?;
        let annotation = Regex::new(&format!(r"{}[0-9,\s]*", regex::escape(annotation_marker)))?;
        Ok(Self {
            number,
            annotation,
            negative_marker: negative_marker.to_string(),
        })
    }

    /// First signed digit-and-comma run in `raw`, with the negative glyph
    /// rewritten to `-`. Empty when `raw` holds no digits.
    pub fn normalize(&self, raw: &str) -> String {
        let Some(found) = self.number.find(raw) else {
            return String::new();
        };
        let token = found.as_str();
        if !self.negative_marker.is_empty() {
            if let Some(rest) = token.strip_prefix(self.negative_marker.as_str()) {
                return format!("-{rest}");
            }
        }
        token.to_string()
    }

    /// Every footnote marker in `raw`, concatenated and trimmed.
    pub fn annotations(&self, raw: &str) -> String {
        let joined: String = self.annotation.find_iter(raw).map(|m| m.as_str()).collect();
        joined.trim().to_string()
    }
}

/// Loose numeric test used for column sniffing: commas dropped, the negative
/// glyph read as `-`.
pub fn looks_numeric(raw: &str, negative_marker: &str) -> bool {
    let mut s = raw.replace(',', "");
    if !negative_marker.is_empty() {
        s = s.replace(negative_marker, "-");
    }
    s.trim().parse::<f64>().is_ok()
}
