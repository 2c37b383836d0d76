// ============================================================
// Layer 4 - Cell Preprocessor
// ============================================================
// Normalises raw CSV cells before they are interpreted.
//
// Why do we need to clean cells?
//   Exported spreadsheets often contain:
//   - A byte order mark in front of the first header
//   - Padding spaces around values ("  Yes ")
//   - Blank numeric cells (new customers have no TotalCharges yet)
//
// A blank or unparsable numeric cell is reported as None so the
// loader can skip the row instead of guessing a value.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Strip BOM, surrounding whitespace and quotes from a header name
    pub fn clean_header(&self, raw: &str) -> String {
        raw.trim_start_matches('\u{FEFF}')
            .trim()
            .trim_matches('"')
            .trim()
            .to_string()
    }

    /// Trim a categorical label; inner spacing is kept because it is
    /// part of labels like "Electronic check"
    pub fn clean_label(&self, raw: &str) -> String {
        raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{00A0}').to_string()
    }

    /// Parse a numeric cell. Blank, NaN and non-numeric cells yield None.
    pub fn parse_numeric(&self, raw: &str) -> Option<f32> {
        let cleaned = self.clean_label(raw);
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bom_is_removed() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_header("\u{FEFF}customerID"), "customerID");
        assert_eq!(p.clean_header(" \"tenure\" "), "tenure");
    }

    #[test]
    fn test_blank_numeric_is_none() {
        let p = Preprocessor::new();
        assert_eq!(p.parse_numeric(" "), None);
        assert_eq!(p.parse_numeric(""), None);
    }

    #[test]
    fn test_numeric_parsing() {
        let p = Preprocessor::new();
        assert_eq!(p.parse_numeric(" 29.85 "), Some(29.85));
        assert_eq!(p.parse_numeric("NaN"), None);
        assert_eq!(p.parse_numeric("abc"), None);
    }

    #[test]
    fn test_label_keeps_inner_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_label("  Electronic check "), "Electronic check");
    }
}
