use std::io::Write;

/// One line of a tab-separated charge file.
///
/// Charge rows carry no frame number; `line` is the 1-based position in the
/// source file and the only identity a row has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRecord {
    pub line: usize,
    pub text: String,
}

impl ChargeRecord {
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Self { line, text }
    }

    /// Row content without trailing whitespace or line terminator.
    pub fn content(&self) -> &str {
        self.text.trim_end()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.content().split('\t')
    }

    pub fn has_nan(&self) -> bool {
        self.fields()
            .any(|f| f.trim().eq_ignore_ascii_case("nan"))
    }

    /// A row whose leading field is not a number is a column-label row.
    pub fn looks_like_header(&self) -> bool {
        self.fields()
            .next()
            .map(|f| f.trim().parse::<f64>().is_err())
            .unwrap_or(false)
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_text_with_newline() {
        let rec = ChargeRecord::new(3, "0.1\t0.2");
        assert_eq!(rec.text, "0.1\t0.2\n");
        assert_eq!(rec.content(), "0.1\t0.2");
    }

    #[test]
    fn content_trims_trailing_tabs() {
        let rec = ChargeRecord::new(1, "0.1\t0.2\t\r\n");
        assert_eq!(rec.content(), "0.1\t0.2");
        assert_eq!(rec.fields().count(), 2);
    }

    #[test]
    fn detects_nan_fields() {
        assert!(ChargeRecord::new(1, "0.1\tnan\t0.3").has_nan());
        assert!(ChargeRecord::new(1, "NaN\t0.3").has_nan());
        assert!(!ChargeRecord::new(1, "0.1\t0.2").has_nan());
    }

    #[test]
    fn recognises_label_rows() {
        assert!(ChargeRecord::new(1, "0 N\t1 H\t2 C").looks_like_header());
        assert!(!ChargeRecord::new(2, "-0.41\t0.27\t0.03").looks_like_header());
        assert!(!ChargeRecord::new(2, "nan\t0.27").looks_like_header());
    }
}
