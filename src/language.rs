//! OCR language selection

use crate::error::ProcessingError;
use std::fmt;
use std::str::FromStr;

/// Languages used when none are configured (English and Turkish)
pub const DEFAULT_LANGUAGES: &[&str] = &["eng", "tur"];

/// Ordered, de-duplicated set of Tesseract-style language codes.
///
/// The set is fixed when the processor is built and handed to the engine on
/// every recognition call. Engines that take a single language string get
/// the codes joined with `+` (e.g. `eng+tur`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    codes: Vec<String>,
}

impl LanguageSet {
    pub fn new<I, S>(codes: I) -> Result<Self, ProcessingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();

        for code in codes {
            let code = code.as_ref().trim().to_lowercase();
            if code.is_empty() {
                continue;
            }
            if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ProcessingError::InvalidRequest(format!(
                    "Invalid language code: {}",
                    code
                )));
            }
            if !unique.contains(&code) {
                unique.push(code);
            }
        }

        if unique.is_empty() {
            return Err(ProcessingError::InvalidRequest(
                "At least one OCR language is required".to_string(),
            ));
        }

        Ok(Self { codes: unique })
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    /// Codes joined with `+`, the form Tesseract expects
    pub fn joined(&self) -> String {
        self.codes.join("+")
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self {
            codes: DEFAULT_LANGUAGES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl FromStr for LanguageSet {
    type Err = ProcessingError;

    /// Accepts `eng+tur`, `eng,tur` or whitespace separated codes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(|c: char| c == '+' || c == ',' || c.is_whitespace()))
    }
}

impl fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}
