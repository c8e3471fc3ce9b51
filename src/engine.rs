use crate::error::ProcessingError;
use crate::language::LanguageSet;
use image::DynamicImage;

/// Trait that all OCR engines must implement
///
/// Engines are shared across the PDF worker pool, so a single instance must
/// accept concurrent `recognize` calls.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize the text in one decoded image.
    ///
    /// Returns the raw engine output; callers take care of trimming.
    fn recognize(
        &self,
        image: &DynamicImage,
        languages: &LanguageSet,
    ) -> Result<String, ProcessingError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
