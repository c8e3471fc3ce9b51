//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine, the one to use for non-English language sets
//! such as `eng+tur`. Uses tesseract-static crate for static linking (no
//! system dependencies). Downloads tessdata (training data) for every
//! configured language on first use.

use super::download::{cache_dir, ensure_downloaded};
use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::ProcessingError;
use crate::language::LanguageSet;
use image::DynamicImage;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Languages whose traineddata is present
    languages: Vec<String>,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, ProcessingError> {
        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available(&config.languages)?,
        };

        // Validate that tessdata is accessible by doing a test initialization
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&config.languages.joined()))
            .map_err(|e| {
                ProcessingError::Initialization(format!("Failed to initialize Tesseract: {}", e))
            })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, languages: {})",
            tessdata_path,
            config.languages
        );

        Ok(Self {
            tessdata_path,
            languages: config.languages.codes().to_vec(),
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - multi-language, better for noisy/messy images"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        languages: &LanguageSet,
    ) -> Result<String, ProcessingError> {
        let rgb_img = image.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // BMP is always supported by leptonica
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| ProcessingError::Ocr(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        // Tesseract handles are not thread-safe, so every call gets its own
        let mut tess = Tesseract::new(Some(&self.tessdata_path), Some(&languages.joined()))
            .map_err(|e| ProcessingError::Ocr(format!("Failed to create Tesseract: {}", e)))?;

        tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            ProcessingError::Ocr(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| ProcessingError::Ocr(format!("Failed to recognize text: {}", e)))?;

        tess.get_text()
            .map_err(|e| ProcessingError::Ocr(format!("Failed to get text: {}", e)))
    }

    fn supported_languages(&self) -> Vec<String> {
        self.languages.clone()
    }
}

/// Ensure tessdata for every language is cached, returning the directory
fn ensure_tessdata_available(languages: &LanguageSet) -> Result<String, ProcessingError> {
    let dir = cache_dir(Some("tessdata"))?;

    for language in languages.codes() {
        ensure_downloaded(
            &tessdata_url(language),
            &dir,
            &format!("{}.traineddata", language),
        )?;
    }

    // Tesseract expects the directory, not the file
    dir.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ProcessingError::Initialization("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}
