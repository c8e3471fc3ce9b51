//! Document dispatch and per-format text extraction

use crate::config::{Config, DEFAULT_OCR_WORKERS};
use crate::docx;
use crate::engine::OcrEngine;
use crate::engines::EngineRegistry;
use crate::error::ProcessingError;
use crate::files::{self, FileDescriptor};
use crate::language::LanguageSet;
use crate::rasterizer::{PdftoppmRasterizer, Rasterizer};
use crate::text;
use image::DynamicImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Extraction path, chosen from the file extension alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Image,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, ProcessingError> {
        match files::extension_of(path).as_str() {
            ".pdf" => Ok(Self::Pdf),
            ".doc" | ".docx" => Ok(Self::Docx),
            ".png" | ".jpg" | ".jpeg" => Ok(Self::Image),
            other => Err(ProcessingError::UnsupportedFormat(if other.is_empty() {
                "<none>".to_string()
            } else {
                other.to_string()
            })),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text extracted from one document.
///
/// For DOCX input `pages` holds the number of body paragraphs; the field
/// keeps its name so every format shares one response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub text: String,
    pub pages: usize,
    pub format: DocumentFormat,
}

/// Knobs fixed at processor construction
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub languages: LanguageSet,
    /// Size of the PDF page OCR pool
    pub ocr_workers: usize,
    /// Run [`text::normalize`] over every result
    pub normalize_text: bool,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            languages: LanguageSet::default(),
            ocr_workers: DEFAULT_OCR_WORKERS,
            normalize_text: false,
        }
    }
}

impl From<&Config> for ProcessorOptions {
    fn from(config: &Config) -> Self {
        Self {
            languages: config.languages.clone(),
            ocr_workers: config.ocr_workers,
            normalize_text: config.normalize_text,
        }
    }
}

/// Routes documents to their extraction path.
///
/// PDF pages are recognized on a dedicated pool of `ocr_workers` threads and
/// reassembled in page order. All log output is emitted inside the span
/// given at construction (see [`DocumentProcessor::with_span`]).
pub struct DocumentProcessor {
    engine: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn Rasterizer>,
    languages: LanguageSet,
    normalize_text: bool,
    pool: rayon::ThreadPool,
    span: tracing::Span,
}

impl DocumentProcessor {
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn Rasterizer>,
        options: ProcessorOptions,
    ) -> Result<Self, ProcessingError> {
        let workers = options.ocr_workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ocr-worker-{}", i))
            .build()
            .map_err(|e| {
                ProcessingError::Initialization(format!("Failed to start OCR worker pool: {}", e))
            })?;

        let supported = engine.supported_languages();
        for code in options.languages.codes() {
            if !supported.contains(code) {
                tracing::warn!(
                    "OCR engine '{}' does not list language '{}'",
                    engine.name(),
                    code
                );
            }
        }

        let span = tracing::info_span!("document_processor", engine = engine.name());

        Ok(Self {
            engine,
            rasterizer,
            languages: options.languages,
            normalize_text: options.normalize_text,
            pool,
            span,
        })
    }

    /// Build the processor the server runs with: the configured engine
    /// from the registry and a pdftoppm rasterizer.
    pub fn from_config(config: &Config) -> Result<Self, ProcessingError> {
        let registry = EngineRegistry::new(config)?;
        tracing::info!("Available OCR engines: {}", registry.list().join(", "));
        let engine = registry.select(config.engine.as_deref(), &config.languages)?;
        tracing::info!("Using {} engine: {}", engine.name(), engine.description());
        let rasterizer = Arc::new(PdftoppmRasterizer::new(
            config.pdftoppm_path.clone(),
            config.pdf_dpi,
        ));

        Self::new(engine, rasterizer, ProcessorOptions::from(config))
    }

    /// Replace the span all processing is logged under
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn ocr_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Extract the text of the document at `path`.
    ///
    /// Failures are logged and returned as produced by the extraction step.
    pub fn process(&self, path: &Path) -> Result<ProcessingResult, ProcessingError> {
        let _entered = self.span.enter();
        let start = Instant::now();

        match self.dispatch(path) {
            Ok(result) => {
                tracing::info!(
                    "Processed {} document in {}ms: {} pages, {} chars",
                    result.format,
                    start.elapsed().as_millis(),
                    result.pages,
                    result.text.len()
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!("Error processing document: {}", e);
                Err(e)
            }
        }
    }

    fn dispatch(&self, path: &Path) -> Result<ProcessingResult, ProcessingError> {
        files::validate(path)?;
        let format = DocumentFormat::from_path(path)?;

        if let Ok(info) = FileDescriptor::from_path(path) {
            tracing::debug!(
                name = %info.name,
                size_bytes = info.size_bytes,
                "Processing {} document",
                format
            );
        }

        let mut result = match format {
            DocumentFormat::Pdf => self.process_pdf(path)?,
            DocumentFormat::Docx => self.process_docx(path)?,
            DocumentFormat::Image => self.process_image(path)?,
        };

        if self.normalize_text {
            result.text = text::normalize(&result.text);
        }

        Ok(result)
    }

    fn process_pdf(&self, path: &Path) -> Result<ProcessingResult, ProcessingError> {
        let images = self.rasterizer.rasterize(path)?;
        if images.is_empty() {
            return Err(ProcessingError::Rasterization("PDF has no pages".to_string()));
        }
        tracing::debug!("Rasterized {} pages", images.len());

        let engine = self.engine.as_ref();
        let languages = &self.languages;
        let parent = &self.span;

        // Indexed collect keeps page order whatever order pages finish in
        let texts = self.pool.install(|| {
            images
                .par_iter()
                .enumerate()
                .map(|(index, image)| {
                    let span = tracing::debug_span!(parent: parent, "page", number = index + 1);
                    let _entered = span.enter();
                    extract_text(engine, image, languages)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok(ProcessingResult {
            text: texts.join("\n"),
            pages: images.len(),
            format: DocumentFormat::Pdf,
        })
    }

    fn process_docx(&self, path: &Path) -> Result<ProcessingResult, ProcessingError> {
        let paragraphs = docx::read_paragraphs(path)?;

        Ok(ProcessingResult {
            text: paragraphs.join("\n"),
            pages: paragraphs.len(),
            format: DocumentFormat::Docx,
        })
    }

    fn process_image(&self, path: &Path) -> Result<ProcessingResult, ProcessingError> {
        files::validate_image(path)?;
        // Decoder comes from the content; a PNG named .jpg still loads
        let image = image::ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| ProcessingError::Ocr(format!("Failed to load image: {}", e)))?
            .decode()
            .map_err(|e| ProcessingError::Ocr(format!("Failed to load image: {}", e)))?;

        Ok(ProcessingResult {
            text: self.extract(&image)?,
            pages: 1,
            format: DocumentFormat::Image,
        })
    }

    /// OCR one image with the configured engine and languages
    pub fn extract(&self, image: &DynamicImage) -> Result<String, ProcessingError> {
        extract_text(self.engine.as_ref(), image, &self.languages)
    }
}

/// Run one recognition call and trim the result.
///
/// Any engine failure comes back as [`ProcessingError::Ocr`].
pub fn extract_text(
    engine: &dyn OcrEngine,
    image: &DynamicImage,
    languages: &LanguageSet,
) -> Result<String, ProcessingError> {
    match engine.recognize(image, languages) {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            tracing::error!("OCR extraction error: {}", e);
            Err(match e {
                ProcessingError::Ocr(_) => e,
                other => ProcessingError::Ocr(other.to_string()),
            })
        }
    }
}
