use crate::files::DEFAULT_OUTPUT_PREFIX;
use crate::language::LanguageSet;
use crate::rasterizer::DEFAULT_DPI;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_LANGUAGE_LIST: &str = "eng+tur";
pub const DEFAULT_OCR_WORKERS: usize = 4;
/// 50MB
pub const DEFAULT_MAX_FILE_SIZE: usize = 52_428_800;

#[derive(Parser, Debug)]
#[command(name = "ocr-processor")]
#[command(about = "Extract text from PDF, DOCX and image documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// OCR languages, joined with '+' (e.g., "eng+tur")
    #[arg(long, env = "OCR_LANGUAGES", default_value = DEFAULT_LANGUAGE_LIST)]
    pub languages: LanguageSet,

    /// OCR engine to use (defaults to the first compiled engine)
    #[arg(long, env = "OCR_ENGINE")]
    pub engine: Option<String>,

    /// Number of threads running per-page OCR for PDFs
    #[arg(
        long,
        env = "OCR_WORKERS",
        default_value_t = DEFAULT_OCR_WORKERS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub ocr_workers: usize,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: usize,

    /// pdftoppm executable used to rasterize PDF pages
    #[arg(long, env = "OCR_PDFTOPPM", default_value = "pdftoppm")]
    pub pdftoppm_path: PathBuf,

    /// Resolution of rasterized PDF pages
    #[arg(long, env = "OCR_PDF_DPI", default_value_t = DEFAULT_DPI)]
    pub pdf_dpi: u32,

    /// Directory for buffered uploads (system temp dir if not set)
    #[arg(long, env = "OCR_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Collapse whitespace and strip symbols from extracted text
    #[arg(long, env = "OCR_NORMALIZE_TEXT")]
    pub normalize_text: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (the default)
    Serve,
    /// Extract text from local files
    Process {
        /// Documents to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write `<prefix><name>.txt` files here instead of printing JSON
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// File name prefix for written text files
        #[arg(long, default_value = DEFAULT_OUTPUT_PREFIX)]
        prefix: String,
    },
}

/// Server and processor configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub languages: LanguageSet,
    pub engine: Option<String>,
    pub ocr_workers: usize,
    pub max_file_size: usize,
    pub pdftoppm_path: PathBuf,
    pub pdf_dpi: u32,
    pub upload_dir: Option<PathBuf>,
    pub tessdata_path: Option<String>,
    pub normalize_text: bool,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            languages: LanguageSet::default(),
            engine: None,
            ocr_workers: DEFAULT_OCR_WORKERS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            pdftoppm_path: PathBuf::from("pdftoppm"),
            pdf_dpi: DEFAULT_DPI,
            upload_dir: None,
            tessdata_path: None,
            normalize_text: false,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            languages: args.languages,
            engine: args.engine,
            ocr_workers: args.ocr_workers,
            max_file_size: args.max_file_size,
            pdftoppm_path: args.pdftoppm_path,
            pdf_dpi: args.pdf_dpi,
            upload_dir: args.upload_dir,
            tessdata_path: args.tessdata_path,
            normalize_text: args.normalize_text,
        }
    }
}
