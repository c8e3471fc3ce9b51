use image::{DynamicImage, ImageFormat, RgbImage};
use ocr_processor::config::Config;
use ocr_processor::engine::OcrEngine;
use ocr_processor::error::ProcessingError;
use ocr_processor::language::LanguageSet;
use ocr_processor::processor::{DocumentProcessor, ProcessorOptions};
use ocr_processor::rasterizer::Rasterizer;
use ocr_processor::server::{router, AppState, UPLOAD_PREFIX};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

const MAX_FILE_SIZE: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    text: String,
    pages: usize,
    format: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct InfoResponse {
    version: String,
    engine: String,
    supported_formats: Vec<String>,
    languages: Vec<String>,
    ocr_workers: usize,
    max_file_size_bytes: usize,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Reads an image's width back as its text
struct WidthEngine;

impl OcrEngine for WidthEngine {
    fn name(&self) -> &'static str {
        "width"
    }

    fn description(&self) -> &'static str {
        "reports image width"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        _languages: &LanguageSet,
    ) -> Result<String, ProcessingError> {
        Ok(format!("width {}\n", image.width()))
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string(), "tur".to_string()]
    }
}

/// Three pages of widths 1, 2 and 3, whatever the input
struct ThreePages;

impl Rasterizer for ThreePages {
    fn rasterize(&self, _path: &Path) -> Result<Vec<DynamicImage>, ProcessingError> {
        Ok((1..=3)
            .map(|w| DynamicImage::ImageRgb8(RgbImage::new(w, 1)))
            .collect())
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Config {
            max_file_size: MAX_FILE_SIZE,
            ..Config::default()
        })
        .await
    }

    async fn start_with(config: Config) -> Self {
        let processor = DocumentProcessor::new(
            Arc::new(WidthEngine),
            Arc::new(ThreePages),
            ProcessorOptions {
                ocr_workers: 2,
                ..ProcessorOptions::default()
            },
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(AppState::new(processor, config));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    async fn upload(&self, name: &str, data: Vec<u8>) -> reqwest::Response {
        let form = Form::new().part("file", Part::bytes(data).file_name(name.to_string()));
        self.post(form).await
    }

    async fn post(&self, form: Form) -> reqwest::Response {
        self.client
            .post(format!("{}/process", self.base_url))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

fn png_bytes(width: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, 2))
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buffer
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let health: HealthResponse = response.json().await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_info_endpoint() {
    let server = TestServer::start().await;

    let info: InfoResponse = server
        .client
        .get(format!("{}/info", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(info.engine, "width");
    assert_eq!(info.languages, vec!["eng", "tur"]);
    assert_eq!(info.ocr_workers, 2);
    assert_eq!(info.max_file_size_bytes, MAX_FILE_SIZE);
    assert!(info.supported_formats.contains(&".pdf".to_string()));
    assert!(info.supported_formats.contains(&".docx".to_string()));
}

#[tokio::test]
async fn test_process_image() {
    let server = TestServer::start().await;

    let response = server.upload("scan.png", png_bytes(7)).await;

    assert_eq!(response.status(), 200);
    let result: ProcessResponse = response.json().await.unwrap();
    assert_eq!(result.text, "width 7");
    assert_eq!(result.pages, 1);
    assert_eq!(result.format, "image");
}

#[tokio::test]
async fn test_process_pdf_keeps_page_order() {
    let server = TestServer::start().await;

    let response = server.upload("report.pdf", b"%PDF-1.4".to_vec()).await;

    assert_eq!(response.status(), 200);
    let result: ProcessResponse = response.json().await.unwrap();
    assert_eq!(result.text, "width 1\nwidth 2\nwidth 3");
    assert_eq!(result.pages, 3);
    assert_eq!(result.format, "pdf");
}

#[tokio::test]
async fn test_process_docx() {
    let server = TestServer::start().await;

    let response = server
        .upload("letter.docx", docx_bytes(&["Dear reader", "Regards"]))
        .await;

    assert_eq!(response.status(), 200);
    let result: ProcessResponse = response.json().await.unwrap();
    assert_eq!(result.text, "Dear reader\nRegards");
    assert_eq!(result.pages, 2);
    assert_eq!(result.format, "docx");
}

#[tokio::test]
async fn test_unsupported_format_is_server_error() {
    let server = TestServer::start().await;

    let response = server.upload("notes.txt", b"plain text".to_vec()).await;

    assert_eq!(response.status(), 500);
    let error: ErrorResponse = response.json().await.unwrap();
    assert!(error.detail.contains("Unsupported file format"));
    assert!(error.detail.contains(".txt"));
}

#[tokio::test]
async fn test_corrupt_docx_is_server_error() {
    let server = TestServer::start().await;

    let response = server.upload("broken.docx", b"not a zip".to_vec()).await;

    assert_eq!(response.status(), 500);
    let error: ErrorResponse = response.json().await.unwrap();
    assert!(!error.detail.is_empty());
}

#[tokio::test]
async fn test_missing_file_field() {
    let server = TestServer::start().await;

    let response = server.post(Form::new().text("other", "value")).await;

    assert_eq!(response.status(), 400);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.detail, "Missing file in request");
}

#[tokio::test]
async fn test_file_too_large() {
    let server = TestServer::start().await;

    let response = server
        .upload("big.png", vec![0u8; MAX_FILE_SIZE + 1])
        .await;

    assert_eq!(response.status(), 413);
    let error: ErrorResponse = response.json().await.unwrap();
    assert!(error.detail.contains(&MAX_FILE_SIZE.to_string()));
}

#[tokio::test]
async fn test_uploads_are_removed_after_processing() {
    let uploads = tempfile::tempdir().unwrap();
    let server = TestServer::start_with(Config {
        max_file_size: MAX_FILE_SIZE,
        upload_dir: Some(uploads.path().to_path_buf()),
        ..Config::default()
    })
    .await;

    let ok = server.upload("scan.png", png_bytes(3)).await;
    assert_eq!(ok.status(), 200);

    let failed = server.upload("broken.docx", b"not a zip".to_vec()).await;
    assert_eq!(failed.status(), 500);

    let too_large = server
        .upload("big.png", vec![0u8; MAX_FILE_SIZE + 1])
        .await;
    assert_eq!(too_large.status(), 413);

    let leftovers: Vec<_> = std::fs::read_dir(uploads.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name.to_string_lossy().starts_with(UPLOAD_PREFIX))
        .collect();
    assert!(leftovers.is_empty(), "upload files left behind: {:?}", leftovers);
}
