//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod download;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::ProcessingError;
use crate::language::LanguageSet;
use std::sync::Arc;

/// Registry of the OCR engines compiled into this binary
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
    default_engine: String,
}

impl EngineRegistry {
    /// Create a new engine registry with all available engines initialized
    #[allow(unused_variables, unused_mut)]
    pub fn new(config: &Config) -> Result<Self, ProcessingError> {
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        Self::from_engines(engines)
    }

    /// Build a registry from already constructed engines. The first one is
    /// the default.
    pub fn from_engines(engines: Vec<Arc<dyn OcrEngine>>) -> Result<Self, ProcessingError> {
        let default_engine = engines
            .first()
            .map(|e| e.name().to_string())
            .ok_or_else(|| {
                ProcessingError::Initialization(
                    "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string(),
                )
            })?;

        Ok(Self {
            engines,
            default_engine,
        })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// Get the engine named by `name`. Without a name, the first engine
    /// that lists every code in `languages` is chosen.
    pub fn select(
        &self,
        name: Option<&str>,
        languages: &LanguageSet,
    ) -> Result<Arc<dyn OcrEngine>, ProcessingError> {
        if let Some(wanted) = name {
            return self.get(wanted).ok_or_else(|| {
                ProcessingError::Initialization(format!(
                    "OCR engine '{}' is not available (compiled engines: {})",
                    wanted,
                    self.list().join(", ")
                ))
            });
        }

        self.engines
            .iter()
            .find(|e| covers(e.as_ref(), languages))
            .cloned()
            .ok_or_else(|| {
                ProcessingError::Initialization(format!(
                    "No compiled OCR engine supports languages '{}' (compiled engines: {}). \
                     Build with --features engine-leptess or pass --engine explicitly",
                    languages,
                    self.list().join(", ")
                ))
            })
    }

    /// Get the default engine name
    pub fn default_name(&self) -> &str {
        &self.default_engine
    }

    /// List all available engine names
    pub fn list(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

fn covers(engine: &dyn OcrEngine, languages: &LanguageSet) -> bool {
    let supported = engine.supported_languages();
    languages.codes().iter().all(|code| supported.contains(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    struct NamedEngine(&'static str, &'static [&'static str]);

    impl OcrEngine for NamedEngine {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "test engine"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _languages: &LanguageSet,
        ) -> Result<String, ProcessingError> {
            Ok(self.0.to_string())
        }

        fn supported_languages(&self) -> Vec<String> {
            self.1.iter().map(|l| l.to_string()).collect()
        }
    }

    fn registry() -> EngineRegistry {
        EngineRegistry::from_engines(vec![
            Arc::new(NamedEngine("latin", &["eng"])) as Arc<dyn OcrEngine>,
            Arc::new(NamedEngine("tesseract", &["eng", "tur"])),
        ])
        .unwrap()
    }

    fn languages(list: &str) -> LanguageSet {
        list.parse().unwrap()
    }

    #[test]
    fn test_first_engine_is_default() {
        let registry = registry();
        assert_eq!(registry.default_name(), "latin");
        assert_eq!(registry.list(), vec!["latin", "tesseract"]);
    }

    #[test]
    fn test_select_by_name() {
        let registry = registry();
        let engine = registry.select(Some("latin"), &languages("eng+tur")).unwrap();
        assert_eq!(engine.name(), "latin");

        let err = registry.select(Some("missing"), &languages("eng")).err().unwrap();
        assert!(err.to_string().contains("latin, tesseract"));
    }

    #[test]
    fn test_select_picks_engine_covering_languages() {
        let registry = registry();
        assert_eq!(registry.select(None, &languages("eng")).unwrap().name(), "latin");
        assert_eq!(
            registry.select(None, &languages("eng+tur")).unwrap().name(),
            "tesseract"
        );
    }

    #[test]
    fn test_select_fails_without_covering_engine() {
        let registry =
            EngineRegistry::from_engines(vec![
                Arc::new(NamedEngine("latin", &["eng"])) as Arc<dyn OcrEngine>
            ])
            .unwrap();

        let err = registry.select(None, &languages("eng+tur")).err().unwrap();
        assert!(matches!(err, ProcessingError::Initialization(_)));
        assert!(err.to_string().contains("eng+tur"));
    }

    #[test]
    fn test_empty_registry_is_an_error() {
        assert!(EngineRegistry::from_engines(Vec::new()).is_err());
    }
}
