//! On-disk template trees and matching configuration.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::Config;
use crate::template::{DESCRIPTOR_FILE, EVALUATION_FILE, MARKER_IMAGE_FILE, TUNING_CONFIG_FILE};

/// A templates/outputs/tmp layout rooted in a test directory.
#[derive(Debug, Clone)]
pub struct TemplateFixture {
    root: PathBuf,
}

impl TemplateFixture {
    pub fn new(root: &Path) -> Self {
        let fixture = Self {
            root: root.to_path_buf(),
        };
        for dir in [fixture.templates_dir(), fixture.outputs_dir(), fixture.temp_dir()] {
            std::fs::create_dir_all(dir).expect("create fixture dir");
        }
        fixture
    }

    /// Add a template with all cached assets, plus `evaluation.json` if asked.
    pub fn with_template(self, template_id: &str, with_evaluation: bool) -> Self {
        let dir = self.templates_dir().join(template_id);
        std::fs::create_dir_all(&dir).expect("create template dir");
        std::fs::write(dir.join(DESCRIPTOR_FILE), Self::descriptor(template_id))
            .expect("write descriptor");
        std::fs::write(dir.join(TUNING_CONFIG_FILE), br#"{"dimensions":{"processing_width":666}}"#)
            .expect("write tuning config");
        std::fs::write(dir.join(MARKER_IMAGE_FILE), b"marker").expect("write marker");
        if with_evaluation {
            std::fs::write(dir.join(EVALUATION_FILE), Self::evaluation().to_string())
                .expect("write evaluation");
        }
        self
    }

    /// The descriptor bytes written for `template_id`.
    pub fn descriptor(template_id: &str) -> Vec<u8> {
        json!({
            "templateDimensions": [1846, 1500],
            "bubbleDimensions": [40, 40],
            "name": template_id,
        })
        .to_string()
        .into_bytes()
    }

    /// A minimal valid custom evaluation.
    pub fn evaluation() -> serde_json::Value {
        json!({
            "source_type": "custom",
            "options": {
                "questions_in_order": ["q1", "q2"],
                "answers_in_order": ["A", "C"]
            },
            "marking_schemes": {
                "DEFAULT": { "correct": "1", "incorrect": "0", "unanswered": "0" }
            }
        })
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// Workspace root; empty whenever no check is in flight.
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn checked_dir(&self) -> PathBuf {
        self.config().paths.checked_omr_dir()
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.paths.templates_dir = self.templates_dir();
        config.paths.outputs_dir = self.outputs_dir();
        config.paths.temp_dir = Some(self.temp_dir());
        config
    }
}
