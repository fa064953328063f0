use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::capture::CameraConfig;
use crate::feedback::FeedbackConfig;
use crate::pipeline::PipelineSettings;
use crate::rank::Alphabet;

const DEFAULT_CAMERA_URL: &str = "stub://letterlens";
const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_CLASS_COUNT: usize = 26;
const DEFAULT_TOP_K: usize = 3;
const DEFAULT_INVERT: bool = true;
const DEFAULT_FEEDBACK_URL: &str = "http://127.0.0.1:8799/corrections";

#[derive(Debug, Deserialize, Default)]
struct LetterlensConfigFile {
    camera: Option<CameraConfigFile>,
    classifier: Option<ClassifierConfigFile>,
    feedback: Option<FeedbackConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    model_path: Option<PathBuf>,
    classes: Option<usize>,
    invert: Option<bool>,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct FeedbackConfigFile {
    url: Option<String>,
    secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LetterlensConfig {
    pub camera: CameraConfig,
    pub classifier: ClassifierSettings,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// ONNX artifact path. None leaves the classifier absent and the
    /// pipeline in preview-only mode.
    pub model_path: Option<PathBuf>,
    pub classes: usize,
    pub invert: bool,
    pub top_k: usize,
}

impl LetterlensConfig {
    /// Load from the file named by `LETTERLENS_CONFIG` (when set), apply
    /// env-var overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LETTERLENS_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LetterlensConfigFile) -> Self {
        let camera = CameraConfig {
            url: file
                .camera
                .as_ref()
                .and_then(|camera| camera.url.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_FRAME_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
        };
        let classifier = ClassifierSettings {
            model_path: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.model_path.clone()),
            classes: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.classes)
                .unwrap_or(DEFAULT_CLASS_COUNT),
            invert: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.invert)
                .unwrap_or(DEFAULT_INVERT),
            top_k: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.top_k)
                .unwrap_or(DEFAULT_TOP_K),
        };
        let feedback = FeedbackConfig {
            url: file
                .feedback
                .as_ref()
                .and_then(|feedback| feedback.url.clone())
                .unwrap_or_else(|| DEFAULT_FEEDBACK_URL.to_string()),
            shared_secret: file.feedback.and_then(|feedback| feedback.secret),
        };
        Self {
            camera,
            classifier,
            feedback,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("LETTERLENS_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(fps) = std::env::var("LETTERLENS_TARGET_FPS") {
            self.camera.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("LETTERLENS_TARGET_FPS must be an integer frame rate"))?;
        }
        if let Ok(path) = std::env::var("LETTERLENS_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.classifier.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(classes) = std::env::var("LETTERLENS_CLASSES") {
            self.classifier.classes = classes
                .parse()
                .map_err(|_| anyhow!("LETTERLENS_CLASSES must be an integer class count"))?;
        }
        if let Ok(invert) = std::env::var("LETTERLENS_INVERT") {
            self.classifier.invert = invert
                .parse()
                .map_err(|_| anyhow!("LETTERLENS_INVERT must be 'true' or 'false'"))?;
        }
        if let Ok(top_k) = std::env::var("LETTERLENS_TOP_K") {
            self.classifier.top_k = top_k
                .parse()
                .map_err(|_| anyhow!("LETTERLENS_TOP_K must be a positive integer"))?;
        }
        if let Ok(url) = std::env::var("LETTERLENS_FEEDBACK_URL") {
            if !url.trim().is_empty() {
                self.feedback.url = url;
            }
        }
        if let Ok(secret) = std::env::var("LETTERLENS_FEEDBACK_SECRET") {
            if !secret.trim().is_empty() {
                self.feedback.shared_secret = Some(secret);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be at least 1"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera frame dimensions must be non-zero"));
        }
        if Alphabet::latin(self.classifier.classes).is_none() {
            return Err(anyhow!(
                "classifier classes must be between 1 and 26, got {}",
                self.classifier.classes
            ));
        }
        if self.classifier.top_k == 0 {
            return Err(anyhow!("classifier top_k must be at least 1"));
        }
        Ok(())
    }

    /// Alphabet sized to the configured class count.
    pub fn alphabet(&self) -> Alphabet {
        Alphabet::latin(self.classifier.classes).unwrap_or_default()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            invert: self.classifier.invert,
            top_k: self.classifier.top_k,
            alphabet: self.alphabet(),
        }
    }
}

fn read_config_file(path: &Path) -> Result<LetterlensConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
