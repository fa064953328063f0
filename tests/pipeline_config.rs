use std::sync::Mutex;

use tempfile::NamedTempFile;

use letterlens::config::LetterlensConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LETTERLENS_CONFIG",
        "LETTERLENS_CAMERA_URL",
        "LETTERLENS_TARGET_FPS",
        "LETTERLENS_MODEL_PATH",
        "LETTERLENS_CLASSES",
        "LETTERLENS_INVERT",
        "LETTERLENS_TOP_K",
        "LETTERLENS_FEEDBACK_URL",
        "LETTERLENS_FEEDBACK_SECRET",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "url": "http://camera-1/stream",
            "target_fps": 12,
            "width": 800,
            "height": 600
        },
        "classifier": {
            "model_path": "models/letters.onnx",
            "classes": 24,
            "invert": false,
            "top_k": 5
        },
        "feedback": {
            "url": "http://feedback-host:9000/corrections",
            "secret": "hunter2"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("LETTERLENS_CONFIG", file.path());
    std::env::set_var("LETTERLENS_CAMERA_URL", "stub://override");
    std::env::set_var("LETTERLENS_TOP_K", "2");

    let cfg = LetterlensConfig::load().expect("load config");

    assert_eq!(cfg.camera.url, "stub://override");
    assert_eq!(cfg.camera.target_fps, 12);
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(
        cfg.classifier.model_path.as_deref(),
        Some(std::path::Path::new("models/letters.onnx"))
    );
    assert_eq!(cfg.classifier.classes, 24);
    assert!(!cfg.classifier.invert);
    assert_eq!(cfg.classifier.top_k, 2);
    assert_eq!(cfg.feedback.url, "http://feedback-host:9000/corrections");
    assert_eq!(cfg.feedback.shared_secret.as_deref(), Some("hunter2"));

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = LetterlensConfig::load().expect("load config");

    assert_eq!(cfg.camera.url, "stub://letterlens");
    assert_eq!(cfg.camera.target_fps, 30);
    assert!(cfg.classifier.model_path.is_none());
    assert_eq!(cfg.classifier.classes, 26);
    assert!(cfg.classifier.invert);
    assert_eq!(cfg.classifier.top_k, 3);
    assert_eq!(cfg.alphabet().len(), 26);

    clear_env();
}

#[test]
fn out_of_range_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LETTERLENS_CLASSES", "0");
    assert!(LetterlensConfig::load().is_err());

    std::env::set_var("LETTERLENS_CLASSES", "27");
    assert!(LetterlensConfig::load().is_err());

    std::env::set_var("LETTERLENS_CLASSES", "26");
    std::env::set_var("LETTERLENS_TOP_K", "0");
    assert!(LetterlensConfig::load().is_err());

    std::env::set_var("LETTERLENS_TOP_K", "3");
    std::env::set_var("LETTERLENS_TARGET_FPS", "0");
    assert!(LetterlensConfig::load().is_err());

    clear_env();
}
