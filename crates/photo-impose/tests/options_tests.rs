use photo_impose::*;

#[test]
fn test_rejects_bad_geometry() {
    let cases = [
        ImpositionOptions {
            paper: PaperConfig {
                width_mm: 0.0,
                ..Default::default()
            },
            ..Default::default()
        },
        ImpositionOptions {
            slot: SlotConfig::new(30.0, f32::NAN),
            ..Default::default()
        },
        ImpositionOptions {
            paper: PaperConfig {
                gap: Gap::uniform(-1.0),
                ..Default::default()
            },
            ..Default::default()
        },
        ImpositionOptions {
            dpi: 0,
            ..Default::default()
        },
    ];

    for options in cases {
        match options.validate() {
            Err(ImposeError::Validation(_)) => {}
            _ => panic!("Expected Validation error for {:?}", options),
        }
    }
}

#[test]
fn test_disabled_marks_skip_mark_checks() {
    let mut options = ImpositionOptions::default();
    options.marks.length_mm = -1.0;
    assert!(options.validate().is_err());

    options.marks.enabled = false;
    assert!(options.validate().is_ok());
}

#[tokio::test]
async fn test_save_and_load() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("options.json");

    let options = ImpositionOptions {
        slot: SlotConfig::new(35.0, 45.0),
        raster_format: RasterFormat::Jpeg { quality: 80 },
        meta: MetaInfo {
            customer_name: "Studio".to_string(),
            description: String::new(),
            date: "2024-01-31".to_string(),
        },
        ..Default::default()
    };
    options.save(&path).await.unwrap();

    let loaded = ImpositionOptions::load(&path).await.unwrap();
    assert_eq!(loaded, options);
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("partial.json");
    std::fs::write(&path, r#"{ "dpi": 150, "display_meta": false }"#).unwrap();

    let loaded = ImpositionOptions::load(&path).await.unwrap();
    assert_eq!(loaded.dpi, 150);
    assert!(!loaded.display_meta);
    assert_eq!(loaded.slot, SlotConfig::default());
}

#[tokio::test]
async fn test_malformed_config() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    match ImpositionOptions::load(&path).await {
        Err(ImposeError::Validation(msg)) => assert!(msg.contains("parse")),
        _ => panic!("Expected Validation error"),
    }
}
