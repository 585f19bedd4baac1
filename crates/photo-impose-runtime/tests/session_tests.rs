use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use photo_impose::constants::QUEUE_BLOB_DIR;
use photo_impose::{
    Gap, ImposeError, Margins, PaperConfig, RasterFormat, SlotConfig, SlotState, count_pages,
};
use photo_impose_runtime::*;
use tokio::sync::mpsc;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3) as u8, (y * 5) as u8, 90])
    }));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// 100 x 100 mm paper holding a 4 x 4 grid of 20 mm slots
fn small_options() -> ImpositionOptions {
    ImpositionOptions {
        paper: PaperConfig {
            width_mm: 100.0,
            height_mm: 100.0,
            margins: Margins::uniform(5.0),
            gap: Gap::uniform(0.0),
        },
        slot: SlotConfig::new(20.0, 20.0),
        dpi: 72,
        ..Default::default()
    }
}

async fn next_update(rx: &mut mpsc::UnboundedReceiver<SessionUpdate>) -> SessionUpdate {
    loop {
        match rx.recv().await {
            Some(SessionUpdate::Progress { .. }) => continue,
            Some(update) => return update,
            None => panic!("session closed"),
        }
    }
}

#[tokio::test]
async fn test_worker_full_workflow() {
    let temp = tempfile::tempdir().unwrap();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let session = Session::new(ImpositionOptions::default(), temp.path().join("queue"));
    tokio::spawn(session_task(session, command_rx, update_tx));

    match next_update(&mut update_rx).await {
        SessionUpdate::Ready { queue } => assert!(queue.is_empty()),
        other => panic!("Expected Ready, got {:?}", other),
    }

    command_tx
        .send(SessionCommand::SetOptions {
            options: small_options(),
        })
        .unwrap();
    match next_update(&mut update_rx).await {
        SessionUpdate::OptionsApplied { grid } => assert_eq!(grid.total_slots, 16),
        other => panic!("Expected OptionsApplied, got {:?}", other),
    }

    command_tx
        .send(SessionCommand::AddImages {
            sources: vec![
                SourceImage::new("a.png", png(60, 40)),
                SourceImage::new("broken.png", b"nope".to_vec()),
                SourceImage::new("b.png", png(40, 60)),
            ],
        })
        .unwrap();
    match next_update(&mut update_rx).await {
        SessionUpdate::ImagesAdded { placed, failures } => {
            assert_eq!(placed, vec![0, 1]);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "broken.png");
        }
        other => panic!("Expected ImagesAdded, got {:?}", other),
    }
    match next_update(&mut update_rx).await {
        SessionUpdate::SlotsChanged { image_count, .. } => assert_eq!(image_count, 2),
        other => panic!("Expected SlotsChanged, got {:?}", other),
    }

    command_tx.send(SessionCommand::OpenEditor { index: 1 }).unwrap();
    command_tx
        .send(SessionCommand::EditCrop {
            index: 1,
            edit: CropEdit::ZoomBy(2.0),
        })
        .unwrap();
    command_tx.send(SessionCommand::ConfirmCrop { index: 1 }).unwrap();
    assert!(matches!(
        next_update(&mut update_rx).await,
        SessionUpdate::EditorOpened { index: 1 }
    ));
    match next_update(&mut update_rx).await {
        SessionUpdate::CropAdjusted { zoom, .. } => assert_eq!(zoom, 2.0),
        other => panic!("Expected CropAdjusted, got {:?}", other),
    }
    match next_update(&mut update_rx).await {
        SessionUpdate::CropConfirmed { index, record } => {
            assert_eq!(index, 1);
            assert_eq!(record.width, 20);
        }
        other => panic!("Expected CropConfirmed, got {:?}", other),
    }

    let output_path = temp.path().join("sheet.pdf");
    command_tx
        .send(SessionCommand::Export {
            output_path: output_path.clone(),
        })
        .unwrap();
    match next_update(&mut update_rx).await {
        SessionUpdate::ExportComplete { path, page_count } => {
            assert_eq!(path, output_path);
            assert_eq!(page_count, 1);
        }
        other => panic!("Expected ExportComplete, got {:?}", other),
    }
    assert!(output_path.exists());

    command_tx
        .send(SessionCommand::AddToQueue {
            name: "Order 17".to_string(),
        })
        .unwrap();
    match next_update(&mut update_rx).await {
        SessionUpdate::Queued { record } => {
            assert_eq!(record.name, "Order 17");
            assert_eq!(record.page_count, 1);
        }
        other => panic!("Expected Queued, got {:?}", other),
    }
    match next_update(&mut update_rx).await {
        SessionUpdate::QueueChanged { items } => assert_eq!(items.len(), 1),
        other => panic!("Expected QueueChanged, got {:?}", other),
    }

    let merged_path = temp.path().join("merged.pdf");
    command_tx
        .send(SessionCommand::QueueExportAll {
            output_path: merged_path.clone(),
        })
        .unwrap();
    match next_update(&mut update_rx).await {
        SessionUpdate::QueueExported { page_count, .. } => assert_eq!(page_count, 1),
        other => panic!("Expected QueueExported, got {:?}", other),
    }
    assert!(merged_path.exists());
}

#[tokio::test]
async fn test_worker_reports_errors() {
    let temp = tempfile::tempdir().unwrap();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let session = Session::new(small_options(), temp.path());
    tokio::spawn(session_task(session, command_rx, update_tx));
    next_update(&mut update_rx).await;

    command_tx.send(SessionCommand::OpenEditor { index: 3 }).unwrap();
    match next_update(&mut update_rx).await {
        SessionUpdate::Error { message } => assert!(message.contains("editor")),
        other => panic!("Expected Error, got {:?}", other),
    }

    command_tx.send(SessionCommand::QueueClear).unwrap();
    command_tx
        .send(SessionCommand::QueueExportAll {
            output_path: temp.path().join("none.pdf"),
        })
        .unwrap();
    assert!(matches!(
        next_update(&mut update_rx).await,
        SessionUpdate::QueueChanged { .. }
    ));
    assert!(matches!(
        next_update(&mut update_rx).await,
        SessionUpdate::QueueEmpty
    ));
}

#[tokio::test]
async fn test_new_dpi_recrops_images() {
    let temp = tempfile::tempdir().unwrap();
    let mut session = Session::new(small_options(), temp.path());
    session.hydrate().await.unwrap();

    let (placed, failures) = session
        .add_images(vec![SourceImage::new("a.png", png(200, 200))])
        .await;
    assert_eq!(placed, vec![0]);
    assert!(failures.is_empty());

    // Leave a user crop behind; retargeting discards it
    session.open_editor(0).unwrap();
    session.edit_crop(0, CropEdit::ZoomBy(2.0)).unwrap();
    session.confirm_crop(0).unwrap();

    let mut options = small_options();
    options.dpi = 144;
    session.set_options(options).await.unwrap();

    match session.board().state(0) {
        Some(SlotState::AutoNormalized(image)) => {
            assert_eq!((image.working.width, image.working.height), (113, 113));
        }
        other => panic!("Expected AutoNormalized, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_options_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let mut session = Session::new(small_options(), temp.path());

    let mut options = small_options();
    options.slot = SlotConfig::new(-1.0, 20.0);
    match session.set_options(options).await {
        Err(ImposeError::Validation(_)) => {}
        _ => panic!("Expected Validation error"),
    }
    assert_eq!(session.options(), &small_options());
}

#[tokio::test]
async fn test_export_needs_images() {
    let temp = tempfile::tempdir().unwrap();
    let session = Session::new(small_options(), temp.path());
    match session.export(&temp.path().join("empty.pdf")).await {
        Err(ImposeError::Validation(_)) => {}
        _ => panic!("Expected Validation error"),
    }
}

#[tokio::test]
async fn test_failed_recrop_keeps_board() {
    let temp = tempfile::tempdir().unwrap();
    let mut session = Session::new(small_options(), temp.path());
    session
        .add_images(vec![SourceImage::new("a.png", png(200, 200))])
        .await;

    // Wider than a JPEG can encode once rendered at 1000 dpi
    let mut options = small_options();
    options.slot = SlotConfig::new(1700.0, 1.0);
    options.dpi = 1000;
    options.raster_format = RasterFormat::Jpeg { quality: 80 };
    match session.set_options(options).await {
        Err(ImposeError::Encode(_)) => {}
        other => panic!("Expected Encode error, got {:?}", other),
    }

    assert_eq!(session.options(), &small_options());
    assert_eq!(session.board().image_count(), 1);
    match session.board().state(0) {
        Some(SlotState::AutoNormalized(image)) => {
            assert_eq!((image.working.width, image.working.height), (57, 57));
        }
        other => panic!("Expected AutoNormalized, got {:?}", other),
    }
}

#[tokio::test]
async fn test_export_and_queue_share_one_document() {
    let temp = tempfile::tempdir().unwrap();
    let mut session = Session::new(small_options(), temp.path().join("queue"));
    session.hydrate().await.unwrap();
    session
        .add_images((0..17).map(|i| SourceImage::new(format!("{i}.png"), png(30, 30))).collect())
        .await;

    let output = temp.path().join("job.pdf");
    let (page_count, record) = session.export_and_queue(&output, "Job").await.unwrap();
    assert_eq!(page_count, 2);
    assert_eq!(record.page_count, 2);
    assert_eq!(record.order, 0);

    let written = std::fs::read(&output).unwrap();
    assert_eq!(count_pages(&written).unwrap(), 2);
    let blob = temp
        .path()
        .join("queue")
        .join(QUEUE_BLOB_DIR)
        .join(format!("{}.pdf", record.id));
    let stored = std::fs::read(blob).unwrap();
    assert_eq!(stored, written);
}
