mod cli;
mod logger;

use anyhow::{Context, Result, bail};
use clap::Parser;
use directories::ProjectDirs;
use photo_impose::{
    ExportQueue, ImpositionOptions, LayoutStatistics, LengthUnit, calculate_statistics, save_pdf,
};
use photo_impose_runtime::{Session, SourceImage};
use std::path::{Path, PathBuf};

use cli::{Cli, Commands, QueueAction};
use logger::StderrLogger;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    StderrLogger::from_verbosity(cli.verbose).init()?;

    let queue_dir = cli.queue_dir.clone();

    match cli.command {
        Commands::Layout {
            layout,
            images,
            json,
        } => {
            let options = layout.resolve().await?;
            let stats = calculate_statistics(&options, images);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_statistics(&options, &stats, layout.unit.into());
            }
        }

        Commands::Impose {
            images,
            output,
            layout,
            enqueue,
            name,
        } => {
            let options = layout.resolve().await?;
            let queue_root = resolve_queue_dir(queue_dir)?;
            let mut session = Session::new(options, queue_root);

            let sources = read_sources(&images).await?;
            let (placed, failures) = session.add_images(sources).await;
            for (file, reason) in &failures {
                eprintln!("Skipped {}: {}", file, reason);
            }
            if placed.is_empty() {
                bail!("none of the {} image(s) could be used", images.len());
            }

            let stats = session.statistics();
            if enqueue {
                session.hydrate().await?;
                let name = name.unwrap_or_else(|| file_label(&output));
                let (page_count, record) = session.export_and_queue(&output, &name).await?;
                print_placed(placed.len(), page_count, &stats, &output);
                println!(
                    "Queued \"{}\" at position {} ({})",
                    record.name,
                    record.order + 1,
                    record.id
                );
            } else {
                let page_count = session.export(&output).await?;
                print_placed(placed.len(), page_count, &stats, &output);
            }
        }

        Commands::Queue { action } => {
            let mut queue = ExportQueue::new(resolve_queue_dir(queue_dir)?);
            queue
                .hydrate()
                .await
                .with_context(|| format!("Failed to open queue at {}", queue.root().display()))?;
            run_queue_action(&mut queue, action).await?;
        }
    }

    Ok(())
}

async fn run_queue_action(queue: &mut ExportQueue, action: QueueAction) -> Result<()> {
    match action {
        QueueAction::List => {
            if queue.is_empty() {
                println!("Queue is empty");
                return Ok(());
            }
            for record in queue.items() {
                println!(
                    "{:>3}. {}  {} page(s)  {}  {}",
                    record.order + 1,
                    record.name,
                    record.page_count,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.id
                );
            }
            println!("Total: {} page(s)", queue.total_pages());
        }
        QueueAction::Add { input, name } => {
            let bytes = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let name = name.unwrap_or_else(|| file_label(&input));
            let record = queue.add_document(&name, bytes).await?;
            println!(
                "Queued \"{}\" ({} page(s)) as {}",
                record.name, record.page_count, record.id
            );
        }
        QueueAction::Remove { id } => {
            if !queue.remove(&id).await? {
                bail!("no queued job with id {}", id);
            }
            println!("Removed {}", id);
        }
        QueueAction::Move { id, direction } => {
            if queue.get(&id).is_none() {
                bail!("no queued job with id {}", id);
            }
            if queue.move_item(&id, direction.into()).await? {
                println!("Moved {}", id);
            } else {
                println!("{} is already at the edge of the queue", id);
            }
        }
        QueueAction::Clear => {
            let count = queue.len();
            queue.clear().await?;
            println!("Removed {} job(s)", count);
        }
        QueueAction::Export { output } => match queue.export_all().await? {
            Some(doc) => {
                let pages = doc.get_pages().len();
                save_pdf(doc, &output).await?;
                println!("Exported {} page(s) → {}", pages, output.display());
            }
            None => println!("Queue is empty, nothing exported"),
        },
    }
    Ok(())
}

fn print_placed(images: usize, page_count: usize, stats: &LayoutStatistics, output: &Path) {
    println!(
        "Placed {} image(s) on {} sheet(s) of {} slots → {}",
        images,
        page_count,
        stats.grid.total_slots,
        output.display()
    );
}

/// `w x h unit`, converted from millimeters
fn format_size(unit: LengthUnit, width_mm: f32, height_mm: f32) -> String {
    let digits = match unit {
        LengthUnit::Millimeters => 1,
        LengthUnit::Centimeters | LengthUnit::Inches => 2,
    };
    format!(
        "{:.*} x {:.*} {}",
        digits,
        unit.from_mm(width_mm),
        digits,
        unit.from_mm(height_mm),
        unit.name()
    )
}

fn print_statistics(options: &ImpositionOptions, stats: &LayoutStatistics, unit: LengthUnit) {
    println!("Layout:");
    println!(
        "  Paper: {}",
        format_size(unit, options.paper.width_mm, options.paper.height_mm)
    );
    println!(
        "  Slot: {}",
        format_size(unit, options.slot.width_mm, options.slot.height_mm)
    );
    println!(
        "  Grid: {} columns x {} rows = {} slots",
        stats.grid.cols, stats.grid.rows, stats.grid.total_slots
    );
    println!(
        "  Printed area: {} ({:.1}% of the paper)",
        format_size(unit, stats.printed_width_mm, stats.printed_height_mm),
        stats.paper_usage_percent
    );
    if stats.images > 0 {
        println!("  Images: {}", stats.images);
        println!("  Sheets: {}", stats.sheets);
        println!("  Empty slots: {}", stats.empty_slots);
    }
}

async fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceImage>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sources.push(SourceImage::new(file_label(path), bytes));
    }
    Ok(sources)
}

fn resolve_queue_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let dirs = ProjectDirs::from("", "", "phimp").context("No data directory available")?;
    Ok(dirs.data_local_dir().join("queue"))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
