use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rdt_formats::text::text_count;
use rdt_formats::{Generation, RoomImage, SectionInfo};
use serde::Serialize;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(about = "List the section table of RDT room files", version)]
struct Args {
    /// Room file to inspect
    #[arg(value_name = "FILE", conflicts_with = "root")]
    room: Option<PathBuf>,

    /// Directory scanned recursively for `.rdt` files
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Game generation the rooms belong to
    #[arg(long, value_enum)]
    game: Generation,

    /// Optional path to write the section listing as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[derive(Serialize)]
struct RoomSummary {
    path: PathBuf,
    cameras: u8,
    messages: usize,
    sections: Vec<SectionInfo>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let paths = resolve_room_paths(&args)?;
    if paths.is_empty() {
        bail!("no room files to inspect");
    }
    log::info!("inspecting {} {} room(s)", paths.len(), args.game);

    let mut summaries = Vec::new();
    for path in paths {
        let room = match RoomImage::open(&path, args.game) {
            Ok(room) => room,
            Err(err) => {
                eprintln!("[rdt_info] skipping {}: {err:#}", path.display());
                continue;
            }
        };
        let summary = summarize(path, &room);
        print_summary(&summary);
        summaries.push(summary);
    }

    if let Some(path) = args.json.as_ref() {
        let json = serde_json::to_string_pretty(&summaries)
            .context("serializing room summaries to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing room summaries to {}", path.display()))?;
        println!("Saved section listing to {}", path.display());
    }

    Ok(())
}

fn resolve_room_paths(args: &Args) -> Result<Vec<PathBuf>> {
    let mut rooms = Vec::new();
    if let Some(room) = args.room.as_ref() {
        rooms.push(room.clone());
    } else if let Some(root) = args.root.as_ref() {
        for entry in WalkDir::new(root).into_iter().filter_map(|res| res.ok()) {
            let is_rdt = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("rdt"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_rdt {
                rooms.push(entry.into_path());
            }
        }
    } else {
        bail!("pass a room file or --root <DIR>");
    }

    rooms.sort();
    rooms.dedup();
    Ok(rooms)
}

fn summarize(path: PathBuf, room: &RoomImage) -> RoomSummary {
    let messages = room
        .generation()
        .text_section(0)
        .and_then(|index| room.section_bytes(index))
        .map(text_count)
        .unwrap_or(0);
    RoomSummary {
        path,
        cameras: room.num_cameras(),
        messages,
        sections: room.sections(),
    }
}

fn print_summary(summary: &RoomSummary) {
    println!(
        "{} ({} cameras, {} messages)",
        summary.path.display(),
        summary.cameras,
        summary.messages
    );
    for section in &summary.sections {
        let label = section.kind.map(|kind| kind.label()).unwrap_or("-");
        println!(
            "  {index:>2} {label:<20} 0x{offset:08x} {length:>8}",
            index = section.index,
            offset = section.offset,
            length = section.length
        );
    }
}
