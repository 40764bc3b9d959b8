use std::fs;

use anyhow::{Context, Result};
use rdt_engine::config::EngineConfig;
use rdt_engine::disasm::{render, Disassembly};
use rdt_engine::facade::RoomState;
use rdt_engine::section::{dump_section, execute_section};
use rdt_engine::{ScriptKind, WalkReport};
use rdt_formats::RoomImage;
use serde::Serialize;

mod cli;

#[derive(Serialize)]
struct SectionDump {
    section: ScriptKind,
    #[serde(flatten)]
    disassembly: Disassembly,
}

#[derive(Serialize)]
struct Manifest<'a> {
    room: String,
    game: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    disassembly: Vec<SectionDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a RoomState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution: Option<&'a WalkReport>,
}

fn main() -> Result<()> {
    env_logger::init();
    let invocation = cli::parse()?;

    let mut config = EngineConfig::from_json_file(invocation.config.as_deref())
        .context("loading engine configuration")?;
    invocation.apply(&mut config)?;

    let room = RoomImage::open(&invocation.room, invocation.game)?;
    log::info!(
        "loaded {} ({} bytes, {} camera(s))",
        invocation.room.display(),
        room.len(),
        room.num_cameras()
    );

    let mut dumps = Vec::new();
    if invocation.dump {
        for &section in &invocation.sections {
            let disassembly = dump_section(&room, section, &config)?;
            println!("; {section:?} script");
            print!("{}", render(&disassembly.lines));
            report_problems(&disassembly.report);
            dumps.push(SectionDump {
                section,
                disassembly,
            });
        }
    }

    let mut state = None;
    let mut execution = None;
    if invocation.execute {
        let mut room_state = RoomState::new(invocation.stage, 0);
        let mut report = WalkReport::default();
        for &section in &invocation.sections {
            report.merge(execute_section(&room, section, &mut room_state, &config)?);
        }
        print_state(&room_state, &report);
        report_problems(&report);
        state = Some(room_state);
        execution = Some(report);
    }

    if let Some(path) = invocation.json.as_ref() {
        let manifest = Manifest {
            room: invocation.room.display().to_string(),
            game: invocation.game.to_string(),
            disassembly: dumps,
            state: state.as_ref(),
            execution: execution.as_ref(),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .context("serializing script report to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing script report to {}", path.display()))?;
        println!("Saved script report to {}", path.display());
    }

    Ok(())
}

fn print_state(state: &RoomState, report: &WalkReport) {
    println!(
        "Executed {} instruction(s): {} door(s), {} item(s), camera {}",
        report.instructions,
        state.doors.len(),
        state.items.len(),
        state.camera
    );
    for door in &state.doors {
        println!(
            "  door #{:02x} -> stage {} room 0x{:02x} camera {} at ({}, {}, {})",
            door.id,
            door.next_stage,
            door.next_room,
            door.next_camera,
            door.next_pos.x,
            door.next_pos.y,
            door.next_pos.z
        );
    }
    for item in &state.items {
        println!(
            "  item #{:02x} type 0x{:04x} x{} at ({}, {})",
            item.id, item.kind, item.amount, item.x, item.y
        );
    }
    if !state.flag_ops.is_empty() || !state.var_ops.is_empty() {
        println!(
            "  {} flag op(s), {} variable op(s), {} message(s)",
            state.flag_ops.len(),
            state.var_ops.len(),
            state.messages.len()
        );
    }
}

fn report_problems(report: &WalkReport) {
    for err in &report.errors {
        eprintln!("[rdt_engine] {err}");
    }
}
