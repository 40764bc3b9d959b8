use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use rdt_formats::Generation;

use rdt_engine::config::EngineConfig;
use rdt_engine::ScriptKind;

#[derive(Parser, Debug)]
#[command(about = "Disassemble and execute the scripts of an RDT room", version)]
pub struct Args {
    /// Room file to load
    #[arg(value_name = "FILE")]
    pub room: PathBuf,

    /// Game generation the room belongs to
    #[arg(long, value_enum)]
    pub game: Generation,

    /// Print the disassembly of the selected section(s)
    #[arg(long)]
    pub dump: bool,

    /// Run the selected section(s) against an in-memory room state
    #[arg(long)]
    pub execute: bool,

    /// Only handle this script section (default: init and run)
    #[arg(long, value_enum)]
    pub section: Option<ScriptKind>,

    /// Path to write the disassembly and/or room state as JSON
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Optional JSON engine configuration
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Prefix disassembly lines with the raw instruction bytes
    #[arg(long)]
    pub bytes: bool,

    /// Gate `if` bodies on their flag tests while executing
    #[arg(long)]
    pub evaluate_conditions: bool,

    /// Stage the room belongs to; relative door targets resolve against it
    #[arg(long, default_value_t = 0)]
    pub stage: u8,

    /// Override the per-function instruction ceiling
    #[arg(long)]
    pub max_instructions: Option<usize>,
}

#[derive(Debug)]
pub struct Invocation {
    pub room: PathBuf,
    pub game: Generation,
    pub dump: bool,
    pub execute: bool,
    pub sections: Vec<ScriptKind>,
    pub json: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub stage: u8,
    show_bytes: bool,
    evaluate_conditions: bool,
    max_instructions: Option<usize>,
}

impl Invocation {
    /// Layers the command line flags over a loaded configuration.
    /// Layers the command-line flags over `config` and checks the result.
    pub fn apply(&self, config: &mut EngineConfig) -> Result<()> {
        config.show_bytes |= self.show_bytes;
        config.evaluate_conditions |= self.evaluate_conditions;
        if let Some(limit) = self.max_instructions {
            config.max_instructions = limit;
        }
        config.validate()
    }
}

pub fn parse() -> Result<Invocation> {
    Args::parse().into_invocation()
}

impl Args {
    pub fn into_invocation(self) -> Result<Invocation> {
        if !self.dump && !self.execute {
            bail!("nothing to do: pass --dump and/or --execute");
        }
        if self.section == Some(ScriptKind::Events) && self.game != Generation::Re1 {
            bail!("--section events is only available for re1 rooms");
        }
        if self.max_instructions == Some(0) {
            bail!("--max-instructions must be at least 1");
        }

        let sections = match self.section {
            Some(kind) => vec![kind],
            None => vec![ScriptKind::Init, ScriptKind::Run],
        };
        Ok(Invocation {
            room: self.room,
            game: self.game,
            dump: self.dump,
            execute: self.execute,
            sections,
            json: self.json,
            config: self.config,
            stage: self.stage,
            show_bytes: self.bytes,
            evaluate_conditions: self.evaluate_conditions,
            max_instructions: self.max_instructions,
        })
    }
}
