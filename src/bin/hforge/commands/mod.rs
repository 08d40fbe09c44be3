mod ingest;
mod maintenance;
mod query;

use anyhow::{Context, Result};

use hab_forge::Config;

use crate::cli::{Command, GlobalOptions};
use crate::display::Context as DisplayContext;

pub fn dispatch(command: Command, global: &GlobalOptions, ctx: DisplayContext) -> Result<()> {
    let config = load_config(global)?;
    match command {
        Command::Ingest(args) => ingest::run_ingest(args, global, config, ctx),
        Command::Relabel(args) => maintenance::run_relabel(args, global, config, ctx),
        Command::AtomMaps(args) => maintenance::run_atom_maps(args, global, ctx),
        Command::G298(args) => maintenance::run_g298(args, global, config, ctx),
        Command::All(args) => maintenance::run_all(args, global, config, ctx),
        Command::Conformers(args) => query::run_conformers(args, global),
        Command::Show(args) => query::run_show(args, global),
    }
}

fn load_config(global: &GlobalOptions) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}
