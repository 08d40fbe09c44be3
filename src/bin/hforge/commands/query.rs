use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use hab_forge::query::{ConformerQuery, conformer_detail, list_species_conformers};
use hab_forge::{ConformerId, LotId, SpeciesId};

use crate::cli::{ConformersArgs, GlobalOptions, ShowArgs};
use crate::display::{print_conformer_detail, print_conformer_rows};
use crate::io::open_store;

pub fn run_conformers(args: ConformersArgs, global: &GlobalOptions) -> Result<()> {
    let store = open_store(&global.db)?;
    let query = ConformerQuery {
        lot: args.lot.map(LotId),
        is_ts: args.ts,
        representative_only: args.representatives,
        well_rank: args.rank,
        limit: args.limit,
        offset: args.offset,
    };
    let rows = list_species_conformers(&store, SpeciesId(args.species), &query)
        .with_context(|| format!("Failed to list conformers of species {}", args.species))?;

    if args.json {
        write_json(&rows)
    } else {
        print_conformer_rows(&rows);
        Ok(())
    }
}

pub fn run_show(args: ShowArgs, global: &GlobalOptions) -> Result<()> {
    let store = open_store(&global.db)?;
    let detail = conformer_detail(&store, ConformerId(args.conformer))
        .with_context(|| format!("Failed to load conformer {}", args.conformer))?;

    if args.json {
        write_json(&detail)
    } else {
        print_conformer_detail(&detail);
        Ok(())
    }
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}
