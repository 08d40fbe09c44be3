use anyhow::{Context, Result, bail};

use hab_forge::{AtomTable, Config, IngestReport, Ingestor, KineticsTable};

use crate::cli::{GlobalOptions, IngestArgs};
use crate::display::{Context as DisplayContext, FileProgress, print_ingest_report};
use crate::io::{discover_sdf_files, open_store, save_store};

pub fn run_ingest(
    args: IngestArgs,
    global: &GlobalOptions,
    mut config: Config,
    ctx: DisplayContext,
) -> Result<()> {
    if args.no_strict_roles {
        config.ingest.strict_roles = false;
    }
    if let Some(lot) = args.lot {
        config.ingest.default_lot = lot;
    }
    if args.no_map_atoms {
        config.ingest.map_atoms = false;
    }
    config.ingest.reuse_batch |= args.reuse_batch;
    config.ingest.skip_if_loaded |= args.skip_if_loaded;
    config.ingest.mirror_geometry |= args.mirror_geometry;
    config.ingest.angles_in_degrees |= args.angles_in_degrees;

    let kinetics = args
        .kinetics_csv
        .as_ref()
        .map(|path| {
            KineticsTable::read_path(path)
                .with_context(|| format!("Failed to read kinetics table {}", path.display()))
        })
        .transpose()?;
    let atom_table = args
        .atom_csv
        .as_ref()
        .map(|path| {
            AtomTable::read_path(path)
                .with_context(|| format!("Failed to read atom table {}", path.display()))
        })
        .transpose()?;

    let files = discover_sdf_files(&args.paths)?;
    if files.is_empty() {
        bail!("No .sdf or .sd files found in the given paths");
    }

    let mut store = open_store(&global.db)?;
    let mut report = IngestReport::default();
    let mut failed = 0usize;
    let progress = FileProgress::new(ctx.interactive, files.len());

    for file in &files {
        let name = file.display().to_string();
        progress.start_file(&name);

        let mut ingestor =
            Ingestor::new(&mut store, config.ingest.clone()).dry_run(args.dry_run);
        if let Some(label) = &args.source_label {
            ingestor = ingestor.source_label(label.as_str());
        }
        if let Some(table) = &kinetics {
            ingestor = ingestor.kinetics(table);
        }
        if let Some(table) = &atom_table {
            ingestor = ingestor.atom_table(table);
        }
        let result = ingestor.ingest_file(file);
        progress.finish_file();

        match result {
            Ok(file_report) => report.absorb(file_report),
            Err(e) if args.stop_on_error => {
                progress.finish();
                if !args.dry_run {
                    save_store(&store, &global.db)?;
                }
                return Err(e).with_context(|| format!("Failed to ingest {name}"));
            }
            Err(e) => {
                failed += 1;
                progress.println(format!("  \x1b[31m✗\x1b[0m {name}: {e}"));
            }
        }
    }
    progress.finish();

    if !args.dry_run {
        save_store(&store, &global.db)?;
    }
    print_ingest_report(&report, files.len(), failed);
    Ok(())
}
