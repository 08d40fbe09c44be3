use anyhow::{Context, Result, bail};

use hab_forge::mapping::{MappingReport, backfill_atom_maps};
use hab_forge::thermo::{GibbsReport, backfill_g298};
use hab_forge::wells::{RelabelReport, relabel_all};
use hab_forge::{Config, MemoryStore};

use crate::cli::{AllArgs, AtomMapsArgs, G298Args, GlobalOptions, RelabelArgs};
use crate::display::{
    Context as DisplayContext, Progress, print_gibbs_report, print_mapping_report,
    print_relabel_report,
};
use crate::io::{open_store, save_store};

pub fn run_relabel(
    args: RelabelArgs,
    global: &GlobalOptions,
    config: Config,
    ctx: DisplayContext,
) -> Result<()> {
    let mut store = open_store(&global.db)?;
    let mut progress = Progress::new(ctx.interactive, 1);

    progress.step("Relabeling wells");
    let report = relabel(&mut store, config.maintenance.parallel && !args.serial)?;
    progress.complete_step("Relabeling wells", &relabel_substeps(&report));

    save_store(&store, &global.db)?;
    progress.finish();
    print_relabel_report(&report);
    check_failures(&report)
}

pub fn run_atom_maps(
    args: AtomMapsArgs,
    global: &GlobalOptions,
    ctx: DisplayContext,
) -> Result<()> {
    let mut store = open_store(&global.db)?;
    let mut progress = Progress::new(ctx.interactive, 1);

    progress.step("Building atom maps");
    let report = atom_maps(&mut store, args.dry_run)?;
    progress.complete_step("Building atom maps", &mapping_substeps(&report));

    if !args.dry_run {
        save_store(&store, &global.db)?;
    }
    progress.finish();
    print_mapping_report(&report, args.dry_run);
    Ok(())
}

pub fn run_g298(
    args: G298Args,
    global: &GlobalOptions,
    config: Config,
    ctx: DisplayContext,
) -> Result<()> {
    let (temperature_k, override_user) = gibbs_settings(&args, &config)?;
    let mut store = open_store(&global.db)?;
    let mut progress = Progress::new(ctx.interactive, 1);

    progress.step("Backfilling G298");
    let report = g298(&mut store, temperature_k, override_user)?;
    progress.complete_step("Backfilling G298", &gibbs_substeps(&report));

    save_store(&store, &global.db)?;
    progress.finish();
    print_gibbs_report(&report, temperature_k);
    Ok(())
}

pub fn run_all(
    args: AllArgs,
    global: &GlobalOptions,
    config: Config,
    ctx: DisplayContext,
) -> Result<()> {
    let (temperature_k, override_user) = gibbs_settings(&args.g298, &config)?;
    let mut store = open_store(&global.db)?;
    let mut progress = Progress::new(ctx.interactive, 3);

    progress.step("Relabeling wells");
    let relabel_report = relabel(&mut store, config.maintenance.parallel && !args.serial)?;
    progress.complete_step("Relabeling wells", &relabel_substeps(&relabel_report));

    progress.step("Building atom maps");
    let mapping_report = atom_maps(&mut store, false)?;
    progress.complete_step("Building atom maps", &mapping_substeps(&mapping_report));

    progress.step("Backfilling G298");
    let gibbs_report = g298(&mut store, temperature_k, override_user)?;
    progress.complete_step("Backfilling G298", &gibbs_substeps(&gibbs_report));

    save_store(&store, &global.db)?;
    progress.finish();

    print_relabel_report(&relabel_report);
    print_mapping_report(&mapping_report, false);
    print_gibbs_report(&gibbs_report, temperature_k);
    check_failures(&relabel_report)
}

fn relabel(store: &mut MemoryStore, parallel: bool) -> Result<RelabelReport> {
    relabel_all(store, parallel).context("Relabeling failed")
}

fn atom_maps(store: &mut MemoryStore, dry_run: bool) -> Result<MappingReport> {
    backfill_atom_maps(store, dry_run).context("Atom mapping failed")
}

fn g298(store: &mut MemoryStore, temperature_k: f64, override_user: bool) -> Result<GibbsReport> {
    backfill_g298(store, temperature_k, override_user).context("G298 backfill failed")
}

fn gibbs_settings(args: &G298Args, config: &Config) -> Result<(f64, bool)> {
    let temperature_k = args.temperature.unwrap_or(config.maintenance.temperature_k);
    if !temperature_k.is_finite() || temperature_k <= 0.0 {
        bail!("Temperature must be a positive number of kelvin, got {temperature_k}");
    }
    Ok((
        temperature_k,
        args.override_user || config.maintenance.override_user_g298,
    ))
}

fn check_failures(report: &RelabelReport) -> Result<()> {
    match report.failures.len() {
        0 => Ok(()),
        n => bail!(
            "{n} of {} groups could not be relabeled and kept their previous labels",
            report.groups
        ),
    }
}

fn relabel_substeps(report: &RelabelReport) -> Vec<String> {
    vec![
        format!("{} of {} groups relabeled", report.relabeled, report.groups),
        format!("{} conformers in {} wells", report.conformers, report.wells),
    ]
}

fn mapping_substeps(report: &MappingReport) -> Vec<String> {
    vec![
        format!("{} of {} reactions mapped", report.mapped, report.reactions),
        format!("{} edges written", report.edges.written),
    ]
}

fn gibbs_substeps(report: &GibbsReport) -> Vec<String> {
    vec![format!("{} conformers updated", report.updated)]
}
