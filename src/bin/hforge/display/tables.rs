use std::io::{self, Write};

use hab_forge::IngestReport;
use hab_forge::mapping::MappingReport;
use hab_forge::query::{ConformerDetail, ConformerRow};
use hab_forge::thermo::GibbsReport;
use hab_forge::wells::RelabelReport;

use super::text::{energy, or_dash, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_ingest_report(report: &IngestReport, files: usize, failed: usize) {
    let mut rows = vec![
        ("Files", format!("{files}")),
        ("Triplets", format!("{}", report.triplets)),
        ("Conformers new", format!("{}", report.conformers_created)),
        ("Conformers merged", format!("{}", report.conformers_merged)),
        ("Atoms", format!("{}", report.atoms_inserted)),
        ("Role tags", format!("{}", report.role_tags_added)),
        (
            "Features",
            format!("{} well / {} TS", report.well_features, report.ts_features),
        ),
        (
            "Map edges",
            format!(
                "{} new / {} kept / {} unresolved",
                report.mapping.written, report.mapping.already_present, report.mapping.unresolved
            ),
        ),
    ];
    if report.reactions_skipped > 0 {
        rows.insert(2, ("Already loaded", format!("{}", report.reactions_skipped)));
    }
    if report.kinetics_rows > 0 {
        rows.push(("Rate rows", format!("{}", report.kinetics_rows)));
    }
    if report.atom_rows_matched + report.atoms_without_row > 0 {
        rows.push((
            "Atom table",
            format!(
                "{} matched / {} without row",
                report.atom_rows_matched, report.atoms_without_row
            ),
        ));
    }
    if report.geom_measures_added > 0 {
        rows.push(("Geometry measures", format!("{}", report.geom_measures_added)));
    }
    if failed > 0 {
        rows.push(("Files failed", format!("{failed}")));
    }
    print_kv_table(&mut io::stderr().lock(), "Ingestion Summary", &rows);

    if !report.merges.is_empty() {
        let mut out = io::stderr().lock();
        let _ = writeln!(out, "{INDENT}Merged into existing conformers:");
        for m in &report.merges {
            let _ = writeln!(
                out,
                "{INDENT}  {} {} (record {}) → conformer {}",
                truncate(&m.reaction, 30),
                m.role,
                m.record,
                m.conformer
            );
        }
    }
}

pub fn print_relabel_report(report: &RelabelReport) {
    let rows = [
        ("Groups", format!("{}", report.groups)),
        ("Relabeled", format!("{}", report.relabeled)),
        ("Conformers", format!("{}", report.conformers)),
        ("Wells", format!("{}", report.wells)),
        ("Without energy", format!("{}", report.unranked)),
        ("Failed groups", format!("{}", report.failures.len())),
    ];
    let mut out = io::stderr().lock();
    print_kv_table(&mut out, "Relabel Summary", &rows);

    for failure in &report.failures {
        let group = failure.error.group();
        let ids: Vec<String> = failure.conformers.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "{INDENT}\x1b[31m✗\x1b[0m species {} lot {} conformer {}: {}",
            group.species,
            group.lot,
            or_dash(failure.error.conformer()),
            failure.error
        );
        if !ids.is_empty() {
            let _ = writeln!(out, "{INDENT}    untouched: {}", ids.join(", "));
        }
    }
}

pub fn print_mapping_report(report: &MappingReport, dry_run: bool) {
    let title = if dry_run {
        "Atom Map Summary (dry run)"
    } else {
        "Atom Map Summary"
    };
    let rows = [
        ("Reactions", format!("{}", report.reactions)),
        ("Mapped", format!("{}", report.mapped)),
        ("Incomplete", format!("{}", report.skipped_incomplete)),
        ("No star markers", format!("{}", report.skipped_no_markers)),
        ("Edges written", format!("{}", report.edges.written)),
        ("Edges present", format!("{}", report.edges.already_present)),
        ("Edges unresolved", format!("{}", report.edges.unresolved)),
    ];
    print_kv_table(&mut io::stderr().lock(), title, &rows);
}

pub fn print_gibbs_report(report: &GibbsReport, temperature_k: f64) {
    let rows = [
        ("Temperature", format!("{temperature_k} K")),
        ("Updated", format!("{}", report.updated)),
        ("Kept user G298", format!("{}", report.kept_user)),
        ("Kept computed G298", format!("{}", report.kept_computed)),
        ("Missing H or S", format!("{}", report.missing_inputs)),
    ];
    print_kv_table(&mut io::stderr().lock(), "G298 Backfill", &rows);
}

pub fn print_conformer_rows(rows: &[ConformerRow]) {
    let mut out = io::stdout().lock();
    let _ = writeln!(
        out,
        "{:>8}  {:<20}  {:<3}  {:<10}  {:>4}  {:<3}  {:<6}  {:>14}",
        "ID", "LoT", "TS", "Label", "Rank", "Rep", "Metric", "Energy kJ/mol"
    );
    for r in rows {
        let (metric, value) = match r.energy {
            Some(e) => (e.metric.label(), Some(e.value)),
            None => ("-", None),
        };
        let _ = writeln!(
            out,
            "{:>8}  {:<20}  {:<3}  {:<10}  {:>4}  {:<3}  {:<6}  {:>14}",
            r.conformer,
            truncate(&r.lot.lot_string(), 20),
            if r.is_ts { "yes" } else { "no" },
            truncate(r.well_label.as_deref().unwrap_or("-"), 10),
            or_dash(r.well_rank),
            if r.is_representative { "*" } else { "" },
            metric,
            energy(value)
        );
    }
}

pub fn print_conformer_detail(detail: &ConformerDetail) {
    let r = &detail.row;
    let rows = [
        ("Conformer", format!("{}", r.conformer)),
        ("Species", format!("{} ({})", r.species, detail.species_key)),
        ("SMILES", or_dash(detail.smiles.as_deref())),
        ("Level of theory", r.lot.lot_string()),
        ("Transition state", format!("{}", r.is_ts)),
        ("Well label", or_dash(r.well_label.as_deref())),
        ("Well rank", or_dash(r.well_rank)),
        ("Representative", format!("{}", r.is_representative)),
        ("G298", energy(r.g298)),
        ("H298", energy(r.h298)),
        ("E_elec", energy(r.e_elec)),
        ("ZPE", energy(r.zpe)),
        ("E0", energy(r.e0)),
        ("E_TS", energy(r.e_ts)),
        (
            "Shown energy",
            r.energy
                .map(|e| format!("{} {:.4}", e.metric, e.value))
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Imag. freq cm-1", or_dash(detail.imag_freq_cm1)),
        ("IRC verified", or_dash(detail.irc_verified)),
    ];
    let mut out = io::stdout().lock();
    print_kv_table(&mut out, "Conformer", &rows);
    if let Some(xyz) = &detail.xyz {
        let _ = writeln!(out);
        let _ = write!(out, "{xyz}");
    }
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 18usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);
    let k_line = "─".repeat(key_w + 2);
    let v_line = "─".repeat(val_w + 2);

    let _ = writeln!(
        out,
        "{INDENT}┌─ {} ─┐",
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{INDENT}┌{k_line}┬{v_line}┐");
    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{INDENT}│ {:<key_w$} │ {:>val_w$} │",
            truncate(key, key_w),
            truncate(val, val_w),
        );
    }
    let _ = writeln!(out, "{INDENT}└{k_line}┴{v_line}┘");
}
