use std::io::{self, Write};

use anyhow::Error;

use hab_forge::{ConfigError, IngestError, IoError, QueryError, RelabelError, StoreError};

use super::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    let hints = HintCollector::collect(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

#[derive(Default)]
struct HintCollector {
    hints: Vec<String>,
}

impl HintCollector {
    fn collect(err: &Error) -> Vec<String> {
        let mut collector = Self::default();
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<IngestError>() {
                collector.ingest(e);
            } else if let Some(e) = cause.downcast_ref::<IoError>() {
                collector.read(e);
            } else if let Some(e) = cause.downcast_ref::<StoreError>() {
                collector.store(e);
            } else if let Some(e) = cause.downcast_ref::<RelabelError>() {
                collector.relabel(e);
            } else if let Some(e) = cause.downcast_ref::<QueryError>() {
                collector.query(e);
            } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
                collector.config(e);
            } else if let Some(e) = cause.downcast_ref::<std::io::Error>() {
                collector.std_io(e);
            }
            if !collector.hints.is_empty() {
                break;
            }
        }
        collector.hints
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn ingest(&mut self, err: &IngestError) {
        match err {
            IngestError::Read(e) => self.read(e),
            IngestError::Store(e) => self.store(e),
            IngestError::Open { source, .. } => self.std_io(source),
            IngestError::EmptyGeometry { record, .. } => {
                self.add(format!("Record {record} has an empty atom block"));
                self.add("Every record of a triplet needs 3D coordinates");
            }
        }
    }

    fn read(&mut self, err: &IoError) {
        match err {
            IoError::Io { source } => self.std_io(source),
            IoError::Csv { source } => {
                if let Some(position) = source.position() {
                    self.add(format!("Inspect the table around line {}", position.line()));
                }
                self.add("Tables need a header row and comma-separated fields");
            }
            IoError::Parse { line, .. } => {
                self.add(format!("Inspect the file around line {line}"));
                self.add("Only V2000 molfile records are supported");
            }
            IoError::MissingRole { record } => {
                self.add(format!(
                    "Record {record} needs a 'type' data item with R1H, R2H or TS"
                ));
                self.add("Use --no-strict-roles to infer roles from record order");
            }
            IoError::DuplicateRole { .. } | IoError::IncompleteTriplet { .. } => {
                self.add("Records must come in groups of three: R1H, R2H and TS");
                self.add("Check for missing or repeated records in the file");
            }
            IoError::ReactionMismatch { .. } => {
                self.add("All three records of a triplet must name the same reaction");
            }
        }
    }

    fn store(&mut self, err: &StoreError) {
        match err {
            StoreError::Io { source } => self.std_io(source),
            StoreError::Snapshot(_) => {
                self.add("The store snapshot is not valid JSON");
                self.add("Point --db at a file written by hforge, or a new path");
            }
            StoreError::UnknownSpecies(_) => {
                self.add("Species ids are printed by 'hforge show <CONFORMER_ID>'");
            }
            StoreError::UnknownConformer(_) => {
                self.add("Conformer ids are shown by 'hforge conformers <SPECIES_ID>'");
            }
            StoreError::LabelRejected { group, conformer, .. } => {
                self.label_hints(group.species, group.lot, *conformer);
            }
            _ => {}
        }
    }

    fn relabel(&mut self, err: &RelabelError) {
        match err {
            RelabelError::LabelRejected {
                group, conformer, ..
            } => self.label_hints(group.species, group.lot, *conformer),
            RelabelError::Store { source, .. } => self.store(source),
        }
    }

    fn label_hints(
        &mut self,
        species: hab_forge::SpeciesId,
        lot: hab_forge::LotId,
        conformer: hab_forge::ConformerId,
    ) {
        self.add(format!(
            "Conformer {conformer} (species {species}, lot {lot}) has a label \
             that is not a plain identifier"
        ));
        self.add("Labels must be printable ASCII without spaces, at most 64 characters");
    }

    fn query(&mut self, err: &QueryError) {
        match err {
            QueryError::InvalidLimit(_) => self.add("Use --limit between 1 and 500"),
            QueryError::InvalidRank => self.add("Well ranks start at 1"),
            QueryError::Store(e) => self.store(e),
        }
    }

    fn config(&mut self, err: &ConfigError) {
        match err {
            ConfigError::Read { source, .. } => self.std_io(source),
            ConfigError::Parse(_) => {
                self.add("Config files have [ingest] and [maintenance] tables");
                self.add("Unknown keys are rejected; check for typos");
            }
            ConfigError::Invalid(_) => {}
        }
    }

    fn std_io(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }
            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }
            ErrorKind::InvalidData => {
                self.add("File contains invalid or corrupt data (not UTF-8?)");
            }
            ErrorKind::WriteZero | ErrorKind::StorageFull => {
                self.add("Failed to write data (disk full?)");
            }
            _ => {}
        }
    }
}
