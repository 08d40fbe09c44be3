use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hforge",
    about = "Hydrogen-abstraction reaction data management",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load reaction triplets from SDF files or directories
    #[command(visible_alias = "i")]
    Ingest(IngestArgs),

    /// Recompute well ranks, labels and representatives for every group
    Relabel(RelabelArgs),

    /// Build reactant/TS atom maps for every complete triplet
    #[command(name = "atom-maps")]
    AtomMaps(AtomMapsArgs),

    /// Derive missing G298 values from H298 and S298
    G298(G298Args),

    /// Run relabel, atom-maps and g298 in sequence
    All(AllArgs),

    /// List the conformers of a species
    #[command(visible_alias = "ls")]
    Conformers(ConformersArgs),

    /// Show one conformer in detail
    Show(ShowArgs),
}

/// Options shared by all commands.
#[derive(Args)]
pub struct GlobalOptions {
    /// Store snapshot file (created on first write)
    #[arg(long, value_name = "FILE", global = true, default_value = "hforge.json")]
    pub db: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct IngestArgs {
    /// SDF files, or directories searched recursively for *.sdf / *.sd
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Infer missing record roles from their position in the triplet
    #[arg(long)]
    pub no_strict_roles: bool,

    /// Level of theory for records without a level_of_theory item
    #[arg(long, value_name = "METHOD/BASIS")]
    pub lot: Option<String>,

    /// Skip atom mapping during ingestion
    #[arg(long)]
    pub no_map_atoms: bool,

    /// Parse and validate only; the store is not written
    #[arg(long)]
    pub dry_run: bool,

    /// Abort at the first file that fails instead of skipping it
    #[arg(long)]
    pub stop_on_error: bool,

    /// Batch label recorded for every file (defaults to the file path)
    #[arg(long, value_name = "LABEL", help_heading = "Provenance")]
    pub source_label: Option<String>,

    /// Reuse an existing batch with the same label
    #[arg(long, help_heading = "Provenance")]
    pub reuse_batch: bool,

    /// Leave reactions that already have all three participants untouched
    #[arg(long)]
    pub skip_if_loaded: bool,

    /// Arrhenius rate table (reaction_label, label, A, n, Ea, Tmin, Tmax, ...)
    #[arg(long, value_name = "FILE", help_heading = "Companion Tables")]
    pub kinetics_csv: Option<PathBuf>,

    /// Per-atom feature table (rxn_id, mol_type, focus_atom_idx, q_mull, ...)
    #[arg(long, value_name = "FILE", help_heading = "Companion Tables")]
    pub atom_csv: Option<PathBuf>,

    /// Store the per-atom table's path/radius/angle/dihedral columns as geometry measures
    #[arg(long, requires = "atom_csv", help_heading = "Companion Tables")]
    pub mirror_geometry: bool,

    /// The per-atom table gives angles in degrees rather than radians
    #[arg(long, requires = "atom_csv", help_heading = "Companion Tables")]
    pub angles_in_degrees: bool,
}

#[derive(Args)]
pub struct RelabelArgs {
    /// Cluster groups on a single thread
    #[arg(long)]
    pub serial: bool,
}

#[derive(Args)]
pub struct AtomMapsArgs {
    /// Report what would be mapped without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
#[command(next_help_heading = "Gibbs Energy")]
pub struct G298Args {
    /// Temperature for G = H - T*S in kelvin
    #[arg(long, value_name = "K")]
    pub temperature: Option<f64>,

    /// Recompute G298 even where the input supplied one
    #[arg(long)]
    pub override_user: bool,
}

#[derive(Args)]
pub struct AllArgs {
    #[command(flatten)]
    pub g298: G298Args,

    /// Cluster groups on a single thread
    #[arg(long)]
    pub serial: bool,
}

#[derive(Args)]
#[command(next_help_heading = "Filters")]
pub struct ConformersArgs {
    /// Species id
    #[arg(value_name = "SPECIES_ID")]
    pub species: u64,

    /// Only conformers at this level-of-theory id
    #[arg(long, value_name = "LOT_ID")]
    pub lot: Option<u64>,

    /// Only transition states (true) or only wells (false)
    #[arg(long, value_name = "BOOL")]
    pub ts: Option<bool>,

    /// Only well representatives
    #[arg(long)]
    pub representatives: bool,

    /// Only conformers in this well rank
    #[arg(long, value_name = "N")]
    pub rank: Option<u32>,

    /// Page size (1-500)
    #[arg(long, value_name = "N", default_value_t = hab_forge::query::DEFAULT_LIMIT)]
    pub limit: usize,

    /// Rows to skip
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub offset: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Conformer id
    #[arg(value_name = "CONFORMER_ID")]
    pub conformer: u64,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
