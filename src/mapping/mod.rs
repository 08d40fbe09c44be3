//! Atom correspondence between reactants and transition state.
//!
//! A hydrogen-abstraction triplet is anchored at three positions: the donor
//! heavy atom, the acceptor heavy atom and the migrating hydrogen. The TS
//! record marks them with star labels (`*1` donor side, `*2` hydrogen, `*3`
//! acceptor side); the reactants carry `donor`/`d_hydrogen` (R1H) and
//! `acceptor`/`a_hydrogen` (R2H) role tags. Four edges follow:
//!
//! | reactant atom     | TS atom |
//! |-------------------|---------|
//! | R1H `donor`       | `*1`    |
//! | R2H `acceptor`    | `*3`    |
//! | R1H `d_hydrogen`  | `*2`    |
//! | R2H `a_hydrogen`  | `*2`    |
//!
//! Both hydrogens map to the same TS atom. An anchor that cannot be resolved
//! drops only its own edge.

use crate::model::ids::{AtomId, ConformerId};
use crate::model::reaction::AtomMapEdge;
use crate::model::types::{AtomRole, ReactionRole};
use crate::store::{Error, Store};
use log::{debug, info, warn};
use std::collections::HashMap;

pub const STAR_DONOR: &str = "*1";
pub const STAR_HYDROGEN: &str = "*2";
pub const STAR_ACCEPTOR: &str = "*3";

/// Conformer ids of a complete reaction triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripletConformers {
    pub r1h: ConformerId,
    pub r2h: ConformerId,
    pub ts: ConformerId,
}

/// Resolved atom ids of the anchor positions. `None` where unresolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchors {
    pub ts_star1: Option<AtomId>,
    pub ts_star2: Option<AtomId>,
    pub ts_star3: Option<AtomId>,
    pub r1h_donor: Option<AtomId>,
    pub r1h_hydrogen: Option<AtomId>,
    pub r2h_acceptor: Option<AtomId>,
    pub r2h_hydrogen: Option<AtomId>,
}

/// Edges derivable from `anchors`, plus the number of edges skipped because
/// one end was unresolved.
pub fn anchor_edges(triplet: TripletConformers, anchors: &Anchors) -> (Vec<AtomMapEdge>, usize) {
    let wanted = [
        (triplet.r1h, anchors.r1h_donor, anchors.ts_star1),
        (triplet.r2h, anchors.r2h_acceptor, anchors.ts_star3),
        (triplet.r1h, anchors.r1h_hydrogen, anchors.ts_star2),
        (triplet.r2h, anchors.r2h_hydrogen, anchors.ts_star2),
    ];
    let mut edges = Vec::with_capacity(wanted.len());
    let mut unresolved = 0;
    for (from_conformer, from_atom, ts_atom) in wanted {
        match (from_atom, ts_atom) {
            (Some(from_atom), Some(ts_atom)) => edges.push(AtomMapEdge {
                ts_conformer: triplet.ts,
                from_conformer,
                from_atom,
                ts_atom,
            }),
            _ => unresolved += 1,
        }
    }
    (edges, unresolved)
}

/// Looks up the star-marked TS atoms and the role-tagged reactant atoms.
///
/// Roles resolve to the lowest-index tagged atom. More than one tagged atom
/// for a role is reported as a warning since a valid triplet tags each role
/// once.
pub fn resolve_anchors<S: Store + ?Sized>(
    store: &S,
    triplet: TripletConformers,
) -> Result<Anchors, Error> {
    let ts = store
        .conformer(triplet.ts)?
        .ok_or(Error::UnknownConformer(triplet.ts))?;
    let ts_atoms: HashMap<usize, AtomId> = store
        .conformer_atoms(triplet.ts)?
        .into_iter()
        .map(|a| (a.index, a.id))
        .collect();
    let star = |marker: &str| ts.star_index(marker).and_then(|i| ts_atoms.get(&i).copied());

    Ok(Anchors {
        ts_star1: star(STAR_DONOR),
        ts_star2: star(STAR_HYDROGEN),
        ts_star3: star(STAR_ACCEPTOR),
        r1h_donor: first_with_role(store, triplet.r1h, AtomRole::Donor)?,
        r1h_hydrogen: first_with_role(store, triplet.r1h, AtomRole::DHydrogen)?,
        r2h_acceptor: first_with_role(store, triplet.r2h, AtomRole::Acceptor)?,
        r2h_hydrogen: first_with_role(store, triplet.r2h, AtomRole::AHydrogen)?,
    })
}

fn first_with_role<S: Store + ?Sized>(
    store: &S,
    conformer: ConformerId,
    role: AtomRole,
) -> Result<Option<AtomId>, Error> {
    let tagged = store.atoms_with_role(conformer, role)?;
    if tagged.len() > 1 {
        let indices: Vec<usize> = tagged.iter().map(|a| a.index).collect();
        warn!(
            "conformer {conformer}: {} atoms tagged '{role}' (indices {indices:?}); using index {}",
            tagged.len(),
            indices[0]
        );
    }
    Ok(tagged.first().map(|a| a.id))
}

/// Edge counts for one or more mapped triplets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingOutcome {
    pub written: usize,
    pub already_present: usize,
    pub unresolved: usize,
}

impl MappingOutcome {
    pub fn absorb(&mut self, other: MappingOutcome) {
        self.written += other.written;
        self.already_present += other.already_present;
        self.unresolved += other.unresolved;
    }
}

/// Writes the anchor edges of one triplet. Existing edges are left alone.
pub fn map_triplet<S: Store + ?Sized>(
    store: &mut S,
    triplet: TripletConformers,
) -> Result<MappingOutcome, Error> {
    let anchors = resolve_anchors(store, triplet)?;
    let (edges, unresolved) = anchor_edges(triplet, &anchors);
    if unresolved > 0 {
        debug!(
            "TS conformer {}: {unresolved} of 4 anchor edges unresolved",
            triplet.ts
        );
    }
    let mut outcome = MappingOutcome {
        unresolved,
        ..MappingOutcome::default()
    };
    for edge in edges {
        if store.insert_atom_map(edge)? {
            outcome.written += 1;
        } else {
            outcome.already_present += 1;
        }
    }
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingReport {
    pub reactions: usize,
    pub mapped: usize,
    pub skipped_incomplete: usize,
    pub skipped_no_markers: usize,
    pub edges: MappingOutcome,
}

/// Maps every complete triplet in the store, in reaction id order.
///
/// Reactions missing a participant, or whose TS has no star markers, are
/// skipped. With `dry_run` nothing is written and `mapped` counts the
/// reactions that would be mapped.
pub fn backfill_atom_maps<S: Store + ?Sized>(
    store: &mut S,
    dry_run: bool,
) -> Result<MappingReport, Error> {
    let mut report = MappingReport::default();
    for reaction in store.reactions()? {
        report.reactions += 1;
        let participants = store.participants(reaction.id)?;
        let conformer_of = |role: ReactionRole| {
            participants
                .iter()
                .find(|p| p.role == role)
                .map(|p| p.conformer)
        };
        let (Some(r1h), Some(r2h), Some(ts)) = (
            conformer_of(ReactionRole::R1H),
            conformer_of(ReactionRole::R2H),
            conformer_of(ReactionRole::TS),
        ) else {
            debug!("reaction '{}': incomplete triplet, skipped", reaction.name);
            report.skipped_incomplete += 1;
            continue;
        };

        let has_markers = store
            .conformer(ts)?
            .is_some_and(|c| c.has_star_markers());
        if !has_markers {
            debug!("reaction '{}': TS carries no star markers, skipped", reaction.name);
            report.skipped_no_markers += 1;
            continue;
        }

        report.mapped += 1;
        if dry_run {
            debug!("reaction '{}': would map atoms", reaction.name);
            continue;
        }
        let outcome = map_triplet(store, TripletConformers { r1h, r2h, ts })?;
        report.edges.absorb(outcome);
    }
    info!(
        "atom maps: {} of {} reactions {}, {} edges written, {} already present, {} unresolved",
        report.mapped,
        report.reactions,
        if dry_run { "eligible" } else { "mapped" },
        report.edges.written,
        report.edges.already_present,
        report.edges.unresolved
    );
    Ok(report)
}
