use super::cluster::cluster;
use super::error::Error;
use crate::model::conformer::{Conformer, WellUpdate};
use crate::model::ids::{ConformerId, GroupKey};
use crate::store::{self, Store};
use crate::utils::parallel::map_collect;
use log::{debug, error, info};

/// Outcome of relabeling one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupSummary {
    pub conformers: usize,
    pub wells: usize,
    pub ranked: usize,
    pub unranked: usize,
}

impl GroupSummary {
    fn of(updates: &[WellUpdate]) -> Self {
        let ranked = updates.iter().filter(|u| u.placement.is_some()).count();
        let wells = updates
            .iter()
            .filter_map(|u| u.placement)
            .filter(|p| p.is_representative)
            .count();
        Self {
            conformers: updates.len(),
            wells,
            ranked,
            unranked: updates.len() - ranked,
        }
    }
}

/// A group whose relabel was aborted, with every conformer it left untouched.
#[derive(Debug)]
pub struct GroupFailure {
    pub error: Error,
    pub conformers: Vec<ConformerId>,
}

#[derive(Debug, Default)]
pub struct RelabelReport {
    pub groups: usize,
    pub relabeled: usize,
    pub conformers: usize,
    pub wells: usize,
    pub unranked: usize,
    pub failures: Vec<GroupFailure>,
}

impl RelabelReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, summary: GroupSummary) {
        self.relabeled += 1;
        self.conformers += summary.conformers;
        self.wells += summary.wells;
        self.unranked += summary.unranked;
    }
}

/// Recomputes and stores the well assignment of one group in a single write.
pub fn relabel_group<S: Store + ?Sized>(
    store: &mut S,
    group: GroupKey,
) -> Result<GroupSummary, Error> {
    let conformers = store
        .group_conformers(group)
        .map_err(|e| Error::from_store(group, e))?;
    let updates = cluster(&conformers);
    apply(store, group, &updates)
}

/// Relabels every group in the store.
///
/// Assignments are computed for all groups first (on worker threads when
/// `parallel` is set), then written group by group. A group that fails is
/// logged with its conformer ids and recorded in the report; the remaining
/// groups are still written. Only a failure to list the groups is returned
/// as an error.
pub fn relabel_all<S: Store + ?Sized>(
    store: &mut S,
    parallel: bool,
) -> Result<RelabelReport, store::Error> {
    let groups = store.groups()?;
    let mut report = RelabelReport {
        groups: groups.len(),
        ..RelabelReport::default()
    };

    let mut snapshots: Vec<(GroupKey, Vec<Conformer>)> = Vec::with_capacity(groups.len());
    for group in groups {
        match store.group_conformers(group) {
            Ok(conformers) => snapshots.push((group, conformers)),
            Err(e) => fail(&mut report, Error::from_store(group, e), Vec::new()),
        }
    }

    let planned = map_collect(snapshots, parallel, |(group, conformers)| {
        let updates = cluster(&conformers);
        (group, updates)
    });

    for (group, updates) in planned {
        match apply(store, group, &updates) {
            Ok(summary) => report.record(summary),
            Err(e) => {
                let conformers = updates.iter().map(|u| u.conformer).collect();
                fail(&mut report, e, conformers);
            }
        }
    }

    info!(
        "relabeled {} of {} groups: {} conformers in {} wells, {} without energy",
        report.relabeled,
        report.groups,
        report.conformers,
        report.wells,
        report.unranked
    );
    Ok(report)
}

fn apply<S: Store + ?Sized>(
    store: &mut S,
    group: GroupKey,
    updates: &[WellUpdate],
) -> Result<GroupSummary, Error> {
    store
        .apply_well_updates(group, updates)
        .map_err(|e| Error::from_store(group, e))?;
    let summary = GroupSummary::of(updates);
    debug!(
        "{group}: {} conformers, {} wells, {} without energy",
        summary.conformers, summary.wells, summary.unranked
    );
    Ok(summary)
}

fn fail(report: &mut RelabelReport, error: Error, conformers: Vec<ConformerId>) {
    let ids: Vec<String> = conformers.iter().map(ToString::to_string).collect();
    error!(
        "relabel aborted for {} (conformers [{}]): {error}",
        error.group(),
        ids.join(", ")
    );
    report.failures.push(GroupFailure { error, conformers });
}
