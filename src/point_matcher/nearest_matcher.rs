use std::collections::HashSet;

use log::{info, warn};

use super::distance::{geodesic_distance_km, round_distance};
use super::matcher_types::{Assignment, MatchResult, MatchStats, MatcherError, Point, PointSet};

impl Assignment {
    fn new(hp: &Point, chid: &Point, distance_km: f64) -> Assignment {
        Assignment {
            hp_id: hp.id.clone(),
            hp_lat: hp.lat,
            hp_lon: hp.lon,
            chid_id: chid.id.clone(),
            chid_lat: chid.lat,
            chid_lon: chid.lon,
            distance_km: round_distance(distance_km),
        }
    }
}

/// Reports a non-decreasing fraction of outer iterations done.
struct ProgressTracker<'a> {
    done: usize,
    total: usize,
    last: f64,
    callback: &'a mut dyn FnMut(f64),
}

impl<'a> ProgressTracker<'a> {
    fn new(total: usize, callback: &'a mut dyn FnMut(f64)) -> ProgressTracker<'a> {
        ProgressTracker {
            done: 0,
            total,
            last: 0.0,
            callback,
        }
    }

    fn set_total(&mut self, total: usize) {
        self.total = total.max(self.done);
    }

    fn step(&mut self) {
        self.done += 1;
        let fraction = match self.total {
            0 => 1.0,
            total => (self.done as f64 / total as f64).min(1.0),
        };
        self.report(fraction);
    }

    fn report(&mut self, fraction: f64) {
        self.last = fraction.max(self.last);
        (self.callback)(self.last);
    }

    fn finish(&mut self) {
        if self.last < 1.0 {
            self.report(1.0);
        }
    }
}

/**
 * Index and distance of the first candidate at strictly minimal distance.
 * Candidates whose distance cannot be computed are skipped and counted; the
 * total is reported once per run, not per candidate.
 */
fn nearest<'p, I, F>(candidates: I, distance_to: F, failures: &mut usize) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'p Point>,
    F: Fn(&Point) -> Result<f64, MatcherError>,
{
    let mut best: Option<(usize, f64)> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let distance = match distance_to(candidate) {
            Ok(distance) => distance,
            Err(_) => {
                *failures += 1;
                continue;
            }
        };

        if best.map_or(true, |(_, min_distance)| distance < min_distance) {
            best = Some((idx, distance));
        }
    }

    best
}

pub fn match_points(hps: &PointSet, chids: &PointSet) -> MatchResult {
    match_points_with_progress(hps, chids, &mut |_| {})
}

/**
 * Two-pass nearest-neighbor assignment.
 *
 * First pass: every CHID, in order, takes its nearest HP out of the pool of
 * HPs not taken yet. CHIDs arriving after the pool is empty get nothing.
 *
 * Second pass: every HP left in the pool is attached to its nearest CHID among
 * all of them, so a CHID can end up with several HPs.
 *
 * Ties go to the earliest candidate in input order. `progress` gets a fraction
 * in [0, 1] after each CHID of the first pass and each HP of the second one.
 */
pub fn match_points_with_progress(
    hps: &PointSet,
    chids: &PointSet,
    progress: &mut dyn FnMut(f64),
) -> MatchResult {
    let expected_leftovers = hps.len().saturating_sub(chids.len());
    let mut tracker = ProgressTracker::new(chids.len() + expected_leftovers, progress);

    let mut failed_distances = 0;
    let mut skipped_chids = 0;
    let mut assignments = Vec::with_capacity(hps.len());

    let mut available: Vec<&Point> = hps.iter().collect();

    for chid in chids.iter() {
        let found = nearest(
            available.iter().cloned(),
            |hp| geodesic_distance_km(hp, chid),
            &mut failed_distances,
        );

        match found {
            Some((idx, distance)) => {
                let hp = available.remove(idx);
                assignments.push(Assignment::new(hp, chid, distance));
            }
            None => skipped_chids += 1,
        }

        tracker.step();
    }

    let first_pass_pairs = assignments.len();
    info!(
        "First pass assigned {} HPs, {} left over",
        first_pass_pairs,
        available.len()
    );

    tracker.set_total(chids.len() + available.len());

    for hp in available {
        let found = nearest(
            chids.iter(),
            |chid| geodesic_distance_km(hp, chid),
            &mut failed_distances,
        );

        match found {
            Some((idx, distance)) => {
                assignments.push(Assignment::new(hp, &chids.points[idx], distance));
            }
            None => warn!("No CHID reachable from HP {}", hp.id),
        }

        tracker.step();
    }

    tracker.finish();

    let unique_chids_used = assignments
        .iter()
        .map(|a| a.chid_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let stats = MatchStats {
        total_hps: hps.len(),
        total_chids: chids.len(),
        assigned_pairs: assignments.len(),
        first_pass_pairs,
        second_pass_pairs: assignments.len() - first_pass_pairs,
        unique_chids_used,
        skipped_chids,
        failed_distances,
    };

    MatchResult { assignments, stats }
}
