//! One end-to-end generation run for a service pattern: load, enumerate, score, select, emit.

use std::{collections::BTreeMap, path::Path};

use crate::{
    config::{GeneratorConfig, QualityThresholds, ServicePattern},
    data::Network,
    emitter,
    enumerator::Enumerator,
    error::GeneratorError,
    gtfs::Feed,
    scorer::{ScoredItinerary, Scorer},
    selector::{RouteCombo, Selection, Selector, Shuffler},
};

/// Counts describing one pattern's run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternReport {
    pub pattern: String,
    pub stations: usize,
    pub routes: usize,
    pub transfers: usize,
    /// Candidates enumerated, including any dropped by the per-combo cap.
    pub candidates: usize,
    pub capped: usize,
    pub combos: usize,
    pub answers: usize,
    pub disqualified: usize,
}

/// Every scored candidate grouped by route combo.
#[derive(Debug, Default)]
pub struct CandidatePool {
    pub by_combo: BTreeMap<RouteCombo, Vec<ScoredItinerary>>,
    pub candidates: usize,
    pub capped: usize,
}

/// Enumerates and scores every candidate itinerary of `network`. With a `cap`, a combo keeps
/// only the first `cap` candidates found.
pub fn collect_candidates(
    network: &Network,
    thresholds: &QualityThresholds,
    cap: Option<usize>,
) -> CandidatePool {
    let enumerator = Enumerator::new(network, thresholds);
    let scorer = Scorer::new(network);
    let mut pool = CandidatePool::default();

    for candidate in enumerator.candidates() {
        pool.candidates += 1;
        let combo = RouteCombo::new(network, candidate.routes());
        let itineraries = pool.by_combo.entry(combo).or_default();
        if cap.is_some_and(|cap| itineraries.len() >= cap) {
            pool.capped += 1;
            continue;
        }
        itineraries.push(scorer.score(&candidate));
    }

    if pool.capped > 0 {
        log::debug!("Dropped {} candidates over the per-combo cap", pool.capped);
    }
    pool
}

/// Runs enumeration and selection over an already loaded network.
pub fn generate(
    network: &Network,
    thresholds: &QualityThresholds,
    cap: Option<usize>,
    shuffler: &mut Shuffler,
) -> (Selection, PatternReport) {
    let pool = collect_candidates(network, thresholds, cap);
    log::info!(
        "Found {} candidates across {} route combos",
        pool.candidates,
        pool.by_combo.len()
    );

    let report = PatternReport {
        stations: network.stations().len(),
        routes: network.routes().len(),
        transfers: network.transfers().len(),
        candidates: pool.candidates,
        capped: pool.capped,
        combos: pool.by_combo.len(),
        ..PatternReport::default()
    };

    let selection = Selector::new(network, thresholds).select(pool.by_combo, shuffler);
    let report = PatternReport {
        answers: selection.answers.len(),
        disqualified: selection.disqualified(),
        ..report
    };
    (selection, report)
}

/// Loads `pattern` from `data_dir` and writes its output files under `output_dir/<name>`.
pub fn run_pattern(
    data_dir: &Path,
    output_dir: &Path,
    pattern: &ServicePattern,
    config: &GeneratorConfig,
    shuffler: &mut Shuffler,
) -> Result<PatternReport, GeneratorError> {
    log::info!("Generating {} puzzles", pattern.name);

    let feed = Feed::load(data_dir, &pattern.name, &pattern.routes)?;
    let network = Network::try_from(feed)?;
    log::info!(
        "Loaded {} stations, {} routes and {} transfer stations",
        network.stations().len(),
        network.routes().len(),
        network.transfers().len()
    );

    let (selection, report) = generate(
        &network,
        &config.thresholds,
        config.max_candidates_per_combo,
        shuffler,
    );
    log::info!(
        "{}: {} answers, {} combos kept out of rotation",
        pattern.name,
        report.answers,
        report.disqualified
    );

    emitter::emit(&output_dir.join(&pattern.name), &network, &selection)?;
    Ok(PatternReport {
        pattern: pattern.name.clone(),
        ..report
    })
}
