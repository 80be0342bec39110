use std::{collections::BTreeMap, fmt};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    config::QualityThresholds,
    data::{Network, RouteIdx},
    scorer::ScoredItinerary,
};

/// Display form of a route id: branch variants such as `A1` and `A2` show as `A`.
pub fn display_route_id(id: &str) -> &str {
    let mut chars = id.char_indices();
    match (chars.next(), chars.next()) {
        (Some((_, letter)), Some((branch, _)))
            if letter.is_ascii_alphabetic()
                && id[branch..].chars().all(|c| c.is_ascii_digit()) =>
        {
            &id[..branch]
        }
        _ => id,
    }
}

/// Three display route ids in riding order. Itineraries are grouped and deduplicated by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteCombo(pub [String; 3]);

impl RouteCombo {
    pub fn new(network: &Network, routes: [RouteIdx; 3]) -> Self {
        Self(routes.map(|route| display_route_id(&network.route(route).id).to_owned()))
    }

    /// The hyphen-joined form used as the key of the solutions file.
    pub fn key(&self) -> String {
        self.0.join("-")
    }
}

impl fmt::Display for RouteCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Source of the variety shuffles. `Disabled` keeps every order as computed.
#[derive(Debug)]
pub enum Shuffler {
    Disabled,
    Random(StdRng),
}

impl Shuffler {
    pub fn seeded(seed: u64) -> Self {
        Self::Random(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self::Random(StdRng::from_os_rng())
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        if let Self::Random(rng) = self {
            items.shuffle(rng);
        }
    }
}

/// Which preference tier produced a combo's solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    NoBacktracking,
    LeastBacktracking,
    WithinThreshold,
    Fallback,
}

#[derive(Debug, Default)]
pub struct Selection {
    /// Combos eligible to be a day's puzzle.
    pub answers: Vec<RouteCombo>,
    /// One solution per combo, including those left out of `answers`.
    pub solutions: BTreeMap<RouteCombo, ScoredItinerary>,
}

impl Selection {
    pub fn disqualified(&self) -> usize {
        self.solutions.len() - self.answers.len()
    }
}

pub struct Selector<'a> {
    network: &'a Network,
    thresholds: &'a QualityThresholds,
}

impl<'a> Selector<'a> {
    pub fn new(network: &'a Network, thresholds: &'a QualityThresholds) -> Self {
        Self {
            network,
            thresholds,
        }
    }

    /// Picks one solution per combo, then keeps the combos fit for daily rotation.
    pub fn select(
        &self,
        candidates: BTreeMap<RouteCombo, Vec<ScoredItinerary>>,
        shuffler: &mut Shuffler,
    ) -> Selection {
        let mut solutions = BTreeMap::new();
        for (combo, itineraries) in candidates {
            if let Some((picked, preference)) = self.pick(itineraries, shuffler) {
                log::debug!("{combo}: picked by {preference:?}");
                solutions.insert(combo, picked);
            }
        }

        let mut answers: Vec<RouteCombo> = solutions
            .iter()
            .filter(|(_, itinerary)| !self.is_disqualified(itinerary))
            .map(|(combo, _)| combo.clone())
            .collect();
        shuffler.shuffle(&mut answers);

        Selection { answers, solutions }
    }

    /// Chooses among the best third (by travel distance factor) of one combo's itineraries.
    /// `None` only when there are no itineraries at all.
    pub fn pick(
        &self,
        mut itineraries: Vec<ScoredItinerary>,
        shuffler: &mut Shuffler,
    ) -> Option<(ScoredItinerary, Preference)> {
        itineraries.sort_by(|a, b| a.travel_distance_factor.total_cmp(&b.travel_distance_factor));
        itineraries.truncate((itineraries.len() / 3).max(1));
        shuffler.shuffle(&mut itineraries);
        let pool = itineraries;

        let fits = |s: &&ScoredItinerary| s.travel_distance_factor < self.max_factor(s);
        let rides_far_enough =
            |s: &&ScoredItinerary| s.minimum_distance_between_stations >= self.thresholds.min_leg_miles;

        if let Some(s) = pool
            .iter()
            .filter(fits)
            .filter(rides_far_enough)
            .find(|s| s.minimum_distance_progress_factor >= 0.0)
        {
            return Some((s.clone(), Preference::NoBacktracking));
        }

        let mut by_progress: Vec<&ScoredItinerary> = pool.iter().collect();
        by_progress.sort_by(|a, b| {
            b.minimum_distance_progress_factor
                .total_cmp(&a.minimum_distance_progress_factor)
        });
        if let Some(s) = by_progress
            .into_iter()
            .find(|s| fits(s) && rides_far_enough(s))
        {
            return Some((s.clone(), Preference::LeastBacktracking));
        }

        if let Some(s) = pool.iter().find(fits) {
            return Some((s.clone(), Preference::WithinThreshold));
        }

        pool.into_iter().next().map(|s| (s, Preference::Fallback))
    }

    /// Highest travel distance factor allowed: cross-borough trips get more slack.
    pub fn max_factor(&self, itinerary: &ScoredItinerary) -> f64 {
        let origin = &self.network.station(itinerary.origin).borough;
        let destination = &self.network.station(itinerary.destination).borough;
        match (origin, destination) {
            (Some(a), Some(b)) if a != b => self.thresholds.cross_borough_max_factor,
            _ => self.thresholds.same_borough_max_factor,
        }
    }

    /// Whether a combo's solution is kept out of daily rotation. It stays guessable.
    pub fn is_disqualified(&self, itinerary: &ScoredItinerary) -> bool {
        itinerary.travel_distance_factor >= self.max_factor(itinerary)
            || itinerary.minimum_distance_progress_factor < self.thresholds.backtracking_tolerance
    }
}
