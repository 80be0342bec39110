use itertools::Itertools;

use crate::{
    data::{Network, RouteIdx, StationIdx},
    enumerator::Candidate,
};

/// Travel distance factor of an itinerary that a single route makes pointless.
pub const DISQUALIFIED_FACTOR: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItinerary {
    pub routes: [RouteIdx; 3],
    pub origin: StationIdx,
    pub first_transfer_arrival: StationIdx,
    pub first_transfer_departure: StationIdx,
    pub second_transfer_arrival: StationIdx,
    pub second_transfer_departure: StationIdx,
    pub destination: StationIdx,
    /// Distance travelled over the straight-line distance, or [`DISQUALIFIED_FACTOR`].
    pub travel_distance_factor: f64,
    /// Shortest of the three rides, in miles.
    pub minimum_distance_between_stations: f64,
    /// Worst single-step progress toward the destination as a share of the straight-line
    /// distance. Negative when some step moved away from it.
    pub minimum_distance_progress_factor: f64,
}

pub struct Scorer<'a> {
    network: &'a Network,
}

impl<'a> Scorer<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }

    pub fn score(&self, candidate: &Candidate) -> ScoredItinerary {
        let miles = |from, to| self.network.miles(from, to);
        let (origin, destination) = (candidate.origin(), candidate.destination());

        let stops = [
            origin,
            candidate.first_transfer_arrival(),
            candidate.first_transfer_departure(),
            candidate.second_transfer_arrival(),
            candidate.second_transfer_departure(),
            destination,
        ];
        let as_the_crow_flies = miles(origin, destination);
        let estimated_travel_distance: f64 = stops
            .iter()
            .tuple_windows()
            .map(|(&from, &to)| miles(from, to))
            .sum();

        let travel_distance_factor =
            if as_the_crow_flies == 0.0 || self.has_shorter_single_route(candidate) {
                DISQUALIFIED_FACTOR
            } else {
                estimated_travel_distance / as_the_crow_flies
            };

        let minimum_distance_between_stations = candidate
            .legs
            .iter()
            .map(|leg| miles(leg.boarding(), leg.alighting()))
            .fold(f64::INFINITY, f64::min);

        let minimum_distance_progress_factor = if as_the_crow_flies == 0.0 {
            0.0
        } else {
            candidate
                .legs
                .iter()
                .flat_map(|leg| leg.path().iter().tuple_windows())
                .map(|(&from, &to)| {
                    (miles(from, destination) - miles(to, destination)) / as_the_crow_flies
                })
                .min_by(f64::total_cmp)
                .unwrap_or(0.0)
        };

        ScoredItinerary {
            routes: candidate.routes(),
            origin,
            first_transfer_arrival: stops[1],
            first_transfer_departure: stops[2],
            second_transfer_arrival: stops[3],
            second_transfer_departure: stops[4],
            destination,
            travel_distance_factor,
            minimum_distance_between_stations,
            minimum_distance_progress_factor,
        }
    }

    /// Whether one route links the origin (or a station it transfers to) with the
    /// destination (or a station it transfers to) in fewer stops than the itinerary rides.
    pub fn has_shorter_single_route(&self, candidate: &Candidate) -> bool {
        let transfers = self.network.transfers();
        let itinerary_stops = candidate.stop_count();

        transfers.with_station(candidate.origin()).any(|from| {
            transfers.with_station(candidate.destination()).any(|to| {
                self.network.routes_serving(to).iter().any(|&route| {
                    let route = self.network.route(route);
                    match (route.position(from), route.position(to)) {
                        (Some(a), Some(b)) => a.abs_diff(b) < itinerary_stops,
                        _ => false,
                    }
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::QualityThresholds, data::fixtures::*, enumerator::Enumerator};

    fn itinerary(network: &Network, origin: &str, destination: &str) -> ScoredItinerary {
        let thresholds = QualityThresholds::default();
        let (origin, destination) = (
            network.station_idx(origin).unwrap(),
            network.station_idx(destination).unwrap(),
        );
        let candidate = Enumerator::new(network, &thresholds)
            .candidates()
            .find(|c| c.origin() == origin && c.destination() == destination)
            .unwrap();
        Scorer::new(network).score(&candidate)
    }

    // A --1-- B/B2 --2-- C/C3 --3-- D along the equator, 0.01 degrees apart
    fn straight(extra_routes: &[(&str, &[&str])]) -> Network {
        let mut routes: Vec<(&str, &[&str])> = vec![
            ("1", &["A", "B"][..]),
            ("2", &["B2", "C"][..]),
            ("3", &["C3", "D"][..]),
        ];
        routes.extend_from_slice(extra_routes);
        network(
            &[
                ("A", 0.0, 0.0, None),
                ("B", 0.0, 0.01, None),
                ("B2", 0.0, 0.01, None),
                ("C", 0.0, 0.02, None),
                ("C3", 0.0, 0.02, None),
                ("D", 0.0, 0.03, None),
            ],
            &routes,
            &[("B", "B2"), ("C", "C3")],
        )
    }

    #[test]
    fn factor_is_travelled_over_straight_line_distance() {
        // A -> B east, B2 -> D north, D3 -> E east: 3 blocks ridden, sqrt(5) blocks apart
        let network = network(
            &[
                ("A", 0.0, 0.0, None),
                ("B", 0.0, 0.01, None),
                ("B2", 0.0, 0.01, None),
                ("D", 0.01, 0.01, None),
                ("D3", 0.01, 0.01, None),
                ("E", 0.01, 0.02, None),
            ],
            &[("1", &["A", "B"]), ("2", &["B2", "D"]), ("3", &["D3", "E"])],
            &[("B", "B2"), ("D", "D3")],
        );
        let scored = itinerary(&network, "A", "E");
        let block = network.miles(0, 1);

        assert!((scored.travel_distance_factor - 3.0 / 5f64.sqrt()).abs() < 1e-4);
        assert!((scored.minimum_distance_between_stations - block).abs() < 1e-4);
        // the north leg only closes sqrt(2) - 1 blocks of the sqrt(5) block gap
        let expected = (2f64.sqrt() - 1.0) / 5f64.sqrt();
        assert!((scored.minimum_distance_progress_factor - expected).abs() < 1e-4);
        assert_eq!(scored.first_transfer_arrival, network.station_idx("B").unwrap());
        assert_eq!(scored.first_transfer_departure, network.station_idx("B2").unwrap());
    }

    #[test]
    fn straight_ride_never_backtracks() {
        let network = straight(&[]);
        let scored = itinerary(&network, "A", "D");

        assert!((scored.travel_distance_factor - 1.0).abs() < 1e-4);
        assert!((scored.minimum_distance_progress_factor - 1.0 / 3.0).abs() < 1e-4);
        assert!(scored.minimum_distance_progress_factor > 0.0);
        assert!(scored.minimum_distance_progress_factor <= 1.0);
    }

    #[test]
    fn shorter_single_route_disqualifies() {
        let network = straight(&[("X", &["A", "D"])]);
        let scored = itinerary(&network, "A", "D");

        assert_eq!(scored.travel_distance_factor, DISQUALIFIED_FACTOR);
        // the other metrics are still measured
        assert!((scored.minimum_distance_progress_factor - 1.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn single_route_with_as_many_stops_does_not_disqualify() {
        let network = straight(&[("L", &["A", "B", "B2", "C", "D"])]);
        let scored = itinerary(&network, "A", "D");

        assert!((scored.travel_distance_factor - 1.0).abs() < 1e-4);
    }

    #[test]
    fn coincident_endpoints_are_disqualified() {
        let network = network(
            &[
                ("A", 0.0, 0.0, None),
                ("B", 0.0, 0.01, None),
                ("B2", 0.0, 0.01, None),
                ("C", 0.01, 0.01, None),
                ("C3", 0.01, 0.01, None),
                ("Z", 0.0, 0.0, None),
            ],
            &[("1", &["A", "B"]), ("2", &["B2", "C"]), ("3", &["C3", "Z"])],
            &[("B", "B2"), ("C", "C3")],
        );
        let scored = itinerary(&network, "A", "Z");

        assert_eq!(scored.travel_distance_factor, DISQUALIFIED_FACTOR);
        assert_eq!(scored.minimum_distance_progress_factor, 0.0);
    }
}
