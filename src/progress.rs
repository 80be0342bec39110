//! Decides whether a single-route path segment is acceptable directional travel.
//!
//! Travel in the route's own station order always passes. Travel against it is an
//! "excursion" and passes only when the geography shows it makes progress: curved and
//! branching routes sometimes have to be ridden backwards, but pointless wiggling must not.

use itertools::Itertools;

use crate::{
    config::QualityThresholds,
    data::{Network, RouteIdx, StationIdx},
};

/// What is known about the journey when a segment is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Journey<'p> {
    pub origin: Option<StationIdx>,
    /// Only known while checking the final leg.
    pub destination: Option<StationIdx>,
    /// The legs already ridden, oldest first.
    pub previous: &'p [&'p [StationIdx]],
}

pub struct ForwardProgress<'a> {
    network: &'a Network,
    thresholds: &'a QualityThresholds,
}

impl<'a> ForwardProgress<'a> {
    pub fn new(network: &'a Network, thresholds: &'a QualityThresholds) -> Self {
        Self {
            network,
            thresholds,
        }
    }

    pub fn is_forward_progress(
        &self,
        path: &[StationIdx],
        route: RouteIdx,
        journey: &Journey,
    ) -> bool {
        if path.len() < 2 {
            return true;
        }

        let route = self.network.route(route);
        let positions: Vec<usize> = path
            .iter()
            .filter_map(|&station| route.last_position(station))
            .collect();
        if positions.len() < 2 {
            return false;
        }

        if positions.iter().tuple_windows().all(|(a, b)| b > a) {
            return true;
        }
        if positions.iter().tuple_windows().all(|(a, b)| b < a) {
            return self.is_justified_excursion(path, journey);
        }

        false
    }

    fn is_justified_excursion(&self, path: &[StationIdx], journey: &Journey) -> bool {
        let Some(origin) = journey.origin else {
            return false;
        };
        let (Some(&start), Some(&end)) = (path.first(), path.last()) else {
            return false;
        };
        let miles = |from, to| self.network.miles(from, to);

        let origin_movement = miles(origin, end) - miles(origin, start);
        let away_from_origin = origin_movement > 0.0;

        if let Some(destination) = journey.destination {
            let toward_destination = miles(end, destination) < miles(start, destination);
            return away_from_origin && toward_destination;
        }

        let Some(&journey_end) = journey.previous.last().and_then(|leg| leg.last()) else {
            return away_from_origin;
        };

        let journey_movement = miles(journey_end, end) - miles(journey_end, start);
        let away_from_journey_end = journey_movement > 0.0;

        if path.len() == 2 && miles(start, end) < self.thresholds.short_excursion_miles {
            let min_movement = self.thresholds.min_excursion_movement_miles;
            return away_from_origin
                && away_from_journey_end
                && origin_movement > min_movement
                && journey_movement > min_movement;
        }

        away_from_origin && away_from_journey_end
    }
}
