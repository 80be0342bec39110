//! Enumerates every three-route, two-transfer itinerary of a [`Network`].
//!
//! The search runs in three stages, one per leg. Each stage takes the legs already
//! chosen and returns every acceptable continuation:
//!
//! 1. [`Enumerator::first_legs`]: ride any route serving the origin, either way along it.
//! 2. [`Enumerator::second_legs`]: transfer at (or next to) the end of the first leg onto
//!    a different route and ride it.
//! 3. [`Enumerator::third_legs`]: transfer again onto a third route and ride it to the
//!    destination.
//!
//! [`Enumerator::candidates`] chains the stages lazily.

use std::rc::Rc;

use crate::{
    config::QualityThresholds,
    data::{Network, RouteIdx, StationIdx},
    progress::{ForwardProgress, Journey},
};

/// A ride on one route: the first `stops + 1` stations of `walk`.
#[derive(Debug, Clone)]
pub struct Leg {
    pub route: RouteIdx,
    walk: Rc<[StationIdx]>,
    stops: usize,
}

impl Leg {
    /// Every station from boarding to alighting.
    pub fn path(&self) -> &[StationIdx] {
        &self.walk[..=self.stops]
    }

    /// The whole remaining route in the direction of travel, beyond the alighting station too.
    pub fn walk(&self) -> &[StationIdx] {
        &self.walk
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    pub fn boarding(&self) -> StationIdx {
        self.walk[0]
    }

    pub fn alighting(&self) -> StationIdx {
        self.walk[self.stops]
    }

    /// The station the train would call at after the alighting station.
    pub fn next_station(&self) -> Option<StationIdx> {
        self.walk.get(self.stops + 1).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub legs: [Leg; 3],
}

impl Candidate {
    pub fn routes(&self) -> [RouteIdx; 3] {
        self.legs.each_ref().map(|leg| leg.route)
    }

    pub fn origin(&self) -> StationIdx {
        self.legs[0].boarding()
    }

    pub fn first_transfer_arrival(&self) -> StationIdx {
        self.legs[0].alighting()
    }

    pub fn first_transfer_departure(&self) -> StationIdx {
        self.legs[1].boarding()
    }

    pub fn second_transfer_arrival(&self) -> StationIdx {
        self.legs[1].alighting()
    }

    pub fn second_transfer_departure(&self) -> StationIdx {
        self.legs[2].boarding()
    }

    pub fn destination(&self) -> StationIdx {
        self.legs[2].alighting()
    }

    /// Stations ridden through, counting each transfer station once per leg.
    pub fn stop_count(&self) -> usize {
        self.legs.iter().map(|leg| leg.path().len()).sum::<usize>() - 2
    }
}

pub struct Enumerator<'a> {
    network: &'a Network,
    progress: ForwardProgress<'a>,
}

impl<'a> Enumerator<'a> {
    pub fn new(network: &'a Network, thresholds: &'a QualityThresholds) -> Self {
        Self {
            network,
            progress: ForwardProgress::new(network, thresholds),
        }
    }

    /// Every itinerary of the network, origin by origin.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        (0..self.network.stations().len()).flat_map(move |origin| {
            self.first_legs(origin).into_iter().flat_map(move |first| {
                self.second_legs(&first)
                    .into_iter()
                    .flat_map(move |second| {
                        let first = first.clone();
                        self.third_legs(&first, &second)
                            .into_iter()
                            .map(move |third| Candidate {
                                legs: [first.clone(), second.clone(), third],
                            })
                    })
            })
        })
    }

    /// Rides from `origin` along each route serving it, both ways, at least one stop.
    pub fn first_legs(&self, origin: StationIdx) -> Vec<Leg> {
        let journey = Journey {
            origin: Some(origin),
            ..Journey::default()
        };

        let mut legs = Vec::new();
        for &route in self.network.routes_serving(origin) {
            for walk in self.network.route(route).walks_from(origin) {
                for stops in 1..walk.len() {
                    if self
                        .progress
                        .is_forward_progress(&walk[..=stops], route, &journey)
                    {
                        legs.push(Leg {
                            route,
                            walk: Rc::clone(walk),
                            stops,
                        });
                    }
                }
            }
        }
        legs
    }

    /// Transfers off `first` onto another route and rides on.
    pub fn second_legs(&self, first: &Leg) -> Vec<Leg> {
        let origin = first.boarding();
        let path1 = first.path();
        let previous = [path1];
        let journey = Journey {
            origin: Some(origin),
            destination: None,
            previous: &previous,
        };

        let mut legs = Vec::new();
        for transfer in self.network.transfers().with_station(first.alighting()) {
            if path1.contains(&transfer) {
                continue;
            }

            for &route in self.network.routes_serving(transfer) {
                if route == first.route || self.reaches_sooner(route, origin, transfer, first.stops())
                {
                    continue;
                }

                for walk in self.network.route(route).walks_from(transfer) {
                    if first
                        .next_station()
                        .is_some_and(|next| self.doubles_back(walk, next))
                    {
                        continue;
                    }

                    for stops in 1..walk.len() {
                        let station = walk[stops];
                        if first.walk().contains(&station) || self.touches(station, &[path1]) {
                            break;
                        }

                        let path2 = &walk[..=stops];
                        if path2[1..].iter().any(|s| path1.contains(s)) {
                            continue;
                        }
                        if !self.progress.is_forward_progress(path2, route, &journey) {
                            continue;
                        }

                        legs.push(Leg {
                            route,
                            walk: Rc::clone(walk),
                            stops,
                        });
                    }
                }
            }
        }
        legs
    }

    /// Transfers off `second` onto a third route and rides to each possible destination.
    pub fn third_legs(&self, first: &Leg, second: &Leg) -> Vec<Leg> {
        let origin = first.boarding();
        let first_transfer = second.boarding();
        let (path1, path2) = (first.path(), second.path());
        let previous = [path1, path2];

        let mut legs = Vec::new();
        for transfer in self.network.transfers().with_station(second.alighting()) {
            if path1.contains(&transfer) || path2.contains(&transfer) {
                continue;
            }

            for &route in self.network.routes_serving(transfer) {
                if route == first.route
                    || route == second.route
                    || self.reaches_sooner(route, first_transfer, transfer, second.stops())
                {
                    continue;
                }

                for walk in self.network.route(route).walks_from(transfer) {
                    if second
                        .next_station()
                        .is_some_and(|next| self.doubles_back(walk, next))
                    {
                        continue;
                    }

                    for stops in 1..walk.len() {
                        let destination = walk[stops];
                        if first.walk().contains(&destination)
                            || second.walk().contains(&destination)
                            || self.touches(destination, &previous)
                        {
                            break;
                        }

                        let path3 = &walk[..=stops];
                        if path3[1..]
                            .iter()
                            .any(|s| path1.contains(s) || path2.contains(s))
                        {
                            continue;
                        }

                        let journey = Journey {
                            origin: Some(origin),
                            destination: Some(destination),
                            previous: &previous,
                        };
                        if !self.progress.is_forward_progress(path3, route, &journey) {
                            continue;
                        }

                        legs.push(Leg {
                            route,
                            walk: Rc::clone(walk),
                            stops,
                        });
                    }
                }
            }
        }
        legs
    }

    /// Whether `route` links `from` and `to` within `stops` stops, which would make the
    /// leg that just got there redundant. Routes not serving both never do.
    fn reaches_sooner(&self, route: RouteIdx, from: StationIdx, to: StationIdx, stops: usize) -> bool {
        let route = self.network.route(route);
        match (route.position(from), route.position(to)) {
            (Some(from), Some(to)) => from.abs_diff(to) <= stops,
            _ => false,
        }
    }

    /// Whether `walk` passes the station the previous train was heading to next, or any
    /// station transferable from it.
    fn doubles_back(&self, walk: &[StationIdx], next: StationIdx) -> bool {
        walk.contains(&next)
            || self
                .network
                .transfers()
                .from_station(next)
                .iter()
                .any(|s| walk.contains(s))
    }

    /// Whether a transfer from `station` lands on any of `paths`.
    fn touches(&self, station: StationIdx, paths: &[&[StationIdx]]) -> bool {
        self.network
            .transfers()
            .from_station(station)
            .iter()
            .any(|s| paths.iter().any(|path| path.contains(s)))
    }
}
