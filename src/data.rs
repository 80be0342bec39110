use std::{collections::HashMap, rc::Rc};

use geo::{Distance, Haversine, Point};

use crate::{error::GeneratorError, gtfs};

pub type StationIdx = usize;
pub type RouteIdx = usize;

/// Earth radius `geo::Haversine` measures with.
const MEAN_EARTH_RADIUS_METERS: f64 = 6_371_008.8;
/// Earth radius the quality thresholds were tuned against (Geokit's), about 0.11% above the mean.
const EARTH_RADIUS_MILES: f64 = 3963.19;

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub location: Point<f64>,
    pub borough: Option<String>,
}

/// One directional alignment of a route: the stations it calls at, in order.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    positions: HashMap<StationIdx, usize>,
    last_positions: HashMap<StationIdx, usize>,
    // [forward, backward] walks starting at each position, shared by every leg boarding there
    walks: Vec<[Rc<[StationIdx]>; 2]>,
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Route {
    pub fn new(id: String, stations: Vec<StationIdx>) -> Self {
        let mut positions = HashMap::with_capacity(stations.len());
        let mut last_positions = HashMap::with_capacity(stations.len());
        for (position, &station) in stations.iter().enumerate() {
            positions.entry(station).or_insert(position);
            last_positions.insert(station, position);
        }

        let walks = (0..stations.len())
            .map(|position| {
                let forward: Rc<[StationIdx]> = stations[position..].into();
                let backward: Rc<[StationIdx]> =
                    stations[..=position].iter().rev().copied().collect();
                [forward, backward]
            })
            .collect();

        Self {
            id,
            positions,
            last_positions,
            walks,
        }
    }

    /// Position of the first call at `station`.
    pub fn position(&self, station: StationIdx) -> Option<usize> {
        self.positions.get(&station).copied()
    }

    /// Position of the last call at `station`. On a loop, riding back to the start reads
    /// as travel in route order.
    pub fn last_position(&self, station: StationIdx) -> Option<usize> {
        self.last_positions.get(&station).copied()
    }

    /// The route walked from `station` to its end, then from `station` back to its start.
    /// Both walks begin with `station` itself.
    pub fn walks_from(&self, station: StationIdx) -> &[Rc<[StationIdx]>] {
        match self.position(station) {
            Some(position) => self.walks[position].as_slice(),
            None => &[],
        }
    }
}

/// Directed transfer adjacency. Rows are kept as given: `a -> b` does not imply `b -> a`.
#[derive(Debug, Default, Clone)]
pub struct TransferMap(HashMap<StationIdx, Vec<StationIdx>>);

impl TransferMap {
    /// Self-transfers are dropped.
    pub fn insert(&mut self, from: StationIdx, to: StationIdx) {
        if from != to {
            self.0.entry(from).or_default().push(to);
        }
    }

    /// Stations reachable from `station` by transfer; empty when it has none.
    pub fn from_station(&self, station: StationIdx) -> &[StationIdx] {
        self.0.get(&station).map(Vec::as_slice).unwrap_or_default()
    }

    /// Transfer targets of `station` followed by `station` itself.
    pub fn with_station(&self, station: StationIdx) -> impl Iterator<Item = StationIdx> + '_ {
        self.from_station(station)
            .iter()
            .copied()
            .chain(std::iter::once(station))
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The transit graph of one service pattern.
#[derive(Debug)]
pub struct Network {
    stations: Vec<Station>,
    station_ids: HashMap<String, StationIdx>,
    routes: Vec<Route>,
    routes_by_station: Vec<Vec<RouteIdx>>,
    transfers: TransferMap,
}

impl Network {
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, station: StationIdx) -> &Station {
        &self.stations[station]
    }

    pub fn station_idx(&self, id: &str) -> Option<StationIdx> {
        self.station_ids.get(id).copied()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, route: RouteIdx) -> &Route {
        &self.routes[route]
    }

    /// Routes calling at `station`, in the order the pattern lists them.
    pub fn routes_serving(&self, station: StationIdx) -> &[RouteIdx] {
        &self.routes_by_station[station]
    }

    pub fn transfers(&self) -> &TransferMap {
        &self.transfers
    }

    /// Great-circle distance in miles.
    pub fn miles(&self, from: StationIdx, to: StationIdx) -> f64 {
        let meters = Haversine.distance(self.stations[from].location, self.stations[to].location);
        meters / MEAN_EARTH_RADIUS_METERS * EARTH_RADIUS_MILES
    }
}

impl TryFrom<gtfs::Feed> for Network {
    type Error = GeneratorError;

    fn try_from(feed: gtfs::Feed) -> Result<Self, Self::Error> {
        let mut stations = Vec::with_capacity(feed.stations.len());
        let mut station_ids = HashMap::with_capacity(feed.stations.len());

        for record in feed.stations {
            let valid = (-90.0..=90.0).contains(&record.latitude)
                && (-180.0..=180.0).contains(&record.longitude);
            if !valid {
                return Err(GeneratorError::InvalidCoordinates {
                    stop_id: record.stop_id,
                    latitude: record.latitude,
                    longitude: record.longitude,
                });
            }
            if station_ids.contains_key(&record.stop_id) {
                return Err(GeneratorError::DuplicateStation(record.stop_id));
            }

            station_ids.insert(record.stop_id.clone(), stations.len());
            stations.push(Station {
                id: record.stop_id,
                location: Point::new(record.longitude, record.latitude),
                borough: record.borough.filter(|borough| !borough.trim().is_empty()),
            });
        }

        let mut routes = Vec::with_capacity(feed.routes.len());
        let mut routes_by_station: Vec<Vec<RouteIdx>> = vec![Vec::new(); stations.len()];

        for record in feed.routes {
            if record.stop_ids.is_empty() {
                return Err(GeneratorError::EmptyRoute(record.route_id));
            }

            let route_idx = routes.len();
            let sequence = record
                .stop_ids
                .iter()
                .map(|stop_id| {
                    station_ids
                        .get(stop_id)
                        .copied()
                        .ok_or_else(|| GeneratorError::NoStationOnRoute {
                            stop_id: stop_id.to_owned(),
                            route_id: record.route_id.to_owned(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            for &station in &sequence {
                let serving = &mut routes_by_station[station];
                if !serving.contains(&route_idx) {
                    serving.push(route_idx);
                }
            }

            log::debug!(
                "Route {} calls at {} stations",
                record.route_id,
                sequence.len()
            );
            routes.push(Route::new(record.route_id, sequence));
        }

        let mut transfers = TransferMap::default();
        for record in feed.transfers {
            match (
                station_ids.get(&record.from_stop_id),
                station_ids.get(&record.to_stop_id),
            ) {
                (Some(&from), Some(&to)) => transfers.insert(from, to),
                _ => log::warn!(
                    "Skipping transfer {} -> {}: unknown station",
                    record.from_stop_id,
                    record.to_stop_id
                ),
            }
        }

        Ok(Self {
            stations,
            station_ids,
            routes,
            routes_by_station,
            transfers,
        })
    }
}
