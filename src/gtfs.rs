//! Raw rows of the tabular inputs, before they are resolved into a [`Network`](crate::data::Network).

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize};

use crate::error::GeneratorError;

/// One row of `common/Stations.csv`. Columns other than these four are ignored.
#[derive(Deserialize, Debug, Clone)]
pub struct Station {
    #[serde(rename = "GTFS Stop ID")]
    pub stop_id: String,
    #[serde(rename = "GTFS Latitude")]
    pub latitude: f64,
    #[serde(rename = "GTFS Longitude")]
    pub longitude: f64,
    #[serde(rename = "Borough", default)]
    pub borough: Option<String>,
}

/// One row of `common/transfers.txt`.
#[derive(Deserialize, Debug, Clone)]
pub struct Transfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
}

/// The ordered stop ids of `<pattern>/stops/<route>.csv`.
#[derive(Debug, Clone)]
pub struct RouteStops {
    pub route_id: String,
    pub stop_ids: Vec<String>,
}

#[derive(Debug)]
pub struct Feed {
    pub stations: Vec<Station>,
    pub routes: Vec<RouteStops>,
    pub transfers: Vec<Transfer>,
}

impl Feed {
    /// Reads the common station and transfer tables plus one file per route of `pattern`.
    pub fn load<S: AsRef<str>>(
        data_dir: &Path,
        pattern: &str,
        route_ids: &[S],
    ) -> Result<Self, GeneratorError> {
        let common = data_dir.join("common");

        log::debug!("Processing stations");
        let stations = deserialize_into(&common.join("Stations.csv"))?;

        log::debug!("Processing transfers");
        let transfers = deserialize_into(&common.join("transfers.txt"))?;

        let routes = route_ids
            .iter()
            .map(|route_id| {
                let route_id = route_id.as_ref();
                let path = data_dir
                    .join(pattern)
                    .join("stops")
                    .join(format!("{route_id}.csv"));
                log::debug!("Processing route {route_id} from {path:?}");
                let file = File::open(&path).map_err(|source| GeneratorError::ReadTable {
                    path: path.clone(),
                    source: source.into(),
                })?;
                read_route_stops(route_id, file)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            stations,
            routes,
            transfers,
        })
    }
}

fn deserialize_into<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, GeneratorError> {
    let to_error = |source: csv::Error| GeneratorError::ReadTable {
        path: PathBuf::from(path),
        source,
    };
    let file = File::open(path).map_err(|source| to_error(source.into()))?;
    read_table(file).map_err(to_error)
}

/// Deserializes every row of a headed table, failing on the first malformed row.
pub fn read_table<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

/// Reads a headerless route file, taking the stop id from the first column of each row.
pub fn read_route_stops<R: Read>(route_id: &str, reader: R) -> Result<RouteStops, GeneratorError> {
    let table = format!("route {route_id}");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut stop_ids = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| GeneratorError::MalformedRow {
            table: table.clone(),
            row,
            reason: e.to_string(),
        })?;
        match record.get(0).map(str::trim) {
            Some(stop_id) if !stop_id.is_empty() => stop_ids.push(stop_id.to_owned()),
            _ => {
                return Err(GeneratorError::MalformedRow {
                    table,
                    row,
                    reason: "missing stop id".to_owned(),
                })
            }
        }
    }

    Ok(RouteStops {
        route_id: route_id.to_owned(),
        stop_ids,
    })
}
