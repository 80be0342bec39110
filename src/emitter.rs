use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    data::Network,
    error::GeneratorError,
    scorer::ScoredItinerary,
    selector::Selection,
};

pub const ANSWERS_FILE: &str = "answers.json";
pub const SOLUTIONS_FILE: &str = "solutions.json";

/// A combo's solution as the game reads it.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SolutionRecord {
    pub origin: String,
    pub first_transfer_arrival: String,
    pub first_transfer_departure: String,
    pub second_transfer_arrival: String,
    pub second_transfer_departure: String,
    pub destination: String,
    pub travel_distance_factor: f64,
    pub minimum_distance_between_stations: f64,
    pub minimum_distance_progress_factor: f64,
    /// The routes actually ridden, branch variants kept.
    pub routes: [String; 3],
}

impl SolutionRecord {
    pub fn new(network: &Network, itinerary: &ScoredItinerary) -> Self {
        let id = |station| network.station(station).id.clone();
        Self {
            origin: id(itinerary.origin),
            first_transfer_arrival: id(itinerary.first_transfer_arrival),
            first_transfer_departure: id(itinerary.first_transfer_departure),
            second_transfer_arrival: id(itinerary.second_transfer_arrival),
            second_transfer_departure: id(itinerary.second_transfer_departure),
            destination: id(itinerary.destination),
            travel_distance_factor: itinerary.travel_distance_factor,
            minimum_distance_between_stations: itinerary.minimum_distance_between_stations,
            minimum_distance_progress_factor: itinerary.minimum_distance_progress_factor,
            routes: itinerary
                .routes
                .map(|route| network.route(route).id.clone()),
        }
    }
}

/// Solutions keyed by hyphen-joined combo, in key order.
pub fn solution_records(
    network: &Network,
    selection: &Selection,
) -> BTreeMap<String, SolutionRecord> {
    selection
        .solutions
        .iter()
        .map(|(combo, itinerary)| (combo.key(), SolutionRecord::new(network, itinerary)))
        .collect()
}

pub fn write_answers<W: Write>(writer: W, selection: &Selection) -> Result<(), GeneratorError> {
    let answers: Vec<&[String; 3]> = selection.answers.iter().map(|combo| &combo.0).collect();
    write_pretty(writer, &answers, "answers")
}

pub fn write_solutions<W: Write>(
    writer: W,
    network: &Network,
    selection: &Selection,
) -> Result<(), GeneratorError> {
    write_pretty(writer, &solution_records(network, selection), "solutions")
}

fn write_pretty<W: Write, T: Serialize>(
    mut writer: W,
    value: &T,
    what: &'static str,
) -> Result<(), GeneratorError> {
    let to_error = |source| GeneratorError::Serialize { what, source };
    serde_json::to_writer_pretty(&mut writer, value).map_err(to_error)?;
    writeln!(writer).map_err(|e| to_error(serde_json::Error::io(e)))
}

/// Replaces `answers.json` and `solutions.json` in `directory`, creating it if needed.
pub fn emit(
    directory: &Path,
    network: &Network,
    selection: &Selection,
) -> Result<[PathBuf; 2], GeneratorError> {
    fs::create_dir_all(directory).map_err(|source| GeneratorError::WriteOutput {
        path: directory.to_owned(),
        source,
    })?;

    let answers = directory.join(ANSWERS_FILE);
    write_file(&answers, |writer| write_answers(writer, selection))?;

    let solutions = directory.join(SOLUTIONS_FILE);
    write_file(&solutions, |writer| write_solutions(writer, network, selection))?;

    log::info!(
        "Wrote {} answers to {answers:?} and {} solutions to {solutions:?}",
        selection.answers.len(),
        selection.solutions.len()
    );
    Ok([answers, solutions])
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), GeneratorError>,
) -> Result<(), GeneratorError> {
    let to_error = |source| GeneratorError::WriteOutput {
        path: path.to_owned(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(to_error)?);
    write(&mut writer)?;
    writer.flush().map_err(to_error)
}
