use std::{collections::HashSet, fs, path::Path};

use transfer_puzzles::{
    config::{GeneratorConfig, QualityThresholds, ServicePattern},
    data::Network,
    emitter,
    gtfs::{self, Feed},
    pipeline,
    scorer::ScoredItinerary,
    selector::{RouteCombo, Selector, Shuffler},
};

// Blocks of 0.01 degrees on the equator:
//
//           G
//           |
//       D - E - F
//       |
//   A - B - C
//
// Route 1 runs A B C, route 2 runs B2 D, the A1 and A2 branches leave D3 through E.
// F and G are in another borough.
const STATIONS: &str = "\
Station ID,GTFS Stop ID,Stop Name,Borough,GTFS Latitude,GTFS Longitude
1,A,Alpha,M,0.0,0.0
2,B,Bravo,M,0.0,0.01
3,B2,Bravo,M,0.0,0.01
4,C,Charlie,M,0.0,0.02
5,D,Delta,M,0.01,0.01
6,D3,Delta,M,0.01,0.01
7,E,Echo,M,0.01,0.02
8,F,Foxtrot,Bk,0.01,0.03
9,G,Golf,Bk,0.02,0.02
";

const TRANSFERS: &str = "\
from_stop_id,to_stop_id,transfer_type,min_transfer_time
A,A,2,0
B,B2,2,180
B2,B,2,180
D,D3,2,180
D3,D,2,180
";

const ROUTES: [(&str, &str); 4] = [
    ("1", "A\nB\nC\n"),
    ("2", "B2\nD\n"),
    ("A1", "D3\nE\nF\n"),
    ("A2", "D3\nE\nG\n"),
];

fn feed() -> Feed {
    Feed {
        stations: gtfs::read_table(STATIONS.as_bytes()).unwrap(),
        transfers: gtfs::read_table(TRANSFERS.as_bytes()).unwrap(),
        routes: ROUTES
            .iter()
            .map(|(id, stops)| gtfs::read_route_stops(id, stops.as_bytes()).unwrap())
            .collect(),
    }
}

fn network() -> Network {
    Network::try_from(feed()).unwrap()
}

fn write_data_dir(root: &Path) {
    let common = root.join("common");
    fs::create_dir_all(&common).unwrap();
    fs::write(common.join("Stations.csv"), STATIONS).unwrap();
    fs::write(common.join("transfers.txt"), TRANSFERS).unwrap();

    let stops = root.join("weekday").join("stops");
    fs::create_dir_all(&stops).unwrap();
    for (id, rows) in ROUTES {
        fs::write(stops.join(format!("{id}.csv")), rows).unwrap();
    }
}

fn combo(routes: [&str; 3]) -> RouteCombo {
    RouteCombo(routes.map(String::from))
}

fn named_stops(s: &ScoredItinerary) -> Vec<usize> {
    let mut stops = vec![s.origin, s.first_transfer_arrival];
    if s.first_transfer_departure != s.first_transfer_arrival {
        stops.push(s.first_transfer_departure);
    }
    stops.push(s.second_transfer_arrival);
    if s.second_transfer_departure != s.second_transfer_arrival {
        stops.push(s.second_transfer_departure);
    }
    stops.push(s.destination);
    stops
}

#[test]
fn answers_are_unique_and_within_thresholds() {
    let network = network();
    let thresholds = QualityThresholds::default();
    let (selection, report) = pipeline::generate(&network, &thresholds, None, &mut Shuffler::seeded(11));

    assert!(report.candidates > 0);
    assert!(!selection.answers.is_empty());

    let unique: HashSet<_> = selection.answers.iter().collect();
    assert_eq!(unique.len(), selection.answers.len());

    let selector = Selector::new(&network, &thresholds);
    for answer in &selection.answers {
        let solution = &selection.solutions[answer];
        assert!(solution.travel_distance_factor < selector.max_factor(solution));
        assert!(solution.minimum_distance_progress_factor >= -0.025);
    }
}

#[test]
fn solutions_are_well_formed() {
    let network = network();
    let thresholds = QualityThresholds::default();
    let (selection, _) = pipeline::generate(&network, &thresholds, None, &mut Shuffler::Disabled);

    for (combo, solution) in &selection.solutions {
        let stops = named_stops(solution);
        let distinct: HashSet<_> = stops.iter().collect();
        assert_eq!(distinct.len(), stops.len(), "{combo} repeats a station");

        let progress = solution.minimum_distance_progress_factor;
        assert!(progress.is_finite(), "{combo}");
        assert!(progress <= 1.0 + 1e-9, "{combo}: {progress}");
        assert!(solution.travel_distance_factor.is_finite(), "{combo}");
    }
}

#[test]
fn best_solution_is_picked_for_a_branching_combo() {
    let network = network();
    let thresholds = QualityThresholds::default();
    let (selection, _) = pipeline::generate(&network, &thresholds, None, &mut Shuffler::Disabled);

    // A rides to G: 2 + sqrt(2) blocks over a 2 * sqrt(2) block gap, across boroughs
    let key = combo(["1", "2", "A"]);
    let solution = &selection.solutions[&key];
    assert_eq!(network.station(solution.origin).id, "A");
    assert_eq!(network.station(solution.destination).id, "G");
    let expected = (2.0 + 2f64.sqrt()) / (2.0 * 2f64.sqrt());
    assert!((solution.travel_distance_factor - expected).abs() < 1e-3);
    assert!(selection.answers.contains(&key));

    let routes = solution.routes.map(|route| network.route(route).id.as_str());
    assert_eq!(routes, ["1", "2", "A2"]);
}

#[test]
fn unshuffled_runs_are_identical() {
    let network = network();
    let thresholds = QualityThresholds::default();
    let (first, _) = pipeline::generate(&network, &thresholds, None, &mut Shuffler::Disabled);
    let (second, _) = pipeline::generate(&network, &thresholds, None, &mut Shuffler::Disabled);

    assert_eq!(first.solutions, second.solutions);
    assert_eq!(first.answers, second.answers);
    assert_eq!(
        emitter::solution_records(&network, &first),
        emitter::solution_records(&network, &second)
    );
}

#[test]
fn run_pattern_writes_game_files() {
    let root = tempfile::tempdir().unwrap();
    let data_dir = root.path().join("data");
    let output_dir = root.path().join("out");
    write_data_dir(&data_dir);

    let config = GeneratorConfig {
        patterns: vec![ServicePattern {
            name: "weekday".to_owned(),
            routes: ROUTES.iter().map(|(id, _)| id.to_string()).collect(),
        }],
        ..GeneratorConfig::default()
    };
    let report = pipeline::run_pattern(
        &data_dir,
        &output_dir,
        &config.patterns[0],
        &config,
        &mut Shuffler::Disabled,
    )
    .unwrap();

    assert_eq!(report.pattern, "weekday");
    assert_eq!(report.stations, 9);
    assert_eq!(report.routes, 4);

    let answers: Vec<[String; 3]> =
        serde_json::from_str(&fs::read_to_string(output_dir.join("weekday/answers.json")).unwrap())
            .unwrap();
    assert_eq!(answers.len(), report.answers);
    assert!(answers.contains(&["1", "2", "A"].map(String::from)));

    let solutions: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.join("weekday/solutions.json")).unwrap(),
    )
    .unwrap();
    let solution = &solutions["1-2-A"];
    assert_eq!(solution["origin"], "A");
    assert_eq!(solution["first_transfer_arrival"], "B");
    assert_eq!(solution["first_transfer_departure"], "B2");
    assert_eq!(solution["second_transfer_arrival"], "D");
    assert_eq!(solution["second_transfer_departure"], "D3");
    assert_eq!(solution["destination"], "G");
    assert_eq!(solution["routes"], serde_json::json!(["1", "2", "A2"]));
    assert_eq!(solutions.as_object().unwrap().len(), report.combos);
}

#[test]
fn missing_route_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_data_dir(root);

    let pattern = ServicePattern {
        name: "weekday".to_owned(),
        routes: vec!["1".to_owned(), "Z".to_owned()],
    };
    let result = pipeline::run_pattern(
        root,
        &root.join("out"),
        &pattern,
        &GeneratorConfig::default(),
        &mut Shuffler::Disabled,
    );
    assert!(result.is_err());
    assert!(!root.join("out").exists());
}
