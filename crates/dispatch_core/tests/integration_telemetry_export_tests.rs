mod support;

use dispatch_core::report::{write_report_file, SimulationSummary};
use dispatch_core::scenario::DispatchConfig;
use dispatch_core::telemetry_export::{
    write_cancellations_csv, write_finished_csv, write_summary_json,
};
use support::scenarios::mixed_day;
use support::stepper::run_to_end;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn report_file_lists_every_served_patient_by_finish_tick() {
    let (stepper, _) = run_to_end(&mixed_day(), DispatchConfig::default());
    let file = NamedTempFile::new().expect("temp file");
    let dispatcher = &stepper.dispatcher;
    write_report_file(
        file.path(),
        &dispatcher.summary(),
        &dispatcher.telemetry().finished,
    )
    .expect("report");

    let contents = std::fs::read_to_string(file.path()).expect("read");
    let finish_ticks: Vec<u64> = contents
        .lines()
        .filter_map(|line| line.strip_prefix("FT "))
        .map(|rest| {
            rest.split_whitespace()
                .next()
                .and_then(|tick| tick.parse().ok())
                .expect("finish tick")
        })
        .collect();
    assert_eq!(finish_ticks.len(), 7);
    assert!(finish_ticks.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(contents.contains("Patients: 7 [NP: 3, SP: 3, EP: 4]\n"));
    assert!(contents.contains("Hospitals: 2\n"));
    assert!(contents.contains("Cars: 6 [SCar: 3, NCar: 3]\n"));
    assert!(contents.contains("EP not served by home hospital: 25.0%\n"));
}

#[test]
fn summary_json_decodes_back() {
    let (stepper, _) = run_to_end(&mixed_day(), DispatchConfig::default());
    let summary = stepper.dispatcher.summary();
    let file = NamedTempFile::new().expect("temp file");
    write_summary_json(file.path(), &summary).expect("json");

    let contents = std::fs::read_to_string(file.path()).expect("read");
    assert!(contents.contains("average_wait_time"));
    let decoded: SimulationSummary = serde_json::from_str(&contents).expect("decode");
    assert_eq!(decoded.served_patients, summary.served_patients);
    assert_eq!(decoded.requests, summary.requests);
    assert_eq!(decoded.vehicles, summary.vehicles);
    assert!((decoded.average_wait_time - summary.average_wait_time).abs() < 1e-9);
    assert!((decoded.average_utilization_pct - summary.average_utilization_pct).abs() < 1e-9);
}

#[test]
fn csv_exports_have_a_header_and_one_row_per_record() {
    let (stepper, _) = run_to_end(&mixed_day(), DispatchConfig::default());
    let telemetry = stepper.dispatcher.telemetry();
    let dir = tempdir().expect("temp dir");

    let finished_path = dir.path().join("finished.csv");
    write_finished_csv(&finished_path, &telemetry.finished).expect("finished csv");
    let finished = std::fs::read_to_string(&finished_path).expect("read");
    let mut lines = finished.lines();
    assert_eq!(
        lines.next(),
        Some("pid,priority,hospital,vehicle,request_tick,pickup_tick,finish_tick,waiting_time,ride_time")
    );
    assert_eq!(lines.count(), telemetry.finished.len());

    let cancellations_path = dir.path().join("cancellations.csv");
    write_cancellations_csv(&cancellations_path, &telemetry.cancellations)
        .expect("cancellations csv");
    let cancellations = std::fs::read_to_string(&cancellations_path).expect("read");
    assert_eq!(
        cancellations.lines().collect::<Vec<_>>(),
        vec!["pid,tick,stage", "9,2,not_yet_admitted", "7,4,assigned", "6,5,assigned"]
    );
}

#[test]
fn unwritable_report_path_is_an_error() {
    let dir = tempdir().expect("temp dir");
    let (stepper, _) = run_to_end(&mixed_day(), DispatchConfig::default());
    let missing_parent = dir.path().join("absent").join("report.txt");
    assert!(write_report_file(
        missing_parent,
        &stepper.dispatcher.summary(),
        &stepper.dispatcher.telemetry().finished,
    )
    .is_err());
}
