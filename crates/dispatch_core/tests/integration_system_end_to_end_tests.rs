mod support;

use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::hospital::HospitalId;
use dispatch_core::patient::PatientId;
use dispatch_core::report::write_report;
use dispatch_core::runner::StopReason;
use dispatch_core::scenario::{generate_input, DispatchConfig, GeneratorParams};
use dispatch_core::telemetry::{CancellationStage, ForwardRecord};
use support::scenarios::{mixed_day, single_normal_trip};
use support::stepper::{run_to_end, TickStepper};

#[test]
fn single_normal_trip_follows_the_documented_timeline() {
    let (stepper, outcome) = run_to_end(&single_normal_trip(), DispatchConfig::default());
    assert_eq!(outcome.final_tick, 5);
    assert_eq!(outcome.stop, StopReason::Settled);

    let patient = stepper.dispatcher.patient(PatientId(1)).expect("patient");
    assert!(patient.is_served());
    assert_eq!(patient.pickup_tick(), Some(3));
    assert_eq!(patient.finish_tick(), Some(5));
    assert_eq!(patient.waiting_time(), Some(2));

    let assigned_at_first_tick = &stepper.snapshots[0].hospitals[0];
    assert_eq!(assigned_at_first_tick.outgoing.len(), 1);
    assert_eq!(assigned_at_first_tick.outgoing[0].remaining_distance, 10);
}

#[test]
fn single_normal_trip_report_text() {
    let mut dispatcher =
        Dispatcher::new(&single_normal_trip(), DispatchConfig::default()).expect("build");
    dispatcher.run().expect("run");

    let mut buffer = Vec::new();
    write_report(
        &dispatcher.summary(),
        &dispatcher.telemetry().finished,
        &mut buffer,
    )
    .expect("report");
    assert_eq!(
        String::from_utf8(buffer).expect("utf8"),
        "FT 5 PID 1 QT 1 WT 2\n\
         Patients: 1 [NP: 1, SP: 0, EP: 0]\n\
         Hospitals: 1\n\
         Cars: 2 [SCar: 1, NCar: 1]\n\
         Avg wait time = 2\n\
         EP not served by home hospital: 0.0%\n\
         Avg busy time = 2\n\
         Avg utilization = 40%\n"
    );
}

#[test]
fn mixed_day_resolves_every_patient() {
    let (stepper, outcome) = run_to_end(&mixed_day(), DispatchConfig::default());
    assert_eq!(outcome.stop, StopReason::Settled);

    let dispatcher = &stepper.dispatcher;
    let summary = dispatcher.summary();
    assert_eq!(summary.served_patients, 7);
    assert_eq!(summary.cancelled_patients, 3);
    assert_eq!(summary.requests.emergency, 4);
    assert_eq!(summary.emergency_forwarded, 1);
    assert_eq!(summary.emergency_not_served_locally_pct, 25.0);

    let telemetry = dispatcher.telemetry();
    assert_eq!(
        telemetry.forwards,
        vec![ForwardRecord {
            pid: PatientId(5),
            from: HospitalId(1),
            to: HospitalId(2),
            tick: 2,
        }]
    );
    let stages: Vec<(PatientId, CancellationStage)> = telemetry
        .cancellations
        .iter()
        .map(|record| (record.pid, record.stage))
        .collect();
    assert_eq!(
        stages,
        vec![
            (PatientId(9), CancellationStage::NotYetAdmitted),
            (PatientId(7), CancellationStage::Assigned),
            (PatientId(6), CancellationStage::Assigned),
        ]
    );
    assert!(telemetry.ignored_cancellations.is_empty());
}

#[test]
fn fleet_size_is_conserved_every_tick() {
    let params = GeneratorParams::default()
        .with_seed(11)
        .with_hospitals(4)
        .with_requests(120, 40)
        .with_cancellation_share(0.15);
    for input in [mixed_day(), generate_input(&params)] {
        let (stepper, _) = run_to_end(&input, DispatchConfig::default());
        for snapshot in &stepper.snapshots {
            for hospital in &snapshot.hospitals {
                let fleet = stepper
                    .dispatcher
                    .hospital(hospital.id)
                    .expect("hospital")
                    .fleet_size();
                let accounted = hospital.ready_standard
                    + hospital.ready_restricted
                    + hospital.outgoing.len()
                    + hospital.returning.len();
                assert_eq!(
                    accounted, fleet,
                    "hospital {} at tick {}",
                    hospital.id, snapshot.tick
                );
            }
        }
    }
}

#[test]
fn served_patients_keep_timestamp_order_and_never_cancel() {
    for seed in 0..5 {
        let params = GeneratorParams::default()
            .with_seed(seed)
            .with_requests(80, 30)
            .with_cancellation_share(0.2);
        let (stepper, _) = run_to_end(&generate_input(&params), DispatchConfig::default());
        let dispatcher = &stepper.dispatcher;

        for patient in dispatcher.view().patients().iter() {
            assert!(!(patient.is_served() && patient.is_cancelled()));
            if patient.is_served() {
                let pickup = patient.pickup_tick().expect("pickup");
                let finish = patient.finish_tick().expect("finish");
                assert!(patient.request_tick <= pickup, "seed {seed}");
                assert!(pickup <= finish, "seed {seed}");
            }
        }
        for record in &dispatcher.telemetry().finished {
            let patient = dispatcher.patient(record.pid).expect("patient");
            assert!(patient.is_served());
        }
    }
}

#[test]
fn generated_runs_always_terminate_within_the_horizon() {
    for seed in 0..5 {
        let input = generate_input(
            &GeneratorParams::default()
                .with_seed(seed)
                .with_hospitals(3)
                .with_max_vehicles_per_class(1)
                .with_requests(100, 20),
        );
        let last_event = input
            .requests
            .iter()
            .map(|request| request.request_tick)
            .chain(input.cancellations.iter().map(|c| c.tick))
            .max()
            .unwrap_or(1);
        let mut stepper = TickStepper::new(&input, DispatchConfig::default().with_horizon_margin(500));
        let outcome = stepper.finish();
        assert!(outcome.final_tick <= last_event + 500, "seed {seed}");
    }
}
