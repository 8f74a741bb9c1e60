//! Interactive mode: a per-tick dump of every hospital, paced by Enter.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::patient::PatientId;
use dispatch_core::runner::RunOutcome;
use dispatch_core::telemetry::{HospitalSnapshot, TickSnapshot, VehicleSnapshot};

fn join_ids(ids: &[PatientId]) -> String {
    ids.iter()
        .map(PatientId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn car_tag(vehicle: &VehicleSnapshot) -> String {
    match vehicle.patient {
        Some(pid) => format!("{}_P{}", vehicle.label, pid),
        None => vehicle.label.clone(),
    }
}

pub fn write_hospital<W: Write>(out: &mut W, hospital: &HospitalSnapshot) -> io::Result<()> {
    writeln!(out, "HOSPITAL #{} data", hospital.id)?;
    for (code, queue) in [
        ("EP", &hospital.emergency),
        ("SP", &hospital.serious),
        ("NP", &hospital.normal),
    ] {
        writeln!(out, "{} {} requests: {}", queue.len(), code, join_ids(queue))?;
    }
    writeln!(
        out,
        "Free Cars: {} SCars, {} NCars",
        hospital.ready_standard, hospital.ready_restricted
    )?;
    writeln!(out, "HOSPITAL #{} data end", hospital.id)
}

/// Vehicles on the road across the whole network, then patients finished this tick.
pub fn write_movements<W: Write>(out: &mut W, snapshot: &TickSnapshot) -> io::Result<()> {
    let outgoing: Vec<String> = snapshot
        .hospitals
        .iter()
        .flat_map(|h| h.outgoing.iter().map(car_tag))
        .collect();
    let returning: Vec<String> = snapshot
        .hospitals
        .iter()
        .flat_map(|h| h.returning.iter().map(car_tag))
        .collect();
    writeln!(out, "{} ==> Out cars: {}", outgoing.len(), outgoing.join(", "))?;
    writeln!(out, "{} <== Back cars: {}", returning.len(), returning.join(", "))?;
    if !snapshot.finished.is_empty() {
        writeln!(
            out,
            "{} finished patients: {}",
            snapshot.finished.len(),
            join_ids(&snapshot.finished)
        )?;
    }
    Ok(())
}

/// Blocks until a line is read. End of input just lets the run continue.
fn wait_for_enter<R: BufRead>(input: &mut R) -> io::Result<()> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

pub fn run_interactive<R: BufRead, W: Write>(
    dispatcher: &mut Dispatcher,
    mut input: R,
    out: &mut W,
) -> Result<RunOutcome> {
    loop {
        let outcome = dispatcher.step()?;
        let snapshot = dispatcher.snapshot();
        writeln!(out, "Current Timestep: {}", snapshot.tick)?;
        for hospital in &snapshot.hospitals {
            write_hospital(out, hospital)?;
            writeln!(out, "Press Enter to display next hospital")?;
            out.flush()?;
            wait_for_enter(&mut input)?;
        }
        write_movements(out, &snapshot)?;

        if let Some(outcome) = outcome {
            out.flush()?;
            return Ok(outcome);
        }
        writeln!(out, "Press Enter to continue to next timestep")?;
        out.flush()?;
        wait_for_enter(&mut input)?;
    }
}
