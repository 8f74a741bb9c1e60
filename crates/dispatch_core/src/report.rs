//! End-of-run statistics and the flat text report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::error::ReportError;
use crate::hospital::HospitalNetwork;
use crate::patient::{PatientRegistry, PriorityClass};
use crate::telemetry::{DispatchTelemetry, FinishedPatientRecord};
use crate::vehicle::VehicleClass;

/// Loaded requests per priority class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub normal: usize,
    pub serious: usize,
    pub emergency: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCounts {
    pub standard: usize,
    pub restricted: usize,
}

impl FleetCounts {
    pub fn total(&self) -> usize {
        self.standard + self.restricted
    }
}

/// Aggregate statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Ticks elapsed, i.e. the last tick processed.
    pub total_ticks: Tick,
    pub served_patients: usize,
    pub cancelled_patients: usize,
    pub requests: PriorityCounts,
    pub hospitals: usize,
    pub vehicles: FleetCounts,
    /// Mean of `pickup - request` over served patients.
    pub average_wait_time: f64,
    pub emergency_forwarded: u64,
    /// Forwarded emergencies as a percentage of all emergency requests.
    pub emergency_not_served_locally_pct: f64,
    /// Mean accumulated busy ticks per vehicle.
    pub average_busy_time: f64,
    /// Average busy time as a percentage of elapsed ticks.
    pub average_utilization_pct: f64,
    pub forwards: usize,
    pub ignored_cancellations: usize,
}

impl SimulationSummary {
    pub fn compute(
        total_ticks: Tick,
        registry: &PatientRegistry,
        network: &HospitalNetwork,
        telemetry: &DispatchTelemetry,
    ) -> Self {
        let waits: Vec<u64> = registry
            .served()
            .filter_map(|patient| patient.waiting_time())
            .collect();
        let average_wait_time = mean(waits.iter().sum::<u64>(), waits.len());

        let requests = PriorityCounts {
            normal: registry.count_by_priority(PriorityClass::Normal),
            serious: registry.count_by_priority(PriorityClass::Serious),
            emergency: registry.count_by_priority(PriorityClass::Emergency),
        };
        let emergency_forwarded = network.total_emergency_forwarded();
        let emergency_not_served_locally_pct =
            mean(emergency_forwarded, requests.emergency) * 100.0;

        let vehicles = FleetCounts {
            standard: network.vehicle_count(VehicleClass::Standard),
            restricted: network.vehicle_count(VehicleClass::Restricted),
        };
        let busy: u64 = network.vehicles().map(|v| v.total_busy_ticks()).sum();
        let average_busy_time = mean(busy, vehicles.total());
        let average_utilization_pct = if total_ticks > 0 {
            average_busy_time / total_ticks as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_ticks,
            served_patients: waits.len(),
            cancelled_patients: registry.iter().filter(|p| p.is_cancelled()).count(),
            requests,
            hospitals: network.len(),
            vehicles,
            average_wait_time,
            emergency_forwarded,
            emergency_not_served_locally_pct,
            average_busy_time,
            average_utilization_pct,
            forwards: telemetry.forwards.len(),
            ignored_cancellations: telemetry.ignored_cancellations.len(),
        }
    }
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Writes the text report: one `FT` line per served patient ordered by finish
/// tick (completion order within a tick), followed by the summary block.
pub fn write_report<W: Write>(
    summary: &SimulationSummary,
    records: &[FinishedPatientRecord],
    mut out: W,
) -> Result<(), ReportError> {
    let mut ordered: Vec<&FinishedPatientRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.finish_tick);
    for record in ordered {
        writeln!(
            out,
            "FT {} PID {} QT {} WT {}",
            record.finish_tick,
            record.pid,
            record.request_tick,
            record.waiting_time()
        )?;
    }

    writeln!(
        out,
        "Patients: {} [NP: {}, SP: {}, EP: {}]",
        summary.served_patients,
        summary.requests.normal,
        summary.requests.serious,
        summary.requests.emergency
    )?;
    writeln!(out, "Hospitals: {}", summary.hospitals)?;
    writeln!(
        out,
        "Cars: {} [SCar: {}, NCar: {}]",
        summary.vehicles.total(),
        summary.vehicles.standard,
        summary.vehicles.restricted
    )?;
    writeln!(out, "Avg wait time = {:.0}", summary.average_wait_time)?;
    writeln!(
        out,
        "EP not served by home hospital: {:.1}%",
        summary.emergency_not_served_locally_pct
    )?;
    writeln!(out, "Avg busy time = {:.0}", summary.average_busy_time)?;
    writeln!(out, "Avg utilization = {:.0}%", summary.average_utilization_pct)?;
    out.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes the report into it.
pub fn write_report_file<P: AsRef<Path>>(
    path: P,
    summary: &SimulationSummary,
    records: &[FinishedPatientRecord],
) -> Result<(), ReportError> {
    let file = File::create(path)?;
    write_report(summary, records, BufWriter::new(file))
}
