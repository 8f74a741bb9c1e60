use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::ReportError;
use crate::report::SimulationSummary;
use crate::telemetry::{CancellationRecord, CancellationStage, FinishedPatientRecord};

/// Writes the run summary as pretty-printed JSON.
pub fn write_summary_json<P: AsRef<Path>>(
    path: P,
    summary: &SimulationSummary,
) -> Result<(), ReportError> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

/// One CSV row per served patient, in completion order.
pub fn write_finished_csv<P: AsRef<Path>>(
    path: P,
    records: &[FinishedPatientRecord],
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "pid",
        "priority",
        "hospital",
        "vehicle",
        "request_tick",
        "pickup_tick",
        "finish_tick",
        "waiting_time",
        "ride_time",
    ])?;
    for record in records {
        wtr.write_record([
            record.pid.to_string(),
            record.priority.code().to_string(),
            record.hospital.to_string(),
            record.vehicle.to_string(),
            record.request_tick.to_string(),
            record.pickup_tick.to_string(),
            record.finish_tick.to_string(),
            record.waiting_time().to_string(),
            record.ride_time().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn stage_name(stage: CancellationStage) -> &'static str {
    match stage {
        CancellationStage::NotYetAdmitted => "not_yet_admitted",
        CancellationStage::Queued => "queued",
        CancellationStage::Assigned => "assigned",
        CancellationStage::Loaded => "loaded",
    }
}

/// One CSV row per applied cancellation.
pub fn write_cancellations_csv<P: AsRef<Path>>(
    path: P,
    records: &[CancellationRecord],
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["pid", "tick", "stage"])?;
    for record in records {
        wtr.write_record([
            record.pid.to_string(),
            record.tick.to_string(),
            stage_name(record.stage).to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
