// Litter Gauge - Calibration Routine
//
// Bring-up diagnostic: log the four sensor reads, apply the known scale
// factor and tare against whatever sits on the scale, then log the same reads
// again. Nothing is returned; the log is the result.

use crate::config::{CAL_AVERAGE_SAMPLES, CAL_VALUE_SAMPLES, TARE_SAMPLES};
use crate::scale::ScaleSensor;

fn log_reads<S: ScaleSensor>(sensor: &mut S) {
    match sensor.read_raw() {
        Ok(v) => log::info!("read: \t\t{}", v),
        Err(e) => log::warn!("read failed: {}", e),
    }
    match sensor.read_average(CAL_AVERAGE_SAMPLES) {
        Ok(v) => log::info!("read average: \t\t{:.2}", v),
        Err(e) => log::warn!("read average failed: {}", e),
    }
    match sensor.read_tared_average(CAL_VALUE_SAMPLES) {
        Ok(v) => log::info!("get value: \t\t{:.2}", v),
        Err(e) => log::warn!("get value failed: {}", e),
    }
    match sensor.read_units(CAL_VALUE_SAMPLES) {
        Ok(v) => log::info!("get units: \t\t{:.2}", v),
        Err(e) => log::warn!("get units failed: {}", e),
    }
}

pub fn run_calibration<S: ScaleSensor>(sensor: &mut S, scale_factor: f32) {
    log::info!("calibration");

    log::info!("Before setting up the scale:");
    log_reads(sensor);

    sensor.set_scale(scale_factor);
    if let Err(e) = sensor.tare(TARE_SAMPLES) {
        log::warn!("tare failed, keeping offset {}: {}", sensor.calibration().tare_offset, e);
    }

    log::info!("After setting up the scale:");
    log_reads(sensor);
}
