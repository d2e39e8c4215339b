// Litter Gauge
//
// Weighs a litter container on an HX711 load cell and shows the fill level
// as a ring gauge on a 200x200 e-paper panel. Everything here is hardware
// independent; the ESP32 drivers live in the binary (`--features embedded`).

pub mod activity;
pub mod calibration;
pub mod config;
pub mod device;
pub mod events;
pub mod gauge;
pub mod input;
pub mod panel;
pub mod power;
pub mod scale;
pub mod status;
pub mod units;

/// Test doubles for every hardware seam.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
