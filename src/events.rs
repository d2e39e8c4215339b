// Litter Gauge - Shared Data Types

// ---------------------------------------------------------------------------
// Measurement (recomputed every tick, never persisted)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasurementSample {
    /// Averaged sensor units divided by 1000 (kilograms once calibrated).
    pub weight_kg: f32,
    /// Weight converted to litres, clamped to the container capacity.
    pub volume_litres: f32,
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub percentage: u8,
}

impl BatteryStatus {
    pub fn new(percentage: u8) -> Self {
        Self {
            percentage: percentage.min(100),
        }
    }
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// EXT button: single click runs the calibration routine.
    Calibrate,
    /// Dial press: the light-sleep wake source; hold and release sleeps now.
    Wake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    SingleClick,
    ReleasedAfterHold,
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Countdown visible, accepting input.
    AwakeActive,
    /// Window elapsed; footer cleared, wake source about to be armed.
    EnteringSleep,
    /// CPU halted until the armed wake source fires.
    Asleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeLevel {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    Pin,
    Timer,
    Other,
}
