// Litter Gauge - Hardware & System Configuration
// Target: M5Stack CoreInk (ESP32-PICO-D4, 200x200 e-paper)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (CoreInk pinout)
// ---------------------------------------------------------------------------
pub const PIN_WAKE_BUTTON: i32 = 38;    // Dial press (INPUT_PULLUP, active LOW) - wake source
pub const PIN_CAL_BUTTON: i32 = 5;      // EXT button - manual calibration
pub const PIN_BUZZER: i32 = 2;          // Passive buzzer
pub const PIN_BATTERY_ADC: i32 = 35;    // Battery voltage through 1:2 divider (ADC1_CH7)
pub const PIN_HX711_DATA: i32 = 33;     // Port A SCL line, wired to HX711 DOUT
pub const PIN_HX711_CLOCK: i32 = 32;    // Port A SDA line, wired to HX711 PD_SCK
pub const PIN_POWER_HOLD: i32 = 12;     // Must stay HIGH or the board cuts its own supply on battery
pub const PIN_EPD_BUSY: i32 = 4;
pub const PIN_EPD_RST: i32 = 0;
pub const PIN_EPD_DC: i32 = 15;
pub const PIN_EPD_CS: i32 = 9;
pub const PIN_EPD_SCK: i32 = 18;
pub const PIN_EPD_MOSI: i32 = 23;

// ---------------------------------------------------------------------------
// Display (200x200 monochrome e-paper)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 200;
pub const SCREEN_HEIGHT: u32 = 200;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 5000
pub const EPD_SPI_BAUDRATE_HZ: u32 = 10_000_000;
pub const EPD_BUSY_TIMEOUT_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const TICK_INTERVAL_MS: u64 = 100;
pub const AWAKE_WINDOW_MS: u64 = 5_000;     // countdown before light sleep
pub const DEBOUNCE_MS: u64 = 50;
pub const HOLD_MS: u64 = 1_000;             // press longer than this is a hold
pub const CLICK_WINDOW_MS: u64 = 300;       // a second press inside this cancels the single click
pub const WAKE_TIMER_MS: Option<u64> = None; // optional timer wake in addition to the button

// ---------------------------------------------------------------------------
// Load cell (HX711) and calibration
// ---------------------------------------------------------------------------
pub const HX711_READY_TIMEOUT_MS: u64 = 200;
pub const MEASURE_SAMPLES: usize = 10;
pub const CAL_AVERAGE_SAMPLES: usize = 20;
pub const CAL_VALUE_SAMPLES: usize = 5;
pub const TARE_SAMPLES: usize = 10;
pub const SCALE_FACTOR: f32 = 27.61;        // ADC counts per gram, found with known weights
pub const CALIBRATE_ON_BOOT: bool = false;

// ---------------------------------------------------------------------------
// Volume conversion
// ---------------------------------------------------------------------------
pub const DENSITY_LITRES_PER_KG: f32 = 0.78;
pub const MAX_CAPACITY_LITRES: f32 = 18.0;
/// Substituted when the load cell cannot be read: exactly a full container.
pub const FALLBACK_WEIGHT_KG: f32 = MAX_CAPACITY_LITRES / DENSITY_LITRES_PER_KG;

// ---------------------------------------------------------------------------
// Gauge layout
// ---------------------------------------------------------------------------
pub const GAUGE_RING_WIDTH: u32 = 30;
pub const GAUGE_VERTICAL_MARGIN: u32 = 30; // gauge band = screen height minus this
pub const HEADER_TITLE: &str = "Litter Monitor";

// ---------------------------------------------------------------------------
// Battery (LiPo behind a 1:2 divider)
// ---------------------------------------------------------------------------
pub const BATTERY_EMPTY_MV: u32 = 3_300;
pub const BATTERY_FULL_MV: u32 = 4_200;

// ---------------------------------------------------------------------------
// Wake confirmation tones (Hz, ms)
// ---------------------------------------------------------------------------
pub const WAKE_TONES: [(u32, u32); 2] = [(2_000, 100), (1_000, 100)];

/// Values the control loop reads at run time. Defaults come from the
/// constants above; tests inject their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceConfig {
    pub awake_window_ms: u64,
    pub wake_pin: i32,
    pub wake_timer_ms: Option<u64>,
    pub scale_factor: f32,
    pub calibrate_on_boot: bool,
    pub density: f32,
    pub max_capacity: f32,
    pub ring_width: u32,
    pub title: &'static str,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            awake_window_ms: AWAKE_WINDOW_MS,
            wake_pin: PIN_WAKE_BUTTON,
            wake_timer_ms: WAKE_TIMER_MS,
            scale_factor: SCALE_FACTOR,
            calibrate_on_boot: CALIBRATE_ON_BOOT,
            density: DENSITY_LITRES_PER_KG,
            max_capacity: MAX_CAPACITY_LITRES,
            ring_width: GAUGE_RING_WIDTH,
            title: HEADER_TITLE,
        }
    }
}
