// Litter Gauge - Load Cell Interface
//
// `RawAdc` is the 24-bit converter (bit-banged HX711 on the device).
// `Hx711Scale` layers averaging, tare offset and scale factor on top of it and
// exposes the sensor contract used by measurement and calibration.
// `LoadCell` is what the control loop reads every tick.

use anyhow::bail;

use crate::config::{FALLBACK_WEIGHT_KG, MEASURE_SAMPLES};

/// A raw load-cell converter.
pub trait RawAdc {
    /// One signed conversion result.
    fn read_raw(&mut self) -> anyhow::Result<i32>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParameters {
    /// ADC counts per gram.
    pub scale_factor: f32,
    pub tare_offset: i32,
}

impl Default for CalibrationParameters {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            tare_offset: 0,
        }
    }
}

/// Sensor driver contract shared by the real HX711 and the sensor-absent
/// stand-in.
pub trait ScaleSensor {
    fn read_raw(&mut self) -> anyhow::Result<i32>;

    /// Mean of `samples` raw readings.
    fn read_average(&mut self, samples: usize) -> anyhow::Result<f32>;

    /// Mean minus the tare offset.
    fn read_tared_average(&mut self, samples: usize) -> anyhow::Result<f32>;

    /// Tared mean divided by the scale factor.
    fn read_units(&mut self, samples: usize) -> anyhow::Result<f32>;

    fn set_scale(&mut self, scale_factor: f32);

    /// Replace the tare offset with the current average. Running it twice in
    /// a row re-zeroes against the present load; offsets never accumulate.
    fn tare(&mut self, samples: usize) -> anyhow::Result<()>;

    fn calibration(&self) -> CalibrationParameters;
}

// ---------------------------------------------------------------------------
// HX711-backed scale
// ---------------------------------------------------------------------------
pub struct Hx711Scale<A> {
    adc: A,
    params: CalibrationParameters,
}

impl<A: RawAdc> Hx711Scale<A> {
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            params: CalibrationParameters::default(),
        }
    }

    pub fn with_calibration(adc: A, params: CalibrationParameters) -> Self {
        Self { adc, params }
    }
}

impl<A: RawAdc> ScaleSensor for Hx711Scale<A> {
    fn read_raw(&mut self) -> anyhow::Result<i32> {
        self.adc.read_raw()
    }

    fn read_average(&mut self, samples: usize) -> anyhow::Result<f32> {
        let samples = samples.max(1);
        let mut sum: i64 = 0;
        for _ in 0..samples {
            sum += i64::from(self.adc.read_raw()?);
        }
        Ok(sum as f32 / samples as f32)
    }

    fn read_tared_average(&mut self, samples: usize) -> anyhow::Result<f32> {
        Ok(self.read_average(samples)? - self.params.tare_offset as f32)
    }

    fn read_units(&mut self, samples: usize) -> anyhow::Result<f32> {
        if self.params.scale_factor == 0.0 {
            bail!("scale factor is zero");
        }
        Ok(self.read_tared_average(samples)? / self.params.scale_factor)
    }

    fn set_scale(&mut self, scale_factor: f32) {
        self.params.scale_factor = scale_factor;
    }

    fn tare(&mut self, samples: usize) -> anyhow::Result<()> {
        let average = self.read_average(samples)?;
        self.params.tare_offset = average.round() as i32;
        log::debug!("Tare offset = {}", self.params.tare_offset);
        Ok(())
    }

    fn calibration(&self) -> CalibrationParameters {
        self.params
    }
}

// ---------------------------------------------------------------------------
// Sensor-absent stand-in
// ---------------------------------------------------------------------------

/// Deterministic sensor used when no load cell is fitted (`no-hx711`) and in
/// tests. Always reports `units` after scaling, whatever the calibration.
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor {
    units: f32,
    params: CalibrationParameters,
}

impl FixedSensor {
    pub fn new(units: f32) -> Self {
        Self {
            units,
            params: CalibrationParameters::default(),
        }
    }

    /// Reads as a full container.
    pub fn full() -> Self {
        Self::new(FALLBACK_WEIGHT_KG * 1000.0)
    }
}

impl ScaleSensor for FixedSensor {
    fn read_raw(&mut self) -> anyhow::Result<i32> {
        let counts = self.units * self.params.scale_factor + self.params.tare_offset as f32;
        Ok(counts.round() as i32)
    }

    fn read_average(&mut self, _samples: usize) -> anyhow::Result<f32> {
        Ok(self.units * self.params.scale_factor + self.params.tare_offset as f32)
    }

    fn read_tared_average(&mut self, _samples: usize) -> anyhow::Result<f32> {
        Ok(self.units * self.params.scale_factor)
    }

    fn read_units(&mut self, _samples: usize) -> anyhow::Result<f32> {
        Ok(self.units)
    }

    fn set_scale(&mut self, scale_factor: f32) {
        self.params.scale_factor = scale_factor;
    }

    fn tare(&mut self, _samples: usize) -> anyhow::Result<()> {
        Ok(())
    }

    fn calibration(&self) -> CalibrationParameters {
        self.params
    }
}

// ---------------------------------------------------------------------------
// Load cell as seen by the control loop
// ---------------------------------------------------------------------------
pub struct LoadCell<S> {
    sensor: S,
}

impl<S: ScaleSensor> LoadCell<S> {
    pub fn new(sensor: S) -> Self {
        Self { sensor }
    }

    /// Averaged units over ten samples, divided by 1000. A failed read is
    /// replaced by [`FALLBACK_WEIGHT_KG`] so the pipeline keeps running.
    pub fn measure_weight(&mut self) -> f32 {
        match self.sensor.read_units(MEASURE_SAMPLES) {
            Ok(units) => units / 1000.0,
            Err(e) => {
                log::warn!("Load cell read failed ({}), using fallback weight", e);
                FALLBACK_WEIGHT_KG
            }
        }
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}
