// /src/ntc.rs
use crate::traits::Reading;

/// ADC counts of a 100k/B3950 NTC on the low side of a 100k divider, read by
/// a 12 bit converter, against the temperature in Celsius. Counts fall as the
/// temperature rises.
const NTC_TABLE: [(u16, f32); 15] = [
    (3996, -40.0),
    (3900, -30.0),
    (3740, -20.0),
    (3495, -10.0),
    (3156, 0.0),
    (2738, 10.0),
    (2278, 20.0),
    (1825, 30.0),
    (1419, 40.0),
    (1081, 50.0),
    (815, 60.0),
    (613, 70.0),
    (462, 80.0),
    (350, 90.0),
    (267, 100.0),
];

/// Samples averaged into one reading.
pub const NTC_SAMPLES: u8 = 16;

/// Converts a raw reading by linear interpolation on the Beta curve. `None`
/// outside the table, which means an open or shorted sensor.
pub fn adc_to_celsius(raw: u16) -> Option<f32> {
    NTC_TABLE.windows(2).find_map(|pair| {
        let (hi_raw, lo_temp) = pair[0];
        let (lo_raw, hi_temp) = pair[1];
        if raw > hi_raw || raw < lo_raw {
            return None;
        }
        let span = f32::from(hi_raw - lo_raw);
        let offset = f32::from(hi_raw - raw);
        Some(lo_temp + (hi_temp - lo_temp) * offset / span)
    })
}

/// Running average over [`NTC_SAMPLES`] raw readings.
#[derive(Debug, Default)]
pub struct NtcSampler {
    sum: u32,
    count: u8,
}

impl NtcSampler {
    pub const fn new() -> Self {
        Self { sum: 0, count: 0 }
    }

    /// Adds one raw reading; every [`NTC_SAMPLES`] readings yields a
    /// temperature and starts a new average.
    pub fn push(&mut self, raw: u16) -> Reading {
        self.sum += u32::from(raw);
        self.count += 1;
        if self.count < NTC_SAMPLES {
            return Reading::Pending;
        }
        let average = self.sum / u32::from(NTC_SAMPLES);
        self.sum = 0;
        self.count = 0;
        match adc_to_celsius(u16::try_from(average).unwrap_or(u16::MAX)) {
            Some(celsius) => Reading::Celsius(celsius),
            None => {
                warn!("NTC reading {} out of range", average);
                Reading::Fault
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_points_and_interpolation() {
        assert_eq!(adc_to_celsius(3156), Some(0.0));
        assert_eq!(adc_to_celsius(267), Some(100.0));
        let room = adc_to_celsius(2048).unwrap();
        assert!((room - 25.0).abs() < 0.2, "{room}");
        assert_eq!(adc_to_celsius(4090), None);
        assert_eq!(adc_to_celsius(100), None);
    }

    #[test]
    fn sampler_averages() {
        let mut sampler = NtcSampler::new();
        for _ in 1..NTC_SAMPLES {
            assert_eq!(sampler.push(3156), Reading::Pending);
        }
        assert_eq!(sampler.push(3156), Reading::Celsius(0.0));
        assert_eq!(sampler.push(3156), Reading::Pending);
    }

    #[test]
    fn disconnected_sensor_is_a_fault() {
        let mut sampler = NtcSampler::new();
        for _ in 1..NTC_SAMPLES {
            sampler.push(4095);
        }
        assert_eq!(sampler.push(4095), Reading::Fault);
    }
}
