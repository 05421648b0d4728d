//! Frequency bands and band-power containers

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;

/// The five EEG frequency bands tracked per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Half-open frequency range `[low, high)` in Hz.
    pub fn range_hz(self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            // Capped at 45 Hz, below the powerline and the Muse headband's usable range.
            Band::Gamma => (30.0, 45.0),
        }
    }

    pub fn contains(self, freq_hz: f64) -> bool {
        let (low, high) = self.range_hz();
        freq_hz >= low && freq_hz < high
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Power per band for one channel, in µV².
///
/// All five bands are always present. Serializes as a `{ band_name: power }`
/// map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandPowers {
    powers: [f64; 5],
}

impl BandPowers {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, band: Band) -> f64 {
        self.powers[band.index()]
    }

    pub fn set(&mut self, band: Band, power: f64) {
        self.powers[band.index()] = power;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Band, f64)> + '_ {
        Band::ALL.iter().map(move |&band| (band, self.get(band)))
    }

    /// Sum of the powers of every band except `band`.
    pub fn total_excluding(&self, band: Band) -> f64 {
        self.iter().filter(|(b, _)| *b != band).map(|(_, p)| p).sum()
    }

    pub fn total(&self) -> f64 {
        self.powers.iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.powers.iter().all(|&p| p == 0.0)
    }
}

impl Serialize for BandPowers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Band::ALL.len()))?;
        for (band, power) in self.iter() {
            map.serialize_entry(band.name(), &power)?;
        }
        map.end()
    }
}

/// Band powers for every configured channel, in channel order.
///
/// Serializes as `{ channel_name: { band_name: power } }`, keeping the
/// configured channel order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BandSnapshot {
    channels: Vec<(String, BandPowers)>,
}

impl BandSnapshot {
    pub fn new(channels: Vec<(String, BandPowers)>) -> Self {
        Self { channels }
    }

    pub fn get(&self, channel: &str) -> Option<&BandPowers> {
        self.channels
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, powers)| powers)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BandPowers)> {
        self.channels.iter().map(|(name, powers)| (name.as_str(), powers))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Serialize for BandSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.channels.len()))?;
        for (name, powers) in &self.channels {
            map.serialize_entry(name, powers)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_ranges_are_half_open() {
        assert!(Band::Alpha.contains(8.0));
        assert!(!Band::Alpha.contains(13.0));
        assert!(Band::Beta.contains(13.0));
        assert!(!Band::Delta.contains(0.25));
        assert!(!Band::Gamma.contains(45.0));
    }

    #[test]
    fn test_band_powers_serialize_as_map() {
        let mut powers = BandPowers::zero();
        powers.set(Band::Alpha, 2.5);
        let json = serde_json::to_value(powers).unwrap();
        assert_eq!(json["alpha"], 2.5);
        assert_eq!(json["delta"], 0.0);
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_snapshot_keeps_channel_order() {
        let snapshot = BandSnapshot::new(vec![
            ("TP9".to_string(), BandPowers::zero()),
            ("AF7".to_string(), BandPowers::zero()),
        ]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let tp9 = json.find("TP9").unwrap();
        let af7 = json.find("AF7").unwrap();
        assert!(tp9 < af7);
        assert!(snapshot.get("AF7").is_some());
        assert!(snapshot.get("TP10").is_none());
    }

    #[test]
    fn test_total_excluding() {
        let mut powers = BandPowers::zero();
        powers.set(Band::Alpha, 10.0);
        powers.set(Band::Beta, 1.0);
        powers.set(Band::Gamma, 0.5);
        assert_eq!(powers.total_excluding(Band::Alpha), 1.5);
        assert_eq!(powers.total(), 11.5);
    }
}
