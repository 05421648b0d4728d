use serde::{Deserialize, Serialize};

/// One delivery from a sample source.
///
/// `samples` is ordered oldest to newest. Each inner vector holds one voltage
/// (µV) per channel, in the order given by `channel_names`. Sources may carry
/// more values per sample than the engine is configured for; extra values are
/// ignored downstream, and short samples only feed the channels they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Sampling rate claimed by the source for this delivery, in Hz.
    pub sampling_rate: f64,
    /// Channel names in ordinal order.
    pub channel_names: Vec<String>,
    /// Samples, oldest first.
    pub samples: Vec<Vec<f64>>,
}

impl Batch {
    pub fn new(sampling_rate: f64, channel_names: Vec<String>, samples: Vec<Vec<f64>>) -> Self {
        Self {
            sampling_rate,
            channel_names,
            samples,
        }
    }

    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The newest sample tuple, if any.
    pub fn last_sample(&self) -> Option<&[f64]> {
        self.samples.last().map(Vec::as_slice)
    }

    /// Channel names restricted to `count` entries.
    ///
    /// Missing names are taken from `fallback` by position so that the result
    /// always has `count` entries when `fallback` is long enough.
    pub fn leading_channel_names(&self, count: usize, fallback: &[String]) -> Vec<String> {
        (0..count)
            .filter_map(|i| self.channel_names.get(i).or_else(|| fallback.get(i)).cloned())
            .collect()
    }

    /// Samples truncated to their first `count` values.
    pub fn leading_samples(&self, count: usize) -> Vec<Vec<f64>> {
        self.samples
            .iter()
            .map(|s| s.iter().take(count).copied().collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_leading_channel_names_truncates_extras() {
        let batch = Batch::new(256.0, names(&["TP9", "AF7", "AF8", "TP10", "AUX"]), vec![]);
        let fallback = names(&["A", "B", "C", "D"]);
        assert_eq!(
            batch.leading_channel_names(4, &fallback),
            names(&["TP9", "AF7", "AF8", "TP10"])
        );
    }

    #[test]
    fn test_leading_channel_names_fills_from_fallback() {
        let batch = Batch::new(256.0, names(&["TP9"]), vec![]);
        let fallback = names(&["A", "B", "C", "D"]);
        assert_eq!(
            batch.leading_channel_names(4, &fallback),
            names(&["TP9", "B", "C", "D"])
        );
    }

    #[test]
    fn test_leading_samples() {
        let batch = Batch::new(
            256.0,
            names(&["TP9", "AF7"]),
            vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![6.0, 7.0]],
        );
        let samples = batch.leading_samples(4);
        assert_eq!(samples, vec![vec![1.0, 2.0, 3.0, 4.0], vec![6.0, 7.0]]);
        assert_eq!(batch.last_sample(), Some(&[6.0, 7.0][..]));
        assert_eq!(batch.len(), 2);
    }
}
