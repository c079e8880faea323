//! Trait abstraction for the time-series store, so the IMU path can be driven
//! by any query backend (and by mocks in tests).

use super::record::ChannelRecord;
use crate::error::Result;

/// Source of channel records
#[cfg_attr(test, mockall::automock)]
pub trait RecordSource {
    /// Run one query and return its rows in store order
    fn fetch(&mut self, query: &str) -> Result<Vec<ChannelRecord>>;
}

impl<F> RecordSource for F
where
    F: FnMut(&str) -> Result<Vec<ChannelRecord>>,
{
    fn fetch(&mut self, query: &str) -> Result<Vec<ChannelRecord>> {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;

    #[test]
    fn test_closure_source() {
        let mut seen = Vec::new();
        let mut source = |query: &str| -> Result<Vec<ChannelRecord>> {
            seen.push(query.to_string());
            Ok(Vec::new())
        };

        assert!(source.fetch("SELECT 1").unwrap().is_empty());
        drop(source);
        assert_eq!(seen, vec!["SELECT 1".to_string()]);
    }

    #[test]
    fn test_mock_source_error() {
        let mut source = MockRecordSource::new();
        source
            .expect_fetch()
            .returning(|_| Err(TelemetryError::Source("store offline".to_string())));

        match source.fetch("SELECT 1") {
            Err(TelemetryError::Source(msg)) => assert_eq!(msg, "store offline"),
            other => panic!("Expected Source error, got: {:?}", other),
        }
    }
}
