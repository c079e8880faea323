//! # Telemetry Aggregator
//!
//! Owns the last-known GPS state and IMU sample set.
//!
//! This module handles:
//! - Applying decoded GPS datagrams with sticky semantics
//! - Resolving IMU rows per channel group and keeping the previous sample
//!   when a group has no complete cycle
//! - Running the attitude conversion once both raw groups are known
//! - Rendering the console status lines
//!
//! Nothing here is ever cleared: a value is only replaced by a newer,
//! successfully decoded one.

use std::fmt;

use tracing::{debug, warn};

use crate::config::Config;
use crate::converter::{ConversionClient, ConvertedAttitude};
use crate::error::{ConvertError, DecodeError, Result};
use crate::gps::{decode, GpsSource, OrientationReading, PositionFix};
use crate::imu::{ChannelDescriptor, ChannelGroup, ChannelRecord, CorrelatedSample, RecordSource};
use crate::types::NumericToken;

/// Last-known GPS values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsState {
    pub source: Option<GpsSource>,
    pub position: Option<PositionFix>,
    pub orientation: Option<OrientationReading>,
}

/// `(GPS1) T = 12:34:56 LONG = … LAT = … YAW = … TILT = … ALTITUDE = …`
impl fmt::Display for GpsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self
            .source
            .map_or_else(|| "NONE".to_string(), |s| s.to_string());
        let time = self
            .position
            .map(|p| p.time.to_string())
            .unwrap_or_default();
        let longitude = self.position.map_or(NumericToken::Missing, |p| p.longitude.into());
        let latitude = self.position.map_or(NumericToken::Missing, |p| p.latitude.into());
        let altitude = self.position.map_or(NumericToken::Missing, |p| p.altitude);
        let orientation = self.orientation.unwrap_or_default();

        write!(
            f,
            "({}) T = {} LONG = {:.5} LAT = {:.5} YAW = {:.3} TILT = {:.3} ALTITUDE = {:.3}",
            source, time, longitude, latitude, orientation.yaw, orientation.tilt, altitude
        )
    }
}

/// What one datagram changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpsUpdate {
    pub source: Option<GpsSource>,
    pub orientation: bool,
    pub position: bool,
}

impl GpsUpdate {
    /// True when the datagram changed no reading
    pub fn is_empty(&self) -> bool {
        !self.orientation && !self.position
    }
}

/// Rows fetched for each channel group in one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImuRows {
    pub quaternion: Vec<ChannelRecord>,
    pub gyroscope: Vec<ChannelRecord>,
    pub accelerometer: Vec<ChannelRecord>,
}

impl ImuRows {
    pub fn group(&self, group: ChannelGroup) -> &[ChannelRecord] {
        match group {
            ChannelGroup::Quaternion => &self.quaternion,
            ChannelGroup::Gyroscope => &self.gyroscope,
            ChannelGroup::Accelerometer => &self.accelerometer,
        }
    }

    fn group_mut(&mut self, group: ChannelGroup) -> &mut Vec<ChannelRecord> {
        match group {
            ChannelGroup::Quaternion => &mut self.quaternion,
            ChannelGroup::Gyroscope => &mut self.gyroscope,
            ChannelGroup::Accelerometer => &mut self.accelerometer,
        }
    }
}

/// Latest sample per channel group plus the converted attitude
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImuSampleSet {
    pub quaternion: Option<CorrelatedSample>,
    pub gyroscope: Option<CorrelatedSample>,
    pub accelerometer: Option<CorrelatedSample>,

    /// Last successful conversion of the gyroscope/accelerometer pair
    pub attitude: Option<ConvertedAttitude>,
}

impl ImuSampleSet {
    pub fn sample(&self, group: ChannelGroup) -> Option<&CorrelatedSample> {
        match group {
            ChannelGroup::Quaternion => self.quaternion.as_ref(),
            ChannelGroup::Gyroscope => self.gyroscope.as_ref(),
            ChannelGroup::Accelerometer => self.accelerometer.as_ref(),
        }
    }

    fn slot_mut(&mut self, group: ChannelGroup) -> &mut Option<CorrelatedSample> {
        match group {
            ChannelGroup::Quaternion => &mut self.quaternion,
            ChannelGroup::Gyroscope => &mut self.gyroscope,
            ChannelGroup::Accelerometer => &mut self.accelerometer,
        }
    }

    fn write_group(&self, f: &mut fmt::Formatter<'_>, group: ChannelGroup) -> fmt::Result {
        let sample = self.sample(group);
        f.write_str("(")?;
        for (i, instance) in group.instances().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let value = sample
                .and_then(|s| s.get(instance))
                .map_or(NumericToken::Missing, NumericToken::Value);
            write!(f, "{}", value)?;
        }
        f.write_str(")")
    }
}

/// `ACCEL = (…) GYRO = (…) QUATERNIONS = (…) CONV_QUAT = (…) EULERS = (…)`
impl fmt::Display for ImuSampleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ACCEL = ")?;
        self.write_group(f, ChannelGroup::Accelerometer)?;
        f.write_str(" GYRO = ")?;
        self.write_group(f, ChannelGroup::Gyroscope)?;
        f.write_str(" QUATERNIONS = ")?;
        self.write_group(f, ChannelGroup::Quaternion)?;
        write!(f, " {}", self.attitude.unwrap_or_default())
    }
}

/// What one IMU update changed
#[derive(Debug, Default)]
pub struct ImuUpdate {
    pub quaternion: bool,
    pub gyroscope: bool,
    pub accelerometer: bool,

    /// Outcome of the conversion round trip, `None` when it was not attempted
    pub conversion: Option<std::result::Result<(), ConvertError>>,
}

impl ImuUpdate {
    pub fn updated(&self, group: ChannelGroup) -> bool {
        match group {
            ChannelGroup::Quaternion => self.quaternion,
            ChannelGroup::Gyroscope => self.gyroscope,
            ChannelGroup::Accelerometer => self.accelerometer,
        }
    }

    fn mark(&mut self, group: ChannelGroup) {
        match group {
            ChannelGroup::Quaternion => self.quaternion = true,
            ChannelGroup::Gyroscope => self.gyroscope = true,
            ChannelGroup::Accelerometer => self.accelerometer = true,
        }
    }
}

/// Single owner of all telemetry state
#[derive(Debug)]
pub struct TelemetryAggregator {
    gps: GpsState,
    imu: ImuSampleSet,
    descriptors: [ChannelDescriptor; 3],
    query_interval_s: u64,
    converter: ConversionClient,
}

impl TelemetryAggregator {
    /// Create an empty aggregator
    ///
    /// # Arguments
    ///
    /// * `descriptors` - One descriptor per channel group
    /// * `query_interval_s` - Look-back window used by [`poll_imu`](Self::poll_imu)
    /// * `converter` - Conversion client, possibly disabled
    pub fn new(
        descriptors: [ChannelDescriptor; 3],
        query_interval_s: u64,
        converter: ConversionClient,
    ) -> Self {
        Self {
            gps: GpsState::default(),
            imu: ImuSampleSet::default(),
            descriptors,
            query_interval_s,
            converter,
        }
    }

    /// Build from configuration, connecting to the conversion service
    ///
    /// Blocks for up to the converter timeout while the handshake runs.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.imu.descriptors(),
            config.imu.query_interval_s,
            ConversionClient::from_config(&config.converter),
        )
    }

    /// Decode one GPS datagram and apply it
    ///
    /// # Returns
    ///
    /// * `Result<GpsUpdate, DecodeError>` - Which readings changed
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the datagram is not UTF-8. State is unchanged.
    pub fn update_gps(&mut self, raw: &[u8]) -> std::result::Result<GpsUpdate, DecodeError> {
        let decoded = decode(raw)?;

        if decoded.source.is_some() {
            self.gps.source = decoded.source;
        }

        if let Some(position) = decoded.position {
            self.gps.position = Some(position);
        }

        if let Some(orientation) = decoded.orientation {
            let prior = self.gps.orientation.unwrap_or_default();
            self.gps.orientation = Some(prior.merge(&orientation));
        }

        let update = GpsUpdate {
            source: decoded.source,
            orientation: decoded.orientation.is_some(),
            position: decoded.position.is_some(),
        };
        debug!("GPS update: {:?}", update);
        Ok(update)
    }

    /// Resolve fetched rows and refresh the IMU sample set
    ///
    /// Each group is resolved on its own; a group without a complete cycle
    /// keeps its previous sample. Once both the gyroscope and accelerometer
    /// samples exist the pair is sent to the conversion service; a failed
    /// conversion keeps the previous attitude.
    pub fn update_imu(&mut self, rows: &ImuRows) -> ImuUpdate {
        let mut update = ImuUpdate::default();

        for descriptor in &self.descriptors {
            let group = descriptor.group;
            match descriptor.resolve(rows.group(group)) {
                Some(sample) => {
                    debug!("{} sample at {}", group, sample.time());
                    *self.imu.slot_mut(group) = Some(sample);
                    update.mark(group);
                }
                None => debug!("No complete {} cycle, keeping previous sample", group),
            }
        }

        let result = match (&self.imu.gyroscope, &self.imu.accelerometer) {
            (Some(gyro), Some(accel)) => Some(self.converter.convert(gyro, accel)),
            _ => None,
        };

        update.conversion = result.map(|result| match result {
            Ok(attitude) => {
                self.imu.attitude = Some(attitude);
                Ok(())
            }
            Err(e) => {
                // disabled client, already reported at construction
                if !matches!(e, ConvertError::Unavailable) {
                    warn!("Attitude conversion failed: {}", e);
                }
                Err(e)
            }
        });

        update
    }

    /// Query every channel group from `source` and apply the rows
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `source`. No group is applied in
    /// that case.
    pub fn poll_imu(&mut self, source: &mut dyn RecordSource) -> Result<ImuUpdate> {
        let mut rows = ImuRows::default();

        for group in ChannelGroup::ALL {
            let query = group.query(self.query_interval_s);
            *rows.group_mut(group) = source.fetch(&query)?;
        }

        Ok(self.update_imu(&rows))
    }

    pub fn position(&self) -> Option<&PositionFix> {
        self.gps.position.as_ref()
    }

    pub fn orientation(&self) -> Option<&OrientationReading> {
        self.gps.orientation.as_ref()
    }

    pub fn source(&self) -> Option<GpsSource> {
        self.gps.source
    }

    pub fn gps(&self) -> &GpsState {
        &self.gps
    }

    pub fn imu(&self) -> &ImuSampleSet {
        &self.imu
    }

    pub fn converter(&self) -> &ConversionClient {
        &self.converter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImuConfig;
    use crate::converter::link::MockConverterLink;
    use crate::converter::protocol::GREETING;
    use crate::error::TelemetryError;
    use crate::imu::source::MockRecordSource;
    use chrono::{Duration, TimeZone, Utc};
    use std::io;

    const GGA: &[u8] = b"gps1, $GPGGA,123456.00,4512.34,N,01123.45,E,1,08,0.9,123.4,M";

    fn rec(instance: &str, value: f64, millis: i64) -> ChannelRecord {
        let t = Utc.with_ymd_and_hms(2021, 3, 4, 18, 2, 33).unwrap() + Duration::milliseconds(millis);
        ChannelRecord::new(instance, value, t)
    }

    fn aggregator(converter: ConversionClient) -> TelemetryAggregator {
        let imu = ImuConfig::default();
        TelemetryAggregator::new(imu.descriptors(), imu.query_interval_s, converter)
    }

    fn full_rows() -> ImuRows {
        ImuRows {
            quaternion: vec![
                rec("q1", 0.5, 0),
                rec("q2", 0.5, 10),
                rec("q3", 0.5, 20),
                rec("q4", 0.5, 30),
            ],
            gyroscope: vec![rec("X", 1.0, 0), rec("Y", 2.0, 200), rec("Z", 65535.0, 400)],
            accelerometer: vec![rec("X", 4.0, 0), rec("Y", 5.0, 200), rec("Z", 6.0, 400)],
        }
    }

    fn converting_link(replies: &'static [&'static [u8]]) -> MockConverterLink {
        let mut link = MockConverterLink::new();
        let mut queue = std::iter::once(GREETING).chain(replies.iter().copied());
        link.expect_receive().returning(move |buf: &mut [u8]| {
            let reply = queue.next().unwrap_or(b"");
            buf[..reply.len()].copy_from_slice(reply);
            Ok(reply.len())
        });
        link.expect_send().returning(|_| Ok(()));
        link
    }

    #[test]
    fn test_initial_state_is_empty() {
        let agg = aggregator(ConversionClient::disabled());
        assert!(agg.position().is_none());
        assert!(agg.orientation().is_none());
        assert!(agg.source().is_none());
        assert_eq!(agg.imu(), &ImuSampleSet::default());
        assert_eq!(
            agg.gps().to_string(),
            "(NONE) T =  LONG = nan LAT = nan YAW = nan TILT = nan ALTITUDE = nan"
        );
    }

    #[test]
    fn test_update_gps_position() {
        let mut agg = aggregator(ConversionClient::disabled());
        let update = agg.update_gps(GGA).unwrap();

        assert!(update.position);
        assert!(!update.orientation);
        assert_eq!(update.source, Some(GpsSource::Gps1));

        let fix = agg.position().unwrap();
        assert_eq!(fix.time.to_string(), "12:34:56");
        assert!((fix.latitude - 45.1234).abs() < 1e-9);
        assert!((fix.longitude - 11.2345).abs() < 1e-9);
        assert_eq!(fix.altitude, NumericToken::Value(123.4));

        assert_eq!(
            agg.gps().to_string(),
            "(GPS1) T = 12:34:56 LONG = 11.23450 LAT = 45.12340 YAW = nan TILT = nan ALTITUDE = 123.400"
        );
    }

    #[test]
    fn test_orientation_merges_missing_fields() {
        let mut agg = aggregator(ConversionClient::disabled());
        agg.update_gps(b"gps2, $PTNL,AVR,181059.6,+12.5,Yaw,-3.25,Tilt").unwrap();
        agg.update_gps(b"gps2, $PTNL,AVR,181100.6,,Yaw,-4.0,Tilt").unwrap();

        let orientation = agg.orientation().unwrap();
        assert_eq!(orientation.yaw, NumericToken::Value(12.5));
        assert_eq!(orientation.tilt, NumericToken::Value(-4.0));
        assert_eq!(agg.source(), Some(GpsSource::Gps2));
    }

    #[test]
    fn test_unrecognized_datagram_keeps_state() {
        let mut agg = aggregator(ConversionClient::disabled());
        agg.update_gps(GGA).unwrap();
        let before = *agg.gps();

        let update = agg.update_gps(b"gps1, $GPVTG,054.7,T,034.4,M").unwrap();
        assert!(update.is_empty());
        assert_eq!(agg.position(), before.position.as_ref());

        // partial position sentence never half-updates the fix
        agg.update_gps(b"gps1, $GPGGA,,4512.34,N,01123.45,E,1,08,0.9,99.0,M").unwrap();
        assert_eq!(agg.position(), before.position.as_ref());
    }

    #[test]
    fn test_invalid_utf8_leaves_state_untouched() {
        let mut agg = aggregator(ConversionClient::disabled());
        agg.update_gps(GGA).unwrap();
        let before = *agg.gps();

        assert!(agg.update_gps(&[b'g', 0xFF, 0xFE]).is_err());
        assert_eq!(*agg.gps(), before);
    }

    #[test]
    fn test_update_imu_resolves_every_group() {
        let mut agg = aggregator(ConversionClient::disabled());
        let update = agg.update_imu(&full_rows());

        assert!(update.quaternion && update.gyroscope && update.accelerometer);
        assert!(matches!(update.conversion, Some(Err(ConvertError::Unavailable))));

        let gyro = agg.imu().gyroscope.as_ref().unwrap();
        assert_eq!(gyro.get("Z"), Some(-1.0));
        assert_eq!(gyro.time().to_string(), "18:02:33");
        assert!(agg.imu().attitude.is_none());
    }

    #[test]
    fn test_incomplete_group_keeps_previous_sample() {
        let mut agg = aggregator(ConversionClient::disabled());
        agg.update_imu(&full_rows());
        let previous = agg.imu().accelerometer.clone();

        let rows = ImuRows {
            accelerometer: vec![rec("X", 7.0, 0), rec("Y", 8.0, 100)],
            ..ImuRows::default()
        };
        let update = agg.update_imu(&rows);

        assert!(!update.accelerometer);
        assert!(!update.updated(ChannelGroup::Quaternion));
        assert_eq!(agg.imu().accelerometer, previous);
    }

    #[test]
    fn test_late_cycle_yields_no_sample() {
        let mut agg = aggregator(ConversionClient::disabled());
        let rows = ImuRows {
            gyroscope: vec![rec("X", 1.0, 0), rec("Y", 2.0, 200), rec("Z", 3.0, 10_000)],
            ..ImuRows::default()
        };

        let update = agg.update_imu(&rows);
        assert!(!update.gyroscope);
        assert!(agg.imu().gyroscope.is_none());
        assert!(update.conversion.is_none());
    }

    #[test]
    fn test_conversion_updates_attitude() {
        let link = converting_link(&[b"Q1.0,2.0,3.0,4.0E0.1,0.2,0.3"]);
        let client = ConversionClient::with_link(Box::new(link), 128);
        let mut agg = aggregator(client);

        let update = agg.update_imu(&full_rows());
        assert!(matches!(update.conversion, Some(Ok(()))));

        let attitude = agg.imu().attitude.unwrap();
        assert_eq!(attitude.quaternion[3], NumericToken::Value(4.0));
        assert_eq!(attitude.euler.roll, NumericToken::Value(0.1));

        assert_eq!(
            agg.imu().to_string(),
            "ACCEL = (4,5,6) GYRO = (1,2,-1) QUATERNIONS = (0.5,0.5,0.5,0.5) \
             CONV_QUAT = (1,2,3,4) EULERS = (0.1,0.2,0.3)"
        );
    }

    #[test]
    fn test_malformed_reply_keeps_prior_attitude() {
        let link = converting_link(&[b"Q1.0,2.0,3.0,4.0E0.1,0.2,0.3", b"Q9.0,9.0,9.0,9.0"]);
        let client = ConversionClient::with_link(Box::new(link), 128);
        let mut agg = aggregator(client);

        agg.update_imu(&full_rows());
        let prior = agg.imu().attitude;

        let update = agg.update_imu(&full_rows());
        assert!(matches!(update.conversion, Some(Err(ConvertError::MalformedReply(_)))));
        assert_eq!(agg.imu().attitude, prior);
    }

    #[test]
    fn test_conversion_timeout_keeps_prior_attitude() {
        let mut link = MockConverterLink::new();
        let mut first = true;
        link.expect_receive().returning(move |buf: &mut [u8]| {
            if first {
                first = false;
                buf[..GREETING.len()].copy_from_slice(GREETING);
                Ok(GREETING.len())
            } else {
                Err(io::Error::new(io::ErrorKind::TimedOut, "slow"))
            }
        });
        link.expect_send().returning(|_| Ok(()));

        let mut agg = aggregator(ConversionClient::with_link(Box::new(link), 64));
        let update = agg.update_imu(&full_rows());

        assert!(matches!(update.conversion, Some(Err(ConvertError::Timeout))));
        assert!(agg.imu().attitude.is_none());
        assert!(agg.imu().gyroscope.is_some());
    }

    #[test]
    fn test_poll_imu_queries_each_group() {
        let mut source = MockRecordSource::new();
        source
            .expect_fetch()
            .times(3)
            .returning(|query: &str| {
                let rows = full_rows();
                let records = if query.contains("'quaternions'") {
                    rows.quaternion
                } else if query.contains("'position'") {
                    rows.gyroscope
                } else {
                    rows.accelerometer
                };
                assert!(query.contains("now()-2s"));
                Ok(records)
            });

        let mut agg = aggregator(ConversionClient::disabled());
        let update = agg.poll_imu(&mut source).unwrap();

        assert!(update.quaternion && update.gyroscope && update.accelerometer);
        assert_eq!(agg.imu().quaternion.as_ref().unwrap().get("q4"), Some(0.5));
        assert_eq!(agg.imu().accelerometer.as_ref().unwrap().get("X"), Some(4.0));
    }

    #[test]
    fn test_poll_imu_source_error_applies_nothing() {
        let mut source = MockRecordSource::new();
        let mut calls = 0;
        source.expect_fetch().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(full_rows().quaternion)
            } else {
                Err(TelemetryError::Source("store offline".to_string()))
            }
        });

        let mut agg = aggregator(ConversionClient::disabled());
        assert!(matches!(agg.poll_imu(&mut source), Err(TelemetryError::Source(_))));
        assert!(agg.imu().quaternion.is_none());
    }

    #[test]
    fn test_empty_imu_display() {
        let agg = aggregator(ConversionClient::disabled());
        assert_eq!(
            agg.imu().to_string(),
            "ACCEL = (nan,nan,nan) GYRO = (nan,nan,nan) QUATERNIONS = (nan,nan,nan,nan) \
             CONV_QUAT = (nan,nan,nan,nan) EULERS = (nan,nan,nan)"
        );
    }
}
