// Property tests for the universal properties of the codec: zigzag and
// varint laws, deterministic encoding, round-trip length, and tiling.

use lsgcodec::container::{decode, encode, inspect, EncodeOptions, PredictorChoice, ResidualCoding};
use lsgcodec::segment::SegmentMode;
use lsgcodec::timeseries::TimeSeries;
use lsgcodec::varint::{varint_decode, varint_encode, zigzag_decode, zigzag_encode};
use proptest::prelude::*;

proptest! {
    #[test]
    fn zigzag_round_trips_any_i32(n in any::<i32>()) {
        prop_assert_eq!(zigzag_decode(zigzag_encode(n)), n);
    }

    #[test]
    fn varint_round_trips_any_u32(v in any::<u32>()) {
        let mut buf = Vec::new();
        varint_encode(v, &mut buf);
        let (decoded, consumed) = varint_decode(&buf).unwrap();
        prop_assert_eq!(decoded, v);
        prop_assert_eq!(consumed, buf.len());
    }

    #[test]
    fn round_trip_length_matches_input(samples in prop::collection::vec(-1e3f64..1e3f64, 1..300)) {
        let ts = TimeSeries::new(samples.clone(), 1.0, "t0", "u");
        let options = EncodeOptions {
            segment_mode: SegmentMode::Fixed { length: 17 },
            predictor: PredictorChoice::Linear,
            residual_coding: ResidualCoding::Raw,
            ..EncodeOptions::default()
        };
        let bytes = encode(&ts, &options).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded.samples.len(), samples.len());
    }

    #[test]
    fn segment_table_tiles_the_input_exactly(samples in prop::collection::vec(-1e3f64..1e3f64, 1..300)) {
        let ts = TimeSeries::new(samples.clone(), 1.0, "t0", "u");
        let options = EncodeOptions {
            segment_mode: SegmentMode::Adaptive { min_len: 5, max_len: 40, mse_threshold: 10.0 },
            predictor: PredictorChoice::Auto,
            residual_coding: ResidualCoding::Varint,
            ..EncodeOptions::default()
        };
        let bytes = encode(&ts, &options).unwrap();
        let inspection = inspect(&bytes).unwrap();

        let mut expected_start = 0u32;
        for seg in &inspection.segments {
            prop_assert_eq!(seg.start_idx, expected_start);
            prop_assert!(seg.end_idx >= seg.start_idx);
            expected_start = seg.end_idx + 1;
        }
        prop_assert_eq!(expected_start as usize, samples.len());
    }

    #[test]
    fn encoding_is_deterministic_across_invocations(samples in prop::collection::vec(-1e3f64..1e3f64, 1..200)) {
        let ts = TimeSeries::new(samples, 1.0, "t0", "u");
        let options = EncodeOptions {
            segment_mode: SegmentMode::Adaptive { min_len: 5, max_len: 30, mse_threshold: 5.0 },
            predictor: PredictorChoice::Auto,
            residual_coding: ResidualCoding::Varint,
            ..EncodeOptions::default()
        };
        let bytes1 = encode(&ts, &options).unwrap();
        let bytes2 = encode(&ts, &options).unwrap();
        prop_assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn metadata_fields_survive_round_trip(dt in 0.01f64..3600.0, unit in "[a-zA-Z%/]{0,8}") {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ts = TimeSeries::new(samples, dt, "2025-01-01T00:00:00Z", unit.clone());
        let bytes = encode(&ts, &EncodeOptions::default()).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded.dt.to_bits(), dt.to_bits());
        prop_assert_eq!(decoded.t0, "2025-01-01T00:00:00Z");
        prop_assert_eq!(decoded.unit, unit);
    }
}
