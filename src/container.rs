// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Writes and reads the "LSG2 v1" binary container: a fixed-size file
//! header, a JSON-encoded metadata blob, a densely-packed segment table,
//! a residual-section header, and one length-prefixed residual block per
//! segment. This module orchestrates the integer codec, predictors,
//! quantizer, and segmenter during encoding, and drives reconstruction
//! during decoding.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

use crate::error::{CodecError, CodecResult};
use crate::metadata::ContextMetadata;
use crate::predictor::{
    fit_linear, fit_mean, mse, predict_static, PredictorKind, PredictorParams,
};
use crate::quantizer::{dequantize, fit_step, quantize, DEFAULT_C_Q, DEFAULT_Q_MIN};
use crate::segment::{plan_segments, ProbePredictor, Segment, SegmentMode};
use crate::timeseries::TimeSeries;
use crate::varint::{decode_residuals, encode_residuals};

/// Hostile-input guard: decoding a file that claims more points than this
/// fails fast, before any proportional allocation.
pub const MAX_POINTS: usize = 10_000_000;
/// Hostile-input guard: decoding a file that claims more segments than
/// this fails fast, before any proportional allocation.
pub const MAX_SEGMENTS: usize = 1_000_000;

const MAGIC: &[u8; 4] = b"LSG2";
const VERSION: u16 = 1;
const FILE_HEADER_LEN: usize = 28;
const SEGMENT_ENTRY_LEN: usize = 64;
const RESIDUAL_SECTION_HEADER_LEN: usize = 16;
const RESIDUAL_BLOCK_HEADER_LEN: usize = 12;

/// Which predictor the encoder should use for every segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PredictorChoice {
    Mean,
    Linear,
    RandomWalk,
    /// Evaluate all three predictor types per segment and keep whichever
    /// yields the lowest reconstructed MSE, ties broken by lowest type ID.
    Auto,
}

/// The residual coding used for every block in a file (files do not mix
/// codings across segments).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ResidualCoding {
    Raw = 0,
    Varint = 1,
}

impl ResidualCoding {
    fn from_u32(value: u32) -> CodecResult<ResidualCoding> {
        match value {
            0 => Ok(ResidualCoding::Raw),
            1 => Ok(ResidualCoding::Varint),
            other => Err(CodecError::InvalidFormat(format!(
                "unsupported coding_type {}",
                other
            ))),
        }
    }
}

/// Options controlling how [`encode`] segments, predicts, and codes an
/// input time series.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOptions {
    pub segment_mode: SegmentMode,
    pub predictor: PredictorChoice,
    pub residual_coding: ResidualCoding,
    pub c_q: f64,
    pub q_min: f64,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            segment_mode: SegmentMode::Fixed { length: 256 },
            predictor: PredictorChoice::Linear,
            residual_coding: ResidualCoding::Raw,
            c_q: DEFAULT_C_Q,
            q_min: DEFAULT_Q_MIN,
        }
    }
}

/// The result of [`inspect`]: everything about a file except its decoded
/// residual payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct Inspection {
    pub metadata: ContextMetadata,
    pub n_points: usize,
    pub segments: Vec<Segment>,
    pub coding: ResidualCoding,
}

fn probe_predictor_for(choice: PredictorChoice) -> ProbePredictor {
    match choice {
        PredictorChoice::Mean => ProbePredictor::Mean,
        PredictorChoice::Linear => ProbePredictor::Linear,
        PredictorChoice::RandomWalk => ProbePredictor::RandomWalk,
        // The probe predictor is linear when the user selected auto, per spec.
        PredictorChoice::Auto => ProbePredictor::Linear,
    }
}

/// Fits `kind` on `samples`, quantizes the residuals with a step derived
/// from `c_q`/`q_min`, and reconstructs the segment from the committed
/// quantized values.
///
/// For [`PredictorKind::RandomWalk`], the quantization step is estimated
/// from the lag-1 differences of the *original* samples (a close proxy
/// for the eventual residual distribution, since the first sample's
/// residual is always exactly zero and quantization error is a
/// second-order effect on that estimate). The actual residual for
/// position `i >= 1` is then computed, quantized, and dequantized in
/// strict order using the *reconstructed* previous sample, never the
/// original one -- this is the hard contract from the design notes: a
/// decoder replaying the same formula must land on bit-identical values.
fn fit_quantize_reconstruct(
    samples: &[f64],
    kind: PredictorKind,
    c_q: f64,
    q_min: f64,
) -> (PredictorParams, f64, Vec<i32>, Vec<f64>) {
    let n = samples.len();
    match kind {
        PredictorKind::Mean | PredictorKind::Linear => {
            let params = if kind == PredictorKind::Mean {
                fit_mean(samples)
            } else {
                fit_linear(samples)
            };
            let raw: Vec<f64> = (0..n)
                .map(|i| samples[i] - predict_static(kind, &params, i))
                .collect();
            let q = fit_step(&raw, c_q, q_min);
            let quantized: Vec<i32> = raw.iter().map(|&r| quantize(r, q)).collect();
            let reconstructed: Vec<f64> = (0..n)
                .map(|i| predict_static(kind, &params, i) + dequantize(quantized[i], q))
                .collect();
            (params, q, quantized, reconstructed)
        }
        PredictorKind::RandomWalk => {
            let seed = samples.first().copied().unwrap_or(0.0);
            let mut naive = Vec::with_capacity(n);
            if n > 0 {
                naive.push(0.0);
            }
            for i in 1..n {
                naive.push(samples[i] - samples[i - 1]);
            }
            let q = fit_step(&naive, c_q, q_min);

            let mut quantized = Vec::with_capacity(n);
            let mut reconstructed = Vec::with_capacity(n);
            let mut prev = seed;
            for (i, &x) in samples.iter().enumerate() {
                let pred = if i == 0 { seed } else { prev };
                let r = x - pred;
                let qi = quantize(r, q);
                let xhat = pred + dequantize(qi, q);
                quantized.push(qi);
                reconstructed.push(xhat);
                prev = xhat;
            }
            let params = PredictorParams {
                mean: 0.0,
                slope: 0.0,
                intercept: 0.0,
                seed_value: seed,
            };
            (params, q, quantized, reconstructed)
        }
    }
}

/// Evaluates all three predictor types end-to-end and keeps whichever
/// yields the lowest reconstructed MSE against the original segment
/// samples, breaking ties by lowest type ID (mean < linear < random-walk).
fn fit_quantize_reconstruct_auto(
    samples: &[f64],
    c_q: f64,
    q_min: f64,
) -> (PredictorKind, PredictorParams, f64, Vec<i32>, Vec<f64>) {
    let mut best: Option<(PredictorKind, PredictorParams, f64, Vec<i32>, Vec<f64>, f64)> = None;
    for kind in [
        PredictorKind::Mean,
        PredictorKind::Linear,
        PredictorKind::RandomWalk,
    ] {
        let (params, q, quantized, reconstructed) =
            fit_quantize_reconstruct(samples, kind, c_q, q_min);
        let error = mse(samples, &reconstructed);
        let is_better = match &best {
            None => true,
            Some((_, _, _, _, _, best_error)) => error < *best_error,
        };
        if is_better {
            best = Some((kind, params, q, quantized, reconstructed, error));
        }
    }
    let (kind, params, q, quantized, reconstructed, _) = best.expect("predictor list is non-empty");
    (kind, params, q, quantized, reconstructed)
}

/// Encodes a time series into an "LSG2 v1" byte buffer.
pub fn encode(ts: &TimeSeries, options: &EncodeOptions) -> CodecResult<Vec<u8>> {
    if ts.samples.is_empty() {
        return Err(CodecError::InvalidInput(
            "cannot encode an empty time series".to_string(),
        ));
    }

    let probe = probe_predictor_for(options.predictor);
    let ranges = plan_segments(&ts.samples, options.segment_mode, probe)?;
    log::debug!("encoding {} sample(s) into {} segment(s)", ts.samples.len(), ranges.len());

    let mut segments = Vec::with_capacity(ranges.len());
    let mut residual_blocks: Vec<Vec<i32>> = Vec::with_capacity(ranges.len());

    for (start, end) in ranges {
        let window = &ts.samples[start..=end];
        let (kind, params, q, quantized, _reconstructed) = match options.predictor {
            PredictorChoice::Auto => fit_quantize_reconstruct_auto(window, options.c_q, options.q_min),
            PredictorChoice::Mean => {
                let (p, q, qd, _) =
                    fit_quantize_reconstruct(window, PredictorKind::Mean, options.c_q, options.q_min);
                (PredictorKind::Mean, p, q, qd, Vec::new())
            }
            PredictorChoice::Linear => {
                let (p, q, qd, _) =
                    fit_quantize_reconstruct(window, PredictorKind::Linear, options.c_q, options.q_min);
                (PredictorKind::Linear, p, q, qd, Vec::new())
            }
            PredictorChoice::RandomWalk => {
                let (p, q, qd, _) = fit_quantize_reconstruct(
                    window,
                    PredictorKind::RandomWalk,
                    options.c_q,
                    options.q_min,
                );
                (PredictorKind::RandomWalk, p, q, qd, Vec::new())
            }
        };

        segments.push(Segment {
            start_idx: start as u32,
            end_idx: end as u32,
            predictor: kind,
            mean: params.mean,
            slope: params.slope,
            intercept: params.intercept,
            quant_step: q,
            seed_value: params.seed_value,
        });
        residual_blocks.push(quantized);
    }

    if segments.len() > MAX_SEGMENTS {
        return Err(CodecError::InvalidInput(format!(
            "segmentation produced {} segments, exceeding the {} limit",
            segments.len(),
            MAX_SEGMENTS
        )));
    }

    write_container(ts, &segments, &residual_blocks, options.residual_coding)
}

fn write_container(
    ts: &TimeSeries,
    segments: &[Segment],
    residual_blocks: &[Vec<i32>],
    coding: ResidualCoding,
) -> CodecResult<Vec<u8>> {
    let metadata = ContextMetadata::new(ts.dt, ts.t0.clone(), ts.unit.clone());
    let metadata_json = metadata.to_json_bytes();

    let mut out = Vec::new();

    out.extend_from_slice(MAGIC);
    out.write_u16::<LittleEndian>(VERSION).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // flags
    out.write_u32::<LittleEndian>(metadata_json.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(ts.samples.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(segments.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap(); // reserved1
    out.write_u32::<LittleEndian>(0).unwrap(); // reserved2
    debug_assert_eq!(out.len(), FILE_HEADER_LEN);

    out.extend_from_slice(&metadata_json);

    for seg in segments {
        out.write_u32::<LittleEndian>(seg.start_idx).unwrap();
        out.write_u32::<LittleEndian>(seg.end_idx).unwrap();
        out.write_u32::<LittleEndian>(seg.predictor.as_u32()).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_f64::<LittleEndian>(seg.mean).unwrap();
        out.write_f64::<LittleEndian>(seg.slope).unwrap();
        out.write_f64::<LittleEndian>(seg.intercept).unwrap();
        out.write_f64::<LittleEndian>(seg.quant_step).unwrap();
        out.write_f64::<LittleEndian>(seg.seed_value).unwrap();
    }

    out.write_u32::<LittleEndian>(coding as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();

    for (seg_id, residuals) in residual_blocks.iter().enumerate() {
        let payload = match coding {
            ResidualCoding::Raw => {
                let mut p = Vec::with_capacity(residuals.len() * 4);
                for &r in residuals {
                    p.write_i32::<LittleEndian>(r).unwrap();
                }
                p
            }
            ResidualCoding::Varint => encode_residuals(residuals),
        };
        out.write_u32::<LittleEndian>(seg_id as u32).unwrap();
        out.write_u32::<LittleEndian>(residuals.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.extend_from_slice(&payload);
    }

    Ok(out)
}

struct FileHeader {
    header_len: usize,
    n_points: usize,
    n_segments: usize,
}

fn read_file_header(bytes: &[u8]) -> CodecResult<FileHeader> {
    if bytes.len() < FILE_HEADER_LEN {
        return Err(CodecError::Truncated(format!(
            "file header requires {} bytes, got {}",
            FILE_HEADER_LEN,
            bytes.len()
        )));
    }
    let mut cursor = Cursor::new(&bytes[..FILE_HEADER_LEN]);
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).expect("length already checked");
    if &magic != MAGIC {
        return Err(CodecError::InvalidFormat(
            "bad magic: expected \"LSG2\"".to_string(),
        ));
    }
    let version = cursor.read_u16::<LittleEndian>().unwrap();
    if version != VERSION {
        return Err(CodecError::InvalidFormat(format!(
            "unsupported version {}",
            version
        )));
    }
    let _flags = cursor.read_u16::<LittleEndian>().unwrap();
    let header_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let n_points = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let n_segments = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let _reserved1 = cursor.read_u32::<LittleEndian>().unwrap();
    let _reserved2 = cursor.read_u32::<LittleEndian>().unwrap();

    if n_points > MAX_POINTS {
        return Err(CodecError::InvalidInput(format!(
            "n_points {} exceeds the sanity bound of {}",
            n_points, MAX_POINTS
        )));
    }
    if n_segments > MAX_SEGMENTS {
        return Err(CodecError::InvalidInput(format!(
            "n_segments {} exceeds the sanity bound of {}",
            n_segments, MAX_SEGMENTS
        )));
    }

    Ok(FileHeader {
        header_len,
        n_points,
        n_segments,
    })
}

fn read_metadata<'a>(bytes: &'a [u8], header: &FileHeader) -> CodecResult<(ContextMetadata, &'a [u8])> {
    let start = FILE_HEADER_LEN;
    let end = start
        .checked_add(header.header_len)
        .ok_or_else(|| CodecError::InconsistentSizes("header_len overflows file offset".to_string()))?;
    if end > bytes.len() {
        return Err(CodecError::InconsistentSizes(format!(
            "header_len {} exceeds remaining data ({} bytes available)",
            header.header_len,
            bytes.len() - start.min(bytes.len())
        )));
    }
    let json = &bytes[start..end];
    let metadata = ContextMetadata::from_json_bytes(json)
        .map_err(|_| CodecError::Truncated("metadata JSON is truncated or malformed".to_string()))?;
    Ok((metadata, &bytes[end..]))
}

fn read_segment_table(bytes: &[u8], n_segments: usize) -> CodecResult<(Vec<Segment>, &[u8])> {
    let needed = n_segments
        .checked_mul(SEGMENT_ENTRY_LEN)
        .ok_or_else(|| CodecError::InconsistentSizes("segment table size overflows".to_string()))?;
    if bytes.len() < needed {
        return Err(CodecError::Truncated(format!(
            "segment table requires {} bytes, got {}",
            needed,
            bytes.len()
        )));
    }

    let mut segments = Vec::with_capacity(n_segments);
    let mut cursor = Cursor::new(bytes);
    for _ in 0..n_segments {
        let start_idx = cursor.read_u32::<LittleEndian>().unwrap();
        let end_idx = cursor.read_u32::<LittleEndian>().unwrap();
        let predictor_type = cursor.read_u32::<LittleEndian>().unwrap();
        let _pad0 = cursor.read_u32::<LittleEndian>().unwrap();
        let _pad1 = cursor.read_u32::<LittleEndian>().unwrap();
        let _pad2 = cursor.read_u32::<LittleEndian>().unwrap();
        let mean = cursor.read_f64::<LittleEndian>().unwrap();
        let slope = cursor.read_f64::<LittleEndian>().unwrap();
        let intercept = cursor.read_f64::<LittleEndian>().unwrap();
        let quant_step = cursor.read_f64::<LittleEndian>().unwrap();
        let seed_value = cursor.read_f64::<LittleEndian>().unwrap();

        if end_idx < start_idx {
            return Err(CodecError::InconsistentSizes(format!(
                "segment end_idx {} is before start_idx {}",
                end_idx, start_idx
            )));
        }
        if quant_step <= 0.0 {
            return Err(CodecError::InconsistentSizes(
                "segment quant_step_Q must be positive".to_string(),
            ));
        }
        let predictor = PredictorKind::from_u32(predictor_type)?;

        segments.push(Segment {
            start_idx,
            end_idx,
            predictor,
            mean,
            slope,
            intercept,
            quant_step,
            seed_value,
        });
    }

    Ok((segments, &bytes[needed..]))
}

fn validate_tiling(segments: &[Segment], n_points: usize) -> CodecResult<()> {
    let mut expected_start: u64 = 0;
    for seg in segments {
        if seg.start_idx as u64 != expected_start {
            return Err(CodecError::InconsistentSizes(format!(
                "segment gap or overlap at index {}",
                expected_start
            )));
        }
        expected_start = seg.end_idx as u64 + 1;
    }
    if expected_start != n_points as u64 {
        return Err(CodecError::InconsistentSizes(format!(
            "segments cover {} of {} points",
            expected_start, n_points
        )));
    }
    Ok(())
}

fn read_residual_section_header(bytes: &[u8]) -> CodecResult<(ResidualCoding, &[u8])> {
    if bytes.len() < RESIDUAL_SECTION_HEADER_LEN {
        return Err(CodecError::Truncated(
            "residual section header is truncated".to_string(),
        ));
    }
    let mut cursor = Cursor::new(&bytes[..RESIDUAL_SECTION_HEADER_LEN]);
    let coding_type = cursor.read_u32::<LittleEndian>().unwrap();
    let coding = ResidualCoding::from_u32(coding_type)?;
    Ok((coding, &bytes[RESIDUAL_SECTION_HEADER_LEN..]))
}

/// Decodes one length-prefixed residual block, returning the quantized
/// residuals and the remainder of `bytes` after this block.
fn read_residual_block<'a>(
    bytes: &'a [u8],
    seg_id: usize,
    expected_seg_len: usize,
    coding: ResidualCoding,
) -> CodecResult<(Vec<i32>, &'a [u8])> {
    if bytes.len() < RESIDUAL_BLOCK_HEADER_LEN {
        return Err(CodecError::Truncated(format!(
            "residual block header for seg_id {} is truncated",
            seg_id
        )));
    }
    let mut cursor = Cursor::new(&bytes[..RESIDUAL_BLOCK_HEADER_LEN]);
    let block_seg_id = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let seg_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
    let byte_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;

    if block_seg_id != seg_id {
        return Err(CodecError::InconsistentSizes(format!(
            "residual block seg_id {} out of range (expected {})",
            block_seg_id, seg_id
        )));
    }
    if seg_len != expected_seg_len {
        return Err(CodecError::InconsistentSizes(format!(
            "segment {} length {} disagrees with decoded residual count {}",
            seg_id, expected_seg_len, seg_len
        )));
    }
    if coding == ResidualCoding::Raw && byte_len != 4 * seg_len {
        return Err(CodecError::InconsistentSizes(format!(
            "segment {} raw residual byte_len {} does not match 4*seg_len {}",
            seg_id,
            byte_len,
            4 * seg_len
        )));
    }

    let payload_start = RESIDUAL_BLOCK_HEADER_LEN;
    let payload_end = payload_start
        .checked_add(byte_len)
        .ok_or_else(|| CodecError::InconsistentSizes("byte_len overflows block offset".to_string()))?;
    if bytes.len() < payload_end {
        return Err(CodecError::Truncated(format!(
            "residual payload for seg_id {} is shorter than declared byte_len {}",
            seg_id, byte_len
        )));
    }
    let payload = &bytes[payload_start..payload_end];

    let values = match coding {
        ResidualCoding::Raw => {
            let mut cursor = Cursor::new(payload);
            let mut values = Vec::with_capacity(seg_len);
            for _ in 0..seg_len {
                values.push(cursor.read_i32::<LittleEndian>().unwrap());
            }
            values
        }
        ResidualCoding::Varint => {
            let (values, consumed) = decode_residuals(payload, seg_len)?;
            if consumed < payload.len() {
                log::warn!(
                    "seg_id {} varint block has {} trailing byte(s) after the {}th residual",
                    seg_id,
                    payload.len() - consumed,
                    seg_len
                );
            }
            values
        }
    };

    Ok((values, &bytes[payload_end..]))
}

/// Reconstructs one segment's samples from its stored predictor
/// parameters and dequantized residuals, in the order [`decode`] needs:
/// mean/linear positions are independent of prior samples, but
/// random-walk must accumulate in order starting from the seed.
fn reconstruct_segment(seg: &Segment, residuals: &[i32]) -> Vec<f64> {
    let n = residuals.len();
    match seg.predictor {
        PredictorKind::Mean => (0..n)
            .map(|i| seg.mean + dequantize(residuals[i], seg.quant_step))
            .collect(),
        PredictorKind::Linear => (0..n)
            .map(|i| seg.intercept + seg.slope * i as f64 + dequantize(residuals[i], seg.quant_step))
            .collect(),
        PredictorKind::RandomWalk => {
            let mut out = Vec::with_capacity(n);
            let mut prev = seg.seed_value;
            for (i, &qi) in residuals.iter().enumerate() {
                let pred = if i == 0 { seg.seed_value } else { prev };
                let val = pred + dequantize(qi, seg.quant_step);
                out.push(val);
                prev = val;
            }
            out
        }
    }
}

/// Reads headers and the segment table without decoding residual
/// payloads; residual blocks are skipped using their declared `byte_len`.
pub fn inspect(bytes: &[u8]) -> CodecResult<Inspection> {
    let header = read_file_header(bytes)?;
    let (metadata, rest) = read_metadata(bytes, &header)?;
    let (segments, rest) = read_segment_table(rest, header.n_segments)?;
    validate_tiling(&segments, header.n_points)?;
    let (coding, mut rest) = read_residual_section_header(rest)?;

    for (seg_id, seg) in segments.iter().enumerate() {
        if rest.len() < RESIDUAL_BLOCK_HEADER_LEN {
            return Err(CodecError::Truncated(format!(
                "residual block header for seg_id {} is truncated",
                seg_id
            )));
        }
        let mut cursor = Cursor::new(&rest[..RESIDUAL_BLOCK_HEADER_LEN]);
        let block_seg_id = cursor.read_u32::<LittleEndian>().unwrap() as usize;
        let seg_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
        let byte_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
        if block_seg_id != seg_id {
            return Err(CodecError::InconsistentSizes(format!(
                "residual block seg_id {} out of range (expected {})",
                block_seg_id, seg_id
            )));
        }
        if seg_len != seg.len() {
            return Err(CodecError::InconsistentSizes(format!(
                "segment {} length {} disagrees with declared residual count {}",
                seg_id, seg.len(), seg_len
            )));
        }
        let skip_to = RESIDUAL_BLOCK_HEADER_LEN
            .checked_add(byte_len)
            .ok_or_else(|| CodecError::InconsistentSizes("byte_len overflows block offset".to_string()))?;
        if rest.len() < skip_to {
            return Err(CodecError::Truncated(format!(
                "residual payload for seg_id {} is shorter than declared byte_len {}",
                seg_id, byte_len
            )));
        }
        rest = &rest[skip_to..];
    }

    Ok(Inspection {
        metadata,
        n_points: header.n_points,
        segments,
        coding,
    })
}

/// Decodes a full "LSG2 v1" byte buffer back into a [`TimeSeries`].
pub fn decode(bytes: &[u8]) -> CodecResult<TimeSeries> {
    let header = read_file_header(bytes)?;
    let (metadata, rest) = read_metadata(bytes, &header)?;
    let (segments, rest) = read_segment_table(rest, header.n_segments)?;
    validate_tiling(&segments, header.n_points)?;
    let (coding, mut rest) = read_residual_section_header(rest)?;

    let mut samples = vec![f64::NAN; header.n_points];
    for (seg_id, seg) in segments.iter().enumerate() {
        let (residuals, remainder) = read_residual_block(rest, seg_id, seg.len(), coding)?;
        rest = remainder;
        let values = reconstruct_segment(seg, &residuals);
        samples[seg.start_idx as usize..=seg.end_idx as usize].copy_from_slice(&values);
    }

    log::debug!(
        "decoded {} sample(s) from {} segment(s)",
        samples.len(),
        segments.len()
    );

    Ok(TimeSeries {
        samples,
        dt: metadata.dt,
        t0: metadata.t0,
        unit: metadata.unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(mode: SegmentMode, predictor: PredictorChoice, coding: ResidualCoding) -> EncodeOptions {
        EncodeOptions {
            segment_mode: mode,
            predictor,
            residual_coding: coding,
            c_q: DEFAULT_C_Q,
            q_min: DEFAULT_Q_MIN,
        }
    }

    #[test]
    fn scenario_linear_fixed_length_rmse_and_tiling() {
        let samples: Vec<f64> = (0..200).map(|i| 0.1 * i as f64).collect();
        let ts = TimeSeries::new(samples.clone(), 60.0, "2025-01-01T00:00:00Z", "kW");
        let options = opts(
            SegmentMode::Fixed { length: 50 },
            PredictorChoice::Linear,
            ResidualCoding::Raw,
        );
        let bytes = encode(&ts, &options).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.samples.len(), 200);

        let sse: f64 = decoded
            .samples
            .iter()
            .zip(samples.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        let rmse = (sse / 200.0).sqrt();
        assert!(rmse < 1e-6, "rmse was {}", rmse);

        let inspection = inspect(&bytes).unwrap();
        assert_eq!(inspection.segments.len(), 4);
        let mut expected_start = 0u32;
        for seg in &inspection.segments {
            assert_eq!(seg.start_idx, expected_start);
            expected_start = seg.end_idx + 1;
        }
        assert_eq!(expected_start, 200);
    }

    #[test]
    fn scenario_constant_mean_reconstructs_exactly() {
        let samples = vec![3.5; 100];
        let ts = TimeSeries::new(samples.clone(), 1.0, "t0", "u");
        let options = opts(
            SegmentMode::Fixed { length: 100 },
            PredictorChoice::Mean,
            ResidualCoding::Raw,
        );
        let bytes = encode(&ts, &options).unwrap();
        let decoded = decode(&bytes).unwrap();
        for (a, b) in decoded.samples.iter().zip(samples.iter()) {
            assert!((a - b).abs() <= 1e-6);
        }
    }

    #[test]
    fn truncating_output_fails_with_truncated() {
        let samples: Vec<f64> = (0..200).map(|i| 0.1 * i as f64).collect();
        let ts = TimeSeries::new(samples, 60.0, "t0", "u");
        let options = opts(
            SegmentMode::Fixed { length: 50 },
            PredictorChoice::Linear,
            ResidualCoding::Raw,
        );
        let bytes = encode(&ts, &options).unwrap();
        let truncated = &bytes[..10];
        let err = decode(truncated).unwrap_err();
        assert!(matches!(err, CodecError::Truncated(_)));
    }

    #[test]
    fn corrupt_magic_fails_with_invalid_format() {
        let samples: Vec<f64> = (0..200).map(|i| 0.1 * i as f64).collect();
        let ts = TimeSeries::new(samples, 60.0, "t0", "u");
        let options = opts(
            SegmentMode::Fixed { length: 50 },
            PredictorChoice::Linear,
            ResidualCoding::Raw,
        );
        let mut bytes = encode(&ts, &options).unwrap();
        bytes[0..4].copy_from_slice(b"XXXX");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat(_)));
    }

    #[test]
    fn oversized_n_points_is_rejected_before_allocating() {
        let samples: Vec<f64> = (0..200).map(|i| 0.1 * i as f64).collect();
        let ts = TimeSeries::new(samples, 60.0, "t0", "u");
        let options = opts(
            SegmentMode::Fixed { length: 50 },
            PredictorChoice::Linear,
            ResidualCoding::Raw,
        );
        let mut bytes = encode(&ts, &options).unwrap();
        let mut cursor = Cursor::new(&mut bytes[12..16]);
        cursor.write_u32::<LittleEndian>(20_000_000).unwrap();
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::InvalidInput(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        let ts = TimeSeries::new(Vec::new(), 1.0, "t0", "u");
        let err = encode(&ts, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidInput(_)));
    }

    #[test]
    fn encoding_is_deterministic() {
        let samples: Vec<f64> = (0..150).map(|i| (i as f64 * 0.05).sin() * 3.0).collect();
        let ts = TimeSeries::new(samples, 1.0, "t0", "u");
        let options = opts(
            SegmentMode::Adaptive {
                min_len: 10,
                max_len: 40,
                mse_threshold: 0.05,
            },
            PredictorChoice::Auto,
            ResidualCoding::Varint,
        );
        let bytes1 = encode(&ts, &options).unwrap();
        let bytes2 = encode(&ts, &options).unwrap();
        assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn auto_predictor_roundtrips_noisy_sine() {
        let samples: Vec<f64> = (0..300)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 50.0).sin())
            .collect();
        let ts = TimeSeries::new(samples.clone(), 1.0, "t0", "u");
        let options = opts(
            SegmentMode::Adaptive {
                min_len: 30,
                max_len: 80,
                mse_threshold: 0.2,
            },
            PredictorChoice::Auto,
            ResidualCoding::Varint,
        );
        let bytes = encode(&ts, &options).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.samples.len(), 300);
        let sse: f64 = decoded
            .samples
            .iter()
            .zip(samples.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        let rmse = (sse / 300.0).sqrt();
        assert!(rmse < 0.3, "rmse was {}", rmse);
    }

    #[test]
    fn metadata_round_trips_field_by_field() {
        let samples: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let ts = TimeSeries::new(samples, 60.0, "2025-01-01T00:00:00Z", "kW");
        let bytes = encode(&ts, &EncodeOptions::default()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.dt, ts.dt);
        assert_eq!(decoded.t0, ts.t0);
        assert_eq!(decoded.unit, ts.unit);
    }
}
