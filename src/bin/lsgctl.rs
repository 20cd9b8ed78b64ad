// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! A thin debug binary for exercising the codec by hand. The command-line
//! front-end and CSV wrapping are explicitly out of scope for the codec
//! itself (see the crate's top-level documentation); this binary exists
//! only so the library can be poked at manually, the way claxon ships
//! `src/bin/decode.rs` and `src/bin/debug.rs` alongside the library.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lsgcodec::{decode, encode, inspect, EncodeOptions, PredictorChoice, ResidualCoding, SegmentMode, TimeSeries};

#[derive(Parser)]
#[command(name = "lsgctl", about = "Encode, decode, and inspect LSG2 containers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a single-column CSV of samples into an LSG2 file.
    Encode {
        input_csv: PathBuf,
        output_lsg2: PathBuf,
        #[arg(long, default_value_t = 256)]
        segment_length: usize,
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
        #[arg(long, default_value = "1970-01-01T00:00:00Z")]
        t0: String,
        #[arg(long, default_value = "")]
        unit: String,
    },
    /// Decode an LSG2 file back into a single-column CSV.
    Decode {
        input_lsg2: PathBuf,
        output_csv: PathBuf,
    },
    /// Print the header, metadata, and segment table of an LSG2 file.
    Inspect { input_lsg2: PathBuf },
}

fn run() -> Result<(), String> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Encode {
            input_csv,
            output_lsg2,
            segment_length,
            dt,
            t0,
            unit,
        } => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .from_path(&input_csv)
                .map_err(|e| format!("failed to open {}: {}", input_csv.display(), e))?;
            let mut samples = Vec::new();
            for record in reader.records() {
                let record = record.map_err(|e| format!("failed to read CSV record: {}", e))?;
                let field = record
                    .get(0)
                    .ok_or_else(|| "CSV record has no fields".to_string())?;
                let value: f64 = field
                    .trim()
                    .parse()
                    .map_err(|e| format!("failed to parse \"{}\" as a number: {}", field, e))?;
                samples.push(value);
            }

            let ts = TimeSeries::new(samples, dt, t0, unit);
            let options = EncodeOptions {
                segment_mode: SegmentMode::Fixed {
                    length: segment_length,
                },
                predictor: PredictorChoice::Auto,
                residual_coding: ResidualCoding::Varint,
                ..EncodeOptions::default()
            };
            let bytes = encode(&ts, &options).map_err(|e| e.to_string())?;
            fs::write(&output_lsg2, bytes)
                .map_err(|e| format!("failed to write {}: {}", output_lsg2.display(), e))?;
            println!("wrote {} sample(s) to {}", ts.len(), output_lsg2.display());
            Ok(())
        }
        Command::Decode {
            input_lsg2,
            output_csv,
        } => {
            let bytes = fs::read(&input_lsg2)
                .map_err(|e| format!("failed to read {}: {}", input_lsg2.display(), e))?;
            let ts = decode(&bytes).map_err(|e| e.to_string())?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&output_csv)
                .map_err(|e| format!("failed to open {}: {}", output_csv.display(), e))?;
            for sample in &ts.samples {
                writer
                    .write_record(&[sample.to_string()])
                    .map_err(|e| format!("failed to write CSV record: {}", e))?;
            }
            writer.flush().map_err(|e| e.to_string())?;
            println!("wrote {} sample(s) to {}", ts.samples.len(), output_csv.display());
            Ok(())
        }
        Command::Inspect { input_lsg2 } => {
            let bytes = fs::read(&input_lsg2)
                .map_err(|e| format!("failed to read {}: {}", input_lsg2.display(), e))?;
            let inspection = inspect(&bytes).map_err(|e| e.to_string())?;
            println!("n_points:    {}", inspection.n_points);
            println!("n_segments:  {}", inspection.segments.len());
            println!("coding:      {:?}", inspection.coding);
            println!("dt:          {}", inspection.metadata.dt);
            println!("t0:          {}", inspection.metadata.t0);
            println!("unit:        {}", inspection.metadata.unit);
            for (i, seg) in inspection.segments.iter().enumerate() {
                println!(
                    "  segment {:>6}: [{}, {}] predictor={:?} Q={:.6}",
                    i, seg.start_idx, seg.end_idx, seg.predictor, seg.quant_step
                );
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("lsgctl: {}", message);
            ExitCode::FAILURE
        }
    }
}
