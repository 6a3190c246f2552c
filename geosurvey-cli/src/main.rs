//! Command-line harness for the measurement engine: loads a polygon and a
//! flat-terrain stand-in for the body oracle from a JSON fixture, runs
//! `compute`, and prints the result.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use geosurvey_core::body::FlatBody;
use geosurvey_core::persistence::LngLat;
use geosurvey_core::session::ComputeOutput;
use geosurvey_core::settings::Settings;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(about = "Measure the area and volume of a polygon drawn on a spherical body")]
struct Cli {
    /// Path to a JSON fixture: { "radius", "flat_height", "corners": [...], "settings": {...} }
    fixture: PathBuf,

    /// Emit the full settings-resolved `ComputeOutput` as JSON instead of
    /// a human-readable summary.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    radius: f64,
    #[serde(default)]
    flat_height: f64,
    corners: Vec<LngLat>,
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Serialize)]
struct Report {
    area: f64,
    pvol: f64,
    nvol: f64,
    mesh_segment_count: usize,
    diagnostics: DiagnosticsReport,
}

#[derive(Debug, Serialize)]
struct DiagnosticsReport {
    polygon_too_large: bool,
    edge_recovery_exhausted: bool,
    oracle_failures: u32,
    refinement_budget_exhausted: bool,
    warnings: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let fixture_text = match fs::read_to_string(&cli.fixture) {
        Ok(text) => text,
        Err(err) => {
            log::error!("failed to read {}: {err}", cli.fixture.display());
            return ExitCode::FAILURE;
        }
    };
    let fixture: Fixture = match serde_json::from_str(&fixture_text) {
        Ok(fixture) => fixture,
        Err(err) => {
            log::error!("failed to parse {}: {err}", cli.fixture.display());
            return ExitCode::FAILURE;
        }
    };

    let body = FlatBody {
        height: fixture.flat_height,
    };
    let output = match geosurvey_core::compute(&fixture.corners, fixture.radius, &body, &fixture.settings) {
        Ok(output) => output,
        Err(err) => {
            log::error!("compute failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        print_json(&output);
    } else {
        print_summary(&output);
    }
    ExitCode::SUCCESS
}

fn print_summary(output: &ComputeOutput) {
    println!("area:   {:.3} m^2", output.area);
    println!("pvol:   {:.3} m^3", output.pvol);
    println!("nvol:   {:.3} m^3", output.nvol);
    println!("mesh:   {} segments", output.mesh_segments.len());
    if output.diagnostics.polygon_too_large {
        println!("warning: polygon too large for this body");
    }
    if output.diagnostics.edge_recovery_exhausted {
        println!("warning: edge recovery did not converge");
    }
    if output.diagnostics.refinement_budget_exhausted {
        println!("warning: refinement stopped on a budget, not convergence");
    }
    if output.diagnostics.oracle_failures > 0 {
        println!("warning: {} terrain samples failed", output.diagnostics.oracle_failures);
    }
}

fn print_json(output: &ComputeOutput) {
    let report = Report {
        area: output.area,
        pvol: output.pvol,
        nvol: output.nvol,
        mesh_segment_count: output.mesh_segments.len(),
        diagnostics: DiagnosticsReport {
            polygon_too_large: output.diagnostics.polygon_too_large,
            edge_recovery_exhausted: output.diagnostics.edge_recovery_exhausted,
            oracle_failures: output.diagnostics.oracle_failures,
            refinement_budget_exhausted: output.diagnostics.refinement_budget_exhausted,
            warnings: output.diagnostics.warnings.clone(),
        },
    };
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(err) => log::error!("failed to serialize report: {err}"),
    }
}
