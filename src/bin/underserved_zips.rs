//! Underserved ZIP Code Analysis
//!
//! Reads a JSON bundle of already-prepared inputs (site coordinates, wait
//! times, distance matrix, ZIP polygons), runs the weighted persistent
//! homology analysis and writes the per-ZIP report as JSON.
//!
//! # Usage
//!
//! ```bash
//! underserved_zips --input bundle.json --output report.json
//! underserved_zips --input bundle.json --config analysis.json --scale 2.0
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ndarray::Array2;
use serde::Deserialize;
use tracing::{error, info};

use tda_underserved::{
    AnalysisConfig, AnalysisInput, RankBy, RegionRecord, Site, UnderservedAnalysis, ZipRegion,
};

#[derive(Parser, Debug)]
#[command(
    name = "underserved_zips",
    version,
    about = "Flag ZIP codes that intersect persistent coverage gaps between service sites"
)]
struct Args {
    /// Input bundle (sites, weights, distances, regions).
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// JSON analysis configuration; defaults are used if omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report destination; printed to stdout if omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the filtration scale (2.0 = simplex-tree convention).
    #[arg(long)]
    scale: Option<f64>,

    /// Ignore wait times and use plain distances.
    #[arg(long, default_value_t = false)]
    unweighted: bool,

    /// Rank death triangles by their filtration value instead of persistence.
    #[arg(long, default_value_t = false)]
    rank_by_death: bool,

    /// Keep only the N most persistent triangles.
    #[arg(long)]
    max_triangles: Option<usize>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    #[serde(default)]
    name: Option<String>,
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, Deserialize)]
struct Bundle {
    sites: Vec<SiteEntry>,
    weights: Vec<f64>,
    distances: Vec<Vec<f64>>,
    regions: Vec<RegionRecord>,
}

impl Bundle {
    fn into_input(self) -> Result<AnalysisInput> {
        let n = self.distances.len();
        if let Some((row, values)) = self.distances.iter().enumerate().find(|(_, r)| r.len() != n) {
            bail!("distance matrix row {} has {} entries, expected {}", row, values.len(), n);
        }
        let flat: Vec<f64> = self.distances.into_iter().flatten().collect();
        let distances = Array2::from_shape_vec((n, n), flat).context("shaping distance matrix")?;

        if self.weights.len() != self.sites.len() {
            bail!(
                "bundle has {} sites but {} weights",
                self.sites.len(),
                self.weights.len()
            );
        }
        let sites: Vec<Site> = self
            .sites
            .into_iter()
            .zip(self.weights)
            .enumerate()
            .map(|(id, (entry, weight))| {
                let site = Site::new(id, entry.longitude, entry.latitude, weight);
                match entry.name {
                    Some(name) => site.with_name(name),
                    None => site,
                }
            })
            .collect();
        let regions: Vec<ZipRegion> = self.regions.into_iter().map(ZipRegion::from).collect();

        let input = AnalysisInput {
            sites,
            distances,
            regions,
        };
        Ok(input)
    }
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(scale) = args.scale {
        config.filtration_scale = scale;
    }
    if args.unweighted {
        config.use_weights = false;
    }
    if args.rank_by_death {
        config.rank_by = RankBy::DeathFiltration;
    }
    if args.max_triangles.is_some() {
        config.max_triangles = args.max_triangles;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    info!("Loading input bundle from {}", args.input.display());
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let bundle: Bundle = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    let input = bundle.into_input()?;
    info!("  sites  : {}", input.sites.len());
    info!("  regions: {}", input.regions.len());

    let report = UnderservedAnalysis::new(config).run(&input)?;
    let json = serde_json::to_string_pretty(&report).context("serialising report")?;

    let Some(path) = &args.output else {
        println!("{}", json);
        return Ok(());
    };
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;

    println!("═══════════════════════════════════════════════════════════════");
    println!("  Underserved ZIP Analysis");
    println!("═══════════════════════════════════════════════════════════════\n");
    println!("Death triangles (H1): {}", report.diagnostics.h1_selected);
    println!(
        "UNDERSERVED:     {:5} ({:.1}%)",
        report.summary.underserved, report.summary.underserved_percentage
    );
    println!("NOT UNDERSERVED: {:5}", report.summary.not_underserved);
    if report.diagnostics.skipped_triangles + report.diagnostics.skipped_regions > 0 {
        println!(
            "Skipped: {} triangles, {} regions",
            report.diagnostics.skipped_triangles, report.diagnostics.skipped_regions
        );
    }

    let sample: Vec<_> = report.underserved().take(5).collect();
    if !sample.is_empty() {
        println!("\nSample UNDERSERVED regions:");
        for r in sample {
            println!("  {} - {} ({} triangles)", r.region_id, r.name, r.intersecting_count);
        }
    }
    println!("\nReport written to {}", path.display());
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        error!("Analysis failed: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(sites: &str) -> Bundle {
        let text = format!(
            r#"{{
                "sites": {},
                "weights": [0.0, 5.0, 2.0],
                "distances": [[0.0, 1.0, 2.0], [1.0, 0.0, 1.5], [2.0, 1.5, 0.0]],
                "regions": [{{"id": "94607", "polygons": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]]}}]
            }}"#,
            sites
        );
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_partially_named_sites_keep_their_names() {
        let input = bundle(
            r#"[{"name": "Oakland", "longitude": 0.0, "latitude": 0.0},
                {"name": "Fresno", "longitude": 1.0, "latitude": 0.0},
                {"longitude": 0.5, "latitude": 1.0}]"#,
        )
        .into_input()
        .unwrap();

        let labels: Vec<String> = input.sites.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Oakland", "Fresno", "site 2"]);
        assert_eq!(input.sites[1].weight, 5.0);
        assert_eq!(input.regions.len(), 1);
    }

    #[test]
    fn test_weight_count_must_match_sites() {
        let err = bundle(r#"[{"longitude": 0.0, "latitude": 0.0}]"#)
            .into_input()
            .unwrap_err();
        assert!(err.to_string().contains("1 sites but 3 weights"));
    }
}
