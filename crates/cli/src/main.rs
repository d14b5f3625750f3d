//! Roadgen CLI - road network generalization

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geo::Geometry;
use geojson::{FeatureCollection, GeoJson};
use roadgen_algorithms::lines::{average_linestrings, AverageLinesParams};
use roadgen_algorithms::road::{
    collapse_dual_carriageways, remove_crossroads, remove_culdesacs, remove_roundabouts,
    CollapseDualCarriagewaysParams, RemoveCrossroadsParams, RemoveCuldesacsParams,
    RemoveRoundaboutsParams,
};
use roadgen_core::feature::{AttributeValue, Feature, Fields, Predicate};
use roadgen_core::feedback::Feedback;
use roadgen_core::stream::{FeatureSource, MemorySink, MemorySource};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "roadgen")]
#[command(author, version, about = "Road network generalization", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a GeoJSON file
    Info {
        /// Input GeoJSON file
        input: PathBuf,
    },
    /// Road network generalization passes
    Road {
        #[command(subcommand)]
        algorithm: RoadCommands,
    },
    /// Line collection operations
    Lines {
        #[command(subcommand)]
        algorithm: LinesCommands,
    },
}

// ─── Road subcommands ───────────────────────────────────────────────────

#[derive(Subcommand)]
enum RoadCommands {
    /// Collapse roundabouts to their centroids
    RemoveRoundabouts {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Roundabout classification as FIELD=VALUE
        #[arg(long)]
        by: String,
    },
    /// Remove short dead-end roads
    RemoveCuldesacs {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Maximum cul-de-sac length in map units
        #[arg(short, long, default_value = "100.0")]
        threshold: f64,
    },
    /// Remove short link roads where dual carriageways cross
    RemoveCrossroads {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Comma-separated attribute fields that must match
        #[arg(short, long)]
        fields: String,
        /// Maximum link length in map units
        #[arg(short, long, default_value = "30.0")]
        threshold: f64,
    },
    /// Merge paired carriageways into a single centerline
    CollapseDualCarriageways {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
        /// Comma-separated attribute fields that must match
        #[arg(short, long)]
        fields: String,
        /// Maximum pairing distance in map units
        #[arg(short, long, default_value = "30.0")]
        threshold: f64,
    },
}

// ─── Lines subcommands ──────────────────────────────────────────────────

#[derive(Subcommand)]
enum LinesCommands {
    /// Average all input linestrings into one line
    Average {
        /// Input GeoJSON file
        #[arg(short, long)]
        input: PathBuf,
        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Feedback forwarding progress to an indicatif bar and info messages to
/// the terminal.
struct CliFeedback {
    bar: ProgressBar,
}

impl CliFeedback {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos:>3}%")
                .unwrap(),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Feedback for CliFeedback {
    fn is_canceled(&self) -> bool {
        false
    }

    fn set_progress(&self, percent: f64) {
        self.bar.set_position(percent.clamp(0.0, 100.0) as u64);
    }

    fn push_info(&self, message: &str) {
        self.bar.println(message.to_string());
    }
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Parse a FIELD=VALUE classification into a predicate over the schema.
fn parse_predicate(fields: &Fields, by: &str) -> Result<Predicate> {
    let Some((name, value)) = by.split_once('=') else {
        bail!("Classification must be FIELD=VALUE, got: {}", by);
    };
    let value = parse_value(value);
    Predicate::field_equals(fields, name, value)
        .with_context(|| format!("Unknown field in classification: {}", name))
}

/// Parse a literal the way GeoJSON properties type them: integer, float,
/// boolean, then string.
fn parse_value(s: &str) -> AttributeValue {
    if let Ok(i) = s.parse::<i64>() {
        return AttributeValue::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return AttributeValue::Float(f);
    }
    match s {
        "true" => AttributeValue::Bool(true),
        "false" => AttributeValue::Bool(false),
        _ => AttributeValue::String(s.to_string()),
    }
}

fn parse_field_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

// ─── GeoJSON I/O ────────────────────────────────────────────────────────

fn json_to_attribute(value: &serde_json::Value) -> AttributeValue {
    match value {
        serde_json::Value::Null => AttributeValue::Null,
        serde_json::Value::Bool(b) => AttributeValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n
                .as_f64()
                .map(AttributeValue::Float)
                .unwrap_or(AttributeValue::Null),
        },
        serde_json::Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> serde_json::Value {
    match value {
        AttributeValue::Null => serde_json::Value::Null,
        AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
        AttributeValue::Int(i) => serde_json::Value::from(*i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        AttributeValue::String(s) => serde_json::Value::String(s.clone()),
    }
}

/// Read a GeoJSON feature collection into an in-memory source.
///
/// The field schema is the union of all property keys, in first-seen
/// order; features missing a property carry a null attribute.
fn read_features(path: &PathBuf) -> Result<MemorySource> {
    let pb = spinner("Reading features...");
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = contents.parse().context("Failed to parse GeoJSON")?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        bail!("Expected a GeoJSON FeatureCollection");
    };

    let mut names: Vec<String> = Vec::new();
    for feature in &collection.features {
        if let Some(props) = &feature.properties {
            for key in props.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
    }
    let fields = Fields::new(names);

    let mut features = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.into_iter().enumerate() {
        let geometry = feature
            .geometry
            .with_context(|| format!("Feature {} has no geometry", i))?;
        let geometry: Geometry<f64> = Geometry::try_from(geometry.value)
            .with_context(|| format!("Feature {} has an unsupported geometry", i))?;
        let attributes = fields
            .names()
            .iter()
            .map(|name| {
                feature
                    .properties
                    .as_ref()
                    .and_then(|props| props.get(name))
                    .map(json_to_attribute)
                    .unwrap_or(AttributeValue::Null)
            })
            .collect();
        features.push(Feature::new((i + 1) as u64, attributes, geometry));
    }

    pb.finish_and_clear();
    info!("Input: {} features", features.len());
    Ok(MemorySource::new(fields, features))
}

/// Write features back out as a GeoJSON feature collection.
fn write_features(features: &[Feature], fields: &Fields, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    let collection = FeatureCollection {
        bbox: None,
        features: features
            .iter()
            .map(|feature| {
                let mut properties = serde_json::Map::new();
                for (name, value) in fields.names().iter().zip(&feature.attributes) {
                    properties.insert(name.clone(), attribute_to_json(value));
                }
                geojson::Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(
                        &feature.geometry,
                    ))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect(),
        foreign_members: None,
    };
    std::fs::write(path, GeoJson::FeatureCollection(collection).to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

/// Run one pass end to end: read, execute, write, report.
fn run_pass<F>(name: &str, input: &PathBuf, output: &PathBuf, pass: F) -> Result<()>
where
    F: FnOnce(&MemorySource, &mut MemorySink, &CliFeedback) -> roadgen_core::Result<()>,
{
    let source = read_features(input)?;
    let fields = source.fields().clone();
    let feedback = CliFeedback::new();
    let mut sink = MemorySink::default();

    let start = Instant::now();
    let result = pass(&source, &mut sink, &feedback);
    feedback.finish();
    result.with_context(|| format!("{} failed", name))?;
    let elapsed = start.elapsed();

    info!("Output: {} features", sink.features.len());
    write_features(&sink.features, &fields, output)?;
    done(name, output, elapsed);
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let source = read_features(&input)?;
            println!("File: {}", input.display());
            println!("Features: {}", source.feature_count());
            println!("Fields: {}", source.fields().names().join(", "));

            let mut lines = 0usize;
            let mut multilines = 0usize;
            let mut other = 0usize;
            for feature in source.features() {
                match feature.geometry {
                    Geometry::LineString(_) => lines += 1,
                    Geometry::MultiLineString(_) => multilines += 1,
                    _ => other += 1,
                }
            }
            println!("Geometry: {} linestrings, {} multi, {} other", lines, multilines, other);
        }

        // ── Road ─────────────────────────────────────────────────────
        Commands::Road { algorithm } => match algorithm {
            RoadCommands::RemoveRoundabouts { input, output, by } => {
                run_pass("Remove roundabouts", &input, &output, |source, sink, fb| {
                    let predicate = parse_predicate(source.fields(), &by)
                        .map_err(|e| roadgen_core::Error::InvalidInput(e.to_string()))?;
                    remove_roundabouts(source, sink, RemoveRoundaboutsParams { predicate }, fb)
                })?;
            }
            RoadCommands::RemoveCuldesacs {
                input,
                output,
                threshold,
            } => {
                run_pass("Remove cul-de-sacs", &input, &output, |source, sink, fb| {
                    remove_culdesacs(source, sink, RemoveCuldesacsParams { threshold }, fb)
                })?;
            }
            RoadCommands::RemoveCrossroads {
                input,
                output,
                fields,
                threshold,
            } => {
                let fields = parse_field_list(&fields);
                run_pass("Remove cross roads", &input, &output, |source, sink, fb| {
                    remove_crossroads(
                        source,
                        sink,
                        RemoveCrossroadsParams { fields, threshold },
                        fb,
                    )
                })?;
            }
            RoadCommands::CollapseDualCarriageways {
                input,
                output,
                fields,
                threshold,
            } => {
                let fields = parse_field_list(&fields);
                run_pass(
                    "Collapse dual carriageways",
                    &input,
                    &output,
                    |source, sink, fb| {
                        collapse_dual_carriageways(
                            source,
                            sink,
                            CollapseDualCarriagewaysParams { fields, threshold },
                            fb,
                        )
                    },
                )?;
            }
        },

        // ── Lines ────────────────────────────────────────────────────
        Commands::Lines { algorithm } => match algorithm {
            LinesCommands::Average { input, output } => {
                run_pass("Average lines", &input, &output, |source, sink, fb| {
                    average_linestrings(source, sink, AverageLinesParams, fb)
                })?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("42"), AttributeValue::Int(42));
        assert_eq!(parse_value("1.5"), AttributeValue::Float(1.5));
        assert_eq!(parse_value("true"), AttributeValue::Bool(true));
        assert_eq!(
            parse_value("roundabout"),
            AttributeValue::String("roundabout".into())
        );
    }

    #[test]
    fn test_parse_field_list() {
        assert_eq!(
            parse_field_list("name, class ,lanes"),
            vec!["name".to_string(), "class".to_string(), "lanes".to_string()]
        );
        assert!(parse_field_list("").is_empty());
    }

    #[test]
    fn test_parse_predicate_rejects_bad_shape() {
        let fields = Fields::new(vec!["kind".into()]);
        assert!(parse_predicate(&fields, "kind").is_err());
        assert!(parse_predicate(&fields, "kind=roundabout").is_ok());
    }

    #[test]
    fn test_json_attribute_round_trip() {
        let values = vec![
            AttributeValue::Null,
            AttributeValue::Bool(true),
            AttributeValue::Int(-3),
            AttributeValue::Float(2.25),
            AttributeValue::String("main".into()),
        ];
        for v in values {
            assert_eq!(json_to_attribute(&attribute_to_json(&v)), v);
        }
    }
}
