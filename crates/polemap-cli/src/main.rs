//! `polemap` — command-line front end for the pole registry engine.
//!
//! Works against a JSON inventory snapshot so the resolution and scoring
//! flows can be exercised without the web application.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use polemap_core::{
    AttemptKind, EvidenceFlags, GeoPoint, LocationSource, PoleId, RegistrationAttempt, distance_m,
    normalize,
};
use polemap_engine::{
    Decision, MatcherConfig, ProximityMatcher, Resolution, RewardCalculator, ScoringConfig,
};
use polemap_store::{MemoryLedger, snapshot};

#[derive(Parser)]
#[command(name = "polemap", about = "Pole identity resolution and scoring tools")]
struct Cli {
    /// Inventory snapshot file.
    #[arg(long, global = true, default_value = "poles.json", env = "POLEMAP_SNAPSHOT")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Gps,
    Manual,
}

impl From<Source> for LocationSource {
    fn from(s: Source) -> Self {
        match s {
            Source::Gps => LocationSource::Gps,
            Source::Manual => LocationSource::Manual,
        }
    }
}

#[derive(clap::Args)]
struct AttemptArgs {
    #[arg(long)]
    lat: f64,
    #[arg(long)]
    lon: f64,
    #[arg(long, value_enum, default_value = "gps")]
    source: Source,
    /// Plate identifier(s), repeatable.
    #[arg(long = "id")]
    identifiers: Vec<String>,
    #[arg(long)]
    plate_photo: bool,
    #[arg(long)]
    full_photo: bool,
    #[arg(long)]
    detail_photo: bool,
    #[arg(long)]
    contribution_id: String,
}

impl AttemptArgs {
    fn into_attempt(self, kind: AttemptKind) -> RegistrationAttempt {
        RegistrationAttempt {
            kind,
            location: GeoPoint::new(self.lat, self.lon),
            location_source: self.source.into(),
            plate_count: self.identifiers.len() as u32,
            identifiers: self.identifiers,
            photo_evidence: EvidenceFlags {
                plate: self.plate_photo,
                full: self.full_photo,
                detail: self.detail_photo,
            },
            contribution_id: self.contribution_id,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical form of raw plate text.
    Normalize { raw: String },

    /// Great-circle distance in metres between two points.
    Distance {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
    },

    /// Exact canonical-identifier search in the snapshot.
    Find { identifier: String },

    /// Resolve a registration attempt against the snapshot.
    Resolve {
        #[command(flatten)]
        attempt: AttemptArgs,
        /// "same:<pole-id>" or "different", once candidates are known.
        #[arg(long)]
        decision: Option<String>,
    },

    /// Score a registration attempt (stateless demo ledger).
    Score {
        #[command(flatten)]
        attempt: AttemptArgs,
    },
}

fn parse_decision(raw: &str) -> Result<Decision> {
    if raw == "different" {
        return Ok(Decision::Different);
    }
    if let Some(id) = raw.strip_prefix("same:") {
        let id: u64 = id.parse().context("decision target must be a pole id")?;
        return Ok(Decision::Same {
            target: PoleId(id),
        });
    }
    bail!("decision must be \"same:<pole-id>\" or \"different\", got {raw:?}");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Normalize { raw } => {
            println!("{}", normalize(&raw));
        }

        Command::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => {
            let d = distance_m(GeoPoint::new(lat1, lon1), GeoPoint::new(lat2, lon2));
            println!("{d:.2} m");
        }

        Command::Find { identifier } => {
            let inventory = snapshot::load(&cli.snapshot)?;
            let matcher = ProximityMatcher::new(&inventory, MatcherConfig::default());
            let record = matcher
                .find_by_identifier(&identifier)
                .with_context(|| format!("searching for {identifier:?}"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Resolve { attempt, decision } => {
            let inventory = snapshot::load(&cli.snapshot)?;
            let matcher = ProximityMatcher::new(&inventory, MatcherConfig::default());
            let attempt = attempt.into_attempt(AttemptKind::NewPole);
            let decision = decision.as_deref().map(parse_decision).transpose()?;

            let resolution = matcher.resolve(&attempt, decision)?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);

            match resolution {
                Resolution::New { .. } | Resolution::Merged { .. } => {
                    snapshot::save(&cli.snapshot, &inventory)?;
                }
                Resolution::AwaitingDecision { ref candidates } => {
                    info!(
                        count = candidates.len(),
                        "re-run with --decision to settle the attempt"
                    );
                }
            }
        }

        Command::Score { attempt } => {
            let ledger = MemoryLedger::new();
            let calculator = RewardCalculator::new(&ledger, ScoringConfig::default());
            let attempt = attempt.into_attempt(AttemptKind::NewPole);
            let breakdown = calculator.compute_points(&attempt, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
    }

    Ok(())
}
