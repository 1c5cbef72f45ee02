//! lembed CLI - layout embedding command-line tool.
//!
//! Usage: lembed <COMMAND> [OPTIONS]
//!
//! Run `lembed --help` for available commands. Log verbosity follows
//! `RUST_LOG` (default `info`, `-v` for `debug`).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lembed::algo::branch_and_bound::{embed_branch_and_bound_with_progress, BranchAndBoundSettings};
use lembed::algo::greedy::{
    embed_greedy_brute_force_with_progress, embed_greedy_with_progress, BruteForceOptions, GreedySettings,
};
use lembed::algo::landmarks::match_by_proximity;
use lembed::algo::Progress;
use lembed::embed::{Embedding, EmbeddingInput, EmbeddingOptions};
use lembed::io;
use lembed::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "lembed")]
#[command(author, version, about = "Layout embedding CLI", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a layout mesh into a target mesh
    Embed {
        /// Layout mesh file (OBJ)
        layout: PathBuf,

        /// Target mesh file (OBJ, triangles only)
        target: PathBuf,

        /// Output file stem; writes OUT.lem, OUT.inp and their meshes
        #[arg(short, long, default_value = "embedding")]
        output: PathBuf,

        /// Embedding algorithm
        #[arg(short, long, value_enum, default_value = "bnb")]
        algorithm: Algorithm,

        /// Time limit for branch and bound, in seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Relative optimality gap for branch and bound
        #[arg(long, default_value = "0.0")]
        optimality_gap: f64,

        /// Exponent applied to path lengths
        #[arg(long, default_value = "1.0")]
        norm: f64,

        /// `proximity` or an .inp file whose landmarks are used
        #[arg(long, default_value = "proximity")]
        landmarks: String,

        /// Use single-threaded execution for brute force
        #[arg(long)]
        sequential: bool,
    },

    /// Display information about a saved embedding
    Info {
        /// Embedding file (.lem)
        input: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    /// Branch and bound
    Bnb,
    /// Greedy, default settings
    Greedy,
    /// Greedy with swirl detection
    Praun,
    /// Greedy with vertex-repulsive tracing and extremal vertices first
    Kraevoy,
    /// Greedy with vertex-repulsive tracing in arbitrary order
    Schreiner,
    /// Best of all greedy variants
    BruteForce,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Embed {
            layout,
            target,
            output,
            algorithm,
            time_limit,
            optimality_gap,
            norm,
            landmarks,
            sequential,
        } => {
            let time_limit = match time_limit {
                Some(secs) if !(secs >= 0.0 && secs.is_finite()) => {
                    return Err(format!("invalid time limit: {}", secs).into());
                }
                secs => secs.map(Duration::from_secs_f64),
            };
            let bnb = BranchAndBoundSettings {
                time_limit,
                optimality_gap,
                ..Default::default()
            };
            cmd_embed(&layout, &target, &output, algorithm, &bnb, norm, &landmarks, sequential)?;
        }

        Commands::Info { input } => {
            cmd_info(&input)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only ever increase, sub-tasks may restart their own counts.
        let (percent, increased) = loop {
            let old_max = max_percent.load(Ordering::Relaxed);
            let new_max = old_max.max(raw_percent);
            if new_max == old_max {
                break (old_max, false);
            }
            match max_percent.compare_exchange_weak(old_max, new_max, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break (new_max, true),
                Err(_) => continue,
            }
        };

        if !increased && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        eprint!("\r[{}{}] {:3}% {}", "=".repeat(filled), " ".repeat(bar_width - filled), percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn load_input(
    layout: &Path,
    target: &Path,
    landmarks: &str,
) -> Result<EmbeddingInput, Box<dyn std::error::Error>> {
    let layout: HalfEdgeMesh = io::load(layout)?;
    let target: HalfEdgeMesh = io::load(target)?;
    println!(
        "Loaded: layout {} vertices / {} edges, target {} vertices / {} faces",
        layout.num_vertices(),
        layout.num_edges(),
        target.num_vertices(),
        target.num_faces()
    );

    let landmarks = if landmarks == "proximity" {
        match_by_proximity(&layout, &target)?
    } else {
        let from_file: EmbeddingInput = EmbeddingInput::load(landmarks)?;
        from_file.landmarks
    };
    Ok(EmbeddingInput::new(layout, target, landmarks)?)
}

#[allow(clippy::too_many_arguments)]
fn cmd_embed(
    layout: &Path,
    target: &Path,
    output: &Path,
    algorithm: Algorithm,
    bnb: &BranchAndBoundSettings,
    norm: f64,
    landmarks: &str,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = load_input(layout, target, landmarks)?;
    let options = EmbeddingOptions::default().with_path_length_norm(norm);
    let mut em = Embedding::with_options(input, options)?;

    let progress = create_progress();
    let start = Instant::now();
    let cost = match algorithm {
        Algorithm::Bnb => {
            println!(
                "Running branch and bound (time limit {:?}, gap {})...",
                bnb.time_limit, bnb.optimality_gap
            );
            let result = embed_branch_and_bound_with_progress(&mut em, bnb, &progress)?;
            println!(
                "Stopped: {:?} after {} nodes, lower bound {:.6}, gap {:.4}",
                result.termination, result.nodes_expanded, result.lower_bound, result.gap
            );
            result.cost
        }
        Algorithm::BruteForce => {
            let options = BruteForceOptions::default().with_parallel(!sequential);
            let mode = if sequential { "sequential" } else { "parallel" };
            println!("Running all greedy variants ({})...", mode);
            let best = embed_greedy_brute_force_with_progress(&mut em, &GreedySettings::default(), &options, &progress)?;
            println!("Best variant: {:?}", best.settings);
            best.result.total_cost
        }
        greedy => {
            let settings = match greedy {
                Algorithm::Praun => GreedySettings::praun(),
                Algorithm::Kraevoy => GreedySettings::kraevoy(),
                Algorithm::Schreiner => GreedySettings::schreiner(),
                _ => GreedySettings::default(),
            };
            println!("Running greedy ({:?})...", greedy);
            embed_greedy_with_progress(&mut em, &settings, &progress)?.total_cost
        }
    };
    let elapsed = start.elapsed();

    println!("Total path length: {:.6}", cost);
    em.save(output)?;
    info!(output = %output.display(), elapsed_ms = elapsed.as_millis() as u64, "embedding saved");
    println!("Saved: {}.lem ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let em: Embedding = Embedding::load(input)?;
    let layout = em.layout();

    println!("File: {}", input.display());
    println!("Layout: {} vertices, {} edges, {} faces", layout.num_vertices(), layout.num_edges(), layout.num_faces());

    println!("\nEdges:");
    for l_e in layout.edge_ids() {
        let l_he = l_e.halfedge(0);
        let (from, to) = (layout.origin(l_he).index(), layout.dest(l_he).index());
        if em.is_embedded(l_e) {
            let chain = em.embedded_path(l_he)?;
            println!(
                "  {:4} ({} - {}): length {:.6}, {} vertices",
                l_e.index(),
                from,
                to,
                em.embedded_path_length(l_he)?,
                chain.len()
            );
        } else {
            println!("  {:4} ({} - {}): not embedded", l_e.index(), from, to);
        }
    }

    let before = em.input().target.num_vertices();
    let after = em.target().num_vertices();
    println!("\nTotal path length: {:.6}", em.total_embedded_path_length());
    println!("Target vertices: {} -> {} (+{})", before, after, after - before);
    println!(
        "Embedded edges: {}/{} ({})",
        em.embedded_edge_count(),
        layout.num_edges(),
        if em.is_complete() { "complete" } else { "incomplete" }
    );

    Ok(())
}
