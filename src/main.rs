use anyhow::Result;
use clap::{Parser, Subcommand};
use fragsig::{coords, output, sampler, significance, tsv_reader};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fragsig")]
#[command(version)]
#[command(about = "Fragment simulation and empirical q-values for genomic pipelines", long_about = None)]
struct Args {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach an empirical q-value to each observed record
    QValues {
        /// Null-distribution file (tab-separated, can be gzipped)
        null: PathBuf,

        /// Observed-records file (tab-separated, can be gzipped)
        observed: PathBuf,

        /// 0-based column holding the score in both files
        #[arg(long, default_value = "9")]
        score_column: usize,

        /// Report how many records have q at or below this value
        #[arg(long, default_value = "0.05")]
        q_threshold: f64,
    },

    /// Draw (line number, fragment length) pairs from a length distribution
    SampleLinenums {
        /// Fragment-length distribution file (length, weight)
        fraglens: PathBuf,

        /// Number of uniquely mappable positions to draw line numbers from
        num_unique_positions: u64,

        /// Number of fragments to draw
        num_fragments: u64,

        /// Random seed
        seed: u64,

        /// Sort the output by line number
        #[arg(long)]
        sorted: bool,
    },

    /// Convert sampled line numbers into tag coordinates
    LinenumsToCoords {
        /// Line-number/fragment-length pairs, sorted by line number
        pairs: PathBuf,

        /// Interval table (contig, start, end); read from stdin when omitted
        #[arg(long)]
        intervals: Option<PathBuf>,
    },
}

macro_rules! progress {
    ($quiet:expr) => {
        if !$quiet {
            eprintln!();
        }
    };
    ($quiet:expr, $($arg:tt)*) => {
        if !$quiet {
            eprintln!($($arg)*);
        }
    };
}

fn make_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner} [{elapsed_precise}] {pos} {msg}")
            .unwrap(),
    );
    pb
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Command::QValues {
            null,
            observed,
            score_column,
            q_threshold,
        } => run_q_values(args.quiet, null, observed, *score_column, *q_threshold),
        Command::SampleLinenums {
            fraglens,
            num_unique_positions,
            num_fragments,
            seed,
            sorted,
        } => run_sample_linenums(
            args.quiet,
            fraglens,
            *num_unique_positions,
            *num_fragments,
            *seed,
            *sorted,
        ),
        Command::LinenumsToCoords { pairs, intervals } => {
            run_linenums_to_coords(args.quiet, pairs, intervals.as_deref())
        }
    }
}

fn run_q_values(quiet: bool, null_path: &Path, observed_path: &Path, score_column: usize, q_threshold: f64) -> Result<()> {
    if !null_path.exists() {
        anyhow::bail!("Null-distribution file not found: {}", null_path.display());
    }
    if observed_path != Path::new("-") && !observed_path.exists() {
        anyhow::bail!("Observed-records file not found: {}", observed_path.display());
    }

    progress!(quiet, "Empirical q-values");
    progress!(quiet, "=========================================");
    progress!(quiet, "Null distribution: {}", null_path.display());
    progress!(quiet, "Observed records: {}", observed_path.display());
    progress!(quiet, "Score column: {}", score_column);
    progress!(quiet);

    let null = significance::NullDistribution::new(tsv_reader::load_scores(null_path, score_column)?)?;
    progress!(quiet, "  Null scores loaded: {}", null.len());

    let observed = tsv_reader::read_score_records(
        tsv_reader::open_input(observed_path)?,
        score_column,
        &observed_path.display().to_string(),
    );

    let pb = make_spinner(quiet);
    pb.set_message("records scored");
    let mut summary = significance::QValueSummary::default();
    let mut wtr = output::tsv_writer(io::stdout().lock());
    for result in significance::compute_q_values(&null, observed) {
        let result = result?;
        summary.add(result.q_value, q_threshold);
        output::write_q_value(&mut wtr, &result)?;
        pb.inc(1);
    }
    wtr.flush()?;
    pb.finish_and_clear();

    progress!(quiet, "  Observed records: {}", summary.n_observed);
    progress!(quiet, "  Records with q <= {}: {}", q_threshold, summary.n_at_or_below);
    if let Some(min_q) = summary.min_q {
        progress!(quiet, "  Smallest q: {:.4}", min_q);
    }
    Ok(())
}

fn run_sample_linenums(
    quiet: bool,
    fraglens_path: &Path,
    num_unique_positions: u64,
    num_fragments: u64,
    seed: u64,
    sorted: bool,
) -> Result<()> {
    progress!(quiet, "Sampling line numbers and fragment lengths");
    progress!(quiet, "=========================================");
    progress!(quiet, "Fragment lengths: {}", fraglens_path.display());
    progress!(quiet, "Unique positions: {}", num_unique_positions);
    progress!(quiet, "Fragments: {}", num_fragments);
    progress!(quiet, "Seed: {}", seed);
    progress!(quiet);

    let dist = tsv_reader::load_fragment_lengths(fraglens_path)?;
    progress!(quiet, "  Distinct fragment lengths: {}", dist.lengths.len());

    let mut wtr = output::tsv_writer(io::stdout().lock());
    if sorted {
        for pair in sampler::sample_sorted(&dist, num_unique_positions, num_fragments, seed)? {
            output::write_pair(&mut wtr, &pair)?;
        }
    } else {
        let pb = make_spinner(quiet);
        pb.set_message("pairs sampled");
        for pair in sampler::sample(&dist, num_unique_positions, num_fragments, seed)? {
            output::write_pair(&mut wtr, &pair)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
    }
    wtr.flush()?;
    Ok(())
}

fn run_linenums_to_coords(quiet: bool, pairs_path: &Path, intervals_path: Option<&Path>) -> Result<()> {
    let stdin_path = Path::new("-");
    let intervals_path = intervals_path.unwrap_or(stdin_path);
    if intervals_path == stdin_path && pairs_path == stdin_path {
        anyhow::bail!("Pairs and intervals cannot both be read from stdin");
    }

    progress!(quiet, "Converting line numbers to coordinates");
    progress!(quiet, "=========================================");
    progress!(quiet, "Pairs: {}", pairs_path.display());
    if intervals_path == stdin_path {
        progress!(quiet, "Intervals: <stdin>");
    } else {
        progress!(quiet, "Intervals: {}", intervals_path.display());
    }

    let intervals = tsv_reader::IntervalReader::new(
        tsv_reader::open_input(intervals_path)?,
        &intervals_path.display().to_string(),
    );
    let pairs = tsv_reader::read_pairs(
        tsv_reader::open_input(pairs_path)?,
        &pairs_path.display().to_string(),
    );

    let pb = make_spinner(quiet);
    pb.set_message("tags written");
    let mut wtr = output::tsv_writer(io::stdout().lock());
    let summary = coords::map_to_coords(intervals, pairs, |tag| {
        pb.inc(1);
        output::write_tag(&mut wtr, tag)
    })?;
    wtr.flush()?;
    pb.finish_and_clear();

    progress!(quiet, "  Pairs mapped: {}", summary.pairs_mapped);
    progress!(quiet, "  Intervals consumed: {}", summary.intervals_consumed);
    if let Some((prev, line)) = summary.first_decrease {
        eprintln!(
            "Warning: line numbers are not sorted (line {} after {}); coordinates after that point are unreliable",
            line, prev
        );
    }
    if let Some(line) = summary.exhausted_at_line {
        eprintln!(
            "Warning: interval table ran out at line {}; later lines reuse the last interval",
            line
        );
    }
    // interval stream is fully drained here; exit 0
    Ok(())
}
