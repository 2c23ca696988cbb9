//! Coterie CLI - co-occurrence graphs and their cliques from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Mine cliques from annotated documents
//! coterie cliques --documents corpus.jsonl --clusters clusters.tsv -o cliques.tsv
//!
//! # Same, with almost-clique expansion and a per-component budget
//! coterie cliques --documents corpus.jsonl --use-almost --max-component-size 5000 -o cliques.tsv
//!
//! # Export the weighted co-occurrence pairs
//! coterie co-occurrences --sentences sets.tsv -o pairs.csv
//!
//! # Summarize clique files
//! coterie summarize cliques.tsv other.tsv
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use coterie_core::collect::{Blacklist, CoOccurrenceCollector};
use coterie_core::formats::{read_blacklist, CliqueFile, JsonLines, Pairs, SentenceSets};
use coterie_core::pipeline::{collect_documents, finish, Ingest};
use coterie_core::resolve::{
    BirthYears, ClusterMap, IdentityResolver, RawMentions, DEFAULT_REFERENCE_PREFIX,
};
use coterie_core::{IdentityId, PipelineConfig};
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "coterie")]
#[command(about = "Co-occurrence clique mining", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph and write its maximal cliques
    Cliques(CliqueArgs),

    /// Build the graph and write weighted co-occurrence pairs
    CoOccurrences {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (a,b,weight per line)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print clique counts and sizes of clique files
    Summarize {
        /// Clique files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Member delimiter
        #[arg(long, default_value = "\t")]
        delimiter: String,
    },
}

/// Inputs, lookup tables and ingestion settings.
#[derive(Args)]
struct InputArgs {
    /// Annotated documents (JSON lines)
    #[arg(long)]
    documents: Vec<PathBuf>,

    /// Pre-resolved identity sets, one sentence per line
    #[arg(long)]
    sentences: Vec<PathBuf>,

    /// Weighted pairs (a,b[,weight])
    #[arg(long)]
    pairs: Vec<PathBuf>,

    /// Alias clusters (label, aliases...)
    #[arg(long)]
    clusters: Option<PathBuf>,

    /// Extra raw -> alias mappings for the clusters
    #[arg(long, requires = "clusters")]
    cluster_mappings: Option<PathBuf>,

    /// Birth dates (_, page, year)
    #[arg(long)]
    dates: Option<PathBuf>,

    /// Prefix turning a page name in the dates file into a reference
    #[arg(long, default_value = DEFAULT_REFERENCE_PREFIX)]
    reference_prefix: String,

    /// Identities to drop, one per line
    #[arg(long)]
    blacklist: Option<PathBuf>,

    /// JSON configuration file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Let coreferent mentions inherit identities along their chain
    #[arg(long)]
    use_coref: bool,

    /// Keep references regardless of birth year
    #[arg(long)]
    no_birth_filter: bool,

    /// Latest accepted birth year
    #[arg(long)]
    max_birth_year: Option<i32>,

    /// Only use references the linker spotted
    #[arg(long)]
    use_spotted: bool,

    /// Drop edges seen fewer times than this
    #[arg(long)]
    min_edge_weight: Option<u32>,

    /// Delimiter for sentence sets, clique and link files
    #[arg(long)]
    delimiter: Option<String>,
}

#[derive(Args)]
struct CliqueArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output clique file
    #[arg(short, long)]
    output: PathBuf,

    /// Also write every identity's references, best first
    #[arg(long)]
    links: Option<PathBuf>,

    /// Also write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Smallest clique written
    #[arg(long)]
    min_clique_size: Option<usize>,

    /// Smallest clique that is expanded
    #[arg(long)]
    min_almost_clique_size: Option<usize>,

    /// Absorb vertices missing a single edge to a clique
    #[arg(long)]
    use_almost: bool,

    /// Skip components with more vertices than this
    #[arg(long)]
    max_component_size: Option<usize>,

    /// Skip components needing more search frames than this
    #[arg(long)]
    max_frames: Option<u64>,

    /// Skip components whose search takes longer than this many milliseconds
    #[arg(long)]
    max_millis: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Cliques(args) => cmd_cliques(&args),
        Commands::CoOccurrences { input, output } => cmd_co_occurrences(&input, &output),
        Commands::Summarize { files, delimiter } => cmd_summarize(&files, &delimiter),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn base_config(input: &InputArgs) -> Result<PipelineConfig> {
    let mut config = match &input.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let collector = &mut config.collector;
    collector.use_coref |= input.use_coref;
    collector.spotted_only |= input.use_spotted;
    if input.no_birth_filter {
        collector.birth_year_filter = false;
    }
    if let Some(year) = input.max_birth_year {
        collector.max_birth_year = year;
    }
    if let Some(weight) = input.min_edge_weight {
        config.graph.min_edge_weight = weight;
    }
    if let Some(delimiter) = &input.delimiter {
        config.delimiter.0 = unescape(delimiter);
    }
    Ok(config)
}

fn clique_config(args: &CliqueArgs) -> Result<PipelineConfig> {
    let mut config = base_config(&args.input)?;
    let cliques = &mut config.cliques;
    cliques.use_almost |= args.use_almost;
    if let Some(size) = args.min_clique_size {
        cliques.min_clique_size = size;
    }
    if let Some(size) = args.min_almost_clique_size {
        cliques.min_almost_clique_size = size;
    }
    let budget = &mut config.budget;
    if args.max_component_size.is_some() {
        budget.max_component_size = args.max_component_size;
    }
    if args.max_frames.is_some() {
        budget.max_frames = args.max_frames;
    }
    if let Some(ms) = args.max_millis {
        budget.max_duration = Some(Duration::from_millis(ms));
    }
    Ok(config)
}

/// `\t` typed on a shell arrives as two characters.
fn unescape(delimiter: &str) -> String {
    delimiter.replace("\\t", "\t")
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message);
    pb
}

fn keep(set: BTreeSet<IdentityId>, blacklist: &Blacklist) -> Option<BTreeSet<IdentityId>> {
    let set: BTreeSet<IdentityId> = set.into_iter().filter(|id| !blacklist.contains(id)).collect();
    (set.len() > 1).then_some(set)
}

/// Load every input into one ingestion.
fn ingest(input: &InputArgs, config: &PipelineConfig) -> Result<Ingest> {
    if input.documents.is_empty() && input.sentences.is_empty() && input.pairs.is_empty() {
        bail!("No input given: use --documents, --sentences or --pairs");
    }

    let clusters = match &input.clusters {
        Some(path) => Some(
            ClusterMap::from_files(path, input.cluster_mappings.as_deref())
                .with_context(|| format!("Failed to load clusters {}", path.display()))?,
        ),
        None => None,
    };
    let resolver: &dyn IdentityResolver = match &clusters {
        Some(map) => map,
        None => &RawMentions,
    };
    let birth_years = match &input.dates {
        Some(path) => BirthYears::from_file(path, &input.reference_prefix)
            .with_context(|| format!("Failed to load dates {}", path.display()))?,
        None => BirthYears::new(),
    };
    let blacklist = match &input.blacklist {
        Some(path) => read_blacklist(open(path)?)
            .with_context(|| format!("Failed to read blacklist {}", path.display()))?,
        None => Blacklist::new(),
    };

    let collector = CoOccurrenceCollector::new(config.collector, resolver, &birth_years, &blacklist);
    let mut ingest = Ingest::new();

    for path in &input.documents {
        let start = Instant::now();
        let pb = spinner(format!("Reading {}...", path.display()));
        let name = path.display().to_string();
        let loaded = JsonLines::read_documents(open(path)?, &name)
            .with_context(|| format!("Failed to read documents {}", name))?;
        ingest.note_malformed(loaded.malformed);
        ingest.add_collected(collect_documents(&loaded.records, &collector));
        pb.finish_with_message(format!(
            "{} documents from {} in {:.2?}",
            loaded.records.len(),
            name,
            start.elapsed()
        ));
    }

    for path in &input.sentences {
        let name = path.display().to_string();
        let loaded = SentenceSets::read(open(path)?, &name, config.delimiter.as_str())
            .with_context(|| format!("Failed to read sentences {}", name))?;
        ingest.note_malformed(loaded.malformed);
        for set in loaded.records {
            if let Some(set) = keep(set, &blacklist) {
                ingest.add_observation(set);
            }
        }
    }

    for path in &input.pairs {
        let name = path.display().to_string();
        let loaded =
            Pairs::read(open(path)?, &name).with_context(|| format!("Failed to read pairs {}", name))?;
        ingest.note_malformed(loaded.malformed);
        for (a, b, weight) in loaded.records {
            if !blacklist.contains(&a) && !blacklist.contains(&b) {
                ingest.add_pair(a, b, weight);
            }
        }
    }

    log::info!(
        "Ingested {} vertices and {} edges",
        ingest.graph().vertex_count(),
        ingest.graph().edge_count()
    );
    Ok(ingest)
}

fn cmd_cliques(args: &CliqueArgs) -> Result<()> {
    let config = clique_config(args)?;
    config.validate().context("Invalid configuration")?;

    let ingest = ingest(&args.input, &config)?;

    let start = Instant::now();
    let pb = spinner("Finding cliques...".to_string());
    let out = finish(ingest, &config);
    pb.finish_with_message(format!("Found cliques in {:.2?}", start.elapsed()));

    CliqueFile::write(&out.report.cliques, create(&args.output)?, config.delimiter.as_str())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(path) = &args.links {
        let mut writer = create(path)?;
        out.links
            .write_to(&mut writer, config.delimiter.as_str())
            .and_then(|()| writer.flush())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if let Some(path) = &args.stats {
        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, &out.stats)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writeln!(writer)?;
        writer.flush()?;
    }

    println!(
        "Wrote {} cliques to {}",
        out.report.cliques.len(),
        args.output.display()
    );
    if out.stats.cliques.components_skipped > 0 {
        println!(
            "Skipped {} components over budget",
            out.stats.cliques.components_skipped
        );
    }
    Ok(())
}

fn cmd_co_occurrences(input: &InputArgs, output: &Path) -> Result<()> {
    let config = base_config(input)?;
    config.validate().context("Invalid configuration")?;

    let ingest = ingest(input, &config)?;
    let written = Pairs::write(ingest.graph(), create(output)?, config.graph.min_edge_weight)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} pairs to {}", written, output.display());
    Ok(())
}

fn cmd_summarize(files: &[PathBuf], delimiter: &str) -> Result<()> {
    let delimiter = unescape(delimiter);
    for path in files {
        let summary = CliqueFile::summarize(open(path)?, &delimiter)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        println!(
            "{}\t{} cliques\t{} members\t{:.2} avg",
            path.display(),
            summary.cliques,
            summary.members,
            summary.avg_size
        );
    }
    Ok(())
}
