use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Context;
use color_eyre::Result;
use gtcohort::core::config::{parse_delimiter, parse_field_index, ArityPolicy, StreamConfig};
use gtcohort::core::roster::{RosterPolicy, SampleRoster};
use gtcohort::core::utils::{open_input, open_output};
use std::path::PathBuf;

/// Genotype field rewriting and cohort burden toolkit
#[derive(Parser, Debug)]
#[command(author, version, about = "Genotype field rewriting and cohort burden toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace the genotype vector with carrier sample names and add cohort counts
    Rewrite(RewriteArgs),
    /// List every sample carrying a non-reference genotype anywhere in the table
    Carriers(CarriersArgs),
    /// Per-gene Fisher exact test of proband vs control allele counts
    Burden(BurdenArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RosterOptions {
    /// Samples in genotype vector order: a delimited list or a file
    #[arg(short = 's', long = "samples", required = true)]
    pub samples: String,

    /// Proband samples (defaults to all samples): a delimited list or a file
    #[arg(short = 'p', long = "probands")]
    pub probands: Option<String>,

    /// Control samples (defaults to samples that are not probands): a delimited list or a file
    #[arg(short = 'c', long = "controls")]
    pub controls: Option<String>,

    /// Delimiter for inline sample lists and single-line sample files
    #[arg(long = "roster-delimiter", default_value_t = ',')]
    pub roster_delimiter: char,

    /// Warn about and drop probands/controls missing from --samples instead of failing
    #[arg(long = "ignore-unknown-samples")]
    pub ignore_unknown_samples: bool,
}

impl RosterOptions {
    pub fn resolve(&self) -> Result<SampleRoster> {
        let policy = if self.ignore_unknown_samples {
            RosterPolicy::Ignore
        } else {
            RosterPolicy::Reject
        };
        SampleRoster::resolve(
            &self.samples,
            self.probands.as_deref(),
            self.controls.as_deref(),
            self.roster_delimiter,
            policy,
        )
        .wrap_err("Failed to resolve sample roster")
    }
}

#[derive(Args, Debug, Clone)]
pub struct StreamOptions {
    /// Input table (defaults to stdin). The first line is the header
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output path (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// 1-based column holding the comma-separated genotype vector
    #[arg(short = 'f', long = "genotype-field", required = true, value_parser = parse_field_index)]
    pub genotype_field: usize,

    /// Field delimiter of the input table
    #[arg(short = 'd', long = "delimiter", default_value = "\\t", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Skip records whose genotype count does not match the roster instead of failing
    #[arg(long = "skip-malformed")]
    pub skip_malformed: bool,
}

impl StreamOptions {
    pub fn stream_config(&self) -> StreamConfig {
        let arity_policy = if self.skip_malformed {
            ArityPolicy::Skip
        } else {
            ArityPolicy::Abort
        };
        StreamConfig::new(self.delimiter, self.genotype_field, arity_policy)
    }
}

#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Annotate each sample with its genotype, e.g. S1(0/1)
    #[arg(short = 'g', long = "append-genotype")]
    pub append_genotype: bool,

    /// Separator between samples in the rewritten field
    #[arg(long = "separator", default_value = ",")]
    pub separator: String,

    /// Count no-calls into the cohort denominators
    #[arg(long = "include-nocalls")]
    pub include_nocalls: bool,

    /// Append proband (and control) denominator, variant and allele count columns
    #[arg(long = "count-genotypes")]
    pub count_genotypes: bool,

    /// Number of threads to use for parallel processing
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    #[command(flatten)]
    pub roster: RosterOptions,

    #[command(flatten)]
    pub stream: StreamOptions,
}

#[derive(Args, Debug)]
pub struct CarriersArgs {
    /// Separator between samples in the output line
    #[arg(long = "separator", default_value = ",")]
    pub separator: String,

    #[command(flatten)]
    pub roster: RosterOptions,

    #[command(flatten)]
    pub stream: StreamOptions,
}

#[derive(Args, Debug)]
pub struct BurdenArgs {
    /// Input table produced by `rewrite --count-genotypes` and gene annotation (defaults to stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output path (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Header name of the gene identifier column
    #[arg(long = "gene-column", default_value = "GENE")]
    pub gene_column: String,

    /// Field delimiter of the input table
    #[arg(short = 'd', long = "delimiter", default_value = "\\t", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

impl RewriteArgs {
    pub fn run(self) -> Result<()> {
        use gtcohort::rewrite::{run_rewrite, RewriteConfig};

        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build_global()?;

        let roster = self.roster.resolve()?;
        let config = RewriteConfig {
            stream: self.stream.stream_config(),
            append_genotype: self.append_genotype,
            separator: self.separator,
            include_nocalls: self.include_nocalls,
            count_genotypes: self.count_genotypes,
        };

        let reader = open_input(self.stream.input.as_deref())?;
        let writer = open_output(self.stream.output.as_deref())?;
        run_rewrite(reader, writer, &roster, &config)?;
        Ok(())
    }
}

impl CarriersArgs {
    pub fn run(self) -> Result<()> {
        use gtcohort::carriers::run_carriers;

        let roster = self.roster.resolve()?;
        let config = self.stream.stream_config();

        let reader = open_input(self.stream.input.as_deref())?;
        let writer = open_output(self.stream.output.as_deref())?;
        run_carriers(reader, writer, &roster, &config, &self.separator)?;
        Ok(())
    }
}

impl BurdenArgs {
    pub fn run(self) -> Result<()> {
        use gtcohort::burden::run_burden;

        let reader = open_input(self.input.as_deref())?;
        let writer = open_output(self.output.as_deref())?;
        run_burden(reader, writer, &self.gene_column, self.delimiter)?;
        Ok(())
    }
}

// Main entry point
pub fn main() -> Result<()> {
    color_eyre::install()?;
    use env_logger::Env;

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rewrite(args) => args.run(),
        Commands::Carriers(args) => args.run(),
        Commands::Burden(args) => args.run(),
    }
}
