//! Ebook Corpus CLI
//!
//! Lists, scrapes, searches and measures a plain-text ebook corpus.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ebook_corpus::corpus::{
    load_pages, run_baseline, Concordance, Manifest, OutputMode, RepoSource, ScrapeConfig,
    Scraper, SearchConfig, CONTEXT_LENGTH,
};
use ebook_corpus::extraction::{ExtractConfig, IgnoreSet, TextExtractor};
use ebook_corpus::sources::{
    read_repo_list, write_repo_list, GithubConfig, RepoLister, DEFAULT_ORG,
};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ebook Corpus
#[derive(Parser, Debug)]
#[command(name = "ebook-corpus")]
#[command(version)]
#[command(about = "Build and measure a plain-text corpus of public-domain ebooks")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Corpus output directory
    #[arg(short, long, global = true, default_value = "corpus")]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the organization's repositories into a file (needs GITHUB_TOKEN)
    ListRepos {
        /// Organization to list
        #[arg(long, default_value = DEFAULT_ORG)]
        org: String,

        /// File to write, one owner/name per line
        #[arg(long, default_value = "repos.txt")]
        out: PathBuf,

        /// Directory for raw response pages
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Override the API base URL
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Scrape one work
    Scrape {
        /// Repository name, e.g. jane-austen_emma
        repo: String,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Scrape every work named in a repository list
    ScrapeAll {
        /// Repository list file
        #[arg(long, default_value = "repos.txt")]
        repos: PathBuf,

        /// Works scraped concurrently
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Print the plain text of one XHTML/HTML file
    Extract {
        /// Markup file
        file: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Print every whole-word occurrence of a keyword with its context
    Search {
        /// Keyword to look for
        keyword: String,

        /// Corpus directory (defaults to --output)
        dir: Option<PathBuf>,

        /// Worker threads (default: all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Match regardless of case
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Bytes of context on each side
        #[arg(long, default_value_t = CONTEXT_LENGTH)]
        context: usize,

        /// Print at most this many matches
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Time a character count over every merged work text
    Baseline {
        /// Corpus directory (defaults to --output)
        dir: Option<PathBuf>,

        /// Character to count
        #[arg(long = "char", default_value_t = 'a')]
        needle: char,

        /// Scan pages on all cores
        #[arg(long)]
        parallel: bool,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Tag whose subtree text is dropped (repeatable; default: head, h1-h6, hgroup)
    #[arg(long = "ignore", value_name = "TAG")]
    ignore: Vec<String>,

    /// Keep text under every tag
    #[arg(long, conflicts_with = "ignore")]
    no_ignore: bool,

    /// Keep whitespace runs as they are
    #[arg(long)]
    no_collapse: bool,
}

impl ExtractArgs {
    fn config(&self) -> ExtractConfig {
        let ignore = if self.no_ignore {
            IgnoreSet::empty()
        } else if self.ignore.is_empty() {
            IgnoreSet::headings()
        } else {
            IgnoreSet::from_tags(&self.ignore)
        };
        ExtractConfig::builder()
            .ignore(ignore)
            .collapse_whitespace(!self.no_collapse)
            .build()
    }
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Organization to clone from
    #[arg(long, default_value = DEFAULT_ORG)]
    org: String,

    /// Write one text file per chapter instead of merged.txt
    #[arg(long)]
    per_document: bool,

    /// Read checkouts from <DIR>/<repo> instead of cloning
    #[arg(long, value_name = "DIR")]
    local: Option<PathBuf>,

    #[command(flatten)]
    extract: ExtractArgs,
}

impl ScrapeArgs {
    fn config(&self, output: PathBuf, jobs: usize) -> ScrapeConfig {
        let mode = if self.per_document {
            OutputMode::PerDocument
        } else {
            OutputMode::Merged
        };
        let source = match &self.local {
            Some(dir) => RepoSource::Local(dir.clone()),
            None => RepoSource::Clone,
        };
        ScrapeConfig::builder()
            .output_dir(output)
            .org(self.org.clone())
            .mode(mode)
            .extract(self.extract.config())
            .jobs(jobs)
            .source(source)
            .build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::ListRepos {
            org,
            out,
            dump_dir,
            api_base,
        } => {
            let mut config = GithubConfig::from_env(org)?;
            if let Some(base) = api_base {
                config = config.with_api_base(base);
            }
            if let Some(dir) = dump_dir {
                config = config.with_dump_dir(dir);
            }
            let repos = RepoLister::new(config)?.list_all().await?;
            write_repo_list(&out, &repos)?;
            tracing::info!("Wrote {} repositories to {}", repos.len(), out.display());
        }
        Command::Scrape { repo, scrape } => {
            let scraper = Scraper::new(scrape.config(cli.output, 1));
            let work = scraper.scrape_repo(&repo).await?;
            let mut manifest = Manifest::new();
            manifest.insert(work.repo.clone(), work.metadata.clone());
            scraper.update_manifest(manifest)?;
            tracing::info!(
                "Scraped {}: {} by {} ({} documents)",
                work.repo,
                work.metadata.title,
                work.metadata.author,
                work.documents
            );
        }
        Command::ScrapeAll {
            repos,
            jobs,
            scrape,
        } => {
            let names = read_repo_list(&repos)
                .with_context(|| format!("reading repository list {}", repos.display()))?;
            let scraper = Scraper::new(scrape.config(cli.output, jobs));
            let manifest = scraper.scrape_all(names).await;
            let total = scraper.update_manifest(manifest)?;
            tracing::info!("Manifest lists {} works", total.len());
        }
        Command::Extract { file, extract } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let text = TextExtractor::new(extract.config()).extract_bytes(&bytes)?;
            println!("{text}");
        }
        Command::Search {
            keyword,
            dir,
            jobs,
            ignore_case,
            context,
            limit,
        } => {
            let dir = dir.unwrap_or(cli.output);
            let pages = load_pages(&dir)?;
            let mut config = SearchConfig::builder()
                .case_insensitive(ignore_case)
                .context(context);
            if let Some(jobs) = jobs {
                config = config.jobs(jobs);
            }
            let report = Concordance::new(keyword, config.build())?.search(&pages)?;

            let mut stdout = std::io::stdout().lock();
            for hit in report.matches.iter().take(limit.unwrap_or(usize::MAX)) {
                serde_json::to_writer(&mut stdout, hit)?;
                writeln!(stdout)?;
            }
            tracing::info!(
                "{} results in {} pages, {} ms",
                report.matches.len(),
                report.pages,
                report.duration_ms()
            );
        }
        Command::Baseline {
            dir,
            needle,
            parallel,
        } => {
            let dir = dir.unwrap_or(cli.output);
            let pages = load_pages(&dir)?;
            let report = run_baseline(&pages, needle, parallel);
            println!("result:   {}", report.result);
            println!("duration: {} us", report.duration_us());
        }
    }

    Ok(())
}
