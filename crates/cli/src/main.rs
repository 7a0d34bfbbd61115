use anyhow::{Context, Result};
use catalog_cli::render::{entry_json, entry_line, print_stdout, taxonomy_lines};
use catalog_cli::{HttpCatalog, SearchFacets};
use catalog_protocol::serialize_json;
use catalog_search::{BrowseConfig, BrowseUpdate, Browser, Role, TaxonomySource, Taxonomy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "catalog-browse")]
#[command(about = "Faceted level search by difficulty range", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Browse config (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog base URL (overrides config and CATALOG_BROWSE_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List difficulty tiers by family
    Tiers(TiersArgs),

    /// Search levels with difficulty and facet filters
    Search(SearchArgs),
}

#[derive(Args)]
struct TiersArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    facets: SearchFacets,

    /// Caller role; decides which privileged facets are sent
    #[arg(long, value_enum, default_value_t = RoleFlag::Anonymous)]
    role: RoleFlag,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Retries per failed page
    #[arg(long, default_value_t = 1)]
    retries: u32,

    /// Output entries as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum RoleFlag {
    Anonymous,
    Member,
    SuperAdmin,
}

impl RoleFlag {
    const fn as_domain(self) -> Role {
        match self {
            Self::Anonymous => Role::Anonymous,
            Self::Member => Role::Member,
            Self::SuperAdmin => Role::SuperAdmin,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Tiers(args) => args.json,
        Commands::Search(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper are noisy at debug level
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(&cli)?;
    let catalog = Arc::new(HttpCatalog::new(config.endpoint.clone())?);

    match cli.command {
        Commands::Tiers(args) => run_tiers(&catalog, args).await?,
        Commands::Search(args) => run_search(catalog, config, args).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BrowseConfig> {
    let mut config = match &cli.config {
        Some(path) => BrowseConfig::load(path)?,
        None => BrowseConfig::default(),
    };
    config.apply_env()?;
    if let Some(url) = &cli.base_url {
        config.endpoint.base_url = url.trim().to_string();
    }
    config.validate()?;
    log::debug!("Catalog endpoint: {}", config.endpoint.base_url);
    Ok(config)
}

async fn run_tiers(catalog: &HttpCatalog, args: TiersArgs) -> Result<()> {
    let tiers = catalog
        .difficulties()
        .await
        .context("Failed to load difficulty tiers")?;

    if args.json {
        print_stdout(&serialize_json(&tiers)?)?;
        return Ok(());
    }
    for line in taxonomy_lines(&Taxonomy::new(tiers)) {
        print_stdout(&line)?;
    }
    Ok(())
}

async fn run_search(catalog: Arc<HttpCatalog>, config: BrowseConfig, args: SearchArgs) -> Result<()> {
    let tiers = catalog
        .difficulties()
        .await
        .context("Failed to load difficulty tiers")?;

    let mut browser = Browser::new(catalog, config, args.role.as_domain());
    browser.set_taxonomy(tiers);
    let state = args.facets.apply(browser.filter().clone(), browser.taxonomy());
    browser.restore(state);

    let mut pages = 0;
    let mut retries_left = args.retries;
    loop {
        let mut failure = None;
        for update in browser.settle().await {
            match update {
                BrowseUpdate::Failed(err) => failure = Some(err),
                BrowseUpdate::NotFound => log::info!("No entry matches '{}'", browser.filter().query),
                BrowseUpdate::Discarded | BrowseUpdate::Appended { .. } | BrowseUpdate::Found => {}
            }
        }

        if let Some(err) = failure {
            if err.is_transient() && retries_left > 0 && browser.retry() {
                retries_left -= 1;
                log::warn!("Retrying page after error: {err}");
                continue;
            }
            return Err(err).context("Catalog request failed");
        }

        pages += 1;
        if pages >= args.pages || !browser.load_more() {
            break;
        }
    }

    for entry in browser.entries() {
        if args.json {
            print_stdout(&entry_json(entry)?)?;
        } else {
            print_stdout(&entry_line(entry))?;
        }
    }
    if !args.json {
        let total = browser.results().total().unwrap_or(0);
        print_stdout(&format!("Showing {} of {total}", browser.entries().len()))?;
    }
    Ok(())
}
