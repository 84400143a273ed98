use clap::{Parser, Subcommand};
use cait_site::{config, generate, output, sitemap};
use std::path::PathBuf;
use std::process::ExitCode;

/// Flags and environment fallbacks shared by both build commands.
#[derive(clap::Args, Clone, Default)]
struct PagesArgs {
    /// Root of the ArchivesSpace JSON export
    #[arg(long, env = "CAIT_DATASET")]
    dataset: Option<PathBuf>,

    /// Directory holding the page templates
    #[arg(long, env = "CAIT_TEMPLATES")]
    templates: Option<PathBuf>,

    /// Keep going when a record fails to decode or write
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(clap::Args, Clone, Default)]
struct SitemapArgs {
    /// Public base URL of the site
    #[arg(long = "url", env = "CAIT_SITE_URL")]
    site_url: Option<String>,

    /// Where to write the sitemap document
    #[arg(long, env = "CAIT_SITEMAP")]
    sitemap: Option<PathBuf>,

    /// Change frequency recorded for every entry
    #[arg(short = 'u', long, env = "CAIT_CHANGEFREQ")]
    changefreq: Option<String>,

    /// Colon-delimited path fragments to leave out
    #[arg(short = 'e', long, env = "CAIT_EXCLUDE")]
    exclude: Option<String>,
}

#[derive(Parser)]
#[command(name = "cait-site")]
#[command(about = "Static site generator for ArchivesSpace exports")]
#[command(long_about = "\
Static site generator for ArchivesSpace exports

Reads the JSON records exported from ArchivesSpace and writes a static
site: one .html page, one .include fragment and one .json file per public
accession and person, plus a sitemap.

Dataset structure:

  dataset/
  ├── subjects/*.json                       # Lookup: subject headings
  ├── agents/people/*.json                  # Pages + lookup: people
  └── repositories/2/
      ├── accessions/*.json                 # Pages: accessions
      └── digital_objects/*.json            # Lookup: digital objects

Templates (minijinja): accession.html, accession.include,
agents-people.html, agents-people.include.

Run 'cait-site gen-config' to generate a documented cait-site.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./cait-site.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for generated pages
    #[arg(long, env = "CAIT_HTDOCS", global = true)]
    htdocs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render pages for public accessions and people
    Pages(PagesArgs),
    /// Build a sitemap of the generated HTML pages
    Sitemap(SitemapArgs),
    /// Print a stock cait-site.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Pages(args) => {
            let overrides = config::Overrides {
                dataset: args.dataset,
                templates: args.templates,
                htdocs: cli.htdocs,
                continue_on_error: args.continue_on_error,
                ..Default::default()
            };
            let site = config::load_config(cli.config.as_deref(), &overrides)?;
            let pages = site.pages()?;
            let summary = generate::generate(&pages, |event| output::print_generate_event(&event))?;
            output::print_generate_summary(&summary);
        }
        Command::Sitemap(args) => {
            let overrides = config::Overrides {
                htdocs: cli.htdocs,
                site_url: args.site_url,
                sitemap: args.sitemap,
                changefreq: args.changefreq,
                exclude: args.exclude,
                ..Default::default()
            };
            let site = config::load_config(cli.config.as_deref(), &overrides)?;
            let settings = site.sitemap()?;
            let count =
                sitemap::write_sitemap(&settings, |event| output::print_sitemap_event(&event))?;
            println!("{}", output::format_sitemap_summary(count));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}
