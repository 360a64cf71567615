//! Prism CLI
//!
//! Usage:
//!   prism [OPTIONS] <COMMAND>
//!
//! Commands:
//!   init <NAME>                         Create a new project directory
//!   new <block|recipe|dataschema> <NAME> Add a starter asset to the project
//!   compile <RECIPE> [--stdout]         Compile one recipe
//!   compile --all                       Compile every recipe in the project
//!
//! Options:
//!   -c, --config <FILE>  Project config (default: nearest prism.toml)
//!   -v, --verbose        Increase log verbosity (repeatable)

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};

use prism::compile_sources;
use prism::project::{ProjectConfig, ProjectError, ProjectLoader, ScaffoldKind, Scaffolder};

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Compile prompt recipes into partially rendered templates")]
struct Cli {
    /// Project config file (defaults to the nearest prism.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new project directory with prism.toml and asset folders
    Init {
        /// Directory to create
        name: PathBuf,
    },

    /// Add a starter asset to the current project
    New {
        kind: AssetArg,
        /// Asset id, also used as the file name
        name: String,
    },

    /// Compile recipes into templates and runtime models
    Compile {
        /// Recipe name (file name before `.recipe.yaml`)
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        recipe: Option<String>,

        /// Compile every recipe in the project
        #[arg(long)]
        all: bool,

        /// Print the compiled template instead of writing output files
        #[arg(long, conflicts_with = "all")]
        stdout: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AssetArg {
    Block,
    Recipe,
    Dataschema,
}

impl From<AssetArg> for ScaffoldKind {
    fn from(arg: AssetArg) -> Self {
        match arg {
            AssetArg::Block => ScaffoldKind::Block,
            AssetArg::Recipe => ScaffoldKind::Recipe,
            AssetArg::Dataschema => ScaffoldKind::Dataschema,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        report(&e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose > 0 {
        let level = match verbose {
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        builder.filter_level(level);
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.format_timestamp(None).init();
}

fn report(error: &ProjectError) {
    match error.as_prism() {
        Some(prism_error) => {
            eprintln!("{}", prism_error.describe());
            if let Some(report) = prism_error.format_report() {
                eprintln!("{}", report);
            }
        }
        None => eprintln!("Error: {}", error),
    }
}

fn run(cli: &Cli) -> Result<(), ProjectError> {
    match &cli.command {
        Command::Init { name } => {
            Scaffolder::init(name)?;
            println!("Created project in {}", name.display());
            Ok(())
        }
        Command::New { kind, name } => {
            let config = load_config(cli.config.as_deref())?;
            let written = Scaffolder::new(config).new_asset((*kind).into(), name)?;
            for path in written {
                println!("Created {}", path.display());
            }
            Ok(())
        }
        Command::Compile {
            recipe,
            all,
            stdout,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut loader = ProjectLoader::new(&config);
            let names = match recipe {
                Some(name) if !*all => vec![name.clone()],
                _ => loader.recipe_names()?,
            };
            if names.is_empty() {
                println!("No recipes found in {}", config.recipes_dir().display());
            }
            for name in &names {
                compile_recipe(&config, &mut loader, name, *stdout)?;
            }
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<ProjectConfig, ProjectError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().map_err(|e| ProjectError::Io {
                path: PathBuf::from("."),
                source: e,
            })?;
            ProjectConfig::find(&cwd)?
        }
    };
    ProjectConfig::load(&path)
}

fn compile_recipe(
    config: &ProjectConfig,
    loader: &mut ProjectLoader<'_>,
    name: &str,
    to_stdout: bool,
) -> Result<(), ProjectError> {
    let sources = loader.load_for_recipe(name)?;
    let artifacts = compile_sources(&sources, &config.pipeline_options())?;

    if to_stdout {
        print!("{}", artifacts.template_content);
        return Ok(());
    }

    let template_path = config.template_output(name);
    write_output(&template_path, &artifacts.template_content)?;
    println!("{} -> {}", name, template_path.display());

    if let Some(model_code) = &artifacts.model_code {
        let model_path = config.model_output(name);
        write_output(&model_path, model_code)?;
        println!("{} -> {}", name, model_path.display());
    }
    info!("recipe '{}' done", name);
    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<(), ProjectError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ProjectError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| ProjectError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
