use std::io::Read;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

use genogram::graph_layout::{LayoutOptions, RankDir};
use genogram::parser::{parse_rank_dir, parse_ranker};
use genogram::rank::Ranker;
use genogram::GenogramError;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Box-drawing preview
    Text,
    /// Computed positions as JSON
    Layout,
    /// Normalized members/relationships JSON
    Export,
}

#[derive(Parser)]
#[command(name = "genogram", about = "Lay out and preview family genograms")]
struct Cli {
    /// Genogram JSON file (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// Rank direction: TB, BT, LR or RL
    #[arg(long, short = 'd', value_parser = parse_rank_dir, default_value = "TB")]
    direction: RankDir,

    #[arg(long, short = 'f', value_enum, default_value = "text")]
    format: Format,

    /// Gap between members of one generation
    #[arg(long)]
    node_sep: Option<f64>,

    /// Gap between generations
    #[arg(long)]
    rank_sep: Option<f64>,

    /// network-simplex, tight-tree or longest-path
    #[arg(long, value_parser = parse_ranker)]
    ranker: Option<Ranker>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn layout_options(&self) -> LayoutOptions {
        let defaults = LayoutOptions::default();
        LayoutOptions {
            direction: self.direction,
            node_sep: self.node_sep.unwrap_or(defaults.node_sep),
            rank_sep: self.rank_sep.unwrap_or(defaults.rank_sep),
            ranker: self.ranker.unwrap_or(defaults.ranker),
            ..defaults
        }
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> genogram::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| GenogramError::Io {
            source,
            path: path.clone(),
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| GenogramError::Io {
                    source,
                    path: PathBuf::from("<stdin>"),
                })?;
            Ok(buf)
        }
    }
}

fn run(cli: &Cli) -> genogram::Result<String> {
    let input = read_input(cli.file.as_ref())?;
    let options = cli.layout_options();
    match cli.format {
        Format::Text => genogram::render_with_options(&input, &options),
        Format::Layout => genogram::layout_json(&input, &options),
        Format::Export => genogram::export_json(&input),
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}
