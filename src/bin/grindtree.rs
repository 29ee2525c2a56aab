use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use env_logger::Env;
use grindtree::convert::{self, Options};
use grindtree::filter::Filter;
use grindtree::parse::parts::Selection;
use grindtree::render::{self, Format};
use grindtree::Error;
use is_terminal::IsTerminal;
use log::info;

#[derive(Debug, Parser)]
#[command(
    name = "grindtree",
    about,
    after_help = "\
FILTERS:
    nophp              fold calls of PHP built-ins (php:internal) into their callers
    include            fold include/require pseudo-calls into their callers
    depth=N            fold everything N or more levels below the root into its parent
    timethreshold=F    fold calls below fraction F (0..1) of the total time into their callers

Filters run in the order they are given, on each part of the profile separately.
The svg and png formats need Graphviz's `dot` on the PATH."
)]
struct Opt {
    // ************* //
    // *** FLAGS *** //
    // ************* //
    /// Silence all log output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose logging mode (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    // *************** //
    // *** OPTIONS *** //
    // *************** //
    /// Cachegrind profile to read
    #[arg(long = "in", value_name = "PATH")]
    infile: PathBuf,

    /// File to write the result to
    #[arg(long = "out", value_name = "PATH")]
    outfile: PathBuf,

    /// Output format [xml, dot, svg, png]
    #[arg(short = 'f', long = "format", default_value = "svg", value_name = "FORMAT")]
    format: Format,

    /// Filter to apply; may be repeated
    #[arg(long = "filter", value_name = "FILTER")]
    filters: Vec<Filter>,

    /// Only use these parts of a multi-run profile (0-based, comma separated)
    #[arg(long = "parts", value_name = "INDEX", value_delimiter = ',')]
    parts: Option<Vec<usize>>,

    /// Only use parts whose header contains this string; may be repeated
    #[arg(long = "include", value_name = "STRING")]
    include: Vec<String>,

    /// Skip parts whose header contains this string; may be repeated
    #[arg(long = "exclude", value_name = "STRING")]
    exclude: Vec<String>,
}

impl Opt {
    fn into_parts(self) -> (PathBuf, PathBuf, Format, Options) {
        let options = Options {
            selection: Selection {
                indices: self.parts,
                include: self.include,
                exclude: self.exclude,
            },
            filters: self.filters,
            ..Options::default()
        };
        (self.infile, self.outfile, self.format, options)
    }
}

fn main() {
    let opt = Opt::parse();

    // Initialize logger
    if !opt.quiet {
        // on a terminal, show one progress line per part unless asked for more
        let progress = io::stderr().is_terminal();
        env_logger::Builder::from_env(Env::default().default_filter_or(match opt.verbose {
            0 if progress => "info",
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }))
        .format_timestamp(None)
        .init();
    }

    let (infile, outfile, format, options) = opt.into_parts();
    if let Err(e) = run(infile, outfile, format, &options) {
        eprintln!("grindtree: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(infile: PathBuf, outfile: PathBuf, format: Format, opt: &Options) -> Result<(), Error> {
    let input = convert::read(&infile)?;
    let tree = convert::aggregate(&input, opt)?;

    let file = File::create(&outfile).map_err(|source| Error::File {
        path: outfile.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let written = render::write(format, &tree, &mut writer).and_then(|()| {
        writer.flush().map_err(|source| Error::File {
            path: outfile.clone(),
            source,
        })
    });
    if let Err(e) = written {
        // do not leave a truncated file behind
        drop(writer);
        let _ = fs::remove_file(&outfile);
        return Err(e);
    }

    info!("wrote {} to {}", format, outfile.display());
    Ok(())
}
