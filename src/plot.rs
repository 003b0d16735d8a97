use super::{Error, Result, TickMode, DEFAULT_CSV, DEFAULT_PNG, VERSION};
use clap::{App, Arg, ArgMatches};
use std::ffi::OsString;
use std::path::PathBuf;

/// Settings for one plotting run
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub csvin: PathBuf,
    pub pngout: PathBuf,
    pub ticks: TickMode,
    pub verbose: bool,
}

fn cli_app() -> App<'static, 'static> {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name for the csv file")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .default_value(DEFAULT_CSV);
    let arg_pngout = Arg::with_name("output_pngfile")
        .help("name of the output png file")
        .short("o")
        .long("pngfile")
        .takes_value(true)
        .default_value(DEFAULT_PNG);
    let arg_every = Arg::with_name("every")
        .help("put a time tick on every n-th row instead of automatic ticks")
        .short("e")
        .long("every")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print verbose information")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    App::new("Elapsed_plot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot elapsed vs previous request times")
        .arg(arg_csvin)
        .arg(arg_pngout)
        .arg(arg_every)
        .arg(arg_verbose)
}

/// Takes the CLI arguments that control the plotting of the request times.
pub fn parse_cli() -> Result<PlotConfig> {
    config_from_matches(&cli_app().get_matches())
}

/// Same as parse_cli but from the given arguments, the first is the program name.
pub fn parse_cli_from<I, T>(args: I) -> Result<PlotConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = cli_app()
        .get_matches_from_safe(args)
        .map_err(|e| Error::Cli(e.message))?;
    config_from_matches(&matches)
}

fn config_from_matches(cli_args: &ArgMatches) -> Result<PlotConfig> {
    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or(DEFAULT_CSV));
    let pngout = PathBuf::from(cli_args.value_of("output_pngfile").unwrap_or(DEFAULT_PNG));
    let ticks = match cli_args.value_of("every") {
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 => TickMode::EveryNth(n),
            _ => {
                return Err(Error::Cli(format!(
                    "--every expects a positive integer, got {:?}",
                    v
                )))
            }
        },
        None => TickMode::Auto,
    };
    let verbose = cli_args.is_present("verbose");
    Ok(PlotConfig {
        csvin,
        pngout,
        ticks,
        verbose,
    })
}
