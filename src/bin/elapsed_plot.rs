use elapsed_lpp::plot::parse_cli;
use elapsed_lpp::{Result, TimeLatency};
use log::{debug, info, warn};

fn main() -> Result<()> {
    let cfg = parse_cli()?;
    let level = if cfg.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!(
        "read data from {} and plot to {}",
        cfg.csvin.display(),
        cfg.pngout.display()
    );
    let tl = TimeLatency::from_csv(&cfg.csvin)?;
    debug!("loaded series:\n{}", tl);
    let summary = tl.summary();
    if let Some(s) = summary.elapsed {
        info!("elapsed [ms]: {}", s);
    }
    if let Some(s) = summary.previous {
        info!("previous [ms]: {}", s);
    }
    if tl.missing_times() > 0 {
        warn!(
            "{} of {} rows have no valid timestamp and are not drawn",
            tl.missing_times(),
            tl.len()
        );
    }
    tl.plot_png(&cfg.pngout, cfg.ticks)?;
    println!("✅ Saved graph as '{}'", cfg.pngout.display());
    Ok(())
}
