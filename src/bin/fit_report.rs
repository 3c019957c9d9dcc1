//! Headless fit: prints a JSON report for an expected/observed pair.
//!
//! ```text
//! fit_report <expected> <observed> [lower upper] [--config fit.json] [--export fitted.csv]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use spectral_fit::data::export::write_csv;
use spectral_fit::data::loader::load_spectrum;
use spectral_fit::{Aligner, FitConfig, XRange};

struct Args {
    expected: PathBuf,
    observed: PathBuf,
    range: Option<XRange>,
    config: Option<PathBuf>,
    export: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut export = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next().context("--config needs a path")?.into()),
            "--export" => export = Some(args.next().context("--export needs a path")?.into()),
            _ => positional.push(arg),
        }
    }

    let (expected, observed, range) = match positional.as_slice() {
        [e, o] => (e, o, None),
        [e, o, lower, upper] => {
            let lower: f64 = lower.parse().with_context(|| format!("lower bound '{lower}'"))?;
            let upper: f64 = upper.parse().with_context(|| format!("upper bound '{upper}'"))?;
            (e, o, Some(XRange::new(lower, upper)?))
        }
        _ => bail!(
            "usage: fit_report <expected> <observed> [lower upper] [--config fit.json] [--export fitted.csv]"
        ),
    };

    Ok(Args {
        expected: expected.into(),
        observed: observed.into(),
        range,
        config,
        export,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => FitConfig::load(path)?,
        None => FitConfig::default(),
    };
    let expected = load_spectrum(&args.expected)?;
    let observed = load_spectrum(&args.observed)?;

    let outcome = Aligner::new(config)?
        .optimise(&expected, &observed, args.range.as_ref())
        .context("fitting")?;

    if let Some(path) = &args.export {
        write_csv(path, &outcome.spectrum)?;
    }

    let report = outcome.report(args.range);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing report")?
    );
    Ok(())
}
