mod cli;
mod report;
mod util;

use anyhow::{bail, Context, Result};
use clap::Parser;

use fdecl_lib::extract::extract;
use std::io::Write;

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let opts = cli::extract_opts(&args)?;
    let source = cli::open_input_source(&args, &opts)?;

    let res = extract(source.source(), &opts);

    if !res.is_ok() {
        report::eprint_aggregate(&res, &source).context("Failed to print diagnostics")?;
    }

    let Some(output) = res.into_value() else {
        bail!("couldn't extract the function declarations due to the previous errors");
    };

    log::debug!("writing {} bytes of {} output", output.len(), opts.output_format());

    cli::open_output(&args)?
        .write_all(&output)
        .with_context(|| "Failed to write to output".to_string())?;

    Ok(())
}
