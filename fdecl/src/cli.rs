use crate::util::PathOrStd;

use fdecl_lib::{
    extract::{self, ExtractOpts, ExtractOptsBuilder, ExtractOptsErr},
    passes::func_decls::QualifierPolicy,
};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use codespan_reporting::files::SimpleFile;

use std::path::PathBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Signatures,
    CstSexp,
    AstRustDbg,
}

/// Print the function declarations of a C header, one prototype per line.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The header file to scan.
    header: PathBuf,

    /// Add a directory to the preprocessor's include search path. Can be repeated.
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Parse the file as it is, without running the C preprocessor (`$FDECL_CPP`, or `cpp`).
    #[arg(long)]
    no_cpp: bool,

    /// Keep every qualifier and every base type word instead of only the first one.
    #[arg(long)]
    full_types: bool,

    /// The output format.
    #[arg(
        short = 'e',
        long,
        value_name = "FORMAT",
        value_enum,
        default_value_t = OutputFormat::Signatures
    )]
    emit: OutputFormat,

    /// The output file, use `-` for std out.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output_path: PathOrStd,
}

pub fn extract_opts(args: &Args) -> Result<ExtractOpts, ExtractOptsErr> {
    let format = match args.emit {
        OutputFormat::Signatures => extract::OutputFormat::Signatures,
        OutputFormat::CstSexp => extract::OutputFormat::CstSexp,
        OutputFormat::AstRustDbg => extract::OutputFormat::AstRustDbg,
    };

    let policy = if args.full_types {
        QualifierPolicy::All
    } else {
        QualifierPolicy::First
    };

    ExtractOptsBuilder::new()
        .output_format(format)
        .include_dirs(args.include_dirs.iter().cloned())
        .preprocess(!args.no_cpp)
        .qualifier_policy(policy)
        .build()
}

pub fn open_input_source(
    args: &Args,
    opts: &ExtractOpts,
) -> anyhow::Result<SimpleFile<String, String>> {
    let path = &args.header;
    if !path.exists() {
        bail!("Input file `{}` doesn't exist", path.display());
    }

    let source = extract::load_source(path, opts)
        .with_context(|| format!("Failed to load input file `{}`", path.display()))?;

    Ok(SimpleFile::new(path.display().to_string(), source))
}

pub fn open_output(args: &Args) -> anyhow::Result<Box<dyn std::io::Write>> {
    match &args.output_path {
        PathOrStd::Path(path) => std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .map(|f| Box::new(f) as Box<dyn std::io::Write>)
            .with_context(|| format!("Failed to open output file `{}`", path.display())),
        PathOrStd::StdStream => Ok(Box::new(std::io::stdout().lock())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn exactly_one_header_is_required() {
        assert!(Args::try_parse_from(["fdecl"]).is_err());
        assert!(Args::try_parse_from(["fdecl", "a.h", "b.h"]).is_err());
        assert!(Args::try_parse_from(["fdecl", "a.h"]).is_ok());
    }

    #[test]
    fn flags_map_onto_extract_opts() {
        let args =
            Args::try_parse_from(["fdecl", "-I", "inc", "--full-types", "-e", "cst-sexp", "a.h"])
                .unwrap();
        let opts = extract_opts(&args).unwrap();
        assert!(opts.preprocess());
        assert_eq!(opts.include_dirs(), [PathBuf::from("inc")]);
        assert_eq!(opts.qualifier_policy(), QualifierPolicy::All);
        assert_eq!(opts.output_format(), extract::OutputFormat::CstSexp);
    }

    #[test]
    fn include_dirs_without_cpp_are_rejected() {
        let args = Args::try_parse_from(["fdecl", "--no-cpp", "-I", "inc", "a.h"]).unwrap();
        assert!(extract_opts(&args).is_err());
    }
}
