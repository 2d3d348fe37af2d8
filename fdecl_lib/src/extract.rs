use std::path::{Path, PathBuf};

use crate::{
    diagnostic::{AggregateResult, Diagnostic, DiagnosticBuilder},
    passes::{
        self,
        func_decls::{PrintReporter, QualifierPolicy, Reporter, UnresolvedBaseType, VisitError},
        preprocess::PreprocessError,
    },
    util::Ice,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    CstSexp,
    AstRustDbg,
    Signatures,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::CstSexp => "cst s-expression",
            OutputFormat::AstRustDbg => "ast rust dbg",
            OutputFormat::Signatures => "signatures",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOpts {
    output_format: OutputFormat,
    include_dirs: Vec<PathBuf>,
    preprocess: bool,
    qualifier_policy: QualifierPolicy,
}

impl ExtractOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    pub fn preprocess(&self) -> bool {
        self.preprocess
    }

    pub fn qualifier_policy(&self) -> QualifierPolicy {
        self.qualifier_policy
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptsBuilder {
    output_format: OutputFormat,
    include_dirs: Vec<PathBuf>,
    preprocess: bool,
    qualifier_policy: QualifierPolicy,
}

#[derive(Debug, Clone)]
pub enum ExtractOptsErr {
    IncludeDirsWithoutPreprocessor(Vec<PathBuf>),
}

impl std::fmt::Display for ExtractOptsErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractOptsErr::IncludeDirsWithoutPreprocessor(dirs) => {
                write!(
                    f,
                    "{} include director{} given, but the preprocessor is disabled.",
                    dirs.len(),
                    if dirs.len() == 1 { "y" } else { "ies" }
                )
            }
        }
    }
}

impl std::error::Error for ExtractOptsErr {}

impl Default for ExtractOptsBuilder {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Signatures,
            include_dirs: Vec::new(),
            preprocess: true,
            qualifier_policy: QualifierPolicy::First,
        }
    }
}

impl ExtractOptsBuilder {
    /// Output signatures of the preprocessed file, keeping only the first qualifier of a level.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn include_dirs<I>(mut self, dirs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Set running the C preprocessor before parsing
    pub fn preprocess(mut self, preprocess: bool) -> Self {
        self.preprocess = preprocess;
        self
    }

    pub fn qualifier_policy(mut self, policy: QualifierPolicy) -> Self {
        self.qualifier_policy = policy;
        self
    }

    pub fn build(self) -> Result<ExtractOpts, ExtractOptsErr> {
        if !self.preprocess && !self.include_dirs.is_empty() {
            return Err(ExtractOptsErr::IncludeDirsWithoutPreprocessor(
                self.include_dirs,
            ));
        }
        Ok(ExtractOpts {
            output_format: self.output_format,
            include_dirs: self.include_dirs,
            preprocess: self.preprocess,
            qualifier_policy: self.qualifier_policy,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error("failed to read `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads the translation unit at `path`, through the preprocessor when that is enabled.
pub fn load_source(path: &Path, opts: &ExtractOpts) -> Result<String, LoadError> {
    if opts.preprocess {
        Ok(passes::preprocess::preprocess(path, &opts.include_dirs)?)
    } else {
        std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_owned(),
            source,
        })
    }
}

fn diagnose_unresolved_base_type(err: UnresolvedBaseType) -> Diagnostic {
    DiagnosticBuilder::new(err.span).build_unresolved_base_type(err.declaration)
}

/// Runs the front end over `source` and renders it in the requested output format.
pub fn extract(source: &str, opts: &ExtractOpts) -> AggregateResult<Vec<u8>> {
    if opts.output_format == OutputFormat::CstSexp {
        return passes::parse::parse_to_sexp(source).map(|sexp| format!("{sexp}\n").into_bytes());
    }

    let tu = passes::parse::parse_to_cst(source).and_then(|cst| passes::lower_cst::lower(&cst));

    match opts.output_format {
        OutputFormat::AstRustDbg => tu.map(|tu| format!("{tu:#?}\n").into_bytes()),
        OutputFormat::Signatures => tu.and_then(|tu| {
            let mut reporter = PrintReporter::new(Vec::new());
            match passes::func_decls::visit(&tu, opts.qualifier_policy, &mut reporter) {
                Ok(()) => AggregateResult::new_ok(reporter.into_inner()),
                Err(VisitError::UnresolvedBaseType(err)) => {
                    AggregateResult::new_err(diagnose_unresolved_base_type(err))
                }
                Err(VisitError::Reporter(err)) => panic!("ICE: writing to memory failed: {err}"),
            }
        }),
        OutputFormat::CstSexp => unreachable!(
            "Format {} should have been handled before",
            opts.output_format
        ),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError<E> {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("the front end rejected the translation unit with {} error(s)", .0.len())]
    FrontEnd(Vec<Diagnostic>),
    #[error(transparent)]
    Visit(#[from] VisitError<E>),
}

/// Loads the file at `path` and hands the signature of every function declarator in it to
/// `reporter`, in source order. The output format of `opts` is ignored.
///
/// Warnings from the front end are logged; errors end the run before anything is reported.
pub fn iterate_func_decls<R: Reporter>(
    path: &Path,
    opts: &ExtractOpts,
    reporter: &mut R,
) -> Result<(), ExtractError<R::Error>> {
    let source = load_source(path, opts)?;

    let tu = passes::parse::parse_to_cst(&source).and_then(|cst| passes::lower_cst::lower(&cst));
    if tu.is_err() {
        return Err(ExtractError::FrontEnd(
            tu.into_diagnostics().map(|(_, d)| d).collect(),
        ));
    }
    for (_, d) in tu.diagnostics() {
        log::warn!("{}: {} ({})", path.display(), d.message(), d.code());
    }

    let tu = tu.into_value().ice();
    passes::func_decls::visit(&tu, opts.qualifier_policy, reporter)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Code;

    fn opts() -> ExtractOpts {
        ExtractOptsBuilder::new().preprocess(false).build().unwrap()
    }

    fn extract_str(source: &str, opts: &ExtractOpts) -> String {
        let res = extract(source, opts);
        String::from_utf8(res.into_value().unwrap()).unwrap()
    }

    #[test]
    fn include_dirs_need_the_preprocessor() {
        let res = ExtractOptsBuilder::new()
            .preprocess(false)
            .include_dir("/usr/include")
            .build();
        assert!(matches!(
            res,
            Err(ExtractOptsErr::IncludeDirsWithoutPreprocessor(dirs)) if dirs.len() == 1
        ));
    }

    #[test]
    fn builder_defaults() {
        let opts = ExtractOptsBuilder::new()
            .include_dirs(["a", "b"])
            .build()
            .unwrap();
        assert!(opts.preprocess());
        assert_eq!(opts.output_format(), OutputFormat::Signatures);
        assert_eq!(opts.qualifier_policy(), QualifierPolicy::First);
        assert_eq!(opts.include_dirs(), [PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn extracts_prototype_lines() {
        let out = extract_str(
            "int add(int a, int b);\nvoid run(void);\nchar *copy(const char *src);\n",
            &opts(),
        );
        assert_eq!(
            out,
            "int add(int a, int b);\nvoid run(void);\nchar* copy(const char* src);\n"
        );
    }

    #[test]
    fn full_types_keep_every_qualifier() {
        let opts = ExtractOptsBuilder::new()
            .preprocess(false)
            .qualifier_policy(QualifierPolicy::All)
            .build()
            .unwrap();
        let out = extract_str("const volatile unsigned long *get(void);\n", &opts);
        assert_eq!(out, "const volatile unsigned long* get(void);\n");
    }

    #[test]
    fn syntax_errors_produce_no_output() {
        let res = extract("int add(int a, int b;\nvoid run(void);\n", &opts());
        assert!(res.is_err());
        assert!(res
            .diagnostics()
            .any(|(_, d)| matches!(d.code(), Code::SyntaxError | Code::MissingToken)));
    }

    #[test]
    fn ast_dump_mentions_the_declared_names() {
        let opts = ExtractOptsBuilder::new()
            .preprocess(false)
            .output_format(OutputFormat::AstRustDbg)
            .build()
            .unwrap();
        let out = extract_str("int add(int a, int b);\n", &opts);
        assert!(out.starts_with("TranslationUnit {"), "{out}");
        assert!(out.contains("\"add\""));
    }

    #[test]
    fn load_source_without_preprocessor_reports_missing_files() {
        let res = load_source(Path::new("/this/file/does/not/exist.h"), &opts());
        assert!(matches!(res, Err(LoadError::Read { .. })));
    }
}
