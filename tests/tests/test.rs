use std::{convert::Infallible, fs, path::Path};

use fdecl_lib::{
    diagnostic::{AggregateResult, Code, DiagnosticKind},
    extract::{self, ExtractError, ExtractOpts, ExtractOptsBuilder, LoadError},
    passes::{func_decls::QualifierPolicy, preprocess::PreprocessError},
    signature::{Parameter, Signature},
};

include! {concat!(env!("OUT_DIR"), "/tests.rs")}

fn unpreprocessed() -> ExtractOpts {
    ExtractOptsBuilder::new().preprocess(false).build().unwrap()
}

fn extract_file(file: &str) -> AggregateResult<Vec<u8>> {
    let source = fs::read_to_string(file).unwrap();
    extract::extract(&source, &unpreprocessed())
}

fn print_diagnostics<T>(res: &AggregateResult<T>) {
    for (t, d) in res.diagnostics() {
        match t {
            DiagnosticKind::Rec => println!("Rec: {d:?}"),
            DiagnosticKind::Err => println!("Err: {d:?}"),
        }
    }
}

fn output_test(file: &str, expected: &str) {
    let res = extract_file(file);
    if res.is_err() {
        println!(
            "Expected file `{}` to be extracted successfully but got the following diagnostics:",
            file
        );
        print_diagnostics(&res);
        println!();
    }
    let output = String::from_utf8(res.into_value().unwrap()).unwrap();

    pretty_assertions::assert_str_eq!(
        output,
        expected,
        "The extracted signatures (left) do not match the expected output (right)",
    );
}

/// Extraction of `file` has to fail, with at least one diagnostic of each expected code.
fn diagnostics_test(file: &str, expected_codes: Vec<Code>) {
    let res = extract_file(file);
    if !res.is_err() {
        print_diagnostics(&res);
        panic!("Expected extraction of `{file}` to fail, but it didn't!");
    }

    let found_codes: Vec<Code> = res.diagnostics().map(|(_, d)| *d.code()).collect();
    for code in &expected_codes {
        if !found_codes.contains(code) {
            println!(
                "Expected to find these diagnostic codes: {:?}
                              But found: {:?}",
                expected_codes, found_codes
            );
            panic!("Missing diagnostic {code:?}");
        }
    }
}

fn collect_signatures(path: &Path, opts: &ExtractOpts) -> Vec<Signature> {
    let mut found = Vec::new();
    let mut reporter = |signature: Signature| -> Result<(), Infallible> {
        found.push(signature);
        Ok(())
    };
    extract::iterate_func_decls(path, opts, &mut reporter).unwrap();
    found
}

#[test]
fn iterate_func_decls_reports_structured_signatures() {
    let header = temp_file::with_contents(
        b"int add(int a, int b);\nvoid run(void);\nchar *copy(const char *src);\n",
    );

    let found = collect_signatures(header.path(), &unpreprocessed());

    pretty_assertions::assert_eq!(
        found,
        vec![
            Signature {
                return_type: "int".to_owned(),
                name: "add".to_owned(),
                parameters: vec![
                    Parameter::new("int", Some("a")),
                    Parameter::new("int", Some("b")),
                ],
            },
            Signature {
                return_type: "void".to_owned(),
                name: "run".to_owned(),
                parameters: vec![Parameter::new("void", None)],
            },
            Signature {
                return_type: "char*".to_owned(),
                name: "copy".to_owned(),
                parameters: vec![Parameter::new("const char*", Some("src"))],
            },
        ]
    );
}

#[test]
fn reporter_error_is_returned() {
    let header = temp_file::with_contents(b"int one(void);\nint two(void);\n");

    let mut calls = 0;
    let mut reporter = |_: Signature| -> Result<(), &'static str> {
        calls += 1;
        Err("stop")
    };
    let res = extract::iterate_func_decls(header.path(), &unpreprocessed(), &mut reporter);

    assert!(matches!(res, Err(ExtractError::Visit(_))));
    assert_eq!(calls, 1);
}

#[test]
fn syntax_errors_are_front_end_failures() {
    let header = temp_file::with_contents(b"int broken(int a;\n");

    let mut reporter = |_: Signature| -> Result<(), Infallible> {
        panic!("nothing should be reported");
    };
    let res = extract::iterate_func_decls(header.path(), &unpreprocessed(), &mut reporter);

    match res {
        Err(ExtractError::FrontEnd(diagnostics)) => assert!(!diagnostics.is_empty()),
        other => panic!("expected a front end failure, got {other:?}"),
    }
}

#[test]
fn full_types_policy_reaches_the_reporter() {
    let header = temp_file::with_contents(b"const volatile unsigned long *get(void);\n");
    let opts = ExtractOptsBuilder::new()
        .preprocess(false)
        .qualifier_policy(QualifierPolicy::All)
        .build()
        .unwrap();

    let found = collect_signatures(header.path(), &opts);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].return_type, "const volatile unsigned long*");
}

#[test]
fn preprocessor_expands_macros() {
    let header = temp_file::with_contents(b"#define RET int\nRET answer(void);\n");
    let opts = ExtractOptsBuilder::new().build().unwrap();

    let source = match extract::load_source(header.path(), &opts) {
        Ok(source) => source,
        Err(LoadError::Preprocess(PreprocessError::Spawn { program, .. })) => {
            println!("skipping, `{program}` is not available");
            return;
        }
        Err(err) => panic!("preprocessing failed: {err:?}"),
    };

    let res = extract::extract(&source, &opts);
    let output = String::from_utf8(res.into_value().unwrap()).unwrap();
    pretty_assertions::assert_str_eq!(output, "int answer(void);\n");
}
