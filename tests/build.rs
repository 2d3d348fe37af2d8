use std::{
    env,
    error::Error,
    ffi::OsStr,
    fs::{self, File},
    io::{self, BufRead},
    path::Path,
};
use walkdir::WalkDir;

enum Test {
    Output(String),
    Diagnostics(Vec<String>),
}

fn parse_file<P>(filename: P) -> Option<(Test, bool)>
where
    P: AsRef<Path>,
{
    let file = File::open(&filename)
        .unwrap_or_else(|_| panic!("Failed to open file {}", filename.as_ref().display()));
    let mut lines = io::BufReader::new(file).lines();
    let first_line = lines.next().expect("Empty test file").unwrap();

    let (first_line, ignore) = if first_line == "//ignore" {
        (lines.next().expect("Empty test file").unwrap(), true)
    } else {
        (first_line, false)
    };

    // Every annotation line starts with `//`, the first other line ends the header.
    let mut annotations = Vec::new();
    while let Some(Ok(line)) = lines.next() {
        match line.strip_prefix("//") {
            Some(annotation) => annotations.push(annotation.to_owned()),
            None => break,
        }
    }

    let test = match first_line.as_str() {
        "//output:" => {
            let mut expected = String::new();
            for line in annotations {
                expected.push_str(&line);
                expected.push('\n');
            }
            Some(Test::Output(expected))
        }
        "//fail:" => Some(Test::Diagnostics(annotations)),
        _ => {
            println!(
                "cargo:warning=Failed to read test file `{}` starting with {}",
                filename.as_ref().display(),
                first_line
            );
            None
        }
    };

    test.map(|t| (t, ignore))
}

fn make_save(name: &OsStr) -> String {
    name.to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { '_' })
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = env::var("OUT_DIR")?;
    let input_dir = "test_files";

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", input_dir);
    let mut output = String::new();

    let mut i = 0;
    for entry in WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some((test, ignore)) = parse_file(path) {
            let file = path.display().to_string();
            let test = match test {
                Test::Output(expected) => {
                    format!("output_test({:?}, {:?})", file, expected)
                }
                Test::Diagnostics(expected_codes) => {
                    format!(
                        "diagnostics_test({:?}, vec![{}])",
                        file,
                        expected_codes
                            .iter()
                            .map(|c| "Code::".to_owned() + c.trim())
                            .collect::<Vec<_>>()
                            .join(", "),
                    )
                }
            };

            let test_name = path.strip_prefix(input_dir)?;
            let test_name = make_save(test_name.as_os_str());

            let test_specifier = match ignore {
                true => "#[test]\n#[ignore]",
                false => "#[test]",
            };

            let test = format!(
                "{}\nfn {}_{}() {{\n{};\n}}\n",
                test_specifier, test_name, i, test
            );

            output.push_str(&test);
            i += 1;
        }
    }

    fs::write(out_dir + "/tests.rs", output)?;

    Ok(())
}
