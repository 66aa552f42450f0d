use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use dex::query::{DEFAULT_JUNIT3_BASE_CLASSES, DEFAULT_JUNIT4_TEST_ANNOTATION};

/// Finds xUnit-3 and xUnit-4 instrumentation test method names in an Android APK.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the APK to scan.
    apk_path: PathBuf,

    /// Extra xUnit-3 base class descriptor, e.g. `Lcom/example/MyTestCase;`.
    /// Repeatable; extends the built-in defaults, doesn't replace them.
    #[arg(long = "base-class")]
    base_classes: Vec<String>,

    /// xUnit-4 test-method annotation descriptor. Overrides the built-in default.
    #[arg(long = "annotation")]
    annotation: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let mut base_classes: Vec<&str> = DEFAULT_JUNIT3_BASE_CLASSES.to_vec();
    base_classes.extend(cli.base_classes.iter().map(String::as_str));
    let annotation = cli.annotation.as_deref().unwrap_or(DEFAULT_JUNIT4_TEST_ANNOTATION);

    match dex::find_instrumentation_tests_in_apk(&cli.apk_path, &base_classes, annotation) {
        Ok(tests) => {
            for test in tests {
                println!("{}", test);
            }
        }
        Err(err) => {
            eprintln!("{}: {}", cli.apk_path.display(), err);
            exit(1);
        }
    }
}
