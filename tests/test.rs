use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

use dex::query::{find_instrumentation_tests, DEFAULT_JUNIT3_BASE_CLASSES, DEFAULT_JUNIT4_TEST_ANNOTATION};
use dex::DexReader;

/// Minimal stand-ins for the JUnit3/JUnit4 framework classes, so fixtures
/// compile without a real junit.jar on the classpath.
const JUNIT3_TESTCASE_STUB: &str = r#"
    package junit.framework;
    public class TestCase {}
"#;

const INSTRUMENTATION_TESTCASE_STUB: &str = r#"
    package android.test;
    public class InstrumentationTestCase {}
"#;

const JUNIT4_TEST_ANNOTATION_STUB: &str = r#"
    package org.junit;
    import java.lang.annotation.ElementType;
    import java.lang.annotation.Retention;
    import java.lang.annotation.RetentionPolicy;
    import java.lang.annotation.Target;
    @Retention(RetentionPolicy.RUNTIME)
    @Target(ElementType.METHOD)
    public @interface Test {}
"#;

struct TestBuilder {
    root: TempDir,
    sources: Vec<PathBuf>,
}

impl TestBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            root: TempDir::new().expect("cannot create temporary directory"),
            sources: Vec::new(),
        };
        builder.add_src("junit/framework/TestCase.java", JUNIT3_TESTCASE_STUB);
        builder.add_src("android/test/InstrumentationTestCase.java", INSTRUMENTATION_TESTCASE_STUB);
        builder.add_src("org/junit/Test.java", JUNIT4_TEST_ANNOTATION_STUB);
        builder
    }

    pub fn add_src<P: AsRef<Path>>(&mut self, path: P, code: &str) {
        let dest = self.root.path().join(path);
        fs::create_dir_all(dest.parent().unwrap()).expect("cannot create source directory");
        fs::write(&dest, code).unwrap_or_else(|_| panic!("unable to write code to path: {}", dest.display()));
        self.sources.push(dest);
    }

    fn get_class_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter_map(|p| {
                let filename = p.to_str().unwrap();
                if filename.ends_with(".java") {
                    Some(filename.trim_end_matches(".java").to_owned() + ".class")
                } else {
                    None
                }
            })
            .collect()
    }

    fn compile(&self) -> PathBuf {
        let _javac = Command::new("javac")
            .args(&self.sources)
            .current_dir(self.root.path())
            .status()
            .expect("javac failed");
        let classes = self.get_class_names();
        assert!(!classes.is_empty());
        let _d8 = Command::new("d8")
            .args(&classes)
            .args(["--output", &self.root.path().display().to_string()])
            .current_dir(self.root.path())
            .status()
            .unwrap_or_else(|_| panic!("'d8 {:?}' failed", &classes));
        self.root.path().join("classes.dex")
    }
}

macro_rules! test {
    ($test_name: ident, $({ $fname:expr => $code:expr });+, $test_func:expr) => {
        #[test]
        fn $test_name() {
            let mut builder = TestBuilder::new();
            $(
                builder.add_src($fname, $code);
            )*
            let dex_path = builder.compile();
            let dex = DexReader::from_file(dex_path.as_path());
            assert!(dex.is_ok());
            $test_func(dex.unwrap());
        }
    };
}

test!(
    finds_junit3_test_method_on_testcase_subclass,
    {
        "FooTest.java" => r#"
            public class FooTest extends junit.framework.TestCase {
                public void testFoo() {}
                public void helperBar() {}
            }
        "#
    },
    |dex: dex::Dex<_>| {
        let tests = find_instrumentation_tests(&dex, DEFAULT_JUNIT3_BASE_CLASSES, DEFAULT_JUNIT4_TEST_ANNOTATION)
            .expect("query should succeed");
        assert!(tests.contains("FooTest#testFoo"));
        assert!(!tests.iter().any(|t| t.contains("helperBar")));
    }
);

test!(
    finds_junit3_test_method_through_multi_level_inheritance,
    {
        "BaseTest.java" => r#"
            public class BaseTest extends android.test.InstrumentationTestCase {}
        "#
    };
    {
        "MidTest.java" => r#"
            public class MidTest extends BaseTest {}
        "#
    };
    {
        "LeafTest.java" => r#"
            public class LeafTest extends MidTest {
                public void testLeaf() {}
            }
        "#
    },
    |dex: dex::Dex<_>| {
        let tests = find_instrumentation_tests(&dex, DEFAULT_JUNIT3_BASE_CLASSES, DEFAULT_JUNIT4_TEST_ANNOTATION)
            .expect("query should succeed");
        assert!(tests.contains("LeafTest#testLeaf"));
    }
);

test!(
    finds_junit4_annotated_test_method,
    {
        "BarTest.java" => r#"
            public class BarTest {
                @org.junit.Test
                public void testBaz() {}

                public void notATest() {}
            }
        "#
    },
    |dex: dex::Dex<_>| {
        let tests = find_instrumentation_tests(&dex, DEFAULT_JUNIT3_BASE_CLASSES, DEFAULT_JUNIT4_TEST_ANNOTATION)
            .expect("query should succeed");
        assert!(tests.contains("BarTest#testBaz"));
        assert!(!tests.iter().any(|t| t.contains("notATest")));
    }
);

test!(
    unrelated_classes_contribute_no_tests,
    {
        "Plain.java" => r#"
            public class Plain {
                public void testLooksLikeOneButIsnt() {}
            }
        "#
    },
    |dex: dex::Dex<_>| {
        let tests = find_instrumentation_tests(&dex, DEFAULT_JUNIT3_BASE_CLASSES, DEFAULT_JUNIT4_TEST_ANNOTATION)
            .expect("query should succeed");
        assert!(tests.is_empty());
    }
);
