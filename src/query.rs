//! The two instrumentation-test queries this crate exists to answer:
//!
//! * xUnit-3 (`find_junit3_tests`): classes that transitively extend one of a
//!   caller-supplied set of base classes, reporting their `test*` virtual methods.
//! * xUnit-4 (`find_junit4_tests`): methods directly annotated with a
//!   caller-supplied annotation type, default `@org.junit.Test`.
//!
//! Both report results as `Class#method` display names (`class_method_display`)
//! in a `HashSet<String>`, so the two result sets union trivially and
//! duplicates are impossible by construction.
use std::collections::HashSet;
use std::path::Path;

use crate::class::ClassId;
use crate::jtype::dotted_class_name;
use crate::{Dex, DexReader, Result};

/// xUnit-3 base classes recognized when the caller doesn't supply their own.
pub const DEFAULT_JUNIT3_BASE_CLASSES: &[&str] = &[
    "Landroid/test/InstrumentationTestCase;",
    "Ljunit/framework/TestCase;",
    "Landroid/test/ActivityInstrumentationTestCase2;",
];

/// xUnit-4 test-method annotation recognized when the caller doesn't supply their own.
pub const DEFAULT_JUNIT4_TEST_ANNOTATION: &str = "Lorg/junit/Test;";

/// `Lcom/ex/FooTest;` + `testBar` -> `com.ex.FooTest#testBar`.
fn class_method_display(class_descriptor: &str, method_name: &str) -> String {
    format!("{}#{}", dotted_class_name(class_descriptor), method_name)
}

/// xUnit-3: classes transitively extending one of `base_classes`, and their
/// `test*` virtual methods.
///
/// Traversal is a fixpoint over `ClassDefItem::superclass_idx`: start from the
/// classes whose direct superclass descriptor is in `base_classes`, then keep
/// adding classes whose superclass is itself already in the accumulated set,
/// until a pass adds nothing new.
pub fn find_junit3_tests<T: AsRef<[u8]>>(
    dex: &Dex<T>,
    base_classes: &[&str],
) -> Result<HashSet<String>> {
    let mut base_ids: HashSet<ClassId> = HashSet::new();
    for descriptor in base_classes {
        if let Some(id) = dex.get_type_id_by_descriptor(descriptor)? {
            base_ids.insert(id);
        }
    }

    let classes = dex.classes().collect::<Result<Vec<_>>>()?;

    let mut test_class_ids: HashSet<ClassId> = HashSet::new();
    loop {
        let mut grew = false;
        for class in &classes {
            if test_class_ids.contains(&class.id()) {
                continue;
            }
            if let Some(super_id) = class.super_class() {
                if base_ids.contains(&super_id) || test_class_ids.contains(&super_id) {
                    test_class_ids.insert(class.id());
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    let mut tests = HashSet::new();
    for class in &classes {
        if !test_class_ids.contains(&class.id()) {
            continue;
        }
        for method in class.virtual_methods() {
            if method.looks_like_junit3_test() {
                tests.insert(class_method_display(class.jtype().descriptor(), method.name()));
            }
        }
    }
    Ok(tests)
}

/// xUnit-4: methods whose annotations include `test_annotation`.
pub fn find_junit4_tests<T: AsRef<[u8]>>(
    dex: &Dex<T>,
    test_annotation: &str,
) -> Result<HashSet<String>> {
    let target_id = match dex.get_type_id_by_descriptor(test_annotation)? {
        Some(id) => id,
        None => return Ok(HashSet::new()),
    };

    let mut tests = HashSet::new();
    for class in dex.classes() {
        let class = class?;
        for method in class.methods() {
            let is_test = method
                .annotations()
                .annotations()
                .iter()
                .any(|item| item.annotation().type_idx() == target_id);
            if is_test {
                tests.insert(class_method_display(class.jtype().descriptor(), method.name()));
            }
        }
    }
    Ok(tests)
}

/// Runs both queries over a single already-open dex file and unions the results.
pub fn find_instrumentation_tests<T: AsRef<[u8]>>(
    dex: &Dex<T>,
    junit3_base_classes: &[&str],
    junit4_test_annotation: &str,
) -> Result<HashSet<String>> {
    let mut tests = find_junit3_tests(dex, junit3_base_classes)?;
    tests.extend(find_junit4_tests(dex, junit4_test_annotation)?);
    Ok(tests)
}

/// Extracts every `classes*.dex` from an APK and runs both queries over each
/// one, unioning the results (an APK built with multidex has its classes
/// split across `classes.dex`, `classes2.dex`, ...).
pub fn find_instrumentation_tests_in_apk<P: AsRef<Path>>(
    apk_path: P,
    junit3_base_classes: &[&str],
    junit4_test_annotation: &str,
) -> Result<HashSet<String>> {
    let (_tmp, dex_paths) = crate::zipio::extract_dex_files(apk_path.as_ref())?;
    let mut tests = HashSet::new();
    for dex_path in dex_paths {
        let dex = DexReader::from_file(&dex_path)?;
        tests.extend(find_instrumentation_tests(
            &dex,
            junit3_base_classes,
            junit4_test_annotation,
        )?);
    }
    Ok(tests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_classes_cover_all_three_junit3_hierarchies() {
        assert!(DEFAULT_JUNIT3_BASE_CLASSES.contains(&"Ljunit/framework/TestCase;"));
        assert!(DEFAULT_JUNIT3_BASE_CLASSES.contains(&"Landroid/test/InstrumentationTestCase;"));
        assert!(DEFAULT_JUNIT3_BASE_CLASSES.contains(&"Landroid/test/ActivityInstrumentationTestCase2;"));
    }

    #[test]
    fn class_method_display_strips_l_and_semicolon_and_dots_slashes() {
        assert_eq!(class_method_display("Lcom/ex/FooTest;", "testBar"), "com.ex.FooTest#testBar");
    }
}
