//! Suite orchestration tests against the scripted runtime

mod support;

use parking_lot::Mutex;
use std::hint::black_box;
use std::sync::Arc;
use support::{ledger_with_contracts, runner, Counter, MockRuntime};
use tessera_test::runtime::ContractValue;
use tessera_test::{
    pretty_print_results, BackendError, CoverageReport, ImportError, ImportResolver, Location, RuntimeError,
    TestError, TestRunner,
};
use tessera_types::Value;

const SUITE: &str = r#"
import Test

fun setup() {}
fun testPass() {}
fun testDivide() {}
fun tearDown() {}
"#;

fn failing_resolver() -> ImportResolver {
    Arc::new(|location: &Location| -> anyhow::Result<String> {
        anyhow::bail!("cannot resolve {location}")
    })
}

// ============================================================================
// Suites
// ============================================================================

#[test]
fn test_setup_pass_divide_teardown() {
    let created = Arc::new(Mutex::new(None));
    let created_in_setup = created.clone();
    let runtime = MockRuntime::new()
        .with_function("setup", move |call| {
            let account = call.test()?.lock().create_account()?;
            *created_in_setup.lock() = Some(account.address);
            Ok(Value::Void)
        })
        .with_function("testDivide", |_| {
            let divisor: i128 = black_box(0);
            Ok(Value::Int(1 / divisor))
        })
        .with_function("tearDown", |call| {
            call.log("\"done\"");
            Ok(Value::Void)
        });
    let runner = runner(runtime);

    let report = runner.run_tests(SUITE).unwrap();
    assert!(report.error.is_none());
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].name, "testPass");
    assert!(report.results[0].is_pass());
    assert_eq!(report.results[1].name, "testDivide");
    assert!(matches!(report.results[1].error, Some(TestError::Panic(_))));

    assert!(created.lock().is_some());
    assert!(runner.logs().contains(&"done".to_string()));

    let printed = pretty_print_results(&report.results, "divide_test.tes");
    assert!(printed.starts_with("Test results: \"divide_test.tes\"\n- PASS: testPass\n- FAIL: testDivide\n\t\t"));
}

#[test]
fn test_all_passing_suite() {
    let script = "fun testA() {}\nfun helper() {}\nfun testB() {}\nfun testC() {}\n";
    let report = runner(MockRuntime::new()).run_tests(script).unwrap();
    let names: Vec<_> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["testA", "testB", "testC"]);
    assert!(report.results.iter().all(|r| r.error.is_none()));
}

#[test]
fn test_failing_case_does_not_stop_suite() {
    let runtime = MockRuntime::new()
        .with_function("testFirst", |_| panic!("first failed"))
        .with_function("testSecond", |_| {
            Err(RuntimeError::AssertionFailed("second failed".into()))
        });
    let report = runner(runtime)
        .run_tests("fun testFirst() {}\nfun testSecond() {}\nfun testThird() {}")
        .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(
        report.results[0].error.as_ref().map(ToString::to_string),
        Some("first failed".to_string())
    );
    assert!(matches!(
        report.results[1].error,
        Some(TestError::Runtime(RuntimeError::AssertionFailed(_)))
    ));
    assert!(report.results[2].is_pass());
}

#[test]
fn test_hooks_run_around_each_case() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let record = |name: &'static str, order: &Arc<Mutex<Vec<&'static str>>>| {
        let order = order.clone();
        move |_: &mut support::Call<'_>| {
            order.lock().push(name);
            Ok::<_, RuntimeError>(Value::Void)
        }
    };
    let runtime = MockRuntime::new()
        .with_function("setup", record("setup", &order))
        .with_function("beforeEach", record("beforeEach", &order))
        .with_function("afterEach", record("afterEach", &order))
        .with_function("tearDown", record("tearDown", &order))
        .with_function("testA", record("testA", &order))
        .with_function("testB", record("testB", &order));
    let script = "fun setup() {}\nfun beforeEach() {}\nfun afterEach() {}\nfun tearDown() {}\nfun testA() {}\nfun testB() {}";

    runner(runtime).run_tests(script).unwrap();
    assert_eq!(
        *order.lock(),
        vec![
            "setup",
            "beforeEach",
            "testA",
            "afterEach",
            "beforeEach",
            "testB",
            "afterEach",
            "tearDown",
        ]
    );
}

#[test]
fn test_before_each_failure_aborts_suite_but_tears_down() {
    let tear_downs = Counter::default();
    let counter = tear_downs.clone();
    let runtime = MockRuntime::new()
        .with_function("beforeEach", |_| Err(RuntimeError::Execution("not ready".into())))
        .with_function("tearDown", move |_| {
            counter.bump();
            Ok(Value::Void)
        });
    let script = "fun beforeEach() {}\nfun tearDown() {}\nfun testA() {}\nfun testB() {}";

    let report = runner(runtime).run_tests(script).unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.error.map(|e| e.to_string()), Some("not ready".to_string()));
    assert_eq!(tear_downs.get(), 1);
}

#[test]
fn test_after_each_failure_keeps_case_result() {
    let runtime = MockRuntime::new()
        .with_function("afterEach", |_| panic!("cleanup failed"));
    let script = "fun afterEach() {}\nfun testA() {}\nfun testB() {}";

    let report = runner(runtime).run_tests(script).unwrap();
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].is_pass());
    assert!(matches!(report.error, Some(TestError::Panic(_))));
}

#[test]
fn test_tear_down_failure_reported() {
    let runtime = MockRuntime::new()
        .with_function("tearDown", |_| Err(RuntimeError::Execution("leak".into())));
    let report = runner(runtime)
        .run_tests("fun tearDown() {}\nfun testA() {}")
        .unwrap();
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].is_pass());
    assert!(report.error.is_some());
}

#[test]
fn test_setup_failure_is_load_error() {
    let tear_downs = Counter::default();
    let counter = tear_downs.clone();
    let runtime = MockRuntime::new()
        .with_function("setup", |_| Err(RuntimeError::Execution("no setup".into())))
        .with_function("tearDown", move |_| {
            counter.bump();
            Ok(Value::Void)
        });
    let result = runner(runtime).run_tests("fun setup() {}\nfun tearDown() {}\nfun testA() {}");
    assert!(result.is_err());
    assert_eq!(tear_downs.get(), 0);
}

#[test]
fn test_same_seed_same_order() {
    let script = (0..12)
        .map(|i| format!("fun test{i}() {{}}"))
        .collect::<Vec<_>>()
        .join("\n");
    let order = |seed: i64| {
        runner(MockRuntime::new())
            .with_random_seed(seed)
            .run_tests(&script)
            .unwrap()
            .results
            .into_iter()
            .map(|r| r.name)
            .collect::<Vec<_>>()
    };

    let declared: Vec<String> = (0..12).map(|i| format!("test{i}")).collect();
    assert_eq!(order(0), declared);
    assert_eq!(order(-3), declared);
    assert_eq!(order(1234), order(1234));

    let mut shuffled = order(1234);
    shuffled.sort();
    let mut sorted = declared.clone();
    sorted.sort();
    assert_eq!(shuffled, sorted);
}

// ============================================================================
// Single Case
// ============================================================================

#[test]
fn test_run_single_case() {
    let tear_downs = Counter::default();
    let counter = tear_downs.clone();
    let runtime = MockRuntime::new()
        .with_function("testB", |_| Err(RuntimeError::AssertionFailed("b".into())))
        .with_function("tearDown", move |_| {
            counter.bump();
            Ok(Value::Void)
        });
    let script = "fun testA() {}\nfun testB() {}\nfun tearDown() {}";

    let report = runner(runtime).run_test(script, "testB").unwrap();
    let result = report.result.unwrap();
    assert_eq!(result.name, "testB");
    assert!(result.error.is_some());
    assert!(report.error.is_none());
    assert_eq!(tear_downs.get(), 1);
}

#[test]
fn test_run_single_case_before_each_fails() {
    let runtime = MockRuntime::new()
        .with_function("beforeEach", |_| Err(RuntimeError::Execution("nope".into())));
    let report = runner(runtime)
        .run_test("fun beforeEach() {}\nfun testA() {}", "testA")
        .unwrap();
    assert!(report.result.is_none());
    assert!(report.error.is_some());
}

#[test]
fn test_run_unknown_case() {
    let report = runner(MockRuntime::new())
        .run_test("fun testA() {}", "testMissing")
        .unwrap();
    assert!(matches!(
        report.result.unwrap().error,
        Some(TestError::Runtime(RuntimeError::FunctionNotFound(_)))
    ));
}

// ============================================================================
// Load Errors
// ============================================================================

#[test]
fn test_function_with_arguments_rejected() {
    let err = runner(MockRuntime::new())
        .run_tests("fun testA(x: Int) {}")
        .unwrap_err();
    assert_eq!(err.to_string(), "test functions should have no arguments");
}

#[test]
fn test_function_with_return_rejected() {
    let err = runner(MockRuntime::new())
        .run_tests("fun testA(): Int {}")
        .unwrap_err();
    assert_eq!(err.to_string(), "test functions should have no return values");
}

#[test]
fn test_helper_signatures_unrestricted() {
    let report = runner(MockRuntime::new())
        .run_tests("fun helper(a: Int, b: Int): Int {}\nfun testA() {}")
        .unwrap();
    assert_eq!(report.results.len(), 1);
}

#[test]
fn test_parse_error() {
    let err = runner(MockRuntime::new()).run_tests("fun broken").unwrap_err();
    assert!(matches!(err, TestError::Runtime(RuntimeError::Parse { .. })));
}

// ============================================================================
// Imports
// ============================================================================

#[test]
fn test_builtins_need_no_resolver() {
    let script = "import Test\nimport Crypto\nimport BlockchainHelpers\nfun testA() {}";
    let report = runner(MockRuntime::new()).run_tests(script).unwrap();
    assert_eq!(report.results.len(), 1);
}

#[test]
fn test_missing_resolver() {
    let err = runner(MockRuntime::new())
        .run_tests("import \"./Foo.tes\"\nfun testA() {}")
        .unwrap_err();
    assert!(matches!(
        err,
        TestError::Runtime(RuntimeError::Import(ImportError::ImportResolverNotProvided(_)))
    ));
}

#[test]
fn test_resolved_path_import_is_constructible() {
    let resolver: ImportResolver = Arc::new(|location: &Location| match location {
        Location::String(path) if path == "./Foo.tes" => Ok("contract Foo {}".to_string()),
        other => anyhow::bail!("unknown import {other}"),
    });
    let runtime = MockRuntime::new().with_function("testFoo", |call| {
        match call.contract("Foo")? {
            ContractValue::Constructor => Ok(Value::Void),
            other => Err(RuntimeError::AssertionFailed(format!("{other:?}"))),
        }
    });

    let report = runner(runtime)
        .with_import_resolver(resolver)
        .run_tests("import \"./Foo.tes\"\nfun testFoo() {}")
        .unwrap();
    assert!(report.results[0].is_pass(), "{:?}", report.results[0].error);
}

#[test]
fn test_resolver_failure_for_path_surfaces() {
    let err = runner(MockRuntime::new())
        .with_import_resolver(failing_resolver())
        .run_tests("import \"./Foo.tes\"\nfun testA() {}")
        .unwrap_err();
    assert!(matches!(
        err,
        TestError::Runtime(RuntimeError::Import(ImportError::Resolve { .. }))
    ));
}

#[test]
fn test_nested_path_import_rejected() {
    let resolver: ImportResolver = Arc::new(|location: &Location| match location {
        Location::String(path) if path == "./Foo.tes" => {
            Ok("import \"./Bar.tes\"\ncontract Foo {}".to_string())
        }
        other => anyhow::bail!("unknown import {other}"),
    });
    let err = runner(MockRuntime::new())
        .with_import_resolver(resolver)
        .run_tests("import \"./Foo.tes\"\nfun testA() {}")
        .unwrap_err();

    let TestError::Runtime(RuntimeError::Import(ImportError::Check { source, .. })) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(matches!(
        *source,
        RuntimeError::Import(ImportError::NestedImportsNotSupported(_))
    ));
}

#[test]
fn test_nested_test_and_address_imports_allowed() {
    let factory = ledger_with_contracts(&[("Bar", "contract Bar {}")]);
    let resolver: ImportResolver = Arc::new(|location: &Location| match location {
        Location::String(path) if path == "./Foo.tes" => {
            Ok("import Test\nimport Bar from 0x02\ncontract Foo {}".to_string())
        }
        other => anyhow::bail!("unknown import {other}"),
    });
    let report = TestRunner::new(MockRuntime::new(), factory)
        .with_import_resolver(resolver)
        .run_tests("import \"./Foo.tes\"\nfun testA() {}")
        .unwrap();
    assert_eq!(report.results.len(), 1);
}

#[test]
fn test_address_import_falls_back_to_ledger() {
    let factory = ledger_with_contracts(&[("Foo", "contract Foo {}")]);
    let runtime = MockRuntime::new()
        .with_function("testUndeployed", |call| {
            call.contract("Foo").map(|_| Value::Void)
        })
        .with_function("testDeployed", |call| {
            let framework = call.test()?;
            let account = framework.lock().create_account()?;
            framework
                .lock()
                .deploy_contract("Foo", "contract Foo {}", &account, &[Value::Int(7)])?;
            match call.contract("Foo")? {
                ContractValue::Deployed {
                    arguments,
                    argument_types,
                } => {
                    assert_eq!(arguments, vec![Value::Int(7)]);
                    assert_eq!(argument_types, vec!["Int".to_string()]);
                    Ok(Value::Void)
                }
                other => Err(RuntimeError::AssertionFailed(format!("{other:?}"))),
            }
        });

    let report = TestRunner::new(runtime, factory)
        .with_import_resolver(failing_resolver())
        .run_tests("import Test\nimport Foo from 0x02\nfun testUndeployed() {}\nfun testDeployed() {}")
        .unwrap();

    assert!(matches!(
        report.results[0].error,
        Some(TestError::Runtime(RuntimeError::Import(
            ImportError::ContractInvocationNotFound(_)
        )))
    ));
    assert!(report.results[1].is_pass(), "{:?}", report.results[1].error);
}

#[test]
fn test_address_import_missing_from_ledger() {
    let err = runner(MockRuntime::new())
        .with_import_resolver(failing_resolver())
        .run_tests("import Foo from 0x09\nfun testA() {}")
        .unwrap_err();
    assert!(matches!(
        err,
        TestError::Runtime(RuntimeError::Import(ImportError::Backend(BackendError::Ledger(_))))
    ));
}

// ============================================================================
// Backend Through Scripts
// ============================================================================

#[test]
fn test_read_file_through_framework() {
    let runtime = MockRuntime::new().with_function("testRead", |call| {
        let contents = call.test()?.lock().read_file("data.json")?;
        assert_eq!(contents, "{}");
        Ok(Value::Void)
    });
    let report = runner(runtime)
        .with_file_resolver(Arc::new(|path: &str| {
            anyhow::ensure!(path == "data.json", "unexpected path {path}");
            Ok("{}".to_string())
        }))
        .run_tests("import Test\nfun testRead() {}")
        .unwrap();
    assert!(report.results[0].is_pass(), "{:?}", report.results[0].error);
}

#[test]
fn test_each_run_gets_fresh_ledger_but_shared_logs() {
    let runtime = MockRuntime::new().with_function("testAccount", |call| {
        let account = call.test()?.lock().create_account()?;
        call.log(&format!("\"{}\"", account.address));
        Ok(Value::Void)
    });
    let runner = runner(runtime);
    let script = "import Test\nfun testAccount() {}";
    runner.run_tests(script).unwrap();
    runner.run_tests(script).unwrap();

    assert_eq!(
        runner.logs(),
        vec!["0x0000000000000002".to_string(), "0x0000000000000002".to_string()]
    );
}

// ============================================================================
// Coverage
// ============================================================================

#[test]
fn test_coverage_excludes_builtins_and_test_script() {
    let report = Arc::new(CoverageReport::new());
    let resolver: ImportResolver = Arc::new(|location: &Location| -> anyhow::Result<String> {
        anyhow::ensure!(*location == Location::String("./Foo.tes".into()), "unexpected {location}");
        Ok("contract Foo {}\nfun helper() {}\nfun other() {}".to_string())
    });
    let report_seen = report.clone();
    let runtime = MockRuntime::new().with_function("testExcluded", move |_| {
        assert!(report_seen.is_location_excluded(&Location::CRYPTO));
        assert!(report_seen.is_location_excluded(&Location::TEST));
        assert!(report_seen.is_location_excluded(&Location::TestScript));
        Ok(Value::Void)
    });

    let suite = runner(runtime)
        .with_import_resolver(resolver)
        .with_coverage_report(report.clone())
        .run_tests("import Test\nimport Foo from \"./Foo.tes\"\nfun testExcluded() {}")
        .unwrap();
    assert!(suite.results[0].is_pass(), "{:?}", suite.results[0].error);

    assert_eq!(
        report.excluded_locations(),
        vec![Location::TestScript, Location::CRYPTO, Location::TEST]
    );
    assert!(report.line_hits(&Location::TestScript).is_none());
    assert!(report.line_hits(&Location::TEST).is_none());

    let foo = Location::String("./Foo.tes".into());
    assert_eq!(report.locations(), vec![foo.clone()]);
    assert_eq!(report.line_hits(&foo).unwrap().len(), 2);
    assert_eq!(report.to_string(), "Coverage: 0.0% of statements");
}

#[test]
fn test_no_coverage_by_default() {
    let runtime = MockRuntime::new().with_function("testPass", |_| Ok(Value::Void));
    let suite = runner(runtime).run_tests("fun testPass() {}").unwrap();
    assert!(suite.results[0].is_pass());
}
