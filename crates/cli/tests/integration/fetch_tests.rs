//! `xsim-dist fetch` without network access.
#![cfg(not(windows))]

use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn populated_cache_is_reused() {
  let env = TestEnv::with_sources();
  env.write_file("cache/include/slang/slang.h", "// slang\n");

  env
    .cmd()
    .args(["fetch", "--cache-dir", "cache"])
    .env("XSIM_DIST_PARSER_URL", "http://127.0.0.1:9/slang-{platform}.tar.gz")
    .assert()
    .success()
    .stdout(predicate::str::contains("already cached"));
}

#[test]
fn unreachable_release_fails_without_cache() {
  let env = TestEnv::with_sources();

  env
    .cmd()
    .args(["fetch", "--parser-url", "http://127.0.0.1:9/slang-{platform}.tar.gz"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to fetch parser release"));

  assert!(!env.path("build/slang-dist").exists());
}

#[test]
fn failure_names_each_cause_once() {
  let env = TestEnv::with_sources();

  let output = env
    .cmd()
    .args(["fetch", "--parser-url", "http://127.0.0.1:9/slang-{platform}.tar.gz"])
    .output()
    .unwrap();
  assert!(!output.status.success());

  let stderr = String::from_utf8(output.stderr).unwrap();
  assert_eq!(stderr.matches("fetch failed for http://127.0.0.1:9/").count(), 1, "{stderr}");
  assert!(stderr.contains("caused by:"), "{stderr}");
}

#[test]
fn json_reports_cache_hit() {
  let env = TestEnv::with_sources();
  env.write_file("build/slang-dist/lib/libsvlang.a", "!<arch>");

  let output = env.cmd().args(["-o", "json", "fetch"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["downloaded"], false);
  assert!(json["archive"].as_str().unwrap().starts_with("slang-"));
}
