//! End-to-end pipeline tests against a stub native build.


use std::fs;

use common::{StubBuild, TestEnv, relative_files, tar_gz};
use xsim_dist_lib::assemble::{CopyError, Stage, StepOutcome};
use xsim_dist_lib::config::ConfigOptions;
use xsim_dist_lib::pipeline::{self, PipelineError};
use xsim_dist_lib::platform::PlatformProfile;
use xsim_dist_lib::toolchain::{FetchError, LocateError};
use xsim_dist_lib::util::hash::hash_file;

fn parser_archive() -> Vec<u8> {
  tar_gz(
    "slang-linux",
    &[
      ("include/slang/ast/Compilation.h", b"// slang".as_slice()),
      ("lib/libsvlang.a", b"!<arch>".as_slice()),
    ],
  )
}

fn linux_options(env: &TestEnv, server: &mockito::Server) -> ConfigOptions {
  ConfigOptions {
    parser_url: Some(format!("{}/slang-{{platform}}.tar.gz", server.url())),
    toolchain_root: Some(env.toolchain()),
    ..env.options()
  }
}

#[test]
fn linux_run_produces_package_layout() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new();
  let mock = server
    .mock("GET", "/slang-linux.tar.gz")
    .with_status(200)
    .with_body(parser_archive())
    .expect(1)
    .create();
  let config = env.config(PlatformProfile::Linux, linux_options(&env, &server));
  let runner = StubBuild::for_config(&config);

  let report = pipeline::run(&config, &runner).unwrap();

  mock.assert();
  assert_eq!(
    relative_files(&config.staging_dir),
    vec![
      "bin/g++",
      "bin/xsim",
      "include/logic/logic.hh",
      "include/marl/scheduler.h",
      "include/runtime/module.hh",
      "lib/libxsim-runtime.so",
      "lib64/libstdc++.a",
      "share/gcc-11.2.0/python/hook.py",
    ]
  );
  assert!(report.toolchain.parser.as_ref().unwrap().downloaded);
  assert_eq!(runner.configure_calls(), 1);
  assert_eq!(runner.build_calls(), 1);

  let cache = config.parser.cache_dir.clone();
  assert!(cache.join("lib/libsvlang.a").is_file());
  assert!(
    relative_files(&config.build_dir)
      .iter()
      .all(|f| !f.ends_with(".tar.gz"))
  );
}

#[test]
fn second_run_only_refreshes_binaries() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new();
  let mock = server
    .mock("GET", "/slang-linux.tar.gz")
    .with_status(200)
    .with_body(parser_archive())
    .expect(1)
    .create();
  let config = env.config(PlatformProfile::Linux, linux_options(&env, &server));
  let runner = StubBuild::for_config(&config);
  pipeline::run(&config, &runner).unwrap();

  let report = pipeline::run(&config, &runner).unwrap();

  mock.assert();
  assert!(!report.toolchain.parser.as_ref().unwrap().downloaded);
  assert_eq!(report.assembly.copied(), 0);
  assert_eq!(report.assembly.refreshed(), 2);
  for step in &report.assembly.steps {
    let expected = match step.stage {
      Stage::RuntimeLibrary | Stage::Executable => StepOutcome::Refreshed,
      _ => StepOutcome::Skipped,
    };
    assert_eq!(step.outcome, expected, "{}", step.destination.display());
  }
}

#[test]
fn staged_binaries_match_build_outputs() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new();
  server
    .mock("GET", "/slang-linux.tar.gz")
    .with_status(200)
    .with_body(parser_archive())
    .create();
  let config = env.config(PlatformProfile::Linux, linux_options(&env, &server));
  let runner = StubBuild::for_config(&config);

  let report = pipeline::run(&config, &runner).unwrap();

  assert_eq!(
    hash_file(&config.staging_dir.join("bin/xsim")).unwrap(),
    hash_file(&report.outputs.executable).unwrap()
  );
  assert_eq!(
    hash_file(&config.staging_dir.join("lib/libxsim-runtime.so")).unwrap(),
    hash_file(&report.outputs.runtime_library).unwrap()
  );
  assert_eq!(
    fs::read(config.staging_dir.join("include/marl/scheduler.h")).unwrap(),
    b"// marl\n"
  );
}

#[test]
fn missing_release_fails_before_configure() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new();
  server.mock("GET", "/slang-macos.tar.gz").with_status(404).create();
  let config = env.config(
    PlatformProfile::MacOs,
    ConfigOptions {
      parser_url: Some(format!("{}/slang-{{platform}}.tar.gz", server.url())),
      ..env.options()
    },
  );
  let runner = StubBuild::for_config(&config);

  let err = pipeline::run(&config, &runner).unwrap_err();

  assert!(matches!(err, PipelineError::Fetch(FetchError::Status { status: 404, .. })));
  assert!(!config.parser.cache_dir.exists());
  assert_eq!(runner.configure_calls(), 0);
}

#[test]
fn missing_toolchain_root_skips_download_and_build() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new();
  let mock = server
    .mock("GET", "/slang-linux.tar.gz")
    .with_body(parser_archive())
    .expect(0)
    .create();
  let config = env.config(
    PlatformProfile::Linux,
    ConfigOptions {
      toolchain_root: Some(env.path("no-gcc")),
      ..linux_options(&env, &server)
    },
  );
  let runner = StubBuild::for_config(&config);

  let err = pipeline::run(&config, &runner).unwrap_err();

  mock.assert();
  assert!(matches!(
    err,
    PipelineError::Copy(CopyError::MissingSource {
      stage: Stage::Toolchain,
      ref path,
    }) if path.ends_with("no-gcc")
  ));
  assert_eq!(runner.configure_calls(), 0);
  assert_eq!(runner.build_calls(), 0);
}

#[test]
fn windows_without_clang_never_configures() {
  let env = TestEnv::new();
  let empty = env.path("empty-bin");
  fs::create_dir_all(&empty).unwrap();
  let config = env.config(
    PlatformProfile::Windows,
    ConfigOptions {
      search_path: Some(empty.into_os_string()),
      ..env.options()
    },
  );
  let runner = StubBuild::for_config(&config);

  let err = pipeline::run(&config, &runner).unwrap_err();

  assert!(matches!(err, PipelineError::Locate(LocateError::ToolchainNotFound { .. })));
  assert_eq!(runner.configure_calls(), 0);
  assert_eq!(runner.build_calls(), 0);
}

#[test]
fn missing_header_tree_stops_assembly() {
  let env = TestEnv::new();
  fs::remove_dir_all(env.path("src/src/runtime")).unwrap();
  let mut server = mockito::Server::new();
  server
    .mock("GET", "/slang-linux.tar.gz")
    .with_status(200)
    .with_body(parser_archive())
    .create();
  let config = env.config(PlatformProfile::Linux, linux_options(&env, &server));
  let runner = StubBuild::for_config(&config);

  let err = pipeline::run(&config, &runner).unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Copy(CopyError::MissingSource {
      stage: Stage::RuntimeHeaders,
      ..
    })
  ));
  // Nothing is rolled back.
  assert!(config.staging_dir.join("include/marl").is_dir());
  assert!(!config.staging_dir.join("bin/xsim").exists());
}
