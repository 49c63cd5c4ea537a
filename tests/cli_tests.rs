//! End-to-end tests driving the compiled binary.
//!
//! These cover the resolution and menu paths that terminate before any
//! external tooling is invoked, so they run without `cdk` or `aws` installed.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn deployer_in(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cloudforge-deploy")
        .unwrap_or_else(|err| panic!("binary should build: {err}"));
    cmd.current_dir(dir.path());
    cmd.env_remove("CDK_DEFAULT_REGION");
    cmd
}

#[test]
fn help_describes_the_positional_arguments() {
    let mut cmd = Command::cargo_bin("cloudforge-deploy")
        .unwrap_or_else(|err| panic!("binary should build: {err}"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("STACK_NAME"))
        .stdout(predicate::str::contains("DEPLOY_OPTION"));
}

#[test]
fn cancel_exits_cleanly_with_exhausted_input() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    deployer_in(&tmp)
        .args(["demo", "4"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled; nothing was changed."));
    assert!(
        !tmp.path().join("deployment-context.json").exists(),
        "cancel must not write a sidecar"
    );
}

#[test]
fn cancel_with_exhausted_input_reports_prompt_fallbacks() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    deployer_in(&tmp)
        .args(["demo", "4"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("No input available, using default"));
}

#[test]
fn saved_sidecar_skips_interactive_collection() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    std::fs::write(
        tmp.path().join("deployment-context.json"),
        r#"{"stackName":"saved-stack","context":{"deploymentType":"jenkins","runtime":"EC2"}}"#,
    )
    .unwrap_or_else(|err| panic!("seed sidecar: {err}"));

    deployer_in(&tmp)
        .args(["saved-stack", "4"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using saved deployment configuration"))
        .stdout(predicate::str::contains("Runtime:          EC2"));
}

#[test]
fn stack_override_replaces_only_the_saved_stack_name() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    std::fs::write(
        tmp.path().join("deployment-context.json"),
        r#"{"stackName":"saved-stack","context":{"deploymentType":"jenkins","runtime":"EC2"}}"#,
    )
    .unwrap_or_else(|err| panic!("seed sidecar: {err}"));

    deployer_in(&tmp)
        .args(["cli-stack", "4"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stack:            cli-stack"))
        .stdout(predicate::str::contains("Runtime:          EC2"));
}

#[test]
fn unknown_saved_deployment_type_fails_before_the_menu() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    std::fs::write(
        tmp.path().join("deployment-context.json"),
        r#"{"stackName":"saved-stack","context":{"deploymentType":"lambda"}}"#,
    )
    .unwrap_or_else(|err| panic!("seed sidecar: {err}"));

    deployer_in(&tmp)
        .args(["demo", "2"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown deployment type"))
        .stderr(predicate::str::contains("jenkins, s3-website, s3-website-mailer"));
}

#[test]
fn corrupt_sidecar_falls_back_to_interactive_collection() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    std::fs::write(tmp.path().join("deployment-context.json"), "{not json")
        .unwrap_or_else(|err| panic!("seed sidecar: {err}"));

    deployer_in(&tmp)
        .args(["demo", "4"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deployment summary"))
        .stdout(predicate::str::contains("Stack:            demo"));
}

#[test]
fn summary_reports_the_derived_iam_profile() {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    std::fs::write(
        tmp.path().join("deployment-context.json"),
        r#"{"stackName":"saved-stack","context":{"deploymentType":"jenkins","securityProfile":"PRODUCTION"}}"#,
    )
    .unwrap_or_else(|err| panic!("seed sidecar: {err}"));

    deployer_in(&tmp)
        .args(["saved-stack", "4"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("PRODUCTION (IAM MINIMAL)"));
}
