//! Runs the `fxlab` binary end to end.

use std::process::{Command, Output};

fn fxlab(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fxlab"));
    for var in [
        "FXLAB_IMAGE",
        "FXLAB_FILTER",
        "FXLAB_BACKEND",
        "FXLAB_VERIFY",
        "FXLAB_WORK_GROUP",
        "FXLAB_SIZE",
        "FXLAB_ITERATIONS",
        "FXLAB_DEVICE",
    ] {
        cmd.env_remove(var);
    }
    cmd.args(args).output().expect("failed to launch fxlab")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn filters_listed_in_order() {
    let out = fxlab(&["filters"]);
    assert!(out.status.success());
    let text = stdout(&out);
    let names: Vec<&str> = text.lines().filter_map(|l| l.split_whitespace().nth(1)).collect();
    assert_eq!(names, ["Copy", "Bilateral", "Blur", "Sharpen", "Sobel"]);
}

#[test]
fn backends_always_include_reference() {
    let out = fxlab(&["backends"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("[+] reference"));
}

#[test]
fn compiled_cpu_run_verifies() {
    let out = fxlab(&["run", "-f", "blur", "-b", "halide_cpu", "-s", "48", "-n", "1"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("Running compiled CPU filter"), "{text}");
    assert!(text.contains("(verification passed)"), "{text}");
    assert!(text.contains("Result: success"), "{text}");
}

#[test]
fn unmatched_filter_does_not_run() {
    let out = fxlab(&["run", "-f", "emboss", "-b", "reference", "-s", "16"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("Nothing to run"), "{text}");
    assert!(!text.contains("Running reference"), "{text}");
}

#[test]
fn environment_supplies_parameters() {
    let out = Command::new(env!("CARGO_BIN_EXE_fxlab"))
        .args(["run", "-s", "16"])
        .env("FXLAB_FILTER", "copy")
        .env("FXLAB_BACKEND", "REFERENCE")
        .env_remove("FXLAB_SIZE")
        .output()
        .expect("failed to launch fxlab");
    assert!(out.status.success());
    assert!(stdout(&out).contains("Finished reference"));
}

#[test]
fn oversized_work_group_fails() {
    let out = fxlab(&[
        "run", "-f", "sobel", "-b", "opencl", "-w", "64x64", "-s", "64", "-n", "1",
    ]);
    assert!(!out.status.success());
    assert!(stdout(&out).contains("Result: failure"));
}

#[cfg(not(feature = "wgpu"))]
#[test]
fn device_without_gpu_support_fails_gpu_run() {
    let out = fxlab(&["run", "-f", "copy", "-b", "halide_gpu", "-d", "0", "-s", "16", "-n", "1"]);
    assert!(!out.status.success());
    assert!(stdout(&out).contains("Result: failure"));
}
