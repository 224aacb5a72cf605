use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

fn whitepoint(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_whitepoint"))
        .args(args)
        .env("RUST_LOG", "debug")
        .output()
        .expect("failed to run whitepoint")
}

fn write_config(dir: &Path, framebuffer: &Path, command: &str, args: &[&str]) -> String {
    let path = dir.join("whitepoint.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "display:
  device: {}
  width: 4
  height: 2
  bits_per_pixel: 32
  stride: 16
meter:
  command: {command:?}
  args: {args:?}
",
        framebuffer.display()
    )
    .unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn print_config_shows_defaults() {
    let out = whitepoint(&["--config", "/nonexistent/whitepoint.yaml", "--print-config"]);

    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("strategy: secant"));
    assert!(stdout.contains("pinning: largest"));
    assert!(stdout.contains("command: spotread"));
}

#[test]
fn meter_that_never_answers_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let fb = dir.path().join("fb0");
    std::fs::File::create(&fb).unwrap();

    /* consume the trigger, print a prompt without a reading, then exit */
    let config = write_config(
        dir.path(),
        &fb,
        "sh",
        &["-c", "head -c 1 >/dev/null; echo 'Place instrument on spot'"],
    );

    let out = whitepoint(&["--config", &config, "--strategy", "descent"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("Whitepoint error: Meter output ended without a measurement"),
        "stderr: {stderr}"
    );

    /* the display was painted white before the first reading */
    let frame = std::fs::read(&fb).unwrap();
    assert_eq!(frame, vec![255; 32]);
}

#[test]
fn missing_meter_command_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let fb = dir.path().join("fb0");
    std::fs::File::create(&fb).unwrap();
    let config = write_config(dir.path(), &fb, "/nonexistent/spotread", &[]);

    let out = whitepoint(&["--config", &config]);

    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_framebuffer_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("absent"), "true", &[]);

    let out = whitepoint(&["--config", &config]);

    assert_eq!(out.status.code(), Some(1));
}
