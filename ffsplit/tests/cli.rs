#![cfg(unix)]

use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

/// Install an executable shell script standing in for ffprobe or ffmpeg.
///
/// The binary only talks to the external tools through their command-line
/// contract, so scripted shims are enough to exercise the whole CLI without
/// a real ffmpeg installation.
fn write_shim(dir: &Path, name: &str, body: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, body)?;
    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms)?;
    Ok(path)
}

/// ffprobe shim answering the duration query with a fixed value.
fn probe_shim(dir: &Path, duration: &str) -> Result<PathBuf, Box<dyn Error>> {
    write_shim(dir, "ffprobe", &format!("#!/bin/sh\nprintf '{duration}\\n'\n"))
}

/// ffmpeg shim that appends its arguments to a log file and creates an
/// empty file at the output path (the final argument).
fn ffmpeg_shim(dir: &Path, log: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let body = format!(
        "#!/bin/sh\n\
         printf '%s\\n' \"$@\" >> '{log}'\n\
         for arg in \"$@\"; do out=\"$arg\"; done\n\
         : > \"$out\"\n",
        log = log.display()
    );
    write_shim(dir, "ffmpeg", &body)
}

fn write_input(dir: &Path, name: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    File::create(&path)?.write_all(b"not real audio, never decoded here")?;
    Ok(path)
}

#[test]
fn cli_splits_audio_into_chunks_with_remainder() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = write_input(work_dir.path(), "tone.mp3")?;
    let log = work_dir.path().join("ffmpeg.log");
    let ffprobe = probe_shim(work_dir.path(), "70.0")?;
    let ffmpeg = ffmpeg_shim(work_dir.path(), &log)?;
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    cmd.args(["--length", "30s", "--output"])
        .arg(output_dir.path())
        .arg("--ffprobe")
        .arg(&ffprobe)
        .arg("--ffmpeg")
        .arg(&ffmpeg)
        .arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 chunk(s)"));

    let mut chunks: Vec<_> = fs::read_dir(output_dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    chunks.sort();
    assert_eq!(chunks, vec!["001_tone.mp3", "002_tone.mp3", "003_tone.mp3"]);

    output_dir.close()?;
    work_dir.close()?;
    Ok(())
}

#[test]
fn cli_bare_chunk_length_is_minutes() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = write_input(work_dir.path(), "tone.mp3")?;
    let log = work_dir.path().join("ffmpeg.log");
    let ffprobe = probe_shim(work_dir.path(), "70.0")?;
    let ffmpeg = ffmpeg_shim(work_dir.path(), &log)?;
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    cmd.args(["--length", "1", "--output"])
        .arg(output_dir.path())
        .arg("--ffprobe")
        .arg(&ffprobe)
        .arg("--ffmpeg")
        .arg(&ffmpeg)
        .arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 chunk(s)"));

    assert_eq!(fs::read_dir(output_dir.path())?.count(), 2);

    output_dir.close()?;
    work_dir.close()?;
    Ok(())
}

#[test]
fn cli_dry_run_prints_plan_without_invoking_ffmpeg() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = write_input(work_dir.path(), "tone.mp3")?;
    let ffprobe = probe_shim(work_dir.path(), "70.0")?;
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    let assert = cmd
        .args(["--length", "30s", "--dry-run", "--output"])
        .arg(output_dir.path())
        .arg("--ffprobe")
        .arg(&ffprobe)
        // Deliberately unusable; a dry run must never reach ffmpeg.
        .arg("--ffmpeg")
        .arg(work_dir.path().join("missing-ffmpeg"))
        .arg(&input)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert!(stdout.contains("Dry run: would generate 3 chunk(s):"));
    for name in ["001_tone.mp3", "002_tone.mp3", "003_tone.mp3"] {
        assert!(stdout.contains(name), "missing dry-run entry for {name}");
    }

    assert!(
        fs::read_dir(output_dir.path())?.next().is_none(),
        "dry run should not create files"
    );

    output_dir.close()?;
    work_dir.close()?;
    Ok(())
}

#[test]
fn cli_normalize_passes_the_speechnorm_filter() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = write_input(work_dir.path(), "talk.mp3")?;
    let log = work_dir.path().join("ffmpeg.log");
    let ffprobe = probe_shim(work_dir.path(), "45.0")?;
    let ffmpeg = ffmpeg_shim(work_dir.path(), &log)?;
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    cmd.args(["--length", "30s", "--normalize", "--output"])
        .arg(output_dir.path())
        .arg("--ffprobe")
        .arg(&ffprobe)
        .arg("--ffmpeg")
        .arg(&ffmpeg)
        .arg(&input);
    cmd.assert().success();

    let logged = fs::read_to_string(&log)?;
    assert!(logged.contains("-filter:a"));
    assert!(logged.contains("speechnorm=e=12.5:r=0.0001:l=1"));

    output_dir.close()?;
    work_dir.close()?;
    Ok(())
}

#[test]
fn cli_reports_missing_input_file() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    cmd.args(["--length", "30s", "--output"])
        .arg(output_dir.path())
        .arg("missing.mp3");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("input file does not exist"));

    output_dir.close()?;
    Ok(())
}

#[test]
fn cli_rejects_zero_chunk_length() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = write_input(work_dir.path(), "tone.mp3")?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    cmd.args(["--length", "0"]).arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));

    work_dir.close()?;
    Ok(())
}

#[test]
fn cli_surfaces_ffmpeg_failure_with_stderr() -> Result<(), Box<dyn Error>> {
    let work_dir = tempdir()?;
    let input = write_input(work_dir.path(), "tone.mp3")?;
    let ffprobe = probe_shim(work_dir.path(), "70.0")?;
    let ffmpeg = write_shim(
        work_dir.path(),
        "ffmpeg",
        "#!/bin/sh\necho 'boom: encoder exploded' >&2\nexit 1\n",
    )?;
    let output_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("ffsplit")?;
    cmd.args(["--length", "30s", "--output"])
        .arg(output_dir.path())
        .arg("--ffprobe")
        .arg(&ffprobe)
        .arg("--ffmpeg")
        .arg(&ffmpeg)
        .arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("boom: encoder exploded"));

    output_dir.close()?;
    work_dir.close()?;
    Ok(())
}
