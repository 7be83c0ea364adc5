mod cli;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use ffsplit_core::{plan_split, run_with_progress, Config, OutputFormat, ProgressEvent};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_path = matches
        .get_one::<PathBuf>("file_path")
        .expect("required argument");
    if !input_path.is_file() {
        return Err(anyhow!(
            "input file does not exist: {}",
            input_path.display()
        ));
    }

    let chunk_length = *matches
        .get_one::<Duration>("length")
        .expect("required argument");
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .expect("defaulted argument");
    let format = *matches
        .get_one::<OutputFormat>("format")
        .expect("defaulted argument");
    let ffmpeg = matches
        .get_one::<PathBuf>("ffmpeg")
        .expect("defaulted argument");
    let ffprobe = matches
        .get_one::<PathBuf>("ffprobe")
        .expect("defaulted argument");

    let config = Config::builder(input_path, output_dir, chunk_length)
        .format(format)
        .normalize(matches.get_flag("normalize"))
        .overwrite(matches.get_flag("overwrite"))
        .ffmpeg_program(ffmpeg)
        .ffprobe_program(ffprobe)
        .build()
        .with_context(|| {
            format!(
                "failed to create configuration for '{}'",
                input_path.display()
            )
        })?;

    if matches.get_flag("dry-run") {
        let plan = plan_split(&config)
            .with_context(|| format!("failed to plan chunks for '{}'", input_path.display()))?;

        if plan.is_empty() {
            println!("Dry run: no chunks would be generated.");
        } else {
            println!("Dry run: would generate {} chunk(s):", plan.len());
            for path in plan.output_paths() {
                println!("  {}", path.display());
            }
        }

        return Ok(());
    }

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());

    let bar_style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    let progress_handle = progress.clone();
    let result = run_with_progress(&config, move |event| match event {
        ProgressEvent::Start { chunks, .. } => {
            progress_handle.set_style(bar_style.clone());
            progress_handle.set_length(chunks as u64);
            progress_handle.enable_steady_tick(Duration::from_millis(100));
        }
        ProgressEvent::ChunkWritten { path, .. } => {
            progress_handle.inc(1);
            if let Some(name) = path.file_name() {
                progress_handle.set_message(name.to_string_lossy().into_owned());
            }
        }
        ProgressEvent::Finish => {
            progress_handle.set_message(String::from("Completed"));
        }
    })
    .with_context(|| format!("failed to split '{}'", input_path.display()));

    progress.finish_and_clear();

    let report = result?;
    println!(
        "Wrote {} chunk(s) to {}",
        report.chunks_written,
        config.output_dir().display()
    );

    Ok(())
}
