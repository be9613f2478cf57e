//! CLI command execution.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use cmdline::config::Config;
use cmdline::{Error, OutputLine, ProcessWrapper, RunReport};

use super::args::{Cli, Commands, OutputArgs};

/// Execute the parsed CLI and return the exit code for this process.
pub async fn execute(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            program,
            args,
            dir,
            output,
        } => run_wrapper(ProcessWrapper::new(program, dir), &args, output).await,

        Commands::Preset { name, args, output } => {
            let config = Config::load(cli.config.as_deref())?;
            let preset = config.preset(&name)?;
            let args = args.as_deref().unwrap_or(&preset.args);
            run_wrapper(preset.wrapper(), args, output).await
        }

        Commands::Presets => {
            let config = Config::load(cli.config.as_deref())?;
            list_presets(&config);
            Ok(0)
        }
    }
}

/// Run a wrapper to completion, echoing its output, and return its exit code.
async fn run_wrapper(wrapper: ProcessWrapper, args: &str, output: OutputArgs) -> Result<i32> {
    let stdout_lines = Arc::new(AtomicUsize::new(0));
    let stderr_lines = Arc::new(AtomicUsize::new(0));

    let mut wrapper = {
        let stdout_lines = Arc::clone(&stdout_lines);
        let stderr_lines = Arc::clone(&stderr_lines);
        wrapper.on_output(move |line: &OutputLine| {
            match line {
                OutputLine::Stdout(text) => {
                    stdout_lines.fetch_add(1, Ordering::Relaxed);
                    let prefix = if output.tag { "[out] " } else { "" };
                    writeln!(std::io::stdout().lock(), "{prefix}{text}")?;
                }
                OutputLine::Stderr(text) => {
                    stderr_lines.fetch_add(1, Ordering::Relaxed);
                    let prefix = if output.tag { "[err] " } else { "" };
                    writeln!(std::io::stderr().lock(), "{prefix}{text}")?;
                }
                OutputLine::Closed(stream) => {
                    tracing::trace!(%stream, "stream closed");
                }
            }
            Ok(())
        })
    };

    let result = wrapper.start_async(args).await;
    let code = match result {
        Ok(code) => code,
        Err(Error::WorkingDirectoryNotFound(dir)) => {
            bail!("Working directory not found: {}", dir.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to run {}", wrapper.program()));
        }
    };

    tracing::info!(program = %wrapper.program(), code, "process finished");

    if output.json {
        let report = RunReport::from_wrapper(
            &wrapper,
            stdout_lines.load(Ordering::Relaxed),
            stderr_lines.load(Ordering::Relaxed),
        );
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    }

    Ok(code)
}

/// Print configured presets, one per line.
fn list_presets(config: &Config) {
    if config.presets.is_empty() {
        println!("No presets configured.");
        if let Some(path) = Config::default_path() {
            println!("Add some to {}", path.display());
        }
        return;
    }

    for (name, preset) in &config.presets {
        println!(
            "{name:<16} {} {}  (in {})",
            preset.program,
            preset.args,
            preset.working_dir.display()
        );
    }
}
