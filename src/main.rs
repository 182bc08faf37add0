use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use vmil::{driver, verify, TranslateOptions};

#[derive(Parser)]
#[command(name = "vmil")]
#[command(about = "Translates VM intermediate code into Hack assembly")]
#[command(version)]
struct Cli {
    /// Directory of .vm files, or a single .vm file
    path: PathBuf,

    /// Write assembly here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the SP initialisation and Sys.init call
    #[arg(long)]
    no_bootstrap: bool,

    /// Omit the comment naming each VM command
    #[arg(long)]
    no_comments: bool,

    /// Report operand stack problems as warnings
    #[arg(long)]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = TranslateOptions {
        bootstrap: !cli.no_bootstrap,
        comments: !cli.no_comments,
    };

    let files = driver::load(&cli.path)?;
    let units = driver::parse(&files)?;

    if cli.check {
        for issue in verify::check_stack(units.iter().flat_map(|u| &u.commands)) {
            log::warn!("{}", issue);
        }
    }

    let instructions = driver::translate_units(&units, &options)?;
    let text = driver::render(&instructions);

    match &cli.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!(
                "wrote {} instructions from {} file(s) to {}",
                instructions.len(),
                files.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("failed to write to stdout")?;
        }
    }

    Ok(())
}
