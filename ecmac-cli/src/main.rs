use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ecmac::export::DEFAULT_SUITES_DIR;
use ecmac::{export, AcceptAll, Denylist, ExportOptions, OutputMode, SuiteCode, DEFAULT_ARRAY_NAME};
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
  name = "ecmac",
  version,
  about = "Generate C test case tables from ECMAScript 262 suite JSON"
)]
struct Cli {
  /// Directory holding `ch<NN>.json` suite files.
  #[arg(long, default_value = DEFAULT_SUITES_DIR)]
  suites_dir: PathBuf,

  /// Suite to export, e.g. `06`; repeat to export several. Defaults to chapters 06 through 15.
  #[arg(long = "suite", value_name = "CODE")]
  suites: Vec<SuiteCode>,

  /// Shape of the generated output.
  #[arg(long, value_enum, default_value_t = ModeArg::StringLiterals)]
  mode: ModeArg,

  /// Denylist manifest (TOML or JSON) used instead of the builtin one.
  #[arg(long)]
  denylist: Option<PathBuf>,

  /// Keep snippets regardless of their content; index and negative filters still apply.
  #[arg(long)]
  no_content_filter: bool,

  /// C symbol of the generated pointer table.
  #[arg(long, default_value = DEFAULT_ARRAY_NAME)]
  array_name: String,

  /// Output destination; omit for stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Log per-suite progress to stderr (filter with `RUST_LOG`).
  #[arg(long)]
  trace: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
  StringLiterals,
  ByteArrays,
  Blob,
}

impl From<ModeArg> for OutputMode {
  fn from(mode: ModeArg) -> Self {
    match mode {
      ModeArg::StringLiterals => OutputMode::StringLiterals,
      ModeArg::ByteArrays => OutputMode::ByteArrays,
      ModeArg::Blob => OutputMode::Blob,
    }
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.trace);
  match try_main(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::from(1)
    }
  }
}

fn try_main(cli: Cli) -> Result<()> {
  let mut denylist = match &cli.denylist {
    Some(path) => Denylist::from_path(path)?,
    None => Denylist::builtin()?,
  };
  if cli.no_content_filter {
    denylist = denylist.with_content_filter(AcceptAll);
  }

  let mut options = ExportOptions::new(cli.suites_dir, denylist)
    .with_mode(cli.mode.into())
    .with_array_name(cli.array_name);
  if !cli.suites.is_empty() {
    options = options.with_suites(cli.suites);
  }

  // Render into memory first so a failing suite never leaves a truncated file behind.
  let mut rendered = Vec::new();
  export(&options, &mut rendered)?;

  match &cli.output {
    Some(path) => File::create(path)
      .and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(&rendered)?;
        writer.flush()
      })
      .with_context(|| format!("write {}", path.display())),
    None => {
      let mut out = stdout().lock();
      out
        .write_all(&rendered)
        .and_then(|()| out.flush())
        .context("write <stdout>")
    }
  }
}

fn init_tracing(enable: bool) {
  if !enable {
    return;
  }

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr);
  if let Err(err) = builder.try_init() {
    eprintln!("failed to install tracing subscriber: {err}");
  }
}
