use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use visframe::{BinStream, FrameFile, StreamHeaders, StreamMode};

#[derive(Parser, Debug)]
#[command(name = "visframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header of a stream file.
    Info(InfoArgs),
    /// Print min/max/mean statistics for one frame.
    Dump(DumpArgs),
    /// Export one frame to a single-frame file.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input stream file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Emit the header as JSON instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Input stream file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u32,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input stream file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u32,

    /// Output single-frame file path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `info --json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Dump(args) => cmd_dump(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn open_for_read(path: &Path) -> anyhow::Result<BinStream> {
    let mut stream = BinStream::new(path, StreamHeaders::new(StreamMode::Read));
    stream
        .open()
        .with_context(|| format!("open stream '{}'", path.display()))?;
    Ok(stream)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let mut stream = open_for_read(&args.in_path)?;
    let headers = stream.headers();
    if args.json {
        println!("{}", serde_json::to_string_pretty(headers)?);
    } else {
        println!("shape:       {}x{}", headers.height, headers.width);
        println!("frames:      {}", headers.nframes);
        println!(
            "scale:       {} um x {} um",
            headers.height_um(),
            headers.width_um()
        );
        println!("sample rate: {} frames per unit time", headers.sample_rate);
        println!(
            "duration:    {} time units",
            f64::from(headers.nframes) / headers.sample_rate
        );
    }
    stream.close()?;
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let mut stream = open_for_read(&args.in_path)?;
    stream
        .move_by(i64::from(args.frame))
        .with_context(|| format!("seek to frame {}", args.frame))?;
    let frame = stream.read()?;

    let values = frame.as_slice();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    println!("frame {}: min={min} max={max} mean={mean}", args.frame);

    stream.close()?;
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut stream = open_for_read(&args.in_path)?;
    stream
        .move_by(i64::from(args.frame))
        .with_context(|| format!("seek to frame {}", args.frame))?;
    let frame = stream.read()?;

    let out = FrameFile {
        frame,
        width_um: stream.headers().width_um(),
        height_um: stream.headers().height_um(),
    };
    out.save(&args.out)?;
    stream.close()?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
