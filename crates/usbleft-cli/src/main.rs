use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;

use usbleft_core::{
    DEFAULT_HEADER_LEN, DEFAULT_MIN_LENGTH, EventSource, ExtractOptions, ExtractSession,
    PcapFileSource, WriterSink, extract_pcap_file, extract_source, inspect_event,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("USBLEFT_BUILD_COMMIT"),
    ", ",
    env!("USBLEFT_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "usbleft")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Extract leftover capture data (G-code payloads) from USB packet captures.",
    long_about = None,
    after_help = "Examples:\n  usbleft pcap extract printer.pcapng -o gcode.txt\n  usbleft pcap extract printer.pcap --raw --stdout\n  usbleft pcap inspect printer.pcapng --frame 17"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs (USBPcap captures).
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Extract leftover data payloads into a text report.
    #[command(
        after_help = "Examples:\n  usbleft pcap extract printer.pcapng -o gcode.txt\n  usbleft pcap extract printer.pcap --raw --min-length 4 --stdout"
    )]
    Extract {
        /// Path to a .pcap or .pcapng file
        input: PathBuf,

        /// Output report path (default: <input stem>_leftover.txt)
        #[arg(short = 'o', long, env = "USBLEFT_OUTPUT")]
        output: Option<PathBuf>,

        /// Write the report to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Render payloads as raw hex instead of decoded text
        #[arg(long, env = "USBLEFT_RAW")]
        raw: bool,

        /// Skip payloads shorter than this many bytes
        #[arg(long, default_value_t = DEFAULT_MIN_LENGTH, env = "USBLEFT_MIN_LENGTH")]
        min_length: usize,

        /// Show \r and \xHH escapes instead of dropping non-printable bytes
        #[arg(long, env = "USBLEFT_ESCAPES")]
        escapes: bool,

        /// Fallback payload offset for frames without an explicit header length
        #[arg(long, default_value_t = DEFAULT_HEADER_LEN, env = "USBLEFT_HEADER_LEN")]
        header_len: u32,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        stats_json: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Show the decoded text and hex views for a single frame.
    Inspect {
        /// Path to a .pcap or .pcapng file
        input: PathBuf,

        /// 1-based capture frame number
        #[arg(long)]
        frame: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Extract {
                input,
                output,
                stdout,
                raw,
                min_length,
                escapes,
                header_len,
                stats_json,
                quiet,
            } => cmd_pcap_extract(ExtractArgs {
                input,
                output,
                stdout,
                raw,
                min_length,
                escapes,
                header_len,
                stats_json,
                quiet,
            }),
            PcapCommands::Inspect { input, frame } => cmd_pcap_inspect(input, frame),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

struct ExtractArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    stdout: bool,
    raw: bool,
    min_length: usize,
    escapes: bool,
    header_len: u32,
    stats_json: bool,
    quiet: bool,
}

fn cmd_pcap_extract(args: ExtractArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;

    let options = ExtractOptions {
        raw_mode: args.raw,
        min_length: args.min_length,
        show_escapes: args.escapes,
        fallback_header_len: args.header_len,
    };

    let summary = if args.stdout {
        let source = PcapFileSource::open(&resolved_input)
            .with_context(|| format!("failed to open capture: {}", resolved_input.display()))?;
        let mut session =
            ExtractSession::new(WriterSink::new(io::stdout(), "stdout"), options);
        extract_source(source, &mut session).context("extraction failed")?
    } else {
        let output = args
            .output
            .unwrap_or_else(|| default_output_path(&resolved_input));
        if output == resolved_input {
            return Err(CliError::new(
                format!("output path must differ from input: {}", output.display()),
                Some("choose a different output path".to_string()),
            ));
        }
        let summary = extract_pcap_file(&resolved_input, &output, options)
            .context("extraction failed")?;
        if !args.quiet {
            eprintln!("OK: report written -> {}", output.display());
        }
        summary
    };

    if args.stats_json {
        let json = serde_json::to_string(&summary).context("JSON serialization failed")?;
        println!("{json}");
    }
    Ok(())
}

fn cmd_pcap_inspect(input: PathBuf, frame: u64) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;

    let mut source = PcapFileSource::open(&resolved_input)
        .with_context(|| format!("failed to open capture: {}", resolved_input.display()))?;
    while let Some(event) = source.next_event().context("capture read failed")? {
        if event.frame_number < frame {
            continue;
        }
        if event.frame_number > frame {
            break;
        }
        return match inspect_event(&event, DEFAULT_HEADER_LEN) {
            Some(view) => {
                println!("Packet #{}", event.frame_number);
                println!("Source: {}  ->  Destination: {}", event.src, event.dst);
                println!("Text: {}", view.text);
                println!("Hex:  {}", view.hex);
                Ok(())
            }
            None => Err(CliError::new(
                format!("frame {frame} carries no leftover data"),
                None,
            )),
        };
    }
    Err(CliError::new(
        format!("frame {frame} not found in capture"),
        Some("frame numbers are 1-based capture record indexes".to_string()),
    ))
}

fn default_output_path(input: &Path) -> PathBuf {
    match input.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) => input.with_file_name(format!("{stem}_leftover.txt")),
        None => PathBuf::from("usb_leftover_data.txt"),
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => Err(CliError::new(
            format!("multiple files match pattern '{}' ({count} matches)", pattern),
            Some("pass a single capture file, or run once per file".to_string()),
        )),
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
