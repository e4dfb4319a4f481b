// Command-line front end for the bundled LZ formats.
//
// Explicit subcommands with long-form options; input defaults to stdin and
// output to stdout, mirroring the usual compressor conventions.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::codec::{CompressOptions, Format};
use crate::matching::FinderKind;
use crate::matching::config::{BACKWARD_LZ77, LZ10, YAZ0};
use crate::parser::ParserKind;
use crate::replay::Token;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// LZ match finding, optimal parsing and Nintendo-family LZ codecs.
#[derive(Parser, Debug)]
#[command(
    name = "lzmatch",
    version,
    about = "LZ10 / Yaz0 / backward LZ77 compressor with optimal parsing",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress an input stream.
    Compress(CompressArgs),
    /// Decompress an input stream.
    Decompress(DecompressArgs),
    /// Print the match list chosen for an input.
    Parse(ParseArgs),
    /// Print build and preset details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Lz10,
    Yaz0,
    BackwardLz77,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Lz10 => Format::Lz10,
            FormatArg::Yaz0 => Format::Yaz0,
            FormatArg::BackwardLz77 => Format::BackwardLz77,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ParserArg {
    Greedy,
    Optimal,
    BackwardForward,
}

impl From<ParserArg> for ParserKind {
    fn from(arg: ParserArg) -> Self {
        match arg {
            ParserArg::Greedy => ParserKind::Greedy,
            ParserArg::Optimal => ParserKind::Optimal,
            ParserArg::BackwardForward => ParserKind::BackwardForward,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FinderArg {
    SuffixTree,
    NeedleHaystack,
    HashChain,
}

impl From<FinderArg> for FinderKind {
    fn from(arg: FinderArg) -> Self {
        match arg {
            FinderArg::SuffixTree => FinderKind::SuffixTree,
            FinderArg::NeedleHaystack => FinderKind::NeedleHaystack,
            FinderArg::HashChain => FinderKind::HashChain,
        }
    }
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Container format.
    #[arg(long = "format", short = 'F', value_enum, default_value_t = FormatArg::Lz10)]
    format: FormatArg,

    /// Match parser.
    #[arg(long, short = 'p', value_enum, default_value_t = ParserArg::Optimal)]
    parser: ParserArg,

    /// Match finder.
    #[arg(long, value_enum, default_value_t = FinderArg::SuffixTree)]
    finder: FinderArg,

    /// Hash-chain links followed per position (0 = whole window).
    #[arg(long = "chain-depth", default_value_t = 0)]
    chain_depth: usize,
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Container format (default: detected from the magic).
    #[arg(long = "format", short = 'F', value_enum)]
    format: Option<FormatArg>,

    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Also print literal runs.
    #[arg(long)]
    literals: bool,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Parse,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    format: Option<Format>,
    compress: CompressOptions,
    show_literals: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn compress_options(args: &PipelineArgs) -> CompressOptions {
    CompressOptions {
        parser: args.parser.into(),
        finder: args.finder.into(),
        chain_depth: args.chain_depth,
    }
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        format: None,
        compress: CompressOptions::default(),
        show_literals: false,
        input_file: None,
        output_file: None,
    };

    match cli.command {
        Cmd::Compress(args) => {
            opts.command = Command::Compress;
            opts.use_stdout = args.stdout;
            opts.format = Some(args.pipeline.format.into());
            opts.compress = compress_options(&args.pipeline);
            opts.input_file = args.input.or(args.input_pos);
            opts.output_file = args.output.or(args.output_pos);
        }
        Cmd::Decompress(args) => {
            opts.command = Command::Decompress;
            opts.use_stdout = args.stdout;
            opts.format = args.format.map(Format::from);
            opts.input_file = args.input.or(args.input_pos);
            opts.output_file = args.output.or(args.output_pos);
        }
        Cmd::Parse(args) => {
            opts.command = Command::Parse;
            opts.format = Some(args.pipeline.format.into());
            opts.compress = compress_options(&args.pipeline);
            opts.show_literals = args.literals;
            opts.input_file = args.input;
        }
        Cmd::Config => {}
    }
    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("lzmatch".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(opts: &Options) -> Option<Vec<u8>> {
    let mut data = Vec::new();
    let result = match &opts.input_file {
        Some(path) => File::open(path).and_then(|mut f| f.read_to_end(&mut data)),
        None => io::stdin().lock().read_to_end(&mut data),
    };
    match result {
        Ok(_) => Some(data),
        Err(e) => {
            let name = opts
                .input_file
                .as_ref()
                .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
            eprintln!("lzmatch: input file: {name}: {e}");
            None
        }
    }
}

fn open_output(opts: &Options) -> Option<Box<dyn Write>> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Some(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                eprintln!(
                    "lzmatch: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return None;
            }
            match File::create(path) {
                Ok(f) => Some(Box::new(BufWriter::with_capacity(BUF_SIZE, f))),
                Err(e) => {
                    eprintln!("lzmatch: output file: {}: {e}", path.display());
                    None
                }
            }
        }
    }
}

fn write_output(opts: &Options, data: &[u8]) -> bool {
    let Some(mut writer) = open_output(opts) else {
        return false;
    };
    if let Err(e) = writer.write_all(data).and_then(|()| writer.flush()) {
        eprintln!("lzmatch: write error: {e}");
        return false;
    }
    true
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("lzmatch: json error: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("lzmatch version {version} (Rust)");

    let parallel = cfg!(feature = "parallel") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();
    eprintln!("PARALLEL={parallel}");
    eprintln!("sizeof(usize)={ptr_size}");

    for preset in [LZ10, YAZ0, BACKWARD_LZ77] {
        let l = preset.limitations;
        eprintln!(
            "{}: length {}..={}, displacement {}..={}, backwards={}",
            preset.name,
            l.min_length,
            l.max_length,
            l.min_displacement,
            l.max_displacement,
            preset.options.search_backwards
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    let format = opts.format.unwrap_or(Format::Lz10);
    let Some(input) = read_input(opts) else {
        return 1;
    };

    let packed = match format.compress(&input, &opts.compress) {
        Ok(packed) => packed,
        Err(e) => {
            eprintln!("lzmatch: compress error: {e}");
            return 1;
        }
    };
    if !write_output(opts, &packed) {
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "lzmatch: {format}: input size: {}, output size: {}",
            input.len(),
            packed.len()
        );
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "compress",
            "format": format.name(),
            "parser": opts.compress.parser.name(),
            "finder": opts.compress.finder.name(),
            "input_size": input.len(),
            "output_size": packed.len(),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> i32 {
    let Some(input) = read_input(opts) else {
        return 1;
    };
    let Some(format) = opts.format.or_else(|| Format::detect(&input)) else {
        eprintln!("lzmatch: cannot detect the input format, pass --format");
        return 1;
    };

    let output = match format.decompress(&input) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("lzmatch: decompress error: {e}");
            return 1;
        }
    };
    if !write_output(opts, &output) {
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!("lzmatch: {format}: output size: {}", output.len());
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "decompress",
            "format": format.name(),
            "input_size": input.len(),
            "output_size": output.len(),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Parse command
// ---------------------------------------------------------------------------

fn cmd_parse(opts: &Options) -> i32 {
    let format = opts.format.unwrap_or(Format::Lz10);
    let Some(input) = read_input(opts) else {
        return 1;
    };
    let tokens = match format.tokenize(&input, &opts.compress) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("lzmatch: parse error: {e}");
            return 1;
        }
    };

    let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
    let mut pos = 0usize;
    let mut literal_run = 0usize;
    let mut matches = 0usize;
    let mut covered = 0usize;
    let mut result = Ok(());
    for token in &tokens {
        match *token {
            Token::Literal(_) => {
                literal_run += 1;
                pos += 1;
            }
            Token::Match {
                displacement,
                length,
            } => {
                if opts.show_literals && literal_run > 0 {
                    result = result.and_then(|()| {
                        writeln!(out, "{:>10}  literals {literal_run}", pos - literal_run)
                    });
                }
                literal_run = 0;
                result = result.and_then(|()| {
                    writeln!(out, "{pos:>10}  match    disp={displacement} len={length}")
                });
                matches += 1;
                covered += length;
                pos += length;
            }
        }
    }
    if opts.show_literals && literal_run > 0 {
        result = result.and_then(|()| writeln!(out, "{:>10}  literals {literal_run}", pos - literal_run));
    }
    if let Err(e) = result.and_then(|()| out.flush()) {
        eprintln!("lzmatch: write error: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "lzmatch: {format}: {} bytes, {matches} matches covering {covered} bytes",
            input.len()
        );
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "parse",
            "format": format.name(),
            "parser": opts.compress.parser.name(),
            "finder": opts.compress.finder.name(),
            "input_size": input.len(),
            "matches": matches,
            "covered": covered,
            "literals": input.len().saturating_sub(covered),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && !opts.quiet
        && let Some(path) = opts.output_file.take()
    {
        eprintln!(
            "lzmatch: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Parse => cmd_parse(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
