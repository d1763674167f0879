use anyhow::{Context, Result};
use chartspec::parser::parse_encoding_str;
use chartspec::{
    generate_chart, BarPosition, ChartKind, ChartRequest, OutputFormat, RecordSet, RenderOptions,
    StyleOptions, Theme,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "chartspec")]
#[command(about = "Turn JSON or CSV records into bar, line and pie charts", long_about = None)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bar chart, one series per group and y field
    Bar(ChartArgs),
    /// Line chart over a sorted x axis
    Line(ChartArgs),
    /// Pie chart of 1 to 10 records
    Pie(ChartArgs),
    /// Run a complete JSON request (data, encoding and options in one document)
    Request {
        kind: ChartKind,
        /// Request file, `-` for stdin
        file: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Encoding shorthand, e.g. 'x: date, y: [sales, profit], z: region'
    #[arg(long, short)]
    encoding: String,

    /// Input file (stdin when omitted)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Read the input as CSV instead of a JSON array
    #[arg(long)]
    csv: bool,

    #[arg(long = "type", value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(long)]
    title: Option<String>,

    #[arg(long, value_enum, default_value_t = ThemeArg::Default)]
    theme: ThemeArg,

    /// Stack bar series instead of placing them side by side
    #[arg(long)]
    stack: bool,

    #[arg(long)]
    smooth: bool,

    #[arg(long)]
    show_area: bool,

    #[arg(long)]
    no_symbol: bool,

    /// Donut hole as a fraction of the radius (0 to 0.9)
    #[arg(long, default_value_t = 0.0)]
    inner_radius: f64,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Svg,
    Option,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Svg => OutputFormat::Svg,
            FormatArg::Option => OutputFormat::Option,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Default,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Default => Theme::Default,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

impl ChartArgs {
    fn into_request(self, data: RecordSet) -> Result<ChartRequest> {
        let encoding = parse_encoding_str(&self.encoding)?;

        let mut request = ChartRequest::new(data, encoding);
        request.style = StyleOptions {
            title: self.title,
            position: if self.stack {
                BarPosition::Stack
            } else {
                BarPosition::Dodge
            },
            smooth: self.smooth,
            show_area: self.show_area,
            show_symbol: !self.no_symbol,
            inner_radius: self.inner_radius,
        };
        request.render = RenderOptions {
            width: self.width,
            height: self.height,
            format: self.format.into(),
            theme: self.theme.into(),
        };
        Ok(request)
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(bytes)
                .context("Failed to write output to stdout")?;
            handle.flush().context("Failed to flush stdout")
        }
    }
}

fn run_chart(kind: ChartKind, args: ChartArgs) -> Result<()> {
    let text = read_input(args.input.as_deref())?;
    let data = if args.csv {
        RecordSet::from_csv(text.as_bytes())
    } else {
        RecordSet::from_json_str(&text)
    }
    .context("Failed to load records")?;

    let output = args.output.clone();
    let request = args.into_request(data)?;
    let chart = generate_chart(kind, &request)
        .with_context(|| format!("Failed to generate {} chart", kind))?;
    write_output(output.as_deref(), chart.as_bytes())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Bar(args) => run_chart(ChartKind::Bar, args),
        Command::Line(args) => run_chart(ChartKind::Line, args),
        Command::Pie(args) => run_chart(ChartKind::Pie, args),
        Command::Request { kind, file, output } => {
            let text = read_input(Some(file.as_path()))?;
            let request = ChartRequest::from_json_str(&text).context("Failed to parse request")?;
            let chart = generate_chart(kind, &request)
                .with_context(|| format!("Failed to generate {} chart", kind))?;
            write_output(output.as_deref(), chart.as_bytes())
        }
    }
}
