use std::io::{Read, Write};
use svgmend::{MermaidConfigProperties, OutputFormat, TextOptions};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Svgmend(svgmend::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Svgmend(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<svgmend::Error> for CliError {
    fn from(value: svgmend::Error) -> Self {
        Self::Svgmend(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Fix,
    Dimensions,
    Render,
}

#[derive(Debug)]
struct Args {
    command: Command,
    input: Option<String>,
    out: Option<String>,
    fix_dimensions: bool,
    fix_text: bool,
    text: TextOptions,
    render_format: OutputFormat,
    mermaid: MermaidConfigProperties,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: Command::Fix,
            input: None,
            out: None,
            fix_dimensions: true,
            fix_text: true,
            text: TextOptions::default(),
            render_format: OutputFormat::Svg,
            mermaid: MermaidConfigProperties::default(),
        }
    }
}

fn usage() -> &'static str {
    "svgmend-cli\n\
\n\
USAGE:\n\
  svgmend-cli [fix] [--no-dimensions] [--no-text] [--font-size <px>] [--out <path>] [<path>|-]\n\
  svgmend-cli dimensions [<path>|-]\n\
  svgmend-cli render [--format svg|png] [--scale <n>] [--background <css-color>] [--font-size <px>] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - fix reads an SVG, sets explicit width/height and replaces foreignObject labels with text.\n\
  - dimensions prints <width>x<height>, with '?' for a side that cannot be determined.\n\
  - render runs Mermaid source through mmdc; SVG output is fixed before it is written.\n\
  - PNG output defaults to writing next to the input file (or ./out.png for stdin).\n\
  - Set RUST_LOG=debug to see why a document was left unchanged.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "fix" => args.command = Command::Fix,
            "dimensions" => args.command = Command::Dimensions,
            "render" => args.command = Command::Render,
            "--no-dimensions" => args.fix_dimensions = false,
            "--no-text" => args.fix_text = false,
            "--font-size" => {
                let Some(size) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.text.font_size = size.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.text.font_size.is_finite() && args.text.font_size > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<OutputFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let scale = scale.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.mermaid.scale = Some(scale);
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.mermaid.background_color = bg.trim().to_string();
                }
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<Vec<u8>, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read(path)?),
    }
}

fn write_bytes(bytes: &[u8], out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, bytes)?;
            Ok(())
        }
    }
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        None | Some("-") => std::path::PathBuf::from(format!("out.{ext}")),
        Some(path) => std::path::Path::new(path).with_extension(ext),
    }
}

fn format_side(side: Option<i64>) -> String {
    side.map_or_else(|| "?".to_string(), |px| px.to_string())
}

fn run(args: Args) -> Result<(), CliError> {
    tracing::debug!(command = ?args.command, input = ?args.input, "running");
    let data = read_input(args.input.as_deref())?;

    match args.command {
        Command::Fix => {
            let mut svg = data;
            if args.fix_dimensions {
                svg = svgmend::fix_svg_dimensions(&svg).into_owned();
            }
            if args.fix_text {
                svg = svgmend::convert_foreign_object_to_text_with(&svg, &args.text).into_owned();
            }
            write_bytes(&svg, args.out.as_deref())
        }
        Command::Dimensions => {
            let (width, height) = svgmend::svg_dimensions_from_bytes(&data);
            println!("{}x{}", format_side(width), format_side(height));
            Ok(())
        }
        Command::Render => {
            let source = String::from_utf8_lossy(&data);
            let image = svgmend::render_diagram_fixed(
                &source,
                args.render_format,
                &args.mermaid,
                &args.text,
            )?;
            match args.render_format {
                OutputFormat::Svg => write_bytes(&image, args.out.as_deref()),
                OutputFormat::Png => {
                    let out = args.out.clone().unwrap_or_else(|| {
                        default_raster_out_path(args.input.as_deref(), "png")
                            .to_string_lossy()
                            .to_string()
                    });
                    write_bytes(&image, Some(out.as_str()))
                }
            }
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
