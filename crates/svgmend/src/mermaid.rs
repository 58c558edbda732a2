//! Invokes the Mermaid CLI (`mmdc`) to render diagram source to SVG or PNG.

use crate::foreign_object::fmt_number;
use crate::text::TextOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

const DOCKER_MMDC: &str = "/home/md2conf/node_modules/.bin/mmdc";
const DEFAULT_SCALE: f64 = 2.0;
const PUPPETEER_CONFIG: &str = include_str!("../puppeteer-config.json");

/// Rendering options passed through to `mmdc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MermaidConfigProperties {
    /// Scaling factor; `mmdc` is asked for 2x when unset.
    pub scale: Option<f64>,
    pub background_color: String,
}

impl Default for MermaidConfigProperties {
    fn default() -> Self {
        Self {
            scale: None,
            background_color: "transparent".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported output format: {0} (expected png or svg)")]
pub struct ParseOutputFormatError(String);

impl FromStr for OutputFormat {
    type Err = ParseOutputFormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(ParseOutputFormatError(s.to_string())),
        }
    }
}

/// True when running inside the md2conf Docker image.
pub fn is_docker() -> bool {
    docker_markers(
        std::env::var("CHROME_BIN").ok().as_deref(),
        std::env::var("PUPPETEER_SKIP_DOWNLOAD").ok().as_deref(),
    )
}

fn docker_markers(chrome_bin: Option<&str>, skip_download: Option<&str>) -> bool {
    chrome_bin == Some("/usr/bin/chromium-browser") && skip_download == Some("true")
}

/// The Mermaid converter executable to run.
pub fn mmdc_program() -> String {
    if is_docker() {
        if Path::new(DOCKER_MMDC).exists() {
            DOCKER_MMDC.to_string()
        } else {
            "mmdc".to_string()
        }
    } else if cfg!(windows) {
        "mmdc.cmd".to_string()
    } else {
        "mmdc".to_string()
    }
}

pub fn has_mmdc() -> bool {
    which::which(mmdc_program()).is_ok()
}

/// Element-id prefix for a diagram, unique per source text.
///
/// Mermaid prefixes every internal id and CSS selector with it, so several diagrams can share
/// one page without clashing.
pub fn diagram_svg_id(source: &str) -> String {
    let digest = format!("{:x}", md5::compute(source.as_bytes()));
    format!("mermaid-{}", &digest[..8])
}

/// Writes the Chromium launch options `mmdc` needs inside Docker to a temporary file, which is
/// removed when the handle drops.
fn write_puppeteer_config() -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("puppeteer-config")
        .suffix(".json")
        .tempfile()?;
    file.write_all(PUPPETEER_CONFIG.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn mmdc_args(
    format: OutputFormat,
    config: &MermaidConfigProperties,
    svg_id: &str,
    puppeteer_config: Option<&Path>,
) -> Vec<String> {
    let scale = config
        .scale
        .filter(|scale| *scale != 0.0)
        .unwrap_or(DEFAULT_SCALE);
    let scale = fmt_number(scale);
    let mut args: Vec<String> = [
        "--input",
        "-",
        "--output",
        "-",
        "--outputFormat",
        format.as_str(),
        "--backgroundColor",
        config.background_color.as_str(),
        "--scale",
        scale.as_str(),
        "--svgId",
        svg_id,
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect();
    if let Some(path) = puppeteer_config {
        args.push("-p".to_string());
        args.push(path.display().to_string());
    }
    args
}

/// Renders Mermaid `source` with `mmdc`, returning the raw image bytes.
pub fn render_diagram(
    source: &str,
    format: OutputFormat,
    config: &MermaidConfigProperties,
) -> Result<Vec<u8>> {
    let program = mmdc_program();
    let puppeteer_config = if is_docker() {
        Some(write_puppeteer_config()?)
    } else {
        None
    };
    let args = mmdc_args(
        format,
        config,
        &diagram_svg_id(source),
        puppeteer_config.as_ref().map(|file| file.path()),
    );
    run_renderer(&program, &args, source.as_bytes())
}

fn run_renderer(program: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>> {
    tracing::debug!(command = %format!("{program} {}", args.join(" ")), "executing mmdc");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::RendererUnavailable {
                program: program.to_string(),
            },
            _ => Error::Io(err),
        })?;
    // A renderer that exits early breaks the pipe; its exit status is the error to report.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(input),
        None => Ok(()),
    };
    let output = child.wait_with_output()?;

    if !output.status.success() {
        return Err(Error::RendererFailed {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    written?;
    Ok(output.stdout)
}

/// Renders like [`render_diagram`] and, for SVG output, repairs the result with
/// [`crate::fix_svg_with`].
pub fn render_diagram_fixed(
    source: &str,
    format: OutputFormat,
    config: &MermaidConfigProperties,
    text_options: &TextOptions,
) -> Result<Vec<u8>> {
    let image = render_diagram(source, format, config)?;
    Ok(match format {
        OutputFormat::Svg => crate::fix_svg_with(&image, text_options),
        OutputFormat::Png => image,
    })
}
