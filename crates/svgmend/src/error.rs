pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SVG data is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("failed to parse SVG: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("attribute {name}={value:?} is not a number")]
    InvalidNumber { name: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mermaid diagram converter not found: {program}")]
    RendererUnavailable { program: String },

    #[error("{}", renderer_failure_message(*code, stdout, stderr))]
    RendererFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

fn renderer_failure_message(code: Option<i32>, stdout: &str, stderr: &str) -> String {
    let mut messages = vec![match code {
        Some(code) => format!("failed to convert Mermaid diagram; exit code: {code}"),
        None => "failed to convert Mermaid diagram; terminated by signal".to_string(),
    }];
    if !stdout.is_empty() {
        messages.push(format!("output:\n{stdout}"));
    }
    if !stderr.is_empty() {
        messages.push(format!("error:\n{stderr}"));
    }
    messages.join("\n")
}
