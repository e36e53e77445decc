use crate::render::{self, Node};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render(format: OutputFormat, nodes: &[Node]) -> Vec<u8> {
    match format {
        OutputFormat::Html => {
            let mut out = render::render_html(nodes).into_bytes();
            out.push(b'\n');
            out
        }
        OutputFormat::Json => render::render_json(nodes),
    }
}
