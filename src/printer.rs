use crossterm::style::Stylize;

use crate::manifest::{FieldValue, Manifest};

const SECTION: &str = "---";
const DEFAULT_WIDTH: usize = 80;
const MIN_WIDTH: usize = 20;

/// `1234567` → `1.2M`; values below a thousand are printed as is.
pub fn abbreviate(number: u64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];
    let value = number as f64;
    for (scale, unit) in UNITS {
        if value >= scale {
            let scaled = (value / scale * 10.0).round() / 10.0;
            return if scaled.fract() == 0.0 {
                format!("{}{unit}", scaled as u64)
            } else {
                format!("{scaled:.1}{unit}")
            };
        }
    }
    number.to_string()
}

pub fn list_lines(manifests: &[&Manifest]) -> String {
    let mut out = format!("Available graphs ({}):\n\n", manifests.len());
    for (i, manifest) in manifests.iter().enumerate() {
        out.push_str(&format!("{}) {}\n", i + 1, manifest.name));
    }
    out
}

pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Draws dataset summaries as framed panels.
pub struct Printer {
    width: usize,
    h_spacer: char,
    v_spacer: char,
    bold_title: bool,
}

impl Printer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            h_spacer: '-',
            v_spacer: '%',
            bold_title: true,
        }
    }

    pub fn plain(mut self) -> Self {
        self.bold_title = false;
        self
    }

    /// Section text before framing; `---` lines mark separators.
    pub fn summary(&self, manifest: &Manifest) -> String {
        let meta = &manifest.metadata;
        let structure = &manifest.structure;
        let mut lines: Vec<String> = vec![SECTION.to_string(), manifest.name.clone()];
        if !meta.tags.is_empty() {
            lines.push(format!("|{}|", meta.tags.join("|")));
        }
        lines.push(format!("{} {}", meta.author, meta.date).trim().to_string());
        lines.push(String::new());
        lines.extend(meta.description.lines().map(str::to_string));
        lines.push(SECTION.to_string());
        lines.push(format!("Nodes: {}", abbreviate(structure.nodes)));
        lines.push(format!("Edges: {}", abbreviate(structure.edges)));
        lines.push(String::new());
        lines.push(format!("Directed: {}", title_bool(structure.directed)));
        lines.push(format!("Weighted: {}", title_bool(structure.weighted)));
        lines.push(format!("Labeled: {}", title_bool(structure.labeled)));

        let optional = manifest.optional_fields();
        if !optional.is_empty() {
            lines.push(String::new());
            let key_width = optional.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
            for (key, value) in optional {
                let value = match value {
                    FieldValue::Number(n) if n != 0.0 && n.fract() == 0.0 && n > 0.0 => {
                        abbreviate(n as u64)
                    }
                    other => other.to_string(),
                };
                let key = key.replace('-', " ");
                lines.push(format!("{key:<key_width$} = {value}"));
            }
        }
        lines.push(SECTION.to_string());

        if let Some(citations) = manifest.citations.as_ref().filter(|c| !c.is_empty()) {
            lines.push("Citations".to_string());
            lines.push(String::new());
            lines.extend(citations.iter().cloned());
            lines.push(SECTION.to_string());
        }
        lines.join("\n")
    }

    /// Wraps and frames `summary` output to the printer width.
    pub fn frame(&self, text: &str) -> String {
        let inner = self.width - 4;
        let mut lines: Vec<String> = Vec::new();
        for line in text.lines() {
            let mut rest: Vec<char> = line.chars().collect();
            while rest.len() > inner {
                let head: String = rest[..inner - 1].iter().collect();
                lines.push(format!("{head}-"));
                rest = rest[inner - 1..].to_vec();
            }
            lines.push(rest.into_iter().collect());
        }

        let separator = format!(
            "{v}{h}{v}",
            v = self.v_spacer,
            h = self.h_spacer.to_string().repeat(self.width - 2)
        );
        let mut framed: Vec<String> = lines
            .iter()
            .map(|line| {
                if line == SECTION {
                    separator.clone()
                } else {
                    let pad = inner - line.chars().count();
                    format!("{v} {line}{} {v}", " ".repeat(pad), v = self.v_spacer)
                }
            })
            .collect();
        if self.bold_title {
            if let Some(title) = framed.get_mut(1) {
                *title = title.clone().bold().to_string();
            }
        }
        framed.join("\n")
    }

    pub fn render(&self, manifest: &Manifest) -> String {
        self.frame(&self.summary(manifest))
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(terminal_width().saturating_sub(2))
    }
}

fn title_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_lines_are_split_with_hyphen() {
        let printer = Printer::new(20).plain();
        let framed = printer.frame("abcdefghijklmnopqrstuvwxyz");
        let lines: Vec<&str> = framed.lines().collect();
        assert_eq!(lines[0], "% abcdefghijklmno- %");
        assert_eq!(lines[1], "% pqrstuvwxyz      %");
    }
}
