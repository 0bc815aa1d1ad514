use graph_dataset_manager::manifest::Manifest;
use graph_dataset_manager::printer::{Printer, abbreviate, list_lines};

const MANIFEST: &str = r#"
name: roadNet-CA
url: https://example.org/roadNet-CA.tar.gz
metadata:
  author: J. Leskovec
  date: 2008
  description: California road network.
  tags: [road, undirected]
structure:
  nodes: 1965206
  edges: 2766607
  directed: false
  weighted: false
  labeled: false
  optional:
    max-degree: 12
    diameter: 849
citations:
  - Leskovec et al. 2008
"#;

#[test]
fn abbreviates_large_numbers() {
    assert_eq!(abbreviate(999), "999");
    assert_eq!(abbreviate(1000), "1K");
    assert_eq!(abbreviate(1965206), "2M");
    assert_eq!(abbreviate(2766607), "2.8M");
    assert_eq!(abbreviate(3_500_000_000), "3.5B");
}

#[test]
fn numbered_list() {
    let a = Manifest::parse(MANIFEST).unwrap();
    let mut b = a.clone();
    b.name = "web-Google".to_string();

    let text = list_lines(&[&a, &b]);
    assert_eq!(
        text,
        "Available graphs (2):\n\n1) roadNet-CA\n2) web-Google\n"
    );
}

#[test]
fn summary_sections() {
    let manifest = Manifest::parse(MANIFEST).unwrap();
    let printer = Printer::new(60).plain();
    let summary = printer.summary(&manifest);

    assert!(summary.contains("|road|undirected|"));
    assert!(summary.contains("J. Leskovec 2008"));
    assert!(summary.contains("Nodes: 2M"));
    assert!(summary.contains("Edges: 2.8M"));
    assert!(summary.contains("Directed: False"));
    assert!(summary.contains("max degree = 12"));
    assert!(summary.contains("Citations"));
}

#[test]
fn framed_lines_share_width() {
    let manifest = Manifest::parse(MANIFEST).unwrap();
    let rendered = Printer::new(50).plain().render(&manifest);

    for line in rendered.lines() {
        assert_eq!(line.chars().count(), 50, "{line:?}");
        assert!(line.starts_with('%') && line.ends_with('%'));
    }
    assert!(rendered.lines().next().unwrap().starts_with("%---"));
}
