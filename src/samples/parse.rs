//! Sample extraction from problem page markup

use scraper::{ElementRef, Html, Node, Selector};

use super::SampleSet;
use crate::common::SampleError;

const SAMPLE_BLOCK: &str = ".sample-test";
const INPUT_REGION: &str = ".input pre";
const OUTPUT_REGION: &str = ".output pre";
const INPUT_LINE: &str = "div";

fn selector(css: &str) -> Result<Selector, SampleError> {
    Selector::parse(css).map_err(|e| SampleError::Scrape(format!("bad selector {}: {}", css, e)))
}

/// Extract every sample pair from a rendered problem page
pub fn parse_samples(html: &str, url: &str) -> Result<SampleSet, SampleError> {
    let document = Html::parse_document(html);
    let block_sel = selector(SAMPLE_BLOCK)?;
    let input_sel = selector(INPUT_REGION)?;
    let output_sel = selector(OUTPUT_REGION)?;
    let line_sel = selector(INPUT_LINE)?;

    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for block in document.select(&block_sel) {
        let block_inputs: Vec<ElementRef> = block.select(&input_sel).collect();
        let block_outputs: Vec<ElementRef> = block.select(&output_sel).collect();

        for (input, output) in block_inputs.iter().zip(block_outputs.iter()) {
            inputs.push(format!("{}\n", extract_input(input, &line_sel)));
            outputs.push(format!("{}\n", flat_text(output).trim()));
        }
    }

    SampleSet::new(inputs, outputs, url)
}

/// Line-structured inputs have one `div` per line; flat inputs are a single text block
fn extract_input(pre: &ElementRef, line_sel: &Selector) -> String {
    let lines: Vec<String> = pre
        .select(line_sel)
        .map(|line| line.text().collect::<String>().trim().to_string())
        .collect();

    if lines.is_empty() {
        flat_text(pre).trim().to_string()
    } else {
        lines.join("\n")
    }
}

/// Text content with `<br>` turned into line breaks
fn flat_text(element: &ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}
