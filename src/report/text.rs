//! Plain-text rendering, used when no PDF font family is available

use super::document::{Block, ReportDocument};

const RULE_WIDTH: usize = 42;

pub fn render_text(document: &ReportDocument) -> String {
    let mut output = String::new();

    for block in &document.blocks {
        match block {
            Block::Title(title) => {
                output.push_str(title);
                output.push('\n');
                output.push_str(&"\u{2501}".repeat(RULE_WIDTH));
                output.push_str("\n\n");
            }
            Block::Heading(heading) => {
                output.push_str(&format!("\n{}\n", heading));
                output.push_str(&"-".repeat(heading.chars().count()));
                output.push('\n');
            }
            Block::Subheading(sub) => output.push_str(&format!("\n{}\n", sub)),
            Block::Paragraph(text) => {
                output.push_str(text);
                output.push('\n');
            }
            Block::Field { label, value } => {
                output.push_str(&format!("  {}: {}\n", label, value));
            }
            Block::Bullets(items) => {
                for item in items {
                    output.push_str(&format!("  \u{2022} {}\n", item));
                }
            }
            Block::PageBreak => {
                output.push('\n');
                output.push_str(&"\u{2501}".repeat(RULE_WIDTH));
                output.push('\n');
            }
        }
    }

    output
}
