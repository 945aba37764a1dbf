//! Theory-text display for the two criteria.
//!
//! The texts are embedded at build time and formatted for a fixed-width
//! terminal: lines starting with `# ` are headings, lines starting with `eq`
//! are equations; both are centered. Everything else is wrapped as prose.

use seism::criterion::Criterion;

const FIRST_CRITERION: &str = include_str!("../theory/criterion_1.txt");
const SECOND_CRITERION: &str = include_str!("../theory/criterion_2.txt");

pub const DISPLAY_WIDTH: usize = 80;

pub fn theory_text(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::First => FIRST_CRITERION,
        Criterion::Second => SECOND_CRITERION,
    }
}

/// Prints the theory text for the given criterion to stdout.
pub fn print_theory(criterion: Criterion) {
    println!("{}", format_theory(theory_text(criterion), DISPLAY_WIDTH));
}

/// Formats a theory text for a terminal of the given width.
pub fn format_theory(text: &str, width: usize) -> String {
    let paragraphs: Vec<String> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            if let Some(heading) = line.strip_prefix("# ") {
                center_text(heading, width)
            } else if let Some(equation) = line.strip_prefix("eq") {
                center_text(equation.trim_start(), width)
            } else {
                wrap_text(line, width)
            }
        })
        .collect();
    paragraphs.join("\n\n")
}

/// Wraps text into lines of at most `width` characters, breaking at spaces.
fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Centers each (wrapped) line of text relative to `width`.
fn center_text(text: &str, width: usize) -> String {
    wrap_text(text, width)
        .lines()
        .map(|line| {
            let padding = width.saturating_sub(line.len()) / 2;
            format!("{}{}", " ".repeat(padding), line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
