//! Markdown to styled terminal text
//!
//! Covers what question-answering endpoints actually send back: emphasis,
//! inline code, headings, bullet and numbered lists, fenced code and links.
//! Anything that does not close properly is shown literally.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render a markdown document as a list of styled lines
pub fn markdown_to_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            lines.push(Line::from(Span::styled(
                format!("  {}", raw),
                Style::default().fg(Color::Yellow),
            )));
            continue;
        }

        lines.push(parse_block_line(raw));
    }

    lines
}

fn parse_block_line(raw: &str) -> Line<'static> {
    let trimmed = raw.trim_start();
    let indent = " ".repeat(raw.len() - trimmed.len());

    // Headings: one to six '#' then a space
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        let style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        return Line::from(parse_inline(trimmed[hashes..].trim(), style));
    }

    // Bullets: "- ", "* ", "+ "
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            let mut spans = vec![Span::raw(format!("{}  • ", indent))];
            spans.extend(parse_inline(rest, Style::default()));
            return Line::from(spans);
        }
    }

    // Numbered: "12. " or "12) "
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(item) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            let mut spans = vec![Span::raw(format!("{}  {}. ", indent, &trimmed[..digits]))];
            spans.extend(parse_inline(item, Style::default()));
            return Line::from(spans);
        }
    }

    let spans = parse_inline(raw, Style::default());
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Find `pat` in `chars` starting at `from`
fn find_seq(chars: &[char], from: usize, pat: &[char]) -> Option<usize> {
    if pat.is_empty() || from > chars.len() {
        return None;
    }
    chars[from..]
        .windows(pat.len())
        .position(|w| w == pat)
        .map(|p| p + from)
}

/// Parse inline emphasis, code and links into spans layered on `base`
fn parse_inline(text: &str, base: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut i = 0;

    let flush = |current_text: &mut String, spans: &mut Vec<Span<'static>>| {
        if !current_text.is_empty() {
            spans.push(Span::styled(std::mem::take(current_text), base));
        }
    };

    while i < chars.len() {
        let c = chars[i];

        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                match find_seq(&chars, i + 2, &['*', '*']) {
                    Some(end) if end > i + 2 => {
                        flush(&mut current_text, &mut spans);
                        let inner: String = chars[i + 2..end].iter().collect();
                        spans.extend(parse_inline(&inner, base.add_modifier(Modifier::BOLD)));
                        i = end + 2;
                    }
                    _ => {
                        // No closing **, treat as literal
                        current_text.push_str("**");
                        i += 2;
                    }
                }
            }
            '*' | '_' => {
                let opens = chars.get(i + 1).is_some_and(|n| !n.is_whitespace())
                    && (c == '*' || i == 0 || !chars[i - 1].is_alphanumeric());
                match find_seq(&chars, i + 1, &[c]) {
                    Some(end) if opens && end > i + 1 => {
                        flush(&mut current_text, &mut spans);
                        let inner: String = chars[i + 1..end].iter().collect();
                        spans.extend(parse_inline(&inner, base.add_modifier(Modifier::ITALIC)));
                        i = end + 1;
                    }
                    _ => {
                        current_text.push(c);
                        i += 1;
                    }
                }
            }
            '`' => match find_seq(&chars, i + 1, &['`']) {
                Some(end) if end > i + 1 => {
                    flush(&mut current_text, &mut spans);
                    let code: String = chars[i + 1..end].iter().collect();
                    spans.push(Span::styled(code, base.fg(Color::Yellow)));
                    i = end + 1;
                }
                _ => {
                    current_text.push(c);
                    i += 1;
                }
            },
            '[' => {
                let link = find_seq(&chars, i + 1, &[']']).and_then(|close| {
                    if chars.get(close + 1) != Some(&'(') {
                        return None;
                    }
                    find_seq(&chars, close + 2, &[')']).map(|paren| (close, paren))
                });

                match link {
                    Some((close, paren)) if close > i + 1 => {
                        flush(&mut current_text, &mut spans);
                        let label: String = chars[i + 1..close].iter().collect();
                        let url: String = chars[close + 2..paren].iter().collect();
                        let link_style = base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
                        spans.extend(parse_inline(&label, link_style));
                        if !url.is_empty() {
                            spans.push(Span::styled(
                                format!(" ({})", url),
                                Style::default().fg(Color::DarkGray),
                            ));
                        }
                        i = paren + 1;
                    }
                    _ => {
                        current_text.push(c);
                        i += 1;
                    }
                }
            }
            _ => {
                current_text.push(c);
                i += 1;
            }
        }
    }

    flush(&mut current_text, &mut spans);
    spans
}
