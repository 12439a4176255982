//! Layout: group positioned glyphs into text runs.
//!
//! PDFium reports one entry per character with its bounding box, size and
//! font. A PDF-to-DOM renderer emits one absolutely positioned box per run
//! of glyphs that share font, size and baseline, so the browser lays out
//! each word group in the right place without per-character boxes.
//!
//! Everything here is engine-independent and operates on plain [`Glyph`]
//! values, which keeps it unit-testable without a pdfium library.

use serde::{Deserialize, Serialize};

/// One character as reported by the engine, in PDF user space
/// (origin bottom-left, units of points).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// A positioned box of text, in CSS space (origin top-left, points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub font: FontStyle,
    pub text: String,
}

/// CSS font properties derived from a PDF font name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontStyle {
    /// CSS `font-family` value, already quoted and with a generic fallback.
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

/// Run under construction.
struct Pending {
    font_name: String,
    font_size: f32,
    baseline: f32,
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    text: String,
}

impl Pending {
    fn start(g: &Glyph) -> Self {
        Self {
            font_name: g.font_name.clone(),
            font_size: g.font_size,
            baseline: g.bottom,
            left: g.left,
            right: g.right,
            bottom: g.bottom,
            top: g.top,
            text: String::new(),
        }
    }

    fn accepts(&self, g: &Glyph, gap_factor: f32) -> bool {
        let size = self.font_size.max(1.0);
        if g.font_name != self.font_name || (g.font_size - self.font_size).abs() > 0.5 {
            return false;
        }
        if (g.bottom - self.baseline).abs() > size * 0.5 {
            return false;
        }
        let gap = g.left - self.right;
        gap <= size * gap_factor && gap >= -size
    }

    fn push(&mut self, g: &Glyph) {
        self.text.push(g.ch);
        self.left = self.left.min(g.left);
        self.right = self.right.max(g.right);
        self.bottom = self.bottom.min(g.bottom);
        self.top = self.top.max(g.top);
    }

    fn finish(self, page_height: f32) -> Option<TextRun> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        Some(TextRun {
            left: self.left,
            top: page_height - self.top,
            width: (self.right - self.left).max(0.0),
            height: (self.top - self.bottom).max(0.0),
            font_size: self.font_size,
            font: font_style(&self.font_name),
            text: text.to_string(),
        })
    }
}

/// Group glyphs, in content-stream order, into positioned runs.
///
/// `page_height` converts PDF's bottom-left origin to CSS's top-left.
/// `gap_factor` is the largest horizontal gap, in multiples of the font
/// size, that still joins two glyphs into one run.
pub fn group_runs(glyphs: &[Glyph], page_height: f32, gap_factor: f32) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut current: Option<Pending> = None;

    for g in glyphs {
        // Line breaks synthesised by the engine end the current run.
        if g.ch == '\n' || g.ch == '\r' {
            if let Some(p) = current.take() {
                runs.extend(p.finish(page_height));
            }
            continue;
        }
        if g.ch.is_control() && g.ch != '\t' {
            continue;
        }
        if g.ch.is_whitespace() {
            if let Some(p) = current.as_mut() {
                if !p.text.ends_with(' ') {
                    p.text.push(' ');
                }
            }
            continue;
        }

        match current.as_mut() {
            Some(p) if p.accepts(g, gap_factor) => p.push(g),
            _ => {
                if let Some(p) = current.take() {
                    runs.extend(p.finish(page_height));
                }
                let mut p = Pending::start(g);
                p.push(g);
                current = Some(p);
            }
        }
    }

    if let Some(p) = current {
        runs.extend(p.finish(page_height));
    }
    runs
}

/// Count the visible characters in a glyph list.
pub fn visible_chars(glyphs: &[Glyph]) -> usize {
    glyphs
        .iter()
        .filter(|g| !g.ch.is_whitespace() && !g.ch.is_control())
        .count()
}

/// Derive CSS font properties from a PDF base-font name.
///
/// Handles subset prefixes (`ABCDEF+Helvetica-Bold`) and the usual
/// `Family-Style` / `Family,Style` suffix conventions.
pub fn font_style(pdf_name: &str) -> FontStyle {
    let is_subset_tag = |prefix: &str| {
        prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase())
    };
    let name = match pdf_name.split_once('+') {
        Some((prefix, rest)) if is_subset_tag(prefix) => rest,
        _ => pdf_name,
    };
    let lower = name.to_ascii_lowercase();

    let bold = ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|k| lower.contains(k));
    let italic = lower.contains("italic") || lower.contains("oblique");

    let base: String = name
        .split(['-', ','])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let base = base.trim();

    let generic = if lower.contains("courier") || lower.contains("mono") {
        "monospace"
    } else if (lower.contains("times") || lower.contains("serif") || lower.contains("georgia"))
        && !lower.contains("sans")
    {
        "serif"
    } else {
        "sans-serif"
    };

    let family = if base.is_empty() {
        generic.to_string()
    } else {
        format!("'{base}', {generic}")
    };

    FontStyle {
        family,
        bold,
        italic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out `text` as monospaced glyphs of width `size * 0.5`.
    fn line(text: &str, x: f32, baseline: f32, size: f32, font: &str) -> Vec<Glyph> {
        let w = size * 0.5;
        text.chars()
            .enumerate()
            .map(|(i, ch)| Glyph {
                ch,
                left: x + i as f32 * w,
                right: x + (i + 1) as f32 * w,
                bottom: baseline,
                top: baseline + size,
                font_size: size,
                font_name: font.to_string(),
            })
            .collect()
    }

    #[test]
    fn one_line_is_one_run() {
        let glyphs = line("Hello world", 72.0, 700.0, 12.0, "Helvetica");
        let runs = group_runs(&glyphs, 792.0, 0.6);
        assert_eq!(runs.len(), 1);
        let r = &runs[0];
        assert_eq!(r.text, "Hello world");
        assert_eq!(r.left, 72.0);
        assert_eq!(r.top, 792.0 - 712.0);
        assert_eq!(r.width, 11.0 * 6.0);
        assert_eq!(r.height, 12.0);
    }

    #[test]
    fn new_baseline_starts_new_run() {
        let mut glyphs = line("First", 72.0, 700.0, 12.0, "Helvetica");
        glyphs.extend(line("Second", 72.0, 680.0, 12.0, "Helvetica"));
        let runs = group_runs(&glyphs, 792.0, 0.6);
        let texts: Vec<_> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second"]);
        assert!(runs[1].top > runs[0].top);
    }

    #[test]
    fn font_change_starts_new_run() {
        let mut glyphs = line("plain", 72.0, 700.0, 12.0, "Helvetica");
        glyphs.extend(line("bold", 102.0, 700.0, 12.0, "Helvetica-Bold"));
        let runs = group_runs(&glyphs, 792.0, 0.6);
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].font.bold);
        assert!(runs[1].font.bold);
    }

    #[test]
    fn wide_gap_splits_columns() {
        let mut glyphs = line("left", 72.0, 700.0, 10.0, "Times-Roman");
        glyphs.extend(line("right", 300.0, 700.0, 10.0, "Times-Roman"));
        let runs = group_runs(&glyphs, 792.0, 0.6);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].left, 300.0);
    }

    #[test]
    fn higher_gap_factor_merges() {
        let mut glyphs = line("a", 72.0, 700.0, 10.0, "F");
        glyphs.extend(line("b", 85.0, 700.0, 10.0, "F"));
        // Gap is 8pt: over 0.6em, under 1.0em.
        assert_eq!(group_runs(&glyphs, 792.0, 0.6).len(), 2);
        assert_eq!(group_runs(&glyphs, 792.0, 1.0).len(), 1);
    }

    #[test]
    fn whitespace_and_line_breaks() {
        let mut glyphs = line("  a b  ", 72.0, 700.0, 10.0, "F");
        let newline = Glyph {
            ch: '\n',
            ..glyphs[0].clone()
        };
        glyphs.push(newline);
        glyphs.extend(line("c", 72.0, 700.0, 10.0, "F"));
        let runs = group_runs(&glyphs, 792.0, 0.6);
        let texts: Vec<_> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a b", "c"]);
    }

    #[test]
    fn control_only_input_yields_nothing() {
        let glyphs = line("\u{1}\u{2} \t", 0.0, 0.0, 10.0, "F");
        assert!(group_runs(&glyphs, 100.0, 0.6).is_empty());
        assert_eq!(visible_chars(&glyphs), 0);
    }

    #[test]
    fn visible_char_count() {
        assert_eq!(visible_chars(&line("ab c", 0.0, 0.0, 10.0, "F")), 3);
    }

    #[test]
    fn font_style_from_names() {
        let s = font_style("ABCDEF+Helvetica-BoldOblique");
        assert_eq!(s.family, "'Helvetica', sans-serif");
        assert!(s.bold && s.italic);

        let s = font_style("Times-Roman");
        assert_eq!(s.family, "'Times', serif");
        assert!(!s.bold && !s.italic);

        let s = font_style("CourierNew,Italic");
        assert_eq!(s.family, "'CourierNew', monospace");
        assert!(s.italic);

        let s = font_style("OpenSans-Semibold");
        assert_eq!(s.family, "'OpenSans', sans-serif");
        assert!(s.bold);

        assert_eq!(font_style("").family, "sans-serif");
    }

    #[test]
    fn subset_prefix_must_be_six_uppercase() {
        assert_eq!(font_style("abc+Serif").family, "'abcSerif', serif");
    }
}
