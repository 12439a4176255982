//! DOM synthesis: turn positioned runs and images into HTML.
//!
//! Every page becomes a fixed-size `<div class="page">` sized in points,
//! and every run or image an absolutely positioned child. Points are used
//! end to end so no DPI assumption leaks into the markup; browsers map
//! `1pt` to `1/72in` exactly as PDF does.
//!
//! Output is deterministic: attribute order is fixed and numbers are
//! printed with at most two decimals, so the same PDF always produces
//! byte-identical HTML.

use crate::pipeline::layout::TextRun;
use std::fmt::Write as _;

/// Stylesheet shared by every page. Fragment-mode callers should include
/// it in their host page.
pub const STYLESHEET: &str = "\
body{margin:0;background:#e5e5e5}
.page{position:relative;overflow:hidden;margin:12pt auto;background:#fff;box-shadow:0 0 4pt rgba(0,0,0,.3)}
.page .r{position:absolute;white-space:pre;line-height:1;color:#000}
.page .i{position:absolute}
";

/// An image placed on a page, in CSS space (points, top-left origin).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// A `data:` URI.
    pub src: String,
}

/// Everything needed to render one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub page_num: usize,
    pub width: f32,
    pub height: f32,
    pub runs: Vec<TextRun>,
    pub images: Vec<PlacedImage>,
}

/// Document-level `<head>` information.
#[derive(Debug, Clone, Default)]
pub struct HeadInfo {
    pub title: String,
    /// `(name, content)` pairs emitted as `<meta name=… content=…>`.
    pub meta: Vec<(&'static str, String)>,
}

/// Render one page to its `<div class="page">` fragment.
///
/// Images are emitted before text so text stays on top in paint order.
pub fn render_page(page: &PageContent) -> String {
    let mut out = String::with_capacity(128 + page.runs.len() * 160);
    open_page(&mut out, page.page_num, page.width, page.height, None);

    for img in &page.images {
        let _ = writeln!(
            out,
            r#"<img class="i" style="left:{}pt;top:{}pt;width:{}pt;height:{}pt" src="{}" alt="">"#,
            fmt_pt(img.left),
            fmt_pt(img.top),
            fmt_pt(img.width),
            fmt_pt(img.height),
            escape_attr(&img.src),
        );
    }

    for run in &page.runs {
        let mut style = format!(
            "left:{}pt;top:{}pt;font-size:{}pt;font-family:{}",
            fmt_pt(run.left),
            fmt_pt(run.top),
            fmt_pt(run.font_size),
            run.font.family,
        );
        if run.font.bold {
            style.push_str(";font-weight:bold");
        }
        if run.font.italic {
            style.push_str(";font-style:italic");
        }
        let _ = writeln!(
            out,
            r#"<div class="r" style="{}">{}</div>"#,
            escape_attr(&style),
            escape_html(&run.text),
        );
    }

    out.push_str("</div>\n");
    out
}

/// Render the placeholder for a page the engine could not read.
pub fn render_failed_page(page_num: usize, width: f32, height: f32, error: &str) -> String {
    let mut out = String::new();
    open_page(&mut out, page_num, width, height, Some(error));
    out.push_str("</div>\n");
    out
}

fn open_page(out: &mut String, page_num: usize, width: f32, height: f32, error: Option<&str>) {
    let _ = write!(
        out,
        r#"<div class="page" id="page_{page_num}" data-page="{page_num}" style="width:{}pt;height:{}pt""#,
        fmt_pt(width),
        fmt_pt(height),
    );
    if let Some(e) = error {
        let _ = write!(out, r#" data-error="{}""#, escape_attr(e));
    }
    out.push_str(">\n");
}

/// Wrap page fragments in a complete UTF-8 HTML document.
pub fn assemble_document(head: &HeadInfo, pages: &[String]) -> String {
    let body_len: usize = pages.iter().map(String::len).sum();
    let mut out = String::with_capacity(body_len + 1024);

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(
        out,
        r#"<meta name="generator" content="pdf2html {}">"#,
        env!("CARGO_PKG_VERSION")
    );
    for (name, content) in &head.meta {
        let _ = writeln!(
            out,
            r#"<meta name="{}" content="{}">"#,
            escape_attr(name),
            escape_attr(content)
        );
    }
    let _ = writeln!(out, "<title>{}</title>", escape_html(&head.title));
    out.push_str("<style>\n");
    out.push_str(STYLESHEET);
    out.push_str("</style>\n</head>\n<body>\n");

    for page in pages {
        out.push_str(page);
    }

    out.push_str("</body>\n</html>\n");
    out
}

/// Concatenate page fragments without any document wrapper.
pub fn assemble_fragment(pages: &[String]) -> String {
    pages.concat()
}

/// Escape text content.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value. Single quotes are left alone so
/// CSS font-family lists stay readable.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Format a length with at most two decimals and no trailing zeros.
pub fn fmt_pt(v: f32) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        s => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::FontStyle;

    fn run(text: &str, bold: bool) -> TextRun {
        TextRun {
            left: 72.0,
            top: 80.5,
            width: 60.0,
            height: 12.0,
            font_size: 12.0,
            font: FontStyle {
                family: "'Helvetica', sans-serif".into(),
                bold,
                italic: false,
            },
            text: text.into(),
        }
    }

    #[test]
    fn fmt_pt_trims() {
        assert_eq!(fmt_pt(612.0), "612");
        assert_eq!(fmt_pt(80.5), "80.5");
        assert_eq!(fmt_pt(1.0 / 3.0), "0.33");
        assert_eq!(fmt_pt(-0.001), "0");
        assert_eq!(fmt_pt(f32::NAN), "0");
        assert_eq!(fmt_pt(-12.25), "-12.25");
    }

    #[test]
    fn escapes() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_attr("'F', serif\""), "'F', serif&quot;");
    }

    #[test]
    fn page_markup() {
        let page = PageContent {
            page_num: 2,
            width: 612.0,
            height: 792.0,
            runs: vec![run("a < b", true)],
            images: vec![PlacedImage {
                left: 0.0,
                top: 0.0,
                width: 10.0,
                height: 10.0,
                src: "data:image/png;base64,AAAA".into(),
            }],
        };
        let html = render_page(&page);
        assert!(html.starts_with(
            r#"<div class="page" id="page_2" data-page="2" style="width:612pt;height:792pt">"#
        ));
        assert!(html.contains(
            r#"<div class="r" style="left:72pt;top:80.5pt;font-size:12pt;font-family:'Helvetica', sans-serif;font-weight:bold">a &lt; b</div>"#
        ));
        let img_at = html.find("<img").unwrap();
        let run_at = html.find(r#"class="r""#).unwrap();
        assert!(img_at < run_at, "images paint below text");
        assert!(html.ends_with("</div>\n"));
    }

    #[test]
    fn failed_page_carries_error() {
        let html = render_failed_page(3, 100.0, 200.0, "bad \"stream\"");
        assert!(html.contains(r#"data-error="bad &quot;stream&quot;""#));
        assert!(html.contains(r#"id="page_3""#));
    }

    #[test]
    fn document_wrapper() {
        let head = HeadInfo {
            title: "Q&A".into(),
            meta: vec![("author", "Jo <jo@example.com>".into())],
        };
        let doc = assemble_document(&head, &["<div>1</div>\n".into(), "<div>2</div>\n".into()]);
        assert!(doc.starts_with("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n"));
        assert!(doc.contains("<title>Q&amp;A</title>"));
        assert!(doc.contains(r#"<meta name="author" content="Jo &lt;jo@example.com&gt;">"#));
        assert!(doc.contains(STYLESHEET));
        assert!(doc.contains("<div>1</div>\n<div>2</div>\n</body>"));
        assert!(doc.ends_with("</html>\n"));
    }

    #[test]
    fn fragment_has_no_wrapper() {
        let frag = assemble_fragment(&["<div>1</div>\n".into()]);
        assert_eq!(frag, "<div>1</div>\n");
    }

    #[test]
    fn rendering_is_deterministic() {
        let page = PageContent {
            page_num: 1,
            width: 595.28,
            height: 841.89,
            runs: vec![run("x", false), run("y", false)],
            images: vec![],
        };
        assert_eq!(render_page(&page), render_page(&page));
    }
}
