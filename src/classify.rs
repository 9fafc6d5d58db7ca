//! Stage and page classification over the rolling output window.
//!
//! Extracts progress signals from raw build output using trailing regex
//! patterns, checked in a fixed precedence order:
//!
//! 1. page markers — `[<n> ...]` ending the window
//! 2. generic stage starts — `Latexmk: applying rule '<name>'...`
//! 3. hardcoded tool banners — `This is pdfTeX, Version ...` and friends
//!
//! The classifier is stateless: it sees only the current window text plus the
//! caller's page-producing flag, and emits at most one signal per call.

use crate::window::RollingWindow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Compile regexes once using LazyLock
static PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)[^\[\]]*\]$").expect("page pattern is valid"));

static RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Latexmk: applying rule '([a-zA-Z\s/]+)'\.\.\.$").expect("rule pattern is valid")
});

/// Whether a stage's output stream contains numbered page markers.
///
/// Known immediately for hardcoded tool signatures; `Unknown` for generic
/// stage starts until a page marker (resolves to `Yes`) or build end
/// (resolves to `No`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageYield {
    Unknown,
    Yes,
    No,
}

/// A recognized progress signal. At most one per classification pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A new stage began.
    StageStart { tool: String, pages: PageYield },
    /// The current stage finished output page `n`.
    Page(u32),
}

/// A well-known build tool, recognized by its banner line.
pub struct ToolSignature {
    /// Display name, used as the stage name.
    pub name: &'static str,
    /// latexmk rule names owned by this tool; a generic rule match on one of
    /// these is suppressed so the banner alone counts the stage.
    aliases: &'static [&'static str],
    pattern: Regex,
    pub produces_pages: bool,
}

fn sig(
    name: &'static str,
    aliases: &'static [&'static str],
    pattern: &str,
    produces_pages: bool,
) -> ToolSignature {
    ToolSignature {
        name,
        aliases,
        pattern: Regex::new(pattern).expect("tool signature pattern is valid"),
        produces_pages,
    }
}

/// Ordered signature table: first match wins. The order is a contract, not an
/// accident of map iteration.
static SIGNATURES: LazyLock<Vec<ToolSignature>> = LazyLock::new(|| {
    vec![
        sig(
            "pdfTeX",
            &["pdflatex", "pdftex", "latex", "etex"],
            r"This is pdfTeX\b[^\n]*$",
            true,
        ),
        sig(
            "XeTeX",
            &["xelatex", "xetex"],
            r"This is XeTeX\b[^\n]*$",
            true,
        ),
        sig(
            "LuaTeX",
            &["lualatex", "luatex", "luahbtex"],
            r"This is Lua(?:HB)?TeX\b[^\n]*$",
            true,
        ),
        sig(
            "BibTeX",
            &["bibtex"],
            r"This is BibTeX\b[^\n]*$",
            false,
        ),
        sig(
            "Biber",
            &["biber"],
            r"This is Biber\b[^\n]*$",
            false,
        ),
        sig(
            "makeindex",
            &["makeindex"],
            r"This is makeindex\b[^\n]*$",
            false,
        ),
        sig(
            "dvipdfmx",
            &["dvipdf", "dvipdfmx"],
            r"This is dvipdfmx\b[^\n]*$",
            true,
        ),
    ]
});

/// Look up the hardcoded signature owning a latexmk rule name, if any.
pub fn signature_for_rule(rule: &str) -> Option<&'static ToolSignature> {
    let rule = rule.trim();
    SIGNATURES.iter().find(|s| {
        s.name.eq_ignore_ascii_case(rule) || s.aliases.iter().any(|a| a.eq_ignore_ascii_case(rule))
    })
}

/// Classify the most recently appended text.
///
/// `pages` is the current stage's page-producing flag; page matching is
/// skipped only when it is `No` — a page marker seen while the flag is
/// `Unknown` is what lazily resolves it to `Yes`.
pub fn classify(window: &RollingWindow, pages: PageYield) -> Option<Signal> {
    let text = window.text();

    if pages != PageYield::No {
        if let Some(cap) = PAGE_REGEX.captures(&text) {
            let digits = &cap[1];
            return match digits.parse::<u32>() {
                Ok(n) => Some(Signal::Page(n)),
                Err(_) => {
                    // Untrusted stream: a marker whose digits overflow is no signal.
                    tracing::debug!(digits, "page marker with unparseable number, dropped");
                    None
                }
            };
        }
    }

    if let Some(cap) = RULE_REGEX.captures(&text) {
        let name = cap[1].trim().to_string();
        if signature_for_rule(&name).is_some() {
            // The hardcoded signature owns this rule; its banner line counts
            // the stage, so the generic match is discarded.
            tracing::debug!(rule = %name, "generic rule start deferred to tool signature");
            return None;
        }
        return Some(Signal::StageStart {
            tool: name,
            pages: PageYield::Unknown,
        });
    }

    for signature in SIGNATURES.iter() {
        if signature.pattern.is_match(&text) {
            return Some(Signal::StageStart {
                tool: signature.name.to_string(),
                pages: if signature.produces_pages {
                    PageYield::Yes
                } else {
                    PageYield::No
                },
            });
        }
    }

    None
}
