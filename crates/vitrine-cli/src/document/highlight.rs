//! JavaScript syntax highlighting with highlight.js class names.
//!
//! The output is an HTML fragment meant for a
//! `<code class="hljs language-javascript">` element; any hljs theme
//! stylesheet can style it.

use regex::Regex;
use std::sync::LazyLock;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "finally", "for", "from", "function",
    "get", "if", "import", "in", "instanceof", "let", "new", "of", "return", "set", "static",
    "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

const LITERALS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

const BUILTINS: &[&str] = &[
    "Array", "Boolean", "Date", "Error", "JSON", "Map", "Math", "Number", "Object", "Promise",
    "RegExp", "Set", "String", "Symbol", "console", "document", "exports", "module", "process",
    "require", "window",
];

static TOKEN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<comment>//[^\n]*|/\*[\s\S]*?\*/)",
        r#"|(?P<string>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\[\s\S])*`)"#,
        r"|(?P<number>\b(?:0[xX][0-9a-fA-F]+|\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\b)",
        r"|(?P<ident>[A-Za-z_$][\w$]*)",
    ))
});

/// Highlight JavaScript source as hljs-classed HTML.
pub fn highlight_js(source: &str) -> Result<String, regex::Error> {
    let token = TOKEN.as_ref().map_err(Clone::clone)?;

    let mut out = String::with_capacity(source.len() * 2);
    let mut last = 0;

    for caps in token.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&escape_html(&source[last..whole.start()]));
        last = whole.end();

        let text = whole.as_str();
        let class = if caps.name("comment").is_some() {
            Some("hljs-comment")
        } else if caps.name("string").is_some() {
            Some("hljs-string")
        } else if caps.name("number").is_some() {
            Some("hljs-number")
        } else {
            classify_identifier(text)
        };

        match class {
            Some(class) => {
                out.push_str("<span class=\"");
                out.push_str(class);
                out.push_str("\">");
                out.push_str(&escape_html(text));
                out.push_str("</span>");
            }
            None => out.push_str(&escape_html(text)),
        }
    }

    out.push_str(&escape_html(&source[last..]));
    Ok(out)
}

fn classify_identifier(ident: &str) -> Option<&'static str> {
    if KEYWORDS.contains(&ident) {
        Some("hljs-keyword")
    } else if LITERALS.contains(&ident) {
        Some("hljs-literal")
    } else if BUILTINS.contains(&ident) {
        Some("hljs-built_in")
    } else {
        None
    }
}

/// Escape text for HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
