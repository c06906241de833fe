//! Entry-point derivation
//!
//! Some runtimes mandate a contract between the source text and its file
//! name: a Java public class must live in `<ClassName>.java`, and `java`
//! is invoked with that same class name. The rule here derives the staged
//! filename from the submission before anything touches the filesystem,
//! and rewrites the source when the submission doesn't carry a usable
//! identifier.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::config::language::FileExtension;

/// How the staged source filename is derived from the submission text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum EntryPointRule {
    /// Source is always staged as `main.<extension>`
    #[default]
    Fixed,

    /// Scan the source for a `public class <Ident>` declaration; the
    /// identifier names both the staged file and the run target. When no
    /// declaration is found, the first `class <Ident>` token is rewritten
    /// to `fallback` and that identifier is used instead.
    PublicClass {
        #[serde(default = "default_fallback")]
        fallback: String,
    },
}

fn default_fallback() -> String {
    "Main".to_owned()
}

/// Source text ready for staging, with its derived file name.
#[derive(Debug, Clone)]
pub struct StagedSource<'a> {
    /// File name without extension; also the run target for entry-point
    /// derived languages
    pub stem: String,

    /// Full staged file name (stem + extension)
    pub file_name: String,

    /// Source text, rewritten only when the fallback identifier was applied
    pub source: Cow<'a, str>,
}

impl EntryPointRule {
    /// Derive the staged filename (and possibly rewritten source) for a
    /// submission. Must run before staging: the filename depends on the
    /// source content.
    pub fn resolve<'a>(&self, source: &'a str, extension: &FileExtension) -> StagedSource<'a> {
        match self {
            EntryPointRule::Fixed => StagedSource {
                stem: "main".to_owned(),
                file_name: format!("main.{extension}"),
                source: Cow::Borrowed(source),
            },
            EntryPointRule::PublicClass { fallback } => {
                if let Some(name) = find_public_class(source) {
                    StagedSource {
                        file_name: format!("{name}.{extension}"),
                        stem: name,
                        source: Cow::Borrowed(source),
                    }
                } else {
                    StagedSource {
                        stem: fallback.clone(),
                        file_name: format!("{fallback}.{extension}"),
                        source: Cow::Owned(rewrite_class_token(source, fallback)),
                    }
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Length in bytes of the identifier at the start of `s`, or 0
fn ident_len(s: &str) -> usize {
    let mut len = 0;
    for (i, c) in s.char_indices() {
        let valid = if i == 0 {
            is_ident_start(c)
        } else {
            is_ident_char(c)
        };
        if !valid {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

/// Find the identifier of the first `public class <Ident>` declaration.
pub fn find_public_class(source: &str) -> Option<String> {
    let mut words = source.split_whitespace().peekable();
    while let Some(word) = words.next() {
        if word != "public" {
            continue;
        }
        let Some(&next) = words.peek() else { break };
        if next != "class" {
            continue;
        }
        words.next();
        if let Some(&candidate) = words.peek() {
            let len = ident_len(candidate);
            if len > 0 {
                return Some(candidate[..len].to_owned());
            }
        }
    }
    None
}

/// Rewrite the identifier of the first `class <Ident>` token to `fallback`.
/// Returns the source unchanged when no class declaration is present.
pub fn rewrite_class_token(source: &str, fallback: &str) -> String {
    let mut search_from = 0;
    while let Some(found) = source[search_from..].find("class") {
        let start = search_from + found;
        let end = start + "class".len();

        // "class" must be a standalone word
        let prev_ok = start == 0
            || !source[..start]
                .chars()
                .next_back()
                .is_some_and(is_ident_char);
        if !prev_ok {
            search_from = end;
            continue;
        }

        let rest = &source[end..];
        let trimmed = rest.trim_start();
        let ws = rest.len() - trimmed.len();
        if ws == 0 {
            search_from = end;
            continue;
        }

        let len = ident_len(trimmed);
        if len == 0 {
            search_from = end;
            continue;
        }

        let ident_start = end + ws;
        let mut rewritten = String::with_capacity(source.len() + fallback.len());
        rewritten.push_str(&source[..ident_start]);
        rewritten.push_str(fallback);
        rewritten.push_str(&source[ident_start + len..]);
        return rewritten;
    }
    source.to_owned()
}
