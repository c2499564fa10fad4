//! Regex validation port
//!
//! A reassembled regex is compiled purely to learn whether it is valid; the
//! compiled program is discarded. The engine sits behind a trait so the
//! parser and the models stay independently testable.
//!
//! The engine-facing adapter also absorbs two dialect gaps. The structural
//! syntax this crate works with allows duplicate group names and the
//! `(?'name')` quote form; the backing engine accepts neither, so before
//! compiling, quote-named groups are rewritten to angle syntax and repeated
//! names are uniquified. Both rewrites preserve validity and nothing else;
//! the compiled object never leaves this module.

use std::collections::HashSet;

/// Compile-for-validation port.
pub trait RegexValidator {
    /// `Ok` when the pattern compiles; `Err` carries the engine's message.
    fn validate(&self, pattern: &str) -> Result<(), String>;
}

/// Validator backed by the `fancy-regex` engine, which understands the
/// atomic `(?>...)` groups the structural syntax produces.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineValidator;

impl RegexValidator for EngineValidator {
    fn validate(&self, pattern: &str) -> Result<(), String> {
        let normalized = allow_duplicate_names(pattern);
        match fancy_regex::Regex::new(&normalized) {
            Ok(_) => Ok(()),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// A validator that accepts everything. Useful in tests exercising model
/// plumbing without an engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllValidator;

impl RegexValidator for AcceptAllValidator {
    fn validate(&self, _pattern: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Rewrites `pattern` so the engine tolerates the naming liberties the
/// structural syntax allows: `(?'name')` becomes `(?<name>)`, and a group
/// name that already appeared gets a numeric suffix. Escaped parentheses
/// are left alone.
fn allow_duplicate_names(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut seen: HashSet<String> = HashSet::new();
    let mut pos = 0;

    while pos < chars.len() {
        let symbol = chars[pos];
        if symbol != '(' || !is_live_delimiter(&chars, pos) {
            out.push(symbol);
            pos += 1;
            continue;
        }

        // a live group opening; look for a naming entrance
        let entrance = named_entrance(&chars, pos + 1);
        let Some((skip, closing, python)) = entrance else {
            out.push(symbol);
            pos += 1;
            continue;
        };

        let name_start = pos + 1 + skip;
        let Some(name_end) = (name_start..chars.len()).find(|i| chars[*i] == closing) else {
            out.push(symbol);
            pos += 1;
            continue;
        };

        let name: String = chars[name_start..name_end].iter().collect();
        let mut unique = name.clone();
        let mut suffix = 1;
        while !seen.insert(unique.clone()) {
            unique = format!("{}_{}", name, suffix);
            suffix += 1;
        }

        out.push('(');
        out.push_str(if python { "?P<" } else { "?<" });
        out.push_str(&unique);
        out.push('>');
        pos = name_end + 1;
    }

    out
}

/// Same liveness rule as the structural scanner: a delimiter escaped by
/// exactly one backslash is literal; two backslashes make it live again.
fn is_live_delimiter(chars: &[char], pos: usize) -> bool {
    if pos == 0 {
        true
    } else if pos >= 2 {
        (chars[pos - 2] == '\\' && chars[pos - 1] == '\\') || chars[pos - 1] != '\\'
    } else {
        chars[0] != '\\'
    }
}

/// Detects `?<name>`, `?'name'` or `?P<name>` at `start`, rejecting the
/// look-around forms `?<=` / `?<!`. Returns the entrance length, the name's
/// closing delimiter, and whether the python form was used.
fn named_entrance(chars: &[char], start: usize) -> Option<(usize, char, bool)> {
    if start + 1 >= chars.len() || chars[start] != '?' {
        return None;
    }
    match chars[start + 1] {
        '<' => {
            let next = chars.get(start + 2).copied();
            if next == Some('=') || next == Some('!') {
                None
            } else {
                Some((2, '>', false))
            }
        }
        '\'' => Some((2, '\'', false)),
        'P' if chars.get(start + 2).copied() == Some('<') => Some((3, '>', true)),
        _ => None,
    }
}
