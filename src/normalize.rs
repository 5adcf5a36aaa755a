//! Markup noise removal for raw wiki dump text.
//!
//! Normalization is an ordered chain of independent text rules. The first step
//! isolates the `<text>` payload of the dump and is the only fallible one; the
//! remaining rules live in [`RULES`] and are applied in table order by [`clean`].
//! Later rules rely on earlier ones having fired (entity removal, for example,
//! expects numeric references to have lost their digits already), so the order
//! of the table is part of the output contract.

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use log::debug;
use regex::{Captures, Regex, Replacer};

use crate::error::{PrepError, Result};

/// Signature shared by every normalization rule.
pub type RuleFn = fn(&str) -> String;

/// A named, pure text transform.
#[derive(Clone, Copy)]
pub struct Rule {
    name: &'static str,
    apply: RuleFn,
}

impl Rule {
    /// Stable identifier of the rule.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the rule to `text`.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        (self.apply)(text)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

/// Rules applied after payload isolation, in application order.
pub const RULES: [Rule; 14] = [
    Rule {
        name: "strip_tags",
        apply: strip_tags,
    },
    Rule {
        name: "strip_redirects",
        apply: strip_redirects,
    },
    Rule {
        name: "strip_timestamps",
        apply: strip_timestamps,
    },
    Rule {
        name: "strip_numbers",
        apply: strip_numbers,
    },
    Rule {
        name: "strip_word_digits",
        apply: strip_word_digits,
    },
    Rule {
        name: "unwrap_links",
        apply: unwrap_links,
    },
    Rule {
        name: "unwrap_templates",
        apply: unwrap_templates,
    },
    Rule {
        name: "strip_refs",
        apply: strip_refs,
    },
    Rule {
        name: "strip_entities",
        apply: strip_entities,
    },
    Rule {
        name: "strip_external_links",
        apply: strip_external_links,
    },
    Rule {
        name: "strip_quotes",
        apply: strip_quotes,
    },
    Rule {
        name: "trim",
        apply: trim,
    },
    Rule {
        name: "collapse_newlines",
        apply: collapse_newlines,
    },
    Rule {
        name: "collapse_spaces",
        apply: collapse_spaces,
    },
];

/// Looks up a rule from [`RULES`] by name.
#[must_use]
pub fn rule(name: &str) -> Option<Rule> {
    RULES.iter().copied().find(|rule| rule.name == name)
}

/// Isolates the payload and applies every rule in [`RULES`].
pub fn normalize(raw: &str) -> Result<String> {
    let payload = isolate_payload(raw)?;
    debug!(
        "isolated payload of {} bytes from {} bytes of raw text",
        payload.len(),
        raw.len()
    );
    Ok(clean(payload))
}

/// Applies every rule in [`RULES`] without payload isolation.
#[must_use]
pub fn clean(text: &str) -> String {
    let mut current = text.to_owned();
    for rule in &RULES {
        let next = rule.apply(&current);
        debug!("rule {}: {} -> {} bytes", rule.name, current.len(), next.len());
        current = next;
    }
    current
}

/// Returns the content between the first `<text ...>` opening tag and the next `</text>`.
///
/// Self-closing `<text ... />` tags carry no payload and are skipped.
pub fn isolate_payload(raw: &str) -> Result<&str> {
    let open = cached(&TEXT_OPEN_RE, r"<text(?:\s[^>]*)?>");
    for tag in open.find_iter(raw) {
        if tag.as_str().ends_with("/>") {
            continue;
        }
        let rest = &raw[tag.end()..];
        return match rest.find("</text>") {
            Some(close) => Ok(&rest[..close]),
            None => Err(PrepError::MalformedInput(format!(
                "<text> tag at byte {} has no matching </text>",
                tag.start()
            ))),
        };
    }
    Err(PrepError::MalformedInput(
        "no <text>...</text> payload found in raw input".into(),
    ))
}

static TEXT_OPEN_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static REDIRECT_RE: OnceLock<Regex> = OnceLock::new();
static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();
static CUR_ID_RE: OnceLock<Regex> = OnceLock::new();
static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static WORD_DIGITS_RE: OnceLock<Regex> = OnceLock::new();
static LINK_RE: OnceLock<Regex> = OnceLock::new();
static TEMPLATE_RE: OnceLock<Regex> = OnceLock::new();
static REF_RE: OnceLock<Regex> = OnceLock::new();
static ENTITY_RE: OnceLock<Regex> = OnceLock::new();
static EXTERNAL_LINK_RE: OnceLock<Regex> = OnceLock::new();
static NEWLINES_RE: OnceLock<Regex> = OnceLock::new();
static SPACES_RE: OnceLock<Regex> = OnceLock::new();

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("normalization pattern is valid"))
}

fn remove_all(re: &Regex, text: &str) -> String {
    re.replace_all(text, "").into_owned()
}

/// Re-applies `re` until the text stops changing, so nested constructs unwrap
/// from the innermost outward. Every replacement drops the delimiters, which
/// bounds the number of passes by the nesting depth.
fn replace_until_stable<R: Replacer>(re: &Regex, text: &str, mut replacer: R) -> String {
    let mut current = text.to_owned();
    loop {
        let next = match re.replace_all(&current, replacer.by_ref()) {
            Cow::Borrowed(_) => None,
            Cow::Owned(next) => Some(next),
        };
        match next {
            Some(next) => current = next,
            None => return current,
        }
    }
}

/// Removes every `<...>` tag.
#[must_use]
pub fn strip_tags(text: &str) -> String {
    remove_all(cached(&TAG_RE, r"<[^>]*>"), text)
}

/// Removes `#REDIRECT [[...]]` directives.
#[must_use]
pub fn strip_redirects(text: &str) -> String {
    remove_all(cached(&REDIRECT_RE, r"(?i)#REDIRECT\s*\[\[[^\]]*\]\]"), text)
}

/// Removes ISO-8601 timestamps such as `2006-03-04T01:41:25Z`.
#[must_use]
pub fn strip_timestamps(text: &str) -> String {
    let re = cached(
        &TIMESTAMP_RE,
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:[0-9]{2})?",
    );
    remove_all(re, text)
}

/// Removes `cur_id=N` markers, then every bare digit run.
#[must_use]
pub fn strip_numbers(text: &str) -> String {
    let without_ids = cached(&CUR_ID_RE, r"cur_id=[0-9]+").replace_all(text, "");
    remove_all(cached(&NUMBER_RE, r"(?-u:\b)[0-9]+(?-u:\b)"), &without_ids)
}

/// Removes tokens made of a word directly followed by a 4 to 6 digit number.
#[must_use]
pub fn strip_word_digits(text: &str) -> String {
    remove_all(cached(&WORD_DIGITS_RE, r"(?-u:\b)[A-Za-z_]+[0-9]{4,6}(?-u:\b)"), text)
}

/// Replaces `[[target|label]]` with `label` and `[[label]]` with `label`.
#[must_use]
pub fn unwrap_links(text: &str) -> String {
    let re = cached(&LINK_RE, r"\[\[(?:[^\[\]]*\|)?([^\[\]|]*)\]\]");
    replace_until_stable(re, text, "$1")
}

/// Replaces `{{name|content}}` with `content` and `{{name}}` with `name`.
#[must_use]
pub fn unwrap_templates(text: &str) -> String {
    let re = cached(&TEMPLATE_RE, r"\{\{([^{}|]*)(?:\|([^{}]*))?\}\}");
    replace_until_stable(re, text, |caps: &Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(1))
            .map_or_else(String::new, |m| m.as_str().to_owned())
    })
}

/// Removes `<ref ...>...</ref>` blocks and self-closing `<ref .../>` tags.
#[must_use]
pub fn strip_refs(text: &str) -> String {
    remove_all(
        cached(&REF_RE, r"(?s)<ref[^>]*?/>|<ref[^>]*>.*?</ref>"),
        text,
    )
}

/// Removes named and numeric entity references such as `&amp;` or `&#160;`.
#[must_use]
pub fn strip_entities(text: &str) -> String {
    remove_all(cached(&ENTITY_RE, r"&#?[A-Za-z0-9]*;"), text)
}

/// Removes bracketed external links such as `[http://example.org label]`.
#[must_use]
pub fn strip_external_links(text: &str) -> String {
    remove_all(cached(&EXTERNAL_LINK_RE, r"\[http[^\]]*\]"), text)
}

/// Removes `=`, `'` and `"` characters.
#[must_use]
pub fn strip_quotes(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '=' | '\'' | '"'))
        .collect()
}

/// Trims leading and trailing whitespace.
#[must_use]
pub fn trim(text: &str) -> String {
    text.trim().to_owned()
}

/// Collapses runs of newlines into one.
#[must_use]
pub fn collapse_newlines(text: &str) -> String {
    cached(&NEWLINES_RE, r"\n{2,}")
        .replace_all(text, "\n")
        .into_owned()
}

/// Collapses runs of spaces and tabs into one space.
#[must_use]
pub fn collapse_spaces(text: &str) -> String {
    cached(&SPACES_RE, r"[ \t]{2,}|\t")
        .replace_all(text, " ")
        .into_owned()
}
