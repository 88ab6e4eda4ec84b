// Copyright 2025 the Class Component Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deliberately small selector engine.
//!
//! ## Supported syntax
//!
//! - Type selectors (`div`) and the universal selector (`*`).
//! - Id selectors (`#main`) and class selectors (`.item`), compounded freely: `li.item.active`.
//! - Negation of a compound selector: `.widget:not(.widget-initialized)`.
//! - Descendant (`ul li`) and child (`ul > li`) combinators.
//! - Selector lists: `.a, .b`.
//!
//! Sibling combinators and attribute selectors are not supported; [`Selector::parse`]
//! rejects them. A selector that fails to parse matches nothing.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::types::ElementId;

/// The parts of an element a selector can look at.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Subject<'a> {
    pub(crate) tag: &'a str,
    pub(crate) id: Option<&'a str>,
    pub(crate) classes: &'a [String],
}

/// A parsed selector list.
///
/// Parse once with [`Selector::parse`] and match many times with
/// [`Document::matches_selector`](crate::Document::matches_selector).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

/// Compounds joined by combinators. `combinators[i]` sits between `compounds[i]` and
/// `compounds[i + 1]`; the last compound is the one tested against the subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    negated: Vec<Compound>,
}

impl Selector {
    /// Parse a selector list. Returns `None` for unsupported or malformed input.
    pub fn parse(input: &str) -> Option<Self> {
        let mut alternatives = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            alternatives.push(Complex::parse(part)?);
        }
        Some(Self { alternatives })
    }

    /// Returns true if `id` matches. `node` yields an element's subject and parent.
    pub(crate) fn matches_in<'a, F>(&self, id: ElementId, node: &F) -> bool
    where
        F: Fn(ElementId) -> Option<(Subject<'a>, Option<ElementId>)>,
    {
        self.alternatives
            .iter()
            .any(|c| match_at(&c.compounds, &c.combinators, id, node))
    }
}

impl Complex {
    fn parse(mut input: &str) -> Option<Self> {
        let mut out = Self::default();
        loop {
            let (compound, rest) = Compound::parse(input)?;
            out.compounds.push(compound);
            let trimmed = rest.trim_start();
            if trimmed.is_empty() {
                return Some(out);
            }
            let combinator = if let Some(after) = trimmed.strip_prefix('>') {
                input = after.trim_start();
                Combinator::Child
            } else if trimmed.len() < rest.len() {
                input = trimmed;
                Combinator::Descendant
            } else {
                return None;
            };
            out.combinators.push(combinator);
        }
    }
}

/// Match right to left: the last compound against `id`, the rest against its ancestors.
fn match_at<'a, F>(
    compounds: &[Compound],
    combinators: &[Combinator],
    id: ElementId,
    node: &F,
) -> bool
where
    F: Fn(ElementId) -> Option<(Subject<'a>, Option<ElementId>)>,
{
    let Some((last, compounds)) = compounds.split_last() else {
        return true;
    };
    let Some((subject, parent)) = node(id) else {
        return false;
    };
    if !last.matches(subject) {
        return false;
    }
    let Some((combinator, combinators)) = combinators.split_last() else {
        return true;
    };
    match combinator {
        Combinator::Child => parent.is_some_and(|p| match_at(compounds, combinators, p, node)),
        Combinator::Descendant => {
            let mut ancestor = parent;
            while let Some(a) = ancestor {
                if match_at(compounds, combinators, a, node) {
                    return true;
                }
                ancestor = node(a).and_then(|(_, p)| p);
            }
            false
        }
    }
}

impl Compound {
    /// Parse one compound selector, returning the unparsed remainder.
    fn parse(mut input: &str) -> Option<(Self, &str)> {
        let mut out = Self::default();
        let mut any = false;
        if let Some(rest) = input.strip_prefix('*') {
            input = rest;
            any = true;
        } else {
            let (ident, rest) = ident(input);
            if !ident.is_empty() {
                out.tag = Some(ident.to_ascii_lowercase());
                input = rest;
                any = true;
            }
        }
        loop {
            if let Some(rest) = input.strip_prefix('.') {
                let (name, rest) = ident(rest);
                if name.is_empty() {
                    return None;
                }
                out.classes.push(name.to_string());
                input = rest;
            } else if let Some(rest) = input.strip_prefix('#') {
                let (name, rest) = ident(rest);
                if name.is_empty() || out.id.is_some() {
                    return None;
                }
                out.id = Some(name.to_string());
                input = rest;
            } else if let Some(rest) = input.strip_prefix(":not(") {
                let (inner, rest) = Self::parse(rest.trim_start())?;
                let rest = rest.trim_start().strip_prefix(')')?;
                out.negated.push(inner);
                input = rest;
            } else {
                break;
            }
            any = true;
        }
        any.then_some((out, input))
    }

    fn matches(&self, subject: Subject<'_>) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(subject.tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && subject.id != Some(id.as_str())
        {
            return false;
        }
        self.classes
            .iter()
            .all(|c| subject.classes.iter().any(|have| have == c))
            && !self.negated.iter().any(|n| n.matches(subject))
    }
}

fn ident(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(input.len());
    input.split_at(end)
}
