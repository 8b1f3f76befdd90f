//! Fuzzy matching of estimated material lines against the catalog.
//!
//! Scoring works on normalised names: lowercase, diacritics folded,
//! punctuation turned into spaces, French stop-words dropped.
//!
//! | Relation between names                         | Score                        |
//! |------------------------------------------------|------------------------------|
//! | identical after normalisation                  | 1.0                          |
//! | identical once separators are removed          | 0.95                         |
//! | every token of the shorter one in the longer   | 0.7 + 0.25 × short/long      |
//! | some tokens shared                             | 0.7 × Dice(tokens)           |
//! | no token shared                                | 0.0                          |
//!
//! Tokens of four characters or more also match when their character-bigram
//! Dice coefficient reaches [`TOKEN_MATCH_DICE`], which absorbs typos and
//! plurals ("carrelage"/"carelage", "plinthe"/"plinthes").

use chantier_core::{CatalogMaterial, Quantity, round_cents};
use tracing::debug;

/// Bigram Dice at or above which two tokens are considered the same word.
pub const TOKEN_MATCH_DICE: f64 = 0.8;

const STOP_WORDS: &[&str] = &[
    "a", "au", "aux", "avec", "d", "de", "des", "du", "en", "et", "l", "la", "le", "les", "pour",
    "sur",
];

/// One estimated material line, as seen by the matcher.
#[derive(Debug, Clone)]
pub struct MatchQuery<'a> {
    pub name: &'a str,
    pub quantity: Quantity,
    pub unit: &'a str,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Best catalog candidate for a [`MatchQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'c> {
    pub material: &'c CatalogMaterial,
    /// Similarity in `[0, 1]`.
    pub confidence: f64,
    /// Query quantity × catalog unit price, rounded to cents.
    pub computed_price: f64,
}

/// Find the catalog entry whose name is most similar to the query's.
///
/// Ties keep the first entry in catalog order. Returns `None` for an empty
/// catalog or when nothing shares a single token with the query. No
/// acceptance threshold is applied here.
pub fn find_best_match<'c>(
    query: &MatchQuery<'_>,
    catalog: &'c [CatalogMaterial],
) -> Option<MatchResult<'c>> {
    let mut best: Option<(&CatalogMaterial, f64)> = None;
    for material in catalog {
        let score = similarity(query.name, &material.name);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((material, score));
        }
    }

    let (material, confidence) = best.filter(|(_, score)| *score > 0.0)?;
    let computed_price = round_cents(query.quantity.numeric() * material.unit_price);
    debug!(
        query = query.name,
        unit = query.unit,
        estimated_total = query.total_price,
        candidate = %material.name,
        confidence,
        computed_price,
        "best catalog candidate"
    );
    Some(MatchResult {
        material,
        confidence,
        computed_price,
    })
}

/// Symmetric similarity of two material names, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (na, nb) = (normalize(a), normalize(b));
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }
    if compact(&na) == compact(&nb) {
        return 0.95;
    }

    let (ta, tb) = (tokens(&na), tokens(&nb));
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let (short, long) = if ta.len() <= tb.len() { (&ta, &tb) } else { (&tb, &ta) };
    let shared = covered(short, long).min(covered(long, short));

    if shared == 0 {
        0.0
    } else if shared == short.len() {
        0.7 + 0.25 * short.len() as f64 / long.len() as f64
    } else {
        0.7 * (2 * shared) as f64 / (ta.len() + tb.len()) as f64
    }
}

fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => out.push('a'),
            'ç' => out.push('c'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' | 'í' | 'ì' => out.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => out.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'ÿ' => out.push('y'),
            'ñ' => out.push('n'),
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            c if c.is_alphanumeric() => out.push(c),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compact(normalized: &str) -> String {
    normalized.chars().filter(|c| !c.is_whitespace()).collect()
}

fn tokens(normalized: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for token in normalized.split(' ') {
        if !STOP_WORDS.contains(&token) && !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

/// How many tokens of `from` have a counterpart in `within`.
fn covered(from: &[&str], within: &[&str]) -> usize {
    from.iter()
        .filter(|t| within.iter().any(|u| tokens_match(t, u)))
        .count()
}

fn tokens_match(a: &str, b: &str) -> bool {
    a == b || (a.chars().count() >= 4 && b.chars().count() >= 4 && bigram_dice(a, b) >= TOKEN_MATCH_DICE)
}

fn bigram_dice(a: &str, b: &str) -> f64 {
    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let (ba, mut bb) = (bigrams(a), bigrams(b));
    let total = ba.len() + bb.len();
    if total == 0 {
        return 0.0;
    }
    let mut common = 0;
    for pair in &ba {
        if let Some(pos) = bb.iter().position(|p| p == pair) {
            bb.swap_remove(pos);
            common += 1;
        }
    }
    (2 * common) as f64 / total as f64
}
