//! Classification of free-text component markings.
//!
//! A marking such as `4.7k`, `100n` or `10A` is read with a small grammar:
//!
//! ```text
//! marking   = numeral [magnitude] [unit]
//! numeral   = digits [ "." digits ]
//! magnitude = "u" | "k" | "n" | "m" | "g" | "r" | "p"
//! unit      = "f" | "o" | "a"
//! ```
//!
//! Letters are compared case-insensitively. Anything that does not fit the
//! grammar is an [`ComponentKind::Other`] marking that keeps its original text.
//!
//! Capacitor values are re-based by 1e9 after magnitude scaling, which is the
//! convention station notes use for capacitors.

use serde::{Deserialize, Serialize};

use crate::core::types::ComponentKind;

/// SI prefix letter of a numeric marking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magnitude {
    Mega,
    Kilo,
    Base,
    Giga,
    Micro,
    Nano,
    Pico,
}

impl Magnitude {
    fn from_letter(c: char) -> Option<Self> {
        match c {
            'm' => Some(Self::Mega),
            'k' => Some(Self::Kilo),
            'r' => Some(Self::Base),
            'g' => Some(Self::Giga),
            'u' => Some(Self::Micro),
            'n' => Some(Self::Nano),
            'p' => Some(Self::Pico),
            _ => None,
        }
    }

    /// Default unit when the marking carries none
    fn default_unit(self) -> Unit {
        match self {
            Self::Micro | Self::Nano | Self::Pico => Unit::Farad,
            _ => Unit::Ohm,
        }
    }

    fn apply(self, value: f64) -> f64 {
        // `g` is accepted by the grammar but carries no multiplier
        match self {
            Self::Mega => value * 1_000_000.0,
            Self::Kilo => value * 1_000.0,
            Self::Base | Self::Giga => value,
            Self::Micro => value / 1_000.0,
            Self::Nano => value / 1_000_000.0,
            Self::Pico => value / 1_000_000_000.0,
        }
    }
}

/// Unit letter of a numeric marking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Farad,
    Ohm,
    Amp,
}

impl Unit {
    fn from_letter(c: char) -> Option<Self> {
        match c {
            'f' => Some(Self::Farad),
            'o' => Some(Self::Ohm),
            'a' => Some(Self::Amp),
            _ => None,
        }
    }

    fn kind(self) -> ComponentKind {
        match self {
            Self::Ohm => ComponentKind::Resistor,
            Self::Amp => ComponentKind::Fuse,
            Self::Farad => ComponentKind::Capacitor,
        }
    }
}

/// Tokens of a marking that matched the numeric grammar
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMarking {
    pub literal: f64,
    pub magnitude: Option<Magnitude>,
    pub unit: Option<Unit>,
}

/// Tokenize a marking against the numeric grammar.
///
/// Returns `None` when the marking is not exactly `numeral [magnitude] [unit]`.
#[must_use]
pub fn parse_numeric(marking: &str) -> Option<NumericMarking> {
    let lower = marking.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut pos = 0;

    let int_len = count_digits(&bytes[pos..]);
    if int_len == 0 {
        return None;
    }
    pos += int_len;

    if bytes.get(pos) == Some(&b'.') {
        let frac_len = count_digits(&bytes[pos + 1..]);
        if frac_len == 0 {
            return None;
        }
        pos += 1 + frac_len;
    }

    let literal: f64 = lower[..pos].parse().ok()?;
    let mut rest = lower[pos..].chars();

    let mut next = rest.next();
    let magnitude = next.and_then(Magnitude::from_letter);
    if magnitude.is_some() {
        next = rest.next();
    }

    let unit = match next {
        Some(c) => Some(Unit::from_letter(c)?),
        None => None,
    };

    if rest.next().is_some() {
        return None;
    }

    Some(NumericMarking {
        literal,
        magnitude,
        unit,
    })
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Normalized semantic record derived from a marking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMarking {
    pub kind: ComponentKind,

    /// Normalized value; present for resistors, capacitors and fuses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,

    /// Original text; present only for `other` markings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_name: Option<String>,
}

impl ClassifiedMarking {
    fn other(raw_name: Option<String>) -> Self {
        Self {
            kind: ComponentKind::Other,
            numeric_value: None,
            raw_name,
        }
    }

    fn numeric(kind: ComponentKind, value: f64) -> Self {
        Self {
            kind,
            numeric_value: Some(value),
            raw_name: None,
        }
    }
}

/// Classify a marking into a kind and a normalized value or name
#[must_use]
pub fn classify(marking: &str) -> ClassifiedMarking {
    if marking.is_empty() {
        return ClassifiedMarking::other(None);
    }

    let Some(numeric) = parse_numeric(marking) else {
        return ClassifiedMarking::other(Some(marking.to_string()));
    };

    let magnitude = numeric.magnitude.unwrap_or(Magnitude::Base);
    let unit = numeric.unit.unwrap_or_else(|| magnitude.default_unit());
    let kind = unit.kind();

    let mut value = magnitude.apply(numeric.literal);
    if kind == ComponentKind::Capacitor {
        value *= 1_000_000_000.0;
    }

    ClassifiedMarking::numeric(kind, value)
}

/// Classify an optional marking; a missing marking is an unnamed `other`
#[must_use]
pub fn classify_opt(marking: Option<&str>) -> ClassifiedMarking {
    marking.map_or_else(|| ClassifiedMarking::other(None), classify)
}
