//! Format configuration records: plain data describing how a variable's
//! textual form is laid out. Each carries a `merge` that takes any
//! non-default setting from `other`, per `SPEC_FULL.md` §6.2.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single whitespace character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Whitespace {
    /// `' '`
    #[default]
    Space,
    /// `'\t'`
    Tab,
    /// `'\n'`
    Newline,
}

impl Whitespace {
    /// The literal character this variant denotes.
    pub fn as_char(self) -> char {
        match self {
            Whitespace::Space => ' ',
            Whitespace::Tab => '\t',
            Whitespace::Newline => '\n',
        }
    }
}

/// How strictly the reader enforces the declared separator between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WhitespaceStrictness {
    /// The exact declared separator must appear, character for character.
    #[default]
    Precise,
    /// Any single whitespace character is accepted between tokens.
    Flexible,
}

/// How strictly the reader enforces canonical integer spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NumericStrictness {
    /// Leading `+`, `-0`, and unnecessary leading zeros are rejected.
    #[default]
    Precise,
    /// Any parsable signed 64-bit spelling is accepted.
    Flexible,
}

/// Format settings for `Array<E>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MArrayFormat {
    /// Separator between elements.
    pub separator: Whitespace,
}

impl MArrayFormat {
    /// Takes `other`'s separator if `self`'s is the default.
    pub fn merge(self, other: MArrayFormat) -> MArrayFormat {
        MArrayFormat {
            separator: if self.separator == Whitespace::default() {
                other.separator
            } else {
                self.separator
            },
        }
    }
}

/// The separator between tuple components (the `IOSeparator` constraint's
/// payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MTupleFormat {
    /// Separator between components.
    pub separator: Whitespace,
}

impl MTupleFormat {
    /// Takes `other`'s separator if `self`'s is the default.
    pub fn merge(self, other: MTupleFormat) -> MTupleFormat {
        MTupleFormat {
            separator: if self.separator == Whitespace::default() {
                other.separator
            } else {
                self.separator
            },
        }
    }
}

/// How a graph's edges are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GraphStyle {
    /// One `u v [label]` line per edge.
    #[default]
    EdgeList,
    /// An `n`-by-`n` adjacency matrix.
    AdjacencyMatrix,
}

/// Whether node indices in the textual form start at 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeIndexBase {
    /// Nodes are numbered from 0.
    #[default]
    ZeroBased,
    /// Nodes are numbered from 1.
    OneBased,
}

/// Format settings for `Graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MGraphFormat {
    /// Edge-list vs. adjacency-matrix layout.
    pub style: GraphStyle,
    /// 0-based or 1-based node numbering on the wire.
    pub index_base: NodeIndexBase,
}

impl MGraphFormat {
    /// Takes `other`'s settings for any field `self` leaves at default.
    pub fn merge(self, other: MGraphFormat) -> MGraphFormat {
        MGraphFormat {
            style: if self.style == GraphStyle::default() {
                other.style
            } else {
                self.style
            },
            index_base: if self.index_base == NodeIndexBase::default() {
                other.index_base
            } else {
                self.index_base
            },
        }
    }
}

/// Format settings for `Variant<...>`: one discriminator token per
/// alternative, plus the separator between discriminator and payload.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MVariantFormat {
    /// One token per alternative, in declaration order.
    pub discriminators: Vec<String>,
    /// Separator between the discriminator token and the payload.
    pub separator: Whitespace,
}

impl MVariantFormat {
    /// Takes `other`'s discriminators/separator wherever `self` leaves them
    /// at default (empty list, default separator).
    pub fn merge(self, other: MVariantFormat) -> MVariantFormat {
        MVariantFormat {
            discriminators: if self.discriminators.is_empty() {
                other.discriminators
            } else {
                self.discriminators
            },
            separator: if self.separator == Whitespace::default() {
                other.separator
            } else {
                self.separator
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_format_merge_prefers_non_default_self() {
        let a = MArrayFormat {
            separator: Whitespace::Tab,
        };
        let b = MArrayFormat::default();
        assert_eq!(a.merge(b).separator, Whitespace::Tab);
        assert_eq!(b.merge(a).separator, Whitespace::Tab);
    }

    #[test]
    fn variant_format_merge_prefers_non_empty_discriminators() {
        let a = MVariantFormat::default();
        let b = MVariantFormat {
            discriminators: vec!["A".to_string(), "B".to_string()],
            separator: Whitespace::default(),
        };
        assert_eq!(a.merge(b.clone()).discriminators, b.discriminators);
    }
}
