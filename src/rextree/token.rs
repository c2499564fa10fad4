//! Column data model for the regex-token tree
//!
//! Defines the row kinds, the group naming syntaxes, character spans and the
//! cell value type the token tree stores per column. Column meaning is fixed
//! by [`TokenColumn`]; the container itself stays generic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a tree row represents inside the regex structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// A run of literal text.
    Text,
    /// A named group whose name encodes a variable to extract.
    VarGroup,
    /// A plain or named capturing group without variable semantics.
    NonVarGroup,
    /// An atomic `(?>...)` group, not exposed as a numbered capture.
    NonCapturingGroup,
}

impl RowKind {
    /// Default row label used when a node ends up without an explicit name.
    pub fn label(self) -> &'static str {
        match self {
            RowKind::Text => "Text",
            RowKind::VarGroup => "VarGroup",
            RowKind::NonVarGroup => "Group",
            RowKind::NonCapturingGroup => "NonCapturingGroup",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which naming convention produced a group's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupSyntax {
    /// `(?<name>...)`
    Angle,
    /// `(?'name'...)`
    Quote,
    /// `(?P<name>...)`
    PythonStyle,
}

impl GroupSyntax {
    /// The characters emitted between `(` and the name.
    pub fn opening(self) -> &'static str {
        match self {
            GroupSyntax::Angle => "?<",
            GroupSyntax::Quote => "?'",
            GroupSyntax::PythonStyle => "?P<",
        }
    }

    /// The delimiter that terminates the name.
    pub fn closing(self) -> char {
        match self {
            GroupSyntax::Angle | GroupSyntax::PythonStyle => '>',
            GroupSyntax::Quote => '\'',
        }
    }
}

/// Half-open `[from, to)` character range into the source regex string.
/// Group spans include their `(` / `)` delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Whether `other` lies fully inside this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.from <= other.from && other.to <= self.to
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.from, self.to)
    }
}

/// An RGB display color parsed out of group-name metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Columns of the token tree, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenColumn {
    Value,
    Index,
    ItemType,
    Color,
    Range,
    RowType,
    IsFiltered,
    GroupName,
    GroupSyntax,
}

pub const TOKEN_COLUMN_COUNT: usize = 9;

impl TokenColumn {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            TokenColumn::Value => "Value",
            TokenColumn::Index => "Index",
            TokenColumn::ItemType => "Item type",
            TokenColumn::Color => "Color",
            TokenColumn::Range => "Range",
            TokenColumn::RowType => "Row type",
            TokenColumn::IsFiltered => "Is filtered",
            TokenColumn::GroupName => "Group name",
            TokenColumn::GroupSyntax => "Group syntax type",
        }
    }

    pub fn all() -> [TokenColumn; TOKEN_COLUMN_COUNT] {
        [
            TokenColumn::Value,
            TokenColumn::Index,
            TokenColumn::ItemType,
            TokenColumn::Color,
            TokenColumn::Range,
            TokenColumn::RowType,
            TokenColumn::IsFiltered,
            TokenColumn::GroupName,
            TokenColumn::GroupSyntax,
        ]
    }
}

/// A single typed cell of the token tree.
///
/// Accessors are sentinel-style: asking a cell for a type it does not hold
/// yields an empty/default value rather than panicking, mirroring the
/// container's no-throw failure semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Color(Option<Rgb>),
    Span(Span),
    Row(RowKind),
    Syntax(Option<GroupSyntax>),
}

impl TokenValue {
    pub fn str(&self) -> &str {
        match self {
            TokenValue::Str(s) => s,
            _ => "",
        }
    }

    pub fn int(&self) -> i64 {
        match self {
            TokenValue::Int(i) => *i,
            _ => 0,
        }
    }

    pub fn boolean(&self) -> bool {
        match self {
            TokenValue::Bool(b) => *b,
            _ => false,
        }
    }

    pub fn color(&self) -> Option<Rgb> {
        match self {
            TokenValue::Color(c) => *c,
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TokenValue::Span(s) => *s,
            _ => Span::default(),
        }
    }

    pub fn row_kind(&self) -> RowKind {
        match self {
            TokenValue::Row(r) => *r,
            _ => RowKind::Text,
        }
    }

    pub fn syntax(&self) -> Option<GroupSyntax> {
        match self {
            TokenValue::Syntax(s) => *s,
            _ => None,
        }
    }
}
