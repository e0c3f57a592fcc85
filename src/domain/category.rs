//! Top-level node categories of an alerting configuration.

use std::fmt;
use std::str::FromStr;

/// Category of a top-level node, i.e. its tag.
///
/// The set is closed. The declaration order is the order in which the first
/// node of each category must appear below the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Adapter,
    Definition,
    EntryPoint,
    Operation,
    Action,
    GroupedBox,
    ComponentTemplate,
}

impl Category {
    pub const COUNT: usize = 7;

    /// Fixed category order of the document root's children.
    pub const ORDER: [Category; Category::COUNT] = [
        Category::Adapter,
        Category::Definition,
        Category::EntryPoint,
        Category::Operation,
        Category::Action,
        Category::GroupedBox,
        Category::ComponentTemplate,
    ];

    /// Categories that can be the target of a reference element.
    pub const REFERENCED: [Category; 3] = [
        Category::EntryPoint,
        Category::Operation,
        Category::Action,
    ];

    /// Element tag used for nodes (and references) of this category.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Adapter => "adapter-list",
            Category::Definition => "definition-list",
            Category::EntryPoint => "entry-point-list",
            Category::Operation => "operation-list",
            Category::Action => "action-list",
            Category::GroupedBox => "grouped-box-list",
            Category::ComponentTemplate => "component-template-list",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|c| c.tag() == tag)
    }

    /// Position in [`Category::ORDER`].
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Whether a child element with this tag is a graph edge.
    pub fn is_referenced(self) -> bool {
        Self::REFERENCED.contains(&self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error parsing a category tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
