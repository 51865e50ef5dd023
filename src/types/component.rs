//! Userpage components
//!
//! A component is one tagged unit of page content. On the wire it is an
//! object with exactly one key naming the variant:
//!
//! ```json
//! {"header": {"content": "Hi", "size": 2}}
//! {"paragraph": {"content": "Some text"}}
//! {"post": {"post_id": "abcDEF0123456789", "size": 3}}
//! {"divider": {"style": "regular"}}
//! ```
//!
//! Objects with zero or several keys, and out-of-range sizes, fail to decode.

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::types::error::{Error, Result};
use crate::types::ids::PostId;

/// Tagged page component; exactly one variant is populated per instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Heading text
    Header(HeaderComponent),
    /// Body text
    Paragraph(ParagraphComponent),
    /// Reference to a stored post
    Post(PostComponent),
    /// Horizontal separator
    Divider(DividerComponent),
}

/// Variant tag of a [`Component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// [`Component::Header`]
    Header,
    /// [`Component::Paragraph`]
    Paragraph,
    /// [`Component::Post`]
    Post,
    /// [`Component::Divider`]
    Divider,
}

/// Heading content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderComponent {
    /// Heading text
    pub content: String,
    /// Heading size, 1 (large) to 4 (very small)
    pub size: HeaderSize,
}

/// Paragraph content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphComponent {
    /// Paragraph text
    pub content: String,
}

/// Post reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComponent {
    /// Referenced post, not embedded
    pub post_id: PostId,
    /// Card size
    pub size: PostSize,
}

/// Divider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividerComponent {
    /// Divider style
    pub style: DividerStyle,
}

/// Header size in `1..=4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeaderSize(u8);

impl HeaderSize {
    /// Largest heading
    pub const LARGE: HeaderSize = HeaderSize(1);
    /// Medium heading
    pub const MEDIUM: HeaderSize = HeaderSize(2);
    /// Small heading
    pub const SMALL: HeaderSize = HeaderSize(3);
    /// Smallest heading
    pub const VERY_SMALL: HeaderSize = HeaderSize(4);

    /// Numeric level, 1..=4
    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeaderSize {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1..=4 => Ok(HeaderSize(value)),
            _ => Err(Error::invalid_input(format!(
                "header size must be between 1 and 4, got {}",
                value
            ))),
        }
    }
}

impl From<HeaderSize> for u8 {
    fn from(size: HeaderSize) -> u8 {
        size.0
    }
}

/// Post card size. Size 1 (large) is reserved and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PostSize {
    /// Thumbnail, title and description
    Medium,
    /// Title only
    Small,
}

impl TryFrom<u8> for PostSize {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            2 => Ok(PostSize::Medium),
            3 => Ok(PostSize::Small),
            1 => Err(Error::invalid_input("post size 1 is reserved")),
            _ => Err(Error::invalid_input(format!(
                "post size must be 2 or 3, got {}",
                value
            ))),
        }
    }
}

impl From<PostSize> for u8 {
    fn from(size: PostSize) -> u8 {
        match size {
            PostSize::Medium => 2,
            PostSize::Small => 3,
        }
    }
}

/// Divider style; only `regular` exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerStyle {
    /// Plain rule
    #[default]
    Regular,
}

impl Component {
    /// Build a header component
    pub fn header(content: impl Into<String>, size: HeaderSize) -> Self {
        Component::Header(HeaderComponent { content: content.into(), size })
    }

    /// Build a paragraph component
    pub fn paragraph(content: impl Into<String>) -> Self {
        Component::Paragraph(ParagraphComponent { content: content.into() })
    }

    /// Build a post component
    pub fn post(post_id: PostId, size: PostSize) -> Self {
        Component::Post(PostComponent { post_id, size })
    }

    /// Build a regular divider
    pub fn divider() -> Self {
        Component::Divider(DividerComponent { style: DividerStyle::Regular })
    }

    /// Default component inserted from the "+" menu.
    ///
    /// Post components reference a stored post and can only be created through
    /// post ingestion, so `ComponentKind::Post` has no default.
    pub fn default_for(kind: ComponentKind) -> Result<Self> {
        match kind {
            ComponentKind::Header => Ok(Component::header("New Header", HeaderSize::MEDIUM)),
            ComponentKind::Paragraph => Ok(Component::paragraph("")),
            ComponentKind::Divider => Ok(Component::divider()),
            ComponentKind::Post => Err(Error::invalid_input(
                "post components are added by accepting an ingested post",
            )),
        }
    }

    /// Variant tag
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Header(_) => ComponentKind::Header,
            Component::Paragraph(_) => ComponentKind::Paragraph,
            Component::Post(_) => ComponentKind::Post,
            Component::Divider(_) => ComponentKind::Divider,
        }
    }

    /// Editable text of headers and paragraphs
    pub fn text(&self) -> Option<&str> {
        match self {
            Component::Header(h) => Some(&h.content),
            Component::Paragraph(p) => Some(&p.content),
            _ => None,
        }
    }

    /// Copy of this component with its text replaced
    pub fn with_text(&self, content: impl Into<String>) -> Result<Self> {
        match self {
            Component::Header(h) => Ok(Component::header(content, h.size)),
            Component::Paragraph(_) => Ok(Component::paragraph(content)),
            other => Err(Error::invalid_input(format!(
                "{} components have no editable text",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::Header => "header",
            ComponentKind::Paragraph => "paragraph",
            ComponentKind::Post => "post",
            ComponentKind::Divider => "divider",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_form_has_single_variant_key() {
        let json = serde_json::to_value(Component::header("Hi", HeaderSize::MEDIUM)).unwrap();
        assert_eq!(json, serde_json::json!({"header": {"content": "Hi", "size": 2}}));

        let json = serde_json::to_value(Component::divider()).unwrap();
        assert_eq!(json, serde_json::json!({"divider": {"style": "regular"}}));
    }

    #[test]
    fn test_decodes_post_component() {
        let component: Component = serde_json::from_str(
            r#"{"post": {"post_id": "abcDEF0123456789", "size": 3}}"#,
        )
        .unwrap();
        let expected = PostId::from_str("abcDEF0123456789").unwrap();
        assert_eq!(component, Component::post(expected, PostSize::Small));
    }

    #[test]
    fn test_rejects_zero_or_multiple_tags() {
        assert!(serde_json::from_str::<Component>("{}").is_err());
        assert!(serde_json::from_str::<Component>(
            r#"{"paragraph": {"content": "a"}, "divider": {"style": "regular"}}"#
        )
        .is_err());
    }

    #[test]
    fn test_rejects_out_of_range_sizes() {
        assert!(serde_json::from_str::<Component>(r#"{"header": {"content": "x", "size": 5}}"#).is_err());
        assert!(serde_json::from_str::<Component>(
            r#"{"post": {"post_id": "abcDEF0123456789", "size": 1}}"#
        )
        .is_err());
    }

    #[test]
    fn test_menu_defaults() {
        assert_eq!(
            Component::default_for(ComponentKind::Header).unwrap(),
            Component::header("New Header", HeaderSize::MEDIUM)
        );
        assert!(matches!(
            Component::default_for(ComponentKind::Post),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_with_text_keeps_header_size() {
        let header = Component::header("Old", HeaderSize::SMALL);
        assert_eq!(header.with_text("New").unwrap(), Component::header("New", HeaderSize::SMALL));
        assert!(Component::divider().with_text("x").is_err());
    }
}
