//! Link-preview posts referenced by post components

use serde::{Deserialize, Serialize};

use crate::types::error::{Error, Result};
use crate::types::ids::PostId;

/// Link-preview record.
///
/// `id` is absent on a post that was scraped but not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stored post id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    /// Page title (immutable once scraped)
    #[serde(default)]
    pub title: String,
    /// Summary text
    #[serde(default)]
    pub description: String,
    /// Preview image
    #[serde(default)]
    pub thumbnail_url: String,
    /// Publishing site
    #[serde(default)]
    pub site_name: String,
    /// Canonical url (immutable once scraped)
    #[serde(default)]
    pub url: String,
    /// Content type, e.g. article or video
    #[serde(default, rename = "type")]
    pub post_type: String,
    /// Author name
    #[serde(default)]
    pub author: String,
}

/// Named post field, used when editing a pending post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostField {
    /// `title`
    Title,
    /// `description`
    Description,
    /// `thumbnail_url`
    ThumbnailUrl,
    /// `site_name`
    SiteName,
    /// `url`
    Url,
    /// `type`
    Type,
    /// `author`
    Author,
}

impl PostField {
    /// Title and url are fixed by the scrape; everything else can be edited
    pub fn is_editable(self) -> bool {
        !matches!(self, PostField::Title | PostField::Url)
    }
}

impl Post {
    /// Current value of `field`
    pub fn field(&self, field: PostField) -> &str {
        match field {
            PostField::Title => &self.title,
            PostField::Description => &self.description,
            PostField::ThumbnailUrl => &self.thumbnail_url,
            PostField::SiteName => &self.site_name,
            PostField::Url => &self.url,
            PostField::Type => &self.post_type,
            PostField::Author => &self.author,
        }
    }

    /// Edit a user-editable field
    pub fn set_field(&mut self, field: PostField, value: impl Into<String>) -> Result<()> {
        let slot = match field {
            PostField::Description => &mut self.description,
            PostField::ThumbnailUrl => &mut self.thumbnail_url,
            PostField::SiteName => &mut self.site_name,
            PostField::Type => &mut self.post_type,
            PostField::Author => &mut self.author,
            PostField::Title | PostField::Url => {
                return Err(Error::invalid_input(format!(
                    "{:?} cannot be changed after the link was scraped",
                    field
                )))
            }
        };
        *slot = value.into();
        Ok(())
    }

    /// Required fields for persisting
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::invalid_input("post title is required"));
        }
        if self.url.trim().is_empty() {
            return Err(Error::invalid_input("post url is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_title_and_url_are_locked() {
        let mut post = Post {
            title: "Rust".into(),
            url: "https://rust-lang.org".into(),
            ..Default::default()
        };
        post.set_field(PostField::Author, "Ferris").unwrap();
        post.set_field(PostField::Type, "article").unwrap();
        assert_eq!(post.field(PostField::Author), "Ferris");
        assert!(matches!(post.set_field(PostField::Title, "x"), Err(Error::InvalidInput(_))));
        assert!(matches!(post.set_field(PostField::Url, "x"), Err(Error::InvalidInput(_))));
        assert_eq!(post.title, "Rust");
    }

    #[test]
    fn test_type_field_wire_name() {
        let post: Post = serde_json::from_str(r#"{"title": "t", "url": "u", "type": "video"}"#).unwrap();
        assert_eq!(post.post_type, "video");
        assert!(post.id.is_none());
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["type"], "video");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_validate_requires_title() {
        let post = Post { url: "https://a.io".into(), ..Default::default() };
        assert!(post.validate().is_err());
    }
}
