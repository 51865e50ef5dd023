//! Component renderer
//!
//! Turns page components into a small view tree. Nodes remember the index
//! they were rendered from so text captured from an editable node maps back
//! to an [`Gesture::EditText`] on the right component.

use std::collections::HashMap;
use std::fmt::Write;

use crate::client::edit_controller::Gesture;
use crate::types::{Component, Post, PostId, PostSize, Userpage};

/// Placeholder for an empty header in edit mode
pub const HEADER_PLACEHOLDER: &str = "Click to edit header...";
/// Placeholder for an empty paragraph in edit mode
pub const PARAGRAPH_PLACEHOLDER: &str = "Click to edit paragraph...";

/// Viewer or owner-editing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Read-only
    View,
    /// Text is editable and empty text shows a placeholder
    Edit,
}

/// Rendered post card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostCard {
    /// Thumbnail, title, description and byline
    Medium {
        /// Link target
        url: String,
        /// Card title
        title: String,
        /// Card body
        description: String,
        /// Image, may be empty
        thumbnail_url: String,
        /// Site and author joined
        byline: String,
    },
    /// Title only
    Small {
        /// Link target
        url: String,
        /// Card title
        title: String,
    },
}

/// One rendered component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    /// Header
    Heading {
        /// Source index
        index: usize,
        /// 1..=4
        level: u8,
        /// Header text
        text: String,
        /// Whether text can be captured
        editable: bool,
        /// Shown in place of empty text
        placeholder: Option<&'static str>,
    },
    /// Paragraph
    Text {
        /// Source index
        index: usize,
        /// Paragraph text
        text: String,
        /// Whether text can be captured
        editable: bool,
        /// Shown in place of empty text
        placeholder: Option<&'static str>,
    },
    /// Post card
    Card {
        /// Source index
        index: usize,
        /// Card contents
        card: PostCard,
    },
    /// Post component whose post is unknown
    MissingPost {
        /// Source index
        index: usize,
        /// Referenced id
        post_id: PostId,
    },
    /// Divider
    Rule {
        /// Source index
        index: usize,
    },
}

/// Index posts by id for rendering
pub fn index_posts(posts: &[Post]) -> HashMap<PostId, Post> {
    posts
        .iter()
        .filter_map(|post| post.id.map(|id| (id, post.clone())))
        .collect()
}

/// Render the component at `index`
pub fn render(
    index: usize,
    component: &Component,
    posts: &HashMap<PostId, Post>,
    mode: RenderMode,
) -> RenderNode {
    let editable = mode == RenderMode::Edit;
    let placeholder = |text: &str, hint: &'static str| (editable && text.is_empty()).then_some(hint);

    match component {
        Component::Header(header) => RenderNode::Heading {
            index,
            level: header.size.level(),
            text: header.content.clone(),
            editable,
            placeholder: placeholder(&header.content, HEADER_PLACEHOLDER),
        },
        Component::Paragraph(paragraph) => RenderNode::Text {
            index,
            text: paragraph.content.clone(),
            editable,
            placeholder: placeholder(&paragraph.content, PARAGRAPH_PLACEHOLDER),
        },
        Component::Post(reference) => match posts.get(&reference.post_id) {
            Some(post) => RenderNode::Card { index, card: card_for(post, reference.size) },
            None => RenderNode::MissingPost { index, post_id: reference.post_id },
        },
        Component::Divider(_) => RenderNode::Rule { index },
    }
}

fn card_for(post: &Post, size: PostSize) -> PostCard {
    match size {
        PostSize::Medium => {
            let byline = [post.site_name.as_str(), post.author.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" · ");
            PostCard::Medium {
                url: post.url.clone(),
                title: post.title.clone(),
                description: post.description.clone(),
                thumbnail_url: post.thumbnail_url.clone(),
                byline,
            }
        }
        PostSize::Small => PostCard::Small {
            url: post.url.clone(),
            title: post.title.clone(),
        },
    }
}

/// Render every component of `page` in order
pub fn render_page(page: &Userpage, posts: &HashMap<PostId, Post>, mode: RenderMode) -> Vec<RenderNode> {
    page.components
        .iter()
        .enumerate()
        .map(|(index, component)| render(index, component, posts, mode))
        .collect()
}

/// Concatenated HTML of `nodes`
pub fn page_html(nodes: &[RenderNode]) -> String {
    nodes.iter().map(RenderNode::to_html).collect()
}

impl RenderNode {
    /// Source component index
    pub fn index(&self) -> usize {
        match self {
            RenderNode::Heading { index, .. }
            | RenderNode::Text { index, .. }
            | RenderNode::Card { index, .. }
            | RenderNode::MissingPost { index, .. }
            | RenderNode::Rule { index } => *index,
        }
    }

    /// Text shown to the user, placeholder included
    pub fn display_text(&self) -> Option<&str> {
        match self {
            RenderNode::Heading { text, placeholder, .. } | RenderNode::Text { text, placeholder, .. } => {
                Some(match placeholder {
                    Some(hint) => hint,
                    None => text.as_str(),
                })
            }
            _ => None,
        }
    }

    /// Edit gesture for text captured from this node.
    ///
    /// Capturing the untouched placeholder means the text is still empty.
    pub fn capture_text(&self, captured: &str) -> Option<Gesture> {
        match self {
            RenderNode::Heading { index, editable: true, placeholder, .. }
            | RenderNode::Text { index, editable: true, placeholder, .. } => {
                let content = if *placeholder == Some(captured) { "" } else { captured };
                Some(Gesture::EditText { index: *index, content: content.to_string() })
            }
            _ => None,
        }
    }

    /// Escaped HTML
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        match self {
            RenderNode::Heading { index, level, text, editable, placeholder } => {
                let _ = write!(html, "<h{} data-index=\"{}\"", level, index);
                push_editable(&mut html, *editable, *placeholder);
                let _ = write!(html, ">{}</h{}>", escape(text), level);
            }
            RenderNode::Text { index, text, editable, placeholder } => {
                let _ = write!(html, "<p data-index=\"{}\"", index);
                push_editable(&mut html, *editable, *placeholder);
                let _ = write!(html, ">{}</p>", escape(text));
            }
            RenderNode::Card { index, card } => {
                let _ = write!(html, "<article class=\"post-card\" data-index=\"{}\">", index);
                match card {
                    PostCard::Medium { url, title, description, thumbnail_url, byline } => {
                        if !thumbnail_url.is_empty() {
                            let _ = write!(html, "<img src=\"{}\" alt=\"\">", escape(thumbnail_url));
                        }
                        let _ = write!(html, "<a href=\"{}\">{}</a>", escape(url), escape(title));
                        let _ = write!(html, "<p>{}</p>", escape(description));
                        if !byline.is_empty() {
                            let _ = write!(html, "<small>{}</small>", escape(byline));
                        }
                    }
                    PostCard::Small { url, title } => {
                        let _ = write!(html, "<a href=\"{}\">{}</a>", escape(url), escape(title));
                    }
                }
                html.push_str("</article>");
            }
            RenderNode::MissingPost { index, post_id } => {
                let _ = write!(
                    html,
                    "<div class=\"post-missing\" data-index=\"{}\">Post not found (ID: {})</div>",
                    index,
                    escape(post_id.as_str())
                );
            }
            RenderNode::Rule { index } => {
                let _ = write!(html, "<hr data-index=\"{}\">", index);
            }
        }
        html
    }
}

fn push_editable(html: &mut String, editable: bool, placeholder: Option<&str>) {
    if editable {
        html.push_str(" contenteditable=\"true\"");
    }
    if let Some(placeholder) = placeholder {
        let _ = write!(html, " data-placeholder=\"{}\"", escape(placeholder));
    }
}

/// Escape text for HTML content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HeaderSize, UserId};

    fn stored_post(title: &str) -> Post {
        Post {
            id: Some(PostId::random()),
            title: title.into(),
            description: "desc".into(),
            site_name: "Example".into(),
            author: "Ada".into(),
            url: "https://example.com/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_placeholders_only_in_edit_mode() {
        let empty = Component::header("", HeaderSize::SMALL);
        let posts = HashMap::new();

        let node = render(0, &empty, &posts, RenderMode::Edit);
        assert_eq!(node.display_text(), Some(HEADER_PLACEHOLDER));
        assert!(node.to_html().starts_with("<h3 data-index=\"0\" contenteditable=\"true\""));

        let node = render(0, &empty, &posts, RenderMode::View);
        assert_eq!(node.display_text(), Some(""));

        let node = render(2, &Component::paragraph(""), &posts, RenderMode::Edit);
        assert_eq!(node.display_text(), Some(PARAGRAPH_PLACEHOLDER));
    }

    #[test]
    fn test_post_cards_by_size() {
        let post = stored_post("Title");
        let id = post.id.unwrap();
        let posts = index_posts(&[post]);

        match render(1, &Component::post(id, PostSize::Medium), &posts, RenderMode::View) {
            RenderNode::Card { index: 1, card: PostCard::Medium { byline, .. } } => {
                assert_eq!(byline, "Example · Ada")
            }
            other => panic!("unexpected node {:?}", other),
        }
        assert_eq!(
            render(1, &Component::post(id, PostSize::Small), &posts, RenderMode::View),
            RenderNode::Card {
                index: 1,
                card: PostCard::Small { url: "https://example.com/".into(), title: "Title".into() },
            }
        );
    }

    #[test]
    fn test_missing_post() {
        let id = PostId::random();
        let node = render(0, &Component::post(id, PostSize::Small), &HashMap::new(), RenderMode::View);
        assert_eq!(node, RenderNode::MissingPost { index: 0, post_id: id });
        assert!(node.to_html().contains(&format!("Post not found (ID: {})", id)));
    }

    #[test]
    fn test_html_is_escaped() {
        let posts = index_posts(&[]);
        let node = render(0, &Component::paragraph("<script>alert(\"x\")</script> & more"), &posts, RenderMode::View);
        assert_eq!(
            node.to_html(),
            "<p data-index=\"0\">&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn test_capture_maps_back_to_index() {
        let page = Userpage::new(
            UserId::random(),
            vec![Component::divider(), Component::paragraph(""), Component::header("Hi", HeaderSize::LARGE)],
        );
        let nodes = render_page(&page, &HashMap::new(), RenderMode::Edit);
        assert_eq!(nodes.iter().map(RenderNode::index).collect::<Vec<_>>(), vec![0, 1, 2]);

        assert_eq!(nodes[0].capture_text("x"), None);
        assert_eq!(
            nodes[1].capture_text(PARAGRAPH_PLACEHOLDER),
            Some(Gesture::EditText { index: 1, content: String::new() })
        );
        assert_eq!(
            nodes[2].capture_text("Hello"),
            Some(Gesture::EditText { index: 2, content: "Hello".into() })
        );

        let viewed = render_page(&page, &HashMap::new(), RenderMode::View);
        assert_eq!(viewed[2].capture_text("Hello"), None);
        assert!(page_html(&viewed).starts_with("<hr data-index=\"0\">"));
    }
}
