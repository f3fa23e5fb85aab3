//! Blog post domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_not_blank, validate_slug};
use uuid::Uuid;
use validator::Validate;

/// A blog post. Content is markdown rendered by the website.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post summary for list views (no content body).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BlogPostSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostSummary {
    fn from(post: BlogPost) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            cover_image_url: post.cover_image_url,
            tags: post.tags,
            published: post.published,
            published_at: post.published_at,
            updated_at: post.updated_at,
        }
    }
}

/// Builds a URL slug from a title.
///
/// Lowercases ASCII letters, keeps digits, folds common German and French
/// accented letters and collapses everything else into single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let folded: &str = match c {
            'a'..='z' | '0'..='9' => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
                continue;
            }
            'ä' => "ae",
            'ö' => "oe",
            'ü' => "ue",
            'ß' => "ss",
            'à' | 'á' | 'â' => "a",
            'é' | 'è' | 'ê' | 'ë' => "e",
            'î' | 'ï' => "i",
            'ô' => "o",
            'ù' | 'û' => "u",
            'ç' => "c",
            _ => {
                pending_dash = true;
                continue;
            }
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push_str(folded);
    }

    slug.truncate(200);
    slug.trim_end_matches('-').to_string()
}

/// Resolves `published_at` for a save: the first publish stamps `now`, later
/// saves keep the original date, unpublishing keeps it for history.
pub fn resolve_published_at(
    published: bool,
    existing: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (published, existing) {
        (true, None) => Some(now),
        (_, existing) => existing,
    }
}

/// Request payload for creating a blog post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBlogPostRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,

    /// Derived from the title when omitted.
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 500, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[validate(url(message = "Invalid cover image URL"))]
    pub cover_image_url: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Vec<String>,

    #[serde(default)]
    pub published: bool,
}

/// Partial update of a blog post. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBlogPostRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 500, message = "Excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,

    #[validate(url(message = "Invalid cover image URL"))]
    pub cover_image_url: Option<String>,

    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Option<Vec<String>>,

    pub published: Option<bool>,
}

/// Public blog list query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBlogPostsQuery {
    pub tag: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Normalizes tags: trimmed, lowercased, empty and duplicate entries dropped.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fake::faker::lorem::en::{Paragraph, Sentence};
    use fake::Fake;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Handling Pre-Game Nerves"), "handling-pre-game-nerves");
        assert_eq!(slugify("  5 Tips for Focus!  "), "5-tips-for-focus");
        assert_eq!(slugify("Mental   Toughness -- Part 2"), "mental-toughness-part-2");
    }

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Über Druck & Erfolg"), "ueber-druck-erfolg");
        assert_eq!(slugify("Confiance en soi: la clé"), "confiance-en-soi-la-cle");
    }

    #[test]
    fn test_slugify_output_is_valid_slug() {
        for _ in 0..20 {
            let title: String = Sentence(2..8).fake();
            let slug = slugify(&title);
            if !slug.is_empty() {
                assert!(validate_slug(&slug).is_ok(), "bad slug {:?} from {:?}", slug, title);
            }
        }
    }

    #[test]
    fn test_slugify_only_symbols() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_resolve_published_at() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);
        assert_eq!(resolve_published_at(true, None, now), Some(now));
        assert_eq!(resolve_published_at(true, Some(earlier), now), Some(earlier));
        assert_eq!(resolve_published_at(false, None, now), None);
        assert_eq!(resolve_published_at(false, Some(earlier), now), Some(earlier));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " Focus ".to_string(),
            "focus".to_string(),
            "".to_string(),
            "Anxiety".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["focus", "anxiety"]);
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateBlogPostRequest {
            title: "Visualization for sprinters".to_string(),
            slug: None,
            excerpt: None,
            content: Paragraph(2..4).fake(),
            cover_image_url: Some("https://cdn.example.com/cover.jpg".to_string()),
            tags: vec!["visualization".to_string()],
            published: true,
        };
        assert!(request.validate().is_ok());

        let mut bad = request.clone();
        bad.slug = Some("Not A Slug".to_string());
        assert!(bad.validate().is_err());

        let mut bad = request;
        bad.cover_image_url = Some("not a url".to_string());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_summary_drops_content() {
        let now = Utc::now();
        let post = BlogPost {
            id: Uuid::new_v4(),
            slug: "breathing".to_string(),
            title: "Breathing".to_string(),
            excerpt: None,
            content: "long body".to_string(),
            cover_image_url: None,
            tags: vec![],
            published: true,
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&BlogPostSummary::from(post)).unwrap();
        assert!(!json.contains("long body"));
        assert!(json.contains("\"slug\":\"breathing\""));
    }
}
