//! Admin blog management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::blog_post::{
    normalize_tags, resolve_published_at, slugify, BlogPostSummary, CreateBlogPostRequest,
    UpdateBlogPostRequest,
};
use domain::models::BlogPost;
use persistence::repositories::{BlogPostChanges, BlogPostRepository, NewBlogPost};
use shared::pagination::{PageParams, Paginated};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

fn not_found() -> ApiError {
    ApiError::NotFound("Post not found".to_string())
}

/// Resolves the slug to store: explicit slugs are normalized, otherwise the
/// title is used.
fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String, ApiError> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slugify(s),
        None => slugify(title),
    };
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "Slug must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

async fn ensure_slug_free(
    repo: &BlogPostRepository,
    slug: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if repo.slug_exists(slug, exclude_id).await? {
        return Err(ApiError::Conflict(format!("Slug '{}' is already in use", slug)));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// All posts including drafts.
///
/// GET /api/v1/admin/blog
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<BlogPostSummary>>, ApiError> {
    let repo = BlogPostRepository::new(state.pool.clone());
    let posts = repo
        .list_all(params.limit(), params.offset())
        .await?
        .into_iter()
        .map(|e| BlogPostSummary::from(BlogPost::from(e)))
        .collect();
    let total = repo.count_all().await?;
    Ok(Json(Paginated::new(posts, &params, total)))
}

/// POST /api/v1/admin/blog
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreateBlogPostRequest>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    request.validate()?;

    let repo = BlogPostRepository::new(state.pool.clone());
    let slug = resolve_slug(request.slug.as_deref(), &request.title)?;
    ensure_slug_free(&repo, &slug, None).await?;

    let tags = normalize_tags(&request.tags);
    let post: BlogPost = repo
        .create(&NewBlogPost {
            slug: &slug,
            title: request.title.trim(),
            excerpt: non_empty(&request.excerpt),
            content: &request.content,
            cover_image_url: non_empty(&request.cover_image_url),
            tags: &tags,
            published: request.published,
            published_at: resolve_published_at(request.published, None, Utc::now()),
        })
        .await?
        .into();

    info!(post_id = %post.id, slug = %post.slug, published = post.published, "Blog post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/admin/blog/:id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, ApiError> {
    let post = BlogPostRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(post.into()))
}

/// Partial update. The first publish stamps `published_at`.
///
/// PUT /api/v1/admin/blog/:id
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBlogPostRequest>,
) -> Result<Json<BlogPost>, ApiError> {
    request.validate()?;

    let repo = BlogPostRepository::new(state.pool.clone());
    let existing: BlogPost = repo.find_by_id(id).await?.ok_or_else(not_found)?.into();

    let slug = match request.slug.as_deref() {
        Some(s) => {
            let slug = resolve_slug(Some(s), &existing.title)?;
            if slug != existing.slug {
                ensure_slug_free(&repo, &slug, Some(id)).await?;
            }
            Some(slug)
        }
        None => None,
    };

    let tags = request.tags.as_deref().map(normalize_tags);
    let published = request.published.unwrap_or(existing.published);

    let changes = BlogPostChanges {
        slug: slug.as_deref(),
        title: request.title.as_deref().map(str::trim),
        excerpt: request.excerpt.as_deref().map(str::trim),
        content: request.content.as_deref(),
        cover_image_url: request.cover_image_url.as_deref().map(str::trim),
        tags: tags.as_deref(),
        published: request.published,
        published_at: resolve_published_at(published, existing.published_at, Utc::now()),
    };

    let post: BlogPost = repo.update(id, &changes).await?.ok_or_else(not_found)?.into();

    info!(post_id = %post.id, slug = %post.slug, published = post.published, "Blog post updated");
    Ok(Json(post))
}

/// DELETE /api/v1/admin/blog/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !BlogPostRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    info!(post_id = %id, "Blog post deleted");
    Ok(StatusCode::NO_CONTENT)
}
