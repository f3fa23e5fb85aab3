//! Public blog endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::blog_post::{BlogPostSummary, ListBlogPostsQuery};
use domain::models::BlogPost;
use persistence::repositories::BlogPostRepository;
use shared::pagination::{PageParams, Paginated};

use crate::app::AppState;
use crate::error::ApiError;

/// Published posts, newest first.
///
/// GET /api/v1/blog?tag=&page=&per_page=
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListBlogPostsQuery>,
) -> Result<Json<Paginated<BlogPostSummary>>, ApiError> {
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let tag = query
        .tag
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let repo = BlogPostRepository::new(state.pool.clone());
    let posts = repo
        .list_published(tag.as_deref(), params.limit(), params.offset())
        .await?;
    let total = repo.count_published(tag.as_deref()).await?;

    let data = posts
        .into_iter()
        .map(|e| BlogPostSummary::from(BlogPost::from(e)))
        .collect();
    Ok(Json(Paginated::new(data, &params, total)))
}

/// A single published post.
///
/// GET /api/v1/blog/:slug
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let post = BlogPostRepository::new(state.pool.clone())
        .find_by_slug(&slug, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
    Ok(Json(post.into()))
}
