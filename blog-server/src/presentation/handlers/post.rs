use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::dto::PostForm;
use crate::presentation::utils::{CurrentRequestId, html, redirect_home};
use crate::presentation::views;
use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, get, post, web};
use tracing::info;

#[get("/")]
pub async fn index(
    request_id: CurrentRequestId,
    service: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.list_posts().await?;

    info!(request_id = %request_id, count = posts.len(), "home listing rendered");

    Ok(html(views::render_index(&posts)))
}

#[get("/posts")]
pub async fn list_posts(
    request_id: CurrentRequestId,
    service: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.list_managed_posts().await?;

    info!(request_id = %request_id, count = posts.len(), "management listing rendered");

    Ok(html(views::render_posts(&posts)))
}

#[post("/posts")]
pub async fn create_post(
    request_id: CurrentRequestId,
    service: web::Data<PostService>,
    MultipartForm(form): MultipartForm<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let input = form.into_input().await?;
    let post = service.create_post(input).await?;

    info!(
        request_id = %request_id,
        post_id = post.id,
        has_cover = post.cover_image_url.is_some(),
        "post created"
    );

    Ok(redirect_home())
}

#[get("/posts/delete/{id}")]
pub async fn delete_post(
    request_id: CurrentRequestId,
    service: web::Data<PostService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    service.delete_post(post_id).await?;

    info!(request_id = %request_id, post_id, "post deleted");

    Ok(redirect_home())
}

#[get("/posts/edit/{id}")]
pub async fn edit_form(
    service: web::Data<PostService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, DomainError> {
    let post = service.get_post(path.into_inner()).await?;
    Ok(html(views::render_edit(&post)))
}

#[post("/posts/edit/{id}")]
pub async fn edit_post(
    request_id: CurrentRequestId,
    service: web::Data<PostService>,
    path: web::Path<i32>,
    MultipartForm(form): MultipartForm<PostForm>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let input = form.into_input().await?;
    let post = service.edit_post(post_id, input).await?;

    info!(
        request_id = %request_id,
        post_id = post.id,
        "post updated"
    );

    Ok(redirect_home())
}
