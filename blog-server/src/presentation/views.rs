//! HTML pages. Every user-supplied value goes through [`escape`].

use crate::domain::post::Post;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; max-width: 760px; margin: 0 auto; padding: 20px; }}
        .post {{ border-bottom: 1px solid #ddd; padding: 16px 0; }}
        .post img {{ max-width: 100%; }}
        .meta {{ color: #666; font-size: 14px; }}
        form label {{ display: block; margin-top: 12px; }}
        form input[type=text], form textarea {{ width: 100%; }}
    </style>
</head>
<body>
    <nav><a href="/">Home</a> | <a href="/posts">Posts</a></nav>
{body}
</body>
</html>"#,
        title = escape(title),
        body = body
    )
}

fn post_block(post: &Post, with_actions: bool) -> String {
    let cover = post
        .cover_image_url
        .as_deref()
        .map(|url| format!(r#"<img src="{}" alt="cover image">"#, escape(url)))
        .unwrap_or_default();
    let actions = if with_actions {
        format!(
            r#"<p><a href="/posts/edit/{id}">Edit</a> | <a href="/posts/delete/{id}">Delete</a></p>"#,
            id = post.id
        )
    } else {
        String::new()
    };

    format!(
        r#"    <article class="post">
        <h2>{title}</h2>
        {cover}
        <p class="meta">Written by {author} on {date}</p>
        <p>{content}</p>
        {actions}
    </article>
"#,
        title = escape(&post.title),
        cover = cover,
        author = escape(&post.author),
        date = post.date_posted.format("%Y-%m-%d %H:%M UTC"),
        content = escape(&post.content),
        actions = actions
    )
}

fn post_form(action: &str, post: Option<&Post>, submit: &str) -> String {
    let (title, author, content) = post
        .map(|p| (escape(&p.title), escape(&p.author), escape(&p.content)))
        .unwrap_or_default();

    format!(
        r#"    <form action="{action}" method="POST" enctype="multipart/form-data">
        <label for="title">Title</label>
        <input type="text" id="title" name="title" maxlength="100" value="{title}" required>
        <label for="author">Author</label>
        <input type="text" id="author" name="author" maxlength="20" value="{author}">
        <label for="content">Content</label>
        <textarea id="content" name="content" rows="8" required>{content}</textarea>
        <label for="cover_image">Cover image</label>
        <input type="file" id="cover_image" name="cover_image" accept="image/*">
        <p><button type="submit">{submit}</button></p>
    </form>
"#,
        action = escape(action),
        title = title,
        author = author,
        content = content,
        submit = submit
    )
}

pub fn render_index(posts: &[Post]) -> String {
    let mut body = String::from("    <h1>Blog</h1>\n");
    if posts.is_empty() {
        body.push_str("    <p>No posts yet.</p>\n");
    }
    for post in posts {
        body.push_str(&post_block(post, false));
    }
    layout("Blog", &body)
}

pub fn render_posts(posts: &[Post]) -> String {
    let mut body = String::from("    <h1>Posts</h1>\n");
    body.push_str(&post_form("/posts", None, "Publish"));
    for post in posts {
        body.push_str(&post_block(post, true));
    }
    layout("Posts", &body)
}

pub fn render_edit(post: &Post) -> String {
    let mut body = String::from("    <h1>Edit post</h1>\n");
    if let Some(url) = post.cover_image_url.as_deref() {
        body.push_str(&format!(
            "    <p>Current cover: <img src=\"{}\" alt=\"cover image\" width=\"200\"></p>\n",
            escape(url)
        ));
    }
    body.push_str(&post_form(
        &format!("/posts/edit/{}", post.id),
        Some(post),
        "Save",
    ));
    layout(&format!("Edit: {}", post.title), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post() -> Post {
        Post {
            id: 3,
            title: "<script>alert(1)</script>".into(),
            content: "Tom & Jerry".into(),
            author: "O'Neil".into(),
            date_posted: Utc::now(),
            cover_image_url: None,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
    }

    #[test]
    fn index_escapes_user_content() {
        let html = render_index(&[post()]);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn edit_form_is_prefilled_and_targets_post() {
        let mut post = post();
        post.cover_image_url = Some("https://b.s3.amazonaws.com/k_a.png".into());
        let html = render_edit(&post);
        assert!(html.contains(r#"action="/posts/edit/3""#));
        assert!(html.contains("O&#x27;Neil"));
        assert!(html.contains("https://b.s3.amazonaws.com/k_a.png"));
    }

    #[test]
    fn management_view_links_actions() {
        let html = render_posts(&[post()]);
        assert!(html.contains(r#"href="/posts/delete/3""#));
        assert!(html.contains(r#"action="/posts""#));
    }
}
