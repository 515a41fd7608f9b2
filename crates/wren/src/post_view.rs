use crate::content::{LoadError, PostIndex};
use crate::dom::mounts;
use crate::enhance::enhance_code_blocks;
use crate::fetch::Fetch;
use crate::html::{code, p};
use crate::listing::tag_chip;
use crate::render::{RenderContext, RenderError};
use crate::route::slug_param;

/// What the post page ended up showing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PostOutcome {
    Rendered { slug: String, code_blocks: usize },
    /// The URL has no `slug`.
    MissingSlug,
    /// No post in the index has the requested slug.
    UnknownSlug(String),
    /// The post exists but its body couldn't be loaded.
    BodyUnavailable { file: String, status: u16 },
}

/// Renders the post named by the URL's `slug` into the page.
///
/// A missing or unknown slug is reported inline without fetching anything.
/// Otherwise the post's body is fetched exactly once; a transport failure is
/// returned as an error, while an unsuccessful response is reported inline.
pub async fn mount_post<F>(
    ctx: &mut RenderContext<'_, F>,
    index: &PostIndex,
) -> Result<PostOutcome, RenderError>
where
    F: Fetch,
{
    ctx.set_year()?;

    let messages = &ctx.config.messages;

    let Some(slug) = slug_param(ctx.url) else {
        ctx.document
            .mount(mounts::TITLE)?
            .set_text(messages.not_found_title.clone());
        ctx.document
            .mount(mounts::CONTENT)?
            .replace_children([p().text(messages.missing_slug.clone())]);
        return Ok(PostOutcome::MissingSlug);
    };

    let Some(post) = index.find(&slug) else {
        tracing::debug!(slug = %slug, "no post with slug");

        ctx.document
            .mount(mounts::TITLE)?
            .set_text(messages.not_found_title.clone());
        ctx.document.mount(mounts::CONTENT)?.replace_children([p()
            .text(format!("{} ", messages.unknown_slug))
            .child(code().text(slug.clone()))]);
        return Ok(PostOutcome::UnknownSlug(slug));
    };

    let meta = format!(
        "{} · {} min",
        ctx.format_date(&post.date),
        post.reading_time_label()
    );

    let document = &mut *ctx.document;
    document.set_title(format!("{} • {}", post.title, ctx.config.site_name));
    document.mount(mounts::META)?.set_text(meta);
    document.mount(mounts::TITLE)?.set_text(post.title.clone());
    document.mount(mounts::SUMMARY)?.set_text(post.summary());
    document
        .mount(mounts::CHIPS)?
        .replace_children(post.tags().iter().map(|tag| tag_chip(tag)));

    let path = ctx.config.posts_path(&post.file);
    let response = ctx
        .fetcher
        .fetch(&path)
        .await
        .map_err(|source| LoadError::Fetch {
            path: path.clone(),
            source,
        })?;

    if !response.is_success() {
        tracing::debug!(path = %path, status = response.status, "post body unavailable");

        ctx.document.mount(mounts::CONTENT)?.replace_children([p()
            .text(format!("{} ", messages.body_unavailable))
            .child(code().text(post.file.clone()))]);
        return Ok(PostOutcome::BodyUnavailable {
            file: post.file.clone(),
            status: response.status,
        });
    }

    ctx.document
        .mount(mounts::CONTENT)?
        .set_raw_html(response.text());

    let code_blocks = enhance_code_blocks(ctx.document, ctx.highlighter, messages)?;

    Ok(PostOutcome::Rendered { slug, code_blocks })
}
