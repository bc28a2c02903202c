//! YouTube embed loader: the source attribute holds a video id.

use url::Url;

use crate::{LazyError, ResourceKind, Responder, Result};

use super::{LoadContext, LoaderRegistry};

const EMBED_BASE: &str = "https://www.youtube.com/embed/";

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["yt", "youtube"], Some(&["iframe"]), load_youtube);
}

/// Embed URL for a video id.
///
/// ```rust
/// use fos_lazy::loader::embed_url;
///
/// assert_eq!(
///     embed_url("1AYGnw6MwFM").unwrap(),
///     "https://www.youtube.com/embed/1AYGnw6MwFM?rel=0&showinfo=0"
/// );
/// ```
pub fn embed_url(video_id: &str) -> Result<String> {
    let id = video_id.trim();
    if id.is_empty() {
        return Err(LazyError::InvalidUrl(video_id.to_string()));
    }

    let mut url = Url::parse(EMBED_BASE).map_err(|_| LazyError::InvalidUrl(EMBED_BASE.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| LazyError::InvalidUrl(EMBED_BASE.to_string()))?
        .pop_if_empty()
        .push(id);
    url.query_pairs_mut()
        .append_pair("rel", "0")
        .append_pair("showinfo", "0");
    Ok(url.into())
}

fn load_youtube(cx: LoadContext, responder: Responder) {
    let attribute = cx.config().attribute.clone();
    let embed = cx
        .attr(&attribute)
        .ok_or(LazyError::MissingSource(cx.node()))
        .and_then(|id| embed_url(&id));

    let url = match embed {
        Ok(url) => url,
        Err(err) => {
            tracing::debug!(node = %cx.node(), "youtube embed skipped: {}", err);
            responder.fail();
            return;
        }
    };

    {
        let mut doc = cx.document().borrow_mut();
        if doc.set_attr(cx.node(), "src", &url).is_err() {
            drop(doc);
            responder.fail();
            return;
        }
        if cx.config().remove_attribute {
            doc.remove_attrs(cx.node(), &[attribute.as_str()]);
        }
    }

    let load = cx.platform().load_resource(ResourceKind::Frame, &url);
    cx.settle_when(responder, load);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_url_escapes_id() {
        assert_eq!(
            embed_url(" a/b ").unwrap(),
            "https://www.youtube.com/embed/a%2Fb?rel=0&showinfo=0"
        );
    }

    #[test]
    fn test_embed_url_rejects_empty() {
        assert!(matches!(embed_url("  "), Err(LazyError::InvalidUrl(_))));
    }
}
