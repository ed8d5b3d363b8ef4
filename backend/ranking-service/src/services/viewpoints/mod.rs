use crate::models::Author;

/// Maps an author to viewpoint tags and a cluster label.
///
/// The default implementation reads the tags carried on the author record; a
/// real classifier can swap in behind this trait without touching bundle
/// logic.
pub trait AuthorViewpointProvider: Send + Sync {
    /// Viewpoint tags for the author; never empty.
    fn viewpoints(&self, author: &Author) -> Vec<String>;

    /// Cluster label used by diversity re-ranking.
    fn cluster(&self, author: &Author) -> String;
}

/// Neutral fallback assigned to authors with no tags.
pub const DEFAULT_VIEWPOINTS: [&str; 2] = ["neutral", "general"];

const UNKNOWN_CLUSTER: &str = "unknown";

/// Stub provider backed by the `viewpoint_tags` on the author record.
#[derive(Debug, Default)]
pub struct TagViewpointProvider;

impl AuthorViewpointProvider for TagViewpointProvider {
    fn viewpoints(&self, author: &Author) -> Vec<String> {
        if author.viewpoint_tags.is_empty() {
            DEFAULT_VIEWPOINTS.iter().map(|v| v.to_string()).collect()
        } else {
            author.viewpoint_tags.clone()
        }
    }

    fn cluster(&self, author: &Author) -> String {
        author
            .viewpoint_tags
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_CLUSTER.to_string())
    }
}
