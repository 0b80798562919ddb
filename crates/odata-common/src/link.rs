//! Entity links and inline content.

use url::Url;

use crate::entity::{Entity, EntitySet};
use crate::error::{ODataError, ODataResult};
use crate::version::ServiceVersion;

/// Media type of a navigation link to a single entity.
pub const ENTRY_MEDIA_TYPE: &str = "application/atom+xml;type=entry";
/// Media type of a navigation link to an entity set.
pub const FEED_MEDIA_TYPE: &str = "application/atom+xml;type=feed";
/// Media type of an association link.
pub const ASSOCIATION_MEDIA_TYPE: &str = "application/xml";
/// Media type of a media-edit link.
pub const MEDIA_EDIT_MEDIA_TYPE: &str = "*/*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Navigation,
    Association,
    MediaEdit,
}

/// Content embedded in a navigation link.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Entity(Box<Entity>),
    EntitySet(EntitySet),
}

/// A link from an entity to a related resource.
///
/// Only navigation links may carry inline content.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub kind: LinkKind,
    pub relation: String,
    pub title: String,
    pub href: Option<Url>,
    pub media_type: String,
    pub media_etag: Option<String>,
    inline: Option<Inline>,
}

impl Link {
    pub fn new(kind: LinkKind, relation: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            relation: relation.into(),
            title: title.into(),
            href: None,
            media_type: String::new(),
            media_etag: None,
            inline: None,
        }
    }

    /// Navigation link to a single related entity.
    pub fn navigation_entity(version: ServiceVersion, title: &str, href: Option<Url>) -> Self {
        Self::new(
            LinkKind::Navigation,
            version.rel_for(LinkKind::Navigation, title),
            title,
        )
        .with_href(href)
        .with_media_type(ENTRY_MEDIA_TYPE)
    }

    /// Navigation link to a related entity set.
    pub fn navigation_entity_set(version: ServiceVersion, title: &str, href: Option<Url>) -> Self {
        Self::new(
            LinkKind::Navigation,
            version.rel_for(LinkKind::Navigation, title),
            title,
        )
        .with_href(href)
        .with_media_type(FEED_MEDIA_TYPE)
    }

    pub fn association(version: ServiceVersion, title: &str, href: Option<Url>) -> Self {
        Self::new(
            LinkKind::Association,
            version.rel_for(LinkKind::Association, title),
            title,
        )
        .with_href(href)
        .with_media_type(ASSOCIATION_MEDIA_TYPE)
    }

    pub fn media_edit(version: ServiceVersion, title: &str, href: Option<Url>) -> Self {
        Self::new(
            LinkKind::MediaEdit,
            version.rel_for(LinkKind::MediaEdit, title),
            title,
        )
        .with_href(href)
        .with_media_type(MEDIA_EDIT_MEDIA_TYPE)
    }

    /// Navigation link with an expanded entity.
    pub fn inline_entity(
        version: ServiceVersion,
        title: &str,
        href: Option<Url>,
        entity: Entity,
    ) -> Self {
        let mut link = Self::navigation_entity(version, title, href);
        link.inline = Some(Inline::Entity(Box::new(entity)));
        link
    }

    /// Navigation link with an expanded entity set.
    pub fn inline_entity_set(
        version: ServiceVersion,
        title: &str,
        href: Option<Url>,
        entity_set: EntitySet,
    ) -> Self {
        let mut link = Self::navigation_entity_set(version, title, href);
        link.inline = Some(Inline::EntitySet(entity_set));
        link
    }

    pub fn with_href(mut self, href: Option<Url>) -> Self {
        self.href = href;
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn with_media_etag(mut self, etag: impl Into<String>) -> Self {
        self.media_etag = Some(etag.into());
        self
    }

    /// Attach inline content. Fails unless this is a navigation link.
    pub fn with_inline(mut self, inline: Inline) -> ODataResult<Self> {
        if self.kind != LinkKind::Navigation {
            return Err(ODataError::MalformedLink(format!(
                "{:?} link '{}' cannot carry inline content",
                self.kind, self.title
            )));
        }
        self.inline = Some(inline);
        Ok(self)
    }

    pub fn inline(&self) -> Option<&Inline> {
        self.inline.as_ref()
    }

    pub fn take_inline(&mut self) -> Option<Inline> {
        self.inline.take()
    }

    pub fn is_inline(&self) -> bool {
        self.inline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_relation() {
        let link = Link::navigation_entity(ServiceVersion::V3, "Orders", None);
        assert_eq!(
            link.relation,
            "http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders"
        );
        assert_eq!(link.media_type, ENTRY_MEDIA_TYPE);
        assert!(!link.is_inline());
    }

    #[test]
    fn test_inline_rejected_on_association() {
        let link = Link::association(ServiceVersion::V4, "Orders", None);
        let result = link.with_inline(Inline::EntitySet(EntitySet::new()));
        assert!(matches!(result, Err(ODataError::MalformedLink(_))));
    }

    #[test]
    fn test_inline_entity() {
        let child = Entity::new("NS.Order");
        let link = Link::inline_entity(ServiceVersion::V4, "LastOrder", None, child.clone());
        match link.inline() {
            Some(Inline::Entity(e)) => assert_eq!(**e, child),
            other => panic!("Expected inline entity, got {:?}", other),
        }
    }
}
