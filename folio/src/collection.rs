use crate::{Document, Keyed, StoredDocument};

/// A named collection together with the shape its results take.
///
/// Keyed collections wrap each document in a [`Keyed`] envelope so consumers can use `_id` for
/// edit/delete keys; profile-like collections hand out the raw mapping. The shape is part of the
/// type, so a consumer of [`User`] cannot accidentally look for `_id`.
///
/// Hosts may declare their own collections:
///
/// ```
/// use folio::{Collection, Document, StoredDocument};
///
/// struct Testimonials;
///
/// impl Collection for Testimonials {
///     const NAME: &'static str = "testimonials";
///     type Item = Document;
///
///     fn shape(doc: &StoredDocument) -> Document {
///         doc.fields.clone()
///     }
/// }
/// ```
pub trait Collection: 'static {
    /// The store-side collection name. Must not be empty.
    const NAME: &'static str;

    type Item: Clone + Send + Sync + 'static;

    fn shape(doc: &StoredDocument) -> Self::Item;
}

/// The `projects` collection (keyed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Projects;

/// The `startups` collection (keyed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Startups;

/// The `user` collection (raw profile mappings).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct User;

impl Collection for Projects {
    const NAME: &'static str = "projects";
    type Item = Keyed<Document>;

    fn shape(doc: &StoredDocument) -> Self::Item {
        Keyed::from(doc.clone())
    }
}

impl Collection for Startups {
    const NAME: &'static str = "startups";
    type Item = Keyed<Document>;

    fn shape(doc: &StoredDocument) -> Self::Item {
        Keyed::from(doc.clone())
    }
}

impl Collection for User {
    const NAME: &'static str = "user";
    type Item = Document;

    fn shape(doc: &StoredDocument) -> Self::Item {
        doc.fields.clone()
    }
}
