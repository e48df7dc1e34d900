use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An opaque field-name → value mapping, as stored in a collection.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// One document as enumerated by a [`crate::DocumentStore`]: the store-assigned id plus fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, fields: Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// The `{ _id, data }` envelope used for keyed collections.
///
/// `_id` is the store-assigned id and is what edit/delete flows key on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyed<T = Document> {
    #[serde(rename = "_id")]
    pub id: String,
    pub data: T,
}

impl Keyed<Document> {
    /// Decodes the raw field mapping into a typed record, keeping the id.
    pub fn decode<R: DeserializeOwned>(&self) -> Result<Keyed<R>, serde_json::Error> {
        let data = R::deserialize(serde_json::Value::Object(self.data.clone()))?;
        Ok(Keyed {
            id: self.id.clone(),
            data,
        })
    }
}

impl<T> Keyed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Keyed<U> {
        Keyed {
            id: self.id,
            data: f(self.data),
        }
    }
}

impl From<StoredDocument> for Keyed<Document> {
    fn from(doc: StoredDocument) -> Self {
        Self {
            id: doc.id,
            data: doc.fields,
        }
    }
}
