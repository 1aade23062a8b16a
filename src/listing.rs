// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Listing input records.
//!
//! A [`ListingInput`] is what an admin submits for bulk creation. Once it
//! passes validation it is turned into a CMS document via
//! [`ListingInput::to_document`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Listing types accepted by the directory.
pub const LISTING_TYPES: [&str; 4] = ["accommodation", "coworking", "cafe", "activity"];

/// Geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A binary file to attach to a listing (usually a photo).
///
/// The payload is not serialized; failure reports only carry the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    #[serde(default, skip_serializing)]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Filename without its extension, used as the asset title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self.filename.rfind('.') {
            Some(pos) if pos > 0 => &self.filename[..pos],
            _ => &self.filename,
        }
    }
}

/// One listing to create.
///
/// # Example
///
/// ```
/// use bulk_engine::ListingInput;
///
/// let listing = ListingInput::new("Blue Door Cafe", "cafe", "Lisbon", "Portugal");
/// let doc = listing.to_document();
/// assert_eq!(doc["_type"], "listing");
/// assert_eq!(doc["status"], "pending");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    pub name: String,
    #[serde(rename = "type")]
    pub listing_type: String,
    pub city: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eco_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "images")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl ListingInput {
    /// Create a listing with only the required fields set.
    pub fn new(
        name: impl Into<String>,
        listing_type: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            listing_type: listing_type.into(),
            city: city.into(),
            country: country.into(),
            description: None,
            website: None,
            address: None,
            eco_tags: Vec::new(),
            attachments: Vec::new(),
            coordinates: None,
        }
    }

    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lng });
        self
    }

    #[must_use]
    pub fn with_eco_tags(mut self, tags: Vec<String>) -> Self {
        self.eco_tags = tags;
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// JSON form of the input, as recorded in failure entries.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Build the CMS document for this listing (without images).
    ///
    /// Text fields are trimmed, the status starts as `pending`.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("_type".into(), json!("listing"));
        doc.insert("name".into(), json!(self.name.trim()));
        doc.insert("type".into(), json!(self.listing_type));
        doc.insert("city".into(), json!(self.city.trim()));
        doc.insert("country".into(), json!(self.country.trim()));
        if let Some(ref description) = self.description {
            doc.insert("description".into(), json!(description.trim()));
        }
        if let Some(website) = self.website.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            doc.insert("website".into(), json!(website));
        }
        if let Some(ref address) = self.address {
            doc.insert("address".into(), json!(address.trim()));
        }
        doc.insert("ecoTags".into(), json!(self.eco_tags));
        doc.insert("createdAt".into(), json!(now_rfc3339()));
        doc.insert("status".into(), json!("pending"));
        if let Some(coords) = self.coordinates {
            doc.insert(
                "coordinates".into(),
                json!({ "lat": coords.lat, "lng": coords.lng, "_type": "geopoint" }),
            );
        }
        Value::Object(doc)
    }
}

/// A patch against an existing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    pub id: String,
    pub patch: Value,
}

impl DocumentUpdate {
    pub fn new(id: impl Into<String>, patch: Value) -> Self {
        Self { id: id.into(), patch }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({ "id": self.id, "data": self.patch })
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_listing_has_empty_optionals() {
        let listing = ListingInput::new("Hub", "coworking", "Berlin", "Germany");
        assert!(listing.description.is_none());
        assert!(listing.website.is_none());
        assert!(listing.eco_tags.is_empty());
        assert!(!listing.has_attachments());
        assert!(listing.coordinates.is_none());
    }

    #[test]
    fn test_to_document_trims_and_sets_defaults() {
        let mut listing = ListingInput::new("  Hub  ", "coworking", " Berlin ", "Germany ");
        listing.description = Some("  quiet desks ".into());
        listing.address = Some(" Torstr. 1 ".into());

        let doc = listing.to_document();
        assert_eq!(doc["_type"], "listing");
        assert_eq!(doc["name"], "Hub");
        assert_eq!(doc["city"], "Berlin");
        assert_eq!(doc["country"], "Germany");
        assert_eq!(doc["description"], "quiet desks");
        assert_eq!(doc["address"], "Torstr. 1");
        assert_eq!(doc["ecoTags"], json!([]));
        assert_eq!(doc["status"], "pending");
        assert!(doc["createdAt"].as_str().unwrap().ends_with('Z'));
        assert!(doc.get("coordinates").is_none());
        assert!(doc.get("website").is_none());
    }

    #[test]
    fn test_to_document_drops_blank_website() {
        let blank = ListingInput::new("Hub", "cafe", "Lisbon", "Portugal").with_website("  ");
        assert!(blank.to_document().get("website").is_none());

        let set = ListingInput::new("Hub", "cafe", "Lisbon", "Portugal").with_website(" https://hub.example ");
        assert_eq!(set.to_document()["website"], "https://hub.example");
    }

    #[test]
    fn test_to_document_coordinates_are_geopoint() {
        let listing = ListingInput::new("Hut", "accommodation", "Oslo", "Norway")
            .with_coordinates(59.91, 10.75);
        let doc = listing.to_document();
        assert_eq!(doc["coordinates"], json!({"lat": 59.91, "lng": 10.75, "_type": "geopoint"}));
    }

    #[test]
    fn test_deserialize_from_admin_json() {
        let listing: ListingInput = serde_json::from_value(json!({
            "name": "Surf Camp",
            "type": "activity",
            "city": "Ericeira",
            "country": "Portugal",
            "ecoTags": ["solar"],
            "coordinates": {"lat": 38.96, "lng": -9.41}
        }))
        .unwrap();

        assert_eq!(listing.listing_type, "activity");
        assert_eq!(listing.eco_tags, vec!["solar".to_string()]);
        assert_eq!(listing.coordinates, Some(Coordinates { lat: 38.96, lng: -9.41 }));
    }

    #[test]
    fn test_to_value_omits_attachment_payload() {
        let listing = ListingInput::new("Hub", "coworking", "Berlin", "Germany")
            .with_attachments(vec![Attachment::new("desk.jpg", "image/jpeg", vec![1, 2, 3])]);
        let value = listing.to_value();
        assert_eq!(value["images"][0]["filename"], "desk.jpg");
        assert!(value["images"][0].get("data").is_none());
    }

    #[test]
    fn test_attachment_title_strips_extension() {
        assert_eq!(Attachment::new("desk.photo.jpg", "image/jpeg", vec![]).title(), "desk.photo");
        assert_eq!(Attachment::new("README", "text/plain", vec![]).title(), "README");
        assert_eq!(Attachment::new(".hidden", "image/png", vec![]).title(), ".hidden");
    }

    #[test]
    fn test_update_to_value() {
        let update = DocumentUpdate::new("listing-1", json!({"status": "approved"}));
        assert_eq!(update.to_value(), json!({"id": "listing-1", "data": {"status": "approved"}}));
    }
}
