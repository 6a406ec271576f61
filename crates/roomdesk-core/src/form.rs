//! The "add room" form model and its submission state.
//!
//! [`FormModel`] keeps every flat field mirrored into a nested
//! [`FormMetadata`] structure. All writes go through [`FormModel::update_field`]
//! or [`FormModel::set_booked`], which update both copies together, so
//! `metadata.<field> == <field>` holds after every edit.
//!
//! [`SubmitState`] pairs the form with the status of the last submission and
//! implements the reset-on-success / keep-on-failure rule.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::models::NewRoom;

/// Generic message used when the backend rejects a submission without detail.
pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to add document";

/// A named field of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    RoomNumber,
    Description,
    RoomSize,
    ImageUrl,
    IsBooked,
    PageContent,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::RoomNumber,
        FormField::Description,
        FormField::RoomSize,
        FormField::ImageUrl,
        FormField::IsBooked,
        FormField::PageContent,
    ];

    /// Wire name of the field, as used in the submission payload.
    pub fn name(&self) -> &'static str {
        match self {
            FormField::RoomNumber => "room_number",
            FormField::Description => "description",
            FormField::RoomSize => "room_size",
            FormField::ImageUrl => "image_url",
            FormField::IsBooked => "is_booked",
            FormField::PageContent => "page_content",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

/// The typed value held by one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::json!(n),
            FieldValue::Flag(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown form field: '{0}'")]
    UnknownField(String),
    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: FormField, value: String },
    #[error("{field} must be true or false, got '{value}'")]
    InvalidFlag { field: FormField, value: String },
    #[error("{0} is required")]
    Required(FormField),
    #[error("{0} must not be negative")]
    Negative(FormField),
    #[error("image_url must be an absolute http(s) URL, got '{0}'")]
    InvalidUrl(String),
}

/// Nested copy of the form fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormMetadata {
    pub room_number: String,
    pub description: String,
    pub room_size: f64,
    pub image_url: String,
    pub is_booked: bool,
    pub page_content: String,
}

/// Flat form fields plus their mirrored [`FormMetadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormModel {
    room_number: String,
    description: String,
    room_size: f64,
    image_url: String,
    is_booked: bool,
    page_content: String,
    metadata: FormMetadata,
}

fn mirror<T: Clone>(flat: &mut T, nested: &mut T, value: T) {
    *nested = value.clone();
    *flat = value;
}

impl FormModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `raw` under `field` and mirrors it into the metadata.
    ///
    /// `room_size` is coerced to a number (blank means `0`); `is_booked`
    /// accepts `true`/`false`. On error the model is left unchanged.
    pub fn update_field(&mut self, field: FormField, raw: &str) -> Result<(), FormError> {
        match field {
            FormField::RoomNumber => mirror(
                &mut self.room_number,
                &mut self.metadata.room_number,
                raw.to_string(),
            ),
            FormField::Description => mirror(
                &mut self.description,
                &mut self.metadata.description,
                raw.to_string(),
            ),
            FormField::RoomSize => {
                let size = parse_room_size(raw)?;
                mirror(&mut self.room_size, &mut self.metadata.room_size, size);
            }
            FormField::ImageUrl => mirror(
                &mut self.image_url,
                &mut self.metadata.image_url,
                raw.to_string(),
            ),
            FormField::IsBooked => {
                let flag = raw
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| FormError::InvalidFlag {
                        field,
                        value: raw.to_string(),
                    })?;
                self.set_booked(flag);
            }
            FormField::PageContent => mirror(
                &mut self.page_content,
                &mut self.metadata.page_content,
                raw.to_string(),
            ),
        }
        Ok(())
    }

    /// Same as [`update_field`](Self::update_field) with the field given by name.
    pub fn update_named(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let field: FormField = name.parse()?;
        self.update_field(field, raw)
    }

    /// Toggle path for the "room is booked" switch.
    pub fn set_booked(&mut self, booked: bool) {
        mirror(&mut self.is_booked, &mut self.metadata.is_booked, booked);
    }

    /// Restores every field (and the metadata) to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn value(&self, field: FormField) -> FieldValue {
        match field {
            FormField::RoomNumber => FieldValue::Text(self.room_number.clone()),
            FormField::Description => FieldValue::Text(self.description.clone()),
            FormField::RoomSize => FieldValue::Number(self.room_size),
            FormField::ImageUrl => FieldValue::Text(self.image_url.clone()),
            FormField::IsBooked => FieldValue::Flag(self.is_booked),
            FormField::PageContent => FieldValue::Text(self.page_content.clone()),
        }
    }

    pub fn metadata_value(&self, field: FormField) -> FieldValue {
        let m = &self.metadata;
        match field {
            FormField::RoomNumber => FieldValue::Text(m.room_number.clone()),
            FormField::Description => FieldValue::Text(m.description.clone()),
            FormField::RoomSize => FieldValue::Number(m.room_size),
            FormField::ImageUrl => FieldValue::Text(m.image_url.clone()),
            FormField::IsBooked => FieldValue::Flag(m.is_booked),
            FormField::PageContent => FieldValue::Text(m.page_content.clone()),
        }
    }

    pub fn metadata(&self) -> &FormMetadata {
        &self.metadata
    }

    pub fn room_number(&self) -> &str {
        &self.room_number
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn room_size(&self) -> f64 {
        self.room_size
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn is_booked(&self) -> bool {
        self.is_booked
    }

    pub fn page_content(&self) -> &str {
        &self.page_content
    }

    /// Checks the constraints the form enforces before anything is sent.
    pub fn validate(&self) -> Result<(), FormError> {
        for (field, value) in [
            (FormField::RoomNumber, &self.room_number),
            (FormField::PageContent, &self.page_content),
            (FormField::Description, &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(FormError::Required(field));
            }
        }
        if self.room_size < 0.0 {
            return Err(FormError::Negative(FormField::RoomSize));
        }
        let url = self.image_url.trim();
        if !url.is_empty() && !is_absolute_http_url(url) {
            return Err(FormError::InvalidUrl(self.image_url.clone()));
        }
        Ok(())
    }

    /// Builds the single-element batch posted to the add-documents endpoint.
    ///
    /// The mirrored metadata is only included when `include_metadata` is set;
    /// otherwise the element carries an empty `metadata` object. `image_url`
    /// is sent trimmed, and as `null` when nothing is left.
    pub fn to_batch(&self, include_metadata: bool) -> Vec<NewRoom> {
        let image_url = self.image_url.trim();
        let metadata = if include_metadata {
            self.metadata_map()
        } else {
            Map::new()
        };
        vec![NewRoom {
            room_number: self.room_number.clone(),
            description: self.description.clone(),
            room_size: self.room_size,
            image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
            is_booked: self.is_booked,
            page_content: self.page_content.clone(),
            metadata,
        }]
    }

    fn metadata_map(&self) -> Map<String, Value> {
        FormField::ALL
            .into_iter()
            .map(|field| (field.name().to_string(), self.metadata_value(field).to_json()))
            .collect()
    }
}

fn parse_room_size(raw: &str) -> Result<f64, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FormError::InvalidNumber {
            field: FormField::RoomSize,
            value: raw.to_string(),
        })
}

fn is_absolute_http_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

/// Outcome of the most recent submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

/// The form together with its submission status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitState {
    pub form: FormModel,
    pub status: SubmitStatus,
}

impl SubmitState {
    pub fn is_submitting(&self) -> bool {
        self.status == SubmitStatus::Submitting
    }

    /// Validates the form and, if it passes, enters `Submitting` and returns
    /// the payload to send. An invalid form moves to `Failed` untouched.
    pub fn begin(&mut self, include_metadata: bool) -> Result<Vec<NewRoom>, FormError> {
        if let Err(e) = self.form.validate() {
            self.status = SubmitStatus::Failed(e.to_string());
            return Err(e);
        }
        self.status = SubmitStatus::Submitting;
        Ok(self.form.to_batch(include_metadata))
    }

    /// Confirmed by the backend: the whole form goes back to its defaults.
    pub fn succeed(&mut self) {
        self.form.reset();
        self.status = SubmitStatus::Succeeded;
    }

    /// Rejected or failed: the form keeps the user's input for a retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SubmitStatus::Failed(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn filled_form() -> FormModel {
        let mut form = FormModel::new();
        form.update_field(FormField::RoomNumber, "101").unwrap();
        form.update_field(FormField::PageContent, "Garden suite").unwrap();
        form.update_field(FormField::Description, "Quiet, faces the garden")
            .unwrap();
        form.update_field(FormField::RoomSize, "25.5").unwrap();
        form
    }

    fn assert_mirrored(form: &FormModel) {
        for field in FormField::ALL {
            assert_eq!(
                form.value(field),
                form.metadata_value(field),
                "field {} drifted from its metadata copy",
                field
            );
        }
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in FormField::ALL {
            assert_eq!(field.name().parse::<FormField>().unwrap(), field);
        }
        assert_eq!(
            "floor".parse::<FormField>(),
            Err(FormError::UnknownField("floor".to_string()))
        );
    }

    #[test]
    fn test_room_size_is_coerced() {
        let mut form = FormModel::new();
        form.update_field(FormField::RoomSize, "25.5").unwrap();
        assert_eq!(form.room_size(), 25.5);
        assert_eq!(form.metadata().room_size, 25.5);

        form.update_field(FormField::RoomSize, "").unwrap();
        assert_eq!(form.room_size(), 0.0);
    }

    #[test]
    fn test_invalid_room_size_leaves_model_unchanged() {
        let mut form = filled_form();
        let before = form.clone();
        let err = form.update_field(FormField::RoomSize, "large").unwrap_err();
        assert!(matches!(err, FormError::InvalidNumber { .. }));
        assert_eq!(form, before);

        assert!(form.update_field(FormField::RoomSize, "NaN").is_err());
        assert!(form.update_field(FormField::RoomSize, "inf").is_err());
    }

    #[test]
    fn test_text_fields_are_not_coerced() {
        let mut form = FormModel::new();
        form.update_field(FormField::RoomNumber, "007").unwrap();
        assert_eq!(form.room_number(), "007");
        assert_eq!(form.metadata().room_number, "007");
    }

    #[test]
    fn test_booked_toggle_and_named_update() {
        let mut form = FormModel::new();
        form.set_booked(true);
        assert!(form.is_booked());
        assert!(form.metadata().is_booked);

        form.update_named("is_booked", "false").unwrap();
        assert!(!form.metadata().is_booked);
        assert!(form.update_named("is_booked", "maybe").is_err());
        assert_mirrored(&form);
    }

    #[test]
    fn test_validate_required_fields() {
        assert_eq!(
            FormModel::new().validate(),
            Err(FormError::Required(FormField::RoomNumber))
        );

        let mut form = filled_form();
        form.update_field(FormField::Description, "   ").unwrap();
        assert_eq!(
            form.validate(),
            Err(FormError::Required(FormField::Description))
        );
    }

    #[test]
    fn test_validate_room_size_and_url() {
        let mut form = filled_form();
        assert_eq!(form.validate(), Ok(()));

        form.update_field(FormField::RoomSize, "-1").unwrap();
        assert_eq!(form.validate(), Err(FormError::Negative(FormField::RoomSize)));

        form.update_field(FormField::RoomSize, "12").unwrap();
        form.update_field(FormField::ImageUrl, "not a url").unwrap();
        assert!(matches!(form.validate(), Err(FormError::InvalidUrl(_))));

        form.update_field(FormField::ImageUrl, "https://").unwrap();
        assert!(matches!(form.validate(), Err(FormError::InvalidUrl(_))));

        for malformed in [
            "http://[::1",
            "https://exa%zzmple.com",
            "http://a:b:c/",
            "ftp://i.ibb.co/x.png",
            "https://i.ibb co/x.png",
        ] {
            form.update_field(FormField::ImageUrl, malformed).unwrap();
            assert!(
                matches!(form.validate(), Err(FormError::InvalidUrl(_))),
                "accepted {}",
                malformed
            );
        }

        form.update_field(FormField::ImageUrl, "https://i.ibb.co/x.png")
            .unwrap();
        assert_eq!(form.validate(), Ok(()));

        form.update_field(FormField::ImageUrl, "http://[::1]:8080/x.png")
            .unwrap();
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn test_batch_payload_shape() {
        let form = filled_form();
        let batch = form.to_batch(false);
        assert_eq!(batch.len(), 1);

        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            value,
            json!([{
                "room_number": "101",
                "description": "Quiet, faces the garden",
                "room_size": 25.5,
                "image_url": null,
                "is_booked": false,
                "page_content": "Garden suite",
                "metadata": {}
            }])
        );
    }

    #[test]
    fn test_batch_with_metadata_and_image() {
        let mut form = filled_form();
        form.update_field(FormField::ImageUrl, "https://i.ibb.co/x.png")
            .unwrap();
        let batch = form.to_batch(true);

        assert_eq!(batch[0].image_url.as_deref(), Some("https://i.ibb.co/x.png"));
        assert_eq!(batch[0].metadata.get("room_number"), Some(&json!("101")));
        assert_eq!(batch[0].metadata.get("room_size"), Some(&json!(25.5)));
        assert_eq!(batch[0].metadata.len(), FormField::ALL.len());
    }

    #[test]
    fn test_batch_image_url_is_trimmed() {
        let mut form = filled_form();
        form.update_field(FormField::ImageUrl, "   ").unwrap();
        assert_eq!(form.validate(), Ok(()));
        assert_eq!(form.to_batch(false)[0].image_url, None);

        form.update_field(FormField::ImageUrl, "  https://i.ibb.co/x.png \n")
            .unwrap();
        assert_eq!(form.validate(), Ok(()));
        assert_eq!(
            form.to_batch(false)[0].image_url.as_deref(),
            Some("https://i.ibb.co/x.png")
        );
        assert_eq!(form.image_url(), "  https://i.ibb.co/x.png \n");
    }

    #[test]
    fn test_submit_state_success_resets() {
        let mut state = SubmitState {
            form: filled_form(),
            status: SubmitStatus::Idle,
        };
        let batch = state.begin(false).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(state.is_submitting());

        state.succeed();
        assert_eq!(state.form, FormModel::default());
        assert_eq!(state.status, SubmitStatus::Succeeded);
    }

    #[test]
    fn test_submit_state_failure_keeps_input() {
        let mut state = SubmitState {
            form: filled_form(),
            status: SubmitStatus::Idle,
        };
        state.begin(false).unwrap();
        state.fail("room_number already exists");

        assert_eq!(state.form, filled_form());
        assert_eq!(
            state.status,
            SubmitStatus::Failed("room_number already exists".to_string())
        );
    }

    #[test]
    fn test_submit_state_invalid_form_does_not_start() {
        let mut state = SubmitState::default();
        assert!(state.begin(false).is_err());
        assert!(!state.is_submitting());
        assert!(matches!(state.status, SubmitStatus::Failed(_)));
    }

    fn field_strategy() -> impl Strategy<Value = FormField> {
        prop::sample::select(FormField::ALL.to_vec())
    }

    fn raw_value_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9 ./:-]{0,24}",
            (-1000.0f64..1000.0).prop_map(|n| n.to_string()),
            any::<bool>().prop_map(|b| b.to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_every_edit_keeps_metadata_mirrored(
            edits in prop::collection::vec((field_strategy(), raw_value_strategy()), 1..40)
        ) {
            let mut form = FormModel::new();
            for (field, raw) in edits {
                let _ = form.update_field(field, &raw);
                prop_assert_eq!(form.value(field), form.metadata_value(field));
            }
            for field in FormField::ALL {
                prop_assert_eq!(form.value(field), form.metadata_value(field));
            }
        }
    }
}
