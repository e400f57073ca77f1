//! Field-level validation for directory entries and reviews.
//!
//! Validation never stops at the first problem: every failing field is
//! reported so callers can show the whole list at once.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::GeoPoint;
use crate::types::Masjid;

/// A single failed field with a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `location.city`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The "required" error for a known field.
    pub fn required(field: &str) -> Self {
        Self::new(field, required_message(field))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Message shown when a required field is missing or blank.
pub fn required_message(field: &str) -> &'static str {
    match field {
        "name" => "SubhanaLlah! Please enter a masjid name!",
        "imam_name" => "SubhanaLlah! Please enter the name of the masjid imam!",
        "imam_phone_no" => "SubhanaLlah! You must supply the phone number of the masjid imam!",
        "sec_name" => "SubhanaLlah! Please enter the name of the masjid secretary!",
        "sec_phone_no" => "SubhanaLlah! You must supply the phone number of the masjid secretary!",
        "population" => "SubhanaLlah! You must supply the average population size of the masjid!",
        "langservice" => "SubhanaLlah! Please enter the language of service of the masjid!",
        "location" | "location.coordinates" => "SubhanaLlah! You must supply coordinates!",
        "location.address" => "SubhanaLlah! You must supply an address!",
        "location.city" => "SubhanaLlah! You must supply a city!",
        "location.state" => "SubhanaLlah! You must supply a state!",
        "location.country" => "SubhanaLlah! You must supply a country!",
        "author" => "SubhanaLlah! You must supply an author",
        "rating" => "SubhanaLlah! Your rating must be a number between 1 and 5!",
        _ => "SubhanaLlah! This field is required!",
    }
}

/// Trim an optional string, treating blank values as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collects field errors while a value is being built or checked.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field` using its "required" message.
    pub fn missing(&mut self, field: &str) {
        self.errors.push(FieldError::required(field));
    }

    /// Unwrap a required value, recording an error and returning the default when absent.
    pub fn required<T: Default>(&mut self, field: &str, value: Option<T>) -> T {
        match value {
            Some(v) => v,
            None => {
                self.missing(field);
                T::default()
            }
        }
    }

    /// Require a non-blank string. Blank values are reported but not coerced.
    pub fn text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.missing(field);
        }
    }

    /// Require a valid `[longitude, latitude]` pair.
    pub fn coordinates(&mut self, field: &str, coordinates: [f64; 2]) {
        if !GeoPoint::from_coordinates(coordinates).is_valid() {
            self.missing(field);
        }
    }

    /// Run every field check a stored entry must satisfy.
    pub fn check_masjid(&mut self, masjid: &Masjid) {
        self.text("name", &masjid.name);
        self.text("imam_name", &masjid.imam_name);
        self.text("sec_name", &masjid.sec_name);
        self.text("langservice", &masjid.langservice);
        self.coordinates("location.coordinates", masjid.location.coordinates);
        self.text("location.address", &masjid.location.address);
        self.text("location.city", &masjid.location.city);
        self.text("location.state", &masjid.location.state);
        self.text("location.country", &masjid.location.country);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validate a fully built entry.
pub fn validate_masjid(masjid: &Masjid) -> Result<(), Vec<FieldError>> {
    let mut validator = Validator::new();
    validator.check_masjid(masjid);
    validator.finish()
}
