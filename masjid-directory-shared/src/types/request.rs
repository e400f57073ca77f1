//! Request types for creating and updating directory entries.
//!
//! Every field is optional at the type level so that a submission with
//! missing fields can still be deserialized and reported field by field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Location, Masjid, MasjidId, UserId};
use crate::validation::{optional_text, FieldError, Validator};

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Location fields as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRequest {
    /// `[longitude, latitude]` in degrees.
    pub coordinates: Option<[f64; 2]>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl LocationRequest {
    fn build(self, validator: &mut Validator) -> Location {
        let coordinates = validator.required("location.coordinates", self.coordinates);
        Location::new(
            coordinates,
            trimmed(self.address),
            trimmed(self.city),
            trimmed(self.state),
            trimmed(self.country),
        )
    }

    /// Overwrite the provided sub-fields of an existing location.
    fn merge_into(self, location: &mut Location) {
        if let Some(coordinates) = self.coordinates {
            location.coordinates = coordinates;
        }
        if let Some(address) = self.address {
            location.address = address.trim().to_string();
        }
        if let Some(city) = self.city {
            location.city = city.trim().to_string();
        }
        if let Some(state) = self.state {
            location.state = state.trim().to_string();
        }
        if let Some(country) = self.country {
            location.country = country.trim().to_string();
        }
    }
}

/// Submission for a new directory entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMasjidRequest {
    pub name: Option<String>,
    pub imam_name: Option<String>,
    pub imam_phone_no: Option<u64>,
    pub sec_name: Option<String>,
    pub sec_phone_no: Option<u64>,
    pub population: Option<u64>,
    pub langservice: Option<String>,
    pub bank: Option<String>,
    pub website: Option<String>,
    pub acctname: Option<String>,
    pub acctno: Option<u64>,
    pub madrasah_name: Option<String>,
    pub madrasah_phone_no: Option<u64>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Option<LocationRequest>,
    pub photo: Option<String>,
    pub author: Option<UserId>,
}

impl CreateMasjidRequest {
    /// Validate the submission and build an unsaved entry with an empty slug.
    ///
    /// # Returns
    ///
    /// * `Ok(Masjid)` - Every required field is present and well formed
    /// * `Err(Vec<FieldError>)` - One error per failing field
    pub fn into_masjid(
        self,
        id: MasjidId,
        created: DateTime<Utc>,
    ) -> Result<Masjid, Vec<FieldError>> {
        let mut validator = Validator::new();

        let imam_phone_no = validator.required("imam_phone_no", self.imam_phone_no);
        let sec_phone_no = validator.required("sec_phone_no", self.sec_phone_no);
        let population = validator.required("population", self.population);
        let location = self.location.unwrap_or_default().build(&mut validator);
        let author = validator.required("author", self.author);

        let masjid = Masjid {
            id,
            name: trimmed(self.name),
            slug: String::new(),
            imam_name: trimmed(self.imam_name),
            imam_phone_no,
            sec_name: trimmed(self.sec_name),
            sec_phone_no,
            population,
            langservice: trimmed(self.langservice),
            bank: optional_text(self.bank),
            website: optional_text(self.website),
            acctname: optional_text(self.acctname),
            acctno: self.acctno,
            madrasah_name: optional_text(self.madrasah_name),
            madrasah_phone_no: self.madrasah_phone_no,
            description: optional_text(self.description),
            tags: self.tags,
            created,
            location,
            photo: optional_text(self.photo),
            author,
        };

        validator.check_masjid(&masjid);
        validator.finish()?;
        Ok(masjid)
    }
}

/// Partial update of an existing entry. `None` leaves a field untouched;
/// a blank string clears an optional text field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMasjidRequest {
    pub name: Option<String>,
    pub imam_name: Option<String>,
    pub imam_phone_no: Option<u64>,
    pub sec_name: Option<String>,
    pub sec_phone_no: Option<u64>,
    pub population: Option<u64>,
    pub langservice: Option<String>,
    pub bank: Option<String>,
    pub website: Option<String>,
    pub acctname: Option<String>,
    pub acctno: Option<u64>,
    pub madrasah_name: Option<String>,
    pub madrasah_phone_no: Option<u64>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<LocationRequest>,
    pub photo: Option<String>,
}

impl UpdateMasjidRequest {
    /// Apply the changes to `masjid` in place.
    ///
    /// Returns `true` when the name actually changed, which is what decides
    /// whether the slug has to be derived again.
    pub fn apply(self, masjid: &mut Masjid) -> bool {
        let mut name_changed = false;
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name != masjid.name {
                masjid.name = name;
                name_changed = true;
            }
        }

        if let Some(imam_name) = self.imam_name {
            masjid.imam_name = imam_name.trim().to_string();
        }
        if let Some(imam_phone_no) = self.imam_phone_no {
            masjid.imam_phone_no = imam_phone_no;
        }
        if let Some(sec_name) = self.sec_name {
            masjid.sec_name = sec_name.trim().to_string();
        }
        if let Some(sec_phone_no) = self.sec_phone_no {
            masjid.sec_phone_no = sec_phone_no;
        }
        if let Some(population) = self.population {
            masjid.population = population;
        }
        if let Some(langservice) = self.langservice {
            masjid.langservice = langservice.trim().to_string();
        }
        if self.bank.is_some() {
            masjid.bank = optional_text(self.bank);
        }
        if self.website.is_some() {
            masjid.website = optional_text(self.website);
        }
        if self.acctname.is_some() {
            masjid.acctname = optional_text(self.acctname);
        }
        if self.acctno.is_some() {
            masjid.acctno = self.acctno;
        }
        if self.madrasah_name.is_some() {
            masjid.madrasah_name = optional_text(self.madrasah_name);
        }
        if self.madrasah_phone_no.is_some() {
            masjid.madrasah_phone_no = self.madrasah_phone_no;
        }
        if self.description.is_some() {
            masjid.description = optional_text(self.description);
        }
        if let Some(tags) = self.tags {
            masjid.tags = tags;
        }
        if let Some(location) = self.location {
            location.merge_into(&mut masjid.location);
        }
        if self.photo.is_some() {
            masjid.photo = optional_text(self.photo);
        }

        name_changed
    }
}
