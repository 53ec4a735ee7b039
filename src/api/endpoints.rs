//! Endpoint catalogue for the booking backend
//!
//! The list endpoints are defined next to the invalidation table that evicts
//! them and re-exported here.

use std::fmt;
use std::str::FromStr;

use serde_json::{Value, json};

use super::{ApiService, RequestOptions};
use crate::cache::RequestKey;
use crate::client::Transport;
use crate::error::Result;

pub use crate::cache::invalidation::{
    ALL_DEPARTMENTS, ALL_EMPLOYEES, ALL_HALLS, ALL_SCHOOLS, APPROVALS, CONFLICTS, MY_REQUESTS,
};

/// Administrable collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Hall,
    Employee,
    School,
    Department,
    Booking,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Hall,
        Resource::Employee,
        Resource::School,
        Resource::Department,
        Resource::Booking,
    ];

    /// Path segment all endpoints of this resource live under
    pub fn prefix(&self) -> &'static str {
        match self {
            Resource::Hall => "api/hall",
            Resource::Employee => "api/employee",
            Resource::School => "api/school",
            Resource::Department => "api/department",
            Resource::Booking => "api/booking",
        }
    }

    /// The list view read for this resource.
    ///
    /// Bookings are listed per requester.
    pub fn list_endpoint(&self) -> &'static str {
        match self {
            Resource::Hall => ALL_HALLS,
            Resource::Employee => ALL_EMPLOYEES,
            Resource::School => ALL_SCHOOLS,
            Resource::Department => ALL_DEPARTMENTS,
            Resource::Booking => MY_REQUESTS,
        }
    }

    pub fn item_endpoint(&self, id: &str) -> String {
        format!("{}/{}", self.prefix(), id)
    }

    pub fn create_endpoint(&self) -> String {
        format!("{}/create", self.prefix())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Hall => "hall",
            Resource::Employee => "employee",
            Resource::School => "school",
            Resource::Department => "department",
            Resource::Booking => "booking",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let wanted = wanted.strip_suffix('s').unwrap_or(&wanted);
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown resource '{}' (expected one of: hall, employee, school, department, booking)",
                    s
                )
            })
    }
}

/// Which approval queue to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalFilter {
    #[default]
    All,
    Internal,
    Forward,
    External,
}

impl ApprovalFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalFilter::All => "all",
            ApprovalFilter::Internal => "internal",
            ApprovalFilter::Forward => "forward",
            ApprovalFilter::External => "external",
        }
    }

    pub fn endpoint(&self) -> RequestKey {
        RequestKey::with_query(APPROVALS, &[("filter", self.as_str())])
    }
}

impl fmt::Display for ApprovalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ApprovalFilter::All),
            "internal" => Ok(ApprovalFilter::Internal),
            "forward" => Ok(ApprovalFilter::Forward),
            "external" => Ok(ApprovalFilter::External),
            other => Err(format!(
                "unknown approval filter '{}' (expected all, internal, forward or external)",
                other
            )),
        }
    }
}

/// Resource-level calls used by the admin views
impl<T: Transport> ApiService<T> {
    pub async fn list(&self, resource: Resource) -> Result<Option<Value>> {
        self.get(resource.list_endpoint()).await
    }

    pub async fn fetch(&self, resource: Resource, id: &str) -> Result<Option<Value>> {
        self.get(&resource.item_endpoint(id)).await
    }

    pub async fn create(&self, resource: Resource, body: Value) -> Result<Option<Value>> {
        self.post(&resource.create_endpoint(), body).await
    }

    pub async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Option<Value>> {
        self.patch(&resource.item_endpoint(id), body).await
    }

    pub async fn remove(&self, resource: Resource, id: &str) -> Result<Option<Value>> {
        self.delete(&resource.item_endpoint(id)).await
    }

    pub async fn my_requests(&self) -> Result<Option<Value>> {
        self.get(MY_REQUESTS).await
    }

    pub async fn approvals(&self, filter: ApprovalFilter) -> Result<Option<Value>> {
        self.get(filter.endpoint().as_str()).await
    }

    pub async fn conflicts(&self) -> Result<Option<Value>> {
        self.get(CONFLICTS).await
    }

    /// Bookings of one hall, for the calendar view
    pub async fn hall_bookings(&self, hall_id: &str) -> Result<Option<Value>> {
        self.get(&format!("api/booking/hall/{}", hall_id)).await
    }

    pub async fn hall_conflicts(&self, hall_id: &str) -> Result<Option<Value>> {
        self.get(&format!("{}/hall/{}", CONFLICTS, hall_id)).await
    }

    pub async fn user_conflicts(&self, user_id: &str) -> Result<Option<Value>> {
        self.get(&format!("{}/user/{}", CONFLICTS, user_id)).await
    }

    pub async fn approve_booking(&self, booking_id: &str) -> Result<Option<Value>> {
        self.request(
            &format!("api/booking/{}/approve", booking_id),
            RequestOptions::put(),
        )
        .await
    }

    pub async fn reject_booking(
        &self,
        booking_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<Value>> {
        let mut options = RequestOptions::put();
        if let Some(reason) = reason {
            options = options.body(json!({ "reason": reason }));
        }
        self.request(&format!("api/booking/{}/reject", booking_id), options)
            .await
    }

    /// Pass a booking on to the next approver
    pub async fn forward_booking(&self, booking_id: &str) -> Result<Option<Value>> {
        self.request(
            &format!("api/booking/{}/forward", booking_id),
            RequestOptions::put(),
        )
        .await
    }
}
