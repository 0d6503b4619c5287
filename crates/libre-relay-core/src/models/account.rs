use serde::Deserialize;

use super::GlucoseSample;

/// Response of the `account` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub data: AccountData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    pub user: AccountUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub country: Option<String>,
}

/// Response of `llu/connections`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionsResponse {
    #[serde(default)]
    pub data: Vec<Connection>,
}

/// A patient the account follows.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    pub id: Option<String>,
    #[serde(rename = "patientId")]
    pub patient_id: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(rename = "glucoseMeasurement")]
    pub glucose_measurement: Option<GlucoseSample>,
}
