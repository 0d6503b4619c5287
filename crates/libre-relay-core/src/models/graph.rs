use serde::Deserialize;

use super::GlucoseSample;

/// Response of `llu/connections/{id}/graph`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphResponse {
    pub data: GraphData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphData {
    pub connection: GraphConnection,
    /// Historic samples, oldest first
    #[serde(rename = "graphData")]
    pub graph_data: Vec<GlucoseSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConnection {
    #[serde(rename = "patientId")]
    pub patient_id: Option<String>,
    #[serde(rename = "glucoseItem")]
    pub glucose_item: GlucoseSample,
}

impl GraphResponse {
    pub fn series(&self) -> &[GlucoseSample] {
        &self.data.graph_data
    }

    /// Split into the latest reading and the historic series
    pub fn into_parts(self) -> (GlucoseSample, Vec<GlucoseSample>) {
        (self.data.connection.glucose_item, self.data.graph_data)
    }
}

/// Response of `llu/connections/{id}/logbook`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogbookResponse {
    #[serde(default)]
    pub data: Vec<GlucoseSample>,
}
