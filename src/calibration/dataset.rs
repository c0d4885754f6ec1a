use serde::{Deserialize, Serialize};

use crate::chart::{Chart, DynamicContext};
use crate::error::{Error, Result};
use crate::systems::sdk::ScoreBundle;

/// One labelled chart: what the pipeline should score it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub chart: Chart,
    #[serde(default)]
    pub context: Option<DynamicContext>,
    pub expected: ScoreBundle,
}

impl CalibrationCase {
    pub fn new(chart: Chart, context: Option<DynamicContext>, expected: ScoreBundle) -> Self {
        Self { label: None, chart, context, expected }
    }
}

/// Parse a JSON array of cases. An empty list is an error: there is
/// nothing to fit against.
pub fn load_cases(json: &str) -> Result<Vec<CalibrationCase>> {
    let cases: Vec<CalibrationCase> = serde_json::from_str(json)?;
    if cases.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok(cases)
}
