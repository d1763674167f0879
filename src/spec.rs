//! Declarative chart specification
//!
//! The intermediate, renderer-independent description returned verbatim
//! when the caller asks for the `option` output type:
//!
//! ```json
//! {
//!   "data": [{ "values": [ ...records ] }],
//!   "view": { "main": { "layers": [{ "type": "bar", "encoding": { "x": "...", "y": "..." } }] } }
//! }
//! ```

use crate::data::RecordSet;
use crate::error::ChartResult;
use crate::ir::{ChartKind, Encoding};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpecification {
    pub data: Vec<DataSource>,
    pub view: View,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    pub values: RecordSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub main: MainView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainView {
    pub layers: Vec<SpecLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecLayer {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub encoding: Encoding,
}

impl ChartSpecification {
    /// Single-layer specification echoing the records and the encoding as given.
    pub fn new(kind: ChartKind, data: &RecordSet, encoding: &Encoding) -> Self {
        let encoding = encoding.clone();
        Self {
            data: vec![DataSource {
                values: data.clone(),
            }],
            view: View {
                main: MainView {
                    layers: vec![SpecLayer { kind, encoding }],
                },
            },
        }
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
