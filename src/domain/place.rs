use crate::domain::Coordinate;
use serde::Deserialize;

/// A saved destination the user can pick as tracking target.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    #[serde(default)]
    pub reminder: Option<String>,
}
