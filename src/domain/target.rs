use crate::domain::{Coordinate, Place};

/// The destination of a tracking session.
#[derive(Clone, PartialEq, Debug)]
pub struct Target {
    id: String,
    coordinate: Coordinate,
    name: Option<String>,
    reminder: Option<String>,
}

impl Target {
    pub fn new(id: String, coordinate: Coordinate) -> Self {
        Target {
            id,
            coordinate,
            name: None,
            reminder: None,
        }
    }

    /// An unsaved target picked by coordinate, identified by the coordinate itself.
    pub fn at(coordinate: Coordinate, name: Option<String>) -> Self {
        Target {
            id: coordinate.to_string(),
            coordinate,
            name,
            reminder: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_reminder(mut self, reminder: impl Into<String>) -> Self {
        self.reminder = Some(reminder.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn reminder(&self) -> Option<&str> {
        self.reminder.as_deref()
    }

    /// The name if there is one, the coordinate otherwise.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.coordinate.to_string())
    }
}

impl From<&Place> for Target {
    fn from(place: &Place) -> Self {
        Target {
            id: place.id.clone(),
            coordinate: place.location,
            name: Some(place.name.clone()),
            reminder: place.reminder.clone(),
        }
    }
}
