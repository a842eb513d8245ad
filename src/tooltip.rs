use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::map::TooltipCommand;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub description: String,
}

/// Travel data for one city
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AttractionRecord {
    pub city: String,
    pub attractions: Vec<Attraction>,
}

/// Read-only lookup of attraction records by exact city name
#[derive(Default)]
pub struct AttractionIndex {
    by_city: HashMap<String, Vec<Attraction>>,
}

impl AttractionIndex {
    /// First record wins when a city appears twice
    pub fn new(records: Vec<AttractionRecord>) -> Self {
        let mut by_city = HashMap::with_capacity(records.len());
        for record in records {
            by_city.entry(record.city).or_insert(record.attractions);
        }
        Self { by_city }
    }

    pub fn lookup(&self, city: &str) -> Option<&[Attraction]> {
        self.by_city.get(city).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_city.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_city.is_empty()
    }
}

/// What the tooltip panel shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TooltipContent {
    pub heading: String,
    pub entries: Vec<Attraction>,
}

/// Tooltip panel state; hidden when nothing is selected
#[derive(Default)]
pub struct Tooltip {
    content: Option<TooltipContent>,
}

impl Tooltip {
    pub fn apply(&mut self, command: TooltipCommand, index: &AttractionIndex) {
        self.content = match command {
            TooltipCommand::Show(name) => Some(Self::compose(name, index)),
            TooltipCommand::Hide => None,
        };
    }

    /// Rebuild the visible content, e.g. once travel data has loaded
    pub fn refresh(&mut self, index: &AttractionIndex) {
        if let Some(current) = self.content.take() {
            self.content = Some(Self::compose(current.heading, index));
        }
    }

    fn compose(heading: String, index: &AttractionIndex) -> TooltipContent {
        // A lookup miss shows the heading with an empty list
        let entries = match index.lookup(&heading) {
            Some(found) => found.to_vec(),
            None => {
                debug!(city = %heading, "no attractions for region");
                Vec::new()
            }
        };
        TooltipContent { heading, entries }
    }

    pub fn content(&self) -> Option<&TooltipContent> {
        self.content.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some()
    }
}
