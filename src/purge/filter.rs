//! Selection of purge-eligible tags

use crate::error::Result;
use crate::registry::api::TagAttributes;
use chrono::{DateTime, Utc};
use regex::Regex;

/// Decides which tags of a page are condemned.
///
/// A tag is eligible when its name matches the filter (if any) and it was last
/// updated strictly before the cutoff. The filter is compiled once, up front.
#[derive(Debug, Clone)]
pub struct TagSelector {
    pattern: Option<Regex>,
    cutoff: DateTime<Utc>,
}

impl TagSelector {
    pub fn new(filter: Option<&str>, cutoff: DateTime<Utc>) -> Result<Self> {
        let pattern = filter
            .filter(|f| !f.is_empty())
            .map(Regex::new)
            .transpose()?;
        Ok(Self { pattern, cutoff })
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn is_eligible(&self, tag: &TagAttributes) -> bool {
        let name_matches = self
            .pattern
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(&tag.name));
        name_matches && tag.last_update_time < self.cutoff
    }

    pub fn select<'a>(&self, page: &'a [TagAttributes]) -> Vec<&'a TagAttributes> {
        page.iter().filter(|tag| self.is_eligible(tag)).collect()
    }
}
