//! Query expansion: the keyword × location cross product, keyword-major.

use bizdir_core::{InputError, SortMode};

use crate::types::SearchTask;

/// Expands keywords and locations into the full list of search tasks.
///
/// Order is keyword-major: every location for the first keyword, then every
/// location for the second, and so on. The same sort mode applies to all
/// tasks in a run.
///
/// # Errors
///
/// Returns [`InputError::EmptyKeywords`] or [`InputError::EmptyLocations`]
/// when either list is empty, and [`InputError::BlankEntry`] when an entry
/// is blank after trimming. Duplicate entries are not an error; the caller
/// gets the duplicate tasks it asked for.
pub fn expand_queries(
    keywords: &[String],
    locations: &[String],
    sort: SortMode,
) -> Result<Vec<SearchTask>, InputError> {
    if keywords.is_empty() {
        return Err(InputError::EmptyKeywords);
    }
    if locations.is_empty() {
        return Err(InputError::EmptyLocations);
    }
    for (index, keyword) in keywords.iter().enumerate() {
        if keyword.trim().is_empty() {
            return Err(InputError::BlankEntry {
                field: "keywords",
                index,
            });
        }
    }
    for (index, location) in locations.iter().enumerate() {
        if location.trim().is_empty() {
            return Err(InputError::BlankEntry {
                field: "locations",
                index,
            });
        }
    }

    let mut tasks = Vec::with_capacity(keywords.len() * locations.len());
    for keyword in keywords {
        for location in locations {
            tasks.push(SearchTask {
                keyword: keyword.trim().to_string(),
                location: location.trim().to_string(),
                sort,
            });
        }
    }
    Ok(tasks)
}
