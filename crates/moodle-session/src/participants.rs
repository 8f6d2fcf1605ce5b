//! Parsing of the participants table fragment.
//!
//! The `core_table_get_dynamic_table_content` AJAX call answers with an HTML
//! fragment, not data. Per row: a checkbox whose id carries the user id, the
//! email, the group-membership editable (JSON stashed in `data-options` /
//! `data-value` attributes), and the "last access" column that feeds the
//! [`lateness`] parser.

use log::debug;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SessionError};

/// The literal the platform shows for accounts that never signed in.
pub const NEVER_SENTINEL: &str = "Never";

/// One selectable group, as offered by the membership editable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupOption {
    /// The group id. The platform serializes ids as numbers in some payloads
    /// and as numeric strings in others; both decode here.
    #[serde(deserialize_with = "deserialize_group_id")]
    pub key: i64,
    /// The human-readable group name.
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct GroupOptionsAttr {
    options: Vec<GroupOption>,
}

/// One row of the participants table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub user_id: u64,
    pub email: String,
    /// Ids of the groups the participant currently belongs to.
    pub groups: Vec<i64>,
    /// The "last access" column text as shown, e.g. `"2 days 3 hours"` or
    /// `"Never"`.
    pub last_access: String,
    /// Elapsed seconds since last access; [`f64::INFINITY`] for
    /// [`NEVER_SENTINEL`].
    pub seconds_since_last_access: f64,
}

/// Convert a "last access" cell text to elapsed seconds.
///
/// The [`NEVER_SENTINEL`] maps to [`f64::INFINITY`]; anything else gets the
/// `" late"` suffix the grammar requires and goes through
/// [`lateness::parse`].
pub fn parse_last_access(text: &str) -> Result<f64> {
    if text == NEVER_SENTINEL {
        return Ok(f64::INFINITY);
    }
    let parsed =
        lateness::parse(&format!("{text} late")).map_err(|source| SessionError::LastAccess {
            text: text.to_string(),
            source,
        })?;
    Ok(parsed.total_seconds)
}

/// Parse the participants table fragment into the group options and the
/// participant rows.
///
/// Rows whose first cell carries no checkbox (spacer and footer rows) are
/// skipped. The group options must agree across all rows.
///
/// # Errors
///
/// Fails when the fragment has no table, a row deviates from the expected
/// column layout, the embedded group JSON does not decode, or a last-access
/// cell neither equals [`NEVER_SENTINEL`] nor parses as an elapsed time.
pub fn parse_participants_table(html: &str) -> Result<(Vec<GroupOption>, Vec<Participant>)> {
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tbody > tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let checkbox_sel = Selector::parse("input").unwrap();
    let editable_sel = Selector::parse("span[data-options]").unwrap();

    let doc = Html::parse_fragment(html);
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| SessionError::Scrape("participants fragment has no table".into()))?;

    let mut group_options: Option<Vec<GroupOption>> = None;
    let mut participants = Vec::new();

    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        let Some(first) = cells.first() else {
            continue;
        };
        let Some(checkbox) = first.select(&checkbox_sel).next() else {
            continue;
        };

        // Column 1 -- the user id, encoded in the checkbox id
        let id_attr = checkbox
            .value()
            .attr("id")
            .ok_or_else(|| SessionError::Scrape("participant checkbox has no id".into()))?;
        let user_id = id_attr
            .strip_prefix("user")
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| {
                SessionError::Scrape(format!("unexpected participant checkbox id {id_attr:?}"))
            })?;

        if cells.len() < 5 {
            return Err(SessionError::Scrape(format!(
                "participant row for user {user_id} has {} cell(s), expected at least 5",
                cells.len()
            )));
        }

        // Column 2 -- email
        let email = stripped_text(cells[1]);

        // Column 4 -- group membership editable
        let editable = cells[3].select(&editable_sel).next().ok_or_else(|| {
            SessionError::Scrape(format!("no group editable for user {user_id}"))
        })?;
        let options_attr = editable.value().attr("data-options").unwrap_or_default();
        let options: GroupOptionsAttr = serde_json::from_str(options_attr)?;
        match &group_options {
            None => group_options = Some(options.options),
            Some(existing) if *existing == options.options => {}
            Some(_) => {
                return Err(SessionError::Scrape(
                    "group options differ between participant rows".into(),
                ));
            }
        }
        let value_attr = editable
            .value()
            .attr("data-value")
            .ok_or_else(|| SessionError::Scrape(format!("no group value for user {user_id}")))?;
        let raw_ids: Vec<serde_json::Value> = serde_json::from_str(value_attr)?;
        let groups = raw_ids
            .iter()
            .map(value_as_group_id)
            .collect::<Result<Vec<_>>>()?;

        // Column 5 -- last access
        let last_access = stripped_text(cells[4]);
        let seconds_since_last_access = parse_last_access(&last_access)?;

        participants.push(Participant {
            user_id,
            email,
            groups,
            last_access,
            seconds_since_last_access,
        });
    }

    debug!("parsed {} participant row(s)", participants.len());
    Ok((group_options.unwrap_or_default(), participants))
}

/// A group id, whichever way the platform serialized it.
pub(crate) fn value_as_group_id(value: &serde_json::Value) -> Result<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| SessionError::Scrape(format!("group id {n} is not an integer"))),
        serde_json::Value::String(s) => s
            .parse()
            .map_err(|_| SessionError::Scrape(format!("group id {s:?} is not an integer"))),
        other => Err(SessionError::Scrape(format!(
            "group id {other} is neither a number nor a string"
        ))),
    }
}

fn deserialize_group_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_as_group_id(&value).map_err(serde::de::Error::custom)
}

/// Concatenate the element's text nodes with each node's outer whitespace
/// stripped, skipping whitespace-only nodes.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
