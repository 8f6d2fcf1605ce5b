//! Course-level operations against Moodle's internal endpoints.
//!
//! Everything here is thin request/response glue: one call, one purpose, no
//! retries, no protocol state beyond the session key scraped at connect
//! time. Mutations go through the same inplace-editable AJAX endpoint the
//! web UI uses, so the reused browser session is all the authorization
//! needed.

use std::collections::HashSet;

use log::{debug, info};
use regex::Regex;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, SessionError};
use crate::firefox;
use crate::participants::{parse_participants_table, value_as_group_id, GroupOption, Participant};

/// Options for [`MoodleCourse::connect_with_options`].
#[derive(Debug, Clone, Default)]
pub struct CourseOptions {
    /// Report what would change without posting any mutation.
    pub dry_run: bool,
}

/// Which feedback plugin serves the offline grading worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPlugin {
    /// The stock offline-grading plugin.
    Offline,
    /// The University of Bath variant of the plugin.
    OfflineBath,
}

impl FeedbackPlugin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::OfflineBath => "offline_bath",
        }
    }
}

/// A connected course: an authenticated client, the scraped session key,
/// and the participant/group caches filled by [`fetch_participants`].
///
/// [`fetch_participants`]: MoodleCourse::fetch_participants
pub struct MoodleCourse {
    client: Client,
    server: String,
    course_id: u64,
    sesskey: String,
    dry_run: bool,
    groups: Vec<GroupOption>,
    participants: Vec<Participant>,
}

/// Connect to the course at `server` with cookies taken from the local
/// Firefox session. The scheme prefix is stripped to get the cookie host.
pub fn connect_via_firefox(server: &str, course_id: u64) -> Result<MoodleCourse> {
    connect_via_firefox_with_options(server, course_id, &CourseOptions::default())
}

/// [`connect_via_firefox`] with explicit [`CourseOptions`].
pub fn connect_via_firefox_with_options(
    server: &str,
    course_id: u64,
    options: &CourseOptions,
) -> Result<MoodleCourse> {
    let client = firefox::client_for_host(host_from_server(server))?;
    MoodleCourse::connect_with_options(client, server, course_id, options)
}

impl MoodleCourse {
    /// Connect an already-cookied client to a course.
    ///
    /// Fetches the course front page once to scrape the session key that all
    /// AJAX and form endpoints demand.
    ///
    /// # Errors
    ///
    /// Fails when the front page cannot be fetched or does not carry exactly
    /// one `M.cfg` declaration with a session key.
    pub fn connect(client: Client, server: &str, course_id: u64) -> Result<Self> {
        Self::connect_with_options(client, server, course_id, &CourseOptions::default())
    }

    /// [`connect`](Self::connect) with explicit [`CourseOptions`].
    pub fn connect_with_options(
        client: Client,
        server: &str,
        course_id: u64,
        options: &CourseOptions,
    ) -> Result<Self> {
        let server = server.trim_end_matches('/').to_string();
        let body = client.get(server.as_str()).send()?.error_for_status()?.text()?;
        let sesskey = extract_session_key(&body)?;
        debug!("connected to {server} course {course_id}");
        Ok(Self {
            client,
            server,
            course_id,
            sesskey,
            dry_run: options.dry_run,
            groups: Vec::new(),
            participants: Vec::new(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn course_id(&self) -> u64 {
        self.course_id
    }

    /// Group options seen in the participants table. Empty until
    /// [`fetch_participants`](Self::fetch_participants) ran.
    pub fn groups(&self) -> &[GroupOption] {
        &self.groups
    }

    /// Cached participant rows. Empty until
    /// [`fetch_participants`](Self::fetch_participants) ran.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Fetch the participants table and refresh the group and participant
    /// caches.
    ///
    /// Uses the dynamic-table AJAX endpoint with a page size large enough to
    /// get every enrolment in one reply.
    pub fn fetch_participants(&mut self) -> Result<()> {
        let body = json!([{
            "index": 0,
            "methodname": "core_table_get_dynamic_table_content",
            "args": {
                "component": "core_user",
                "handler": "participants",
                "uniqueid": format!("user-index-participants-{}", self.course_id),
                "sortdata": [
                    {"sortby": "lastname", "sortorder": 3},
                    {"sortby": "lastname", "sortorder": 4},
                ],
                "jointype": 1,
                "filters": {
                    "courseid": {
                        "name": "courseid",
                        "jointype": 1,
                        "values": [self.course_id],
                    },
                },
                "firstinitial": "",
                "lastinitial": "",
                "pagenumber": "1",
                "pagesize": "5000",
                "hiddencolumns": [],
                "resetpreferences": false,
            },
        }]);
        let data = self.ajax_call("core_table_get_dynamic_table_content", &body)?;
        let html = data
            .get("html")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SessionError::Scrape("table reply carries no html".into()))?;
        let (groups, participants) = parse_participants_table(html)?;
        info!(
            "fetched {} participant(s) across {} group option(s)",
            participants.len(),
            groups.len()
        );
        self.groups = groups;
        self.participants = participants;
        Ok(())
    }

    /// The id of the group named `name`.
    pub fn group_id_by_name(&self, name: &str) -> Result<i64> {
        self.groups
            .iter()
            .find(|g| g.value == name)
            .map(|g| g.key)
            .ok_or_else(|| SessionError::UnknownGroup(name.to_string()))
    }

    /// The cached participant row for `email`.
    pub fn participant_by_email(&self, email: &str) -> Result<&Participant> {
        self.participants
            .iter()
            .find(|p| p.email == email)
            .ok_or_else(|| SessionError::UnknownParticipant(email.to_string()))
    }

    /// Replace a participant's group membership with exactly `group_names`.
    ///
    /// No-op (returns `false`) when the membership already matches, and in
    /// dry-run mode after reporting the diff. Returns `true` when an update
    /// was posted and verified.
    pub fn set_participant_groups(&self, email: &str, group_names: &[&str]) -> Result<bool> {
        let desired = group_names
            .iter()
            .map(|name| self.group_id_by_name(name))
            .collect::<Result<Vec<_>>>()?;
        let participant = self.participant_by_email(email)?;
        self.apply_group_update(participant, desired)
    }

    /// Remove and add groups by name, keeping the rest of the membership.
    pub fn modify_participant_groups(
        &self,
        email: &str,
        remove: &[&str],
        add: &[&str],
    ) -> Result<bool> {
        let remove_ids = remove
            .iter()
            .map(|name| self.group_id_by_name(name))
            .collect::<Result<Vec<_>>>()?;
        let add_ids = add
            .iter()
            .map(|name| self.group_id_by_name(name))
            .collect::<Result<Vec<_>>>()?;
        let participant = self.participant_by_email(email)?;
        let desired = merge_group_ids(&participant.groups, &remove_ids, &add_ids);
        self.apply_group_update(participant, desired)
    }

    fn apply_group_update(&self, participant: &Participant, desired: Vec<i64>) -> Result<bool> {
        if same_membership(&participant.groups, &desired) {
            return Ok(false);
        }
        info!(
            "{} <{}>: current {:?}, desired {:?}",
            participant.user_id, participant.email, participant.groups, desired
        );
        self.log_group_diff(&participant.groups, &desired);
        if self.dry_run {
            return Ok(false);
        }
        self.post_group_update(participant.user_id, &desired)?;
        Ok(true)
    }

    fn log_group_diff(&self, before: &[i64], after: &[i64]) {
        for option in &self.groups {
            if before.contains(&option.key) && !after.contains(&option.key) {
                info!("    - {} ({})", option.key, option.value);
            }
        }
        for option in &self.groups {
            if after.contains(&option.key) && !before.contains(&option.key) {
                info!("    + {} ({})", option.key, option.value);
            }
        }
    }

    fn post_group_update(&self, user_id: u64, group_ids: &[i64]) -> Result<()> {
        // The editable endpoint wants the membership as a JSON array of
        // strings, and echoes the applied value back.
        let value = serde_json::to_string(
            &group_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        )?;
        let body = json!([{
            "index": 0,
            "methodname": "core_update_inplace_editable",
            "args": {
                "component": "core_group",
                "itemid": format!("{}:{}", self.course_id, user_id),
                "itemtype": "user_groups",
                "value": value,
            },
        }]);
        let data = self.ajax_call("core_update_inplace_editable", &body)?;
        let echoed = data
            .get("value")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SessionError::Scrape("group update reply carries no value".into()))?;
        let echoed: Vec<serde_json::Value> = serde_json::from_str(echoed)?;
        let echoed = echoed
            .iter()
            .map(value_as_group_id)
            .collect::<Result<Vec<_>>>()?;
        if echoed != group_ids {
            return Err(SessionError::UpdateNotApplied { user_id });
        }
        Ok(())
    }

    /// Download the course grade book as CSV text via the grade export form.
    pub fn export_grades(&self) -> Result<String> {
        // The export form addresses grade items by their internal ids, not
        // the ids visible in activity URLs, so everything is exported and
        // the caller picks columns.
        let form: Vec<(&str, String)> = vec![
            ("id", self.course_id.to_string()),
            ("sesskey", self.sesskey.clone()),
            ("mform_isexpanded_id_gradeitems", "1".into()),
            ("checkbox_controller1", "0".into()),
            ("mform_isexpanded_id_options", "1".into()),
            ("_qf__grade_export_form", "1".into()),
            ("export_feedback", "0".into()),
            ("export_onlyactive", "0".into()),
            ("export_onlyactive", "1".into()),
            ("display[real]", "0".into()),
            ("display[real]", "1".into()),
            ("display[percentage]", "0".into()),
            ("display[letter]", "0".into()),
            ("decimals", "2".into()),
            ("separator", "comma".into()),
            ("submitbutton", "Download".into()),
        ];
        let text = self
            .client
            .post(format!("{}/grade/export/txt/export.php", self.server))
            .form(&form)
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }

    /// Download an assignment's offline grading worksheet.
    pub fn grading_worksheet(&self, assignment_id: u64, plugin: FeedbackPlugin) -> Result<String> {
        let text = self
            .client
            .get(format!("{}/mod/assign/view.php", self.server))
            .query(&[
                ("id", assignment_id.to_string()),
                ("plugin", plugin.as_str().to_string()),
                ("pluginsubtype", "assignfeedback".to_string()),
                ("action", "viewpluginpage".to_string()),
                ("pluginaction", "downloadgrades".to_string()),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }

    /// Download a group-choice activity's report as text.
    pub fn group_choice_report(&self, choice_id: u64) -> Result<String> {
        let form: Vec<(&str, String)> = vec![
            ("id", choice_id.to_string()),
            ("download", "txt".into()),
        ];
        let text = self
            .client
            .post(format!("{}/mod/choicegroup/report.php", self.server))
            .form(&form)
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }

    /// POST one call to the AJAX service and unwrap its single-reply
    /// envelope.
    fn ajax_call(&self, info: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let replies: Vec<AjaxReply> = self
            .client
            .post(format!("{}/lib/ajax/service.php", self.server))
            .query(&[("sesskey", self.sesskey.as_str()), ("info", info)])
            .json(body)
            .send()?
            .error_for_status()?
            .json()?;
        unwrap_reply(replies)
    }
}

/// One element of the AJAX service's reply array.
#[derive(Debug, Deserialize)]
struct AjaxReply {
    error: bool,
    #[serde(default)]
    exception: Option<AjaxException>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AjaxException {
    #[serde(default)]
    errorcode: String,
    #[serde(default)]
    message: String,
}

fn unwrap_reply(mut replies: Vec<AjaxReply>) -> Result<serde_json::Value> {
    if replies.len() != 1 {
        return Err(SessionError::Scrape(format!(
            "expected one AJAX reply, got {}",
            replies.len()
        )));
    }
    let reply = replies.remove(0);
    if reply.error {
        let (code, message) = reply
            .exception
            .map(|e| (e.errorcode, e.message))
            .unwrap_or_else(|| ("unknown".into(), "unreported platform error".into()));
        return Err(SessionError::Platform { code, message });
    }
    reply
        .data
        .ok_or_else(|| SessionError::Scrape("AJAX reply carries no data".into()))
}

/// Scrape the session key from the single `M.cfg = {...};` declaration the
/// platform inlines into every page.
fn extract_session_key(body: &str) -> Result<String> {
    let cfg_line = Regex::new(r"(?m)^M\.cfg = *(.*?);").unwrap();
    let declarations: Vec<String> = cfg_line
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    let declaration = match declarations.as_slice() {
        [] => return Err(SessionError::MissingSessionKey),
        [one] => one,
        _ => {
            return Err(SessionError::Scrape(
                "multiple M.cfg declarations on page".into(),
            ));
        }
    };
    let config: serde_json::Value = serde_json::from_str(declaration)?;
    config
        .get("sesskey")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or(SessionError::MissingSessionKey)
}

/// The cookie host for a server URL: the URL minus its scheme prefix.
fn host_from_server(server: &str) -> &str {
    let server = server.trim_end_matches('/');
    server
        .strip_prefix("https://")
        .or_else(|| server.strip_prefix("http://"))
        .unwrap_or(server)
}

/// Drop `remove`, keep the rest in order, append new ids from `add`.
fn merge_group_ids(current: &[i64], remove: &[i64], add: &[i64]) -> Vec<i64> {
    let mut merged: Vec<i64> = current
        .iter()
        .copied()
        .filter(|id| !remove.contains(id))
        .collect();
    for id in add {
        if !merged.contains(id) {
            merged.push(*id);
        }
    }
    merged
}

/// Membership comparison ignores order and duplicates.
fn same_membership(a: &[i64], b: &[i64]) -> bool {
    let a: HashSet<i64> = a.iter().copied().collect();
    let b: HashSet<i64> = b.iter().copied().collect();
    a == b
}
