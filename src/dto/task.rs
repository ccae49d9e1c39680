use crate::domain;
use crate::domain::task::TaskFilter;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{ValidationError, ValidationErrors};

/// Reads a deadline the way a JavaScript `Date` would for the two common shapes clients send:
/// a full RFC 3339 timestamp, or a bare `YYYY-MM-DD` date meaning midnight UTC.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Parses a submitted deadline, reporting failures against the `deadline` field
fn checked_deadline(raw: &str) -> Result<DateTime<Utc>, ValidationErrors> {
    parse_deadline(raw).ok_or_else(|| {
        let mut error = ValidationError::new("deadline");
        error.message = Some("expected an RFC 3339 timestamp or a YYYY-MM-DD date".into());
        error.add_param("value".into(), &raw);

        let mut errors = ValidationErrors::new();
        errors.add("deadline", error);
        errors
    })
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, PartialEq, Debug))]
pub struct Task {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Water the plants")]
    pub title: String,
    #[schema(example = "The ones on the balcony too")]
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub published: bool,
    #[schema(example = 4)]
    pub user_id: i32,
    #[schema(example = 1)]
    pub priority_id: i32,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            deadline: value.deadline,
            published: value.published,
            user_id: value.owner_user_id,
            priority_id: value.priority_id,
        }
    }
}

/// DTO for creating a new task via the API
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize, Debug))]
pub struct NewTask {
    #[schema(example = "Water the plants")]
    pub title: String,
    pub description: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` date
    #[schema(example = "2025-01-01")]
    pub deadline: String,
    /// Username of the task's owner
    #[schema(example = "alice")]
    pub user_username: String,
    /// Value of the priority to attach
    #[schema(example = 1)]
    pub priority: i32,
}

impl TryFrom<NewTask> for domain::task::NewTask {
    type Error = ValidationErrors;

    fn try_from(value: NewTask) -> Result<Self, Self::Error> {
        let deadline = checked_deadline(&value.deadline)?;

        Ok(domain::task::NewTask {
            title: value.title,
            description: value.description,
            deadline,
            owner_username: value.user_username,
            priority_value: value.priority,
        })
    }
}

/// DTO for changing a task's content via the API. Omitted fields are left alone.
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "2025-02-01T12:00:00Z")]
    pub deadline: Option<String>,
}

impl TryFrom<UpdateTask> for domain::task::TaskUpdate {
    type Error = ValidationErrors;

    fn try_from(value: UpdateTask) -> Result<Self, Self::Error> {
        let deadline = value.deadline.as_deref().map(checked_deadline).transpose()?;

        Ok(domain::task::TaskUpdate {
            title: value.title,
            description: value.description,
            deadline,
            published: None,
        })
    }
}

#[derive(Deserialize, Debug, Clone, Copy, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskSortField {
    Id,
    Deadline,
    Title,
}

#[derive(Deserialize, Debug, Clone, Copy, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Query string accepted by the task listing endpoints
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListParams {
    /// Number of tasks to skip
    pub skip: Option<u32>,
    /// Maximum number of tasks to return
    pub take: Option<u32>,
    /// ID of the task the page starts at
    pub cursor: Option<i32>,
    #[param(inline)]
    pub sort: Option<TaskSortField>,
    #[param(inline)]
    pub direction: Option<SortDirection>,
}

impl TaskListParams {
    pub fn into_query(self, filter: TaskFilter) -> domain::task::TaskQuery {
        let field = match self.sort {
            None | Some(TaskSortField::Id) => domain::task::TaskSortField::Id,
            Some(TaskSortField::Deadline) => domain::task::TaskSortField::Deadline,
            Some(TaskSortField::Title) => domain::task::TaskSortField::Title,
        };
        let direction = match self.direction {
            None | Some(SortDirection::Asc) => domain::task::SortDirection::Ascending,
            Some(SortDirection::Desc) => domain::task::SortDirection::Descending,
        };

        domain::task::TaskQuery {
            filter: Some(filter),
            skip: self.skip,
            take: self.take,
            cursor: self.cursor,
            order: domain::task::TaskOrder { field, direction },
        }
    }
}
