//! Time tracking tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{HalPayload, fetch_all, iso_hours};
use super::connection::NoParams;
use crate::domains::openproject::{BackendClient, BackendResult, FilterBuilder, Resource};
use crate::domains::tools::{ToolArgs, ToolError, ToolHandler, ToolResult};

fn parse_hours(args: &ToolArgs) -> ToolResult<Option<f64>> {
    match args.optional_f64("hours")? {
        Some(hours) if hours <= 0.0 => Err(ToolError::invalid("hours must be greater than 0")),
        hours => Ok(hours),
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTimeEntriesParams {
    pub work_package_id: Option<u64>,
    pub user_id: Option<u64>,
}

pub struct ListTimeEntriesTool;

#[async_trait]
impl ToolHandler for ListTimeEntriesTool {
    const NAME: &'static str = "list_time_entries";
    const DESCRIPTION: &'static str = "List time entries, optionally for one work package and/or one user.";

    type Params = ListTimeEntriesParams;

    fn parse(args: &ToolArgs) -> ToolResult<ListTimeEntriesParams> {
        Ok(ListTimeEntriesParams {
            work_package_id: args.optional_id("work_package_id")?,
            user_id: args.optional_id("user_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: ListTimeEntriesParams) -> BackendResult<Value> {
        let filters = FilterBuilder::new()
            .id("work_package", params.work_package_id)
            .id("user", params.user_id)
            .build();
        fetch_all(client, Resource::TimeEntries, filters).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTimeEntryParams {
    pub work_package_id: u64,
    /// Hours spent, e.g. 1.5.
    pub hours: f64,
    /// Date the time was spent (YYYY-MM-DD).
    pub spent_on: String,
    pub comment: Option<String>,
    pub activity_id: Option<u64>,
}

pub struct CreateTimeEntryTool;

#[async_trait]
impl ToolHandler for CreateTimeEntryTool {
    const NAME: &'static str = "create_time_entry";
    const DESCRIPTION: &'static str = "Log time spent on a work package.";

    type Params = CreateTimeEntryParams;

    fn parse(args: &ToolArgs) -> ToolResult<CreateTimeEntryParams> {
        Ok(CreateTimeEntryParams {
            work_package_id: args.required_id("work_package_id")?,
            hours: parse_hours(args)?.ok_or_else(|| ToolError::missing("hours"))?,
            spent_on: args.required_date("spent_on")?,
            comment: args.optional_str("comment")?,
            activity_id: args.optional_id("activity_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: CreateTimeEntryParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .field("hours", iso_hours(params.hours))
            .field("spentOn", params.spent_on)
            .formattable("comment", params.comment)
            .link("workPackage", Resource::WorkPackages, params.work_package_id)
            .optional_link("activity", Resource::TimeEntryActivities, params.activity_id);
        client.create(Resource::TimeEntries, payload.build()).await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateTimeEntryParams {
    pub time_entry_id: u64,
    pub hours: Option<f64>,
    pub spent_on: Option<String>,
    pub comment: Option<String>,
    pub activity_id: Option<u64>,
}

pub struct UpdateTimeEntryTool;

#[async_trait]
impl ToolHandler for UpdateTimeEntryTool {
    const NAME: &'static str = "update_time_entry";
    const DESCRIPTION: &'static str = "Update a time entry. Only the given fields change.";

    type Params = UpdateTimeEntryParams;

    fn parse(args: &ToolArgs) -> ToolResult<UpdateTimeEntryParams> {
        let params = UpdateTimeEntryParams {
            time_entry_id: args.required_id("time_entry_id")?,
            hours: parse_hours(args)?,
            spent_on: args.optional_date("spent_on")?,
            comment: args.optional_str("comment")?,
            activity_id: args.optional_id("activity_id")?,
        };
        if params.hours.is_none()
            && params.spent_on.is_none()
            && params.comment.is_none()
            && params.activity_id.is_none()
        {
            return Err(ToolError::invalid("no fields to update"));
        }
        Ok(params)
    }

    async fn execute(client: &dyn BackendClient, params: UpdateTimeEntryParams) -> BackendResult<Value> {
        let payload = HalPayload::new()
            .optional_field("hours", params.hours.map(iso_hours))
            .optional_field("spentOn", params.spent_on)
            .formattable("comment", params.comment)
            .optional_link("activity", Resource::TimeEntryActivities, params.activity_id);
        client
            .update(Resource::TimeEntries, params.time_entry_id, payload.build())
            .await
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimeEntryIdParams {
    pub time_entry_id: u64,
}

pub struct DeleteTimeEntryTool;

#[async_trait]
impl ToolHandler for DeleteTimeEntryTool {
    const NAME: &'static str = "delete_time_entry";
    const DESCRIPTION: &'static str = "Delete a time entry.";

    type Params = TimeEntryIdParams;

    fn parse(args: &ToolArgs) -> ToolResult<TimeEntryIdParams> {
        Ok(TimeEntryIdParams {
            time_entry_id: args.required_id("time_entry_id")?,
        })
    }

    async fn execute(client: &dyn BackendClient, params: TimeEntryIdParams) -> BackendResult<Value> {
        client.delete(Resource::TimeEntries, params.time_entry_id).await
    }
}

pub struct ListTimeEntryActivitiesTool;

#[async_trait]
impl ToolHandler for ListTimeEntryActivitiesTool {
    const NAME: &'static str = "list_time_entry_activities";
    const DESCRIPTION: &'static str =
        "List the activities a time entry can be booked on (use their ids as activity_id).";

    type Params = NoParams;

    fn parse(_args: &ToolArgs) -> ToolResult<NoParams> {
        Ok(NoParams {})
    }

    async fn execute(client: &dyn BackendClient, _params: NoParams) -> BackendResult<Value> {
        fetch_all(client, Resource::TimeEntryActivities, None).await
    }
}
