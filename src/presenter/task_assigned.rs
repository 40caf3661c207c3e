//! Task-assigned overlay

use serde_json::json;

use super::{Navigation, NotificationView, TASKS_PATH};
use crate::types::{Category, TaskAssignedData};

pub struct TaskAssignedView;

impl NotificationView for TaskAssignedView {
    type Data = TaskAssignedData;

    const CATEGORY: Category = Category::TaskAssigned;

    fn title(&self) -> &'static str {
        "Task assigned"
    }

    fn message(&self, data: &TaskAssignedData) -> String {
        format!(
            "{} assigned you a task: {}",
            data.assigned_by.display_name(),
            data.task_name
        )
    }

    fn destination(&self, data: &TaskAssignedData) -> Navigation {
        Navigation::to(TASKS_PATH).with_state(json!({
            "selectTask": data.task_id,
            "taskName": data.task_name,
        }))
    }
}
