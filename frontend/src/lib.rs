pub mod api;

use std::collections::HashSet;

use sauron::{
    html::{attributes, attributes::*, *},
    prelude::*,
};
use shared::{
    CreateTaskRequest, MonthlyAnalytics, Task, TaskPriority, TaskStatus, UpdateTaskRequest,
};
use uuid::Uuid;
use web_sys::{console, window};

use api::{ApiClient, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Tasks,
    Analytics,
}

impl Page {
    fn to_path(self) -> &'static str {
        match self {
            Page::Dashboard => "/",
            Page::Tasks => "/tasks",
            Page::Analytics => "/analytics",
        }
    }

    fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/tasks" => Page::Tasks,
            "/analytics" => Page::Analytics,
            _ => Page::Dashboard,
        }
    }
}

/// Where a task moves when its board's action button is pressed.
pub fn next_status(status: TaskStatus) -> Option<TaskStatus> {
    match status {
        TaskStatus::Upcoming => Some(TaskStatus::InProgress),
        TaskStatus::InProgress => Some(TaskStatus::Completed),
        TaskStatus::Completed => None,
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    NavigateTo(Page),

    LoadTasks,
    TasksLoaded(Vec<Task>),
    SetNewTaskName(String),
    SetNewTaskDescription(String),
    SetNewTaskPriority(TaskPriority),
    CreateTask,
    TaskCreated(Task),
    AdvanceTask(Uuid),
    TaskUpdated(Task),
    DeleteTask(Uuid),
    TaskDeleted(Uuid),

    LoadAnalytics,
    AnalyticsLoaded(Vec<MonthlyAnalytics>),

    /// A failed request; `Some(id)` clears that task's pending flag.
    Failed(Option<Uuid>, ApiError),
    DismissError,
}

#[derive(Debug, Clone)]
pub struct Model {
    api: ApiClient,
    current_page: Page,
    tasks: Vec<Task>,
    analytics: Vec<MonthlyAnalytics>,
    new_task_name: String,
    new_task_description: String,
    new_task_priority: TaskPriority,
    loading: bool,
    error: Option<String>,
    pending_tasks: HashSet<Uuid>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            api: ApiClient::default(),
            current_page: Page::Dashboard,
            tasks: Vec::new(),
            analytics: Vec::new(),
            new_task_name: String::new(),
            new_task_description: String::new(),
            new_task_priority: TaskPriority::default(),
            loading: false,
            error: None,
            pending_tasks: HashSet::new(),
        }
    }
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        if let Some(pathname) = window().and_then(|w| w.location().pathname().ok()) {
            self.current_page = Page::from_path(&pathname);
        }

        if self.current_page == Page::Analytics {
            Cmd::batch(vec![
                Cmd::new(async { Msg::LoadTasks }),
                Cmd::new(async { Msg::LoadAnalytics }),
            ])
        } else {
            Cmd::new(async { Msg::LoadTasks })
        }
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::NavigateTo(page) => {
                self.current_page = page;

                if let Some(history) = window().and_then(|w| w.history().ok()) {
                    let _ = history.push_state_with_url(
                        &wasm_bindgen::JsValue::NULL,
                        "",
                        Some(page.to_path()),
                    );
                }

                if page == Page::Analytics && self.analytics.is_empty() {
                    Cmd::new(async { Msg::LoadAnalytics })
                } else {
                    Cmd::none()
                }
            }
            Msg::LoadTasks => {
                self.loading = true;
                let api = self.api.clone();
                Cmd::new(async move {
                    match api.list_tasks(None).await {
                        Ok(tasks) => Msg::TasksLoaded(tasks),
                        Err(e) => Msg::Failed(None, e),
                    }
                })
            }
            Msg::TasksLoaded(tasks) => {
                self.tasks = tasks;
                self.loading = false;
                Cmd::none()
            }
            Msg::SetNewTaskName(name) => {
                self.new_task_name = name;
                Cmd::none()
            }
            Msg::SetNewTaskDescription(description) => {
                self.new_task_description = description;
                Cmd::none()
            }
            Msg::SetNewTaskPriority(priority) => {
                self.new_task_priority = priority;
                Cmd::none()
            }
            Msg::CreateTask => {
                if self.new_task_name.trim().is_empty() {
                    self.error = Some("Task name is required".to_string());
                    return Cmd::none();
                }

                let mut input = CreateTaskRequest::new(std::mem::take(&mut self.new_task_name));
                let description = std::mem::take(&mut self.new_task_description);
                if !description.trim().is_empty() {
                    input.description = Some(description);
                }
                input.priority = Some(self.new_task_priority);
                self.new_task_priority = TaskPriority::default();

                let api = self.api.clone();
                Cmd::new(async move {
                    match api.create_task(&input).await {
                        Ok(task) => Msg::TaskCreated(task),
                        Err(e) => Msg::Failed(None, e),
                    }
                })
            }
            Msg::TaskCreated(task) => {
                self.tasks.push(task);
                Cmd::none()
            }
            Msg::AdvanceTask(id) => {
                let Some(status) = self
                    .tasks
                    .iter()
                    .find(|t| t.id == id)
                    .and_then(|t| next_status(t.status))
                else {
                    return Cmd::none();
                };
                if !self.pending_tasks.insert(id) {
                    return Cmd::none();
                }

                let api = self.api.clone();
                Cmd::new(async move {
                    match api.update_task(id, &UpdateTaskRequest::status(status)).await {
                        Ok(task) => Msg::TaskUpdated(task),
                        Err(e) => Msg::Failed(Some(id), e),
                    }
                })
            }
            Msg::TaskUpdated(updated) => {
                self.pending_tasks.remove(&updated.id);
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == updated.id) {
                    *task = updated;
                }
                Cmd::none()
            }
            Msg::DeleteTask(id) => {
                let confirmed = window()
                    .and_then(|w| {
                        w.confirm_with_message("Are you sure you want to delete this task?")
                            .ok()
                    })
                    .unwrap_or(false);
                if !confirmed || !self.pending_tasks.insert(id) {
                    return Cmd::none();
                }

                let api = self.api.clone();
                Cmd::new(async move {
                    match api.delete_task(id).await {
                        Ok(()) => Msg::TaskDeleted(id),
                        Err(e) => Msg::Failed(Some(id), e),
                    }
                })
            }
            Msg::TaskDeleted(id) => {
                self.tasks.retain(|t| t.id != id);
                self.pending_tasks.remove(&id);
                Cmd::none()
            }
            Msg::LoadAnalytics => {
                self.loading = true;
                let api = self.api.clone();
                Cmd::new(async move {
                    match api.monthly_analytics().await {
                        Ok(rows) => Msg::AnalyticsLoaded(rows),
                        Err(e) => Msg::Failed(None, e),
                    }
                })
            }
            Msg::AnalyticsLoaded(rows) => {
                self.analytics = rows;
                self.loading = false;
                Cmd::none()
            }
            Msg::Failed(id, error) => {
                console::error_1(&format!("Request failed: {error}").into());
                if let Some(id) = id {
                    self.pending_tasks.remove(&id);
                }
                self.loading = false;
                self.error = Some(error.to_string());
                Cmd::none()
            }
            Msg::DismissError => {
                self.error = None;
                Cmd::none()
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                self.view_header(),
                div(
                    [class("max-w-6xl mx-auto px-6 py-8 space-y-6")],
                    [
                        self.view_error(),
                        match self.current_page {
                            Page::Dashboard => self.view_dashboard(),
                            Page::Tasks => self.view_tasks_page(),
                            Page::Analytics => self.view_analytics_page(),
                        },
                    ],
                ),
            ],
        )
    }
}

impl Model {
    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    fn view_header(&self) -> Node<Msg> {
        header([class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")], [
            div([class("max-w-6xl mx-auto px-6 py-4")], [
                div([class("flex items-center justify-between")], [
                    h1([class("text-2xl font-bold text-ctp-text")], [text("Task Board")]),
                    nav([class("flex space-x-8")], [
                        self.nav_link("Dashboard", Page::Dashboard),
                        self.nav_link("Tasks", Page::Tasks),
                        self.nav_link("Analytics", Page::Analytics),
                    ]),
                ]),
            ]),
        ])
    }

    fn nav_link(&self, label: &str, page: Page) -> Node<Msg> {
        let is_active = self.current_page == page;
        a([
            href(page.to_path()),
            on_click(move |event| {
                event.prevent_default();
                Msg::NavigateTo(page)
            }),
            class(&format!(
                "px-3 py-2 rounded-md text-sm font-medium transition-colors duration-200 {}",
                if is_active {
                    "bg-ctp-blue text-ctp-base"
                } else {
                    "text-ctp-subtext0 hover:text-ctp-text hover:bg-ctp-surface0"
                }
            )),
        ], [text(label)])
    }

    fn view_error(&self) -> Node<Msg> {
        match &self.error {
            Some(message) => div([class("flex items-center justify-between bg-ctp-red/20 text-ctp-red border border-ctp-red rounded-lg px-4 py-3")], [
                span([], [text(message)]),
                button([
                    on_click(|_| Msg::DismissError),
                    class("text-sm font-medium hover:underline"),
                    r#type("button"),
                ], [text("Dismiss")]),
            ]),
            None => span([], []),
        }
    }

    fn view_dashboard(&self) -> Node<Msg> {
        div([class("bg-ctp-surface0 rounded-lg shadow-lg p-8 border border-ctp-surface1")], [
            h2([class("text-3xl font-bold text-ctp-text mb-6")], [text("Overview")]),
            div([class("grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-6")], [
                self.stat_card("Total Tasks", &self.tasks.len().to_string(), "📝"),
                self.stat_card(TaskStatus::Upcoming.label(), &self.count(TaskStatus::Upcoming).to_string(), "📅"),
                self.stat_card(TaskStatus::InProgress.label(), &self.count(TaskStatus::InProgress).to_string(), "⏳"),
                self.stat_card(TaskStatus::Completed.label(), &self.count(TaskStatus::Completed).to_string(), "✅"),
            ]),
            div([class("flex flex-wrap gap-4 mt-8")], [
                a([
                    href(Page::Tasks.to_path()),
                    on_click(|event| {
                        event.prevent_default();
                        Msg::NavigateTo(Page::Tasks)
                    }),
                    class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-3 rounded-lg transition-colors duration-200 inline-block"),
                ], [text("Manage Tasks")]),
                a([
                    href(Page::Analytics.to_path()),
                    on_click(|event| {
                        event.prevent_default();
                        Msg::NavigateTo(Page::Analytics)
                    }),
                    class("bg-ctp-green hover:bg-ctp-teal text-ctp-base font-medium px-6 py-3 rounded-lg transition-colors duration-200 inline-block"),
                ], [text("View Analytics")]),
            ]),
        ])
    }

    fn stat_card(&self, card_title: &str, value: &str, icon: &str) -> Node<Msg> {
        div([class("bg-ctp-surface1 rounded-lg p-6 border border-ctp-surface2")], [
            div([class("flex items-center justify-between")], [
                div([], [
                    p([class("text-sm font-medium text-ctp-subtext0")], [text(card_title)]),
                    p([class("text-2xl font-bold text-ctp-text mt-1")], [text(value)]),
                ]),
                span([class("text-3xl")], [text(icon)]),
            ]),
        ])
    }

    fn view_tasks_page(&self) -> Node<Msg> {
        div([class("bg-ctp-surface0 rounded-lg shadow-lg p-6 border border-ctp-surface1")], [
            h2([class("text-2xl font-bold text-ctp-text mb-6")], [text("Tasks")]),
            self.view_create_form(),
            if self.loading {
                div([class("text-center py-10 text-ctp-subtext0 italic")], [text("Loading...")])
            } else {
                div(
                    [class("grid grid-cols-1 md:grid-cols-3 gap-6")],
                    TaskStatus::ALL.iter().map(|status| self.view_board(*status)).collect::<Vec<_>>(),
                )
            },
        ])
    }

    fn view_create_form(&self) -> Node<Msg> {
        div([class("mb-8 p-6 bg-ctp-surface1 rounded-lg border border-ctp-surface2")], [
            h3([class("text-xl font-semibold text-ctp-text mb-4 pb-2 border-b border-ctp-surface2")], [text("Add New Task")]),
            div([class("space-y-4")], [
                input([
                    r#type("text"),
                    placeholder("Task name"),
                    value(&self.new_task_name),
                    on_input(|event| Msg::SetNewTaskName(event.value())),
                    class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue"),
                ], []),
                textarea([
                    placeholder("Description"),
                    value(&self.new_task_description),
                    on_input(|event| Msg::SetNewTaskDescription(event.value())),
                    class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue h-20 resize-y"),
                ], []),
                div(
                    [class("flex items-center gap-2")],
                    TaskPriority::ALL
                        .iter()
                        .map(|priority| self.priority_option(*priority))
                        .collect::<Vec<_>>(),
                ),
                button([
                    on_click(|_| Msg::CreateTask),
                    class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200"),
                    r#type("button"),
                ], [text("Add Task")]),
            ]),
        ])
    }

    fn priority_option(&self, priority: TaskPriority) -> Node<Msg> {
        let selected = self.new_task_priority == priority;
        button([
            on_click(move |_| Msg::SetNewTaskPriority(priority)),
            r#type("button"),
            class(&format!(
                "px-3 py-1 rounded-full text-sm font-medium {}",
                if selected {
                    priority_class(priority)
                } else {
                    "bg-ctp-surface0 text-ctp-subtext0 hover:text-ctp-text"
                }
            )),
        ], [text(priority.as_str())])
    }

    fn view_board(&self, status: TaskStatus) -> Node<Msg> {
        let tasks: Vec<&Task> = self.tasks.iter().filter(|t| t.status == status).collect();
        div([class("bg-ctp-surface1/50 rounded-lg p-4 border border-ctp-surface2")], [
            div([class("flex items-center justify-between mb-4")], [
                h3([class("text-lg font-semibold text-ctp-text")], [text(status.label())]),
                span([class("bg-ctp-blue/20 text-ctp-blue px-2 py-1 rounded-full text-sm font-medium")], [
                    text(&tasks.len().to_string()),
                ]),
            ]),
            if tasks.is_empty() {
                p([class("text-center py-6 text-ctp-subtext0 italic")], [text("No tasks")])
            } else {
                div(
                    [class("space-y-3")],
                    tasks.iter().map(|task| self.view_task(task)).collect::<Vec<_>>(),
                )
            },
        ])
    }

    fn view_task(&self, task: &Task) -> Node<Msg> {
        let is_pending = self.pending_tasks.contains(&task.id);
        let task_id = task.id;

        div([key(task.id.to_string()), class("border border-ctp-surface1 rounded-xl p-4 bg-ctp-surface0 shadow-sm")], [
            div([class("flex items-start justify-between gap-3")], [
                h4([class("font-semibold text-ctp-text break-words")], [text(&task.name)]),
                span([class(&format!("px-2 py-0.5 rounded-full text-xs font-medium {}", priority_class(task.priority)))], [
                    text(task.priority.as_str()),
                ]),
            ]),
            match &task.description {
                Some(description) if !description.is_empty() => {
                    p([class("text-sm text-ctp-subtext1 mt-2 break-words")], [text(description)])
                }
                _ => span([], []),
            },
            match &task.assigned_to_name {
                Some(assignee) => div([class("flex items-center gap-2 mt-2 text-sm text-ctp-subtext1")], [
                    match &task.assigned_to_avatar {
                        Some(avatar) => img([src(avatar), alt(assignee), class("w-6 h-6 rounded-full")], []),
                        None => span([], []),
                    },
                    span([], [text(assignee)]),
                ]),
                None => span([], []),
            },
            p([class("text-xs text-ctp-overlay1 mt-2")], [text(&card_dates(task))]),
            div([class("flex gap-2 mt-3")], [
                match next_status(task.status) {
                    Some(next) => button([
                        on_click(move |_| Msg::AdvanceTask(task_id)),
                        class("bg-ctp-blue/20 text-ctp-blue hover:bg-ctp-blue/30 px-3 py-1 rounded-md text-sm font-medium"),
                        r#type("button"),
                        disabled(is_pending),
                    ], [text(&format!("Move to {}", next.label()))]),
                    None => span([], []),
                },
                button([
                    on_click(move |_| Msg::DeleteTask(task_id)),
                    class("bg-ctp-red/20 text-ctp-red hover:bg-ctp-red/30 px-3 py-1 rounded-md text-sm font-medium"),
                    r#type("button"),
                    disabled(is_pending),
                ], [text(if is_pending { "⏳" } else { "Delete" })]),
            ]),
        ])
    }

    fn view_analytics_page(&self) -> Node<Msg> {
        let max_views = self.analytics.iter().map(|row| row.page_views).max().unwrap_or(0);
        let max_visits = self.analytics.iter().map(|row| row.total_visits).max().unwrap_or(0);

        div([class("bg-ctp-surface0 rounded-lg shadow-lg p-8 border border-ctp-surface1")], [
            h2([class("text-2xl font-bold text-ctp-text mb-6")], [text("Monthly Analytics")]),
            if self.loading {
                div([class("text-center py-10 text-ctp-subtext0 italic")], [text("Loading...")])
            } else if self.analytics.is_empty() {
                p([class("text-center py-10 text-ctp-subtext0")], [text("No analytics recorded yet.")])
            } else {
                div(
                    [class("space-y-4")],
                    self.analytics
                        .iter()
                        .map(|row| {
                            div([class("bg-ctp-surface1 rounded-lg p-4 border border-ctp-surface2 space-y-2")], [
                                div([class("flex justify-between")], [
                                    span([class("font-medium text-ctp-text")], [text(&format!("{:04}-{:02}", row.year, row.month))]),
                                    span([class("text-sm text-ctp-subtext0")], [text(&format!("{:.1} min avg session", row.session_duration))]),
                                ]),
                                self.progress_bar("Page views", row.page_views, max_views, "bg-ctp-blue"),
                                self.progress_bar("Visits", row.total_visits, max_visits, "bg-ctp-green"),
                            ])
                        })
                        .collect::<Vec<_>>(),
                )
            },
        ])
    }

    fn progress_bar(&self, label: &str, value: u64, max: u64, color_class: &str) -> Node<Msg> {
        let percentage = if max == 0 { 0 } else { (value * 100) / max };
        div([class("flex items-center justify-between")], [
            span([class("w-40 text-sm font-medium text-ctp-text")], [text(&format!("{} ({})", label, value))]),
            div([class("flex-1 mx-4")], [
                div([class("w-full bg-ctp-surface2 rounded-full h-2")], [
                    div([
                        class(&format!("{} h-2 rounded-full transition-all duration-500", color_class)),
                        attributes::styles([("width", format!("{}%", percentage))]),
                    ], []),
                ]),
            ]),
            span([class("text-sm text-ctp-subtext0")], [text(&format!("{}%", percentage))]),
        ])
    }
}

fn card_dates(task: &Task) -> String {
    let created = format!("Created {}", task.created_at.format("%Y-%m-%d"));
    match task.due_date {
        Some(due) => format!("{created} · Due {}", due.format("%Y-%m-%d")),
        None => created,
    }
}

fn priority_class(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Low => "bg-ctp-green/20 text-ctp-green",
        TaskPriority::Medium => "bg-ctp-yellow/20 text-ctp-yellow",
        TaskPriority::High => "bg-ctp-red/20 text-ctp-red",
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
