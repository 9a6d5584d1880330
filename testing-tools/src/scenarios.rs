use log::*;
use std::fmt;
use std::future::Future;
use std::time::Instant;

use crate::api_client::{ApiClient, ChatExchange};
use crate::auth::{login, Credentials, SessionToken};
use crate::error::{scenario_error, Error, ScenarioErrorKind};
use crate::models::{NewTask, Project, Task};
use crate::output::{self, StepResult};
use crate::snapshot::{new_tasks, poll_until_stable, SettlePolicy};

/// Everything a run needs besides the API client.
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub credentials: Credentials,
    pub project_name: String,
    pub chat_message: String,
    pub confirmation_message: String,
    pub settle: SettlePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Login,
    ListProjects,
    FindProject,
    TasksBefore,
    CreateTaskDirect,
    ChatCreateTasks,
    TasksAfter,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Step::Login => "login",
            Step::ListProjects => "list_projects",
            Step::FindProject => "find_project",
            Step::TasksBefore => "tasks_before",
            Step::CreateTaskDirect => "create_task_direct",
            Step::ChatCreateTasks => "chat_create_tasks",
            Step::TasksAfter => "tasks_after",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Tasks other than the directly created one appeared.
    Success,
    /// Only the direct creation call produced a task.
    DirectOnly,
    Neither,
}

impl Verdict {
    pub fn classify(direct_task: Option<&Task>, new_tasks: &[Task]) -> Self {
        let direct_id = direct_task.map(|task| task.id);
        let chat_created = new_tasks
            .iter()
            .any(|task| Some(task.id) != direct_id);

        if chat_created {
            Verdict::Success
        } else if direct_task.is_some() {
            Verdict::DirectOnly
        } else {
            Verdict::Neither
        }
    }

    pub fn passed(&self) -> bool {
        *self == Verdict::Success
    }
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub project: Project,
    pub tasks_before: Vec<Task>,
    pub tasks_after: Vec<Task>,
    pub new_tasks: Vec<Task>,
    pub direct_task: Option<Task>,
    pub chat: Option<ChatExchange>,
    pub settled: bool,
    pub verdict: Verdict,
    pub steps: Vec<StepResult>,
}

#[derive(Debug)]
pub enum ScenarioOutcome {
    Completed(ScenarioReport),
    Aborted {
        step: Step,
        error: Error,
        steps: Vec<StepResult>,
    },
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        match self {
            ScenarioOutcome::Completed(report) => report.verdict.passed(),
            ScenarioOutcome::Aborted { .. } => false,
        }
    }

    pub fn steps(&self) -> &[StepResult] {
        match self {
            ScenarioOutcome::Completed(report) => &report.steps,
            ScenarioOutcome::Aborted { steps, .. } => steps,
        }
    }
}

/// Case-insensitive lookup of the project the run works in.
pub fn find_target_project<'a>(projects: &'a [Project], name: &str) -> Option<&'a Project> {
    let wanted = name.to_lowercase();
    projects
        .iter()
        .find(|project| project.name.to_lowercase() == wanted)
}

#[derive(Default)]
struct StepLog {
    steps: Vec<StepResult>,
}

impl StepLog {
    async fn run<T, Fut>(&mut self, step: Step, fut: Fut) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        let start = Instant::now();
        let result = fut.await;
        self.steps.push(StepResult {
            step: step.to_string(),
            passed: result.is_ok(),
            message: result.as_ref().err().map(|e| e.to_string()),
            duration: start.elapsed(),
        });
        result
    }

    fn abort(self, step: Step, error: Error) -> ScenarioOutcome {
        error!("Scenario aborted at {}: {}", step, error);
        output::print_failure(&format!("Stopping: {} failed", step));
        ScenarioOutcome::Aborted {
            step,
            error,
            steps: self.steps,
        }
    }
}

/// Signs in and prints the outcome.
pub async fn authenticate(api: &ApiClient, credentials: &Credentials) -> Result<SessionToken, Error> {
    output::print_progress(&format!("Signing in as {}...", credentials.username()));

    match login(api.http_client(), api.base_url(), credentials).await {
        Ok(token) => {
            output::print_success(&format!("Signed in. Token: {}...", token.preview(20)));
            Ok(token)
        }
        Err(e) => {
            output::print_failure(&format!("Sign-in failed: {}", e));
            Err(e)
        }
    }
}

/// Lists projects; an empty list counts as a failure.
pub async fn list_projects(api: &ApiClient, token: &SessionToken) -> Result<Vec<Project>, Error> {
    output::print_progress("Listing projects...");

    let projects = api.list_projects(token).await.inspect_err(|e| {
        output::print_failure(&format!("Could not list projects: {}", e));
    })?;

    if projects.is_empty() {
        output::print_failure("No projects found");
        return Err(scenario_error(
            ScenarioErrorKind::NoProjects,
            "the backend returned no projects",
        ));
    }

    output::print_projects(&projects);
    Ok(projects)
}

pub fn select_target_project(projects: &[Project], name: &str) -> Result<Project, Error> {
    match find_target_project(projects, name) {
        Some(project) => {
            output::print_success(&format!(
                "Using project '{}' (ID: {})",
                project.name, project.id
            ));
            Ok(project.clone())
        }
        None => {
            output::print_failure(&format!("Project '{}' not found", name));
            Err(scenario_error(
                ScenarioErrorKind::ProjectNotFound,
                &format!("no project named '{}'", name),
            ))
        }
    }
}

pub async fn list_tasks(
    api: &ApiClient,
    token: &SessionToken,
    project: &Project,
) -> Result<Vec<Task>, Error> {
    output::print_progress(&format!("Listing tasks of project {}...", project.id));

    let tasks = api
        .list_tasks(token, Some(project.id))
        .await
        .inspect_err(|e| output::print_failure(&format!("Could not list tasks: {}", e)))?;

    output::print_tasks(&tasks);
    Ok(tasks)
}

pub async fn create_task_direct(
    api: &ApiClient,
    token: &SessionToken,
    project: &Project,
) -> Result<Task, Error> {
    output::print_progress(&format!("Creating a task directly in project {}...", project.id));

    match api.create_task(token, &NewTask::smoke_test(project.id)).await {
        Ok(task) => {
            output::print_success(&format!("Task created (ID: {})", task.id));
            Ok(task)
        }
        Err(e) => {
            output::print_failure(&format!("Direct creation failed: {}", e));
            Err(e)
        }
    }
}

pub async fn chat_create_tasks(
    api: &ApiClient,
    token: &SessionToken,
    settings: &ScenarioSettings,
) -> Result<ChatExchange, Error> {
    output::print_progress("Asking the AI chat to create tasks...");

    match api
        .chat_create_tasks(token, &settings.chat_message, &settings.confirmation_message)
        .await
    {
        Ok(exchange) => {
            output::print_chat_reply("AI reply", &exchange.initial);
            if let Some(confirmation) = &exchange.confirmation {
                output::print_chat_reply("Confirmation result", confirmation);
            }
            Ok(exchange)
        }
        Err(e) => {
            output::print_failure(&format!("AI chat failed: {}", e));
            Err(e)
        }
    }
}

/// Runs the full create-and-compare scenario.
///
/// Sign-in, project lookup and both task snapshots are prerequisites: their
/// failure aborts the run. The two creation paths are the subject of the test,
/// so their failures are recorded and the run continues to a verdict.
pub async fn run_scenario(api: &ApiClient, settings: &ScenarioSettings) -> ScenarioOutcome {
    let mut recorder = StepLog::default();

    output::print_phase("SETUP PHASE");

    let token = match recorder
        .run(Step::Login, authenticate(api, &settings.credentials))
        .await
    {
        Ok(token) => token,
        Err(e) => return recorder.abort(Step::Login, e),
    };

    let projects = match recorder.run(Step::ListProjects, list_projects(api, &token)).await {
        Ok(projects) => projects,
        Err(e) => return recorder.abort(Step::ListProjects, e),
    };

    let project = match recorder
        .run(Step::FindProject, async {
            select_target_project(&projects, &settings.project_name)
        })
        .await
    {
        Ok(project) => project,
        Err(e) => return recorder.abort(Step::FindProject, e),
    };
    info!("Target project {} ({})", project.id, project.name);

    output::print_phase("STATE BEFORE");
    let tasks_before = match recorder
        .run(Step::TasksBefore, list_tasks(api, &token, &project))
        .await
    {
        Ok(tasks) => tasks,
        Err(e) => return recorder.abort(Step::TasksBefore, e),
    };

    output::print_phase("TEST PHASE");
    let direct_task = recorder
        .run(Step::CreateTaskDirect, create_task_direct(api, &token, &project))
        .await
        .ok();
    let chat = recorder
        .run(Step::ChatCreateTasks, chat_create_tasks(api, &token, settings))
        .await
        .ok();

    output::print_phase("STATE AFTER");
    output::print_progress(&format!(
        "Waiting for the task list to settle (up to {:?})...",
        settings.settle.initial_delay + settings.settle.timeout
    ));
    let token_ref = &token;
    let project_id = project.id;
    let settled = match recorder
        .run(
            Step::TasksAfter,
            poll_until_stable(&settings.settle, move || {
                api.list_tasks(token_ref, Some(project_id))
            }),
        )
        .await
    {
        Ok(settled) => settled,
        Err(e) => {
            output::print_failure(&format!("Could not list tasks: {}", e));
            return recorder.abort(Step::TasksAfter, e);
        }
    };
    output::print_tasks(&settled.tasks);

    let created = new_tasks(&tasks_before, &settled.tasks);
    let verdict = Verdict::classify(direct_task.as_ref(), &created);
    info!(
        "{} new task(s) after {} read(s), verdict {:?}",
        created.len(),
        settled.polls,
        verdict
    );

    let report = ScenarioReport {
        project,
        tasks_before,
        tasks_after: settled.tasks,
        new_tasks: created,
        direct_task,
        chat,
        settled: settled.stable,
        verdict,
        steps: recorder.steps,
    };
    output::print_analysis(&report);

    ScenarioOutcome::Completed(report)
}
