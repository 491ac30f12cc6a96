use std::fmt;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use super::session::TestSession;
use super::wait::wait_for;
use crate::config::{RunnerConfig, WaitConfig};
use crate::dsl::Step;
use crate::error::{ConfigError, SelectorError, StepError, StepFailure};
use crate::selector::{ElementQuery, Strategy, find_matches};
use crate::surface::{ElementNode, UiSurface};

/// Closed set of step actions. Tags outside the set become `Unknown` and are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Wait,
    Click,
    /// `type` or `input`.
    Type,
    /// `assert_text` or `verify_text`.
    AssertText,
    /// `assert_visible` or `verify_visible`.
    AssertVisible,
    Unknown(String),
}

impl Action {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "wait" => Self::Wait,
            "click" => Self::Click,
            "type" | "input" => Self::Type,
            "assert_text" | "verify_text" => Self::AssertText,
            "assert_visible" | "verify_visible" => Self::AssertVisible,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Wait => "wait",
            Self::Click => "click",
            Self::Type => "type",
            Self::AssertText => "assert_text",
            Self::AssertVisible => "assert_visible",
            Self::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What happened to a step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Performed,
    /// Unknown action tag; nothing was done.
    Skipped(String),
}

/// A located element plus how it was found.
#[derive(Debug, Clone)]
pub struct Target {
    pub query: ElementQuery,
    pub element: ElementNode,
    /// False when the executor-provided fallback was used.
    pub explicit: bool,
}

/// Executes single steps against a UI surface.
pub struct StepExecutor {
    surface: Arc<dyn UiSurface>,
    waits: WaitConfig,
    strict_type_names: bool,
}

impl StepExecutor {
    pub fn new(surface: Arc<dyn UiSurface>, config: &RunnerConfig) -> Self {
        Self {
            surface,
            waits: config.waits.clone(),
            strict_type_names: config.strict_type_names,
        }
    }

    /// Let pending UI work finish.
    pub async fn settle(&self) {
        self.surface.settle().await;
    }

    /// Execute one step. `index` is zero-based within its test case.
    ///
    /// Errors are logged with the step's target context and returned as `StepFailure`.
    pub async fn execute(
        &self,
        session: &mut TestSession,
        index: usize,
        step: &Step,
    ) -> Result<StepOutcome, StepFailure> {
        let action = Action::from_tag(&step.action);
        trace!(target: "uidsl::executor", step = index + 1, %action, "Executing step");
        self.dispatch(session, &action, step).await.map_err(|source| {
            let failure = StepFailure {
                step: index + 1,
                context: step_context(&action, step),
                source,
            };
            error!(
                target: "uidsl::executor",
                step = failure.step,
                action = %action,
                selector = step.selector.as_deref().unwrap_or(""),
                alias = step.alias.as_deref().unwrap_or(""),
                error = %failure.source,
                "Step failed"
            );
            failure
        })
    }

    async fn dispatch(
        &self,
        session: &mut TestSession,
        action: &Action,
        step: &Step,
    ) -> Result<StepOutcome, StepError> {
        match action {
            Action::Unknown(tag) if tag.is_empty() => Err(ConfigError::MissingField {
                action: String::new(),
                field: "action",
            }
            .into()),

            Action::Unknown(tag) => {
                warn!(target: "uidsl::executor", action = %tag, "Unknown action; skipping step");
                Ok(StepOutcome::Skipped(tag.clone()))
            }

            Action::Wait => {
                let delay = step.wait_time_or(self.waits.wait_action());
                debug!(target: "uidsl::executor", ?delay, "wait");
                sleep(delay).await;
                self.settle().await;
                Ok(StepOutcome::Performed)
            }

            Action::Click => {
                let target = self.obtain_target(session, step, action, None).await?;
                info!(target: "uidsl::executor", query = %target.query, id = target.element.id, "click");
                self.surface.tap(target.element.id).await?;
                self.settle().await;
                Ok(StepOutcome::Performed)
            }

            Action::Type => {
                let value = required(action, "value", step.value.as_deref())?;
                let target = self
                    .obtain_target(session, step, action, Some(ElementQuery::text_input()))
                    .await?;
                info!(target: "uidsl::executor", query = %target.query, id = target.element.id, "type");
                self.surface.enter_text(target.element.id, value).await?;
                self.settle().await;
                Ok(StepOutcome::Performed)
            }

            Action::AssertText => {
                let expected = required(action, "expected", step.expected.as_deref())?;
                let target = self
                    .obtain_target(session, step, action, Some(ElementQuery::exact_text(expected)))
                    .await?;
                // Without an explicit target the fallback match on `expected` is the proof.
                if target.explicit {
                    let actual = target.element.extract_text().unwrap_or_default();
                    if !actual.contains(expected) {
                        return Err(StepError::Assertion(format!(
                            "expected text of '{}' to contain '{expected}', found '{actual}'",
                            target.query
                        )));
                    }
                }
                debug!(target: "uidsl::executor", query = %target.query, %expected, "assert_text ok");
                Ok(StepOutcome::Performed)
            }

            Action::AssertVisible => {
                let target = self.obtain_target(session, step, action, None).await?;
                debug!(target: "uidsl::executor", query = %target.query, "assert_visible ok");
                Ok(StepOutcome::Performed)
            }
        }
    }

    /// Resolve the step's target: selector, else alias, else `fallback`. Waits for at least one
    /// match, applies the index, and registers the step's alias (if any) for later steps.
    pub async fn obtain_target(
        &self,
        session: &mut TestSession,
        step: &Step,
        action: &Action,
        fallback: Option<ElementQuery>,
    ) -> Result<Target, StepError> {
        let selector = step.selector.as_deref().filter(|s| !s.trim().is_empty());
        let alias = step.alias.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let (query, explicit) = if let Some(raw) = selector {
            (session.aliases.resolve(&ElementQuery::parse(raw))?, true)
        } else if let Some(name) = alias {
            match (session.aliases.get(name), fallback) {
                (Some(stored), _) => (stored.clone(), true),
                (None, Some(fallback)) => (fallback, false),
                (None, None) => return Err(SelectorError::AliasNotFound(name.to_string()).into()),
            }
        } else if let Some(fallback) = fallback {
            (fallback, false)
        } else {
            return Err(SelectorError::MissingTarget(action.tag().to_string()).into());
        };

        if let Strategy::UnknownType(name) = &query.strategy {
            if self.strict_type_names {
                return Err(SelectorError::UnknownTypeName(name.clone()).into());
            }
        }

        let timeout = step.wait_time_or(self.waits.element_timeout());
        let what = format!("at least one match for '{query}'");
        wait_for(
            self.surface.as_ref(),
            &what,
            timeout,
            self.waits.poll_interval(),
            |surface| !find_matches(&surface.snapshot(), &query).is_empty(),
        )
        .await?;

        let snapshot = self.surface.snapshot();
        let matches = find_matches(&snapshot, &query);
        let index = query.index.unwrap_or(0);
        let element = matches
            .get(index)
            .map(|node| (*node).clone())
            .ok_or_else(|| StepError::IndexOutOfRange {
                query: query.to_string(),
                index,
                found: matches.len(),
            })?;

        if let Some(name) = alias {
            session.aliases.register(name, query.clone());
        }

        Ok(Target {
            query,
            element,
            explicit,
        })
    }
}

fn required<'a>(
    action: &Action,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, StepError> {
    value.ok_or_else(|| {
        ConfigError::MissingField {
            action: action.tag().to_string(),
            field,
        }
        .into()
    })
}

/// `click label:Account`, `type alias:email`, `assert_text (fallback)`.
fn step_context(action: &Action, step: &Step) -> String {
    let target = match (step.selector.as_deref(), step.alias.as_deref()) {
        (Some(selector), _) if !selector.trim().is_empty() => selector.to_string(),
        (_, Some(alias)) if !alias.trim().is_empty() => format!("alias:{alias}"),
        _ => "(fallback)".to_string(),
    };
    let tag = if action.tag().is_empty() {
        "<missing action>"
    } else {
        action.tag()
    };
    format!("{tag} {target}")
}
