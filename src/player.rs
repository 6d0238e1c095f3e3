//! Action replay
//!
//! Every action is a fixed list of optional steps followed by one required
//! click. An optional step that cannot find its control is skipped; only
//! the final click decides success.

use crate::bridge::{Interaction, UiBridge};
use crate::{RuleAction, UnsupportedAction};
use std::time::Duration;
use tracing::{debug, info};

/// Pause after a step that changed the window layout
const SETTLE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub interaction: Interaction,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Optional step that could not run
    Skipped(String),
    /// Required step that could not run
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub interaction: Interaction,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone)]
pub struct ActionReport {
    pub action: RuleAction,
    pub success: bool,
    pub steps: Vec<StepReport>,
}

impl ActionReport {
    /// One line per step, for logs
    pub fn summary(&self) -> String {
        self.steps
            .iter()
            .map(|s| match &s.outcome {
                StepOutcome::Done => format!("{}: done", s.interaction),
                StepOutcome::Skipped(why) => format!("{}: skipped ({})", s.interaction, why),
                StepOutcome::Failed(why) => format!("{}: failed ({})", s.interaction, why),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// The interaction sequence for an action
pub fn plan(action: RuleAction) -> Vec<Step> {
    let optional = |interaction| Step {
        interaction,
        required: false,
    };
    vec![
        optional(Interaction::ExpandDetails),
        optional(Interaction::ChooseScope(action.scope())),
        optional(Interaction::ChooseDuration(action.duration())),
        Step {
            interaction: Interaction::ClickButton(action.verdict()),
            required: true,
        },
    ]
}

/// Run the plan for `action` against the open alert window
pub async fn perform(bridge: &dyn UiBridge, action: RuleAction) -> ActionReport {
    let mut steps = Vec::new();
    let mut success = false;

    for step in plan(action) {
        let outcome = match bridge.interact(step.interaction).await {
            Ok(()) => {
                debug!("{}: done", step.interaction);
                if !step.required {
                    tokio::time::sleep(SETTLE).await;
                }
                StepOutcome::Done
            }
            Err(e) if step.required => StepOutcome::Failed(e.to_string()),
            Err(e) => {
                debug!("{}: skipped ({})", step.interaction, e);
                StepOutcome::Skipped(e.to_string())
            }
        };
        if step.required {
            success = outcome == StepOutcome::Done;
        }
        steps.push(StepReport {
            interaction: step.interaction,
            outcome,
        });
    }

    info!("🎬 {} via {}: {}", action, bridge.name(), if success { "ok" } else { "failed" });
    ActionReport {
        action,
        success,
        steps,
    }
}

/// Parse then perform. Unknown names never reach the bridge.
pub async fn perform_named(
    bridge: &dyn UiBridge,
    name: &str,
) -> Result<ActionReport, UnsupportedAction> {
    let action: RuleAction = name.parse()?;
    Ok(perform(bridge, action).await)
}
