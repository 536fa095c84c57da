//! Scenario plan: section-cursor scan for preparation steps.
//!
//! Only the preparation section is actually extracted. Mindset guidance is
//! the full response and the visualization script is a fixed phrase; the
//! section headers for both are recognized only so they stop the step scan.

use super::{fallback, ModelResponse, Normalized};
use crate::ai::{ScenarioPlan, ScenarioType};
use crate::error::Degradation;

pub const MAX_PREPARATION_STEPS: usize = 3;

const STEP_MARKERS: [&str; 4] = ["1.", "2.", "3.", "-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preparation,
    Mindset,
    Visualization,
}

fn header_section(line: &str) -> Option<Section> {
    if line.contains("准备") || line.contains("步骤") {
        Some(Section::Preparation)
    } else if line.contains("心态") || line.contains("指导") {
        Some(Section::Mindset)
    } else if line.contains("可视化") || line.contains("想象") {
        Some(Section::Visualization)
    } else {
        None
    }
}

fn strip_step_marker(line: &str) -> Option<&str> {
    STEP_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

fn extract_steps(raw: &str) -> Vec<String> {
    let mut section = None;
    let mut steps = Vec::new();

    for line in raw.split('\n').map(str::trim) {
        if let Some(next) = header_section(line) {
            section = Some(next);
            continue;
        }
        if section != Some(Section::Preparation) {
            continue;
        }
        if let Some(step) = strip_step_marker(line) {
            if !step.is_empty() {
                steps.push(step.to_string());
            }
        }
    }

    steps
}

fn extract(raw: &str, scenario: ScenarioType) -> (ScenarioPlan, bool) {
    let mut steps = extract_steps(raw);
    let found = !steps.is_empty();
    if found {
        steps.truncate(MAX_PREPARATION_STEPS);
    } else {
        steps = fallback::PLACEHOLDER_STEPS
            .iter()
            .map(|s| s.to_string())
            .collect();
    }

    let plan = ScenarioPlan {
        preparation_steps: steps,
        mindset_guidance: raw.to_string(),
        visualization_script: fallback::VISUALIZATION_SCRIPT.to_string(),
        duration: scenario.duration_secs(),
    };
    (plan, found)
}

pub fn parse_scenario_plan(raw: &str, scenario: ScenarioType) -> ScenarioPlan {
    extract(raw, scenario).0
}

pub fn normalize_scenario_plan(
    response: ModelResponse<'_>,
    scenario: ScenarioType,
) -> Normalized<ScenarioPlan> {
    match response {
        ModelResponse::Unavailable => Normalized::degraded(
            fallback::scenario_plan(scenario),
            Degradation::UpstreamUnavailable,
        ),
        ModelResponse::Text(raw) => {
            let (plan, found) = extract(raw, scenario);
            if found {
                Normalized::clean(plan)
            } else {
                Normalized::degraded(plan, Degradation::UnparseableResponse)
            }
        }
    }
}
