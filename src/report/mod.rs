//! Report requester: turns aggregates into a prompt, gets the narrative and
//! keeps an audit copy of what the model returned.

pub mod artifacts;
pub mod prompts;

pub use artifacts::ArtifactStore;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::domain::Domain;
use crate::error::PipelineError;
use crate::models::{DistrictSection, StateOverview};
use crate::narrative::NarrativeGenerator;

/// Serialize both aggregates into the domain's prompt template.
pub fn build_prompt(
    domain: &Domain,
    state: &StateOverview,
    district: &DistrictSection,
    target_district: &str,
) -> Result<String, PipelineError> {
    let state_json = artifacts::to_json(state)?;
    let district_json = artifacts::to_json(district)?;
    Ok(prompts::render(
        &prompts::template(domain.kind),
        &state_json,
        &district_json,
        target_district,
    ))
}

/// Generate the narrative for one district.
///
/// The thinking trace and full response are saved for audit; a failure to
/// save them is logged and does not fail the report.
pub async fn request_narrative<G: NarrativeGenerator>(
    generator: &G,
    artifacts: &ArtifactStore,
    domain: &Domain,
    state: &StateOverview,
    district: &DistrictSection,
    show_progress: bool,
) -> Result<String, PipelineError> {
    let target = district.district_name.as_str();
    let prompt = build_prompt(domain, state, district, target)?;
    debug!("Prompt for {} analysis:\n{}", domain.label, prompt);

    let spinner = show_progress.then(|| waiting_spinner(domain));
    let result = generator.generate(&prompt).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let generation = result.map_err(|e| {
        error!("Error generating {} analysis: {}", domain.label, e);
        e
    })?;
    info!("Received {} analysis ({} chars)", domain.label, generation.text.len());

    if let Some(trace) = &generation.thinking {
        if let Err(e) = artifacts.save_thinking(domain, target, trace) {
            warn!("Could not save thinking trace: {}", e);
        }
    }
    if let Err(e) = artifacts.save_response(domain, target, &generation) {
        warn!("Could not save response record: {}", e);
    }

    Ok(generation.text)
}

fn waiting_spinner(domain: &Domain) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Writing {} analysis...", domain.label));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
