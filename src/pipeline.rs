//! Pipeline orchestration.
//!
//! A run is strictly linear:
//! fetch state → aggregate state → (district required) → fetch district →
//! aggregate district → locate district in state → narrative → save.
//! The first failing stage ends the run and its error is returned.

use chrono::NaiveDate;
use tracing::{error, info, info_span, warn, Instrument};

use crate::analysis::{aggregate_entity, aggregate_state};
use crate::cli::OutputFormat;
use crate::domain::Domain;
use crate::error::PipelineError;
use crate::models::{AnalysisResult, DistrictSection, StateOverview};
use crate::narrative::NarrativeGenerator;
use crate::report::{self, ArtifactStore};
use crate::source::DataSource;

/// How a run ended when no stage failed.
#[derive(Debug)]
pub enum RunOutcome {
    /// No district was given; only the state stage ran.
    EntityRequired { state: StateOverview },
    /// The full report was produced and saved.
    Completed(AnalysisResult),
}

/// One report type wired to its collaborators.
pub struct Pipeline<'a, S, G> {
    domain: &'static Domain,
    source: &'a S,
    generator: &'a G,
    artifacts: ArtifactStore,
    show_progress: bool,
}

impl<'a, S: DataSource, G: NarrativeGenerator> Pipeline<'a, S, G> {
    pub fn new(
        domain: &'static Domain,
        source: &'a S,
        generator: &'a G,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            domain,
            source,
            generator,
            artifacts,
            show_progress: false,
        }
    }

    /// Show a spinner while the narrative is being written.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run every stage for `district` on `date`.
    ///
    /// All log lines of the run are emitted inside one span tagged with the
    /// report type and district.
    pub async fn run(
        &self,
        date: NaiveDate,
        district: Option<&str>,
        format: OutputFormat,
    ) -> Result<RunOutcome, PipelineError> {
        let span = info_span!(
            "report",
            kind = self.domain.tag,
            district = district.unwrap_or("-"),
            %date
        );
        self.run_stages(date, district, format)
            .instrument(span)
            .await
            .map_err(|e| {
                error!("{} analysis failed: {}", self.domain.label, e);
                e
            })
    }

    async fn run_stages(
        &self,
        date: NaiveDate,
        district: Option<&str>,
        format: OutputFormat,
    ) -> Result<RunOutcome, PipelineError> {
        let domain = self.domain;
        info!("Starting {} analysis", domain.label);

        info!("Fetching state-level {} data", domain.label);
        let payload = self.source.fetch(domain, date, None).await?;
        let state = aggregate_state(domain, payload)?;
        let overview = state.overview();

        let Some(district) = district.map(str::trim).filter(|d| !d.is_empty()) else {
            warn!("District name is required for analysis");
            return Ok(RunOutcome::EntityRequired { state: overview });
        };

        info!("Fetching {} data for district: {}", domain.label, district);
        let payload = self.source.fetch(domain, date, Some(district)).await?;
        let details = aggregate_entity(domain, payload)?;
        if details.blocks.is_empty() {
            info!("{} reported no blocks; block extremes are omitted", district);
        }

        let state_rank = state.ranks.get(district).copied();
        let district_info = state.collection.find(district).cloned();
        match state_rank {
            Some(rank) => info!(
                "{} ranks {} of {} districts",
                district, rank, state.total_entities
            ),
            None => warn!("District {} not found in state rankings", district),
        }

        let section = DistrictSection {
            district_name: district.to_string(),
            state_rank,
            total_districts: state.total_entities,
            district_info,
            details,
        };

        info!("Generating {} analysis", domain.label);
        let analysis = report::request_narrative(
            self.generator,
            &self.artifacts,
            domain,
            &overview,
            &section,
            self.show_progress,
        )
        .await?;

        let result = AnalysisResult {
            date,
            state_data: overview,
            district_data: section,
            analysis,
        };

        match format {
            OutputFormat::Text => {
                self.artifacts
                    .save_analysis_text(domain, district, &result.analysis)?;
            }
            OutputFormat::Json => {
                self.artifacts.save_analysis_json(domain, district, &result)?;
            }
        }

        Ok(RunOutcome::Completed(result))
    }
}
