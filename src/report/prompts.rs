//! Prompt templates, one per report type.
//!
//! Placeholders `{state_data}`, `{district_data}` and `{target_district}` are
//! filled by [`render`].

use crate::domain::DomainKind;

const PREAMBLE: &str = r#"You are an analyst evaluating district and block performance in Madhya Pradesh, India,
using National Rural Employment Guarantee Act (NREGA) dashboard data. Write a concise, professional
assessment of the target district against the state's top and bottom performers, and of the blocks
inside the target district.

<state_data>
{state_data}
</state_data>

<district_data>
{district_data}
</district_data>

The target district is:
<target_district>{target_district}</target_district>
"#;

const INSPECTION_BODY: &str = r#"
Focus on area officer inspection metrics taken from the monthly app-based inspection reports:

1. DPC (District Programme Coordinator, the District Collector) worksite visits
2. ADPC (Additional District Programme Coordinator, the CEO Zila Panchayat) worksite visits
3. Total marks awarded for these visits (maximum 6 marks)

There is exactly one DPC and one ADPC per district; judge their activity on the district-level figures.

Answer in this format:

<analysis>
<district_performance>
[2-3 sentences comparing the district with the top and bottom districts, including its state rank and score.]
</district_performance>

<officer_inspection>
[1-2 sentences on DPC and ADPC inspection activity, noting which officer is more active.]
</officer_inspection>

<block_performance>
[1-2 sentences naming the strongest and weakest blocks and any pattern in their inspections.]
</block_performance>

<recommendations>
[1-2 data-driven recommendations, aimed at the under-performing officer type.]
</recommendations>
</analysis>
"#;

const WORK_MANAGEMENT_BODY: &str = r#"
Focus on work completion metrics and how they are scored:

1. Previous years' work completion:
   - zero marks when the completion rate is below the state average
   - full marks (8) when the completion rate is 95% or more
   - proportionate marks otherwise

2. Current year work completion:
   - zero marks when the completion rate is below the state average
   - full marks (3) when the completion rate is 60% or more
   - proportionate marks otherwise

Answer in this format:

<analysis>
<district_performance>
[2-3 sentences comparing the district with the top and bottom districts, including its state rank and score.]
</district_performance>

<completion_rates>
[2-3 sentences on previous-year and current-year completion against the state averages.]
</completion_rates>

<block_performance>
[2-3 sentences naming the strongest and weakest blocks and any trend in completion.]
</block_performance>

<recommendations>
[1-2 data-driven recommendations, especially for current-year completion.]
</recommendations>
</analysis>
"#;

const ZERO_MUSTER_BODY: &str = r#"
Focus on zero muster metrics. A zero muster is a muster roll with no recorded attendance and signals
weak work allocation or supervision, so a lower percentage is better:

1. Total muster issued
2. Total zero attendance (musters with no attendance)
3. Zero attendance percentage
4. Zero muster marks

Answer in this format:

<analysis>
<district_performance>
[2-3 sentences comparing the district with the best and worst districts, including its state rank and zero attendance percentage.]
</district_performance>

<efficiency_analysis>
[2-3 sentences relating musters issued to zero attendance, against the state averages.]
</efficiency_analysis>

<block_performance>
[2-3 sentences naming the best and worst blocks at avoiding zero musters and any pattern.]
</block_performance>

<recommendations>
[1-2 data-driven recommendations for reducing zero musters through systemic changes.]
</recommendations>
</analysis>
"#;

const CLOSING: &str = r#"
Base every statement on the data above and quote the figures that support it. Cover the district's
rank and score, the leading districts, the district's improvement potential, and its best and worst blocks.
"#;

/// Full template for a report type.
pub fn template(kind: DomainKind) -> String {
    let body = match kind {
        DomainKind::Inspection => INSPECTION_BODY,
        DomainKind::WorkManagement => WORK_MANAGEMENT_BODY,
        DomainKind::ZeroMuster => ZERO_MUSTER_BODY,
    };
    [PREAMBLE, body, CLOSING].concat()
}

/// Fill a template's placeholders in one left-to-right pass.
///
/// Inserted values are never scanned again, so data that happens to contain
/// a placeholder is kept verbatim.
pub fn render(template: &str, state_data: &str, district_data: &str, target_district: &str) -> String {
    let placeholders = [
        ("{state_data}", state_data),
        ("{district_data}", district_data),
        ("{target_district}", target_district),
    ];

    let mut out = String::with_capacity(template.len() + state_data.len() + district_data.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
