//! The six built-in domain analyzers
//!
//! Analyzers differ only in the data held here: role instructions, output
//! schema, and optional search queries. Invocation logic lives in
//! [`crate::analysis::Analyzer`].

use super::schema::{OutputSchema, SchemaField};

pub const TEAM: &str = "team";
pub const MARKET: &str = "market";
pub const PRODUCT: &str = "product";
pub const TRACTION: &str = "traction";
pub const FINANCE: &str = "finance";
pub const COMPETITOR: &str = "competitor";

/// Canonical analyzer order, used for prompts, reports and rendering
pub const ANALYZER_IDS: [&str; 6] = [TEAM, MARKET, PRODUCT, TRACTION, FINANCE, COMPETITOR];

const CONFIDENCE: &[&str] = &["High", "Medium", "Low"];

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSpec {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub instructions: String,
    pub output_schema: OutputSchema,
    pub uses_search: bool,
    /// Query templates; `{subject}` is replaced with the subject name
    pub search_queries: Vec<String>,
}

impl AnalyzerSpec {
    pub fn new(
        id: &str,
        display_name: &str,
        description: &str,
        instructions: &str,
        output_schema: OutputSchema,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            instructions: instructions.trim().to_string(),
            output_schema,
            uses_search: false,
            search_queries: Vec::new(),
        }
    }

    pub fn with_search(mut self, queries: &[&str]) -> Self {
        self.uses_search = true;
        self.search_queries = queries.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn queries_for(&self, subject: &str) -> Vec<String> {
        self.search_queries
            .iter()
            .map(|q| q.replace("{subject}", subject))
            .collect()
    }

    /// All six analyzers in canonical order
    pub fn defaults() -> Vec<AnalyzerSpec> {
        vec![team(), market(), product(), traction(), finance(), competitor()]
    }
}

fn team() -> AnalyzerSpec {
    AnalyzerSpec::new(
        TEAM,
        "Team",
        "Founder background, team completeness and commitment",
        r#"
You are an expert team analyst evaluating a startup's founding team.

1. Founder background: prior startups or exits and relevant domain expertise.
   Rate as Strong, Moderate or Weak.
2. Team completeness: coverage of technical leadership, marketing and growth,
   sales and business development, and operations. Rate as Complete, Partial
   or Gaps.
3. Commitment: full-time versus part-time involvement, personal capital at
   stake, evidence of long-term dedication. Rate as High, Medium or Low.

Only list red flags for serious concerns. Justify every rating with evidence.
"#,
        OutputSchema::wrapped(
            "team_analysis",
            vec![
                SchemaField::integer("score").with_hint("integer (1-100)"),
                SchemaField::one_of("founder_background", &["Strong", "Moderate", "Weak"]),
                SchemaField::text("founder_background_details"),
                SchemaField::one_of("team_completeness", &["Complete", "Partial", "Gaps"]),
                SchemaField::text("team_completeness_details"),
                SchemaField::one_of("commitment_level", CONFIDENCE),
                SchemaField::text("commitment_details"),
                SchemaField::text_list("key_strengths"),
                SchemaField::text_list("key_weaknesses"),
                SchemaField::text_list("red_flags").optional(),
                SchemaField::text_list("recommendations"),
                SchemaField::one_of("confidence_level", CONFIDENCE),
            ],
        ),
    )
}

fn market() -> AnalyzerSpec {
    AnalyzerSpec::new(
        MARKET,
        "Market",
        "TAM/SAM, competition intensity and growth dynamics",
        r#"
You are an expert market analyst evaluating a startup's market.

1. TAM and SAM: estimate total and serviceable addressable market with
   currency and amount, state the methodology, and rate your confidence.
2. Competition intensity: identify direct competitors, classify their number
   as Few or Many, and assess saturation and entry barriers.
3. Growth dynamics: cite sector growth rates, drivers and trends, and rate
   growth potential as High, Medium or Low.

Provide data-driven insights with supporting evidence.
"#,
        OutputSchema::wrapped(
            "market_analysis",
            vec![
                SchemaField::integer("score").with_hint("integer (1-100)"),
                SchemaField::text("tam_estimate").with_hint("string with currency and amount"),
                SchemaField::text("sam_estimate").with_hint("string with currency and amount"),
                SchemaField::one_of("tam_confidence", CONFIDENCE),
                SchemaField::text("tam_methodology"),
                SchemaField::one_of("competition_intensity", &["Low", "Medium", "High"]),
                SchemaField::one_of("competitor_count", &["Few", "Many"]),
                SchemaField::text_list("key_competitors"),
                SchemaField::text_list("competitive_advantages"),
                SchemaField::one_of("growth_potential", CONFIDENCE),
                SchemaField::text("growth_rate_evidence"),
                SchemaField::text_list("growth_drivers"),
                SchemaField::text_list("market_trends"),
                SchemaField::text_list("entry_barriers"),
                SchemaField::text_list("market_risks"),
                SchemaField::text_list("opportunities"),
                SchemaField::one_of("confidence_level", CONFIDENCE),
            ],
        ),
    )
}

fn product() -> AnalyzerSpec {
    AnalyzerSpec::new(
        PRODUCT,
        "Product",
        "Product stage, defensibility and technical feasibility",
        r#"
You are an expert product strategist evaluating a startup's product.

1. Stage: classify the product (Concept, Development, Beta, Launched, Scaled),
   assess maturity and market readiness, and estimate time to market.
2. Defensibility: intellectual property, proprietary data, strategic
   partnerships, network effects and switching costs. Rate differentiation
   as Strong, Moderate or Weak.
3. Technical feasibility: third-party dependencies, regulatory requirements,
   complexity and scalability. Rate feasibility as High, Medium or Low.
"#,
        OutputSchema::wrapped(
            "product_analysis",
            vec![
                SchemaField::integer("score").with_hint("integer (1-100)"),
                SchemaField::one_of(
                    "mvp_stage",
                    &["Concept", "Development", "Beta", "Launched", "Scaled"],
                ),
                SchemaField::text("product_maturity"),
                SchemaField::text("development_stage_details"),
                SchemaField::one_of("differentiation", &["Strong", "Moderate", "Weak"]),
                SchemaField::text_list("competitive_advantages"),
                SchemaField::text_list("intellectual_property"),
                SchemaField::text_list("strategic_partnerships"),
                SchemaField::text("network_effects"),
                SchemaField::one_of("technical_feasibility", CONFIDENCE),
                SchemaField::text_list("technical_dependencies"),
                SchemaField::text_list("regulatory_requirements"),
                SchemaField::text("scalability_assessment"),
                SchemaField::text_list("development_risks"),
                SchemaField::text_list("key_product_strengths"),
                SchemaField::text_list("product_gaps"),
                SchemaField::text_list("development_recommendations"),
                SchemaField::text("time_to_market_estimate"),
                SchemaField::one_of("confidence_level", CONFIDENCE),
            ],
        ),
    )
}

fn traction() -> AnalyzerSpec {
    AnalyzerSpec::new(
        TRACTION,
        "Traction",
        "Revenue metrics, engagement signals and hiring velocity",
        r#"
You are an expert traction analyst evaluating a startup's momentum.

1. Revenue metrics: MRR/ARR, month-over-month or year-over-year growth, and
   MAU/DAU where present.
2. Engagement signals: reviews and ratings, downloads, social mentions and
   press coverage. Rate engagement as Strong, Moderate or Weak.
3. Hiring velocity: open roles and observable team growth. Rate as Fast,
   Steady or Slow.

Use "Unknown" for metrics that are not available.
"#,
        OutputSchema::wrapped(
            "traction_analysis",
            vec![
                SchemaField::integer("score").with_hint("integer (1-100)"),
                SchemaField::one_of(
                    "revenue_stage",
                    &["Pre-revenue", "Early revenue", "Growing", "Scaling"],
                ),
                SchemaField::object(
                    "revenue_metrics",
                    vec![
                        SchemaField::text("mrr_arr"),
                        SchemaField::text("growth_rate"),
                        SchemaField::text("revenue_trend"),
                    ],
                ),
                SchemaField::object(
                    "user_metrics",
                    vec![
                        SchemaField::text("mau"),
                        SchemaField::text("dau"),
                        SchemaField::text("user_growth_rate"),
                    ],
                ),
                SchemaField::text("growth_trajectory"),
                SchemaField::one_of("engagement_signals", &["Strong", "Moderate", "Weak"]),
                SchemaField::object(
                    "customer_validation",
                    vec![
                        SchemaField::text("reviews_ratings"),
                        SchemaField::text("app_downloads"),
                        SchemaField::text("social_mentions"),
                        SchemaField::text_list("press_coverage"),
                    ],
                ),
                SchemaField::one_of("hiring_velocity", &["Fast", "Steady", "Slow"]),
                SchemaField::text_list("team_growth_indicators"),
                SchemaField::text_list("traction_strengths"),
                SchemaField::text_list("growth_challenges"),
                SchemaField::text_list("growth_recommendations"),
                SchemaField::text_list("key_milestones"),
                SchemaField::one_of("confidence_level", CONFIDENCE),
            ],
        ),
    )
}

fn finance() -> AnalyzerSpec {
    AnalyzerSpec::new(
        FINANCE,
        "Finance",
        "Funding and runway, unit economics and risk flags",
        r#"
You are an expert financial analyst evaluating a startup's financials and risks.

1. Funding and runway: total raised by round, monthly burn, runway and cash
   position. Rate funding status as Strong, Adequate or Concerning.
2. Unit economics: CAC, LTV, LTV:CAC ratio, gross margins and revenue model.
   Rate as Healthy, Marginal, Problematic or Unknown.
3. Risk flags: market, execution, financial and regulatory risks, each backed
   by specific evidence, with mitigation suggestions.
"#,
        OutputSchema::wrapped(
            "financial_analysis",
            vec![
                SchemaField::integer("score").with_hint("integer (1-100)"),
                SchemaField::one_of("funding_status", &["Strong", "Adequate", "Concerning"]),
                SchemaField::text("total_funding_raised"),
                SchemaField::text_list("funding_rounds"),
                SchemaField::text("monthly_burn_rate"),
                SchemaField::text("runway_months"),
                SchemaField::text("cash_position"),
                SchemaField::one_of(
                    "unit_economics",
                    &["Healthy", "Marginal", "Problematic", "Unknown"],
                ),
                SchemaField::text("cac"),
                SchemaField::text("ltv"),
                SchemaField::text("ltv_cac_ratio"),
                SchemaField::text("gross_margins"),
                SchemaField::text("revenue_model"),
                SchemaField::object(
                    "top_risks",
                    vec![
                        SchemaField::text_list("market_risks"),
                        SchemaField::text_list("execution_risks"),
                        SchemaField::text_list("financial_risks"),
                        SchemaField::text_list("regulatory_risks").optional(),
                    ],
                ),
                SchemaField::text_list("risk_mitigation_suggestions"),
                SchemaField::text_list("funding_recommendations"),
                SchemaField::text_list("key_financial_strengths"),
                SchemaField::text_list("key_financial_concerns"),
                SchemaField::one_of("confidence_level", CONFIDENCE),
            ],
        ),
    )
}

fn competitor() -> AnalyzerSpec {
    AnalyzerSpec::new(
        COMPETITOR,
        "Competitor",
        "Competitive landscape and positioning benchmarks",
        r#"
You are a competitive intelligence analyst comparing a startup against its
most relevant competitors.

1. Identify 2-3 competitors with similar or more advanced revenue models.
   Prefer direct competitors; if none exist, choose the closest adjacent
   players and say so.
2. For each competitor gather fundamentals, funding, business model, margins,
   ARR/MRR, growth and churn where available, plus strengths and weaknesses.
3. Position the startup against them: where it is ahead, behind or aligned,
   competitive risks, and benchmarks to watch over the next 12 months.

Prefer data from the last two years. Use "Unknown" for unavailable data
rather than estimating.
"#,
        OutputSchema::new(vec![
            SchemaField::integer("score")
                .with_hint("integer (1-100)")
                .optional(),
            SchemaField::text("company_name"),
            SchemaField::text("sector"),
            SchemaField::text("analysis_date").with_hint("YYYY-MM-DD"),
            SchemaField::object_list(
                "competitors",
                vec![
                    SchemaField::text("company_name"),
                    SchemaField::text("headquarters"),
                    SchemaField::text("founding_year"),
                    SchemaField::text("total_funding_raised"),
                    SchemaField::text("funding_rounds"),
                    SchemaField::text_list("notable_investors"),
                    SchemaField::text("business_model"),
                    SchemaField::text_list("revenue_streams"),
                    SchemaField::text("target_market"),
                    SchemaField::text("gross_margin"),
                    SchemaField::text("net_margin"),
                    SchemaField::text("operating_expense_notes"),
                    SchemaField::text("current_arr"),
                    SchemaField::text("current_mrr"),
                    SchemaField::text("arr_growth_rate"),
                    SchemaField::text("churn_rate"),
                    SchemaField::text_list("strengths"),
                    SchemaField::text_list("weaknesses"),
                ],
            ),
            SchemaField::object(
                "competitive_summary",
                vec![
                    SchemaField::text("positioning_vs_competition"),
                    SchemaField::text_list("key_benchmarks_to_watch"),
                    SchemaField::text_list("risks_from_competition"),
                    SchemaField::text_list("opportunities_identified"),
                    SchemaField::text("competitive_moat_assessment"),
                    SchemaField::text("market_positioning_advice"),
                ],
            ),
            SchemaField::one_of("confidence_level", CONFIDENCE),
            SchemaField::text("data_quality_notes"),
        ]),
    )
    .with_search(&[
        "{subject} competitors",
        "{subject} funding",
        "{subject} startup",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_defaults_cover_all_ids_in_order() {
        let specs = AnalyzerSpec::defaults();
        let ids: Vec<&str> = specs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ANALYZER_IDS.to_vec());
    }

    #[test]
    fn test_ids_unique() {
        let specs = AnalyzerSpec::defaults();
        let unique: HashSet<_> = specs.iter().map(|s| s.id.clone()).collect();
        assert_eq!(unique.len(), specs.len());
    }

    #[test]
    fn test_every_schema_declares_score_and_confidence() {
        for spec in AnalyzerSpec::defaults() {
            assert!(spec.output_schema.declares("score"), "{}", spec.id);
            assert!(spec.output_schema.declares("confidence_level"), "{}", spec.id);
        }
    }

    #[test]
    fn test_only_competitor_searches() {
        let searching: Vec<_> = AnalyzerSpec::defaults()
            .into_iter()
            .filter(|s| s.uses_search)
            .map(|s| s.id)
            .collect();
        assert_eq!(searching, vec![COMPETITOR.to_string()]);
    }

    #[test]
    fn test_query_substitution() {
        let queries = competitor().queries_for("Acme Robotics");
        assert_eq!(queries[0], "Acme Robotics competitors");
        assert!(queries.iter().all(|q| !q.contains("{subject}")));
    }
}
