//! The four agent stages and their prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agents::AgentTask;
use crate::jobs::StageResult;
use crate::sanitize::truncate_chars;

/// Character budgets for earlier stage output embedded in later prompts.
const STAGE2_VERIFICATION_BUDGET: usize = 3000;
const STAGE3_INPUTS_BUDGET: usize = 4000;
const STAGE4_VERIFICATION_BUDGET: usize = 1500;
const STAGE4_INPUTS_BUDGET: usize = 2500;
const STAGE4_MODEL_BUDGET: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ExistenceValidation,
    InputCollection,
    DcfCalculation,
    RealismAudit,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::ExistenceValidation,
        Stage::InputCollection,
        Stage::DcfCalculation,
        Stage::RealismAudit,
    ];

    /// 1-based position in the pipeline.
    pub fn index(self) -> u8 {
        match self {
            Stage::ExistenceValidation => 1,
            Stage::InputCollection => 2,
            Stage::DcfCalculation => 3,
            Stage::RealismAudit => 4,
        }
    }

    /// Human-readable label shown while the stage runs.
    pub fn label(self) -> &'static str {
        match self {
            Stage::ExistenceValidation => "Company Existence Validation",
            Stage::InputCollection => "DCF Input Data Collection",
            Stage::DcfCalculation => "DCF Calculation",
            Stage::RealismAudit => "Validation & Realism Audit",
        }
    }

    pub fn role(self) -> &'static str {
        match self {
            Stage::ExistenceValidation => "Company Existence Validator",
            Stage::InputCollection => "Financial Data Collector",
            Stage::DcfCalculation => "Valuation Modeling Expert",
            Stage::RealismAudit => "Financial Realism Auditor",
        }
    }

    pub fn default_backstory(self) -> &'static str {
        match self {
            Stage::ExistenceValidation => "You are a corporate intelligence verification agent.",
            Stage::InputCollection => "You are a senior financial analyst.",
            Stage::DcfCalculation => "You are a valuation modeling expert.",
            Stage::RealismAudit => "You are a financial realism audit agent.",
        }
    }

    fn goal(self, company: &str) -> String {
        match self {
            Stage::ExistenceValidation => format!(
                "Verify if the company \"{}\" exists and gather basic corporate info",
                company
            ),
            Stage::InputCollection => {
                format!("Collect all required DCF input data for {}", company)
            }
            Stage::DcfCalculation => format!("Build a complete 10-year DCF model for {}", company),
            Stage::RealismAudit => format!("Audit and validate the DCF analysis for {}", company),
        }
    }

    fn expected_output(self) -> &'static str {
        match self {
            Stage::ExistenceValidation => {
                "Structured company verification report with status, legal name, ticker, country, \
                 industry, website, and description. Status must be clearly labeled as \
                 \"Company Status: [Exists/Does Not Exist/Uncertain]\"."
            }
            Stage::InputCollection => {
                "Structured financial data with all 5 DCF input categories clearly separated, \
                 with data quality score."
            }
            Stage::DcfCalculation => {
                "Complete DCF model with forecast tables, FCF calculations, PV, terminal value, \
                 EV, equity value, per-share value, and sensitivity analysis."
            }
            Stage::RealismAudit => {
                "Structured audit report with 5 sections and final validation status \
                 [Validated / Adjusted & Validated / Rejected]."
            }
        }
    }

    /// Task text. `prior` holds the results of the stages already run, in order.
    fn description(self, company: &str, prior: &[StageResult]) -> String {
        let earlier = |idx: usize, budget: usize| {
            prior
                .get(idx)
                .map(|result| truncate_chars(&result.text, budget))
                .unwrap_or_default()
        };

        match self {
            Stage::ExistenceValidation => format!(
                "Verify the existence and identity of the company: {company}. \
                 Return structured information: Company Status [Exists / Does Not Exist / Uncertain], \
                 exact legal name, ticker (if public), country, industry, official website, \
                 and a 2-3 line factual description.\n\n\
                 IMPORTANT RULES:\n\
                 - For descriptive or marketing-style names (e.g., with slogans or long taglines), \
                 assume the company may be real and search broadly (official website, business registries, \
                 LinkedIn, credible directories, press releases).\n\
                 - Use \"Does Not Exist\" ONLY when repeated, multi-source searching strongly indicates the entity \
                 is fictional, a placeholder, or appears only in examples/training material.\n\
                 - When evidence is sparse, ambiguous, or conflicting, prefer \"Uncertain\" and explain why.\n\
                 - It is better to return \"Uncertain\" for a potentially real small/private company than to \
                 incorrectly say \"Does Not Exist\"."
            ),
            Stage::InputCollection => format!(
                "Using the verified company identity of {company}, collect all 5 critical \
                 DCF input categories: \
                 (1) 5+ years historical financials (revenue, EBITDA, EBIT, net income, FCF, growth, margins), \
                 (2) balance sheet data (debt, cash, net debt, working capital, shares), \
                 (3) reinvestment data (capex, D&A, WC trends), \
                 (4) discount rate components (risk-free rate, beta, ERP, cost of debt, capital structure, WACC), \
                 (5) terminal assumptions (GDP reference, industry growth, exit multiples). \
                 Separate actual vs estimated data, list missing data and provide a data quality score.\n\n\
                 Company verification info:\n{}",
                earlier(0, STAGE2_VERIFICATION_BUDGET)
            ),
            Stage::DcfCalculation => format!(
                "Using the collected financial inputs for {company}, build a complete \
                 10-year DCF model. Follow strict rules: \
                 (1) revenue forecast via historical CAGR with base/conservative/optimistic scenarios, \
                 (2) margin forecast via trend logic, \
                 (3) FCFF = EBIT*(1-Tax)+D&A-Capex-delta_NWC, \
                 (4) discount each year using WACC, \
                 (5) compute terminal value using both perpetual growth and exit multiple, \
                 (6) bridge EV to equity via net debt, \
                 (7) compute intrinsic value per share. \
                 Output structured text tables for forecast, FCF, PV, terminal value, EV, \
                 equity value, per-share value plus sensitivity analysis (WACC +/-1%, g +/-0.5%) \
                 and clearly labeled final scenario results.\n\n\
                 Financial input data:\n{}",
                earlier(1, STAGE3_INPUTS_BUDGET)
            ),
            Stage::RealismAudit => format!(
                "Audit the DCF analysis for {company}. \
                 Check growth realism vs GDP, margin consistency vs industry, reinvestment logic, \
                 WACC/beta sanity, and terminal value dominance (<75% EV). \
                 Independently recalculate key metrics, correct unrealistic assumptions if needed. \
                 Return strictly structured machine-readable text formatted as: \
                 Sheet 1 Company Summary, Sheet 2 Input Data, Sheet 3 Forecast Model, \
                 Sheet 4 Valuation Summary (EV, Equity Value, Intrinsic Value/Share), \
                 Sheet 5 Validation Notes (corrections, adjustments, risk flags), \
                 with final status [Validated/Adjusted & Validated/Rejected].\n\n\
                 Company verification:\n{}\n\n\
                 Financial data:\n{}\n\n\
                 DCF model:\n{}",
                earlier(0, STAGE4_VERIFICATION_BUDGET),
                earlier(1, STAGE4_INPUTS_BUDGET),
                earlier(2, STAGE4_MODEL_BUDGET)
            ),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional per-stage persona overrides supplied with a start request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePrompts {
    #[serde(default)]
    pub agent1: Option<String>,
    #[serde(default)]
    pub agent2: Option<String>,
    #[serde(default)]
    pub agent3: Option<String>,
    #[serde(default)]
    pub agent4: Option<String>,
}

impl StagePrompts {
    /// Override for `stage`, or the built-in persona when none (or a blank one) was given.
    pub fn backstory(&self, stage: Stage) -> &str {
        let custom = match stage {
            Stage::ExistenceValidation => &self.agent1,
            Stage::InputCollection => &self.agent2,
            Stage::DcfCalculation => &self.agent3,
            Stage::RealismAudit => &self.agent4,
        };
        custom
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(stage.default_backstory())
    }
}

/// Assembles the agent task for `stage`.
pub fn build_task(
    stage: Stage,
    company: &str,
    prompts: &StagePrompts,
    prior: &[StageResult],
) -> AgentTask {
    AgentTask {
        stage_index: stage.index(),
        role: stage.role().to_string(),
        goal: stage.goal(company),
        backstory: prompts.backstory(stage).to_string(),
        description: stage.description(company, prior),
        expected_output: stage.expected_output().to_string(),
    }
}
