//! Next-best-action: a small state machine over the job-seeker's journey.
//!
//! The stage is derived from the CV score and tracked applications, most
//! advanced first: an offer outranks interviews, interviews outrank anything
//! the CV still needs. Once the CV clears the essentials gate, sending
//! applications moves the user into `Applying` even if the CV could still be
//! polished.

use serde::Serialize;

use crate::cv::scoring::{ScoreLevel, ScoreResult};
use crate::models::rows::ApplicationCounts;

/// With this many applications out and no interviews, the CV needs tailoring.
pub const LOW_RESPONSE_APPLICATIONS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStage {
    NoCv,
    Drafting,
    Polishing,
    Ready,
    Applying,
    Interviewing,
    Offer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    CreateCv,
    CompleteEssentials,
    ImproveCv,
    StartApplying,
    KeepApplying,
    TailorCv,
    PrepareInterviews,
    ReviewOffers,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GuidanceInput<'a> {
    /// Score of the saved CV; `None` when the user has not saved one.
    pub score: Option<&'a ScoreResult>,
    pub applications: ApplicationCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAction {
    pub kind: ActionKind,
    pub stage: JourneyStage,
    pub title: String,
    pub reason: String,
    /// Concrete first step, usually the top CV fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub fn journey_stage(input: &GuidanceInput) -> JourneyStage {
    let apps = &input.applications;
    if apps.offer > 0 {
        return JourneyStage::Offer;
    }
    if apps.interviewing > 0 {
        return JourneyStage::Interviewing;
    }
    match input.score {
        None => JourneyStage::NoCv,
        Some(score) if score.is_gated => JourneyStage::Drafting,
        Some(_) if apps.total_sent() > 0 => JourneyStage::Applying,
        Some(score) if score.level != ScoreLevel::Strong => JourneyStage::Polishing,
        Some(_) => JourneyStage::Ready,
    }
}

pub fn next_best_action(input: &GuidanceInput) -> NextAction {
    let stage = journey_stage(input);
    let first_fix = input.score.and_then(|s| s.fixes.first().cloned());
    let apps = &input.applications;

    let (kind, title, reason, detail) = match stage {
        JourneyStage::NoCv => (
            ActionKind::CreateCv,
            "Create your CV".to_string(),
            "Start with a CV so we can score it and suggest improvements.".to_string(),
            None,
        ),
        JourneyStage::Drafting => (
            ActionKind::CompleteEssentials,
            "Complete your CV essentials".to_string(),
            input
                .score
                .and_then(|s| s.gate_message.clone())
                .unwrap_or_else(|| "Your CV is missing essential sections.".to_string()),
            first_fix,
        ),
        JourneyStage::Polishing => (
            ActionKind::ImproveCv,
            "Strengthen your CV".to_string(),
            format!(
                "Your CV scores {} out of 100. A few changes will make it stand out.",
                input.score.map_or(0, |s| s.score)
            ),
            first_fix,
        ),
        JourneyStage::Ready => (
            ActionKind::StartApplying,
            "Start applying".to_string(),
            "Your CV is strong. Apply to roles that match your experience.".to_string(),
            None,
        ),
        JourneyStage::Applying if apps.total_sent() >= LOW_RESPONSE_APPLICATIONS => (
            ActionKind::TailorCv,
            "Tailor your CV to each role".to_string(),
            format!(
                "You have sent {} applications without an interview yet. \
                 Matching your CV to each job description usually lifts the response rate.",
                apps.total_sent()
            ),
            first_fix,
        ),
        JourneyStage::Applying => (
            ActionKind::KeepApplying,
            "Keep applying".to_string(),
            format!(
                "You have sent {} of {LOW_RESPONSE_APPLICATIONS} applications. \
                 Keep a steady pace while you wait for replies.",
                apps.total_sent()
            ),
            None,
        ),
        JourneyStage::Interviewing => (
            ActionKind::PrepareInterviews,
            "Prepare for your interviews".to_string(),
            format!(
                "You have {} interview(s) in progress. Research each company and practise your answers.",
                apps.interviewing
            ),
            None,
        ),
        JourneyStage::Offer => (
            ActionKind::ReviewOffers,
            "Review your offers".to_string(),
            format!(
                "You have {} offer(s). Compare pay, growth and location before you decide.",
                apps.offer
            ),
            None,
        ),
    };

    NextAction {
        kind,
        stage,
        title,
        reason,
        detail,
    }
}
