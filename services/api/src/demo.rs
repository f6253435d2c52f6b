use crate::infra::InMemoryAssessmentRepository;
use chrono::Utc;
use clap::Args;
use giftwise::config::AppConfig;
use giftwise::error::AppError;
use giftwise::workflows::access::{
    AccessDecision, AccessService, InMemoryViewContextStore, OrganizationId, Permission,
    Principal, ResourceScope, Role, UserId, ViewAsRequest,
};
use giftwise::workflows::assessment::{
    load_answers, parse_answers, AssessmentPolicy, AssessmentService, GiftCategory, ScoreResult,
    ScoringPolicy, VersionId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// CSV answer sheet with question_id,gift_key,value columns
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Discard malformed answers and fall back to the neutral ranking when nothing remains
    #[arg(long)]
    pub(crate) recover: bool,
    /// Override the minimum answers expected per gift category
    #[arg(long)]
    pub(crate) min_per_gift: Option<usize>,
    /// Print the score as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the super-administrator view-as portion of the demo.
    #[arg(long)]
    pub(crate) skip_view_as: bool,
}

const DEMO_ANSWER_SHEET: &str = "\
question_id,gift_key,value
q01,TEACHING,5
q02,TEACHING,4
q03,TEACHING,5
q04,FAITH,3
q05,FAITH,4
q06,FAITH,3
q07,MERCY,4
q08,MERCY,2
q09,SERVICE_HOSPITALITY,5
q10,SERVICE_HOSPITALITY,4
q11,SHEPHERDING,3
q12,EVANGELISM,7
";

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        answers,
        recover,
        min_per_gift,
        json,
    } = args;

    let config = AppConfig::load()?;
    let mut policy = AssessmentPolicy::from_config(&config.assessment);
    if let Some(minimum) = min_per_gift {
        policy.scoring = ScoringPolicy::new(minimum);
    }

    let sheet = load_answers(&answers)?;
    let service = AssessmentService::new(
        Arc::new(InMemoryAssessmentRepository::default()),
        policy,
    );
    let score = service.preview(&sheet, recover);

    if json {
        match serde_json::to_string_pretty(&score.view()) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Score payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Gift assessment score for {}", answers.display());
    println!(
        "Answers read: {} | scored: {} | recovery: {}",
        sheet.len(),
        score.scored_answers,
        if recover { "on" } else { "off" }
    );
    render_score(&score);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let now = Utc::now();
    let congregation = OrganizationId("org-first-church".to_string());

    let assessments = AssessmentService::new(
        Arc::new(InMemoryAssessmentRepository::default()),
        AssessmentPolicy::from_config(&config.assessment),
    );
    let access = AccessService::new(Arc::new(InMemoryViewContextStore::new()));

    println!("Giftwise demo");
    println!("\nParticipant submission");
    let participant = Principal {
        id: UserId("user-grace".to_string()),
        role: Role::Participant,
        organization_id: Some(congregation.clone()),
    };
    let scope = ResourceScope::Organization(congregation.clone());
    access.require(&participant, Permission::AssessmentsTake, &scope, now)?;

    let response = assessments.start(
        &participant.id,
        participant.organization_id.clone(),
        VersionId("gifts-v2".to_string()),
        now,
    )?;
    let answers = parse_answers(DEMO_ANSWER_SHEET.as_bytes())?;
    let recorded = assessments.record_answers(&participant.id, &response.id, answers)?;
    println!("  Response {} opened with {} answers", response.id, recorded);

    let outcome = assessments.submit(&participant.id, &response.id, now)?;
    let view = outcome.result.view(assessments.expiration(), now);
    println!(
        "  Result {} | expires {} ({} days) | shareable: {}",
        view.id,
        view.expires_at.format("%Y-%m-%d"),
        view.days_until_expiration,
        view.shareable
    );
    render_score(&outcome.score);

    match assessments.submit(&participant.id, &response.id, now) {
        Ok(_) => println!("  Unexpected: second submission accepted"),
        Err(err) => println!("  Second submission rejected: {err}"),
    }

    if args.skip_view_as {
        return Ok(());
    }

    println!("\nSupport session (view-as)");
    let support = Principal {
        id: UserId("user-support".to_string()),
        role: Role::SuperAdmin,
        organization_id: None,
    };
    let state = access.set_view(
        &support,
        ViewAsRequest {
            view_as_role: Some(Role::OrgLeader),
            view_as_organization_id: Some(congregation),
        },
        now,
    )?;
    if let Some(context) = &state.context {
        println!(
            "  {} now viewing as {} until {}",
            support.id,
            state.identity.role.label(),
            context.expires_at().format("%Y-%m-%d %H:%M UTC")
        );
    }

    for permission in [Permission::ResultsView, Permission::ResultsManage] {
        let (identity, decision) = access.authorize(&support, permission, &scope, now)?;
        match decision {
            AccessDecision::Allow => println!("  {permission}: allowed as {}", identity.role),
            AccessDecision::Deny { reason } => {
                println!("  {permission}: denied as {} ({reason:?})", identity.role)
            }
        }
    }

    access.clear_view(&support)?;
    let identity = access.resolve(&support, now)?;
    println!("  View cleared; acting as {} again", identity.role.label());
    Ok(())
}

fn render_score(score: &ScoreResult) {
    println!("  Totals:");
    for category in GiftCategory::ALL {
        println!(
            "    {:<32} {:>3}",
            category.label(),
            score.total_for(category)
        );
    }

    println!("  Top gifts:");
    for (rank, category) in score.top3.iter().enumerate() {
        println!(
            "    {}. {} ({})",
            rank + 1,
            category.label(),
            score.total_for(*category)
        );
    }

    if score.errors.is_empty() {
        println!("  Validation: clean");
    } else {
        println!("  Validation issues:");
        for message in score.error_messages() {
            println!("    - {message}");
        }
    }
}
