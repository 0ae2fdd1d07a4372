use crate::infra::{build_platform, sample_catalog, Platform};
use chrono::Utc;
use clap::Args;
use learnflow::assessment::{AnswerInput, AnswerValue};
use learnflow::catalog::{AssessmentId, LessonId, ProgramId};
use learnflow::config::LearningPolicy;
use learnflow::enrollment::{EnrollRequest, EnrollmentStatus, StudentId};
use learnflow::error::AppError;
use learnflow::progress::ProgramProgress;
use learnflow::scholarship::Discount;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Student identifier used for the walkthrough
    #[arg(long, default_value = "demo-student")]
    pub(crate) student: String,
    /// Skip the checkpoint quiz portion of the demo
    #[arg(long)]
    pub(crate) skip_quiz: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { student, skip_quiz } = args;

    println!("Learning platform demo");
    let platform = build_platform(sample_catalog(), LearningPolicy::default());
    let now = Utc::now();
    let program_id = ProgramId("rust-systems".to_string());
    let student_id = StudentId(student);

    let codes = match platform.scholarships.bulk_create(
        program_id.clone(),
        3,
        Discount::Percentage(30.0),
        None,
        now,
    ) {
        Ok(codes) => codes,
        Err(err) => {
            println!("  Scholarship seeding failed: {err}");
            return Ok(());
        }
    };
    println!("\nSeeded {} scholarship codes (30% off):", codes.len());
    for code in &codes {
        println!("  - {}", code.code);
    }

    let outcome = match platform.enrollment.enroll(
        EnrollRequest {
            student_id: student_id.clone(),
            student_email: None,
            program_id: program_id.clone(),
            scholarship_code: Some(codes[0].code.clone()),
            cohort: Some("demo".to_string()),
        },
        now,
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Enrollment rejected: {err}");
            return Ok(());
        }
    };
    let enrollment_id = outcome.record.enrollment.id.clone();
    println!(
        "\nEnrolled {} as {} ({})",
        student_id.0,
        enrollment_id.0,
        outcome.record.enrollment.status.label()
    );
    println!(
        "Amount due after scholarship: {} cents (was {} cents)",
        outcome.amount_due_cents,
        outcome
            .redemption
            .as_ref()
            .map(|receipt| receipt.original_price_cents)
            .unwrap_or(outcome.amount_due_cents)
    );

    let lessons = ["moves", "borrows", "threads", "workspaces"];
    println!("\nCompleting lessons");
    for lesson in lessons {
        match platform
            .enrollment
            .complete_lesson(&enrollment_id, &LessonId(lesson.to_string()), Utc::now())
        {
            Ok(outcome) => println!(
                "  - {lesson}: program completion now {:.1}%",
                outcome.report.percentage
            ),
            Err(err) => println!("  - {lesson}: rejected ({err})"),
        }
    }

    if !skip_quiz {
        println!("\nSubmitting the foundations checkpoint quiz");
        let answers = vec![
            AnswerInput {
                question_index: 0,
                answer: AnswerValue::Flag(true),
            },
            AnswerInput {
                question_index: 1,
                answer: AnswerValue::Choice(0),
            },
            AnswerInput {
                question_index: 2,
                answer: AnswerValue::Text("Result".to_string()),
            },
        ];
        match platform.grading.submit(
            &AssessmentId("foundations-quiz".to_string()),
            &student_id,
            answers,
            Utc::now(),
        ) {
            Ok(submission) => println!(
                "  Attempt {} -> {} (score {:?}, {}%)",
                submission.attempt,
                submission.status.label(),
                submission.score.unwrap_or_default(),
                submission.rounded_percentage().unwrap_or_default()
            ),
            Err(err) => println!("  Submission rejected: {err}"),
        }
    }

    match platform.enrollment.progress_report(&enrollment_id) {
        Ok(report) => render_progress(&report),
        Err(err) => println!("Progress unavailable: {err}"),
    }

    if !skip_quiz {
        match platform.enrollment.transition(
            &enrollment_id,
            EnrollmentStatus::Completed,
            None,
            Utc::now(),
        ) {
            Ok(record) => println!(
                "\nEnrollment {} -> {} (completed {})",
                record.enrollment.id.0,
                record.enrollment.status.label(),
                record
                    .enrollment
                    .completed_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default()
            ),
            Err(err) => println!("\nCompletion rejected: {err}"),
        }
    }

    match platform.scholarships.stats(&program_id, Utc::now()) {
        Ok(stats) => {
            println!("\nScholarship utilization");
            println!(
                "  total {} | active {} | used {} | expired {} | revoked {}",
                stats.total, stats.active, stats.used, stats.expired, stats.revoked
            );
            println!(
                "  utilization {:.0}% | discount granted {} cents",
                stats.utilization_rate * 100.0,
                stats.total_discount_cents
            );
        }
        Err(err) => println!("\nStats unavailable: {err}"),
    }

    render_events(&platform);
    Ok(())
}

fn render_progress(report: &ProgramProgress) {
    println!(
        "\nProgress report for {} ({:.1}%)",
        report.program_id.0, report.percentage
    );
    for course in &report.courses {
        println!("  {} ({:.1}%)", course.title, course.percentage);
        for module in &course.modules {
            println!(
                "    - {}: {:.1}% ({}/{} items)",
                module.title, module.percentage, module.completed_items, module.total_items
            );
        }
    }
}

fn render_events(platform: &Platform) {
    let events = platform.events.events();
    if events.is_empty() {
        println!("\nNotification stream: empty");
        return;
    }

    println!("\nNotification stream");
    for event in events {
        println!("  - {} ({})", event.template, event.student_id.0);
    }
}
