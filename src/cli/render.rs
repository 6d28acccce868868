//! Terminal rendering for command output.

use chrono::{DateTime, Local, NaiveDateTime};
use colored::{ColoredString, Colorize};

use crate::api::auth::UserProfile;
use crate::api::chat::ConversationSummary;
use crate::api::drugs::InteractionCheckResponse;
use crate::api::health::HealthStatus;
use crate::api::labs::{LabInterpretResponse, LabTestTemplate};
use crate::api::symptoms::SymptomCheckResponse;
use crate::api::Catalog;
use crate::chat::{ChatMessage, Role};
use crate::wizard::severity::{self, Color};

const BRAND: Color = Color::from_hex(0x667eea);

fn paint(text: &str, color: Color) -> ColoredString {
    text.truecolor(color.r, color.g, color.b)
}

fn heading(text: &str) {
    println!();
    println!("{}", paint(&format!("=== {} ===", text), BRAND).bold());
    println!();
}

fn bullets(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", title.bold());
    for item in items {
        println!("  • {}", item);
    }
}

pub fn status(health: &HealthStatus, base_url: &str, user: Option<&UserProfile>) {
    heading("MediAI Status");
    println!("Server:     {}", base_url);
    let state = if health.is_healthy() {
        paint(&format!("[OK] {}", health.status), severity::GREEN)
    } else {
        paint(&format!("[!!] {}", health.status), severity::RED)
    };
    println!("Status:     {}", state);
    if let Some(service) = &health.service {
        println!("Service:    {}", service);
    }
    if let Some(timestamp) = &health.timestamp {
        println!("Checked:    {}", format_timestamp(timestamp));
    }
    match user {
        Some(user) => println!("Signed in:  {}", user.display_name()),
        None => println!("Signed in:  {}", "no".dimmed()),
    }
    println!();
}

pub fn profile(user: &UserProfile) {
    heading("Account");
    println!("Name:      {}", user.display_name());
    println!("Username:  {}", user.username);
    println!("Email:     {}", user.email);
    if let Some(created) = &user.created_at {
        println!("Member since: {}", format_timestamp(created));
    }
    println!();
}

pub fn chat_message(message: &ChatMessage) {
    match message.role {
        Role::User => println!("{} {}", paint("You:", BRAND).bold(), message.content),
        Role::Assistant => {
            println!("{}", paint("MediAI:", severity::GREEN).bold());
            println!("{}", message.content);
        }
        Role::Error => println!("{}", paint(&message.content, severity::RED)),
    }
    println!();
}

pub fn quick_questions(questions: &[&str]) {
    println!("{}", "Quick questions (type /q N):".dimmed());
    for (i, question) in questions.iter().enumerate() {
        println!("  {}. {}", i + 1, question);
    }
    println!();
}

pub fn conversations(items: &[ConversationSummary]) {
    if items.is_empty() {
        println!("No conversations yet.");
        return;
    }

    println!();
    println!(
        "{:<36}  {:<32}  {:>8}  {:<16}",
        "ID", "TITLE", "MESSAGES", "UPDATED"
    );
    println!("{}", "-".repeat(98));
    for conversation in items {
        println!(
            "{:<36}  {:<32}  {:>8}  {:<16}",
            conversation.id,
            truncate(&conversation.title, 32),
            conversation.message_count,
            format_timestamp(&conversation.updated_at)
        );
    }
    println!();
}

pub fn catalog<T>(title: &str, catalog: &Catalog<T>, label: impl Fn(&T) -> String) {
    heading(title);
    if catalog.is_empty() {
        println!("Nothing available.");
        println!();
        return;
    }
    for (category, items) in &catalog.categories {
        println!("{}", category.bold());
        for item in items {
            println!("  {}", label(item));
        }
    }
    println!();
}

pub fn lab_template(template: &LabTestTemplate) -> String {
    if template.unit.is_empty() {
        template.name.clone()
    } else {
        format!("{} ({})", template.name, template.unit)
    }
}

pub fn symptom_result(result: &SymptomCheckResponse) {
    let urgency = result.urgency();
    heading("Symptom Analysis");

    let banner = format!(
        "{} Urgency: {}",
        urgency.icon(),
        result.urgency_level.to_uppercase()
    );
    println!("{}", paint(&banner, urgency.color()).bold());
    if result.emergency {
        let warning = "EMERGENCY: seek immediate medical care or call your local emergency number.";
        println!("{}", paint(warning, severity::emergency_banner(true)).bold());
    }
    if !result.recommendation.is_empty() {
        println!();
        println!("{}", result.recommendation);
    }

    if !result.conditions.is_empty() {
        println!();
        println!("{}", "Possible conditions".bold());
        for condition in &result.conditions {
            println!(
                "  {:>3}%  {}",
                condition.likelihood_percent(),
                condition.name.bold()
            );
            if !condition.description.is_empty() {
                println!("        {}", condition.description.dimmed());
            }
        }
    }

    bullets("Next steps", &result.next_steps);
    disclaimer();
}

pub fn interaction_result(result: &InteractionCheckResponse) {
    heading("Drug Interactions");

    let risk = format!("Overall risk: {}", result.overall_risk.to_uppercase());
    println!("{}", paint(&risk, result.risk().color()).bold());
    if !result.general_advice.is_empty() {
        println!();
        println!("{}", result.general_advice);
    }

    if result.interactions.is_empty() {
        println!();
        println!("{}", paint("No known interactions between these medications.", severity::GREEN));
    }
    for interaction in &result.interactions {
        let level = interaction.severity();
        println!();
        println!(
            "{} {} + {}  {}",
            level.icon(),
            interaction.drug1.bold(),
            interaction.drug2.bold(),
            paint(&interaction.severity.to_uppercase(), level.color())
        );
        if !interaction.description.is_empty() {
            println!("   {}", interaction.description);
        }
        if !interaction.recommendation.is_empty() {
            println!("   {} {}", "→".dimmed(), interaction.recommendation);
        }
    }

    bullets("Food warnings", &result.food_warnings);
    if let Some(alcohol) = result.alcohol_warning.as_deref().filter(|w| !w.is_empty()) {
        println!();
        println!("{} {}", "Alcohol:".bold(), alcohol);
    }
    disclaimer();
}

pub fn lab_result(result: &LabInterpretResponse) {
    heading("Lab Interpretation");

    if !result.overall_assessment.is_empty() {
        println!("{}", result.overall_assessment);
    }
    if !result.priority_concerns.is_empty() {
        println!();
        println!("{}", paint("Priority concerns", severity::RED).bold());
        for concern in &result.priority_concerns {
            println!("  • {}", concern);
        }
    }

    for lab in &result.results {
        let status = lab.status();
        println!();
        println!(
            "{} {}: {} {}  {}",
            status.icon(),
            lab.test_name.bold(),
            lab.value,
            lab.unit,
            paint(&lab.status.to_uppercase(), status.color())
        );
        if !lab.reference_range.is_empty() {
            println!("   Reference: {}", lab.reference_range);
        }
        if !lab.explanation.is_empty() {
            println!("   {}", lab.explanation);
        }
        if !lab.clinical_significance.is_empty() {
            println!("   {}", lab.clinical_significance.dimmed());
        }
        if !lab.recommendation.is_empty() {
            println!("   {} {}", "→".dimmed(), lab.recommendation);
        }
    }

    bullets("Recommended actions", &result.recommended_actions);
    disclaimer();
}

fn disclaimer() {
    println!();
    println!(
        "{}",
        "Educational information only. Not a substitute for professional medical advice.".dimmed()
    );
    println!();
}

/// Format a backend timestamp for display in local time. Unparseable input is
/// shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    // Naive timestamps are UTC on the backend.
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed
            .and_utc()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
    }
    raw.to_string()
}

/// Truncate to `max_len` characters with an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
